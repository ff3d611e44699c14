//! Optional local contrast enhancement.

use ndarray::{Array2, Zip};
use palette::{FromColor, IntoColor, Lab, Srgb};

use super::filters::{clahe, saturate_u8};
use crate::error::Result;
use crate::image::{check_shape, clamp_unit, decode_u8, to_planes, Image, RGB_CHANNELS};

/// Midtone lift applied as `v^(1 / GAMMA)`.
const GAMMA: f32 = 1.1;

/// CLAHE tile grid (rows, cols).
const TILE_GRID: (usize, usize) = (8, 8);

/// CLAHE histogram clip limit.
const CLIP_LIMIT: f32 = 2.0;

/// sRGB to 8-bit L*a*b*: L scaled from [0, 100] to [0, 255], a and b offset by 128.
fn rgb_to_lab8([r, g, b]: [u8; 3]) -> [u8; 3] {
    let lab: Lab = Srgb::new(decode_u8(r), decode_u8(g), decode_u8(b)).into_color();
    [
        saturate_u8(f64::from(lab.l * 255.0 / 100.0)),
        saturate_u8(f64::from(lab.a + 128.0)),
        saturate_u8(f64::from(lab.b + 128.0)),
    ]
}

/// Inverse of [`rgb_to_lab8`].
fn lab8_to_rgb([l, a, b]: [u8; 3]) -> [f32; 3] {
    let lab = Lab::new(
        f32::from(l) * 100.0 / 255.0,
        f32::from(a) - 128.0,
        f32::from(b) - 128.0,
    );
    let rgb = Srgb::from_color(lab);
    [rgb.red, rgb.green, rgb.blue].map(clamp_unit)
}

/// Lift midtones and equalize local lightness contrast.
///
/// Applies a 1/1.1 gamma curve, then CLAHE (8x8 tiles, clip limit 2.0) to
/// the lightness channel of L*a*b* only, leaving a* and b* untouched. This
/// stage is not part of the default restoration chain.
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`](crate::Error::ShapeMismatch) for images
/// not at the operating resolution.
pub fn enhance_contrast(image: &Image) -> Result<Image> {
    check_shape(image, "image")?;

    let lifted = image.mapv(|v| clamp_unit(v).powf(1.0 / GAMMA));
    let [r, g, b] = to_planes(&lifted);
    let lab = Zip::from(&r)
        .and(&g)
        .and(&b)
        .map_collect(|&r, &g, &b| rgb_to_lab8([r, g, b]));

    let lightness: Array2<u8> = lab.mapv(|p| p[0]);
    let equalized = clahe(&lightness, TILE_GRID, CLIP_LIMIT);

    let (height, width) = equalized.dim();
    let mut enhanced = Image::zeros((height, width, RGB_CHANNELS));
    for ((y, x), &l) in equalized.indexed_iter() {
        let [_, a, b] = lab[[y, x]];
        for (c, value) in lab8_to_rgb([l, a, b]).into_iter().enumerate() {
            enhanced[[y, x, c]] = value;
        }
    }

    Ok(enhanced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::image::encode_u8;

    #[test]
    fn test_lab8_round_trip() {
        for rgb in [[0, 0, 0], [255, 255, 255], [200, 120, 40], [30, 90, 160]] {
            let back = lab8_to_rgb(rgb_to_lab8(rgb)).map(encode_u8);
            for (a, b) in rgb.iter().zip(&back) {
                assert!(a.abs_diff(*b) <= 3, "{rgb:?} -> {back:?}");
            }
        }
    }

    #[test]
    #[allow(clippy::cast_precision_loss)]
    fn test_low_contrast_is_stretched() {
        let image = Image::from_shape_fn((256, 256, 3), |(y, x, _)| {
            0.4 + 0.1 * ((x + y) % 32) as f32 / 31.0
        });
        let enhanced = enhance_contrast(&image).unwrap();

        let spread = |img: &Image| {
            let min = img.iter().copied().fold(f32::INFINITY, f32::min);
            let max = img.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            max - min
        };
        assert!(spread(&enhanced) > spread(&image));
        assert!(enhanced.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_neutral_stays_neutral() {
        let image = Image::from_elem((256, 256, 3), 0.5);
        let enhanced = enhance_contrast(&image).unwrap();

        for pixel in enhanced.lanes(ndarray::Axis(2)) {
            assert!((pixel[0] - pixel[1]).abs() <= 3.0 / 255.0);
            assert!((pixel[1] - pixel[2]).abs() <= 3.0 / 255.0);
        }
    }

    #[test]
    fn test_rejects_wrong_shape() {
        for dims in [(256, 256, 4), (128, 256, 3)] {
            assert!(matches!(
                enhance_contrast(&Image::zeros(dims)),
                Err(Error::ShapeMismatch { .. })
            ));
        }
    }
}
