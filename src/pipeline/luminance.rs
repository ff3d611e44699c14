//! Brightness-preserving luma/chroma blend.
//!
//! Structure comes from the restored image, colour from the source: the
//! restored luma is denoised with a bilateral filter, shifted so its mean
//! matches the source luma, and recombined with the source chroma.

use ndarray::{Array2, Zip};

use super::filters::{bilateral_filter, saturate_u8};
use crate::error::Result;
use crate::image::{check_shape, decode_u8, to_planes, Image, RGB_CHANNELS};

/// Neighbourhood diameter of the luma denoiser.
const BILATERAL_DIAMETER: usize = 5;

/// Spatial and range sigma of the luma denoiser.
const BILATERAL_SIGMA: f64 = 75.0;

/// Bisection steps when searching for the luma offset.
const OFFSET_SEARCH_STEPS: usize = 40;

/// BT.601 RGB to YCrCb, 8-bit with chroma centred on 128.
fn rgb_to_ycrcb([r, g, b]: [u8; 3]) -> [u8; 3] {
    let (r, g, b) = (f64::from(r), f64::from(g), f64::from(b));
    let y = 0.299 * r + 0.587 * g + 0.114 * b;
    [
        saturate_u8(y),
        saturate_u8((r - y).mul_add(0.713, 128.0)),
        saturate_u8((b - y).mul_add(0.564, 128.0)),
    ]
}

/// Inverse of [`rgb_to_ycrcb`].
fn ycrcb_to_rgb([y, cr, cb]: [u8; 3]) -> [u8; 3] {
    let y = f64::from(y);
    let cr = f64::from(cr) - 128.0;
    let cb = f64::from(cb) - 128.0;
    [
        saturate_u8(1.403_f64.mul_add(cr, y)),
        saturate_u8(y - 0.714 * cr - 0.344 * cb),
        saturate_u8(1.773_f64.mul_add(cb, y)),
    ]
}

/// Split an image into 8-bit Y, Cr and Cb planes.
fn to_ycrcb(image: &Image) -> [Array2<u8>; 3] {
    let [r, g, b] = to_planes(image);
    let pixels = Zip::from(&r)
        .and(&g)
        .and(&b)
        .map_collect(|&r, &g, &b| rgb_to_ycrcb([r, g, b]));
    [0, 1, 2].map(|k| pixels.mapv(|p| p[k]))
}

#[allow(clippy::cast_precision_loss)]
fn mean(plane: &Array2<u8>) -> f64 {
    plane.iter().map(|&v| f64::from(v)).sum::<f64>() / plane.len() as f64
}

/// Shift `luma` by `offset`, rounding and clipping to 8 bits.
fn shift(luma: &Array2<u8>, offset: f64) -> Array2<u8> {
    luma.mapv(|v| saturate_u8(f64::from(v) + offset))
}

/// Additive offset whose shifted, clipped plane has a mean closest to `target`.
///
/// A single shift by `target - mean(luma)` undershoots once pixels saturate at
/// 0 or 255. The mean of the shifted plane is monotone in the offset, so the
/// offset is found by bisection over the full 8-bit range.
fn matching_offset(luma: &Array2<u8>, target: f64) -> f64 {
    let initial = target - mean(luma);
    if (mean(&shift(luma, initial)) - target).abs() < 0.5 {
        return initial;
    }

    let (mut lo, mut hi) = (-255.0_f64, 255.0_f64);
    for _ in 0..OFFSET_SEARCH_STEPS {
        let mid = 0.5 * (lo + hi);
        if mean(&shift(luma, mid)) < target {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    let error = |offset| (mean(&shift(luma, offset)) - target).abs();
    if error(lo) <= error(hi) {
        lo
    } else {
        hi
    }
}

/// 8-bit luma plane of an image, the channel whose mean
/// [`blend_luminance`] preserves.
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`](crate::Error::ShapeMismatch) for images
/// not at the operating resolution.
pub fn brightness_channel(image: &Image) -> Result<Array2<u8>> {
    check_shape(image, "image")?;
    let [luma, _, _] = to_ycrcb(image);
    Ok(luma)
}

/// Take luma from `derained` and chroma from `original`.
///
/// The derained luma is bilateral filtered, then shifted by a single additive
/// offset and clipped, so the output's mean brightness matches the
/// original's. The offset starts at `mean(original luma) - mean(filtered luma)`
/// and is refined when clipping eats part of it. It is measured after
/// filtering and applied before recombination.
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`](crate::Error::ShapeMismatch) if either
/// image is not at the operating resolution.
pub fn blend_luminance(original: &Image, derained: &Image) -> Result<Image> {
    check_shape(original, "original image")?;
    check_shape(derained, "derained image")?;

    let [original_luma, cr, cb] = to_ycrcb(original);
    let [derained_luma, _, _] = to_ycrcb(derained);

    let filtered = bilateral_filter(
        &derained_luma,
        BILATERAL_DIAMETER,
        BILATERAL_SIGMA,
        BILATERAL_SIGMA,
    );

    let offset = matching_offset(&filtered, mean(&original_luma));
    tracing::debug!("Luma offset {offset:+.3}");
    let corrected = shift(&filtered, offset);

    let (height, width) = corrected.dim();
    let mut blended = Image::zeros((height, width, RGB_CHANNELS));
    for ((y, x), &luma) in corrected.indexed_iter() {
        let rgb = ycrcb_to_rgb([luma, cr[[y, x]], cb[[y, x]]]);
        for (c, &level) in rgb.iter().enumerate() {
            blended[[y, x, c]] = decode_u8(level);
        }
    }

    Ok(blended)
}
