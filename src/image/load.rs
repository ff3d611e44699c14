//! Image loading utilities.

use std::path::Path;

use image::{imageops::FilterType, DynamicImage, GenericImageView};

use crate::error::{Error, Result};

use super::{from_rgb8, Image, OPERATING_SIZE};

/// Load an image from disk and convert it to an operating-size array.
///
/// The image is:
/// 1. Decoded from the specified path (any format the `image` crate reads)
/// 2. Converted to 8-bit RGB
/// 3. Resized to 256x256 with a bicubic filter
/// 4. Normalized to [0, 1] in HWC layout
///
/// Returns the array together with the original `(width, height)`.
///
/// # Errors
///
/// Returns an error if the image cannot be loaded or decoded.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<(Image, (u32, u32))> {
    let path = path.as_ref();

    let img = image::open(path).map_err(|source| Error::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;

    let original_dims = img.dimensions();
    tracing::debug!(
        "Loaded {} ({}x{})",
        path.display(),
        original_dims.0,
        original_dims.1
    );

    Ok((dynamic_to_image(&img), original_dims))
}

/// Resize a `DynamicImage` to the operating size and normalize it.
#[allow(clippy::cast_possible_truncation)]
fn dynamic_to_image(img: &DynamicImage) -> Image {
    // Safe: OPERATING_SIZE (256) fits in u32
    let size = OPERATING_SIZE as u32;
    let rgb = img.resize_exact(size, size, FilterType::CatmullRom).to_rgb8();
    from_rgb8(&rgb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_shape() {
        let img = DynamicImage::new_rgb8(100, 60);
        let image = dynamic_to_image(&img);

        assert_eq!(image.dim(), (256, 256, 3));
    }

    #[test]
    fn test_normalization_range() {
        let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            40,
            40,
            image::Rgb([255, 255, 255]),
        ));
        let image = dynamic_to_image(&img);

        let min = image.iter().copied().fold(f32::INFINITY, f32::min);
        let max = image.iter().copied().fold(f32::NEG_INFINITY, f32::max);

        // White image should be all 1.0
        assert!((min - 1.0).abs() < 0.01);
        assert!((max - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_missing_file() {
        let result = load_image("/nonexistent/rainy.png");
        assert!(matches!(result, Err(Error::ImageLoad { .. })));
    }
}
