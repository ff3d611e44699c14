//! Image saving utilities.

use std::path::Path;

use image::{imageops::FilterType, DynamicImage};

use crate::error::{Error, Result};

use super::{to_rgb8, Image};

/// Save an image array to disk.
///
/// The array is:
/// 1. Encoded to 8-bit RGB (values are clipped to [0, 1] first)
/// 2. Resized to the original dimensions if provided
/// 3. Saved to the specified path (format inferred from extension)
///
/// # Arguments
///
/// * `image` - HWC array with values in [0, 1]
/// * `path` - Output file path
/// * `original_dims` - Optional `(width, height)` to resize back to
/// * `quality` - JPEG quality (1-100), ignored for other formats
///
/// # Errors
///
/// Returns an error if the image cannot be saved.
pub fn save_image<P: AsRef<Path>>(
    image: &Image,
    path: P,
    original_dims: Option<(u32, u32)>,
    quality: u8,
) -> Result<()> {
    let path = path.as_ref();

    let encoded = DynamicImage::ImageRgb8(to_rgb8(image));

    let final_img = match original_dims {
        Some((width, height)) if (width, height) != (encoded.width(), encoded.height()) => {
            encoded.resize_exact(width, height, FilterType::CatmullRom)
        }
        _ => encoded,
    };

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("png")
        .to_lowercase();

    match extension.as_str() {
        "jpg" | "jpeg" => {
            let mut output = std::fs::File::create(path)?;
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut output, quality);
            final_img
                .write_with_encoder(encoder)
                .map_err(|source| Error::ImageSave {
                    path: path.to_path_buf(),
                    source,
                })?;
        }
        _ => {
            final_img.save(path).map_err(|source| Error::ImageSave {
                path: path.to_path_buf(),
                source,
            })?;
        }
    }

    tracing::debug!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::load_image;

    #[test]
    fn test_save_and_reload_png() {
        let path = std::env::temp_dir().join("derain_save_and_reload.png");
        let image = Image::from_elem((256, 256, 3), 128.0 / 255.0);

        save_image(&image, &path, Some((64, 32)), 95).unwrap();

        let (reloaded, dims) = load_image(&path).unwrap();
        assert_eq!(dims, (64, 32));
        // Resampling a flat image may drift by a level either way
        assert!(reloaded
            .iter()
            .all(|&v| (v - 128.0 / 255.0).abs() <= 2.0 / 255.0));

        std::fs::remove_file(&path).unwrap();
    }
}
