//! Unsharp-mask sharpening.

use imageproc::filter::filter3x3;

use crate::error::Result;
use crate::image::{check_shape, from_rgb8, to_rgb8, Image};

/// Four-connected Laplacian added to the identity.
const SHARPEN_KERNEL: [f32; 9] = [0.0, -1.0, 0.0, -1.0, 5.0, -1.0, 0.0, -1.0, 0.0];

/// Sharpen an image in the 8-bit domain.
///
/// Every channel is convolved with [`SHARPEN_KERNEL`] and saturated to
/// [0, 255]. Out-of-bounds neighbours replicate the nearest edge pixel, so a
/// flat image comes back unchanged. Sharpening is not idempotent.
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`](crate::Error::ShapeMismatch) for images
/// not at the operating resolution.
pub fn sharpen(image: &Image) -> Result<Image> {
    check_shape(image, "image")?;

    let sharpened = filter3x3::<_, f32, u8>(&to_rgb8(image), &SHARPEN_KERNEL);
    Ok(from_rgb8(&sharpened))
}
