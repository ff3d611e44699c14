//! Image arrays, 8-bit encoding, and file I/O.

mod load;
mod save;

pub use load::load_image;
pub use save::save_image;

use image::{Rgb, RgbImage};
use ndarray::{Array2, Array3, ArrayView2, Axis};

use crate::error::{Error, Result};

/// Image in HWC (channel-last) layout with values in [0, 1].
pub type Image = Array3<f32>;

/// Additive rain estimate, same layout and domain as [`Image`].
pub type RainMap = Array3<f32>;

/// Side length the degradation model operates at.
pub const OPERATING_SIZE: usize = 256;

/// Number of channels in RGB images.
pub const RGB_CHANNELS: usize = 3;

/// Fail with [`Error::ShapeMismatch`] unless `image` is
/// (`OPERATING_SIZE`, `OPERATING_SIZE`, `RGB_CHANNELS`).
///
/// # Errors
///
/// Returns an error naming `what` if the shape differs.
pub fn check_shape(image: &Array3<f32>, what: &str) -> Result<()> {
    let expected = (OPERATING_SIZE, OPERATING_SIZE, RGB_CHANNELS);
    if image.dim() == expected {
        return Ok(());
    }
    Err(Error::ShapeMismatch {
        expected: format!("{what} of shape {expected:?}"),
        actual: format!("{:?}", image.dim()),
    })
}

/// Clip every value into [0, 1]. NaN becomes 0.
#[must_use]
pub fn clip(image: &Array3<f32>) -> Array3<f32> {
    image.mapv(clamp_unit)
}

#[inline]
pub(crate) fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Encode a [0, 1] value as an 8-bit level, rounding to nearest.
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[must_use]
pub fn encode_u8(value: f32) -> u8 {
    // Safe: clamped to [0, 255] before casting
    (clamp_unit(value) * 255.0).round() as u8
}

/// Decode an 8-bit level to [0, 1].
#[inline]
#[must_use]
pub fn decode_u8(level: u8) -> f32 {
    f32::from(level) / 255.0
}

/// Convert an HWC image into an 8-bit RGB buffer.
#[allow(clippy::cast_possible_truncation)]
#[must_use]
pub fn to_rgb8(image: &Image) -> RgbImage {
    let (height, width, _) = image.dim();
    // Safe: callers pass images at the operating resolution
    RgbImage::from_fn(width as u32, height as u32, |x, y| {
        let (x, y) = (x as usize, y as usize);
        Rgb([
            encode_u8(image[[y, x, 0]]),
            encode_u8(image[[y, x, 1]]),
            encode_u8(image[[y, x, 2]]),
        ])
    })
}

/// Convert an 8-bit RGB buffer into an HWC image.
#[allow(clippy::cast_possible_truncation)]
#[must_use]
pub fn from_rgb8(rgb: &RgbImage) -> Image {
    let (width, height) = rgb.dimensions();
    Array3::from_shape_fn((height as usize, width as usize, RGB_CHANNELS), |(y, x, c)| {
        // Safe: indices are bounded by the buffer dimensions
        decode_u8(rgb.get_pixel(x as u32, y as u32)[c])
    })
}

/// Split an HWC image into three 8-bit planes.
pub(crate) fn to_planes(image: &Image) -> [Array2<u8>; 3] {
    [0, 1, 2].map(|c| image.index_axis(Axis(2), c).mapv(encode_u8))
}

/// Merge three 8-bit planes into an HWC image.
pub(crate) fn from_planes(planes: [ArrayView2<'_, u8>; 3]) -> Image {
    let (height, width) = planes[0].dim();
    Array3::from_shape_fn((height, width, RGB_CHANNELS), |(y, x, c)| {
        decode_u8(planes[c][[y, x]])
    })
}
