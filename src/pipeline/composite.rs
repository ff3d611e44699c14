//! Rain-map subtraction.

use ndarray::Zip;

use crate::error::Result;
use crate::image::{check_shape, clamp_unit, Image, RainMap};

/// Subtract the rain estimate from the reconstructed image.
///
/// Returns `clip(reconstructed - rain_map, 0, 1)`. Where the estimate exceeds
/// the pixel the result saturates to exactly 0.
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`](crate::Error::ShapeMismatch) if either
/// input is not at the operating resolution.
pub fn composite(reconstructed: &Image, rain_map: &RainMap) -> Result<Image> {
    check_shape(reconstructed, "reconstructed image")?;
    check_shape(rain_map, "rain map")?;

    Ok(Zip::from(reconstructed)
        .and(rain_map)
        .map_collect(|&pixel, &rain| clamp_unit(pixel - rain)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_subtracts_rain() {
        let image = Image::from_elem((256, 256, 3), 0.75);
        let rain = RainMap::from_elem((256, 256, 3), 0.25);
        let residual = composite(&image, &rain).unwrap();
        assert!(residual.iter().all(|&v| (v - 0.5).abs() < 1e-6));
    }

    #[test]
    fn test_saturates_at_zero() {
        let image = Image::from_elem((256, 256, 3), 0.2);
        let mut rain = RainMap::zeros((256, 256, 3));
        rain[[10, 20, 0]] = 0.9;
        let residual = composite(&image, &rain).unwrap();

        assert_eq!(residual[[10, 20, 0]], 0.0);
        assert!((residual[[10, 20, 1]] - 0.2).abs() < 1e-6);
        assert!(residual.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn test_rejects_wrong_shape() {
        let image = Image::zeros((256, 256, 3));
        assert!(matches!(
            composite(&image, &RainMap::zeros((256, 256, 4))),
            Err(Error::ShapeMismatch { .. })
        ));
        assert!(matches!(
            composite(&Image::zeros((128, 256, 3)), &RainMap::zeros((128, 256, 3))),
            Err(Error::ShapeMismatch { .. })
        ));
    }
}
