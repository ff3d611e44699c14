//! Rain-map estimators and their weights.
//!
//! The restoration core only sees [`DegradationOperator`]. Handles are loaded
//! once (see [`ModelStore::load_estimator`]), shared read-only across calls,
//! and torn down by dropping them.

mod loader;
mod onnx;

pub use loader::{ModelStore, WEIGHTS_FILENAME};
pub use onnx::OnnxEstimator;

use crate::error::Result;
use crate::frequency::FrequencyTensor;
use crate::image::RainMap;

/// Anything that estimates an additive rain map from an image spectrum.
///
/// Implementations must be deterministic for fixed weights and return an
/// (H, W, 3) map with values in [0, 1] for an (H, W, 3, 2) spectrum.
pub trait DegradationOperator: Send + Sync {
    /// Estimate the rain layer of the image whose spectrum is `freq`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Estimation`](crate::Error::Estimation) or
    /// [`Error::Inference`](crate::Error::Inference) if estimation fails.
    fn estimate(&self, freq: &FrequencyTensor) -> Result<RainMap>;
}

impl<F> DegradationOperator for F
where
    F: Fn(&FrequencyTensor) -> Result<RainMap> + Send + Sync,
{
    fn estimate(&self, freq: &FrequencyTensor) -> Result<RainMap> {
        self(freq)
    }
}

/// Fallback estimator used when no weights are available.
///
/// Reports no rain anywhere, which reduces restoration to the
/// post-processing chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroRainEstimator;

impl DegradationOperator for ZeroRainEstimator {
    fn estimate(&self, freq: &FrequencyTensor) -> Result<RainMap> {
        Ok(RainMap::zeros(freq.dim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frequency::{to_frequency_domain, FrequencyMode};
    use crate::image::Image;

    #[test]
    fn test_zero_rain_matches_spectrum_shape() {
        let freq = to_frequency_domain(&Image::zeros((256, 256, 3)), FrequencyMode::RealImag)
            .unwrap();
        let rain = ZeroRainEstimator.estimate(&freq).unwrap();

        assert_eq!(rain.dim(), (256, 256, 3));
        assert!(rain.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_closure_is_an_operator() {
        let freq = to_frequency_domain(&Image::zeros((256, 256, 3)), FrequencyMode::RealImag)
            .unwrap();
        let constant =
            |f: &FrequencyTensor| -> Result<RainMap> { Ok(RainMap::from_elem(f.dim(), 0.1)) };
        let operator: &dyn DegradationOperator = &constant;

        let rain = operator.estimate(&freq).unwrap();
        assert!(rain.iter().all(|&v| (v - 0.1).abs() < f32::EPSILON));
    }
}
