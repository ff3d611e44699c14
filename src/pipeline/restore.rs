//! Restoration orchestrator.

use std::path::Path;

use crate::error::{Error, Result};
use crate::frequency::{from_frequency_domain, to_frequency_domain, FrequencyMode};
use crate::image::{self, check_shape, clip, Image, OPERATING_SIZE, RGB_CHANNELS};
use crate::model::DegradationOperator;

use super::composite::composite;
use super::contrast::enhance_contrast;
use super::luminance::blend_luminance;
use super::sharpen::sharpen;

/// Configuration for the restoration pipeline.
#[derive(Debug, Clone)]
pub struct RestoreConfig {
    /// Spectrum representation handed to the estimator.
    pub mode: FrequencyMode,

    /// Whether to recombine restored luma with the original chroma.
    pub blend_luminance: bool,

    /// Whether to finish with gamma lift and CLAHE.
    pub enhance_contrast: bool,

    /// Output JPEG quality (1-100).
    pub output_quality: u8,

    /// Whether saved images are resized back to the input dimensions.
    pub keep_original_size: bool,
}

impl Default for RestoreConfig {
    fn default() -> Self {
        Self {
            mode: FrequencyMode::RealImag,
            blend_luminance: true,
            enhance_contrast: false,
            output_quality: 95,
            keep_original_size: true,
        }
    }
}

impl RestoreConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.output_quality) {
            return Err(Error::InvalidParameter {
                name: "output_quality".to_string(),
                reason: "must be between 1 and 100".to_string(),
            });
        }

        Ok(())
    }
}

/// Restore one operating-size image.
///
/// 1. validate the shape and clip values into [0, 1]
/// 2. transform to the frequency domain in `config.mode`
/// 3. estimate the rain map once
/// 4. reconstruct from that same spectrum
/// 5. subtract the rain map
/// 6. sharpen, then optionally blend luminance and enhance contrast
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`] for a malformed input,
/// [`Error::Estimation`] if the estimator's output is not (256, 256, 3), and
/// propagates any estimator failure unchanged.
pub fn restore(
    raw: &Image,
    estimator: &dyn DegradationOperator,
    config: &RestoreConfig,
) -> Result<Image> {
    check_shape(raw, "input image")?;
    let raw = clip(raw);

    let freq = to_frequency_domain(&raw, config.mode)?;

    tracing::debug!("Estimating rain map...");
    let rain_map = estimator.estimate(&freq)?;
    let expected = (OPERATING_SIZE, OPERATING_SIZE, RGB_CHANNELS);
    if rain_map.dim() != expected {
        return Err(Error::Estimation {
            reason: format!(
                "rain map has shape {:?}, expected {expected:?}",
                rain_map.dim()
            ),
        });
    }

    let reconstructed = from_frequency_domain(&freq.to_real_imag())?;
    let residual = composite(&reconstructed, &rain_map)?;

    let mut restored = sharpen(&residual)?;
    if config.blend_luminance {
        restored = blend_luminance(&raw, &restored)?;
    }
    if config.enhance_contrast {
        restored = enhance_contrast(&restored)?;
    }

    Ok(restored)
}

/// File-level restoration with a fixed configuration.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: RestoreConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: RestoreConfig) -> Result<Self> {
        config.validate()?;
        tracing::debug!("Initializing pipeline with config: {config:?}");
        Ok(Self { config })
    }

    /// Restore an in-memory image. See [`restore`].
    ///
    /// # Errors
    ///
    /// Returns an error if any stage fails.
    pub fn restore(&self, raw: &Image, estimator: &dyn DegradationOperator) -> Result<Image> {
        restore(raw, estimator, &self.config)
    }

    /// Load, restore and save one image.
    ///
    /// # Arguments
    ///
    /// * `estimator` - Rain-map estimator, loaded once by the caller
    /// * `input_path` - Path to the rainy image
    /// * `output_path` - Path to save the restored image
    ///
    /// # Errors
    ///
    /// Returns an error if loading, restoration, or saving fails.
    pub fn process<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        estimator: &dyn DegradationOperator,
        input_path: P,
        output_path: Q,
    ) -> Result<()> {
        let input_path = input_path.as_ref();
        let output_path = output_path.as_ref();

        tracing::info!("Processing image: {}", input_path.display());
        let (raw, original_dims) = image::load_image(input_path)?;

        let restored = self.restore(&raw, estimator)?;

        tracing::info!("Saving output to: {}", output_path.display());
        image::save_image(
            &restored,
            output_path,
            self.config.keep_original_size.then_some(original_dims),
            self.config.output_quality,
        )
    }
}
