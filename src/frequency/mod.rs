//! Frequency-domain representation of images.
//!
//! Spectra are kept in the same channel-last layout as [`Image`](crate::image::Image):
//! a tensor of shape (H, W, C, 2) where the trailing axis holds one complex
//! coefficient per pixel and channel. Planes are read and written through
//! `index_axis(Axis(2), c)` so the spatial and channel axes are never
//! transposed between the forward and inverse transforms.

mod transform;

pub use transform::{from_frequency_domain, to_frequency_domain};

use std::fmt;
use std::str::FromStr;

use ndarray::{Array4, ArrayView4, Axis};

use crate::error::{Error, Result};
use crate::image::{OPERATING_SIZE, RGB_CHANNELS};

/// Which pair of components the trailing axis of a spectrum holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrequencyMode {
    /// (real, imaginary) of the unnormalized DFT.
    #[default]
    RealImag,
    /// (magnitude, phase) with phase in (-pi, pi].
    MagPhase,
}

impl FrequencyMode {
    /// Canonical name of the mode.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RealImag => "real_imag",
            Self::MagPhase => "mag_phase",
        }
    }
}

impl fmt::Display for FrequencyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FrequencyMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "real_imag" => Ok(Self::RealImag),
            "mag_phase" => Ok(Self::MagPhase),
            _ => Err(Error::InvalidMode {
                mode: s.to_string(),
            }),
        }
    }
}

/// Per-channel 2D spectrum of an image, shape (H, W, C, 2).
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyTensor {
    mode: FrequencyMode,
    data: Array4<f64>,
}

impl FrequencyTensor {
    /// Wrap raw spectrum data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] unless `data` is
    /// (`OPERATING_SIZE`, `OPERATING_SIZE`, 3, 2).
    pub fn new(mode: FrequencyMode, data: Array4<f64>) -> Result<Self> {
        let expected = (OPERATING_SIZE, OPERATING_SIZE, RGB_CHANNELS, 2);
        if data.dim() != expected {
            return Err(Error::ShapeMismatch {
                expected: format!("frequency tensor of shape {expected:?}"),
                actual: format!("{:?}", data.dim()),
            });
        }
        Ok(Self { mode, data })
    }

    /// Component pair held by the trailing axis.
    #[must_use]
    pub const fn mode(&self) -> FrequencyMode {
        self.mode
    }

    /// Borrow the raw (H, W, C, 2) data.
    #[must_use]
    pub fn view(&self) -> ArrayView4<'_, f64> {
        self.data.view()
    }

    /// (height, width, channels) of the source image.
    #[must_use]
    pub fn dim(&self) -> (usize, usize, usize) {
        let (h, w, c, _) = self.data.dim();
        (h, w, c)
    }

    /// Return the same spectrum as (real, imaginary) pairs.
    #[must_use]
    pub fn to_real_imag(&self) -> Self {
        match self.mode {
            FrequencyMode::RealImag => self.clone(),
            FrequencyMode::MagPhase => {
                let mut data = self.data.clone();
                for mut pair in data.lanes_mut(Axis(3)) {
                    let (magnitude, phase) = (pair[0], pair[1]);
                    pair[0] = magnitude * phase.cos();
                    pair[1] = magnitude * phase.sin();
                }
                Self {
                    mode: FrequencyMode::RealImag,
                    data,
                }
            }
        }
    }

    /// Flatten to the (1, H, W, 2*C) `f32` layout the ONNX model consumes.
    ///
    /// The last axis is indexed `2 * c + k`, so channel order is preserved and
    /// each channel's two components stay adjacent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if the data cannot be reshaped.
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_model_input(&self) -> Result<Array4<f32>> {
        let (h, w, c) = self.dim();
        self.data
            .mapv(|v| v as f32)
            .into_shape_with_order((1, h, w, 2 * c))
            .map_err(|e| Error::ShapeMismatch {
                expected: format!("(1, {h}, {w}, {})", 2 * c),
                actual: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!("real_imag".parse::<FrequencyMode>().unwrap(), FrequencyMode::RealImag);
        assert_eq!("mag_phase".parse::<FrequencyMode>().unwrap(), FrequencyMode::MagPhase);
        for alias in ["mag-phase", "real-imag", "MAG_PHASE"] {
            assert!(matches!(
                alias.parse::<FrequencyMode>(),
                Err(Error::InvalidMode { mode }) if mode == alias
            ));
        }
        assert!(matches!(
            "bogus".parse::<FrequencyMode>(),
            Err(Error::InvalidMode { mode }) if mode == "bogus"
        ));
    }

    #[test]
    fn test_new_rejects_wrong_shape() {
        let result = FrequencyTensor::new(FrequencyMode::RealImag, Array4::zeros((256, 256, 4, 2)));
        assert!(matches!(result, Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn test_mag_phase_to_real_imag() {
        let mut data = Array4::zeros((256, 256, 3, 2));
        data[[3, 4, 1, 0]] = 2.0;
        data[[3, 4, 1, 1]] = std::f64::consts::FRAC_PI_2;
        let tensor = FrequencyTensor::new(FrequencyMode::MagPhase, data).unwrap();

        let converted = tensor.to_real_imag();
        assert_eq!(converted.mode(), FrequencyMode::RealImag);
        assert!(converted.view()[[3, 4, 1, 0]].abs() < 1e-12);
        assert!((converted.view()[[3, 4, 1, 1]] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_model_input_layout() {
        let mut data = Array4::zeros((256, 256, 3, 2));
        data[[7, 9, 2, 1]] = 5.0;
        data[[7, 9, 0, 0]] = 3.0;
        let tensor = FrequencyTensor::new(FrequencyMode::RealImag, data).unwrap();

        let input = tensor.to_model_input().unwrap();
        assert_eq!(input.dim(), (1, 256, 256, 6));
        assert_eq!(input[[0, 7, 9, 5]], 5.0);
        assert_eq!(input[[0, 7, 9, 0]], 3.0);
    }
}
