//! ONNX-runtime backed rain-map estimator.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ndarray::Array3;
use ort::session::Session;
use ort::value::Tensor;

use super::DegradationOperator;
use crate::error::{Error, Result};
use crate::frequency::FrequencyTensor;
use crate::image::{clip, RainMap};

/// Runs a derain network exported to ONNX.
///
/// The network takes a (1, H, W, 6) spectrum (see
/// [`FrequencyTensor::to_model_input`]) and returns a (1, H, W, 3) rain map.
/// The runtime needs exclusive access to the session while running, so calls
/// from several threads are serialized.
pub struct OnnxEstimator {
    session: Mutex<Session>,
    path: PathBuf,
}

impl OnnxEstimator {
    /// Load a model from an `.onnx` file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelLoad`] if the runtime rejects the file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let session = Session::builder()
            .map_err(|source| Error::ModelLoad {
                path: path.to_path_buf(),
                source,
            })?
            .commit_from_file(path)
            .map_err(|source| Error::ModelLoad {
                path: path.to_path_buf(),
                source,
            })?;

        tracing::info!("Loaded derain model from {}", path.display());

        Ok(Self {
            session: Mutex::new(session),
            path: path.to_path_buf(),
        })
    }
}

impl std::fmt::Debug for OnnxEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEstimator")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl DegradationOperator for OnnxEstimator {
    fn estimate(&self, freq: &FrequencyTensor) -> Result<RainMap> {
        let input_value =
            Tensor::from_array(freq.to_model_input()?).map_err(|source| Error::Inference { source })?;

        let mut session = self.session.lock().map_err(|_| Error::Estimation {
            reason: "model session lock poisoned".to_string(),
        })?;

        let outputs = session
            .run(ort::inputs![input_value])
            .map_err(|source| Error::Inference { source })?;

        let output = outputs.values().next().ok_or_else(|| Error::Estimation {
            reason: "model produced no output".to_string(),
        })?;

        // Sigmoid output should already be in range; clip round-off anyway
        Ok(clip(&extract_rain_map(&output)?))
    }
}

/// Extract a (1, H, W, C) output as an (H, W, C) array.
#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
fn extract_rain_map(value: &ort::value::ValueRef<'_>) -> Result<RainMap> {
    let (shape_info, data) = value
        .try_extract_tensor::<f32>()
        .map_err(|source| Error::Inference { source })?;

    // Safe: tensor dimensions are always non-negative and within bounds
    let dims: Vec<usize> = shape_info.iter().map(|&x| x as usize).collect();

    match dims.as_slice() {
        &[1, height, width, channels] => {
            Array3::from_shape_vec((height, width, channels), data.to_vec()).map_err(|_| {
                Error::Estimation {
                    reason: format!("cannot reshape model output {dims:?}"),
                }
            })
        }
        _ => Err(Error::Estimation {
            reason: format!("expected (1, H, W, C) model output, got {dims:?}"),
        }),
    }
}
