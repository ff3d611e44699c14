//! Custom error types for derain.

use std::path::PathBuf;
use thiserror::Error;

use crate::frequency::FrequencyMode;

/// Main error type for the derain library.
#[derive(Error, Debug)]
pub enum Error {
    /// Requested frequency-domain representation does not exist.
    #[error("invalid frequency mode {mode:?}: expected \"real_imag\" or \"mag_phase\"")]
    InvalidMode { mode: String },

    /// The inverse transform only accepts real/imaginary spectra.
    #[error("inverse transform does not support {mode} spectra")]
    UnsupportedMode { mode: FrequencyMode },

    /// Array shape does not match what a stage expects.
    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    /// The degradation operator failed or returned a malformed estimate.
    #[error("rain map estimation failed: {reason}")]
    Estimation { reason: String },

    /// The ONNX runtime failed while estimating a rain map.
    #[error("model inference failed: {source}")]
    Inference {
        #[source]
        source: ort::Error,
    },

    /// Weights file exists but could not be loaded.
    #[error("failed to load ONNX model {path}: {source}")]
    ModelLoad {
        path: PathBuf,
        #[source]
        source: ort::Error,
    },

    /// Failed to download model weights.
    #[error("failed to download model from {url}: {source}")]
    ModelDownload {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Failed to load an image file.
    #[error("failed to load image from {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Failed to save an image file.
    #[error("failed to save image to {path}: {source}")]
    ImageSave {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Failed to create cache directory.
    #[error("failed to create cache directory {path}: {source}")]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for derain operations.
pub type Result<T> = std::result::Result<T, Error>;
