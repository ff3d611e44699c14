//! Locating, downloading, and loading model weights.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};

use super::{DegradationOperator, OnnxEstimator, ZeroRainEstimator};
use crate::error::{Error, Result};

/// File name of the weights inside the cache directory.
pub const WEIGHTS_FILENAME: &str = "derain.onnx";

/// Where the derain weights live and how to turn them into an estimator.
#[derive(Debug, Clone)]
pub struct ModelStore {
    weights_path: PathBuf,
}

impl ModelStore {
    /// Use the platform cache directory.
    ///
    /// - Windows: `%LOCALAPPDATA%\derain\models\derain.onnx`
    /// - Linux: `~/.cache/derain/models/derain.onnx`
    /// - macOS: `~/Library/Caches/derain/models/derain.onnx`
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory cannot be created.
    pub fn new() -> Result<Self> {
        let base = dirs::cache_dir().unwrap_or_else(|| PathBuf::from("."));
        let cache_dir = base.join("derain").join("models");

        fs::create_dir_all(&cache_dir).map_err(|source| Error::CacheDir {
            path: cache_dir.clone(),
            source,
        })?;

        Ok(Self {
            weights_path: cache_dir.join(WEIGHTS_FILENAME),
        })
    }

    /// Use an explicit weights file.
    #[must_use]
    pub fn at<P: Into<PathBuf>>(weights_path: P) -> Self {
        Self {
            weights_path: weights_path.into(),
        }
    }

    /// Path the weights are read from.
    #[must_use]
    pub fn weights_path(&self) -> &Path {
        &self.weights_path
    }

    /// Whether a weights file is present.
    #[must_use]
    pub fn has_weights(&self) -> bool {
        self.weights_path.is_file()
    }

    /// Download the weights from `url` unless they are already present.
    ///
    /// # Errors
    ///
    /// Returns an error if the download or the write fails.
    pub fn fetch(&self, url: &str) -> Result<()> {
        if self.has_weights() {
            tracing::debug!("Weights already present at {}", self.weights_path.display());
            return Ok(());
        }
        if let Some(parent) = self.weights_path.parent() {
            fs::create_dir_all(parent).map_err(|source| Error::CacheDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        download_file(url, &self.weights_path)
    }

    /// Load the estimator for this store.
    ///
    /// Missing weights are not an error: the store falls back to
    /// [`ZeroRainEstimator`] and logs a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if weights exist but cannot be loaded.
    pub fn load_estimator(&self) -> Result<Box<dyn DegradationOperator>> {
        if !self.has_weights() {
            tracing::warn!(
                "No weights found at {}; estimating no rain",
                self.weights_path.display()
            );
            return Ok(Box::new(ZeroRainEstimator));
        }

        Ok(Box::new(OnnxEstimator::from_file(&self.weights_path)?))
    }
}

/// Download a file from a URL to a path with progress indication.
fn download_file(url: &str, path: &Path) -> Result<()> {
    tracing::info!("Downloading weights from {url}");

    let download_err = |source| Error::ModelDownload {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::new();
    let mut response = client
        .get(url)
        .send()
        .and_then(reqwest::blocking::Response::error_for_status)
        .map_err(download_err)?;

    let pb = response
        .content_length()
        .map_or_else(ProgressBar::no_length, ProgressBar::new);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .expect("valid template")
            .progress_chars("#>-"),
    );

    stream_to_file(&mut response, path, &pb)?;
    pb.finish_with_message("Downloaded weights");

    Ok(())
}

/// Copy `reader` into `path` through a sibling `.tmp` file.
///
/// The temporary file is removed if reading or writing fails, so an
/// interrupted download never leaves partial weights behind.
fn stream_to_file<R: Read>(reader: &mut R, path: &Path, pb: &ProgressBar) -> Result<()> {
    let temp_path = path.with_extension("tmp");

    let written = (|| -> std::io::Result<()> {
        let mut file = fs::File::create(&temp_path)?;
        let mut buffer = [0u8; 8192];
        loop {
            let bytes_read = reader.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            file.write_all(&buffer[..bytes_read])?;
            pb.inc(bytes_read as u64);
        }
        file.flush()
    })();

    if let Err(err) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(err.into());
    }

    fs::rename(&temp_path, path)?;
    Ok(())
}
