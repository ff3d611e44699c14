//! # derain
//!
//! Remove rain streaks from photographs with a frequency-domain restoration
//! pipeline.
//!
//! An image is transformed to a per-channel 2D spectrum, a learned operator
//! estimates the additive rain layer from that spectrum, and the estimate is
//! subtracted from the losslessly reconstructed image. The residual is then
//! sharpened and recombined with the source chroma so that colour and mean
//! brightness match the input.
//!
//! ## Example
//!
//! ```no_run
//! use derain::{ModelStore, Pipeline, RestoreConfig};
//!
//! # fn main() -> derain::Result<()> {
//! let estimator = ModelStore::new()?.load_estimator()?;
//! let pipeline = Pipeline::new(RestoreConfig::default())?;
//!
//! pipeline.process(estimator.as_ref(), "rainy.png", "clean.png")?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod frequency;
pub mod image;
pub mod model;
pub mod pipeline;

pub use error::{Error, Result};
pub use frequency::{FrequencyMode, FrequencyTensor};
pub use model::{DegradationOperator, ModelStore};
pub use pipeline::{restore, Pipeline, RestoreConfig};
