//! Rain-map compositing, post-processing, and orchestration.

mod composite;
mod contrast;
mod filters;
mod luminance;
mod restore;
mod sharpen;

pub use composite::composite;
pub use contrast::enhance_contrast;
pub use luminance::{blend_luminance, brightness_channel};
pub use restore::{restore, Pipeline, RestoreConfig};
pub use sharpen::sharpen;
