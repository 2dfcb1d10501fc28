//! JSON configuration for batch runs.
pub mod batch;

pub use batch::{load_config, BatchConfig};
