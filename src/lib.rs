#![doc = include_str!("../README.md")]

pub mod comm;
pub mod config;
pub mod coordinator;
pub mod diagnostics;
pub mod edges;
pub mod error;
pub mod image;
pub mod partition;

// --- High-level re-exports -------------------------------------------------

pub use crate::config::{load_config, BatchConfig};
pub use crate::coordinator::{run_batch, BatchReport, ImageOutcome};
pub use crate::edges::{detect_band, EdgeBand};
pub use crate::error::{Error, Result};
pub use crate::image::BmpImage;
pub use crate::partition::{BandAssignment, PartitionPlan};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use band_sobel::prelude::*;
/// use std::path::Path;
///
/// # fn main() -> Result<(), band_sobel::Error> {
/// let img = BmpImage::read(Path::new("images/6.bmp"))?;
/// let edges = detect_band(img.view(), 0, img.height())?;
/// img.with_pixels(edges.pixels)?.write(Path::new("images/edges_6.bmp"))?;
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::edges::detect_band;
    pub use crate::image::{BgrView, BmpImage};
    pub use crate::partition::PartitionPlan;
    pub use crate::{run_batch, BatchConfig};
}
