use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// A numbered range of bitmaps processed by a fixed group of workers.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct BatchConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// First image number, inclusive.
    pub first_image: u32,
    /// Last image number, inclusive.
    pub last_image: u32,
    /// Group size including the collector.
    pub workers: usize,
    pub output_prefix: String,
    /// Record a failed read/write and move on instead of aborting the batch.
    pub continue_on_error: bool,
    /// Print one JSON metrics line per participant per image on stdout.
    pub report_metrics: bool,
    pub summary_json: Option<PathBuf>,
    pub preview_dir: Option<PathBuf>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("images"),
            output_dir: PathBuf::from("images"),
            first_image: 6,
            last_image: 10,
            workers: 4,
            output_prefix: "sobel_mpi_".to_string(),
            continue_on_error: true,
            report_metrics: true,
            summary_json: None,
            preview_dir: None,
        }
    }
}

impl BatchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::Config("workers must be at least 1".to_string()));
        }
        if self.first_image > self.last_image {
            return Err(Error::Config(format!(
                "first_image {} is after last_image {}",
                self.first_image, self.last_image
            )));
        }
        Ok(())
    }

    pub fn images(&self) -> std::ops::RangeInclusive<u32> {
        self.first_image..=self.last_image
    }

    pub fn input_path(&self, index: u32) -> PathBuf {
        self.input_dir.join(format!("{index}.bmp"))
    }

    pub fn output_path(&self, index: u32) -> PathBuf {
        self.output_dir
            .join(format!("{}{index}.bmp", self.output_prefix))
    }

    pub fn preview_path(&self, index: u32) -> Option<PathBuf> {
        self.preview_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}{index}.png", self.output_prefix)))
    }
}

pub fn load_config(path: &Path) -> Result<BatchConfig> {
    let data = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let config: BatchConfig = serde_json::from_str(&data)
        .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
    config.validate()?;
    Ok(config)
}
