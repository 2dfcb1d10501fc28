use serde::{Deserialize, Serialize};
use std::time::Instant;

pub const STAGE_BROADCAST: &str = "broadcast";
pub const STAGE_SCATTER: &str = "scatter";
pub const STAGE_COMPUTE: &str = "compute";
pub const STAGE_GATHER: &str = "gather";

/// Timing entry describing a single phase of one image on one participant.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTiming {
    pub label: String,
    pub elapsed_ms: f64,
}

impl StageTiming {
    pub fn new(label: impl Into<String>, elapsed_ms: f64) -> Self {
        Self {
            label: label.into(),
            elapsed_ms,
        }
    }
}

/// Ordered phase timings for one image on one participant.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingBreakdown {
    pub total_ms: f64,
    pub stages: Vec<StageTiming>,
}

impl TimingBreakdown {
    pub fn push(&mut self, label: impl Into<String>, elapsed_ms: f64) {
        self.total_ms += elapsed_ms;
        self.stages.push(StageTiming::new(label, elapsed_ms));
    }

    /// Run `f`, recording its wall-clock duration under `label`.
    pub fn measure<T>(&mut self, label: &str, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        self.push(label, start.elapsed().as_secs_f64() * 1000.0);
        out
    }

    /// Sum of all stages whose label is in `labels`.
    pub fn sum_of(&self, labels: &[&str]) -> f64 {
        self.stages
            .iter()
            .filter(|s| labels.contains(&s.label.as_str()))
            .map(|s| s.elapsed_ms)
            .sum()
    }

    pub fn compute_ms(&self) -> f64 {
        self.sum_of(&[STAGE_COMPUTE])
    }

    /// Band traffic only: scatter plus gather.
    pub fn communication_ms(&self) -> f64 {
        self.sum_of(&[STAGE_SCATTER, STAGE_GATHER])
    }
}
