//! Per-participant measurements: phase timings, bytes moved, peak memory.

pub mod metrics;
pub mod timing;

pub use metrics::{peak_rss_kb, ParticipantMetrics};
pub use timing::{StageTiming, TimingBreakdown};
