use super::timing::TimingBreakdown;
use crate::comm::CommStats;
use crate::error::Result;
use serde::Serialize;

/// What one participant reports for one image.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantMetrics {
    pub rank: usize,
    pub image: u32,
    pub rows: usize,
    pub compute_ms: f64,
    pub communication_ms: f64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    /// Process-wide high-water mark; participants share one process.
    pub peak_rss_kb: Option<u64>,
    pub timing: TimingBreakdown,
}

impl ParticipantMetrics {
    pub fn new(rank: usize, image: u32, rows: usize, timing: TimingBreakdown, comm: CommStats) -> Self {
        Self {
            rank,
            image,
            rows,
            compute_ms: timing.compute_ms(),
            communication_ms: timing.communication_ms(),
            bytes_sent: comm.bytes_sent,
            bytes_received: comm.bytes_received,
            peak_rss_kb: peak_rss_kb(),
            timing,
        }
    }

    /// Single-line JSON report.
    pub fn to_json_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Peak resident set size of this process in KiB.
#[cfg(unix)]
pub fn peak_rss_kb() -> Option<u64> {
    let mut usage = std::mem::MaybeUninit::<libc::rusage>::zeroed();
    // SAFETY: `usage` points to writable memory sized for `rusage`.
    let rc = unsafe { libc::getrusage(libc::RUSAGE_SELF, usage.as_mut_ptr()) };
    if rc != 0 {
        return None;
    }
    // SAFETY: getrusage returned 0 and filled the struct.
    let max = unsafe { usage.assume_init() }.ru_maxrss;
    let max = u64::try_from(max).ok()?;
    if cfg!(target_os = "macos") {
        Some(max / 1024)
    } else {
        Some(max)
    }
}

#[cfg(not(unix))]
pub fn peak_rss_kb() -> Option<u64> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::timing::{STAGE_COMPUTE, STAGE_GATHER, STAGE_SCATTER};

    #[test]
    fn json_line_has_no_newlines() {
        let mut timing = TimingBreakdown::default();
        timing.push(STAGE_SCATTER, 0.5);
        timing.push(STAGE_COMPUTE, 3.0);
        timing.push(STAGE_GATHER, 0.25);
        let m = ParticipantMetrics::new(
            2,
            7,
            3,
            timing,
            CommStats {
                bytes_sent: 36,
                bytes_received: 36,
            },
        );
        assert_eq!(m.communication_ms, 0.75);
        let line = m.to_json_line().unwrap();
        assert!(!line.contains('\n'));
        let v: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(v["rank"], 2);
        assert_eq!(v["image"], 7);
        assert_eq!(v["computeMs"], 3.0);
        assert_eq!(v["bytesSent"], 36);
    }

    #[cfg(unix)]
    #[test]
    fn peak_rss_is_reported_on_unix() {
        let kb = peak_rss_kb().unwrap();
        assert!(kb > 0);
    }
}
