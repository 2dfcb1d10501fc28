use super::participant::{drive, CollectorRole, WorkerRole};
use crate::comm;
use crate::config::BatchConfig;
use crate::diagnostics::ParticipantMetrics;
use crate::error::{Error, Result};
use crate::image::io::write_json_file;
use crate::partition::PartitionPlan;
use log::info;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::thread;

/// Which collector step failed for an image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageStage {
    Read,
    Write,
}

impl fmt::Display for ImageStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Read => "read",
            Self::Write => "write",
        })
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ImageOutcome {
    #[serde(rename_all = "camelCase")]
    Written {
        index: u32,
        output: PathBuf,
        width: usize,
        /// Signed as in the header.
        height: i32,
        /// Stored rows left uncomputed at band edges.
        seams: Vec<usize>,
        /// Bands the image was split into, in rank order.
        plan: PartitionPlan,
        /// Set when a preview was requested and written.
        #[serde(skip_serializing_if = "Option::is_none")]
        preview: Option<PathBuf>,
    },
    #[serde(rename_all = "camelCase")]
    Failed {
        index: u32,
        stage: ImageStage,
        message: String,
    },
}

impl ImageOutcome {
    pub fn index(&self) -> u32 {
        match self {
            Self::Written { index, .. } | Self::Failed { index, .. } => *index,
        }
    }

    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written { .. })
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub workers: usize,
    pub images: Vec<ImageOutcome>,
    /// Every participant's report, ordered by image then rank.
    pub metrics: Vec<ParticipantMetrics>,
}

impl BatchReport {
    pub fn written(&self) -> impl Iterator<Item = &ImageOutcome> {
        self.images.iter().filter(|o| o.is_written())
    }

    pub fn failed(&self) -> impl Iterator<Item = &ImageOutcome> {
        self.images.iter().filter(|o| !o.is_written())
    }
}

/// Process every image in `config` with a group of `config.workers`
/// participants and return what happened to each.
pub fn run_batch(config: &BatchConfig) -> Result<BatchReport> {
    config.validate()?;
    let report = config.report_metrics;
    let (collector_link, worker_links) = comm::group(config.workers);
    info!(
        "processing images {}..={} with {} participants",
        config.first_image, config.last_image, config.workers
    );

    let (collector, workers) = thread::scope(|s| {
        let handles: Vec<_> = worker_links
            .into_iter()
            .map(|link| {
                s.spawn(move || {
                    let mut role = WorkerRole::new(link);
                    drive(&mut role, report)
                })
            })
            .collect();

        // The role must be gone before joining so that an aborted collector
        // releases workers blocked on their downlink.
        let mut role = CollectorRole::new(collector_link, config);
        let result = drive(&mut role, report);
        let outcomes = role.into_outcomes();

        let workers: Vec<Result<Vec<ParticipantMetrics>>> = handles
            .into_iter()
            .enumerate()
            .map(|(i, h)| {
                h.join()
                    .unwrap_or_else(|_| Err(Error::Unreachable { rank: i + 1 }))
            })
            .collect();
        (result.map(|m| (m, outcomes)), workers)
    });

    let mut failures: Vec<Error> = Vec::new();
    let mut metrics = Vec::new();
    let outcomes = match collector {
        Ok((m, outcomes)) => {
            metrics.extend(m);
            Some(outcomes)
        }
        Err(err) => {
            failures.push(err);
            None
        }
    };
    for result in workers {
        match result {
            Ok(m) => metrics.extend(m),
            Err(err) => failures.push(err),
        }
    }
    if let Some(err) = root_cause(failures) {
        return Err(err);
    }

    metrics.sort_by_key(|m| (m.image, m.rank));
    let report = BatchReport {
        workers: config.workers,
        images: outcomes.unwrap_or_default(),
        metrics,
    };
    if let Some(path) = &config.summary_json {
        write_json_file(path, &report)?;
    }
    info!(
        "batch done: {} written, {} failed",
        report.written().count(),
        report.failed().count()
    );
    Ok(report)
}

/// When one participant fails the others only see it vanish; report the
/// original failure rather than the echo.
fn root_cause(failures: Vec<Error>) -> Option<Error> {
    let mut failures = failures.into_iter();
    let first = failures.next()?;
    if !matches!(first, Error::Unreachable { .. }) {
        return Some(first);
    }
    Some(
        failures
            .find(|e| !matches!(e, Error::Unreachable { .. }))
            .unwrap_or(first),
    )
}
