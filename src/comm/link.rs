//! Channel plumbing for a statically sized participant group.
use super::ImageJob;
use crossbeam::channel::{unbounded, Receiver, Sender};
use log::debug;
use serde::Serialize;
use std::sync::Arc;

pub const COLLECTOR_RANK: usize = 0;

/// Collector-to-worker traffic.
#[derive(Debug)]
pub(crate) enum Downlink {
    Job(Arc<ImageJob>),
    Band(Vec<u8>),
    Shutdown,
}

/// Band bytes moved by one participant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommStats {
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

/// Rank 0's end of the group.
#[derive(Debug)]
pub struct CollectorLink {
    pub(crate) to_workers: Vec<Sender<Downlink>>,
    pub(crate) from_workers: Vec<Receiver<Vec<u8>>>,
    pub(crate) stats: CommStats,
}

/// A worker's end of the group.
#[derive(Debug)]
pub struct WorkerLink {
    pub(crate) rank: usize,
    pub(crate) size: usize,
    pub(crate) from_collector: Receiver<Downlink>,
    pub(crate) to_collector: Sender<Vec<u8>>,
    pub(crate) stats: CommStats,
}

/// Create a group of `size` participants: the collector link and one link
/// per worker, ordered by rank starting at 1.
pub fn group(size: usize) -> (CollectorLink, Vec<WorkerLink>) {
    assert!(size >= 1, "a group needs at least the collector");
    let mut to_workers = Vec::with_capacity(size - 1);
    let mut from_workers = Vec::with_capacity(size - 1);
    let mut workers = Vec::with_capacity(size - 1);
    for rank in 1..size {
        let (down_tx, down_rx) = unbounded();
        let (up_tx, up_rx) = unbounded();
        to_workers.push(down_tx);
        from_workers.push(up_rx);
        workers.push(WorkerLink {
            rank,
            size,
            from_collector: down_rx,
            to_collector: up_tx,
            stats: CommStats::default(),
        });
    }
    debug!("created participant group of {size}");
    (
        CollectorLink {
            to_workers,
            from_workers,
            stats: CommStats::default(),
        },
        workers,
    )
}

impl CollectorLink {
    pub fn rank(&self) -> usize {
        COLLECTOR_RANK
    }

    pub fn size(&self) -> usize {
        self.to_workers.len() + 1
    }

    /// Counters accumulated since the last call; resets them.
    pub fn take_stats(&mut self) -> CommStats {
        std::mem::take(&mut self.stats)
    }
}

impl WorkerLink {
    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn take_stats(&mut self) -> CommStats {
        std::mem::take(&mut self.stats)
    }
}
