//! Collective communication for a fixed group of participants.
//!
//! Rank 0 is the collector; ranks `1..size` are workers. Each image goes
//! through three collectives in order:
//!
//! 1. `broadcast`: the collector sends the shared `ImageJob` (headers and the
//!    partition plan) to every worker.
//! 2. `scatter`: each rank receives exactly its planned byte range of the
//!    pixel buffer.
//! 3. `gather`: processed bands return to the collector and are placed at the
//!    same offsets, restoring row order.
//!
//! Participants are threads connected by one downlink and one uplink channel
//! per worker. A closed channel means the peer is gone and is reported as
//! `Error::Unreachable`; a payload that disagrees with the plan is
//! `Error::CollectiveMismatch`. Neither is recoverable.

pub mod collective;
pub mod job;
pub mod link;

pub use job::ImageJob;
pub use link::{group, CollectorLink, CommStats, WorkerLink, COLLECTOR_RANK};
