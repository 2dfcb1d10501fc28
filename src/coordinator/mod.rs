//! Drives a numbered batch of bitmaps through the participant group.
//!
//! The collector (rank 0) reads each image, plans the partition, broadcasts
//! the job, scatters the rows, runs the edge detector on its own band, gathers
//! the results and writes the output. Workers loop over broadcast, band
//! receipt, edge detection and send-back until the collector shuts the group
//! down. Both roles implement `Participant` and are run by `drive`.

pub mod batch;
pub mod participant;

pub use batch::{run_batch, BatchReport, ImageOutcome, ImageStage};
pub use participant::{drive, CollectorRole, Participant, Step, WorkerRole};
