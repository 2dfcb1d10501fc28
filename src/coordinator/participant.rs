use super::batch::{ImageOutcome, ImageStage};
use crate::comm::{CollectorLink, ImageJob, WorkerLink, COLLECTOR_RANK};
use crate::config::BatchConfig;
use crate::diagnostics::timing::{STAGE_BROADCAST, STAGE_COMPUTE, STAGE_GATHER, STAGE_SCATTER};
use crate::diagnostics::{ParticipantMetrics, TimingBreakdown};
use crate::edges::{detect_band, EdgeBand};
use crate::error::{Error, Result};
use crate::image::io::save_edge_preview;
use crate::image::{BgrView, BmpImage};
use crate::partition::PartitionPlan;
use log::{error, info, warn};
use std::ops::RangeInclusive;
use std::path::PathBuf;

/// Result of one `Participant::step`.
#[derive(Debug)]
pub enum Step {
    /// An image went through all collectives; this participant's report.
    Processed(ParticipantMetrics),
    /// The collector could not read an image; nothing was broadcast.
    Skipped,
    /// The batch is over.
    Finished,
}

/// One member of the group. Each call to `step` handles one image.
pub trait Participant {
    fn rank(&self) -> usize;
    fn step(&mut self) -> Result<Step>;
}

/// Run `participant` until the batch finishes, returning its per-image
/// reports. With `report` set each report is also printed as a JSON line.
pub fn drive<P: Participant + ?Sized>(
    participant: &mut P,
    report: bool,
) -> Result<Vec<ParticipantMetrics>> {
    let mut reports = Vec::new();
    loop {
        match participant.step() {
            Ok(Step::Processed(metrics)) => {
                if report {
                    println!("{}", metrics.to_json_line()?);
                }
                reports.push(metrics);
            }
            Ok(Step::Skipped) => {}
            Ok(Step::Finished) => return Ok(reports),
            Err(err) => {
                error!("rank {}: {err}", participant.rank());
                return Err(err);
            }
        }
    }
}

/// Edge detection over a whole local band, timed as the compute stage.
fn compute_band(job: &ImageJob, band: &[u8], timing: &mut TimingBreakdown) -> Result<EdgeBand> {
    let view = BgrView::new(job.width(), band);
    timing.measure(STAGE_COMPUTE, || detect_band(view, 0, view.h))
}

pub struct WorkerRole {
    link: WorkerLink,
}

impl WorkerRole {
    pub fn new(link: WorkerLink) -> Self {
        Self { link }
    }
}

impl Participant for WorkerRole {
    fn rank(&self) -> usize {
        self.link.rank()
    }

    fn step(&mut self) -> Result<Step> {
        let mut timing = TimingBreakdown::default();
        let link = &mut self.link;
        let Some(job) = timing.measure(STAGE_BROADCAST, || link.recv_job())? else {
            return Ok(Step::Finished);
        };
        let band = timing.measure(STAGE_SCATTER, || link.recv_band(&job.plan))?;
        let edges = compute_band(&job, &band, &mut timing)?;
        drop(band);
        timing.measure(STAGE_GATHER, || link.send_band(edges.pixels))?;

        let rank = link.rank();
        Ok(Step::Processed(ParticipantMetrics::new(
            rank,
            job.index,
            job.band(rank).rows,
            timing,
            link.take_stats(),
        )))
    }
}

/// Rank 0: owns file I/O, planning and the image queue.
pub struct CollectorRole<'a> {
    link: Option<CollectorLink>,
    config: &'a BatchConfig,
    queue: RangeInclusive<u32>,
    outcomes: Vec<ImageOutcome>,
}

impl<'a> CollectorRole<'a> {
    pub fn new(link: CollectorLink, config: &'a BatchConfig) -> Self {
        Self {
            link: Some(link),
            config,
            queue: config.images(),
            outcomes: Vec::new(),
        }
    }

    /// Per-image outcomes so far. Consumes the role, closing the group.
    pub fn into_outcomes(self) -> Vec<ImageOutcome> {
        self.outcomes
    }

    fn record_failure(&mut self, index: u32, stage: ImageStage, err: Error) -> Result<()> {
        if !(self.config.continue_on_error && err.is_image_local()) {
            error!("image {index}: {stage} failed: {err}");
            return Err(err);
        }
        warn!("image {index}: {stage} failed, skipping: {err}");
        self.outcomes.push(ImageOutcome::Failed {
            index,
            stage,
            message: err.to_string(),
        });
        Ok(())
    }

    /// Broadcast, scatter, compute and gather one image. Returns the
    /// reassembled edge image and the collector's report.
    fn distribute(
        &mut self,
        index: u32,
        image: BmpImage,
    ) -> Result<(BmpImage, PartitionPlan, ParticipantMetrics)> {
        let link = self.link.as_mut().ok_or(Error::Unreachable {
            rank: COLLECTOR_RANK,
        })?;
        let plan = PartitionPlan::new(image.height(), image.row_stride(), link.size());
        let job = ImageJob {
            index,
            file_header: image.file_header,
            info_header: image.info_header,
            plan,
        };

        let mut timing = TimingBreakdown::default();
        let job = timing.measure(STAGE_BROADCAST, || link.broadcast(job))?;
        let band = timing.measure(STAGE_SCATTER, || link.scatter(&image.pixels, &job.plan))?;
        let edges = compute_band(&job, &band, &mut timing)?;
        drop(band);
        let gathered = timing.measure(STAGE_GATHER, || link.gather(edges.pixels, &job.plan))?;

        let metrics = ParticipantMetrics::new(
            COLLECTOR_RANK,
            index,
            job.band(COLLECTOR_RANK).rows,
            timing,
            link.take_stats(),
        );
        Ok((image.with_pixels(gathered)?, job.plan.clone(), metrics))
    }

    fn store(&self, index: u32, output: &BmpImage) -> Result<PathBuf> {
        let path = self.config.output_path(index);
        output.write(&path)?;
        Ok(path)
    }

    /// Previews are a side output: a failure is logged and the image still
    /// counts as written.
    fn store_preview(&self, index: u32, output: &BmpImage) -> Option<PathBuf> {
        let path = self.config.preview_path(index)?;
        match save_edge_preview(&path, output.view(), output.info_header.is_top_down()) {
            Ok(()) => Some(path),
            Err(err) => {
                warn!("image {index}: preview not written: {err}");
                None
            }
        }
    }
}

impl Participant for CollectorRole<'_> {
    fn rank(&self) -> usize {
        COLLECTOR_RANK
    }

    fn step(&mut self) -> Result<Step> {
        let Some(index) = self.queue.next() else {
            if let Some(link) = self.link.take() {
                link.shutdown();
            }
            return Ok(Step::Finished);
        };

        let input = self.config.input_path(index);
        let image = match BmpImage::read(&input) {
            Ok(image) => image,
            Err(err) => {
                self.record_failure(index, ImageStage::Read, err)?;
                return Ok(Step::Skipped);
            }
        };
        let (width, height) = (image.width(), image.info_header.height);

        let (output, plan, metrics) = self.distribute(index, image)?;
        match self.store(index, &output) {
            Ok(path) => {
                info!(
                    "image {index}: {width}x{} over {} ranks -> {}",
                    height.unsigned_abs(),
                    plan.workers(),
                    path.display()
                );
                let preview = self.store_preview(index, &output);
                self.outcomes.push(ImageOutcome::Written {
                    index,
                    output: path,
                    width,
                    height,
                    seams: plan.seams(),
                    plan,
                    preview,
                });
            }
            Err(err) => self.record_failure(index, ImageStage::Write, err)?,
        }
        Ok(Step::Processed(metrics))
    }
}
