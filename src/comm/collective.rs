//! Broadcast, scatter and gather over a `group`.
use super::link::{CollectorLink, Downlink, WorkerLink, COLLECTOR_RANK};
use super::ImageJob;
use crate::error::{Error, Result};
use crate::partition::PartitionPlan;
use log::debug;
use std::sync::Arc;

fn copy_band(src: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    out.try_reserve_exact(src.len())
        .map_err(|_| Error::Allocation {
            what: "band buffer",
            bytes: src.len(),
        })?;
    out.extend_from_slice(src);
    Ok(out)
}

fn check_plan_size(plan: &PartitionPlan, size: usize) -> Result<()> {
    if plan.workers() != size {
        return Err(Error::CollectiveMismatch {
            rank: COLLECTOR_RANK,
            expected: size,
            actual: plan.workers(),
        });
    }
    Ok(())
}

impl CollectorLink {
    /// Send the job to every worker. Returns the collector's own handle.
    pub fn broadcast(&mut self, job: ImageJob) -> Result<Arc<ImageJob>> {
        check_plan_size(&job.plan, self.size())?;
        let job = Arc::new(job);
        for (i, tx) in self.to_workers.iter().enumerate() {
            tx.send(Downlink::Job(Arc::clone(&job)))
                .map_err(|_| Error::Unreachable { rank: i + 1 })?;
        }
        debug!("image {}: broadcast to {} workers", job.index, self.to_workers.len());
        Ok(job)
    }

    /// Hand each worker its byte range of `pixels`; returns rank 0's band.
    pub fn scatter(&mut self, pixels: &[u8], plan: &PartitionPlan) -> Result<Vec<u8>> {
        check_plan_size(plan, self.size())?;
        if pixels.len() != plan.total_bytes() {
            return Err(Error::CollectiveMismatch {
                rank: COLLECTOR_RANK,
                expected: plan.total_bytes(),
                actual: pixels.len(),
            });
        }
        for (i, tx) in self.to_workers.iter().enumerate() {
            let rank = i + 1;
            let band = &plan.entries()[rank];
            tx.send(Downlink::Band(copy_band(&pixels[band.byte_range()])?))
                .map_err(|_| Error::Unreachable { rank })?;
            self.stats.bytes_sent += band.byte_count as u64;
        }
        debug!("scatter: {} bytes across {} ranks", pixels.len(), plan.workers());
        copy_band(&pixels[plan.entries()[COLLECTOR_RANK].byte_range()])
    }

    /// Collect every rank's processed band into one buffer in plan order.
    pub fn gather(&mut self, own: Vec<u8>, plan: &PartitionPlan) -> Result<Vec<u8>> {
        check_plan_size(plan, self.size())?;
        let mut out = crate::error::try_zeroed("gather buffer", plan.total_bytes())?;

        let mine = &plan.entries()[COLLECTOR_RANK];
        if own.len() != mine.byte_count {
            return Err(Error::CollectiveMismatch {
                rank: COLLECTOR_RANK,
                expected: mine.byte_count,
                actual: own.len(),
            });
        }
        out[mine.byte_range()].copy_from_slice(&own);

        for (i, rx) in self.from_workers.iter().enumerate() {
            let rank = i + 1;
            let band = &plan.entries()[rank];
            let payload = rx.recv().map_err(|_| Error::Unreachable { rank })?;
            if payload.len() != band.byte_count {
                return Err(Error::CollectiveMismatch {
                    rank,
                    expected: band.byte_count,
                    actual: payload.len(),
                });
            }
            out[band.byte_range()].copy_from_slice(&payload);
            self.stats.bytes_received += payload.len() as u64;
        }
        debug!("gather: {} bytes from {} ranks", out.len(), plan.workers());
        Ok(out)
    }

    /// Tell every worker the batch is over.
    pub fn shutdown(self) {
        for (i, tx) in self.to_workers.iter().enumerate() {
            if tx.send(Downlink::Shutdown).is_err() {
                debug!("shutdown: rank {} already gone", i + 1);
            }
        }
    }
}

impl WorkerLink {
    /// Wait for the next job. `None` once the collector has shut down.
    pub fn recv_job(&mut self) -> Result<Option<Arc<ImageJob>>> {
        match self.from_collector.recv() {
            Ok(Downlink::Job(job)) => Ok(Some(job)),
            Ok(Downlink::Shutdown) => Ok(None),
            Ok(Downlink::Band(_)) => Err(Error::Protocol {
                rank: self.rank,
                expected: "job",
            }),
            Err(_) => Err(Error::Unreachable {
                rank: COLLECTOR_RANK,
            }),
        }
    }

    /// Receive this rank's band and check it against the plan.
    pub fn recv_band(&mut self, plan: &PartitionPlan) -> Result<Vec<u8>> {
        let expected = plan
            .assignment(self.rank)
            .map(|b| b.byte_count)
            .ok_or(Error::CollectiveMismatch {
                rank: self.rank,
                expected: self.size,
                actual: plan.workers(),
            })?;
        match self.from_collector.recv() {
            Ok(Downlink::Band(band)) if band.len() == expected => {
                self.stats.bytes_received += band.len() as u64;
                Ok(band)
            }
            Ok(Downlink::Band(band)) => Err(Error::CollectiveMismatch {
                rank: self.rank,
                expected,
                actual: band.len(),
            }),
            Ok(_) => Err(Error::Protocol {
                rank: self.rank,
                expected: "band",
            }),
            Err(_) => Err(Error::Unreachable {
                rank: COLLECTOR_RANK,
            }),
        }
    }

    pub fn send_band(&mut self, band: Vec<u8>) -> Result<()> {
        let len = band.len() as u64;
        self.to_collector
            .send(band)
            .map_err(|_| Error::Unreachable {
                rank: COLLECTOR_RANK,
            })?;
        self.stats.bytes_sent += len;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::{group, CommStats};
    use crate::image::BmpImage;
    use std::thread;

    fn job(height: i32, width: usize, workers: usize) -> (ImageJob, Vec<u8>) {
        let stride = crate::image::row_stride(width);
        let rows = height.unsigned_abs() as usize;
        let pixels: Vec<u8> = (0..stride * rows).map(|i| (i % 256) as u8).collect();
        let img = BmpImage::from_pixels(width, height, pixels.clone()).unwrap();
        let job = ImageJob {
            index: 1,
            file_header: img.file_header,
            info_header: img.info_header,
            plan: PartitionPlan::new(rows, stride, workers),
        };
        (job, pixels)
    }

    #[test]
    fn scatter_then_gather_restores_row_order() {
        let (job, pixels) = job(10, 3, 3);
        let (mut collector, workers) = group(3);

        thread::scope(|s| {
            for mut w in workers {
                s.spawn(move || {
                    let job = w.recv_job().unwrap().unwrap();
                    let band = w.recv_band(&job.plan).unwrap();
                    let b = job.band(w.rank());
                    assert_eq!(band.len(), b.rows * job.row_stride());
                    w.send_band(band).unwrap();
                    assert!(w.recv_job().unwrap().is_none());
                    let stats = w.take_stats();
                    assert_eq!(stats.bytes_sent, stats.bytes_received);
                });
            }

            let shared = collector.broadcast(job.clone()).unwrap();
            let own = collector.scatter(&pixels, &shared.plan).unwrap();
            assert_eq!(own.len(), 4 * 12);
            let back = collector.gather(own, &shared.plan).unwrap();
            assert_eq!(back, pixels);
            let stats = collector.take_stats();
            assert_eq!(stats.bytes_sent, 6 * 12);
            assert_eq!(stats.bytes_received, 6 * 12);
            collector.shutdown();
        });
    }

    #[test]
    fn single_member_group_is_local() {
        let (job, pixels) = job(-4, 2, 1);
        let (mut collector, workers) = group(1);
        assert!(workers.is_empty());
        let shared = collector.broadcast(job).unwrap();
        let own = collector.scatter(&pixels, &shared.plan).unwrap();
        assert_eq!(collector.gather(own, &shared.plan).unwrap(), pixels);
        assert_eq!(collector.take_stats(), CommStats::default());
    }

    #[test]
    fn scatter_rejects_buffer_that_disagrees_with_plan() {
        let (job, mut pixels) = job(4, 2, 2);
        let (mut collector, _workers) = group(2);
        pixels.pop();
        let err = collector.scatter(&pixels, &job.plan).unwrap_err();
        assert!(matches!(err, Error::CollectiveMismatch { rank: 0, .. }), "{err}");
    }

    #[test]
    fn vanished_worker_is_unreachable() {
        let (job, pixels) = job(4, 2, 3);
        let (mut collector, mut workers) = group(3);
        drop(workers.pop());
        let err = collector
            .broadcast(job.clone())
            .and_then(|j| collector.scatter(&pixels, &j.plan))
            .unwrap_err();
        assert!(matches!(err, Error::Unreachable { rank: 2 }), "{err}");
    }

    #[test]
    fn worker_sees_collector_exit() {
        let (collector, mut workers) = group(2);
        drop(collector);
        let err = workers[0].recv_job().unwrap_err();
        assert!(matches!(err, Error::Unreachable { rank: 0 }));
    }

    #[test]
    fn short_band_from_worker_is_a_mismatch() {
        let (job, pixels) = job(6, 2, 2);
        let (mut collector, mut workers) = group(2);
        let shared = collector.broadcast(job).unwrap();
        let own = collector.scatter(&pixels, &shared.plan).unwrap();

        let w = &mut workers[0];
        let job = w.recv_job().unwrap().unwrap();
        let mut band = w.recv_band(&job.plan).unwrap();
        band.truncate(1);
        w.send_band(band).unwrap();

        let err = collector.gather(own, &shared.plan).unwrap_err();
        assert!(matches!(err, Error::CollectiveMismatch { rank: 1, actual: 1, .. }), "{err}");
    }
}
