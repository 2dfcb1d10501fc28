use crate::image::{BmpFileHeader, BmpInfoHeader};
use crate::partition::{BandAssignment, PartitionPlan};

/// Everything a worker needs to know about the image in flight.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageJob {
    pub index: u32,
    pub file_header: BmpFileHeader,
    pub info_header: BmpInfoHeader,
    pub plan: PartitionPlan,
}

impl ImageJob {
    pub fn width(&self) -> usize {
        self.info_header.width()
    }

    pub fn row_stride(&self) -> usize {
        self.info_header.row_stride()
    }

    /// Band assigned to `rank`. Ranks outside the group get an empty band at
    /// the end of the buffer.
    pub fn band(&self, rank: usize) -> BandAssignment {
        self.plan.assignment(rank).copied().unwrap_or(BandAssignment {
            first_row: self.plan.height(),
            rows: 0,
            byte_count: 0,
            byte_offset: self.plan.total_bytes(),
        })
    }
}
