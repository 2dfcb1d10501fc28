//! Row partitioning across a fixed number of workers.
//!
//! Rows are dealt out in contiguous bands in rank order. With `h` rows and `n`
//! workers every worker gets `h / n` rows and the first `h % n` workers get one
//! more, so band sizes differ by at most one and their concatenation is the
//! original row order. When `n > h` the trailing workers receive empty bands.
use serde::Serialize;

/// One worker's share of the image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BandAssignment {
    /// Global index of the band's first row.
    pub first_row: usize,
    pub rows: usize,
    pub byte_count: usize,
    pub byte_offset: usize,
}

impl BandAssignment {
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Byte range of the band within the full pixel buffer.
    pub fn byte_range(&self) -> std::ops::Range<usize> {
        self.byte_offset..self.byte_offset + self.byte_count
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionPlan {
    row_stride: usize,
    entries: Vec<BandAssignment>,
}

impl PartitionPlan {
    /// Split `height` rows of `row_stride` bytes across `workers` ranks.
    pub fn new(height: usize, row_stride: usize, workers: usize) -> Self {
        assert!(workers >= 1, "partition plan requires at least one worker");
        let base = height / workers;
        let extra = height % workers;

        let mut entries = Vec::with_capacity(workers);
        let mut first_row = 0;
        let mut byte_offset = 0;
        for rank in 0..workers {
            let rows = base + usize::from(rank < extra);
            let byte_count = rows * row_stride;
            entries.push(BandAssignment {
                first_row,
                rows,
                byte_count,
                byte_offset,
            });
            first_row += rows;
            byte_offset += byte_count;
        }

        Self {
            row_stride,
            entries,
        }
    }

    pub fn workers(&self) -> usize {
        self.entries.len()
    }

    pub fn row_stride(&self) -> usize {
        self.row_stride
    }

    pub fn entries(&self) -> &[BandAssignment] {
        &self.entries
    }

    pub fn assignment(&self, rank: usize) -> Option<&BandAssignment> {
        self.entries.get(rank)
    }

    pub fn height(&self) -> usize {
        self.entries.iter().map(|e| e.rows).sum()
    }

    pub fn total_bytes(&self) -> usize {
        self.entries.iter().map(|e| e.byte_count).sum()
    }

    pub fn byte_counts(&self) -> Vec<usize> {
        self.entries.iter().map(|e| e.byte_count).collect()
    }

    pub fn byte_offsets(&self) -> Vec<usize> {
        self.entries.iter().map(|e| e.byte_offset).collect()
    }

    /// Global rows the banded stencil never computes: the first and last row
    /// of every non-empty band. Includes the image's own top and bottom rows.
    pub fn seams(&self) -> Vec<usize> {
        let mut rows = Vec::new();
        for e in self.entries.iter().filter(|e| !e.is_empty()) {
            rows.push(e.first_row);
            let last = e.first_row + e.rows - 1;
            if last != e.first_row {
                rows.push(last);
            }
        }
        rows
    }
}
