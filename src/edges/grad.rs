//! 3×3 Sobel stencil over a precomputed grayscale band.
//!
//! The stencil reads only the grayscale buffer and writes only the interior of
//! the output band, so it never needs clamped borders: rows and columns
//! without a full neighborhood are skipped.
use crate::image::{GrayImage, ImageView};

type Kernel3 = [[i32; 3]; 3];

const SOBEL_KERNEL_X: Kernel3 = [[-1, 0, 1], [-2, 0, 2], [-1, 0, 1]];
const SOBEL_KERNEL_Y: Kernel3 = [[-1, -2, -1], [0, 0, 0], [1, 2, 1]];

/// Raw `(gx, gy)` sums at an interior pixel.
#[inline]
pub fn sobel_at(gray: &GrayImage, x: usize, y: usize) -> (i32, i32) {
    let rows = [gray.row(y - 1), gray.row(y), gray.row(y + 1)];
    let mut sum_x = 0;
    let mut sum_y = 0;
    for (ky, row) in rows.iter().enumerate() {
        let kx_row = &SOBEL_KERNEL_X[ky];
        let ky_row = &SOBEL_KERNEL_Y[ky];
        for (kx, &sample) in row[x - 1..=x + 1].iter().enumerate() {
            let sample = i32::from(sample);
            sum_x += sample * kx_row[kx];
            sum_y += sample * ky_row[kx];
        }
    }
    (sum_x, sum_y)
}

/// `round(sqrt(gx² + gy²))` clamped to 255.
#[inline]
pub fn magnitude(gx: i32, gy: i32) -> u8 {
    let m = f64::from(gx * gx + gy * gy).sqrt().round();
    m.min(255.0) as u8
}

/// Write edge magnitudes for rows `[row_start + 1, row_end - 1)` into `out`,
/// a B,G,R buffer with `row_stride` bytes per row and the gray band's shape.
pub fn sobel_into(
    gray: &GrayImage,
    out: &mut [u8],
    row_stride: usize,
    row_start: usize,
    row_end: usize,
) {
    let w = gray.w;
    let row_end = row_end.min(gray.h);
    if w < 3 || row_end < row_start + 3 {
        return;
    }
    debug_assert!(out.len() >= gray.h * row_stride);

    for y in row_start + 1..row_end - 1 {
        let dst = &mut out[y * row_stride..y * row_stride + w * 3];
        for x in 1..w - 1 {
            let (gx, gy) = sobel_at(gray, x, y);
            let edge = magnitude(gx, gy);
            dst[x * 3..x * 3 + 3].fill(edge);
        }
    }
}
