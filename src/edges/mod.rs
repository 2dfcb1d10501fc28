//! Band-local Sobel edge detection on B,G,R rows.
//!
//! Two passes over a worker's band:
//!
//! - `gray`: reduce every row in `[row_start, row_end)` to 8-bit luminance.
//! - `grad`: 3×3 Sobel stencil over rows `[row_start + 1, row_end - 1)` and
//!   columns `[1, width - 1)`, writing the clamped gradient magnitude into all
//!   three channels.
//!
//! Band edges are not computed: the stencil has no context beyond the band,
//! so the first and last row of every band (and the outer columns) keep
//! whatever the output buffer held. `detect_band` starts from a zeroed buffer,
//! so those pixels come out black. Adjacent bands therefore leave a two-row
//! seam where they meet.

pub mod grad;
pub mod gray;

pub use grad::{magnitude, sobel_at, sobel_into};
pub use gray::{luma, to_gray_rows};

use crate::error::{try_zeroed, Result};
use crate::image::BgrView;

/// Edge map for one band, same shape and stride as the input band.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdgeBand {
    pub width: usize,
    pub rows: usize,
    pub row_stride: usize,
    pub pixels: Vec<u8>,
}

impl EdgeBand {
    pub fn view(&self) -> BgrView<'_> {
        BgrView {
            w: self.width,
            h: self.rows,
            stride: self.row_stride,
            data: &self.pixels,
        }
    }
}

/// Compute the edge map of `band` between local rows `row_start` and `row_end`.
///
/// An empty band (or an empty row range) yields an all-zero map of the band's
/// size without touching any pixel.
pub fn detect_band(band: BgrView<'_>, row_start: usize, row_end: usize) -> Result<EdgeBand> {
    let mut pixels = try_zeroed("edge map", band.stride * band.h)?;
    let row_end = row_end.min(band.h);
    if row_start < row_end {
        let gray = to_gray_rows(band, row_start, row_end)?;
        sobel_into(&gray, &mut pixels, band.stride, row_start, row_end);
    }
    Ok(EdgeBand {
        width: band.w,
        rows: band.h,
        row_stride: band.stride,
        pixels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{row_stride, ImageView};

    fn solid(width: usize, height: usize, f: impl Fn(usize, usize) -> [u8; 3]) -> Vec<u8> {
        let stride = row_stride(width);
        let mut data = vec![0u8; stride * height];
        for y in 0..height {
            for x in 0..width {
                let i = y * stride + x * 3;
                data[i..i + 3].copy_from_slice(&f(x, y));
            }
        }
        data
    }

    #[test]
    fn flat_image_has_no_edges() {
        let data = solid(4, 4, |_, _| [90, 90, 90]);
        let edges = detect_band(BgrView::new(4, &data), 0, 4).unwrap();
        let view = edges.view();
        for y in 1..3 {
            for x in 1..3 {
                assert_eq!(view.get(x, y), [0, 0, 0]);
            }
        }
    }

    #[test]
    fn hard_vertical_edge_saturates() {
        let data = solid(3, 3, |x, _| if x < 2 { [0, 0, 0] } else { [255, 255, 255] });
        let gray = to_gray_rows(BgrView::new(3, &data), 0, 3).unwrap();
        let (gx, gy) = sobel_at(&gray, 1, 1);
        assert_eq!(gx, 4 * gray.get(2, 1) as i32);
        assert!(gx >= 255);
        assert_eq!(gy, 0);

        let edges = detect_band(BgrView::new(3, &data), 0, 3).unwrap();
        assert_eq!(edges.view().get(1, 1), [255, 255, 255]);
    }

    #[test]
    fn only_outer_ring_is_left_untouched() {
        let (w, h) = (6, 5);
        let data = solid(w, h, |x, y| {
            let v = ((x * 37 + y * 91) % 256) as u8;
            [v, v.wrapping_mul(3), v.wrapping_add(17)]
        });
        let edges = detect_band(BgrView::new(w, &data), 0, h).unwrap();
        let view = edges.view();
        let gray = to_gray_rows(BgrView::new(w, &data), 0, h).unwrap();
        for y in 0..h {
            for x in 0..w {
                let px = view.get(x, y);
                if y == 0 || y == h - 1 || x == 0 || x == w - 1 {
                    assert_eq!(px, [0, 0, 0], "({x},{y})");
                } else {
                    let (gx, gy) = sobel_at(&gray, x, y);
                    let m = magnitude(gx, gy);
                    assert_eq!(px, [m, m, m], "({x},{y})");
                }
            }
        }
    }

    #[test]
    fn padding_bytes_stay_zero() {
        let data = solid(5, 4, |x, _| [(x * 60) as u8; 3]);
        let edges = detect_band(BgrView::new(5, &data), 0, 4).unwrap();
        let stride = row_stride(5);
        for y in 0..4 {
            assert_eq!(&edges.pixels[y * stride + 15..(y + 1) * stride], &[0]);
        }
    }

    #[test]
    fn degenerate_bands_are_no_ops() {
        for (w, h) in [(1, 1), (2, 2), (5, 2), (2, 5), (5, 0)] {
            let data = solid(w, h, |x, y| [(x * 40 + y * 10) as u8; 3]);
            let band = BgrView::new(w, &data);
            let edges = detect_band(band, 0, h).unwrap();
            assert_eq!(edges.rows, h);
            assert_eq!(edges.pixels.len(), data.len());
            assert!(edges.pixels.iter().all(|&b| b == 0), "{w}x{h}");
        }
    }

    #[test]
    fn row_range_limits_the_stencil() {
        let data = solid(4, 6, |x, _| if x < 2 { [0; 3] } else { [200; 3] });
        let band = BgrView::new(4, &data);
        let edges = detect_band(band, 2, 6).unwrap();
        let view = edges.view();
        assert_eq!(view.get(1, 2), [0; 3]);
        assert_ne!(view.get(1, 3), [0; 3]);
        assert_ne!(view.get(1, 4), [0; 3]);
        assert_eq!(view.get(1, 5), [0; 3]);
        assert_eq!(view.rows().count(), 6);
    }
}
