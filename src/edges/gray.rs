//! Luminance reduction of B,G,R rows.
use crate::error::Result;
use crate::image::{BgrView, GrayImage, ImageView, ImageViewMut};

/// `0.3 R + 0.59 G + 0.11 B`, truncated to 8 bits.
#[inline]
pub fn luma(b: u8, g: u8, r: u8) -> u8 {
    (0.3 * f64::from(r) + 0.59 * f64::from(g) + 0.11 * f64::from(b)) as u8
}

/// Grayscale copy of `band` with rows `[row_start, row_end)` filled in.
///
/// The result has the band's full height so row indices match the band;
/// rows outside the range stay zero.
pub fn to_gray_rows(band: BgrView<'_>, row_start: usize, row_end: usize) -> Result<GrayImage> {
    let mut gray = GrayImage::new(band.w, band.h)?;
    for y in row_start..row_end.min(band.h) {
        let src = band.row(y);
        let dst = gray.row_mut(y);
        for (px, bgr) in dst.iter_mut().zip(src.chunks_exact(3)) {
            *px = luma(bgr[0], bgr[1], bgr[2]);
        }
    }
    Ok(gray)
}
