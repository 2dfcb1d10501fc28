//! Owned single-channel 8-bit image (stride == width).
use crate::error::{try_zeroed, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImage {
    /// Image width in pixels
    pub w: usize,
    /// Image height in pixels
    pub h: usize,
    /// Backing storage in row-major order
    pub data: Vec<u8>,
}

impl GrayImage {
    /// Zero-initialized `w × h` buffer.
    pub fn new(w: usize, h: usize) -> Result<Self> {
        let data = try_zeroed("grayscale buffer", w * h)?;
        Ok(Self { w, h, data })
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.w + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: u8) {
        self.data[y * self.w + x] = v;
    }
}

impl crate::image::traits::ImageView for GrayImage {
    type Pixel = u8;

    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn stride(&self) -> usize {
        self.w
    }
    #[inline]
    fn row(&self, y: usize) -> &[u8] {
        let start = y * self.w;
        &self.data[start..start + self.w]
    }
}

impl crate::image::traits::ImageViewMut for GrayImage {
    #[inline]
    fn row_mut(&mut self, y: usize) -> &mut [u8] {
        let start = y * self.w;
        &mut self.data[start..start + self.w]
    }
}
