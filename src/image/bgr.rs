//! Borrowed view over blue-green-red rows padded to a 4-byte boundary.

/// Bytes per stored row for a 24-bit image: `width * 3` rounded up to 4.
#[inline]
pub fn row_stride(width: usize) -> usize {
    (width * 3 + 3) & !3
}

#[derive(Clone, Copy, Debug)]
pub struct BgrView<'a> {
    pub w: usize,
    pub h: usize,
    pub stride: usize, // bytes between rows
    pub data: &'a [u8],
}

impl<'a> BgrView<'a> {
    /// View `data` as rows of `width` pixels; the height is however many whole
    /// rows `data` holds.
    pub fn new(width: usize, data: &'a [u8]) -> Self {
        let stride = row_stride(width);
        let h = if stride == 0 { 0 } else { data.len() / stride };
        Self {
            w: width,
            h,
            stride,
            data,
        }
    }

    /// `[b, g, r]` at pixel (x, y).
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> [u8; 3] {
        let i = y * self.stride + x * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }
}

impl<'a> crate::image::traits::ImageView for BgrView<'a> {
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
        self.stride
    }
    #[inline]
    fn channels(&self) -> usize {
        3
    }
    #[inline]
    fn row(&self, y: usize) -> &[u8] {
        let start = y * self.stride;
        &self.data[start..start + self.w * 3]
    }
}
