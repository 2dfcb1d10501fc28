use band_sobel::image::{row_stride, BmpImage};
use band_sobel::BatchConfig;
use std::path::{Path, PathBuf};

/// Padded B,G,R payload with diagonal stripes and a bright block, so that
/// most interior pixels carry a non-zero gradient.
pub fn stripes_bgr(width: usize, height: usize) -> Vec<u8> {
    assert!(width > 0 && height > 0, "image dimensions must be positive");
    let stride = row_stride(width);
    let mut data = vec![0u8; stride * height];
    for y in 0..height {
        for x in 0..width {
            let i = y * stride + x * 3;
            let stripe = ((x + 2 * y) / 3) % 2 == 0;
            let block = x > width / 2 && y > height / 3;
            let v = match (stripe, block) {
                (_, true) => 240u8,
                (true, false) => 30,
                (false, false) => 140,
            };
            data[i] = v;
            data[i + 1] = v.wrapping_add(x as u8);
            data[i + 2] = v.wrapping_sub(y as u8);
        }
    }
    data
}

/// Write `<dir>/<index>.bmp` and return its path.
pub fn write_numbered_bmp(dir: &Path, index: u32, width: usize, height: i32) -> PathBuf {
    let pixels = stripes_bgr(width, height.unsigned_abs() as usize);
    let image = BmpImage::from_pixels(width, height, pixels).unwrap();
    let path = dir.join(format!("{index}.bmp"));
    image.write(&path).unwrap();
    path
}

/// Quiet config reading from and writing to `dir`.
pub fn config_for(dir: &Path, first: u32, last: u32, workers: usize) -> BatchConfig {
    BatchConfig {
        input_dir: dir.to_path_buf(),
        output_dir: dir.join("out"),
        first_image: first,
        last_image: last,
        workers,
        output_prefix: "edges_".to_string(),
        continue_on_error: true,
        report_metrics: false,
        summary_json: None,
        preview_dir: None,
    }
}
