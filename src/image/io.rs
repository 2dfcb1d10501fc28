//! Output helpers beyond the bitmap codec.
//!
//! - `save_edge_preview`: write channel 0 of a B,G,R edge map to a grayscale PNG.
//! - `write_json_file`: pretty-print a serializable value to disk.
use super::{BgrView, ImageView};
use crate::error::{Error, Result};
use image::{GrayImage, Luma};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Save an edge map as a grayscale PNG. `top_down` selects whether row 0 of
/// `pixels` is the top of the picture.
pub fn save_edge_preview(path: &Path, edges: BgrView<'_>, top_down: bool) -> Result<()> {
    ensure_parent_dir(path)?;
    let mut out = GrayImage::new(edges.w as u32, edges.h as u32);
    for (y, row) in edges.rows().enumerate() {
        let dst_y = if top_down { y } else { edges.h - 1 - y };
        for (x, bgr) in row.chunks_exact(3).enumerate() {
            out.put_pixel(x as u32, dst_y as u32, Luma([bgr[0]]));
        }
    }
    out.save(path).map_err(|source| Error::Preview {
        path: path.to_path_buf(),
        source,
    })
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).map_err(|e| Error::io(path, e))
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
    }
    Ok(())
}
