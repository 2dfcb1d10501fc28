//! Crate-wide error type.
//!
//! Codec failures (`Format`, `Io`) concern a single image and may be isolated
//! by the batch driver. `Allocation` means the process is out of memory. Collective failures (`CollectiveMismatch`,
//! `Unreachable`, `Protocol`) always abort the whole group.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Input is not an image this crate can process.
    #[error("{}: not a supported bitmap: {reason}", .path.display())]
    Format { path: PathBuf, reason: String },

    /// Missing file, short read/write or unwritable destination.
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to allocate {bytes} bytes for {what}")]
    Allocation { what: &'static str, bytes: usize },

    /// A participant saw a payload whose size disagrees with the partition plan.
    #[error("rank {rank}: payload disagrees with the partition plan (expected {expected}, got {actual})")]
    CollectiveMismatch {
        rank: usize,
        expected: usize,
        actual: usize,
    },

    #[error("participant {rank} is unreachable")]
    Unreachable { rank: usize },

    #[error("rank {rank}: unexpected message, wanted {expected}")]
    Protocol { rank: usize, expected: &'static str },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{}: failed to write preview: {source}", .path.display())]
    Preview {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Format {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// True for failures confined to one image's read or write.
    pub fn is_image_local(&self) -> bool {
        matches!(self, Self::Format { .. } | Self::Io { .. } | Self::Preview { .. })
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Allocate a zero-filled buffer, reporting failure instead of aborting.
pub(crate) fn try_zeroed(what: &'static str, bytes: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(bytes)
        .map_err(|_| Error::Allocation { what, bytes })?;
    buf.resize(bytes, 0);
    Ok(buf)
}
