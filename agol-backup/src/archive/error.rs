//! Error types for archive placement.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while creating run directories or persisting archives.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The run directory could not be created.
    #[error("Failed to create run directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A stale archive at the destination could not be removed.
    #[error("Failed to remove existing archive {path}: {source}")]
    RemoveExisting {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Streaming the archive to disk failed. The partial file was removed.
    #[error("Failed to write archive {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ArchiveError {
    /// The filesystem path involved in the failure.
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::CreateDirectory { path, .. }
            | Self::RemoveExisting { path, .. }
            | Self::Write { path, .. } => path,
        }
    }
}
