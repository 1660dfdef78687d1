//! Error kinds for an import run. Per-file errors are reported and the walk
//! continues; configuration and walk errors abort the whole run.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Why a capture timestamp could not be read from a file.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("cannot open file: {0}")]
    Io(#[from] io::Error),
    #[error("cannot read exif data: {0}")]
    Exif(#[from] exif::Error),
    #[error("no capture time field present")]
    NoCaptureTime,
    #[error("malformed capture timestamp: {0}")]
    BadTimestamp(String),
}

#[derive(Debug, Error)]
pub enum ImportError {
    /// Invalid arguments or source/destination directories. Fatal before any
    /// transfer work begins.
    #[error("{0}")]
    Config(String),

    /// Capture timestamp unavailable for one file.
    #[error("{}: {source}", path.display())]
    Metadata {
        path: PathBuf,
        source: MetadataError,
    },

    /// Copy or mkdir failure while transferring one file.
    #[error("cannot copy {}: {source}", path.display())]
    Copy { path: PathBuf, source: io::Error },

    /// Destination stat failure for one file.
    #[error("cannot stat {}: {source}", path.display())]
    Stat { path: PathBuf, source: io::Error },

    /// Delta merge failure for one file (spawn error or fallback copy).
    #[error("cannot merge {}: {source}", path.display())]
    Merge { path: PathBuf, source: io::Error },

    /// The delta-transfer tool ran but exited non-zero. No fallback, no retry.
    #[error("rsync exited with {status}")]
    Tool { status: ExitStatus },

    /// The directory traversal itself failed. Fatal to the whole run.
    #[error("walk failed: {0}")]
    Walk(#[from] ignore::Error),
}
