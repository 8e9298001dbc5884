//! Typed failures of the importer and the playback engine. The persistence
//! layer and the UI glue stay on `anyhow`; these variants exist so callers can
//! tell a bad pick from a broken disk or a missing audio device.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::importer::MediaKind;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("file I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("{} is not {expected} content", .path.display())]
    UnsupportedKind { path: PathBuf, expected: MediaKind },

    #[error("{} has no file name", .0.display())]
    MissingFileName(PathBuf),

    #[error("{} is already imported", .0.display())]
    AlreadyImported(PathBuf),

    #[error("could not decode {}: {reason}", .path.display())]
    Decode { path: PathBuf, reason: String },

    #[error("audio output unavailable: {0}")]
    Output(String),
}

pub type MediaResult<T> = Result<T, MediaError>;
