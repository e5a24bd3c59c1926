use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A card, background or reference panel image could not be loaded.
///
/// Recoverable: the caller skips drawing the image and keeps running.
/// `Clone` so the asset cache can remember a failed load.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetLoadError {
    #[error("asset not found: {}", path.display())]
    Missing { path: PathBuf },

    #[error("failed to read {}: {reason}", path.display())]
    Unreadable { path: PathBuf, reason: String },

    #[error("no card registered for {location}")]
    Unregistered { location: String },
}

/// A video source cannot be opened, or holds no frames.
#[derive(Debug, Error)]
#[error("video source {} unavailable: {reason}", path.display())]
pub struct SourceUnavailable {
    pub path: PathBuf,
    pub reason: String,
}

/// A single frame failed to decode mid-stream. Treated as end of stream.
#[derive(Debug, Error)]
#[error("failed to decode frame {index}: {reason}")]
pub struct DecodeError {
    pub index: usize,
    pub reason: String,
}

/// The display surface failed. The only fatal error class at runtime.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// The atlas file is unreadable or inconsistent.
#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("atlas defines no locations")]
    NoLocations,

    #[error("location {0} is defined twice")]
    DuplicateLocation(String),

    #[error("state {state} lists unknown location {name}")]
    UnknownLocation { state: String, name: String },

    #[error("state {state} lists location {name} more than once")]
    DuplicateActive { state: String, name: String },
}
