use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the detection core and the display mapping
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("failed to load image at {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("image has zero area ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("could not create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("viewport has zero area ({width}x{height})")]
    EmptyViewport { width: u32, height: u32 },

    #[error("debug directory is not empty: {0}")]
    DebugDirNotEmpty(PathBuf),

    #[error("failed to save debug image {path}: {source}")]
    DebugImage {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("could not access regions file {path}: {source}")]
    RegionsFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed regions file {path}: {source}")]
    RegionsFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DetectError>;
