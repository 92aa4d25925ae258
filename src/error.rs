//! Error taxonomy for a batch run.
//!
//! Everything except `ImageNotFound` and `ImageDecode` aborts the run before
//! (or while) writing output. The two image errors are contained inside a
//! single iteration of the image loop and only bump the skip count.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BatchError {
    /// The layout file does not exist.
    #[error("config file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    /// The layout file exists but a line could not be parsed.
    #[error("malformed config {} (line {line}): {reason}", path.display())]
    ConfigMalformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// The image list could not be opened.
    #[error("could not read image list {}: {source}", path.display())]
    ImageListUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not open output file {}: {source}", path.display())]
    OutputUnwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write to output file {}: {source}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not initialize tesseract: {0}")]
    EngineInitFailed(String),

    #[error("image not found: {}", path.display())]
    ImageNotFound { path: PathBuf },

    #[error("failed to load image {}: {source}", path.display())]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl BatchError {
    /// True for per-image failures that skip the image instead of ending the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            BatchError::ImageNotFound { .. } | BatchError::ImageDecode { .. }
        )
    }
}
