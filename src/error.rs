//! Error types for the grayscale pipeline.
//!
//! Every variant is fatal to a pipeline run. The variants form a closed set
//! mirrored by [`ErrorKind`], which the CLI maps to an exit status.

use std::collections::TryReserveError;
use std::path::PathBuf;

/// Error produced by a codec binding behind [`crate::codec`].
pub type CodecError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while converting an image.
#[derive(Debug, thiserror::Error)]
pub enum GrayscaleError {
    #[error("error opening jpeg file '{}': {source}", path.display())]
    InputOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error opening output jpeg file '{}': {source}", path.display())]
    OutputOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to allocate {requested} bytes for scanline buffer")]
    Allocation {
        /// Bytes requested, or `usize::MAX` if the size overflowed
        requested: usize,
        #[source]
        source: Option<TryReserveError>,
    },

    #[error("failed to read jpeg header of '{}': {source}", path.display())]
    DecodeHeader {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    #[error("failed to decode scanlines of '{}': {source}", path.display())]
    DecodeRead {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    #[error("failed to write jpeg file '{}': {source}", path.display())]
    EncodeWrite {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    #[error("{what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Which length or count disagreed
        what: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Closed set of failure kinds, independent of payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InputOpen,
    OutputOpen,
    Allocation,
    DecodeHeader,
    DecodeRead,
    EncodeWrite,
    DimensionMismatch,
}

impl GrayscaleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GrayscaleError::InputOpen { .. } => ErrorKind::InputOpen,
            GrayscaleError::OutputOpen { .. } => ErrorKind::OutputOpen,
            GrayscaleError::Allocation { .. } => ErrorKind::Allocation,
            GrayscaleError::DecodeHeader { .. } => ErrorKind::DecodeHeader,
            GrayscaleError::DecodeRead { .. } => ErrorKind::DecodeRead,
            GrayscaleError::EncodeWrite { .. } => ErrorKind::EncodeWrite,
            GrayscaleError::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
        }
    }

    pub(crate) fn mismatch(what: &'static str, expected: usize, actual: usize) -> Self {
        GrayscaleError::DimensionMismatch {
            what,
            expected,
            actual,
        }
    }
}
