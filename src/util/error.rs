//! Error types for the vcube library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for cube operations.
#[derive(Error, Debug)]
pub enum Error {
    /// File does not exist or cannot be accessed
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Header slot is truncated, not UTF-8, or not parseable
    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    /// Byte-order token outside the documented set (fatal, no default)
    #[error("Unresolved byte order token: {0:?}")]
    InvalidByteOrder(String),

    /// Dataset dimensionality outside 1-3, or zero-sized dimension
    #[error("Unsupported dataset shape: {0:?}; must be 1, 2 or 3 positive dimensions")]
    UnsupportedShape(Vec<usize>),

    /// File cannot cover the declared byte region
    #[error("Truncated region: need {required} bytes, file has {actual}")]
    TruncatedRegion { required: u64, actual: u64 },

    /// No backend matches the path
    #[error("Unrecognized cube format: {0}")]
    UnrecognizedFormat(PathBuf),

    /// Save destination extension maps to no backend
    #[error("Invalid save extension {extension:?} in {path}")]
    InvalidExtension { extension: String, path: PathBuf },

    /// Operation not supported by this backend
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Cube data accessed while unloaded
    #[error("Cube is not loaded")]
    NotLoaded,

    /// Named dataset absent from the cube
    #[error("Dataset not found: {0}")]
    MissingDataset(String),

    /// Slice axis outside the primary volume's rank
    #[error("Axis {axis} out of bounds (rank: {rank})")]
    AxisOutOfBounds { axis: usize, rank: usize },

    /// Slice index outside the axis extent
    #[error("Index {index} out of bounds (count: {count})")]
    IndexOutOfBounds { index: usize, count: usize },

    /// Element type mismatch between datasets or pages
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// Memory mapping failed
    #[error("Memory mapping failed: {0}")]
    MmapFailed(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TIFF codec error
    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    /// Zip container error
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create a malformed header error.
    pub fn header(msg: impl Into<String>) -> Self {
        Self::MalformedHeader(msg.into())
    }

    /// Create an unsupported-operation error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedOperation(msg.into())
    }
}

/// Result type alias for cube operations.
pub type Result<T> = std::result::Result<T, Error>;
