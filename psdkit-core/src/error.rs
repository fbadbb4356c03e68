//! Error types for the psdkit library.

use thiserror::Error;

/// Main error type for the psdkit library.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A storage operation was issued against an adapter that is not open.
    #[error("Storage is not open")]
    NotOpen,

    /// A storage operation failed or its completion was abandoned.
    #[error("Storage operation failed: {0}")]
    Storage(String),

    /// Supplied buffer length does not match the declared rectangle and bit depth.
    #[error("Buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSize { expected: usize, actual: usize },

    /// Supplied sample width does not match the document bit depth.
    #[error("Depth mismatch: document is {document}-bit, data is {supplied}-bit")]
    DepthMismatch { document: u16, supplied: u16 },

    /// A bounded collection is full.
    #[error("Capacity exceeded: at most {limit} {kind} per document")]
    CapacityExceeded { kind: &'static str, limit: usize },

    /// An update addressed an entity index that does not exist.
    #[error("No {kind} at index {index} (count is {count})")]
    IndexOutOfRange {
        kind: &'static str,
        index: usize,
        count: usize,
    },

    /// A rectangle with right < left or bottom < top.
    #[error("Invalid rectangle: top {top}, left {left}, bottom {bottom}, right {right}")]
    InvalidRect {
        top: i32,
        left: i32,
        bottom: i32,
        right: i32,
    },

    /// A value does not fit the legacy field it is written into.
    #[error("{field} value {value} exceeds format limit {max}")]
    ValueTooLarge {
        field: &'static str,
        value: u64,
        max: u64,
    },

    /// Unsupported feature or format.
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an unsupported error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Error::Unsupported(msg.into())
    }

    /// Create a storage failure error.
    pub fn storage(msg: impl Into<String>) -> Self {
        Error::Storage(msg.into())
    }

    /// Check if this is a capacity exhaustion error.
    #[must_use]
    pub fn is_capacity(&self) -> bool {
        matches!(self, Error::CapacityExceeded { .. })
    }

    /// Check if this error came from the storage layer.
    #[must_use]
    pub fn is_storage(&self) -> bool {
        matches!(self, Error::Io(_) | Error::NotOpen | Error::Storage(_))
    }
}
