//! Error types for document model operations.

use thiserror::Error;

/// Result type alias for bundle-dyn operations.
pub type Result<T> = std::result::Result<T, DynError>;

/// Errors that can occur while addressing or updating a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DynError {
    /// A path string could not be parsed.
    #[error("invalid path {input:?}: {message}")]
    InvalidPath {
        /// The offending input
        input: String,
        /// What is wrong with it
        message: String,
    },

    /// A path component expected a mapping or sequence but found another kind.
    #[error("expected a {expected} at {path}, found {found}")]
    KindMismatch {
        /// Path of the node with the wrong kind
        path: String,
        /// The kind the operation needed
        expected: &'static str,
        /// The kind that was found
        found: &'static str,
    },

    /// A sequence index is past the end of the sequence.
    #[error("index {index} out of bounds at {path} (length {len})")]
    IndexOutOfBounds {
        /// Path of the sequence
        path: String,
        /// The requested index
        index: usize,
        /// Length of the sequence
        len: usize,
    },

    /// Setting the root itself through an empty path.
    #[error("cannot set a value at the empty path")]
    EmptyPath,
}
