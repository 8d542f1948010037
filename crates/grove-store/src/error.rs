use std::path::PathBuf;

use grove_types::{ObjectId, TypeError};

use crate::object::ObjectKind;

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A typed payload cannot be represented in the canonical encoding.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// The `<type> <size>\0` header is structurally invalid.
    #[error("malformed object header: {0}")]
    MalformedHeader(String),

    /// The bytes are not a valid zlib stream.
    #[error("corrupt compressed stream: {0}")]
    CorruptStream(String),

    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// The stored bytes for an object could not be decompressed or decoded.
    #[error("corrupt object {id}: {reason}")]
    CorruptObject { id: ObjectId, reason: String },

    /// The stored bytes decode cleanly but hash to a different id.
    #[error("hash mismatch for {id}: stored bytes hash to {computed}")]
    HashMismatch { id: ObjectId, computed: ObjectId },

    /// The object exists but is not of the requested kind.
    #[error("object {id} is a {actual}, expected {expected}")]
    UnexpectedType {
        id: ObjectId,
        expected: ObjectKind,
        actual: ObjectKind,
    },

    /// A tree payload does not parse into a clean sequence of entries.
    #[error("malformed tree: {0}")]
    MalformedTree(String),

    /// No object store exists at the given root.
    #[error("no object store at {}", .0.display())]
    NotInitialized(PathBuf),

    /// An object id failed to parse.
    #[error("invalid object id: {0}")]
    InvalidId(#[from] TypeError),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
