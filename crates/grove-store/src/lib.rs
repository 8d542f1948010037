//! Content-addressed object storage for Grove.
//!
//! This crate implements a hash-keyed object store laid out like git's
//! `.git/objects/` directory. Content is stored as immutable objects whose
//! ID is the SHA-1 digest of `<type> <size>\0<payload>`, and each object file
//! holds that encoding compressed with zlib.
//!
//! # Object Types
//!
//! - [`Blob`] -- raw content (file contents, arbitrary data)
//! - [`Tree`] -- directory listing mapping names to object references
//!
//! Commit and tag headers are recognized ([`ObjectKind`]) but their payloads
//! are left opaque.
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`LooseObjectStore`] -- one compressed file per object on disk
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written (content-addressing guarantees this).
//! 2. Object files are written to a temporary name and renamed into place.
//! 3. Paths are always composed from the store root; the process working
//!    directory is never changed.
//! 4. The library never prints; every failure is a distinct [`StoreError`].

pub mod codec;
pub mod compress;
pub mod config;
pub mod error;
pub mod loose;
pub mod memory;
pub mod object;
pub mod traits;
pub mod tree;

// Re-export primary types at crate root for ergonomic imports.
pub use grove_types::ObjectId;

pub use codec::Decoded;
pub use config::LooseStoreConfig;
pub use error::{StoreError, StoreResult};
pub use loose::{init_store, LooseObjectStore, DEFAULT_STORE_DIR, OBJECTS_DIR};
pub use memory::InMemoryObjectStore;
pub use object::{Blob, ObjectKind, StoredObject, TypedObject};
pub use traits::ObjectStore;
pub use tree::{EntryMode, Tree, TreeEntry};
