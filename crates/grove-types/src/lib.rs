//! Foundation types for the Grove object store.
//!
//! Every other Grove crate depends on `grove-types`.
//!
//! # Key Types
//!
//! - [`ObjectId`] -- Content-addressed identifier (20-byte SHA-1 digest)
//! - [`TypeError`] -- Parse failures for identifiers

pub mod error;
pub mod object;

pub use error::TypeError;
pub use object::{ObjectId, OBJECT_ID_HEX_LEN, OBJECT_ID_LEN};
