//! Content hashing for the Grove object store.
//!
//! Object ids are SHA-1 digests of the canonical encoding
//! `<type> <size>\0<payload>`, the same scheme git uses for loose objects.
//! All crypto operations wrap established libraries.

pub mod hasher;

pub use hasher::ObjectHasher;
