use grove_types::ObjectId;
use sha1::{Digest, Sha1};

/// SHA-1 object hasher.
///
/// Digests are always taken over the full canonical encoding (header and
/// payload), never over the payload alone. The incremental form lets callers
/// hash a header and a payload without concatenating them first.
#[derive(Clone, Default)]
pub struct ObjectHasher {
    inner: Sha1,
}

impl ObjectHasher {
    /// Create an empty incremental hasher.
    pub fn new() -> Self {
        Self { inner: Sha1::new() }
    }

    /// Feed more bytes into the digest.
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Finish and return the object id.
    pub fn finalize(self) -> ObjectId {
        ObjectId::from_hash(self.inner.finalize().into())
    }

    /// Hash an already-encoded object (`<type> <size>\0<payload>`).
    pub fn hash(encoded: &[u8]) -> ObjectId {
        let mut hasher = Self::new();
        hasher.update(encoded);
        hasher.finalize()
    }

    /// Hash an object from its type name and payload.
    ///
    /// Equal to `hash` over the canonical encoding of the same object.
    pub fn hash_object(type_name: &str, payload: &[u8]) -> ObjectId {
        let mut hasher = Self::new();
        hasher.update(type_name.as_bytes());
        hasher.update(b" ");
        hasher.update(payload.len().to_string().as_bytes());
        hasher.update(b"\0");
        hasher.update(payload);
        hasher.finalize()
    }

    /// Verify that encoded bytes produce the expected object id.
    pub fn verify(encoded: &[u8], expected: &ObjectId) -> bool {
        Self::hash(encoded) == *expected
    }
}
