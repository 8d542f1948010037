use grove_crypto::ObjectHasher;
use grove_types::ObjectId;
use serde::{Deserialize, Serialize};

use crate::codec;
use crate::error::{StoreError, StoreResult};

/// The kind of object stored.
///
/// Only blobs and trees are interpreted by this crate. Commits and tags are
/// recognized in headers so objects written by other tools can still be read
/// raw and reported, but nothing here builds or parses them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// Raw content (file contents, arbitrary data).
    Blob,
    /// Directory listing: ordered entries mapping names to object references.
    Tree,
    /// Commit object (opaque here).
    Commit,
    /// Annotated tag object (opaque here).
    Tag,
}

impl ObjectKind {
    /// Every kind, in header-token order.
    pub const ALL: [ObjectKind; 4] = [Self::Blob, Self::Tree, Self::Commit, Self::Tag];

    /// Canonical lowercase name used in the object header.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
            Self::Commit => "commit",
            Self::Tag => "tag",
        }
    }

    /// Parse a header type token. Matching is exact and case-sensitive.
    pub fn from_name(token: &[u8]) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name().as_bytes() == token)
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for ObjectKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s.as_bytes())
            .ok_or_else(|| StoreError::Encoding(format!("unknown object type {s:?}")))
    }
}

/// A stored object: kind tag + payload bytes + cached size.
///
/// `StoredObject` is the unit of storage. `size` always equals the payload
/// length; it is computed in the constructor and cannot be set separately.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    kind: ObjectKind,
    data: Vec<u8>,
    size: u64,
}

impl StoredObject {
    /// Create a new stored object from kind and payload.
    pub fn new(kind: ObjectKind, data: Vec<u8>) -> Self {
        let size = data.len() as u64;
        Self { kind, data, size }
    }

    /// Decode a stored object from its canonical encoding.
    pub fn from_encoded(bytes: &[u8]) -> StoreResult<Self> {
        let decoded = codec::decode(bytes)?;
        Ok(Self::new(decoded.kind, decoded.payload.to_vec()))
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Consume the object and return its payload.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Canonical encoding: `<type> <size>\0<payload>`.
    pub fn encode(&self) -> Vec<u8> {
        codec::encode(self.kind, &self.data)
    }

    /// Compute the content-addressed ID for this object.
    pub fn compute_id(&self) -> ObjectId {
        ObjectHasher::hash_object(self.kind.name(), &self.data)
    }
}

/// An object type with a typed payload representation.
///
/// Implementors pick their [`ObjectKind`] and convert between the typed
/// value and raw payload bytes. Kind checks live in the provided methods so
/// every typed accessor reports mismatches the same way.
pub trait TypedObject: Sized {
    /// Header kind for this object type.
    const KIND: ObjectKind;

    /// Serialize into payload bytes.
    fn to_payload(&self) -> StoreResult<Vec<u8>>;

    /// Parse from payload bytes.
    fn from_payload(payload: &[u8]) -> StoreResult<Self>;

    /// Short human-readable summary.
    fn describe(&self) -> String;

    /// Convert into a `StoredObject` for storage.
    fn to_stored_object(&self) -> StoreResult<StoredObject> {
        Ok(StoredObject::new(Self::KIND, self.to_payload()?))
    }

    /// Decode from a `StoredObject`, checking its kind.
    fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        if obj.kind() != Self::KIND {
            return Err(StoreError::UnexpectedType {
                id: obj.compute_id(),
                expected: Self::KIND,
                actual: obj.kind(),
            });
        }
        Self::from_payload(obj.data())
    }
}

// ---------------------------------------------------------------------------
// Blob
// ---------------------------------------------------------------------------

/// Raw content object (analogous to git blob).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    pub data: Vec<u8>,
}

impl Blob {
    /// Create a new blob from raw bytes.
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl TypedObject for Blob {
    const KIND: ObjectKind = ObjectKind::Blob;

    fn to_payload(&self) -> StoreResult<Vec<u8>> {
        Ok(self.data.clone())
    }

    fn from_payload(payload: &[u8]) -> StoreResult<Self> {
        Ok(Self::new(payload.to_vec()))
    }

    fn describe(&self) -> String {
        format!("blob ({} bytes)", self.data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_roundtrip() {
        let blob = Blob::new(b"hello world".to_vec());
        let stored = blob.to_stored_object().unwrap();
        let decoded = Blob::from_stored_object(&stored).unwrap();
        assert_eq!(blob, decoded);
    }

    #[test]
    fn blob_kind_mismatch() {
        let stored = StoredObject::new(ObjectKind::Tree, Vec::new());
        let err = Blob::from_stored_object(&stored).unwrap_err();
        assert!(matches!(
            err,
            StoreError::UnexpectedType {
                expected: ObjectKind::Blob,
                actual: ObjectKind::Tree,
                ..
            }
        ));
    }

    #[test]
    fn size_tracks_payload() {
        let obj = StoredObject::new(ObjectKind::Blob, b"hello\n".to_vec());
        assert_eq!(obj.size(), 6);
        assert_eq!(obj.data(), b"hello\n");
    }

    #[test]
    fn hello_blob_id_is_golden() {
        let obj = StoredObject::new(ObjectKind::Blob, b"hello\n".to_vec());
        assert_eq!(
            obj.compute_id().to_hex(),
            "ce013625030ba8dba906f756967f9e9ca394464a"
        );
    }

    #[test]
    fn encoded_form_roundtrips() {
        let obj = StoredObject::new(ObjectKind::Blob, b"a\0b".to_vec());
        assert_eq!(obj.encode(), b"blob 3\0a\0b");
        assert_eq!(StoredObject::from_encoded(&obj.encode()).unwrap(), obj);
    }

    #[test]
    fn different_kinds_produce_different_ids() {
        let data = b"same data".to_vec();
        let blob = StoredObject::new(ObjectKind::Blob, data.clone());
        let tree = StoredObject::new(ObjectKind::Tree, data);
        assert_ne!(blob.compute_id(), tree.compute_id());
    }

    #[test]
    fn object_kind_names() {
        for kind in ObjectKind::ALL {
            assert_eq!(ObjectKind::from_name(kind.name().as_bytes()), Some(kind));
            assert_eq!(kind.to_string(), kind.name());
        }
        assert_eq!(ObjectKind::from_name(b"Blob"), None);
        assert_eq!(ObjectKind::from_name(b"blob "), None);
        assert!("snapshot".parse::<ObjectKind>().is_err());
        assert_eq!("tree".parse::<ObjectKind>().unwrap(), ObjectKind::Tree);
    }

    #[test]
    fn object_kind_serializes_lowercase() {
        let json = serde_json::to_string(&ObjectKind::Tree).unwrap();
        assert_eq!(json, "\"tree\"");
    }
}
