use grove_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::{ObjectKind, StoredObject, TypedObject};
use crate::tree::{Tree, TreeEntry};

/// Content-addressed object store.
///
/// All implementations must satisfy these invariants:
/// - Objects are immutable once written. The same kind and payload always
///   produce the same ID.
/// - Writing an object that already exists is a no-op that returns its ID.
/// - A missing object is `Ok(None)` from `read`, never an error or an empty
///   default.
/// - All I/O and decode errors are propagated, never silently ignored.
pub trait ObjectStore: Send + Sync {
    /// Read an object by its content-addressed ID.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    /// Returns `Err` on I/O failure or data corruption.
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>>;

    /// Write an object and return its content-addressed ID.
    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId>;

    /// Check whether an object exists in the store.
    fn exists(&self, id: &ObjectId) -> StoreResult<bool>;

    /// Write a payload of the given kind.
    fn write_object(&self, kind: ObjectKind, payload: &[u8]) -> StoreResult<ObjectId> {
        self.write(&StoredObject::new(kind, payload.to_vec()))
    }

    /// Read an object, failing with [`StoreError::NotFound`] if it is absent.
    fn read_raw(&self, id: &ObjectId) -> StoreResult<StoredObject> {
        self.read(id)?.ok_or(StoreError::NotFound(*id))
    }

    /// Read and decode a typed object, checking its kind.
    fn read_typed<T: TypedObject>(&self, id: &ObjectId) -> StoreResult<T>
    where
        Self: Sized,
    {
        let obj = self.read_raw(id)?;
        if obj.kind() != T::KIND {
            return Err(StoreError::UnexpectedType {
                id: *id,
                expected: T::KIND,
                actual: obj.kind(),
            });
        }
        let value = T::from_payload(obj.data())?;
        tracing::trace!(id = %id, "read {}", value.describe());
        Ok(value)
    }

    /// Encode and write a typed object.
    fn write_typed<T: TypedObject>(&self, value: &T) -> StoreResult<ObjectId>
    where
        Self: Sized,
    {
        self.write(&value.to_stored_object()?)
    }

    /// Write raw bytes as a blob.
    fn write_blob(&self, data: &[u8]) -> StoreResult<ObjectId> {
        self.write_object(ObjectKind::Blob, data)
    }

    /// Read a blob's content verbatim.
    fn read_blob(&self, id: &ObjectId) -> StoreResult<Vec<u8>> {
        let obj = self.read_raw(id)?;
        if obj.kind() != ObjectKind::Blob {
            return Err(StoreError::UnexpectedType {
                id: *id,
                expected: ObjectKind::Blob,
                actual: obj.kind(),
            });
        }
        Ok(obj.into_data())
    }

    /// Write a tree object.
    fn write_tree(&self, tree: &Tree) -> StoreResult<ObjectId> {
        self.write(&tree.to_stored_object()?)
    }

    /// Read a tree's entries in on-disk order.
    fn read_tree(&self, id: &ObjectId) -> StoreResult<Vec<TreeEntry>> {
        let obj = self.read_raw(id)?;
        if obj.kind() != ObjectKind::Tree {
            return Err(StoreError::UnexpectedType {
                id: *id,
                expected: ObjectKind::Tree,
                actual: obj.kind(),
            });
        }
        Ok(Tree::from_payload(obj.data())?.entries)
    }
}
