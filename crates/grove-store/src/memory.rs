use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use grove_types::ObjectId;

use crate::error::StoreResult;
use crate::object::StoredObject;
use crate::traits::ObjectStore;

type ObjectMap = HashMap<ObjectId, StoredObject>;

/// Object store that keeps decoded objects in process memory.
///
/// Nothing is compressed or hashed on read, so this backend never reports
/// corruption. Useful for unit tests and for building trees before they are
/// flushed to a [`LooseObjectStore`](crate::LooseObjectStore).
#[derive(Default)]
pub struct InMemoryObjectStore {
    objects: RwLock<ObjectMap>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn objects(&self) -> RwLockReadGuard<'_, ObjectMap> {
        self.objects.read().expect("lock poisoned")
    }

    fn objects_mut(&self) -> RwLockWriteGuard<'_, ObjectMap> {
        self.objects.write().expect("lock poisoned")
    }

    /// Number of distinct objects held.
    pub fn len(&self) -> usize {
        self.objects().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects().is_empty()
    }

    /// Sum of payload sizes, excluding headers.
    pub fn total_bytes(&self) -> u64 {
        self.objects().values().map(StoredObject::size).sum()
    }

    /// Every held id, in ascending byte order, matching
    /// [`LooseObjectStore::iter_ids`](crate::LooseObjectStore::iter_ids).
    pub fn all_ids(&self) -> Vec<ObjectId> {
        let mut ids: Vec<ObjectId> = self.objects().keys().copied().collect();
        ids.sort();
        ids
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        Ok(self.objects().get(id).cloned())
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        // First write wins; equal ids mean equal content.
        let id = object.compute_id();
        self.objects_mut()
            .entry(id)
            .or_insert_with(|| object.clone());
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.objects().contains_key(id))
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::object::ObjectKind;
    use crate::tree::{EntryMode, Tree, TreeEntry};

    fn make_tree(store: &InMemoryObjectStore) -> ObjectId {
        let hello = store.write_blob(b"hello\n").unwrap();
        let tree = Tree::new(vec![
            TreeEntry::new(EntryMode::Regular, "hello.txt", hello),
            TreeEntry::new(EntryMode::Directory, "subdir", ObjectId::from_hash([9; 20])),
        ])
        .unwrap();
        store.write_tree(&tree).unwrap()
    }

    #[test]
    fn write_and_read_blob() {
        let store = InMemoryObjectStore::new();
        let id = store.write_blob(b"hello\n").unwrap();
        assert_eq!(id.to_hex(), "ce013625030ba8dba906f756967f9e9ca394464a");
        assert_eq!(store.read_blob(&id).unwrap(), b"hello\n");
    }

    #[test]
    fn write_and_read_tree() {
        let store = InMemoryObjectStore::new();
        let id = make_tree(&store);
        let entries = store.read_tree(&id).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, b"hello.txt");
        assert_eq!(entries[1].mode, EntryMode::Directory);
    }

    #[test]
    fn idempotent_write() {
        let store = InMemoryObjectStore::new();
        let id1 = store.write_blob(b"same").unwrap();
        let id2 = store.write_blob(b"same").unwrap();
        assert_eq!(id1, id2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn read_missing_is_none_and_not_found() {
        let store = InMemoryObjectStore::new();
        let id = ObjectId::from_hash([0x42; 20]);
        assert!(store.read(&id).unwrap().is_none());
        assert!(!store.exists(&id).unwrap());
        assert!(matches!(
            store.read_blob(&id),
            Err(StoreError::NotFound(missing)) if missing == id
        ));
    }

    #[test]
    fn kind_mismatch_both_ways() {
        let store = InMemoryObjectStore::new();
        let blob = store.write_blob(b"x").unwrap();
        let tree = make_tree(&store);
        assert!(matches!(
            store.read_tree(&blob),
            Err(StoreError::UnexpectedType { actual: ObjectKind::Blob, .. })
        ));
        assert!(matches!(
            store.read_blob(&tree),
            Err(StoreError::UnexpectedType { actual: ObjectKind::Tree, .. })
        ));
    }

    #[test]
    fn malformed_tree_payload_surfaces() {
        let store = InMemoryObjectStore::new();
        let id = store
            .write_object(ObjectKind::Tree, b"100644 truncated\0abc")
            .unwrap();
        assert!(matches!(
            store.read_tree(&id),
            Err(StoreError::MalformedTree(_))
        ));
    }

    #[test]
    fn all_ids_sorted_and_total_bytes() {
        let store = InMemoryObjectStore::new();
        store.write_blob(b"aa").unwrap();
        store.write_blob(b"bbb").unwrap();
        let ids = store.all_ids();
        assert_eq!(ids.len(), 2);
        assert!(ids[0] < ids[1]);
        assert_eq!(store.total_bytes(), 5);
        assert!(!store.is_empty());
    }

    #[test]
    fn many_distinct_inputs_have_distinct_ids() {
        let store = InMemoryObjectStore::new();
        for i in 0..500u32 {
            store.write_blob(&i.to_be_bytes()).unwrap();
            store.write_object(ObjectKind::Commit, &i.to_be_bytes()).unwrap();
        }
        assert_eq!(store.len(), 1000);
    }

    #[test]
    fn debug_shows_count() {
        let store = InMemoryObjectStore::new();
        store.write_blob(b"one").unwrap();
        assert_eq!(format!("{store:?}"), "InMemoryObjectStore { object_count: 1 }");
    }
}
