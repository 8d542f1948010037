use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use grove_crypto::ObjectHasher;
use grove_types::{ObjectId, OBJECT_ID_HEX_LEN};
use tracing::{debug, warn};

use crate::codec;
use crate::compress::{compress, decompress};
use crate::config::LooseStoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::object::StoredObject;
use crate::traits::ObjectStore;

/// Name of the object directory under the store root.
pub const OBJECTS_DIR: &str = "objects";

/// Store root used when the caller does not name one.
pub const DEFAULT_STORE_DIR: &str = ".grove";

const TEMP_PREFIX: &str = "tmp_obj_";

/// Create the object directory under `root` (idempotent) and open it with
/// the default configuration.
pub fn init_store(root: &Path) -> StoreResult<LooseObjectStore> {
    LooseObjectStore::init(root, LooseStoreConfig::default())
}

/// Filesystem object store using git's loose-object layout.
///
/// ```text
/// <root>/objects/<first 2 hex chars>/<remaining 38 hex chars>
/// ```
///
/// Each file holds the zlib-compressed canonical encoding of one object.
/// Files are written to a temporary name in the fan-out directory and
/// renamed into place, so readers never see a partial object.
#[derive(Debug)]
pub struct LooseObjectStore {
    root: PathBuf,
    objects_dir: PathBuf,
    config: LooseStoreConfig,
}

impl LooseObjectStore {
    /// Create `<root>/objects` if needed and open the store.
    pub fn init(root: &Path, config: LooseStoreConfig) -> StoreResult<Self> {
        let objects_dir = root.join(OBJECTS_DIR);
        fs::create_dir_all(&objects_dir)?;
        debug!(root = %root.display(), "initialized object store");
        Ok(Self {
            root: root.to_path_buf(),
            objects_dir,
            config,
        })
    }

    /// Open an existing store. Fails with [`StoreError::NotInitialized`] if
    /// `<root>/objects` is not a directory.
    pub fn open(root: &Path, config: LooseStoreConfig) -> StoreResult<Self> {
        let objects_dir = root.join(OBJECTS_DIR);
        if !objects_dir.is_dir() {
            return Err(StoreError::NotInitialized(root.to_path_buf()));
        }
        Ok(Self {
            root: root.to_path_buf(),
            objects_dir,
            config,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn objects_dir(&self) -> &Path {
        &self.objects_dir
    }

    pub fn config(&self) -> &LooseStoreConfig {
        &self.config
    }

    /// Path of the file that holds (or would hold) `id`.
    pub fn object_path(&self, id: &ObjectId) -> PathBuf {
        let (dir, file) = id.fanout();
        self.objects_dir.join(dir).join(file)
    }

    /// All object ids present on disk, sorted.
    ///
    /// Entries that are not fan-out directories or object files (temporary
    /// files, `pack/`, `info/`) are skipped.
    pub fn iter_ids(&self) -> StoreResult<Vec<ObjectId>> {
        let mut ids = Vec::new();
        for dir in fs::read_dir(&self.objects_dir)? {
            let dir = dir?;
            let dir_name = dir.file_name();
            let Some(prefix) = dir_name.to_str().filter(|n| is_fanout_name(n)) else {
                continue;
            };
            if !dir.file_type()?.is_dir() {
                continue;
            }
            for file in fs::read_dir(dir.path())? {
                let file = file?;
                let file_name = file.file_name();
                let Some(rest) = file_name.to_str() else {
                    warn!(path = %file.path().display(), "skipping non-UTF-8 file name");
                    continue;
                };
                if rest.starts_with(TEMP_PREFIX) {
                    continue;
                }
                let hex = format!("{prefix}{rest}");
                if hex.len() != OBJECT_ID_HEX_LEN {
                    warn!(
                        path = %file.path().display(),
                        "skipping unexpected file in object store"
                    );
                    continue;
                }
                match ObjectId::from_hex(&hex) {
                    Ok(id) => ids.push(id),
                    Err(e) => warn!(
                        path = %file.path().display(),
                        error = %e,
                        "skipping unexpected file in object store"
                    ),
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn write_file(&self, id: &ObjectId, path: &Path, compressed: &[u8]) -> StoreResult<()> {
        let (fan_dir, _) = id.fanout();
        let dir = self.objects_dir.join(fan_dir);
        fs::create_dir_all(&dir)?;

        let mut tmp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(&dir)?;
        tmp.write_all(compressed)?;
        if self.config.sync_on_write {
            tmp.as_file().sync_all()?;
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(fs::Permissions::from_mode(0o444))?;
        }

        match tmp.persist_noclobber(path) {
            Ok(_) => Ok(()),
            // Another writer stored the same object first; content is identical.
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists && path.is_file() => {
                debug!(id = %id, "object appeared during write");
                Ok(())
            }
            Err(e) => Err(e.error.into()),
        }
    }
}

impl ObjectStore for LooseObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        let path = self.object_path(id);
        let compressed = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let encoded = decompress(&compressed).map_err(|e| corrupt(id, e))?;
        let decoded = codec::decode(&encoded).map_err(|e| corrupt(id, e))?;

        if self.config.verify_on_read {
            let computed = ObjectHasher::hash(&encoded);
            if computed != *id {
                return Err(StoreError::HashMismatch { id: *id, computed });
            }
        }

        debug!(id = %id, kind = %decoded.kind, size = decoded.size, "read object");
        Ok(Some(StoredObject::new(decoded.kind, decoded.payload.to_vec())))
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let encoded = object.encode();
        let id = ObjectHasher::hash(&encoded);
        let path = self.object_path(&id);

        if self.exists(&id)? {
            debug!(id = %id, "object already stored");
            return Ok(id);
        }

        let compressed = compress(&encoded, self.config.compression_level)?;
        self.write_file(&id, &path, &compressed)?;
        debug!(
            id = %id,
            kind = %object.kind(),
            size = object.size(),
            stored = compressed.len(),
            "wrote object"
        );
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        match fs::metadata(self.object_path(id)) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

fn is_fanout_name(name: &str) -> bool {
    name.len() == 2 && name.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase())
}

fn corrupt(id: &ObjectId, cause: StoreError) -> StoreError {
    StoreError::CorruptObject {
        id: *id,
        reason: cause.to_string(),
    }
}
