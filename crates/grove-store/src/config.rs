use serde::{Deserialize, Serialize};

use crate::compress::DEFAULT_LEVEL;

/// Tuning knobs for [`LooseObjectStore`](crate::LooseObjectStore).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LooseStoreConfig {
    /// zlib level, 0 (store) to 9 (best). Higher values are clamped.
    pub compression_level: u32,
    /// `fsync` each object file before it is renamed into place.
    pub sync_on_write: bool,
    /// Re-hash decompressed bytes on read and reject objects whose digest
    /// does not match their path.
    pub verify_on_read: bool,
}

impl Default for LooseStoreConfig {
    fn default() -> Self {
        Self {
            compression_level: DEFAULT_LEVEL,
            sync_on_write: false,
            verify_on_read: true,
        }
    }
}
