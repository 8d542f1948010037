//! Tree objects: directory listings mapping names to object ids.
//!
//! Wire format, entries concatenated with no separator:
//!
//! ```text
//! <mode as ASCII octal> SP <name> NUL <20-byte raw object id>
//! ```
//!
//! Names are raw bytes. Parsing accepts any name a tree can hold; building a
//! tree with [`Tree::new`] additionally requires UTF-8 and rejects `.`/`..`.

use std::borrow::Cow;
use std::cmp::Ordering;

use grove_types::{ObjectId, OBJECT_ID_LEN};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{StoreError, StoreResult};
use crate::object::{ObjectKind, TypedObject};

const TYPE_MASK: u32 = 0o170000;

/// File mode for a tree entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryMode {
    /// Normal file (100644).
    Regular,
    /// Executable file (100755).
    Executable,
    /// Symbolic link (120000).
    Symlink,
    /// Subtree / directory (40000 on the wire).
    Directory,
    /// Submodule commit reference (160000).
    Gitlink,
    /// Any other octal mode found in a stored tree, such as the legacy
    /// group-writable `100664`.
    Other(u32),
}

impl EntryMode {
    /// Octal mode value.
    pub fn mode_bits(&self) -> u32 {
        match self {
            Self::Regular => 0o100644,
            Self::Executable => 0o100755,
            Self::Symlink => 0o120000,
            Self::Directory => 0o040000,
            Self::Gitlink => 0o160000,
            Self::Other(bits) => *bits,
        }
    }

    /// Map an octal mode value to its variant. Unrecognized values become
    /// [`EntryMode::Other`].
    pub fn from_mode_bits(bits: u32) -> Self {
        match bits {
            0o100644 => Self::Regular,
            0o100755 => Self::Executable,
            0o120000 => Self::Symlink,
            0o040000 => Self::Directory,
            0o160000 => Self::Gitlink,
            other => Self::Other(other),
        }
    }

    /// Mode text as written inside tree payloads (octal, no zero padding).
    pub fn to_wire(&self) -> String {
        format!("{:o}", self.mode_bits())
    }

    /// Parse mode text from a tree payload.
    ///
    /// Accepts one to seven octal digits without leading zeros, plus the
    /// zero-padded `040000` spelling for directories.
    pub fn from_wire(bytes: &[u8]) -> Option<Self> {
        if bytes == b"040000" {
            return Some(Self::Directory);
        }
        if bytes.is_empty()
            || bytes.len() > 7
            || (bytes.len() > 1 && bytes[0] == b'0')
            || !bytes.iter().all(|b| (b'0'..=b'7').contains(b))
        {
            return None;
        }
        let bits = bytes
            .iter()
            .fold(0u32, |acc, &b| acc * 8 + u32::from(b - b'0'));
        Some(Self::from_mode_bits(bits))
    }

    /// Kind of object an entry with this mode points at, decided by the
    /// file-type bits.
    pub fn object_kind(&self) -> ObjectKind {
        match self.mode_bits() & TYPE_MASK {
            0o040000 => ObjectKind::Tree,
            0o160000 => ObjectKind::Commit,
            _ => ObjectKind::Blob,
        }
    }

    pub fn is_tree(&self) -> bool {
        self.object_kind() == ObjectKind::Tree
    }
}

impl std::fmt::Display for EntryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:06o}", self.mode_bits())
    }
}

impl std::str::FromStr for EntryMode {
    type Err = StoreError;

    /// Parses both the wire form and the zero-padded display form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim_start_matches('0');
        let digits = if trimmed.is_empty() && !s.is_empty() {
            "0"
        } else {
            trimmed
        };
        Self::from_wire(digits.as_bytes())
            .ok_or_else(|| StoreError::Encoding(format!("unknown entry mode {s:?}")))
    }
}

impl Serialize for EntryMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EntryMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A single entry in a tree object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    /// File mode.
    pub mode: EntryMode,
    /// Entry name: a single path segment, as stored.
    #[serde(with = "name_as_text")]
    pub name: Vec<u8>,
    /// Content-addressed ID of the referenced object.
    pub object_id: ObjectId,
}

impl TreeEntry {
    /// Create a new tree entry.
    pub fn new(mode: EntryMode, name: impl Into<Vec<u8>>, object_id: ObjectId) -> Self {
        Self {
            mode,
            name: name.into(),
            object_id,
        }
    }

    /// The name, if it is valid UTF-8.
    pub fn name_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.name).ok()
    }

    /// The name for display, with invalid UTF-8 replaced.
    pub fn name_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.name)
    }

    /// Git tree order: byte-wise by name, with directories compared as if
    /// their name ended in `/`.
    pub fn git_cmp(&self, other: &Self) -> Ordering {
        fn key(entry: &TreeEntry) -> impl Iterator<Item = &u8> {
            let suffix: &[u8] = if entry.mode.is_tree() { b"/" } else { b"" };
            entry.name.iter().chain(suffix.iter())
        }
        key(self).cmp(key(other))
    }
}

/// JSON and other text formats carry names as strings.
mod name_as_text {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(name: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&String::from_utf8_lossy(name))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        Ok(String::deserialize(deserializer)?.into_bytes())
    }
}

/// Check the constraints every stored name must meet: non-empty, no `/`,
/// no NUL.
fn check_encodable(name: &[u8]) -> Result<(), String> {
    if name.is_empty() {
        return Err("empty entry name".into());
    }
    if name.contains(&b'/') {
        return Err(format!(
            "entry name {:?} contains '/'",
            String::from_utf8_lossy(name)
        ));
    }
    if name.contains(&0) {
        return Err(format!(
            "entry name {:?} contains NUL",
            String::from_utf8_lossy(name)
        ));
    }
    Ok(())
}

/// Check that `name` is acceptable for a newly built tree: a single,
/// non-empty UTF-8 path segment other than `.` and `..`.
pub fn validate_name(name: &[u8]) -> Result<(), String> {
    check_encodable(name)?;
    let text = std::str::from_utf8(name).map_err(|_| {
        format!(
            "entry name {:?} is not UTF-8",
            String::from_utf8_lossy(name)
        )
    })?;
    if text == "." || text == ".." {
        return Err(format!("reserved entry name {text:?}"));
    }
    Ok(())
}

/// Directory listing object (analogous to git tree).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tree {
    /// Entries in storage order.
    pub entries: Vec<TreeEntry>,
}

impl Tree {
    /// Create a new tree with the given entries.
    ///
    /// Entries are sorted in git tree order. Invalid or duplicate names are
    /// rejected with [`StoreError::Encoding`].
    pub fn new(mut entries: Vec<TreeEntry>) -> StoreResult<Self> {
        for entry in &entries {
            validate_name(&entry.name).map_err(StoreError::Encoding)?;
        }
        entries.sort_by(TreeEntry::git_cmp);
        check_entries(&entries)?;
        Ok(Self { entries })
    }

    /// Create an empty tree.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Look up an entry by name.
    pub fn get(&self, name: impl AsRef<[u8]>) -> Option<&TreeEntry> {
        let name = name.as_ref();
        self.entries.iter().find(|e| e.name == name)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the tree has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TreeEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a Tree {
    type Item = &'a TreeEntry;
    type IntoIter = std::slice::Iter<'a, TreeEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl TypedObject for Tree {
    const KIND: ObjectKind = ObjectKind::Tree;

    /// Encodes the entries as they are. A tree read from disk re-encodes to
    /// the same bytes even if its names would not pass [`Tree::new`].
    fn to_payload(&self) -> StoreResult<Vec<u8>> {
        check_entries(&self.entries)?;
        Ok(encode_entries(&self.entries))
    }

    fn from_payload(payload: &[u8]) -> StoreResult<Self> {
        Ok(Self {
            entries: parse_entries(payload)?,
        })
    }

    fn describe(&self) -> String {
        format!("tree ({} entries)", self.entries.len())
    }
}

fn check_entries(entries: &[TreeEntry]) -> StoreResult<()> {
    for entry in entries {
        check_encodable(&entry.name).map_err(StoreError::Encoding)?;
    }
    let mut names: Vec<&[u8]> = entries.iter().map(|e| e.name.as_slice()).collect();
    names.sort_unstable();
    if let Some(pair) = names.windows(2).find(|w| w[0] == w[1]) {
        return Err(StoreError::Encoding(format!(
            "duplicate entry name {:?}",
            String::from_utf8_lossy(pair[0])
        )));
    }
    Ok(())
}

/// Serialize entries in the given order, without validation or sorting.
pub fn encode_entries(entries: &[TreeEntry]) -> Vec<u8> {
    let mut out = Vec::with_capacity(entries.len() * (OBJECT_ID_LEN + 32));
    for entry in entries {
        out.extend_from_slice(entry.mode.to_wire().as_bytes());
        out.push(b' ');
        out.extend_from_slice(&entry.name);
        out.push(0);
        out.extend_from_slice(entry.object_id.as_bytes());
    }
    out
}

/// Parse a tree payload into entries, preserving on-disk order.
///
/// The payload must be consumed exactly; anything left over or cut short is
/// a [`StoreError::MalformedTree`]. Names are taken as raw bytes and only
/// need to be non-empty and free of `/`.
pub fn parse_entries(payload: &[u8]) -> StoreResult<Vec<TreeEntry>> {
    let mut entries = Vec::new();
    let mut pos = 0;

    while pos < payload.len() {
        let start = pos;

        let space = payload[pos..]
            .iter()
            .position(|&b| b == b' ')
            .ok_or_else(|| malformed(start, "missing space after mode"))?;
        let mode_bytes = &payload[pos..pos + space];
        let mode = EntryMode::from_wire(mode_bytes).ok_or_else(|| {
            malformed(
                start,
                format!("invalid mode {:?}", String::from_utf8_lossy(mode_bytes)),
            )
        })?;
        pos += space + 1;

        let nul = payload[pos..]
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| malformed(start, "missing NUL after name"))?;
        let name = &payload[pos..pos + nul];
        check_encodable(name).map_err(|reason| malformed(start, reason))?;
        let name = name.to_vec();
        pos += nul + 1;

        if payload.len() - pos < OBJECT_ID_LEN {
            return Err(malformed(
                start,
                format!(
                    "truncated object id: need {OBJECT_ID_LEN} bytes, {} left",
                    payload.len() - pos
                ),
            ));
        }
        let object_id = ObjectId::from_slice(&payload[pos..pos + OBJECT_ID_LEN])?;
        pos += OBJECT_ID_LEN;

        entries.push(TreeEntry {
            mode,
            name,
            object_id,
        });
    }

    Ok(entries)
}

fn malformed(offset: usize, reason: impl std::fmt::Display) -> StoreError {
    StoreError::MalformedTree(format!("entry at offset {offset}: {reason}"))
}
