use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// Length of a raw object digest in bytes.
pub const OBJECT_ID_LEN: usize = 20;

/// Length of the hex rendering of an object digest.
pub const OBJECT_ID_HEX_LEN: usize = OBJECT_ID_LEN * 2;

/// Content-addressed identifier for any stored object.
///
/// An `ObjectId` is the SHA-1 digest of an object's canonical encoding
/// (`<type> <size>\0<payload>`). Identical objects always produce the same
/// `ObjectId`. The textual form is 40 lowercase hex characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; OBJECT_ID_LEN]);

impl ObjectId {
    /// Create an `ObjectId` from a pre-computed digest.
    pub const fn from_hash(hash: [u8; OBJECT_ID_LEN]) -> Self {
        Self(hash)
    }

    /// Create an `ObjectId` from a byte slice that must be exactly 20 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, TypeError> {
        let arr: [u8; OBJECT_ID_LEN] =
            bytes.try_into().map_err(|_| TypeError::InvalidLength {
                expected: OBJECT_ID_LEN,
                actual: bytes.len(),
            })?;
        Ok(Self(arr))
    }

    /// The raw 20-byte digest.
    pub fn as_bytes(&self) -> &[u8; OBJECT_ID_LEN] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Abbreviated hex representation (first 7 characters).
    pub fn short_hex(&self) -> String {
        let mut s = hex::encode(&self.0[..4]);
        s.truncate(7);
        s
    }

    /// Split the hex form into the fan-out directory name (first 2 chars)
    /// and the file name (remaining 38 chars).
    pub fn fanout(&self) -> (String, String) {
        (hex::encode(&self.0[..1]), hex::encode(&self.0[1..]))
    }

    /// Parse from a 40-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        if s.len() != OBJECT_ID_HEX_LEN {
            return Err(TypeError::InvalidLength {
                expected: OBJECT_ID_HEX_LEN,
                actual: s.len(),
            });
        }
        let mut arr = [0u8; OBJECT_ID_LEN];
        hex::decode_to_slice(s, &mut arr).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.short_hex())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; OBJECT_ID_LEN]> for ObjectId {
    fn from(bytes: [u8; OBJECT_ID_LEN]) -> Self {
        Self(bytes)
    }
}

impl From<ObjectId> for [u8; OBJECT_ID_LEN] {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

// Serialized as the hex string so ids read the same in JSON as on the CLI.
impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const HELLO_BLOB: &str = "ce013625030ba8dba906f756967f9e9ca394464a";

    #[test]
    fn hex_roundtrip() {
        let id = ObjectId::from_hex(HELLO_BLOB).unwrap();
        assert_eq!(id.to_hex(), HELLO_BLOB);
    }

    #[test]
    fn uppercase_hex_is_accepted_and_normalized() {
        let id = ObjectId::from_hex(&HELLO_BLOB.to_uppercase()).unwrap();
        assert_eq!(id.to_hex(), HELLO_BLOB);
    }

    #[test]
    fn wrong_length_is_rejected() {
        assert_eq!(
            ObjectId::from_hex("abc"),
            Err(TypeError::InvalidLength { expected: 40, actual: 3 })
        );
        assert!(ObjectId::from_hex("").is_err());
        assert!(ObjectId::from_hex(&"a".repeat(41)).is_err());
    }

    #[test]
    fn non_hex_is_rejected() {
        let err = ObjectId::from_hex(&"g".repeat(40)).unwrap_err();
        assert!(matches!(err, TypeError::InvalidHex(_)));
    }

    #[test]
    fn from_slice_checks_length() {
        assert!(ObjectId::from_slice(&[0u8; 20]).is_ok());
        assert_eq!(
            ObjectId::from_slice(&[0u8; 19]),
            Err(TypeError::InvalidLength { expected: 20, actual: 19 })
        );
    }

    #[test]
    fn fanout_splits_two_and_thirty_eight() {
        let id = ObjectId::from_hex(HELLO_BLOB).unwrap();
        let (dir, file) = id.fanout();
        assert_eq!(dir, "ce");
        assert_eq!(file, "013625030ba8dba906f756967f9e9ca394464a");
        assert_eq!(file.len(), 38);
    }

    #[test]
    fn short_hex_is_7_chars() {
        let id = ObjectId::from_hex(HELLO_BLOB).unwrap();
        assert_eq!(id.short_hex(), "ce01362");
    }

    #[test]
    fn display_is_full_hex() {
        let id = ObjectId::from_hash([0xab; 20]);
        let display = format!("{id}");
        assert_eq!(display.len(), 40);
        assert_eq!(display, id.to_hex());
    }

    #[test]
    fn parse_via_from_str() {
        let id: ObjectId = HELLO_BLOB.parse().unwrap();
        assert_eq!(id.to_string(), HELLO_BLOB);
    }

    #[test]
    fn serde_uses_hex_string() {
        let id = ObjectId::from_hex(HELLO_BLOB).unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{HELLO_BLOB}\""));
        let parsed: ObjectId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn serde_rejects_bad_hex() {
        let result: Result<ObjectId, _> = serde_json::from_str("\"not-an-id\"");
        assert!(result.is_err());
    }

    #[test]
    fn ordering_is_consistent() {
        let id1 = ObjectId::from_hash([0; 20]);
        let id2 = ObjectId::from_hash([1; 20]);
        assert!(id1 < id2);
    }

    proptest! {
        #[test]
        fn any_digest_survives_hex(bytes in proptest::array::uniform20(any::<u8>())) {
            let id = ObjectId::from_hash(bytes);
            let hex = id.to_hex();
            prop_assert_eq!(hex.len(), OBJECT_ID_HEX_LEN);
            prop_assert!(hex.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
            prop_assert_eq!(ObjectId::from_hex(&hex).unwrap(), id);
        }
    }
}
