//! Object identifiers, kinds, and typed hashing.

use crate::{Result, StorageError};
use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// A 32-byte SHA-256 object identifier.
///
/// Displayed, serialized and parsed as 64 hex characters. Parsing accepts
/// either case; output is always lowercase.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId([u8; 32]);

impl ObjectId {
    /// Length of the hex representation.
    pub const HEX_LEN: usize = 64;

    /// Wraps a raw digest.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parses a full 64-character hex id.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let mut bytes = [0u8; 32];
        match hex::decode_to_slice(hex, &mut bytes) {
            Ok(()) => Ok(Self(bytes)),
            Err(hex::FromHexError::InvalidStringLength | hex::FromHexError::OddLength) => {
                Err(StorageError::InvalidObject(format!(
                    "object id must be {} hex chars, got {}",
                    Self::HEX_LEN,
                    hex.len()
                )))
            }
            Err(e) => Err(StorageError::InvalidObject(format!("object id {:?}: {}", hex, e))),
        }
    }

    /// The raw digest.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex form.
    pub fn to_hex(&self) -> String {
        self.to_string()
    }

    /// The first eight hex characters, as shown in summaries.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Hashes `data` behind the typed header `"<kind> <len>\0"`.
    ///
    /// Two kinds with identical payload bytes never share an id.
    pub fn hash_object(object_type: ObjectType, data: &[u8]) -> Self {
        let digest = Sha256::new()
            .chain_update(object_type.header(data.len()))
            .chain_update(data)
            .finalize();
        Self(digest.into())
    }
}

impl FromStr for ObjectId {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|b| write!(f, "{:02x}", b))
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObjectId").field(&format_args!("{}", self)).finish()
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        String::deserialize(deserializer)?
            .parse()
            .map_err(serde::de::Error::custom)
    }
}

/// Stored object kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    /// File content.
    Blob,
    /// Path to blob mapping for one snapshot.
    Tree,
    /// Commit record.
    Commit,
}

impl ObjectType {
    /// Returns the name written in the object header.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
            Self::Commit => "commit",
        }
    }

    /// Parses an object type from its header name.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "blob" => Ok(Self::Blob),
            "tree" => Ok(Self::Tree),
            "commit" => Ok(Self::Commit),
            _ => Err(StorageError::InvalidObject(format!(
                "unknown object type: {}",
                s
            ))),
        }
    }

    /// Builds the typed header for a payload of `len` bytes.
    pub fn header(&self, len: usize) -> String {
        format!("{} {}\0", self.as_str(), len)
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored object (blob, tree, or commit).
#[derive(Debug, Clone)]
pub struct Object {
    /// The object's identifier (SHA-256 of header and data).
    pub id: ObjectId,
    /// The type of object.
    pub object_type: ObjectType,
    /// The raw payload (uncompressed, without header).
    pub data: Bytes,
}

impl Object {
    /// Creates a new object, computing its ID from the data.
    pub fn new(object_type: ObjectType, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let id = ObjectId::hash_object(object_type, &data);
        Self {
            id,
            object_type,
            data,
        }
    }

    /// Creates a blob object from file content.
    pub fn blob(content: impl Into<Bytes>) -> Self {
        Self::new(ObjectType::Blob, content)
    }

    /// Returns the size of the payload.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}
