//! Tree objects: one full path to blob mapping.
//!
//! Canonical encoding, entries in ascending byte order of path:
//!
//! ```text
//! <64 hex blob id> SP <path> NUL
//! ```
//!
//! Paths are repository-relative, `/`-separated UTF-8 and never contain NUL.

use crate::{Object, ObjectId, ObjectType, Result, StorageError};
use std::collections::BTreeMap;

/// A snapshot of every tracked file, keyed by path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    entries: BTreeMap<String, ObjectId>,
}

impl Tree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `path -> blob`, returning the previous blob for that path.
    pub fn insert(&mut self, path: impl Into<String>, blob: ObjectId) -> Result<Option<ObjectId>> {
        let path = path.into();
        if path.is_empty() || path.contains('\0') {
            return Err(StorageError::InvalidObject(format!(
                "invalid tree path: {:?}",
                path
            )));
        }
        Ok(self.entries.insert(path, blob))
    }

    /// Looks up the blob recorded for a path.
    pub fn get(&self, path: &str) -> Option<&ObjectId> {
        self.entries.get(path)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the tree has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ObjectId)> {
        self.entries.iter()
    }

    /// Borrows the underlying path map.
    pub fn entries(&self) -> &BTreeMap<String, ObjectId> {
        &self.entries
    }

    /// Consumes the tree, returning the path map.
    pub fn into_entries(self) -> BTreeMap<String, ObjectId> {
        self.entries
    }

    /// Serializes the tree canonically.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.entries.len() * 80);
        for (path, id) in &self.entries {
            out.extend_from_slice(id.to_hex().as_bytes());
            out.push(b' ');
            out.extend_from_slice(path.as_bytes());
            out.push(0);
        }
        out
    }

    /// Parses a canonical tree payload.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut entries = BTreeMap::new();
        let mut last: Option<&str> = None;

        let mut rest = data;
        while !rest.is_empty() {
            let end = rest.iter().position(|&b| b == 0).ok_or_else(|| {
                StorageError::InvalidObject("tree entry missing terminator".to_string())
            })?;
            let entry = std::str::from_utf8(&rest[..end])
                .map_err(|e| StorageError::InvalidObject(format!("tree entry: {}", e)))?;
            rest = &rest[end + 1..];

            let (hex, path) = entry.split_once(' ').ok_or_else(|| {
                StorageError::InvalidObject(format!("malformed tree entry: {:?}", entry))
            })?;
            if path.is_empty() {
                return Err(StorageError::InvalidObject("empty tree path".to_string()));
            }
            if last.is_some_and(|prev| prev >= path) {
                return Err(StorageError::InvalidObject(format!(
                    "tree entries out of order at {:?}",
                    path
                )));
            }
            last = Some(path);
            entries.insert(path.to_string(), ObjectId::from_hex(hex)?);
        }

        Ok(Self { entries })
    }

    /// Builds the tree object without storing it.
    pub fn to_object(&self) -> Object {
        Object::new(ObjectType::Tree, self.encode())
    }

    /// Computes the tree's id without storing it.
    pub fn id(&self) -> ObjectId {
        ObjectId::hash_object(ObjectType::Tree, &self.encode())
    }
}
