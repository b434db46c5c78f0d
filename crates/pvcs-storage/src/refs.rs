//! Mutable references: the message ref map and HEAD.

use crate::{CompressionLevel, ObjectId, Result, StorageError};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// Mapping from snapshot message to commit id. Last write wins.
///
/// Persisted as zlib-compressed JSON with keys in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefMap {
    refs: BTreeMap<String, ObjectId>,
}

impl RefMap {
    /// Creates an empty ref map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the ref map at `path`; a missing file is an empty map.
    pub fn load(path: &Path) -> Result<Self> {
        let compressed = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => return Err(e.into()),
        };
        Self::decode(&compressed)
    }

    /// Persists the ref map to `path`.
    pub fn save(&self, path: &Path, level: CompressionLevel) -> Result<()> {
        write_atomic(path, &self.encode(level)?)?;
        tracing::debug!(path = %path.display(), entries = self.refs.len(), "saved ref map");
        Ok(())
    }

    /// Looks up the commit recorded for a message.
    pub fn get(&self, message: &str) -> Option<ObjectId> {
        self.refs.get(message).copied()
    }

    /// Points `message` at `commit`, returning the previous target.
    pub fn set(&mut self, message: impl Into<String>, commit: ObjectId) -> Option<ObjectId> {
        self.refs.insert(message.into(), commit)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    /// Returns true if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// Iterates entries in message order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ObjectId)> {
        self.refs.iter()
    }

    /// Compresses the JSON form of the map.
    pub fn encode(&self, level: CompressionLevel) -> Result<Vec<u8>> {
        let json = serde_json::to_vec(&self.refs)?;
        let mut encoder = ZlibEncoder::new(Vec::new(), level.to_flate2());
        encoder
            .write_all(&json)
            .map_err(|e| StorageError::Compression(e.to_string()))?;
        encoder
            .finish()
            .map_err(|e| StorageError::Compression(e.to_string()))
    }

    /// Decodes a compressed ref map.
    pub fn decode(compressed: &[u8]) -> Result<Self> {
        let mut json = Vec::new();
        ZlibDecoder::new(compressed)
            .read_to_end(&mut json)
            .map_err(|e| StorageError::Corruption(format!("ref map: {}", e)))?;
        let refs = serde_json::from_slice(&json)?;
        Ok(Self { refs })
    }
}

/// The HEAD pointer: a plain-text file holding one commit id.
#[derive(Debug, Clone)]
pub struct Head {
    path: PathBuf,
}

impl Head {
    /// Refers to the HEAD file at `path`.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reads the current commit; `None` when no commit exists yet.
    pub fn read(&self) -> Result<Option<ObjectId>> {
        match fs::read_to_string(&self.path) {
            Ok(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return Ok(None);
                }
                ObjectId::from_hex(text)
                    .map(Some)
                    .map_err(|e| StorageError::Corruption(format!("HEAD: {}", e)))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Points HEAD at `commit`.
    pub fn write(&self, commit: &ObjectId) -> Result<()> {
        write_atomic(&self.path, commit.to_hex().as_bytes())?;
        tracing::debug!(commit = %commit, "HEAD updated");
        Ok(())
    }
}

/// Writes `data` next to `path` and renames it into place.
fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{}.tmp-{}", file_name, std::process::id()));

    let result = (|| {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(data)?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    })();
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}
