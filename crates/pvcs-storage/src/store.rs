//! Filesystem-backed content-addressed object store.

use crate::{CompressionLevel, Object, ObjectId, ObjectType, Result, StorageError};
use bytes::Bytes;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// Content-addressed object store.
///
/// Every object lives in its own file, `<dir>/<hex-id>`, holding the zlib
/// stream of `"<kind> <len>\0" ‖ payload`. The store is append-only.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    dir: PathBuf,
    level: CompressionLevel,
}

impl ObjectStore {
    /// Opens the store rooted at `dir` without touching the filesystem.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            level: CompressionLevel::default(),
        }
    }

    /// Creates the object directory if needed and opens the store.
    pub fn init(dir: impl Into<PathBuf>) -> Result<Self> {
        let store = Self::open(dir);
        fs::create_dir_all(&store.dir)?;
        Ok(store)
    }

    /// Sets the compression level used for new writes.
    #[must_use]
    pub fn with_compression(mut self, level: CompressionLevel) -> Self {
        self.level = level;
        self
    }

    /// Returns the object directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the file path an object is stored at.
    pub fn object_path(&self, id: &ObjectId) -> PathBuf {
        self.dir.join(id.to_hex())
    }

    /// Stores an object and returns its ID.
    ///
    /// Existing objects are never rewritten. New objects are written to a
    /// temporary file and renamed into place.
    pub fn put(&self, object: &Object) -> Result<ObjectId> {
        let path = self.object_path(&object.id);
        if path.exists() {
            tracing::trace!(id = %object.id, "object already stored");
            return Ok(object.id);
        }

        let compressed = Self::compress(object, self.level)?;
        let tmp = self
            .dir
            .join(format!(".tmp-{}-{}", std::process::id(), object.id));

        let written = (|| -> io::Result<()> {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&compressed)?;
            file.sync_all()?;
            fs::rename(&tmp, &path)
        })();
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        tracing::debug!(
            id = %object.id,
            kind = %object.object_type,
            size = object.size(),
            stored = compressed.len(),
            "stored object"
        );
        Ok(object.id)
    }

    /// Hashes and stores a payload of the given kind.
    pub fn put_bytes(&self, object_type: ObjectType, data: impl Into<Bytes>) -> Result<ObjectId> {
        self.put(&Object::new(object_type, data))
    }

    /// Stores a blob and returns its ID.
    pub fn put_blob(&self, content: impl Into<Bytes>) -> Result<ObjectId> {
        self.put(&Object::blob(content))
    }

    /// Retrieves and verifies an object by ID.
    pub fn get(&self, id: &ObjectId) -> Result<Object> {
        let compressed = match fs::read(self.object_path(id)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(format!("object {}", id)));
            }
            Err(e) => return Err(e.into()),
        };

        let object = Self::decompress(&compressed).map_err(|e| match e {
            StorageError::Io(_) => e,
            other => StorageError::Corruption(format!("object {}: {}", id, other)),
        })?;
        if object.id != *id {
            return Err(StorageError::Corruption(format!(
                "object {} hashes to {}",
                id, object.id
            )));
        }
        Ok(object)
    }

    /// Retrieves an object, treating an object of another kind as missing.
    pub fn get_kind(&self, id: &ObjectId, object_type: ObjectType) -> Result<Object> {
        let object = self.get(id)?;
        if object.object_type != object_type {
            return Err(StorageError::NotFound(format!(
                "{} {} (found {})",
                object_type, id, object.object_type
            )));
        }
        Ok(object)
    }

    /// Checks if an object exists.
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.object_path(id).is_file()
    }

    /// Lists all stored object IDs in ascending order.
    pub fn list(&self) -> Result<Vec<ObjectId>> {
        self.find_prefix("")
    }

    /// Lists the IDs whose hex form starts with `prefix` (case-insensitive).
    pub fn find_prefix(&self, prefix: &str) -> Result<Vec<ObjectId>> {
        let prefix = prefix.to_ascii_lowercase();
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !name.starts_with(&prefix) {
                continue;
            }
            // Temp files and strays are skipped.
            if let Ok(id) = ObjectId::from_hex(name) {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Compresses an object (header and payload) using zlib.
    pub fn compress(object: &Object, level: CompressionLevel) -> Result<Vec<u8>> {
        let header = object.object_type.header(object.data.len());
        let mut encoder = ZlibEncoder::new(Vec::new(), level.to_flate2());
        encoder
            .write_all(header.as_bytes())
            .map_err(|e| StorageError::Compression(e.to_string()))?;
        encoder
            .write_all(&object.data)
            .map_err(|e| StorageError::Compression(e.to_string()))?;
        encoder
            .finish()
            .map_err(|e| StorageError::Compression(e.to_string()))
    }

    /// Decompresses an object from its zlib encoding.
    pub fn decompress(compressed: &[u8]) -> Result<Object> {
        let mut decoder = ZlibDecoder::new(compressed);
        let mut decompressed = Vec::new();
        decoder
            .read_to_end(&mut decompressed)
            .map_err(|e| StorageError::Compression(e.to_string()))?;

        // Parse header: "type size\0data"
        let null_pos = decompressed.iter().position(|&b| b == 0).ok_or_else(|| {
            StorageError::InvalidObject("missing null byte in header".to_string())
        })?;

        let header = String::from_utf8_lossy(&decompressed[..null_pos]);
        let (kind, size) = header.split_once(' ').ok_or_else(|| {
            StorageError::InvalidObject(format!("invalid header: {}", header))
        })?;

        let object_type = ObjectType::parse(kind)?;
        let size: usize = size
            .parse()
            .map_err(|_| StorageError::InvalidObject("invalid size".to_string()))?;

        let data = &decompressed[null_pos + 1..];
        if data.len() != size {
            return Err(StorageError::InvalidObject(format!(
                "size mismatch: header says {}, payload is {}",
                size,
                data.len()
            )));
        }

        Ok(Object::new(object_type, Bytes::copy_from_slice(data)))
    }
}
