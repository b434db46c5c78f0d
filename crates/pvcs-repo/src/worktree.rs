//! Working-directory enumeration.

use crate::ignore::IgnoreFilter;
use crate::{RepoError, Result};
use pvcs_storage::{ObjectId, ObjectType};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Path to blob-id map describing one side of a comparison.
pub type FileStates = BTreeMap<String, ObjectId>;

/// A regular file found under the working root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingFile {
    /// Repository-relative, `/`-separated path.
    pub path: String,
    /// Absolute (root-joined) path on disk.
    pub abs: PathBuf,
}

/// Lists every regular, non-excluded file under `root` in path order.
///
/// Excluded directories are pruned without descending. Symlinks are not
/// followed and not reported. Entries whose names are not valid UTF-8 are
/// skipped with a warning, along with everything beneath them.
pub fn walk(root: &Path, ignore: &IgnoreFilter) -> Result<Vec<WorkingFile>> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| match relative_path(root, entry.path()) {
            Ok(rel) => !ignore.is_excluded(&rel),
            Err(_) => {
                tracing::warn!(path = %entry.path().display(), "skipping non-UTF-8 path");
                false
            }
        });

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = relative_path(root, entry.path())?;
        files.push(WorkingFile {
            path,
            abs: entry.into_path(),
        });
    }
    Ok(files)
}

/// Removes `dir` and every directory beneath it that holds no files.
///
/// Directories that still contain something are left in place.
pub fn prune_empty_dirs(dir: &Path) -> Result<()> {
    for entry in WalkDir::new(dir).contents_first(true) {
        let entry = entry?;
        if entry.file_type().is_dir() && fs::read_dir(entry.path())?.next().is_none() {
            fs::remove_dir(entry.path())?;
            tracing::debug!(path = %entry.path().display(), "removed empty directory");
        }
    }
    Ok(())
}

/// Hashes every working file as a blob without storing anything.
///
/// Unreadable files are skipped with a warning.
pub fn scan_states(root: &Path, ignore: &IgnoreFilter) -> Result<FileStates> {
    let mut states = FileStates::new();
    for file in walk(root, ignore)? {
        match fs::read(&file.abs) {
            Ok(content) => {
                states.insert(file.path, ObjectId::hash_object(ObjectType::Blob, &content));
            }
            Err(e) => {
                tracing::warn!(path = %file.path, error = %e, "skipping unreadable file");
            }
        }
    }
    Ok(states)
}

/// Converts `path` under `root` to a `/`-separated UTF-8 relative path.
pub fn relative_path(root: &Path, path: &Path) -> Result<String> {
    let rel = path
        .strip_prefix(root)
        .map_err(|_| RepoError::InvalidPath(path.display().to_string()))?;

    let mut parts = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(part) => parts.push(
                part.to_str()
                    .ok_or_else(|| RepoError::InvalidPath(path.display().to_string()))?,
            ),
            Component::CurDir => {}
            _ => return Err(RepoError::InvalidPath(path.display().to_string())),
        }
    }
    Ok(parts.join("/"))
}

/// Maps a stored relative path back under `root`, refusing anything that
/// would escape it.
pub fn checkout_path(root: &Path, path: &str) -> Result<PathBuf> {
    let mut abs = root.to_path_buf();
    for part in path.split('/') {
        if part.is_empty() || part == "." || part == ".." || Path::new(part).is_absolute() {
            return Err(RepoError::InvalidPath(path.to_string()));
        }
        abs.push(part);
    }
    Ok(abs)
}
