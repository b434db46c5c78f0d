//! Repository handle: snapshot, revert and log.

use crate::config::{RepoConfig, STORAGE_DIR};
use crate::ignore::IgnoreFilter;
use crate::worktree::{self, FileStates};
use crate::{RepoError, Result};
use pvcs_storage::{
    Commit, Head, ObjectId, ObjectStore, ObjectType, RefMap, Timestamp, Tree,
};
use std::fs;
use std::path::{Path, PathBuf};

/// Result of [`Repository::snapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotOutcome {
    /// A new commit was recorded and HEAD now points at it.
    Created {
        /// The new commit.
        commit: ObjectId,
        /// The tree it records.
        tree: ObjectId,
        /// Number of files in the tree.
        files: usize,
    },
    /// The working directory matches HEAD; nothing was written.
    Unchanged {
        /// The current HEAD.
        head: ObjectId,
    },
}

/// Result of a revert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevertSummary {
    /// The commit HEAD now points at.
    pub commit: ObjectId,
    /// Working files deleted because the target tree lacks them.
    pub removed: Vec<String>,
    /// Number of files written from the target tree.
    pub restored: usize,
}

/// One line of history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Commit id.
    pub id: ObjectId,
    /// When the commit was made.
    pub timestamp: Timestamp,
    /// Snapshot message, if any.
    pub message: Option<String>,
}

/// An open repository.
///
/// HEAD and the ref map are loaded when the handle is opened and written
/// back by each mutating operation, always after the objects they refer
/// to have been stored.
#[derive(Debug)]
pub struct Repository {
    root: PathBuf,
    dir: PathBuf,
    config: RepoConfig,
    objects: ObjectStore,
    ignore: IgnoreFilter,
    head_file: Head,
    head: Option<ObjectId>,
    refs: RefMap,
}

impl Repository {
    /// Creates the storage directory under `root` if needed.
    ///
    /// Returns `true` when the repository was created, `false` when it
    /// already existed.
    pub fn init(root: impl AsRef<Path>) -> Result<bool> {
        let dir = root.as_ref().join(STORAGE_DIR);
        let existed = dir.join("objects").is_dir();
        ObjectStore::init(dir.join("objects"))?;
        if !existed {
            tracing::info!(path = %dir.display(), "initialized repository");
        }
        Ok(!existed)
    }

    /// Opens the repository rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let dir = root.join(STORAGE_DIR);
        if !dir.is_dir() {
            return Err(RepoError::NotInitialized(dir.display().to_string()));
        }

        let config = RepoConfig::load(&dir)?;
        Self::open_with_config(root, config)
    }

    /// Opens the repository with an explicit configuration.
    pub fn open_with_config(root: impl AsRef<Path>, config: RepoConfig) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let dir = root.join(STORAGE_DIR);
        if !dir.is_dir() {
            return Err(RepoError::NotInitialized(dir.display().to_string()));
        }

        let objects = ObjectStore::open(dir.join("objects")).with_compression(config.compression);
        let ignore = IgnoreFilter::load(&root, &config);
        let head_file = Head::at(dir.join("HEAD"));
        let head = head_file.read()?;
        let refs = RefMap::load(&dir.join("ref"))?;

        Ok(Self {
            root,
            dir,
            config,
            objects,
            ignore,
            head_file,
            head,
            refs,
        })
    }

    /// The working root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The storage directory (`<root>/.pvcs`).
    pub fn storage_dir(&self) -> &Path {
        &self.dir
    }

    /// Active configuration.
    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    /// The object store.
    pub fn objects(&self) -> &ObjectStore {
        &self.objects
    }

    /// The ignore filter used for enumeration.
    pub fn ignore(&self) -> &IgnoreFilter {
        &self.ignore
    }

    /// The current HEAD, if any commit exists.
    pub fn head(&self) -> Option<ObjectId> {
        self.head
    }

    /// The message ref map.
    pub fn refs(&self) -> &RefMap {
        &self.refs
    }

    /// Loads a commit by id.
    pub fn load_commit(&self, id: &ObjectId) -> Result<Commit> {
        let object = self
            .objects
            .get_kind(id, ObjectType::Commit)
            .map_err(|e| not_found_as(e, || RepoError::CommitNotFound(id.to_hex())))?;
        Ok(Commit::decode(&object.data)?)
    }

    /// Loads a tree by id.
    pub fn load_tree(&self, id: &ObjectId) -> Result<Tree> {
        let object = self
            .objects
            .get_kind(id, ObjectType::Tree)
            .map_err(|e| not_found_as(e, || RepoError::TreeNotFound(id.to_hex())))?;
        Ok(Tree::decode(&object.data)?)
    }

    /// Loads the file states recorded by a commit.
    pub fn commit_states(&self, id: &ObjectId) -> Result<FileStates> {
        let commit = self.load_commit(id)?;
        Ok(self.load_tree(&commit.tree)?.into_entries())
    }

    /// Hashes the working directory without storing anything.
    pub fn working_states(&self) -> Result<FileStates> {
        worktree::scan_states(&self.root, &self.ignore)
    }

    /// Records the working directory as a new commit.
    ///
    /// Every file is stored as a blob before the tree is compared with
    /// HEAD. When the tree is unchanged nothing else is written and HEAD
    /// and the ref map are left alone.
    pub fn snapshot(&mut self, message: Option<&str>) -> Result<SnapshotOutcome> {
        let mut tree = Tree::new();
        for file in worktree::walk(&self.root, &self.ignore)? {
            let content = fs::read(&file.abs)?;
            let blob = self.objects.put_blob(content)?;
            tracing::debug!(path = %file.path, blob = %blob, "tracked file");
            tree.insert(file.path, blob)?;
        }

        let tree_id = tree.id();
        if let Some(head) = self.head {
            let current = self.load_commit(&head)?;
            if current.tree == tree_id {
                tracing::info!(head = %head, "no changes since HEAD");
                return Ok(SnapshotOutcome::Unchanged { head });
            }
        }

        self.objects.put(&tree.to_object())?;
        let commit = Commit::new(tree_id, self.head, message.map(str::to_string));
        let commit_id = self.objects.put(&commit.to_object())?;

        if let Some(message) = message {
            self.refs.set(message, commit_id);
            self.refs.save(&self.dir.join("ref"), self.config.compression)?;
        }
        self.set_head(commit_id)?;

        tracing::info!(
            commit = %commit_id,
            tree = %tree_id,
            parent = ?commit.parent,
            files = tree.len(),
            "snapshot created"
        );
        Ok(SnapshotOutcome::Created {
            commit: commit_id,
            tree: tree_id,
            files: tree.len(),
        })
    }

    /// Hard-resets the working directory to `commit` and moves HEAD there.
    ///
    /// Files absent from the target tree are deleted without backup. The
    /// target does not have to be an ancestor of HEAD.
    pub fn revert_to_digest(&mut self, commit: &ObjectId) -> Result<RevertSummary> {
        let target = self.load_commit(commit)?;
        let tree = self.load_tree(&target.tree)?;

        // Fetch every blob before touching the working directory.
        let mut contents = Vec::with_capacity(tree.len());
        for (path, blob) in tree.iter() {
            let abs = worktree::checkout_path(&self.root, path)?;
            let object = self.objects.get_kind(blob, ObjectType::Blob)?;
            contents.push((abs, object.data));
        }

        let mut removed = Vec::new();
        for file in worktree::walk(&self.root, &self.ignore)? {
            if tree.get(&file.path).is_none() {
                fs::remove_file(&file.abs)?;
                tracing::info!(path = %file.path, "removed file");
                removed.push(file.path);
            }
        }

        for (abs, data) in &contents {
            // A directory where a tracked file belongs only holds ignored
            // files or empty directories once the pass above has run.
            if fs::symlink_metadata(abs).is_ok_and(|meta| meta.is_dir()) {
                worktree::prune_empty_dirs(abs)?;
                if abs.exists() {
                    return Err(RepoError::InvalidPath(format!(
                        "{} is a directory holding ignored files",
                        abs.display()
                    )));
                }
            }
            if let Some(parent) = abs.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(abs, data)?;
        }

        self.set_head(*commit)?;
        tracing::info!(commit = %commit, removed = removed.len(), restored = contents.len(), "reverted");
        Ok(RevertSummary {
            commit: *commit,
            removed,
            restored: contents.len(),
        })
    }

    /// Reverts to the commit recorded for `message`.
    pub fn revert_to_message(&mut self, message: &str) -> Result<RevertSummary> {
        let commit = self
            .refs
            .get(message)
            .ok_or_else(|| RepoError::NoSnapshotForMessage(message.to_string()))?;
        self.revert_to_digest(&commit)
    }

    /// Walks history from HEAD, newest first, returning at most `limit` entries.
    pub fn log(&self, limit: usize) -> Result<Vec<LogEntry>> {
        let mut entries = Vec::new();
        let mut next = self.head;
        while let Some(id) = next {
            if entries.len() >= limit {
                break;
            }
            let commit = self.load_commit(&id)?;
            next = commit.parent;
            entries.push(LogEntry {
                id,
                timestamp: commit.timestamp,
                message: commit.message,
            });
        }
        Ok(entries)
    }

    fn set_head(&mut self, commit: ObjectId) -> Result<()> {
        self.head_file.write(&commit)?;
        self.head = Some(commit);
        Ok(())
    }
}

fn not_found_as(e: pvcs_storage::StorageError, f: impl FnOnce() -> RepoError) -> RepoError {
    if e.is_not_found() {
        f()
    } else {
        e.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn repo() -> (TempDir, Repository) {
        let temp = TempDir::new().unwrap();
        Repository::init(temp.path()).unwrap();
        let repo = Repository::open_with_config(temp.path(), RepoConfig::default()).unwrap();
        (temp, repo)
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn created(outcome: SnapshotOutcome) -> ObjectId {
        match outcome {
            SnapshotOutcome::Created { commit, .. } => commit,
            SnapshotOutcome::Unchanged { .. } => panic!("expected a new commit"),
        }
    }

    #[test]
    fn init_is_idempotent() {
        let temp = TempDir::new().unwrap();
        assert!(Repository::init(temp.path()).unwrap());
        assert!(!Repository::init(temp.path()).unwrap());
        assert!(temp.path().join(".pvcs/objects").is_dir());
    }

    #[test]
    fn open_requires_init() {
        let temp = TempDir::new().unwrap();
        let err = Repository::open(temp.path()).unwrap_err();
        assert!(matches!(err, RepoError::NotInitialized(_)));
    }

    #[test]
    fn first_snapshot_has_no_parent() {
        let (temp, mut repo) = repo();
        write(temp.path(), "a.txt", "hello");

        let commit = created(repo.snapshot(Some("first")).unwrap());
        let loaded = repo.load_commit(&commit).unwrap();

        assert_eq!(loaded.parent, None);
        assert_eq!(loaded.message.as_deref(), Some("first"));
        assert_eq!(repo.head(), Some(commit));
        assert_eq!(repo.refs().get("first"), Some(commit));
    }

    #[test]
    fn unchanged_snapshot_is_a_no_op() {
        let (temp, mut repo) = repo();
        write(temp.path(), "a.txt", "hello");
        let commit = created(repo.snapshot(None).unwrap());
        let objects = repo.objects().list().unwrap().len();

        let outcome = repo.snapshot(Some("again")).unwrap();
        assert_eq!(outcome, SnapshotOutcome::Unchanged { head: commit });
        assert_eq!(repo.head(), Some(commit));
        assert!(repo.refs().get("again").is_none());
        assert_eq!(repo.objects().list().unwrap().len(), objects);
    }

    #[test]
    fn edit_creates_child_commit() {
        let (temp, mut repo) = repo();
        write(temp.path(), "a.txt", "hello");
        let first = created(repo.snapshot(None).unwrap());

        write(temp.path(), "a.txt", "world");
        let second = created(repo.snapshot(None).unwrap());

        assert_eq!(repo.load_commit(&second).unwrap().parent, Some(first));
        assert_eq!(repo.log(10).unwrap().len(), 2);
    }

    #[test]
    fn snapshot_of_empty_directory() {
        let (_temp, mut repo) = repo();
        let commit = created(repo.snapshot(None).unwrap());
        assert!(repo.commit_states(&commit).unwrap().is_empty());
        assert!(matches!(
            repo.snapshot(None).unwrap(),
            SnapshotOutcome::Unchanged { .. }
        ));
    }

    #[test]
    fn reused_message_points_at_latest() {
        let (temp, mut repo) = repo();
        write(temp.path(), "a.txt", "1");
        created(repo.snapshot(Some("wip")).unwrap());
        write(temp.path(), "a.txt", "2");
        let second = created(repo.snapshot(Some("wip")).unwrap());

        assert_eq!(repo.refs().get("wip"), Some(second));
        let reopened = Repository::open_with_config(temp.path(), RepoConfig::default()).unwrap();
        assert_eq!(reopened.refs().get("wip"), Some(second));
        assert_eq!(reopened.head(), Some(second));
    }

    #[test]
    fn revert_missing_commit() {
        let (_temp, mut repo) = repo();
        let err = repo.revert_to_digest(&ObjectId::from_bytes([3u8; 32])).unwrap_err();
        assert!(matches!(err, RepoError::CommitNotFound(_)));
        assert_eq!(repo.head(), None);
    }

    #[test]
    fn revert_missing_tree() {
        let (_temp, mut repo) = repo();
        let dangling = Commit::new(ObjectId::from_bytes([4u8; 32]), None, None);
        let id = repo.objects().put(&dangling.to_object()).unwrap();

        let err = repo.revert_to_digest(&id).unwrap_err();
        assert!(matches!(err, RepoError::TreeNotFound(_)));
        assert_eq!(repo.head(), None);
    }

    #[test]
    fn revert_to_unknown_message() {
        let (_temp, mut repo) = repo();
        let err = repo.revert_to_message("nope").unwrap_err();
        assert!(matches!(err, RepoError::NoSnapshotForMessage(m) if m == "nope"));
    }

    #[test]
    fn revert_restores_and_deletes() {
        let (temp, mut repo) = repo();
        write(temp.path(), "a.txt", "hello");
        write(temp.path(), "dir/b.txt", "bee");
        let first = created(repo.snapshot(Some("first")).unwrap());

        write(temp.path(), "a.txt", "changed");
        write(temp.path(), "new.txt", "new");
        fs::remove_file(temp.path().join("dir/b.txt")).unwrap();
        created(repo.snapshot(None).unwrap());

        let summary = repo.revert_to_digest(&first).unwrap();
        assert_eq!(summary.removed, vec!["new.txt".to_string()]);
        assert_eq!(summary.restored, 2);
        assert_eq!(fs::read_to_string(temp.path().join("a.txt")).unwrap(), "hello");
        assert_eq!(fs::read_to_string(temp.path().join("dir/b.txt")).unwrap(), "bee");
        assert!(!temp.path().join("new.txt").exists());
        assert_eq!(repo.head(), Some(first));
    }

    #[test]
    fn revert_replaces_directory_with_tracked_file() {
        let (temp, mut repo) = repo();
        write(temp.path(), "a", "file");
        let first = created(repo.snapshot(None).unwrap());

        fs::remove_file(temp.path().join("a")).unwrap();
        write(temp.path(), "a/b", "nested");
        write(temp.path(), "a/c/d", "deeper");

        let summary = repo.revert_to_digest(&first).unwrap();
        assert_eq!(summary.removed, vec!["a/b".to_string(), "a/c/d".to_string()]);
        assert!(temp.path().join("a").is_file());
        assert_eq!(fs::read_to_string(temp.path().join("a")).unwrap(), "file");
        assert_eq!(repo.head(), Some(first));
    }

    #[test]
    fn revert_refuses_to_drop_ignored_files_in_the_way() {
        let (temp, mut repo) = repo();
        write(temp.path(), "a", "file");
        let first = created(repo.snapshot(None).unwrap());

        fs::remove_file(temp.path().join("a")).unwrap();
        write(temp.path(), "a/keep.local", "precious");
        write(temp.path(), ".pvcsignore", "local");
        let mut repo = Repository::open_with_config(temp.path(), RepoConfig::default()).unwrap();

        let err = repo.revert_to_digest(&first).unwrap_err();
        assert!(matches!(err, RepoError::InvalidPath(_)));
        assert!(temp.path().join("a/keep.local").exists());
    }

    #[test]
    fn snapshot_after_revert_extends_from_reverted_commit() {
        let (temp, mut repo) = repo();
        write(temp.path(), "a.txt", "1");
        let first = created(repo.snapshot(None).unwrap());
        write(temp.path(), "a.txt", "2");
        created(repo.snapshot(None).unwrap());

        repo.revert_to_digest(&first).unwrap();
        write(temp.path(), "a.txt", "3");
        let third = created(repo.snapshot(None).unwrap());

        assert_eq!(repo.load_commit(&third).unwrap().parent, Some(first));
    }

    #[test]
    fn log_is_capped_and_ordered() {
        let (temp, mut repo) = repo();
        let mut ids = Vec::new();
        for i in 0..4 {
            write(temp.path(), "f", &i.to_string());
            ids.push(created(repo.snapshot(Some(&format!("c{i}"))).unwrap()));
        }

        let log = repo.log(2).unwrap();
        assert_eq!(log.iter().map(|e| e.id).collect::<Vec<_>>(), vec![ids[3], ids[2]]);

        let all = repo.log(100).unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all[3].message.as_deref(), Some("c0"));
        assert!(all.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    }

    #[test]
    fn log_without_head_is_empty() {
        let (_temp, repo) = repo();
        assert!(repo.log(10).unwrap().is_empty());
        assert!(repo.log(0).unwrap().is_empty());
    }
}
