//! File-state comparison between commits, the working directory and the
//! empty state.
//!
//! A comparison partitions the union of paths on both sides into three
//! sorted sets: paths only on the new side (`added`), paths only on the old
//! side (`removed`), and paths on both sides whose blob ids differ
//! (`modified`). Unchanged paths appear in none of them.
//!
//! The optional line diff is positional: line `i` of the old content is
//! compared with line `i` of the new content. It is not a minimal edit
//! script.

use crate::reference::Reference;
use crate::repository::Repository;
use crate::worktree::{self, FileStates};
use crate::Result;
use pvcs_storage::{ObjectId, ObjectType};
use std::fmt;
use std::fs;

/// Paths that differ between two file-state maps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Paths present only on the new side.
    pub added: Vec<String>,
    /// Paths present only on the old side.
    pub removed: Vec<String>,
    /// Paths present on both sides with different content.
    pub modified: Vec<String>,
}

impl ChangeSet {
    /// Compares `old` against `new`.
    pub fn compare(old: &FileStates, new: &FileStates) -> Self {
        let mut changes = Self::default();
        for (path, old_id) in old {
            match new.get(path) {
                None => changes.removed.push(path.clone()),
                Some(new_id) if new_id != old_id => changes.modified.push(path.clone()),
                Some(_) => {}
            }
        }
        changes.added = new
            .keys()
            .filter(|path| !old.contains_key(*path))
            .cloned()
            .collect();
        changes
    }

    /// Returns true if both sides hold the same files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    /// Number of changed paths.
    #[must_use]
    pub fn total(&self) -> usize {
        self.added.len() + self.removed.len() + self.modified.len()
    }
}

/// One line of a positional line diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineChange {
    /// A line only the old content has at this position.
    Removed(String),
    /// A line only the new content has at this position.
    Added(String),
}

impl fmt::Display for LineChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Removed(line) => write!(f, "- {}", line),
            Self::Added(line) => write!(f, "+ {}", line),
        }
    }
}

/// Splits `text` at every Unicode line boundary.
///
/// Breaks are `\n`, `\r`, `\r\n`, `\x0b`, `\x0c`, `\x1c`, `\x1d`, `\x1e`,
/// `\u{85}`, `\u{2028}` and `\u{2029}`. Terminators are dropped and a
/// trailing terminator does not start an extra empty line.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        let is_break = matches!(
            c,
            '\n' | '\r'
                | '\x0b'
                | '\x0c'
                | '\x1c'
                | '\x1d'
                | '\x1e'
                | '\u{85}'
                | '\u{2028}'
                | '\u{2029}'
        );
        if !is_break {
            continue;
        }
        lines.push(&text[start..i]);
        start = i + c.len_utf8();
        if c == '\r' && chars.peek().is_some_and(|&(_, next)| next == '\n') {
            chars.next();
            start += 1;
        }
    }
    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

/// Compares two texts line by line at equal indices.
///
/// Where both lines exist and differ the removal is emitted before the
/// addition.
pub fn line_diff(old: &str, new: &str) -> Vec<LineChange> {
    let old = split_lines(old);
    let new = split_lines(new);

    let mut changes = Vec::new();
    for i in 0..old.len().max(new.len()) {
        match (old.get(i), new.get(i)) {
            (Some(a), Some(b)) if a == b => {}
            (Some(a), Some(b)) => {
                changes.push(LineChange::Removed((*a).to_string()));
                changes.push(LineChange::Added((*b).to_string()));
            }
            (Some(a), None) => changes.push(LineChange::Removed((*a).to_string())),
            (None, Some(b)) => changes.push(LineChange::Added((*b).to_string())),
            (None, None) => {}
        }
    }
    changes
}

/// Line-level changes for one modified path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    /// The modified path.
    pub path: String,
    /// Its positional line changes.
    pub changes: Vec<LineChange>,
}

/// One side of a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// No files at all.
    Empty,
    /// HEAD, when compared implicitly.
    Head(ObjectId),
    /// A commit named by reference.
    Commit(ObjectId),
    /// The live working directory.
    WorkingDirectory,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("empty state"),
            Self::Head(id) => write!(f, "HEAD ({})", id.short()),
            Self::Commit(id) => write!(f, "commit {}", id.short()),
            Self::WorkingDirectory => f.write_str("working directory"),
        }
    }
}

/// What to compare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffSpec {
    /// HEAD (or the empty state) against the working directory.
    HeadToWorkdir,
    /// A commit against the working directory.
    CommitToWorkdir(Reference),
    /// One commit against another.
    Commits(Reference, Reference),
}

impl DiffSpec {
    /// Picks the mode from zero, one or two references.
    pub fn from_refs(first: Option<Reference>, second: Option<Reference>) -> Self {
        match (first, second) {
            (Some(a), Some(b)) => Self::Commits(a, b),
            (Some(a), None) | (None, Some(a)) => Self::CommitToWorkdir(a),
            (None, None) => Self::HeadToWorkdir,
        }
    }
}

/// Outcome of [`Repository::diff`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffReport {
    /// Old side.
    pub from: Side,
    /// New side.
    pub to: Side,
    /// Changed paths.
    pub changes: ChangeSet,
    /// Line diffs of modified paths; empty unless requested.
    pub files: Vec<FileDiff>,
}

impl Repository {
    /// Compares two sides selected by `spec`.
    ///
    /// With `detailed`, each modified path also gets a positional line diff.
    pub fn diff(&self, spec: &DiffSpec, detailed: bool) -> Result<DiffReport> {
        let (from, to) = match spec {
            DiffSpec::HeadToWorkdir => {
                let from = self.head().map_or(Side::Empty, Side::Head);
                (from, Side::WorkingDirectory)
            }
            DiffSpec::CommitToWorkdir(reference) => {
                (self.side_for(reference)?, Side::WorkingDirectory)
            }
            DiffSpec::Commits(a, b) => (self.side_for(a)?, self.side_for(b)?),
        };

        let old = self.file_states(&from)?;
        let new = self.file_states(&to)?;
        let changes = ChangeSet::compare(&old, &new);
        tracing::debug!(
            %from,
            %to,
            added = changes.added.len(),
            removed = changes.removed.len(),
            modified = changes.modified.len(),
            "compared file states"
        );

        let mut files = Vec::new();
        if detailed {
            for path in &changes.modified {
                let before = self.side_content(&from, &old, path)?;
                let after = self.side_content(&to, &new, path)?;
                files.push(FileDiff {
                    path: path.clone(),
                    changes: line_diff(&before, &after),
                });
            }
        }

        Ok(DiffReport {
            from,
            to,
            changes,
            files,
        })
    }

    /// Loads the path to blob-id map for one side.
    pub fn file_states(&self, side: &Side) -> Result<FileStates> {
        match side {
            Side::Empty => Ok(FileStates::new()),
            Side::Head(id) | Side::Commit(id) => self.commit_states(id),
            Side::WorkingDirectory => worktree::scan_states(self.root(), self.ignore()),
        }
    }

    fn side_for(&self, reference: &Reference) -> Result<Side> {
        Ok(Side::Commit(self.resolve(reference)?))
    }

    fn side_content(&self, side: &Side, states: &FileStates, path: &str) -> Result<String> {
        let Some(blob) = states.get(path) else {
            return Ok(String::new());
        };
        let text = match side {
            Side::WorkingDirectory => {
                let bytes = fs::read(worktree::checkout_path(self.root(), path)?)?;
                String::from_utf8_lossy(&bytes).into_owned()
            }
            _ => {
                let object = self.objects().get_kind(blob, ObjectType::Blob)?;
                String::from_utf8_lossy(&object.data).into_owned()
            }
        };
        Ok(text)
    }
}
