//! CLI command implementations.

use anyhow::{Context, Result};
use pvcs_repo::{
    DiffReport, DiffSpec, LogEntry, Reference, Repository, RevertSummary, Side, SnapshotOutcome,
};
use std::fmt::Write as _;
use std::path::Path;

fn open(root: &Path) -> Result<Repository> {
    Repository::open(root).with_context(|| format!("cannot open repository at {}", root.display()))
}

/// Initialize a repository.
pub fn init(root: &Path) -> Result<()> {
    let created = Repository::init(root)?;
    let dir = root.join(".pvcs");
    if created {
        println!("Initialized empty pvcs repository in {}", dir.display());
    } else {
        println!("Reinitialized existing pvcs repository in {}", dir.display());
    }
    Ok(())
}

/// Record a snapshot.
pub fn snapshot(root: &Path, message: Option<&str>) -> Result<()> {
    let mut repo = open(root)?;
    match repo.snapshot(message)? {
        SnapshotOutcome::Created { commit, files, .. } => {
            println!("Snapshot created with hash {commit} ({files} file(s))");
        }
        SnapshotOutcome::Unchanged { head } => {
            println!("No changes since last snapshot (HEAD {})", head.short());
        }
    }
    Ok(())
}

/// Revert by hash or by message.
pub fn revert(root: &Path, hash: Option<&str>, message: Option<&str>) -> Result<()> {
    let reference = match (hash, message) {
        (_, Some(message)) => Reference::Message(message.to_string()),
        (Some(hash), None) => Reference::Hash(hash.to_string()),
        (None, None) => anyhow::bail!("missing snapshot hash or -m MESSAGE"),
    };

    let mut repo = open(root)?;
    let summary = repo.revert(&reference)?;
    print!("{}", render_revert(&summary));
    Ok(())
}

/// Show history.
pub fn log(root: &Path, count: Option<usize>) -> Result<()> {
    let repo = open(root)?;
    let limit = count.unwrap_or(repo.config().log_limit);
    let entries = repo.log(limit)?;
    if entries.is_empty() {
        println!("No commits yet");
    } else {
        print!("{}", render_log(&entries));
    }
    Ok(())
}

/// Compare commits or the working directory.
pub fn diff(root: &Path, refs: &[String], detailed: bool) -> Result<()> {
    let repo = open(root)?;
    let mut resolved = refs.iter().map(|raw| repo.infer_reference(raw));
    let first = resolved.next().transpose()?;
    let second = resolved.next().transpose()?;
    let spec = DiffSpec::from_refs(first, second);

    let report = repo.diff(&spec, detailed)?;
    if spec == DiffSpec::HeadToWorkdir && report.from == Side::Empty {
        println!("No commits found. Working directory compared to empty state.");
    }
    print!("{}", render_diff(&report));
    Ok(())
}

fn render_revert(summary: &RevertSummary) -> String {
    let mut out = String::new();
    for path in &summary.removed {
        let _ = writeln!(out, "Removed {path}");
    }
    let _ = writeln!(
        out,
        "Reverted to snapshot {} ({} removed, {} restored)",
        summary.commit,
        summary.removed.len(),
        summary.restored
    );
    out
}

fn render_log(entries: &[LogEntry]) -> String {
    let mut out = String::new();
    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "commit {}", entry.id);
        let _ = writeln!(out, "Date: {}", entry.timestamp);
        let _ = writeln!(out);
        let _ = writeln!(out, "    {}", entry.message.as_deref().unwrap_or("(no message)"));
    }
    out
}

fn render_diff(report: &DiffReport) -> String {
    let mut out = String::new();
    let changes = &report.changes;
    if changes.is_empty() {
        let _ = writeln!(out, "No differences between {} and {}", report.from, report.to);
        return out;
    }

    let _ = writeln!(out, "Differences between {} and {}:", report.from, report.to);
    let _ = writeln!(out, "{}", "-".repeat(50));
    let sections = [
        ("Added", "+", &changes.added),
        ("Removed", "-", &changes.removed),
        ("Modified", "M", &changes.modified),
    ];
    for (title, marker, paths) in sections {
        if paths.is_empty() {
            continue;
        }
        let _ = writeln!(out, "\n{title} files ({}):", paths.len());
        for path in paths {
            let _ = writeln!(out, "  {marker} {path}");
        }
    }
    let _ = writeln!(out, "\n{} file(s) changed", changes.total());

    for file in &report.files {
        let _ = writeln!(out, "\nDiff for {}:", file.path);
        let _ = writeln!(out, "{}", "-".repeat(40));
        for change in &file.changes {
            let _ = writeln!(out, "{change}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use pvcs_repo::{ChangeSet, FileDiff, LineChange};
    use pvcs_storage::{ObjectId, ObjectType, Timestamp};

    fn id(seed: &[u8]) -> ObjectId {
        ObjectId::hash_object(ObjectType::Commit, seed)
    }

    #[test]
    fn diff_summary_layout() {
        let head = id(b"head");
        let report = DiffReport {
            from: Side::Head(head),
            to: Side::WorkingDirectory,
            changes: ChangeSet {
                added: vec!["z".into()],
                removed: vec!["x".into()],
                modified: vec![],
            },
            files: vec![],
        };

        let expected = format!(
            "Differences between HEAD ({}) and working directory:\n{}\n\nAdded files (1):\n  + z\n\nRemoved files (1):\n  - x\n\n2 file(s) changed\n",
            head.short(),
            "-".repeat(50)
        );
        assert_eq!(render_diff(&report), expected);
    }

    #[test]
    fn no_differences() {
        let a = id(b"a");
        let b = id(b"b");
        let report = DiffReport {
            from: Side::Commit(a),
            to: Side::Commit(b),
            changes: ChangeSet::default(),
            files: vec![],
        };
        assert_eq!(
            render_diff(&report),
            format!("No differences between commit {} and commit {}\n", a.short(), b.short())
        );
    }

    #[test]
    fn detailed_sections_follow_summary() {
        let report = DiffReport {
            from: Side::Empty,
            to: Side::WorkingDirectory,
            changes: ChangeSet {
                added: vec![],
                removed: vec![],
                modified: vec!["f".into()],
            },
            files: vec![FileDiff {
                path: "f".into(),
                changes: vec![LineChange::Removed("old".into()), LineChange::Added("new".into())],
            }],
        };

        let out = render_diff(&report);
        assert!(out.contains("Modified files (1):\n  M f\n"));
        assert!(out.ends_with(&format!("Diff for f:\n{}\n- old\n+ new\n", "-".repeat(40))));
    }

    #[test]
    fn log_layout() {
        let entries = vec![
            LogEntry {
                id: id(b"2"),
                timestamp: Timestamp::from_millis(1_700_000_000_000),
                message: None,
            },
            LogEntry {
                id: id(b"1"),
                timestamp: Timestamp::from_millis(0),
                message: Some("first".into()),
            },
        ];

        let expected = format!(
            "commit {}\nDate: 2023-11-14T22:13:20Z\n\n    (no message)\n\ncommit {}\nDate: 1970-01-01T00:00:00Z\n\n    first\n",
            id(b"2"),
            id(b"1")
        );
        assert_eq!(render_log(&entries), expected);
    }

    #[test]
    fn revert_lists_removed_files() {
        let summary = RevertSummary {
            commit: id(b"c"),
            removed: vec!["a".into(), "b/c".into()],
            restored: 3,
        };
        assert_eq!(
            render_revert(&summary),
            format!("Removed a\nRemoved b/c\nReverted to snapshot {} (2 removed, 3 restored)\n", id(b"c"))
        );
    }
}
