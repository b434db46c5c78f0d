//! Repository operations for pvcs.
//!
//! A [`Repository`] ties the object store from `pvcs-storage` to a working
//! directory. It records snapshots as a linear chain of commits, hard-resets
//! the working directory to any stored commit, walks history from HEAD, and
//! compares file states between commits, the working directory and the
//! empty state.
//!
//! # Example
//!
//! ```no_run
//! use pvcs_repo::{DiffSpec, Repository, SnapshotOutcome};
//!
//! # fn main() -> pvcs_repo::Result<()> {
//! Repository::init(".")?;
//! let mut repo = Repository::open(".")?;
//!
//! if let SnapshotOutcome::Created { commit, .. } = repo.snapshot(Some("first"))? {
//!     println!("created {commit}");
//! }
//!
//! let report = repo.diff(&DiffSpec::HeadToWorkdir, false)?;
//! assert!(report.changes.is_empty());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod diff;
mod error;
pub mod ignore;
pub mod reference;
pub mod repository;
pub mod worktree;

pub use config::RepoConfig;
pub use diff::{line_diff, split_lines, ChangeSet, DiffReport, DiffSpec, FileDiff, LineChange, Side};
pub use error::{RepoError, Result};
pub use ignore::IgnoreFilter;
pub use reference::Reference;
pub use repository::{LogEntry, Repository, RevertSummary, SnapshotOutcome};
pub use worktree::FileStates;
