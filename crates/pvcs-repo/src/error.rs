//! Repository error types.

use pvcs_storage::StorageError;
use thiserror::Error;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepoError {
    /// The object store failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// An I/O error occurred in the working directory.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No repository storage directory exists at the given root.
    #[error("not a pvcs repository (no {0} found); run `pvcs init` first")]
    NotInitialized(String),

    /// A commit was not found.
    #[error("commit not found: {0}")]
    CommitNotFound(String),

    /// The tree a commit refers to was not found.
    #[error("tree not found: {0}")]
    TreeNotFound(String),

    /// No commit is recorded for a snapshot message.
    #[error("no snapshot found for message: '{0}'")]
    NoSnapshotForMessage(String),

    /// A reference matched neither a commit nor a message.
    #[error("could not resolve reference: {0}")]
    UnresolvedReference(String),

    /// An abbreviated hash matched more than one commit.
    #[error("ambiguous reference {prefix}: matches {count} commits")]
    AmbiguousReference {
        /// The abbreviated hash.
        prefix: String,
        /// How many commits it matched.
        count: usize,
    },

    /// A path cannot be tracked or restored.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl RepoError {
    /// Returns true for the "something does not exist" family of errors.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Storage(e) => e.is_not_found(),
            Self::NotInitialized(_)
            | Self::CommitNotFound(_)
            | Self::TreeNotFound(_)
            | Self::NoSnapshotForMessage(_)
            | Self::UnresolvedReference(_) => true,
            _ => false,
        }
    }
}

impl From<walkdir::Error> for RepoError {
    fn from(e: walkdir::Error) -> Self {
        Self::Io(e.into())
    }
}

/// A specialized Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepoError>;
