//! Resolving user-supplied commit references.

use crate::repository::{Repository, RevertSummary};
use crate::{RepoError, Result};
use pvcs_storage::{ObjectId, ObjectType};
use std::fmt;

/// Shortest abbreviated hash accepted as a commit reference.
pub const MIN_ABBREV_LEN: usize = 7;

/// A way of naming a commit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Reference {
    /// A full or abbreviated commit hash.
    Hash(String),
    /// A snapshot message recorded in the ref map.
    Message(String),
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hash(hash) => f.write_str(hash),
            Self::Message(message) => write!(f, "'{}'", message),
        }
    }
}

fn looks_like_hash(raw: &str) -> bool {
    (MIN_ABBREV_LEN..=ObjectId::HEX_LEN).contains(&raw.len())
        && raw.bytes().all(|b| b.is_ascii_hexdigit())
}

impl Repository {
    /// Resolves a reference to a commit id.
    pub fn resolve(&self, reference: &Reference) -> Result<ObjectId> {
        match reference {
            Reference::Hash(raw) => self.resolve_hash(raw),
            Reference::Message(message) => self
                .refs()
                .get(message)
                .ok_or_else(|| RepoError::NoSnapshotForMessage(message.clone())),
        }
    }

    /// Classifies a raw argument: a resolvable hash first, then a message.
    pub fn infer_reference(&self, raw: &str) -> Result<Reference> {
        if looks_like_hash(raw) {
            match self.resolve_hash(raw) {
                Ok(_) => return Ok(Reference::Hash(raw.to_string())),
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
        }
        if self.refs().get(raw).is_some() {
            return Ok(Reference::Message(raw.to_string()));
        }
        Err(RepoError::UnresolvedReference(raw.to_string()))
    }

    /// Reverts to the commit a reference names.
    pub fn revert(&mut self, reference: &Reference) -> Result<RevertSummary> {
        match reference {
            Reference::Message(message) => self.revert_to_message(message),
            Reference::Hash(_) => {
                let commit = self.resolve(reference)?;
                self.revert_to_digest(&commit)
            }
        }
    }

    fn resolve_hash(&self, raw: &str) -> Result<ObjectId> {
        if !looks_like_hash(raw) {
            return Err(RepoError::UnresolvedReference(raw.to_string()));
        }

        if raw.len() == ObjectId::HEX_LEN {
            let id = ObjectId::from_hex(&raw.to_ascii_lowercase())?;
            self.load_commit(&id)?;
            return Ok(id);
        }

        let mut commits = Vec::new();
        for id in self.objects().find_prefix(raw)? {
            match self.objects().get_kind(&id, ObjectType::Commit) {
                Ok(_) => commits.push(id),
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e.into()),
            }
        }

        match commits.as_slice() {
            [] => Err(RepoError::CommitNotFound(raw.to_string())),
            [id] => Ok(*id),
            _ => Err(RepoError::AmbiguousReference {
                prefix: raw.to_string(),
                count: commits.len(),
            }),
        }
    }
}
