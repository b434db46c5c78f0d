//! Commit objects and timestamps.

use crate::{Object, ObjectId, ObjectType, Result, StorageError};
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A Unix timestamp with millisecond precision.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a `Timestamp` from milliseconds since the Unix epoch.
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the current time.
    #[must_use]
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        Self(i64::try_from(duration.as_millis()).unwrap_or(i64::MAX))
    }

    /// Milliseconds since the Unix epoch.
    #[must_use]
    pub const fn as_millis(&self) -> i64 {
        self.0
    }

    /// Converts to a `DateTime<Utc>`.
    #[must_use]
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.0)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(dt) = self.to_datetime() {
            write!(f, "Timestamp({})", dt.format("%Y-%m-%dT%H:%M:%S%.3fZ"))
        } else {
            write!(f, "Timestamp({})", self.0)
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(dt) = self.to_datetime() {
            write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%SZ"))
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// A commit: a tree, an optional parent, an optional message and a time.
///
/// Encoded with a fixed field order:
///
/// ```text
/// tree <hex>
/// parent <hex>        (only when there is a parent)
/// timestamp <millis>
///                     (blank line and message only when there is a message)
/// <message>
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// Snapshot this commit records.
    pub tree: ObjectId,
    /// Previous commit in the chain.
    pub parent: Option<ObjectId>,
    /// User-supplied message.
    pub message: Option<String>,
    /// Creation time.
    pub timestamp: Timestamp,
}

impl Commit {
    /// Creates a commit stamped with the current time.
    pub fn new(tree: ObjectId, parent: Option<ObjectId>, message: Option<String>) -> Self {
        Self {
            tree,
            parent,
            message,
            timestamp: Timestamp::now(),
        }
    }

    /// Serializes the commit canonically.
    pub fn encode(&self) -> Vec<u8> {
        let mut content = format!("tree {}\n", self.tree);
        if let Some(parent) = &self.parent {
            content.push_str(&format!("parent {}\n", parent));
        }
        content.push_str(&format!("timestamp {}\n", self.timestamp.as_millis()));
        if let Some(message) = &self.message {
            content.push('\n');
            content.push_str(message);
        }
        content.into_bytes()
    }

    /// Parses a canonical commit payload.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(data)
            .map_err(|e| StorageError::InvalidObject(format!("commit is not UTF-8: {}", e)))?;

        let (headers, message) = match text.split_once("\n\n") {
            Some((headers, message)) => (headers, Some(message.to_string())),
            None => (text.strip_suffix('\n').unwrap_or(text), None),
        };

        let mut lines = headers.lines();
        let tree = match lines.next().and_then(|l| l.strip_prefix("tree ")) {
            Some(hex) => ObjectId::from_hex(hex)?,
            None => return Err(invalid("missing tree line")),
        };

        let mut next = lines.next();
        let parent = match next.and_then(|l| l.strip_prefix("parent ")) {
            Some(hex) => {
                next = lines.next();
                Some(ObjectId::from_hex(hex)?)
            }
            None => None,
        };

        let timestamp = match next.and_then(|l| l.strip_prefix("timestamp ")) {
            Some(millis) => Timestamp::from_millis(
                millis
                    .parse()
                    .map_err(|_| invalid("invalid timestamp"))?,
            ),
            None => return Err(invalid("missing timestamp line")),
        };

        if lines.next().is_some() {
            return Err(invalid("unexpected header line"));
        }

        Ok(Self {
            tree,
            parent,
            message,
            timestamp,
        })
    }

    /// Builds the commit object without storing it.
    pub fn to_object(&self) -> Object {
        Object::new(ObjectType::Commit, self.encode())
    }

    /// Computes the commit's id without storing it.
    pub fn id(&self) -> ObjectId {
        ObjectId::hash_object(ObjectType::Commit, &self.encode())
    }
}

fn invalid(reason: &str) -> StorageError {
    StorageError::InvalidObject(format!("commit: {}", reason))
}
