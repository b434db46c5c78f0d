//! Object storage for pvcs.
//!
//! This crate provides content-addressed storage for blobs, trees and
//! commits, their canonical encodings, and the two mutable references a
//! repository keeps: the message ref map and HEAD.

mod commit;
mod compression;
mod error;
mod object;
mod refs;
mod store;
mod tree;

pub use commit::{Commit, Timestamp};
pub use compression::CompressionLevel;
pub use error::StorageError;
pub use object::{Object, ObjectId, ObjectType};
pub use refs::{Head, RefMap};
pub use store::ObjectStore;
pub use tree::Tree;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
