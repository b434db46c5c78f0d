//! Ignore filter for working-directory enumeration.
//!
//! Every token matches by substring containment against the
//! repository-relative path, so `secret` excludes both `secret.txt` and
//! `dir/secret/file`. There is no glob syntax.

use crate::config::{RepoConfig, STORAGE_DIR};
use std::fs;
use std::io;
use std::path::Path;

/// Tokens every repository ignores, besides the ignore file itself.
const DEFAULT_TOKENS: &[&str] = &[STORAGE_DIR, ".git"];

/// Substring-based exclusion predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreFilter {
    tokens: Vec<String>,
}

impl IgnoreFilter {
    /// Creates a filter from an explicit token list.
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut filter = Self::default();
        for token in tokens {
            filter.add(token);
        }
        filter
    }

    /// Builds the filter for a working root: defaults, configured extras and
    /// the tokens listed in the ignore file when it exists.
    ///
    /// An ignore file that exists but cannot be read is reported and skipped.
    pub fn load(root: &Path, config: &RepoConfig) -> Self {
        let mut filter = Self::new(DEFAULT_TOKENS.iter().copied());
        filter.add(config.ignore_file.as_str());
        for token in &config.extra_ignore {
            filter.add(token.as_str());
        }

        let ignore_path = root.join(&config.ignore_file);
        match fs::read_to_string(&ignore_path) {
            Ok(text) => {
                for token in text.split_whitespace() {
                    filter.add(token);
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %ignore_path.display(), error = %e, "cannot read ignore file");
            }
        }

        tracing::debug!(tokens = ?filter.tokens, "ignore filter loaded");
        filter
    }

    /// Adds a token; empty and duplicate tokens are skipped.
    pub fn add(&mut self, token: impl Into<String>) {
        let token = token.into();
        if !token.is_empty() && !self.tokens.contains(&token) {
            self.tokens.push(token);
        }
    }

    /// Returns the active tokens.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Returns true if `path` contains any token.
    #[must_use]
    pub fn is_excluded(&self, path: &str) -> bool {
        self.tokens.iter().any(|token| path.contains(token.as_str()))
    }
}
