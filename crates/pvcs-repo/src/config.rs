//! Repository configuration.
//!
//! Layered with the `config` crate: built-in defaults, then
//! `.pvcs/config.toml` when present, then `PVCS_*` environment variables.

use crate::Result;
use config::{Config, Environment, File};
use pvcs_storage::CompressionLevel;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the repository storage directory under the working root.
pub const STORAGE_DIR: &str = ".pvcs";

/// Name of the optional configuration file inside the storage directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Per-repository settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RepoConfig {
    /// Ignore file name, relative to the working root.
    pub ignore_file: String,
    /// Tokens excluded in addition to the defaults and the ignore file.
    pub extra_ignore: Vec<String>,
    /// Compression applied to new objects and the ref map.
    pub compression: CompressionLevel,
    /// Default number of entries shown by `log`.
    pub log_limit: usize,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            ignore_file: ".pvcsignore".to_string(),
            extra_ignore: Vec::new(),
            compression: CompressionLevel::Default,
            log_limit: 10,
        }
    }
}

impl RepoConfig {
    /// Loads configuration for the repository whose storage dir is `storage_dir`.
    pub fn load(storage_dir: &Path) -> Result<Self> {
        Self::load_with_env(storage_dir, Environment::with_prefix("PVCS"))
    }

    fn load_with_env(storage_dir: &Path, env: Environment) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from(storage_dir.join(CONFIG_FILE)).required(false))
            .add_source(
                env.try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("extra_ignore"),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    fn no_env() -> Environment {
        Environment::with_prefix("PVCS").source(Some(HashMap::new()))
    }

    #[test]
    fn defaults_without_file() {
        let temp = TempDir::new().unwrap();
        let config = RepoConfig::load_with_env(temp.path(), no_env()).unwrap();
        assert_eq!(config, RepoConfig::default());
    }

    #[test]
    fn file_overrides_defaults() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE),
            "compression = \"best\"\nlog_limit = 3\nextra_ignore = [\"target\", \".env\"]\n",
        )
        .unwrap();

        let config = RepoConfig::load_with_env(temp.path(), no_env()).unwrap();
        assert_eq!(config.compression, CompressionLevel::Best);
        assert_eq!(config.log_limit, 3);
        assert_eq!(config.extra_ignore, vec!["target".to_string(), ".env".to_string()]);
        assert_eq!(config.ignore_file, ".pvcsignore");
    }

    #[test]
    fn environment_overrides_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE), "log_limit = 3\n").unwrap();

        let vars = HashMap::from([
            ("PVCS_LOG_LIMIT".to_string(), "25".to_string()),
            ("PVCS_EXTRA_IGNORE".to_string(), "build,dist".to_string()),
        ]);
        let env = Environment::with_prefix("PVCS").source(Some(vars));

        let config = RepoConfig::load_with_env(temp.path(), env).unwrap();
        assert_eq!(config.log_limit, 25);
        assert_eq!(config.extra_ignore, vec!["build".to_string(), "dist".to_string()]);
    }

    #[test]
    fn invalid_compression_is_an_error() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE), "compression = \"ultra\"\n").unwrap();
        assert!(RepoConfig::load_with_env(temp.path(), no_env()).is_err());
    }
}
