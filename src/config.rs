//! `blog.toml`: where the database lives and how connections behave

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use crate::storage::engine::DEFAULT_BUSY_TIMEOUT_MS;
use crate::storage::{StorageConfig, DEFAULT_DATABASE_PATH};

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "blog.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlogConfig {
    pub database: String,
    pub echo: bool,
    pub busy_timeout_ms: u64,
}

impl Default for BlogConfig {
    fn default() -> Self {
        Self {
            database: DEFAULT_DATABASE_PATH.to_string(),
            echo: false,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

impl BlogConfig {
    /// Read the config at `path`, or `blog.toml` when `None`.
    ///
    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = path.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("no config at {:?}, using defaults", path);
                return Ok(Self::default());
            }
            Err(e) => return Err(e).with_context(|| format!("cannot read config {}", path.display())),
        };

        toml::from_str(&contents).with_context(|| format!("invalid config {}", path.display()))
    }

    /// Write the config to `path`. An existing file is only replaced with `overwrite`.
    pub fn save(&self, path: &Path, overwrite: bool) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;

        let mut options = std::fs::OpenOptions::new();
        options.write(true);
        if overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }

        let mut file = options.open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::AlreadyExists => {
                anyhow::anyhow!("config already exists at {} (use --force to overwrite)", path.display())
            }
            _ => anyhow::Error::new(e).context(format!("cannot write config {}", path.display())),
        })?;
        file.write_all(contents.as_bytes())?;
        Ok(())
    }

    /// Command-line flags win over the file
    pub fn with_overrides(mut self, database: Option<&Path>, echo: bool) -> Self {
        if let Some(database) = database {
            self.database = database.display().to_string();
        }
        self.echo |= echo;
        self
    }

    pub fn storage(&self) -> StorageConfig {
        StorageConfig::new(&self.database)
            .with_echo(self.echo)
            .with_busy_timeout(Duration::from_millis(self.busy_timeout_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = BlogConfig::load(Some(&dir.path().join("blog.toml"))).unwrap();
        assert_eq!(loaded, BlogConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blog.toml");
        std::fs::write(&path, "database = \"data/posts.db\"\n").unwrap();

        let config = BlogConfig::load(Some(&path)).unwrap();
        assert_eq!(config.database, "data/posts.db");
        assert!(!config.echo);
        assert_eq!(config.busy_timeout_ms, DEFAULT_BUSY_TIMEOUT_MS);

        let storage = config.storage();
        assert_eq!(storage.path, PathBuf::from("data/posts.db"));
        assert_eq!(storage.busy_timeout, Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blog.toml");
        std::fs::write(&path, "echo = \"loud\"\n").unwrap();

        let err = BlogConfig::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("invalid config"));
    }

    #[test]
    fn test_save_refuses_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blog.toml");
        let loud = BlogConfig { echo: true, ..BlogConfig::default() };

        loud.save(&path, false).unwrap();
        let err = BlogConfig::default().save(&path, false).unwrap_err();
        assert!(err.to_string().contains("--force"));
        assert_eq!(BlogConfig::load(Some(&path)).unwrap(), loud);

        BlogConfig::default().save(&path, true).unwrap();
        assert_eq!(BlogConfig::load(Some(&path)).unwrap(), BlogConfig::default());
    }

    #[test]
    fn test_flags_override_file() {
        let config = BlogConfig { echo: true, ..BlogConfig::default() }.with_overrides(Some(Path::new("x/other.db")), false);
        assert_eq!(config.database, "x/other.db");
        assert!(config.echo);

        let config = BlogConfig::default().with_overrides(None, true);
        assert_eq!(config.database, DEFAULT_DATABASE_PATH);
        assert!(config.echo);
    }
}
