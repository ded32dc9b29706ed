//! Execution context for database handles
//!
//! A `Context` says where named databases live on disk and how their
//! connections are configured. It is usually derived from
//! [`DbwrapperConfig`](crate::config::DbwrapperConfig).

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::DbwrapperConfig;
use crate::database::core::ConnectionSettings;

// Side files SQLite may leave next to a database
const DATABASE_SIDE_FILES: &[&str] = &["-journal", "-wal", "-shm"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    data_dir: PathBuf,
    settings: ConnectionSettings,
}

impl Context {
    /// Create a context rooted at `data_dir` with default connection settings
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            settings: ConnectionSettings::default(),
        }
    }

    /// Create a context from a loaded configuration
    pub fn from_config(config: &DbwrapperConfig) -> Result<Self> {
        let settings = config.connection_settings();
        settings.validate()?;
        Ok(Self {
            data_dir: PathBuf::from(&config.data_dir),
            settings,
        })
    }

    pub fn with_settings(mut self, settings: ConnectionSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    /// Resolve a database name to its file path
    ///
    /// Absolute names are used as-is; anything else is placed in the data
    /// directory.
    pub fn database_path(&self, name: &str) -> PathBuf {
        let path = Path::new(name);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }

    /// Ensure the data directory exists
    pub fn ensure_data_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir).map_err(|e| {
            anyhow!(
                "Failed to create data directory '{}': {}",
                self.data_dir.display(),
                e
            )
        })
    }

    /// Delete a named database file and its journal side files
    ///
    /// Returns whether the main database file existed.
    pub fn delete_database(&self, name: &str) -> Result<bool> {
        let path = self.database_path(name);
        let existed = path.exists();

        if existed {
            std::fs::remove_file(&path)
                .map_err(|e| anyhow!("Failed to delete database '{}': {}", path.display(), e))?;
        }
        for suffix in DATABASE_SIDE_FILES {
            let mut side = path.clone().into_os_string();
            side.push(suffix);
            let side = PathBuf::from(side);
            if side.exists() {
                std::fs::remove_file(&side).map_err(|e| {
                    anyhow!("Failed to delete '{}': {}", side.display(), e)
                })?;
            }
        }

        if existed {
            info!("Deleted database {}", path.display());
        }
        Ok(existed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_path() {
        let context = Context::new("/data/app");
        assert_eq!(
            context.database_path("main.sqlite3"),
            PathBuf::from("/data/app/main.sqlite3")
        );
        assert_eq!(
            context.database_path("/tmp/other.db"),
            PathBuf::from("/tmp/other.db")
        );
    }

    #[test]
    fn test_ensure_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let context = Context::new(dir.path().join("a/b"));
        context.ensure_data_dir().unwrap();
        assert!(context.data_dir().is_dir());
    }

    #[test]
    fn test_delete_database() {
        let dir = tempfile::tempdir().unwrap();
        let context = Context::new(dir.path());
        let path = context.database_path("gone.db");
        std::fs::write(&path, b"").unwrap();
        std::fs::write(dir.path().join("gone.db-wal"), b"").unwrap();

        assert!(context.delete_database("gone.db").unwrap());
        assert!(!path.exists());
        assert!(!dir.path().join("gone.db-wal").exists());
        assert!(!context.delete_database("gone.db").unwrap());
    }

    #[test]
    fn test_with_settings() {
        let settings = ConnectionSettings {
            journal_mode: "DELETE".to_string(),
            ..Default::default()
        };
        let context = Context::new(".").with_settings(settings.clone());
        assert_eq!(context.settings(), &settings);
    }
}
