//! Database connection management
//!
//! This module provides the connection wrapper every database handle owns.

use anyhow::{anyhow, Context, Result};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;

const JOURNAL_MODES: &[&str] = &["DELETE", "TRUNCATE", "PERSIST", "MEMORY", "WAL", "OFF"];
const SYNCHRONOUS_MODES: &[&str] = &["OFF", "NORMAL", "FULL", "EXTRA"];

/// Pragmas applied to every connection when it is opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub journal_mode: String,
    pub synchronous: String,
    pub foreign_keys: bool,
    pub busy_timeout_ms: u64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            journal_mode: "WAL".to_string(),
            synchronous: "NORMAL".to_string(),
            foreign_keys: true,
            busy_timeout_ms: 5000,
        }
    }
}

impl ConnectionSettings {
    /// Check that the pragma values are ones SQLite accepts
    ///
    /// The values are spliced into `PRAGMA` statements, so anything outside
    /// the known keywords is rejected.
    pub fn validate(&self) -> Result<()> {
        if !JOURNAL_MODES.contains(&self.journal_mode.to_uppercase().as_str()) {
            return Err(anyhow!(
                "Invalid journal_mode '{}', expected one of {:?}",
                self.journal_mode,
                JOURNAL_MODES
            ));
        }
        if !SYNCHRONOUS_MODES.contains(&self.synchronous.to_uppercase().as_str()) {
            return Err(anyhow!(
                "Invalid synchronous mode '{}', expected one of {:?}",
                self.synchronous,
                SYNCHRONOUS_MODES
            ));
        }
        Ok(())
    }
}

/// Core database connection wrapper
///
/// `DatabaseConn` provides a thin wrapper around SQLite connections,
/// handling both file-based and in-memory databases with consistent
/// configuration and error handling.
pub struct DatabaseConn {
    pub conn: Connection,
    path: Option<PathBuf>,
}

impl DatabaseConn {
    /// Open a database at the specified path
    ///
    /// If the path is `None`, an in-memory database is created. Missing
    /// parent directories of a file path are created.
    pub fn open(path: Option<&Path>, settings: &ConnectionSettings) -> Result<Self> {
        settings.validate()?;

        let conn = match path {
            Some(p) => {
                if let Some(parent) = p.parent().filter(|d| !d.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create database directory '{}'", parent.display())
                    })?;
                }
                Connection::open(p)
                    .with_context(|| format!("Failed to open database at '{}'", p.display()))?
            }
            None => Connection::open_in_memory().context("Failed to create in-memory database")?,
        };

        let db = DatabaseConn {
            conn,
            path: path.map(Path::to_path_buf),
        };
        db.configure(settings)?;
        Ok(db)
    }

    /// Create an in-memory database with default settings
    pub fn open_in_memory() -> Result<Self> {
        Self::open(None, &ConnectionSettings::default())
    }

    /// Path of the database file, `None` for in-memory databases
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Configure the database with the given settings
    fn configure(&self, settings: &ConnectionSettings) -> Result<()> {
        // journal_mode reports the resulting mode as a row
        let _: String = self
            .conn
            .query_row(
                &format!("PRAGMA journal_mode={}", settings.journal_mode),
                [],
                |row| row.get(0),
            )
            .context("Failed to set journal mode")?;

        self.conn
            .execute(&format!("PRAGMA synchronous={}", settings.synchronous), [])
            .context("Failed to set synchronous mode")?;

        let foreign_keys = if settings.foreign_keys { "ON" } else { "OFF" };
        self.conn
            .execute(&format!("PRAGMA foreign_keys={}", foreign_keys), [])
            .context("Failed to set foreign keys")?;

        self.conn
            .busy_timeout(Duration::from_millis(settings.busy_timeout_ms))
            .context("Failed to set busy timeout")?;

        Ok(())
    }

    /// Execute a SQL statement
    pub fn execute(&self, sql: &str) -> Result<usize> {
        self.conn
            .execute(sql, [])
            .with_context(|| format!("Failed to execute SQL: {}", sql))
    }

    /// Execute a SQL statement with parameters
    pub fn execute_with_params<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<usize> {
        self.conn
            .execute(sql, params)
            .with_context(|| format!("Failed to execute SQL with params: {}", sql))
    }

    /// Begin an unchecked transaction
    ///
    /// This is useful for batch operations where we want to commit
    /// multiple statements atomically.
    pub fn transaction(&self) -> Result<rusqlite::Transaction<'_>> {
        self.conn
            .unchecked_transaction()
            .context("Failed to begin transaction")
    }

    /// Check if a table exists in the database
    ///
    /// Lets `OpenHelper` callbacks make create/upgrade steps conditional.
    pub fn table_exists(&self, table_name: &str) -> Result<bool> {
        let count: i32 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                [table_name],
                |row| row.get(0),
            )
            .context("Failed to check table existence")?;
        Ok(count > 0)
    }

    /// Get the row count for a table
    ///
    /// Cheap size check for callers that hold the connection directly.
    pub fn table_count(&self, table_name: &str) -> Result<u64> {
        let query = format!("SELECT COUNT(*) FROM {}", table_name);
        let count: u64 = self
            .conn
            .query_row(&query, [], |row| row.get(0))
            .context("Failed to get table count")?;
        Ok(count)
    }

    /// Schema version stored in the database header (`PRAGMA user_version`)
    pub fn user_version(&self) -> Result<u32> {
        user_version(&self.conn)
    }

    /// Close the connection, handing back the engine error on failure
    pub fn close(self) -> std::result::Result<(), rusqlite::Error> {
        self.conn.close().map_err(|(_conn, e)| e)
    }
}

/// Read `PRAGMA user_version` on any connection (including a transaction)
pub fn user_version(conn: &Connection) -> Result<u32> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
        .context("Failed to read user_version")
}

/// Write `PRAGMA user_version`
pub fn set_user_version(conn: &Connection, version: u32) -> Result<()> {
    conn.execute(&format!("PRAGMA user_version = {}", version), [])
        .context("Failed to set user_version")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = DatabaseConn::open_in_memory();
        assert!(db.is_ok());
        assert!(db.unwrap().path().is_none());
    }

    #[test]
    fn test_open_file_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/dir/test.sqlite3");
        let db = DatabaseConn::open(Some(path.as_path()), &ConnectionSettings::default()).unwrap();

        assert_eq!(db.path(), Some(path.as_path()));
        assert!(path.exists());
        db.close().unwrap();
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let settings = ConnectionSettings {
            journal_mode: "WAL; DROP TABLE x".to_string(),
            ..Default::default()
        };
        assert!(DatabaseConn::open(None, &settings).is_err());

        let settings = ConnectionSettings {
            synchronous: "sometimes".to_string(),
            ..Default::default()
        };
        assert!(settings.validate().is_err());

        let settings = ConnectionSettings {
            journal_mode: "delete".to_string(),
            ..Default::default()
        };
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_execute() {
        let db = DatabaseConn::open_in_memory().unwrap();
        let result = db.execute("CREATE TABLE test (id INTEGER PRIMARY KEY)");
        assert!(result.is_ok());

        let err = db.execute("CREATE TABLE test (id INTEGER PRIMARY KEY)").unwrap_err();
        assert!(err.downcast_ref::<rusqlite::Error>().is_some());
    }

    #[test]
    fn test_table_exists() {
        let db = DatabaseConn::open_in_memory().unwrap();
        db.execute("CREATE TABLE test_table (id INTEGER PRIMARY KEY)")
            .unwrap();

        assert!(db.table_exists("test_table").unwrap());
        assert!(!db.table_exists("nonexistent_table").unwrap());
    }

    #[test]
    fn test_table_count() {
        let db = DatabaseConn::open_in_memory().unwrap();
        db.execute("CREATE TABLE test_table (id INTEGER PRIMARY KEY)")
            .unwrap();
        db.execute("INSERT INTO test_table (id) VALUES (1), (2), (3)")
            .unwrap();

        assert_eq!(db.table_count("test_table").unwrap(), 3);
    }

    #[test]
    fn test_user_version() {
        let db = DatabaseConn::open_in_memory().unwrap();
        assert_eq!(db.user_version().unwrap(), 0);

        set_user_version(&db.conn, 7).unwrap();
        assert_eq!(db.user_version().unwrap(), 7);
    }
}
