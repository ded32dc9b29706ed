//! Open strategy for database handles
//!
//! An [`OpenHelper`] names the database, declares the schema version the
//! application expects, and supplies the callbacks that bring an older (or
//! brand new) file up to that version. The version lives in the SQLite
//! header (`PRAGMA user_version`); 0 means the database was never created.

use anyhow::{anyhow, Context as _, Result};
use rusqlite::Connection;
use tracing::info;

use crate::context::Context;
use crate::database::core::{set_user_version, DatabaseConn};

// user_version is a signed 32-bit header field
const MAX_VERSION: u32 = i32::MAX as u32;

/// How to open and version a database
pub trait OpenHelper {
    /// Database file name, resolved against the context's data directory
    ///
    /// `None` opens a private in-memory database.
    fn name(&self) -> Option<String>;

    /// Schema version the application expects; must be between 1 and
    /// `i32::MAX`, the range SQLite stores in `user_version`
    fn version(&self) -> u32;

    /// Called first on every open, before any version handling
    fn on_configure(&self, _conn: &Connection) -> Result<()> {
        Ok(())
    }

    /// Create the schema of a fresh database
    fn on_create(&self, conn: &Connection) -> Result<()>;

    /// Bring a database at `old_version` up to `new_version`
    fn on_upgrade(&self, conn: &Connection, old_version: u32, new_version: u32) -> Result<()>;

    /// Bring a database from a newer version down to `new_version`
    ///
    /// Downgrades are refused unless overridden.
    fn on_downgrade(&self, _conn: &Connection, old_version: u32, new_version: u32) -> Result<()> {
        Err(anyhow!(
            "Can't downgrade database from version {} to {}",
            old_version,
            new_version
        ))
    }

    /// Called last on every open, after the version is current
    fn on_open(&self, _conn: &Connection) -> Result<()> {
        Ok(())
    }
}

/// Version state of a database relative to what the helper expects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaStatus {
    /// Fresh database, `on_create` has never run
    NotInitialized,

    /// Version matches
    Current,

    /// Database is older than expected
    NeedsUpgrade { from: u32, to: u32 },

    /// Database is newer than expected
    NeedsDowngrade { from: u32, to: u32 },
}

impl SchemaStatus {
    pub fn from_versions(current: u32, expected: u32) -> Self {
        if current == 0 {
            SchemaStatus::NotInitialized
        } else if current == expected {
            SchemaStatus::Current
        } else if current < expected {
            SchemaStatus::NeedsUpgrade {
                from: current,
                to: expected,
            }
        } else {
            SchemaStatus::NeedsDowngrade {
                from: current,
                to: expected,
            }
        }
    }
}

/// Open a writable connection through `helper` and bring it to the
/// helper's version
///
/// Create/upgrade/downgrade and the version bump share one transaction, so
/// a failing callback leaves the file at its previous version.
pub fn open_writable<H: OpenHelper + ?Sized>(helper: &H, context: &Context) -> Result<DatabaseConn> {
    let version = helper.version();
    if version < 1 || version > MAX_VERSION {
        return Err(anyhow!(
            "Database version must be between 1 and {}, was {}",
            MAX_VERSION,
            version
        ));
    }

    let path = helper.name().map(|name| context.database_path(&name));
    let db = DatabaseConn::open(path.as_deref(), context.settings())?;
    let label = path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| ":memory:".to_string());

    helper.on_configure(&db.conn)?;

    let current = db.user_version()?;
    let status = SchemaStatus::from_versions(current, version);
    if status != SchemaStatus::Current {
        let tx = db.transaction()?;
        match status {
            SchemaStatus::NotInitialized => {
                info!("Creating database {} at version {}", label, version);
                helper.on_create(&tx)?;
            }
            SchemaStatus::NeedsUpgrade { from, to } => {
                info!("Upgrading database {} from v{} to v{}", label, from, to);
                helper.on_upgrade(&tx, from, to)?;
            }
            SchemaStatus::NeedsDowngrade { from, to } => {
                info!("Downgrading database {} from v{} to v{}", label, from, to);
                helper.on_downgrade(&tx, from, to)?;
            }
            SchemaStatus::Current => {}
        }
        set_user_version(&tx, version)?;
        tx.commit()
            .with_context(|| format!("Failed to commit schema setup of {}", label))?;
    }

    helper.on_open(&db.conn)?;
    info!("Opened database {} (version {})", label, version);
    Ok(db)
}
