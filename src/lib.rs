#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! dbwrapper - A thin wrapper over an embedded SQLite database
//!
//! dbwrapper gives an application two extension points over SQLite:
//!
//! - an [`OpenHelper`] that names a database and creates or upgrades its
//!   schema, used by [`Database`] to open one writable connection whose
//!   `insert`/`update`/`delete`/`query`/`execute` calls go straight to the
//!   engine;
//! - a [`TableSchema`] that declares a table's `CREATE TABLE` statement and
//!   the statements to run around it.
//!
//! # Architecture
//!
//! - **[`database`]**: The handle, open strategy, table schemas and the
//!   core connection/cursor/value types
//! - **[`context`]**: Where databases live and how connections are configured
//! - **[`config`]**: Configuration file and environment loading
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use dbwrapper::{ContentValues, Context, Database, OpenHelper, QueryArgs, StaticTable, TableSchema};
//! use rusqlite::{types::Value, Connection};
//!
//! const NOTES: StaticTable = StaticTable::new(
//!     "CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT NOT NULL)",
//! )
//! .with_post_create(&["CREATE INDEX idx_notes_body ON notes(body)"]);
//!
//! struct NotesDb;
//!
//! impl OpenHelper for NotesDb {
//!     fn name(&self) -> Option<String> {
//!         Some("notes.sqlite3".to_string())
//!     }
//!     fn version(&self) -> u32 {
//!         1
//!     }
//!     fn on_create(&self, conn: &Connection) -> anyhow::Result<()> {
//!         for sql in NOTES.all_statements() {
//!             conn.execute(&sql, [])?;
//!         }
//!         Ok(())
//!     }
//!     fn on_upgrade(&self, _conn: &Connection, _old: u32, _new: u32) -> anyhow::Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! let context = Context::new("/var/lib/myapp");
//! let mut db = Database::open(&context, &NotesDb)?;
//!
//! let id = db.insert("notes", None, &ContentValues::new().with_str("body", "hello"));
//! let mut cursor = db.query(
//!     &QueryArgs::new("notes").with_selection("id = ?", vec![Value::Integer(id)]),
//! )?;
//! while cursor.move_to_next() {
//!     println!("{:?}", cursor.get_string(1)?);
//! }
//!
//! db.close();
//! ```

pub mod config;
pub mod context;
pub mod database;

// =============================================================================
// Configuration
// =============================================================================

pub use config::DbwrapperConfig;
pub use context::Context;

// =============================================================================
// Database Module - Re-export commonly used types
// =============================================================================

pub use database::{
    open_writable, CloseErrorHandler, ConflictAlgorithm, ConnectionSettings, ContentValues, Cursor,
    Database, DatabaseConn, LogClose, OpenHelper, QueryArgs, SchemaStatus, SilentClose,
    StaticTable, TableSchema, INSERT_FAILED,
};
