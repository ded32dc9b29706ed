//! Database module
//!
//! This module provides the database wrapper, organized into:
//!
//! - **core**: Connection wrapper, value bags, cursors and statement builders
//! - **open_helper**: How a database is named, created and versioned
//! - **handle**: The `Database` handle forwarding CRUD calls to the engine
//! - **table**: Table creation schemas as ordered statement lists
//!
//! # Architecture
//!
//! ```text
//! database/
//! ├── core/           # Foundation
//! │   ├── connection  # SQLite DatabaseConn wrapper and pragmas
//! │   ├── values      # ContentValues for insert/update
//! │   ├── cursor      # Buffered read-only results
//! │   └── statement   # QueryArgs and INSERT/UPDATE/DELETE builders
//! │
//! ├── open_helper     # OpenHelper trait, version lifecycle
//! ├── handle          # Database handle, close error handling
//! └── table           # TableSchema trait
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use dbwrapper::database::{ContentValues, Database, QueryArgs};
//!
//! let mut db = Database::open(&context, &MyHelper)?;
//! db.create_table(&NotesTable)?;
//!
//! let id = db.insert("notes", None, &ContentValues::new().with_str("body", "hi"));
//! let cursor = db.query(&QueryArgs::new("notes").with_order_by("id"))?;
//!
//! db.close();
//! ```

pub mod core;
pub mod handle;
pub mod open_helper;
pub mod table;

pub use core::{ConflictAlgorithm, ConnectionSettings, ContentValues, Cursor, DatabaseConn, QueryArgs};
pub use handle::{CloseErrorHandler, Database, LogClose, SilentClose, INSERT_FAILED};
pub use open_helper::{open_writable, OpenHelper, SchemaStatus};
pub use table::{StaticTable, TableSchema};
