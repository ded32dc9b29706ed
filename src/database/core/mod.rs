//! Core database infrastructure
//!
//! This module provides the foundational components the database handle
//! delegates to:
//! - `DatabaseConn`: Core SQLite connection wrapper with configuration
//! - `ContentValues`: Column/value bags for inserts and updates
//! - `Cursor`: Buffered, read-only query results
//! - `QueryArgs` and the statement builders for the CRUD operations

mod connection;
mod cursor;
mod statement;
mod values;

pub use connection::{set_user_version, user_version, ConnectionSettings, DatabaseConn};
pub use cursor::Cursor;
pub use statement::{delete_sql, insert_sql, update_sql, ConflictAlgorithm, QueryArgs};
pub use values::ContentValues;
