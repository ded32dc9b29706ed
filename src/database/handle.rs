//! Database handle
//!
//! [`Database`] owns one writable connection, opened eagerly through an
//! [`OpenHelper`], and forwards every operation to it unchanged.

use anyhow::{anyhow, Context as _, Result};
use rusqlite::params_from_iter;
use rusqlite::types::Value;
use std::path::Path;
use tracing::{debug, error, info, warn};

use crate::context::Context;
use crate::database::core::{
    delete_sql, insert_sql, update_sql, ConflictAlgorithm, ContentValues, Cursor, DatabaseConn,
    QueryArgs,
};
use crate::database::open_helper::{open_writable, OpenHelper};
use crate::database::table::TableSchema;

/// Row id returned by [`Database::insert`] when the engine rejects the row
pub const INSERT_FAILED: i64 = -1;

/// Receives errors raised while closing a database
///
/// `close` never returns these to its caller; they go here instead.
pub trait CloseErrorHandler {
    fn handle_close_error(&self, err: &rusqlite::Error);
}

/// Discards close errors
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentClose;

impl CloseErrorHandler for SilentClose {
    fn handle_close_error(&self, _err: &rusqlite::Error) {}
}

/// Logs close errors as warnings
#[derive(Debug, Clone, Copy, Default)]
pub struct LogClose;

impl CloseErrorHandler for LogClose {
    fn handle_close_error(&self, err: &rusqlite::Error) {
        warn!("Error closing database: {}", err);
    }
}

impl<F: Fn(&rusqlite::Error)> CloseErrorHandler for F {
    fn handle_close_error(&self, err: &rusqlite::Error) {
        self(err)
    }
}

/// A writable database handle with passthrough CRUD operations
///
/// The connection is opened once, in [`Database::open`], and reused until
/// [`Database::close`]. Nothing here synchronizes access: the handle is
/// `Send` but not `Sync`, so concurrent use has to be serialized by the
/// caller.
pub struct Database {
    db: Option<DatabaseConn>,
    label: String,
    version: u32,
    close_handler: Box<dyn CloseErrorHandler + Send>,
}

impl Database {
    /// Open the database described by `helper` within `context`
    pub fn open<H: OpenHelper + ?Sized>(context: &Context, helper: &H) -> Result<Self> {
        let db = open_writable(helper, context)?;
        let label = db
            .path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| ":memory:".to_string());

        Ok(Self {
            db: Some(db),
            label,
            version: helper.version(),
            close_handler: Box::new(SilentClose),
        })
    }

    /// Replace the close error handler (the default discards errors)
    pub fn with_close_handler<C>(mut self, handler: C) -> Self
    where
        C: CloseErrorHandler + Send + 'static,
    {
        self.close_handler = Box::new(handler);
        self
    }

    fn conn(&self) -> Result<&DatabaseConn> {
        self.db
            .as_ref()
            .ok_or_else(|| anyhow!("Database {} is closed", self.label))
    }

    pub fn is_open(&self) -> bool {
        self.db.is_some()
    }

    /// Path of the database file, `None` for in-memory or closed databases
    pub fn path(&self) -> Option<&Path> {
        self.db.as_ref().and_then(|db| db.path())
    }

    /// Schema version the database was opened at
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Get the underlying connection (for anything not covered here)
    pub fn connection(&self) -> Result<&rusqlite::Connection> {
        Ok(&self.conn()?.conn)
    }

    /// Run one raw SQL statement that returns no rows
    pub fn execute(&self, sql: &str) -> Result<()> {
        debug!("execute: {}", sql);
        self.conn()?.execute(sql)?;
        Ok(())
    }

    /// Run one raw SQL statement with bound arguments
    pub fn execute_with_args(&self, sql: &str, args: &[Value]) -> Result<()> {
        debug!("execute: {} ({} args)", sql, args.len());
        self.conn()?
            .execute_with_params(sql, params_from_iter(args.iter()))?;
        Ok(())
    }

    /// Run every statement of `schema` in order
    pub fn create_table(&self, schema: &dyn TableSchema) -> Result<()> {
        for statement in schema.all_statements() {
            self.execute(&statement)?;
        }
        Ok(())
    }

    /// Delete the rows matching `where_clause`; `None` deletes every row
    ///
    /// Returns the number of rows deleted.
    pub fn delete(&self, table: &str, where_clause: Option<&str>, where_args: &[Value]) -> Result<usize> {
        let sql = delete_sql(table, where_clause);
        debug!("delete: {}", sql);
        self.conn()?
            .execute_with_params(&sql, params_from_iter(where_args.iter()))
    }

    /// Insert one row, returning its row id or [`INSERT_FAILED`]
    ///
    /// Engine errors are logged, not returned; use
    /// [`Database::insert_or_throw`] to get them. With empty `values`, the
    /// row is inserted with `NULL` in `null_column_hack`.
    pub fn insert(&self, table: &str, null_column_hack: Option<&str>, values: &ContentValues) -> i64 {
        match self.insert_with_on_conflict(table, null_column_hack, values, ConflictAlgorithm::None) {
            Ok(id) => id,
            Err(e) => {
                error!("Error inserting into {}: {:#}", table, e);
                INSERT_FAILED
            }
        }
    }

    /// Insert one row, propagating engine errors
    pub fn insert_or_throw(&self, table: &str, null_column_hack: Option<&str>, values: &ContentValues) -> Result<i64> {
        self.insert_with_on_conflict(table, null_column_hack, values, ConflictAlgorithm::None)
    }

    /// Insert or replace one row, returning its row id or [`INSERT_FAILED`]
    pub fn replace(&self, table: &str, null_column_hack: Option<&str>, values: &ContentValues) -> i64 {
        match self.insert_with_on_conflict(table, null_column_hack, values, ConflictAlgorithm::Replace) {
            Ok(id) => id,
            Err(e) => {
                error!("Error replacing into {}: {:#}", table, e);
                INSERT_FAILED
            }
        }
    }

    /// Insert one row with an explicit conflict clause
    ///
    /// A row skipped by `OR IGNORE` yields [`INSERT_FAILED`].
    pub fn insert_with_on_conflict(
        &self,
        table: &str,
        null_column_hack: Option<&str>,
        values: &ContentValues,
        conflict: ConflictAlgorithm,
    ) -> Result<i64> {
        let db = self.conn()?;
        let sql = insert_sql(table, null_column_hack, values, conflict)?;
        debug!("insert: {}", sql);

        let changed = db.execute_with_params(&sql, params_from_iter(values.values()))?;
        if changed == 0 {
            return Ok(INSERT_FAILED);
        }
        Ok(db.conn.last_insert_rowid())
    }

    /// Update the given columns of the rows matching `where_clause`
    ///
    /// Returns the number of rows changed.
    pub fn update(
        &self,
        table: &str,
        values: &ContentValues,
        where_clause: Option<&str>,
        where_args: &[Value],
    ) -> Result<usize> {
        self.update_with_on_conflict(table, values, where_clause, where_args, ConflictAlgorithm::None)
    }

    /// Update matching rows with an explicit conflict clause
    pub fn update_with_on_conflict(
        &self,
        table: &str,
        values: &ContentValues,
        where_clause: Option<&str>,
        where_args: &[Value],
        conflict: ConflictAlgorithm,
    ) -> Result<usize> {
        let db = self.conn()?;
        let sql = update_sql(table, values, where_clause, conflict)?;
        debug!("update: {}", sql);

        let args = values.values().chain(where_args.iter());
        db.execute_with_params(&sql, params_from_iter(args))
    }

    /// Select rows as described by `args`
    pub fn query(&self, args: &QueryArgs) -> Result<Cursor> {
        let sql = args.to_sql()?;
        self.raw_query(&sql, &args.selection_args)
    }

    /// Run a raw `SELECT` with bound arguments
    pub fn raw_query(&self, sql: &str, args: &[Value]) -> Result<Cursor> {
        let db = self.conn()?;
        debug!("query: {}", sql);

        let mut stmt = db
            .conn
            .prepare(sql)
            .with_context(|| format!("Failed to prepare query: {}", sql))?;
        Cursor::from_statement(&mut stmt, params_from_iter(args.iter()))
            .with_context(|| format!("Failed to run query: {}", sql))
    }

    /// Begin an unchecked transaction on the open connection
    pub fn transaction(&self) -> Result<rusqlite::Transaction<'_>> {
        self.conn()?.transaction()
    }

    /// Release the connection
    ///
    /// Errors are handed to the close error handler and never returned.
    /// Closing an already closed handle does nothing.
    pub fn close(&mut self) {
        let Some(db) = self.db.take() else {
            return;
        };

        match db.close() {
            Ok(()) => info!("Closed database {}", self.label),
            Err(e) => self.close_handler.handle_close_error(&e),
        }
    }
}
