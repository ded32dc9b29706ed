//! Read-only result cursor
//!
//! Query results are buffered when the statement runs, so a `Cursor` holds
//! no borrow of the connection and stays valid after the database closes.

use anyhow::{anyhow, Result};
use rusqlite::types::Value;
use rusqlite::{Params, Statement};

/// A forward/backward navigable, read-only view over buffered result rows
///
/// Like a platform cursor, the position starts before the first row; call
/// [`Cursor::move_to_next`] or [`Cursor::move_to_first`] before reading.
#[derive(Debug, Clone, PartialEq)]
pub struct Cursor {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    position: isize,
}

impl Cursor {
    /// Run a prepared statement and buffer every result row
    pub fn from_statement<P: Params>(stmt: &mut Statement<'_>, params: P) -> Result<Self> {
        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect();
        let column_count = columns.len();

        let mut rows = Vec::new();
        let mut result = stmt.query(params)?;
        while let Some(row) = result.next()? {
            let mut values = Vec::with_capacity(column_count);
            for i in 0..column_count {
                values.push(row.get::<_, Value>(i)?);
            }
            rows.push(values);
        }

        Ok(Self {
            columns,
            rows,
            position: -1,
        })
    }

    /// Number of rows in the result
    pub fn count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.eq_ignore_ascii_case(name))
    }

    pub fn column_index_or_err(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| anyhow!("Column '{}' does not exist in result", name))
    }

    /// Current position; -1 before the first row, `count()` after the last
    pub fn position(&self) -> isize {
        self.position
    }

    /// Move to an absolute position, clamped to the before-first and
    /// after-last sentinels. Returns whether the cursor now points at a row.
    pub fn move_to_position(&mut self, position: isize) -> bool {
        let count = self.rows.len() as isize;
        self.position = position.clamp(-1, count);
        self.position >= 0 && self.position < count
    }

    pub fn move_to_first(&mut self) -> bool {
        self.move_to_position(0)
    }

    pub fn move_to_last(&mut self) -> bool {
        self.move_to_position(self.rows.len() as isize - 1)
    }

    pub fn move_to_next(&mut self) -> bool {
        self.move_to_position(self.position + 1)
    }

    pub fn move_to_previous(&mut self) -> bool {
        self.move_to_position(self.position - 1)
    }

    pub fn is_before_first(&self) -> bool {
        self.rows.is_empty() || self.position < 0
    }

    pub fn is_after_last(&self) -> bool {
        self.rows.is_empty() || self.position >= self.rows.len() as isize
    }

    fn current_row(&self) -> Result<&[Value]> {
        usize::try_from(self.position)
            .ok()
            .and_then(|p| self.rows.get(p))
            .map(|row| row.as_slice())
            .ok_or_else(|| {
                anyhow!(
                    "Cursor position {} is out of range for {} rows",
                    self.position,
                    self.rows.len()
                )
            })
    }

    /// Raw value of a column in the current row
    pub fn get_value(&self, column: usize) -> Result<&Value> {
        self.current_row()?.get(column).ok_or_else(|| {
            anyhow!(
                "Column index {} out of range for {} columns",
                column,
                self.columns.len()
            )
        })
    }

    pub fn is_null(&self, column: usize) -> Result<bool> {
        Ok(matches!(self.get_value(column)?, Value::Null))
    }

    /// Column value as an integer; `NULL` reads as 0
    pub fn get_i64(&self, column: usize) -> Result<i64> {
        match self.get_value(column)? {
            Value::Null => Ok(0),
            Value::Integer(i) => Ok(*i),
            Value::Real(f) => Ok(*f as i64),
            Value::Text(s) => s
                .trim()
                .parse()
                .map_err(|e| anyhow!("Cannot read '{}' as an integer: {}", s, e)),
            Value::Blob(_) => Err(anyhow!("Cannot read a BLOB as an integer")),
        }
    }

    /// Column value as a float; `NULL` reads as 0.0
    pub fn get_f64(&self, column: usize) -> Result<f64> {
        match self.get_value(column)? {
            Value::Null => Ok(0.0),
            Value::Integer(i) => Ok(*i as f64),
            Value::Real(f) => Ok(*f),
            Value::Text(s) => s
                .trim()
                .parse()
                .map_err(|e| anyhow!("Cannot read '{}' as a float: {}", s, e)),
            Value::Blob(_) => Err(anyhow!("Cannot read a BLOB as a float")),
        }
    }

    /// Column value as text; `NULL` reads as `None`
    pub fn get_string(&self, column: usize) -> Result<Option<String>> {
        match self.get_value(column)? {
            Value::Null => Ok(None),
            Value::Integer(i) => Ok(Some(i.to_string())),
            Value::Real(f) => Ok(Some(f.to_string())),
            Value::Text(s) => Ok(Some(s.clone())),
            Value::Blob(b) => Ok(Some(String::from_utf8_lossy(b).into_owned())),
        }
    }

    pub fn get_blob(&self, column: usize) -> Result<Option<Vec<u8>>> {
        match self.get_value(column)? {
            Value::Null => Ok(None),
            Value::Blob(b) => Ok(Some(b.clone())),
            Value::Text(s) => Ok(Some(s.as_bytes().to_vec())),
            other => Err(anyhow!("Cannot read {:?} as a BLOB", other)),
        }
    }

    /// All buffered rows, independent of the cursor position
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<Value>> {
        self.rows
    }

    /// Render every row as a JSON object keyed by column name
    ///
    /// BLOBs become arrays of byte values.
    pub fn to_json(&self) -> Vec<serde_json::Value> {
        self.rows
            .iter()
            .map(|row| {
                let mut obj = serde_json::Map::new();
                for (name, value) in self.columns.iter().zip(row) {
                    obj.insert(name.clone(), value_to_json(value));
                }
                serde_json::Value::Object(obj)
            })
            .collect()
    }
}

fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Integer(i) => serde_json::Value::from(*i),
        Value::Real(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Text(s) => serde_json::Value::String(s.clone()),
        Value::Blob(b) => serde_json::Value::from(b.clone()),
    }
}
