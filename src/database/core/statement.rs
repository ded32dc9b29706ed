//! SQL statement construction for the delegated CRUD operations
//!
//! These builders only assemble statement text with `?` placeholders; values
//! are always bound by the engine, never interpolated.

use anyhow::{anyhow, Result};
use rusqlite::types::Value;

use super::values::ContentValues;

/// Conflict resolution clause for inserts and updates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConflictAlgorithm {
    /// Plain statement, the engine's default (`ABORT`) applies
    #[default]
    None,
    Rollback,
    Abort,
    Fail,
    Ignore,
    Replace,
}

impl ConflictAlgorithm {
    fn clause(&self) -> &'static str {
        match self {
            ConflictAlgorithm::None => "",
            ConflictAlgorithm::Rollback => " OR ROLLBACK",
            ConflictAlgorithm::Abort => " OR ABORT",
            ConflictAlgorithm::Fail => " OR FAIL",
            ConflictAlgorithm::Ignore => " OR IGNORE",
            ConflictAlgorithm::Replace => " OR REPLACE",
        }
    }
}

/// Parameters of a `SELECT` over a single table
///
/// Everything except the table name is optional: `distinct` defaults to
/// false, no column list selects `*`, and no limit returns every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryArgs {
    pub table: String,
    pub distinct: bool,
    pub columns: Vec<String>,
    pub selection: Option<String>,
    pub selection_args: Vec<Value>,
    pub group_by: Option<String>,
    pub having: Option<String>,
    pub order_by: Option<String>,
    pub limit: Option<String>,
}

impl QueryArgs {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            ..Default::default()
        }
    }

    /// A `SELECT DISTINCT` over `table`
    pub fn distinct(table: &str) -> Self {
        Self {
            distinct: true,
            ..Self::new(table)
        }
    }

    pub fn with_distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    pub fn with_columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Set the `WHERE` clause and the values bound to its `?` placeholders
    pub fn with_selection(mut self, selection: &str, args: Vec<Value>) -> Self {
        self.selection = Some(selection.to_string());
        self.selection_args = args;
        self
    }

    pub fn with_group_by(mut self, group_by: &str) -> Self {
        self.group_by = Some(group_by.to_string());
        self
    }

    pub fn with_having(mut self, having: &str) -> Self {
        self.having = Some(having.to_string());
        self
    }

    pub fn with_order_by(mut self, order_by: &str) -> Self {
        self.order_by = Some(order_by.to_string());
        self
    }

    /// Set the limit, either `"n"` or `"offset, n"`
    pub fn with_limit(mut self, limit: impl ToString) -> Self {
        self.limit = Some(limit.to_string());
        self
    }

    /// Build the `SELECT` statement text
    pub fn to_sql(&self) -> Result<String> {
        let group_by = non_empty(&self.group_by);
        let having = non_empty(&self.having);

        if group_by.is_none() && having.is_some() {
            return Err(anyhow!(
                "HAVING clauses are only permitted when using a GROUP BY clause"
            ));
        }
        if let Some(limit) = non_empty(&self.limit) {
            if !is_valid_limit(limit) {
                return Err(anyhow!("Invalid LIMIT clause: {}", limit));
            }
        }

        let mut sql = String::from("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }
        if self.columns.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.columns.join(", "));
        }
        sql.push_str(" FROM ");
        sql.push_str(&self.table);

        append_clause(&mut sql, " WHERE ", non_empty(&self.selection));
        append_clause(&mut sql, " GROUP BY ", group_by);
        append_clause(&mut sql, " HAVING ", having);
        append_clause(&mut sql, " ORDER BY ", non_empty(&self.order_by));
        append_clause(&mut sql, " LIMIT ", non_empty(&self.limit));

        Ok(sql)
    }
}

/// Build an `INSERT` statement for `values`
///
/// An empty value set needs `null_column_hack`: the row is then inserted
/// with `NULL` in that column, since SQL has no empty `INSERT`.
pub fn insert_sql(
    table: &str,
    null_column_hack: Option<&str>,
    values: &ContentValues,
    conflict: ConflictAlgorithm,
) -> Result<String> {
    let mut sql = format!("INSERT{} INTO {} (", conflict.clause(), table);

    if values.is_empty() {
        let hack = null_column_hack
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow!("Cannot insert an empty row into '{}' without a null column hack", table))?;
        sql.push_str(hack);
        sql.push_str(") VALUES (NULL)");
        return Ok(sql);
    }

    sql.push_str(&values.columns().collect::<Vec<_>>().join(", "));
    sql.push_str(") VALUES (");
    sql.push_str(&vec!["?"; values.len()].join(", "));
    sql.push(')');
    Ok(sql)
}

/// Build an `UPDATE` statement; the `SET` placeholders come before any in
/// `where_clause`
pub fn update_sql(
    table: &str,
    values: &ContentValues,
    where_clause: Option<&str>,
    conflict: ConflictAlgorithm,
) -> Result<String> {
    if values.is_empty() {
        return Err(anyhow!("Empty values for update of '{}'", table));
    }

    let assignments: Vec<String> = values.columns().map(|c| format!("{} = ?", c)).collect();
    let mut sql = format!(
        "UPDATE{} {} SET {}",
        conflict.clause(),
        table,
        assignments.join(", ")
    );
    append_clause(&mut sql, " WHERE ", where_clause.filter(|w| !w.is_empty()));
    Ok(sql)
}

/// Build a `DELETE` statement; no where clause deletes every row
pub fn delete_sql(table: &str, where_clause: Option<&str>) -> String {
    let mut sql = format!("DELETE FROM {}", table);
    append_clause(&mut sql, " WHERE ", where_clause.filter(|w| !w.is_empty()));
    sql
}

fn append_clause(sql: &mut String, keyword: &str, clause: Option<&str>) {
    if let Some(clause) = clause {
        sql.push_str(keyword);
        sql.push_str(clause);
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

// Accepts "n" or "offset, n" with optional whitespace.
fn is_valid_limit(limit: &str) -> bool {
    let is_number = |s: &str| {
        let s = s.trim();
        !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
    };
    match limit.split_once(',') {
        Some((offset, count)) => is_number(offset) && is_number(count),
        None => is_number(limit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_defaults() {
        let sql = QueryArgs::new("users").to_sql().unwrap();
        assert_eq!(sql, "SELECT * FROM users");
    }

    #[test]
    fn test_query_all_clauses() {
        let sql = QueryArgs::new("users")
            .with_distinct(true)
            .with_columns(&["country", "COUNT(*)"])
            .with_selection("age > ?", vec![Value::Integer(18)])
            .with_group_by("country")
            .with_having("COUNT(*) > 1")
            .with_order_by("country ASC")
            .with_limit("5, 10")
            .to_sql()
            .unwrap();

        assert_eq!(
            sql,
            "SELECT DISTINCT country, COUNT(*) FROM users WHERE age > ? \
             GROUP BY country HAVING COUNT(*) > 1 ORDER BY country ASC LIMIT 5, 10"
        );
    }

    #[test]
    fn test_query_distinct_constructor() {
        let args = QueryArgs::distinct("users").with_columns(&["country"]);
        assert!(args.distinct);
        assert_eq!(args.to_sql().unwrap(), "SELECT DISTINCT country FROM users");
        assert!(!QueryArgs::new("users").distinct);
    }

    #[test]
    fn test_query_having_requires_group_by() {
        let result = QueryArgs::new("users").with_having("COUNT(*) > 1").to_sql();
        assert!(result.is_err());
    }

    #[test]
    fn test_query_rejects_bad_limit() {
        assert!(QueryArgs::new("t").with_limit("10; DROP TABLE t").to_sql().is_err());
        assert!(QueryArgs::new("t").with_limit("").to_sql().is_ok());
        assert!(QueryArgs::new("t").with_limit(3).to_sql().is_ok());
    }

    #[test]
    fn test_insert_sql() {
        let values = ContentValues::new().with_str("name", "a").with("age", 1i64);
        let sql = insert_sql("users", None, &values, ConflictAlgorithm::None).unwrap();
        assert_eq!(sql, "INSERT INTO users (name, age) VALUES (?, ?)");

        let sql = insert_sql("users", None, &values, ConflictAlgorithm::Replace).unwrap();
        assert_eq!(sql, "INSERT OR REPLACE INTO users (name, age) VALUES (?, ?)");
    }

    #[test]
    fn test_insert_sql_empty_values() {
        let empty = ContentValues::new();
        let sql = insert_sql("users", Some("name"), &empty, ConflictAlgorithm::None).unwrap();
        assert_eq!(sql, "INSERT INTO users (name) VALUES (NULL)");

        assert!(insert_sql("users", None, &empty, ConflictAlgorithm::None).is_err());
    }

    #[test]
    fn test_update_sql() {
        let values = ContentValues::new().with("age", 2i64).with_str("name", "b");
        let sql = update_sql("users", &values, Some("id = ?"), ConflictAlgorithm::None).unwrap();
        assert_eq!(sql, "UPDATE users SET age = ?, name = ? WHERE id = ?");

        let sql = update_sql("users", &values, None, ConflictAlgorithm::Ignore).unwrap();
        assert_eq!(sql, "UPDATE OR IGNORE users SET age = ?, name = ?");

        assert!(update_sql("users", &ContentValues::new(), None, ConflictAlgorithm::None).is_err());
    }

    #[test]
    fn test_delete_sql() {
        assert_eq!(delete_sql("users", None), "DELETE FROM users");
        assert_eq!(delete_sql("users", Some("")), "DELETE FROM users");
        assert_eq!(
            delete_sql("users", Some("id = ?")),
            "DELETE FROM users WHERE id = ?"
        );
    }
}
