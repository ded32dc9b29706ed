//! Table creation schemas
//!
//! A table declares the one statement that creates it plus any statements
//! that must run right before (dropping an old copy, say) or right after
//! (indexes, triggers). [`TableSchema::all_statements`] yields them in
//! execution order.

/// Creation schema of a single table
pub trait TableSchema {
    /// The `CREATE TABLE` statement
    fn create_statement(&self) -> String;

    /// Statements to run before the create statement
    fn pre_create_statements(&self) -> Vec<String> {
        Vec::new()
    }

    /// Statements to run after the create statement
    fn post_create_statements(&self) -> Vec<String> {
        Vec::new()
    }

    /// Every statement in order: pre-create, create, post-create
    fn all_statements(&self) -> Vec<String> {
        let mut statements = self.pre_create_statements();
        statements.push(self.create_statement());
        statements.extend(self.post_create_statements());
        statements
    }
}

/// A table schema declared entirely from string constants
///
/// ```rust,ignore
/// const NOTES: StaticTable = StaticTable::new(
///     "CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT NOT NULL)",
/// )
/// .with_post_create(&["CREATE INDEX idx_notes_body ON notes(body)"]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticTable {
    create: &'static str,
    pre_create: &'static [&'static str],
    post_create: &'static [&'static str],
}

impl StaticTable {
    pub const fn new(create: &'static str) -> Self {
        Self {
            create,
            pre_create: &[],
            post_create: &[],
        }
    }

    pub const fn with_pre_create(mut self, statements: &'static [&'static str]) -> Self {
        self.pre_create = statements;
        self
    }

    pub const fn with_post_create(mut self, statements: &'static [&'static str]) -> Self {
        self.post_create = statements;
        self
    }
}

impl TableSchema for StaticTable {
    fn create_statement(&self) -> String {
        self.create.to_string()
    }

    fn pre_create_statements(&self) -> Vec<String> {
        self.pre_create.iter().map(|s| s.to_string()).collect()
    }

    fn post_create_statements(&self) -> Vec<String> {
        self.post_create.iter().map(|s| s.to_string()).collect()
    }
}
