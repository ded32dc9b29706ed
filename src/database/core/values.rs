//! Column value bags for insert and update operations

use rusqlite::types::Value;

/// An insertion-ordered set of column/value pairs
///
/// `ContentValues` is what `insert` and `update` bind into their generated
/// statements. Column order is preserved so the generated SQL is
/// deterministic; putting an existing column replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentValues {
    values: Vec<(String, Value)>,
}

impl ContentValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column value, replacing any previous value for the same column
    pub fn put(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        let value = value.into();
        match self.values.iter_mut().find(|(name, _)| name == column) {
            Some(entry) => entry.1 = value,
            None => self.values.push((column.to_string(), value)),
        }
        self
    }

    /// Set a text column value
    pub fn put_str(&mut self, column: &str, value: &str) -> &mut Self {
        self.put(column, Value::Text(value.to_string()))
    }

    /// Set a column to SQL `NULL`
    pub fn put_null(&mut self, column: &str) -> &mut Self {
        self.put(column, Value::Null)
    }

    /// Builder-style variant of [`ContentValues::put`]
    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.put(column, value);
        self
    }

    /// Builder-style variant of [`ContentValues::put_str`]
    pub fn with_str(mut self, column: &str, value: &str) -> Self {
        self.put_str(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn contains_key(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        let index = self.values.iter().position(|(name, _)| name == column)?;
        Some(self.values.remove(index).1)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Column names in insertion order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(name, _)| name.as_str())
    }

    /// Values in insertion order (the bind order of generated statements)
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.values.iter().map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }
}

impl<S: Into<String>> FromIterator<(S, Value)> for ContentValues {
    fn from_iter<T: IntoIterator<Item = (S, Value)>>(iter: T) -> Self {
        let mut content = ContentValues::new();
        for (column, value) in iter {
            let column: String = column.into();
            content.put(&column, value);
        }
        content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_keeps_insertion_order() {
        let values = ContentValues::new()
            .with_str("name", "alice")
            .with("age", 30i64)
            .with("score", 1.5f64);

        let columns: Vec<&str> = values.columns().collect();
        assert_eq!(columns, vec!["name", "age", "score"]);
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn test_put_replaces_in_place() {
        let mut values = ContentValues::new();
        values.put("a", 1i64).put("b", 2i64).put("a", 3i64);

        let columns: Vec<&str> = values.columns().collect();
        assert_eq!(columns, vec!["a", "b"]);
        assert_eq!(values.get("a"), Some(&Value::Integer(3)));
    }

    #[test]
    fn test_remove_and_null() {
        let mut values = ContentValues::new();
        values.put_null("note").put_str("title", "x");

        assert_eq!(values.get("note"), Some(&Value::Null));
        assert_eq!(values.remove("note"), Some(Value::Null));
        assert!(!values.contains_key("note"));
        assert_eq!(values.remove("missing"), None);

        values.clear();
        assert!(values.is_empty());
    }

    #[test]
    fn test_from_iterator() {
        let values: ContentValues = vec![
            ("x", Value::Integer(1)),
            ("y", Value::Text("two".to_string())),
        ]
        .into_iter()
        .collect();

        assert_eq!(values.len(), 2);
        assert_eq!(values.get("y"), Some(&Value::Text("two".to_string())));
    }
}
