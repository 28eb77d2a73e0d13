//! Column registry
//!
//! Provides [`Schema`], the ordered set of column descriptors that defines
//! the shape of every row. Operations that change the column set are total
//! over the row collection passed in, so rows never diverge from the
//! registry.

use crate::error::SchemaError;
use crate::types::{ColumnDescriptor, Record};
use indexmap::IndexMap;
use serde_json::Value;

/// Ordered registry of columns keyed by field name
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: IndexMap<String, ColumnDescriptor>,
}

impl Schema {
    /// Create new empty schema
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            columns: IndexMap::new(),
        }
    }

    /// Derive columns from one sample record's key order
    #[must_use]
    pub fn from_first_record(record: &Record) -> Self {
        let columns = record
            .keys()
            .map(|key| (key.clone(), ColumnDescriptor::new(key.as_str())))
            .collect();
        Self { columns }
    }

    /// Append a column and set it to an empty string on every row
    ///
    /// The key is trimmed before registration. Rows that already carry a
    /// field under the key are reset to `""` as well.
    ///
    /// # Errors
    /// - `SchemaError::EmptyColumnKey` if the trimmed key is empty
    /// - `SchemaError::DuplicateColumn` if the key is already registered
    pub fn add_column(
        &mut self,
        key: &str,
        rows: &mut [Record],
    ) -> Result<&ColumnDescriptor, SchemaError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(SchemaError::EmptyColumnKey);
        }
        if self.columns.contains_key(key) {
            return Err(SchemaError::DuplicateColumn(key.to_string()));
        }

        for row in rows.iter_mut() {
            row.insert(key.to_string(), Value::String(String::new()));
        }
        let (index, _) = self
            .columns
            .insert_full(key.to_string(), ColumnDescriptor::new(key));
        tracing::debug!("Added column {} at position {}", key, index);
        Ok(&self.columns[index])
    }

    /// Add the column only if absent
    ///
    /// The key is registered exactly as given. Rows already holding a value
    /// under it keep that value; the rest get `""`. Returns `true` when the
    /// column was created.
    pub fn ensure_column(&mut self, key: &str, label: &str, rows: &mut [Record]) -> bool {
        if self.columns.contains_key(key) {
            return false;
        }
        fill_missing(key, rows);
        self.columns.insert(
            key.to_string(),
            ColumnDescriptor::new(key).with_label(label),
        );
        true
    }

    /// Copy every row's `source` value into `target`
    ///
    /// Rows lacking `source` receive `null`.
    ///
    /// # Errors
    /// - `SchemaError::UnknownColumn` if either key is not registered
    pub fn copy_column_values(
        &self,
        source: &str,
        target: &str,
        rows: &mut [Record],
    ) -> Result<(), SchemaError> {
        for key in [source, target] {
            if !self.columns.contains_key(key) {
                return Err(SchemaError::UnknownColumn(key.to_string()));
            }
        }

        for row in rows.iter_mut() {
            let value = row.get(source).cloned().unwrap_or(Value::Null);
            row.insert(target.to_string(), value);
        }
        Ok(())
    }

    /// Check if column exists
    #[inline]
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.columns.contains_key(key)
    }

    /// Get column descriptor
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ColumnDescriptor> {
        self.columns.get(key)
    }

    /// Column keys in display order
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        self.columns.keys().map(String::as_str).collect()
    }

    /// Iterate over descriptors in display order
    pub fn iter(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.values()
    }

    /// Get number of columns
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if schema has no columns
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

fn fill_missing(key: &str, rows: &mut [Record]) {
    for row in rows.iter_mut() {
        row.entry(key.to_string())
            .or_insert_with(|| Value::String(String::new()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows() -> Vec<Record> {
        vec![
            json!({"a": 1, "b": "x"}),
            json!({"a": 2, "b": "y"}),
            json!({"a": 3, "b": "z"}),
        ]
        .into_iter()
        .filter_map(|v| v.as_object().cloned())
        .collect()
    }

    #[test]
    fn from_first_record_keeps_key_order() {
        let record = json!({"zeta": 1, "alpha": 2, "mid": 3});
        let schema = Schema::from_first_record(record.as_object().unwrap());
        assert_eq!(schema.keys(), vec!["zeta", "alpha", "mid"]);
        assert_eq!(schema.get("alpha").unwrap().label, "alpha");
    }

    #[test]
    fn add_column_backfills_every_row() {
        let mut rows = rows();
        let mut schema = Schema::from_first_record(&rows[0]);

        let col = schema.add_column(" note ", &mut rows).unwrap();
        assert_eq!(col.key, "note");
        assert_eq!(schema.keys(), vec!["a", "b", "note"]);
        for row in &rows {
            assert_eq!(row["note"], json!(""));
        }
    }

    #[test]
    fn add_column_resets_stray_values() {
        let mut rows: Vec<Record> = json!([{"a": 1}, {"a": 2, "b": "keep"}])
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_object().cloned())
            .collect();
        let mut schema = Schema::from_first_record(&rows[0]);

        schema.add_column("b", &mut rows).unwrap();
        assert_eq!(rows[0]["b"], json!(""));
        assert_eq!(rows[1]["b"], json!(""));
    }

    #[test]
    fn ensure_column_keeps_key_untrimmed() {
        let mut rows = rows();
        let mut schema = Schema::from_first_record(&rows[0]);

        assert!(schema.ensure_column(" x ", " x ", &mut rows));
        assert!(schema.ensure_column("", "", &mut rows));
        assert_eq!(schema.keys(), vec!["a", "b", " x ", ""]);
        for row in &rows {
            assert_eq!(row.len(), schema.len());
        }
    }

    #[test]
    fn add_column_duplicate_leaves_state_unchanged() {
        let mut rows = rows();
        let mut schema = Schema::from_first_record(&rows[0]);
        let before_rows = rows.clone();
        let before_schema = schema.clone();

        let err = schema.add_column("a", &mut rows).unwrap_err();
        assert_eq!(err, SchemaError::DuplicateColumn("a".to_string()));
        assert_eq!(rows, before_rows);
        assert_eq!(schema, before_schema);
    }

    #[test]
    fn add_column_rejects_blank_key() {
        let mut rows = rows();
        let mut schema = Schema::from_first_record(&rows[0]);
        assert_eq!(
            schema.add_column("   ", &mut rows).unwrap_err(),
            SchemaError::EmptyColumnKey
        );
    }

    #[test]
    fn ensure_column_is_idempotent() {
        let mut rows = rows();
        let mut schema = Schema::from_first_record(&rows[0]);

        assert!(schema.ensure_column("llm_result", "LLM Result", &mut rows));
        rows[0].insert("llm_result".to_string(), json!("done"));
        assert!(!schema.ensure_column("llm_result", "LLM Result", &mut rows));

        assert_eq!(schema.len(), 3);
        assert_eq!(schema.get("llm_result").unwrap().label, "LLM Result");
        assert_eq!(rows[0]["llm_result"], json!("done"));
        assert_eq!(rows[1]["llm_result"], json!(""));
    }

    #[test]
    fn copy_column_values_copies_per_row() {
        let mut rows = rows();
        let schema = Schema::from_first_record(&rows[0]);

        schema.copy_column_values("a", "b", &mut rows).unwrap();
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row["b"], row["a"]);
            assert_eq!(row["a"], json!(i + 1));
        }
    }

    #[test]
    fn copy_column_values_unknown_column() {
        let mut rows = rows();
        let schema = Schema::from_first_record(&rows[0]);

        assert_eq!(
            schema.copy_column_values("missing", "b", &mut rows),
            Err(SchemaError::UnknownColumn("missing".to_string()))
        );
        assert_eq!(
            schema.copy_column_values("a", "nope", &mut rows),
            Err(SchemaError::UnknownColumn("nope".to_string()))
        );
        assert_eq!(rows[0]["b"], json!("x"));
    }
}
