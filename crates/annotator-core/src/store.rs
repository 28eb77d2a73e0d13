//! Row store
//!
//! Owns the ordered row collection together with its [`Schema`]. Row index
//! is the only identity a row has; it is stable until the next `load` or
//! `clear`.

use crate::error::StoreError;
use crate::reconciler::{self, MergeSummary, ResultColumn};
use crate::schema::Schema;
use crate::template::display_value;
use crate::types::{ColumnDescriptor, Outcome, Record};
use serde_json::Value;

/// Ordered, schema-consistent record collection
#[derive(Debug, Default, Clone)]
pub struct RowStore {
    rows: Vec<Record>,
    schema: Schema,
}

impl RowStore {
    /// Create new empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the collection and re-derive the schema from the first record
    pub fn load(&mut self, records: &[Record]) {
        self.rows = records.to_vec();
        self.schema = self
            .rows
            .first()
            .map(Schema::from_first_record)
            .unwrap_or_default();
        tracing::info!(
            "Loaded {} rows with {} columns",
            self.rows.len(),
            self.schema.len()
        );
    }

    /// Drop every row and column
    pub fn clear(&mut self) {
        self.rows.clear();
        self.schema = Schema::new();
    }

    /// Store `value` verbatim in one cell
    ///
    /// A key that is not yet a column is registered first, exactly as given,
    /// so the row shape stays governed by the schema.
    ///
    /// # Errors
    /// - `StoreError::IndexOutOfRange` if `row` is not a valid index
    pub fn set_cell(&mut self, row: usize, key: &str, value: Value) -> Result<(), StoreError> {
        self.check_index(row)?;
        self.schema.ensure_column(key, key, &mut self.rows);
        self.rows[row].insert(key.to_string(), value);
        Ok(())
    }

    /// Get one cell
    ///
    /// # Errors
    /// - `StoreError::IndexOutOfRange` if `row` is not a valid index
    pub fn get_cell(&self, row: usize, key: &str) -> Result<Option<&Value>, StoreError> {
        self.check_index(row)?;
        Ok(self.rows[row].get(key))
    }

    /// Ordered snapshot of the rows at `indices`
    ///
    /// # Errors
    /// - `StoreError::IndexOutOfRange` for the first invalid index
    pub fn selection(&self, indices: &[usize]) -> Result<Vec<Record>, StoreError> {
        indices
            .iter()
            .map(|&index| -> Result<Record, StoreError> {
                self.check_index(index)?;
                Ok(self.rows[index].clone())
            })
            .collect()
    }

    /// Append an empty column to every row
    ///
    /// # Errors
    /// - `StoreError::Schema` if the key is blank or already a column
    pub fn add_column(&mut self, key: &str) -> Result<ColumnDescriptor, StoreError> {
        let col = self.schema.add_column(key, &mut self.rows)?;
        Ok(col.clone())
    }

    /// Copy `source` into `target` on every row
    ///
    /// # Errors
    /// - `StoreError::Schema` if either key is not a column
    pub fn copy_column_values(&mut self, source: &str, target: &str) -> Result<(), StoreError> {
        self.schema
            .copy_column_values(source, target, &mut self.rows)?;
        Ok(())
    }

    /// Merge batch outcomes for `subset` into the collection
    pub fn merge_results(
        &mut self,
        subset: &[Record],
        outcomes: &[Outcome],
        column: ResultColumn<'_>,
    ) -> MergeSummary {
        reconciler::reconcile(&mut self.schema, &mut self.rows, subset, outcomes, column)
    }

    /// Cells of one row as display text, in column order
    ///
    /// # Errors
    /// - `StoreError::IndexOutOfRange` if `row` is not a valid index
    pub fn display_row(&self, row: usize) -> Result<Vec<String>, StoreError> {
        self.check_index(row)?;
        let record = &self.rows[row];
        Ok(self
            .schema
            .iter()
            .map(|col| record.get(&col.key).map(display_value).unwrap_or_default())
            .collect())
    }

    /// All rows
    #[inline]
    #[must_use]
    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    /// Column registry
    #[inline]
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Get number of rows
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if store has no rows
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn check_index(&self, index: usize) -> Result<(), StoreError> {
        if index < self.rows.len() {
            Ok(())
        } else {
            Err(StoreError::IndexOutOfRange {
                index,
                len: self.rows.len(),
            })
        }
    }
}
