//! Annotation workbench
//!
//! The in-memory session a user works in: one [`RowStore`], a dispatcher
//! bound to a text generator, and the session flags (unsaved changes, last
//! prompt). Batch processing borrows the workbench mutably for the whole
//! batch, so two batches can never run against the same collection.

use crate::cell::CellEditor;
use crate::config::AnnotatorConfig;
use crate::dispatcher::BatchDispatcher;
use crate::error::{AnnotatorError, ConfigError, EditError, LoadError, StoreError};
use crate::reconciler::{MergeSummary, ResultColumn};
use crate::service::{ChatCompletionsClient, TextGenerator};
use crate::store::RowStore;
use crate::template::{placeholders, render};
use crate::types::{BatchId, ColumnDescriptor, Record};
use serde_json::Value;
use std::sync::Arc;

/// Default file name for exported collections
pub const DEFAULT_EXPORT_FILE: &str = "modified_data.json";

/// Result of one processed selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSummary {
    /// Batch identifier
    pub batch: BatchId,
    /// Records whose call succeeded
    pub succeeded: usize,
    /// Records whose call failed
    pub failed: usize,
    /// Reconciliation counts
    pub merge: MergeSummary,
}

/// In-memory annotation session
#[derive(Debug)]
pub struct Workbench {
    store: RowStore,
    dispatcher: BatchDispatcher,
    result_column: String,
    result_label: String,
    has_changes: bool,
    last_prompt: Option<String>,
}

impl Workbench {
    /// Create workbench over an explicit generator
    #[must_use]
    pub fn new(config: &AnnotatorConfig, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            store: RowStore::new(),
            dispatcher: BatchDispatcher::new(generator),
            result_column: config.result_column.clone(),
            result_label: config.result_label.clone(),
            has_changes: false,
            last_prompt: None,
        }
    }

    /// Create workbench calling the configured chat-completions service
    ///
    /// # Errors
    /// - `AnnotatorError::Config` if the configuration is invalid or the
    ///   HTTP client cannot be built
    pub fn from_config(config: &AnnotatorConfig) -> Result<Self, AnnotatorError> {
        config.validate()?;
        let client = ChatCompletionsClient::new(config.service.clone())
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(Self::new(config, Arc::new(client)))
    }

    /// Replace the collection
    pub fn load(&mut self, records: &[Record]) {
        self.store.load(records);
        self.has_changes = false;
    }

    /// Replace the collection from a parsed JSON document
    ///
    /// An array becomes the collection; any other value is wrapped into a
    /// one-element collection.
    ///
    /// # Errors
    /// - `LoadError::InvalidRecord` if an element is not an object
    pub fn load_value(&mut self, document: Value) -> Result<usize, LoadError> {
        let items = match document {
            Value::Array(items) => items,
            other => vec![other],
        };
        let records = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(record) => Ok(record),
                _ => Err(LoadError::InvalidRecord { index }),
            })
            .collect::<Result<Vec<Record>, LoadError>>()?;

        self.load(&records);
        Ok(records.len())
    }

    /// Replace the collection from JSON text
    ///
    /// # Errors
    /// - `LoadError::InvalidJson` if `text` is not JSON
    /// - `LoadError::InvalidRecord` if an element is not an object
    pub fn load_json(&mut self, text: &str) -> Result<usize, LoadError> {
        let document: Value = serde_json::from_str(text)?;
        self.load_value(document)
    }

    /// Drop the collection and session flags
    pub fn clear(&mut self) {
        self.store.clear();
        self.has_changes = false;
    }

    /// Pretty-printed JSON of the collection
    ///
    /// Clears the unsaved-changes flag.
    ///
    /// # Errors
    /// - `AnnotatorError::Export` if serialization fails
    pub fn export_json(&mut self) -> Result<String, AnnotatorError> {
        let text = serde_json::to_string_pretty(self.store.rows())?;
        self.has_changes = false;
        Ok(text)
    }

    /// Append an empty column
    ///
    /// # Errors
    /// - `StoreError::Schema` if the key is blank or already present
    pub fn add_column(&mut self, key: &str) -> Result<ColumnDescriptor, StoreError> {
        let col = self.store.add_column(key)?;
        self.has_changes = true;
        Ok(col)
    }

    /// Copy one column's values into another
    ///
    /// # Errors
    /// - `StoreError::Schema` if either key is unknown
    pub fn copy_column_values(&mut self, source: &str, target: &str) -> Result<(), StoreError> {
        self.store.copy_column_values(source, target)?;
        self.has_changes = true;
        Ok(())
    }

    /// Write one cell
    ///
    /// # Errors
    /// - `StoreError::IndexOutOfRange` if `row` is invalid
    pub fn set_cell(&mut self, row: usize, key: &str, value: Value) -> Result<(), StoreError> {
        self.store.set_cell(row, key, value)?;
        self.has_changes = true;
        Ok(())
    }

    /// Start editing a cell
    ///
    /// # Errors
    /// - `EditError::Store` if `row` is invalid
    pub fn edit_cell(&self, row: usize, key: &str) -> Result<CellEditor, EditError> {
        let mut editor = CellEditor::new(row, key);
        editor.begin_edit(&self.store)?;
        Ok(editor)
    }

    /// Commit an editor's draft
    ///
    /// Returns `true` when the cell changed.
    ///
    /// # Errors
    /// - `EditError` if the editor is not editing or the write fails
    pub fn commit_edit(&mut self, editor: &mut CellEditor) -> Result<bool, EditError> {
        let changed = editor.commit(&mut self.store)?;
        self.has_changes |= changed;
        Ok(changed)
    }

    /// Render `template` for one row without calling the service
    ///
    /// # Errors
    /// - `StoreError::IndexOutOfRange` if `row` is invalid
    pub fn preview(&self, row: usize, template: &str) -> Result<String, StoreError> {
        let record = self.store.selection(&[row])?;
        Ok(render(template, &record[0]))
    }

    /// Dispatch the rows at `indices` and merge the outcomes
    ///
    /// # Errors
    /// - `StoreError::IndexOutOfRange` if any index is invalid; nothing is
    ///   dispatched in that case
    pub async fn process_selection(
        &mut self,
        indices: &[usize],
        template: &str,
    ) -> Result<ProcessSummary, StoreError> {
        let selection = self.store.selection(indices)?;
        self.last_prompt = Some(template.to_string());

        for name in placeholders(template) {
            if !self.store.schema().contains(&name) {
                tracing::warn!("Placeholder {{{}}} names no column", name);
            }
        }

        let report = self.dispatcher.process(&selection, template).await;
        let merge = self.store.merge_results(
            &selection,
            &report.outcomes,
            ResultColumn {
                key: &self.result_column,
                label: &self.result_label,
            },
        );
        self.has_changes = true;

        Ok(ProcessSummary {
            batch: report.id,
            succeeded: report.succeeded(),
            failed: report.failed(),
            merge,
        })
    }

    /// Dispatch every row
    ///
    /// # Errors
    /// - `StoreError::IndexOutOfRange`, unreachable for in-range indices
    pub async fn process_all(&mut self, template: &str) -> Result<ProcessSummary, StoreError> {
        let indices: Vec<usize> = (0..self.store.len()).collect();
        self.process_selection(&indices, template).await
    }

    /// Underlying store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &RowStore {
        &self.store
    }

    /// Key of the result column
    #[inline]
    #[must_use]
    pub fn result_column(&self) -> &str {
        &self.result_column
    }

    /// Check for changes since the last load or export
    #[inline]
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.has_changes
    }

    /// Template of the most recent batch
    #[inline]
    #[must_use]
    pub fn last_prompt(&self) -> Option<&str> {
        self.last_prompt.as_deref()
    }
}
