//! Core types for the annotator
//!
//! Defines the fundamental data model:
//! - Records and their untyped cell values
//! - Column descriptors
//! - Per-record outcomes and batch identifiers

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ulid::Ulid;

/// One data row: field name to JSON value, in insertion order
pub type Record = Map<String, Value>;

/// Prefix written into the result cell of a failed record
pub const FAILURE_MARKER_PREFIX: &str = "[failed] ";

/// Column descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Unique field key
    pub key: String,
    /// Display label
    pub label: String,
}

impl ColumnDescriptor {
    /// Create descriptor whose label is the key itself
    #[inline]
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            label: key.clone(),
            key,
        }
    }

    /// With explicit label
    #[inline]
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// Result of one record's call to the text-generation service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Generated content
    Success(String),
    /// Failure reason
    Failure(String),
}

impl Outcome {
    /// Check if outcome carries content
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Value written into the result cell
    #[must_use]
    pub fn cell_value(&self) -> Value {
        match self {
            Self::Success(content) => Value::String(content.clone()),
            Self::Failure(reason) => Value::String(format!("{FAILURE_MARKER_PREFIX}{reason}")),
        }
    }
}

/// Unique batch identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BatchId(pub Ulid);

impl BatchId {
    /// Generate new batch ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcomes of one dispatched batch, aligned with the input records
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// Batch identifier
    pub id: BatchId,
    /// One outcome per input record, in input order
    pub outcomes: Vec<Outcome>,
}

impl BatchReport {
    /// Number of successful records
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Number of failed records
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}
