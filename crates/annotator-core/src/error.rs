//! Error types for Annotator Core
//!
//! Provides error handling for:
//! - Schema registry violations (duplicate/unknown columns)
//! - Row store addressing errors
//! - Cell editor state machine misuse
//! - Per-record text generation failures
//! - Source loading and configuration

/// Main annotator error type
#[derive(Debug, thiserror::Error)]
pub enum AnnotatorError {
    /// Schema registry violation
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Row store violation
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Cell editor misuse
    #[error("edit error: {0}")]
    Edit(#[from] EditError),

    /// Source document could not be loaded
    #[error("load error: {0}")]
    Load(#[from] LoadError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Collection could not be exported
    #[error("export failed: {0}")]
    Export(#[from] serde_json::Error),
}

/// Column registry errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// Column key already registered
    #[error("column already exists: {0}")]
    DuplicateColumn(String),

    /// Column key not registered
    #[error("unknown column: {0}")]
    UnknownColumn(String),

    /// Column key empty after trimming
    #[error("column key must not be empty")]
    EmptyColumnKey,
}

/// Row store errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Row index outside the collection
    #[error("row index {index} out of range (len: {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Schema operation failed
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Cell editor errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    /// Transition not allowed from the current state
    #[error("illegal cell transition: {action} while {state:?}")]
    IllegalTransition {
        state: crate::cell::CellState,
        action: &'static str,
    },

    /// Commit reached the store and failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Per-record text generation errors
///
/// Never escalated past the dispatcher; converted into
/// [`Outcome::Failure`](crate::types::Outcome::Failure).
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Network, connection or timeout failure
    #[error("transport failure: {0}")]
    Transport(String),

    /// Non-success status from the service
    #[error("service returned {status}: {body}")]
    Service { status: u16, body: String },

    /// Response body did not carry generated content
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl ServiceError {
    /// Check if error happened before the service answered
    #[inline]
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::MalformedResponse(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Source document loading errors
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Document is not valid JSON
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Element of the document is not an object
    #[error("record {index} is not an object")]
    InvalidRecord { index: usize },
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config values are unusable
    #[error("invalid config: {0}")]
    Invalid(String),
}
