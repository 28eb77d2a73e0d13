//! Configuration
//!
//! Layered as defaults, then an optional TOML file, then environment
//! variables (`LLM_API_ENDPOINT`, `LLM_API_KEY`, `LLM_MODEL`).

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default chat-completions endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.example.com/v1/chat/completions";
/// Default model identifier
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
/// Default result column key
pub const DEFAULT_RESULT_COLUMN: &str = "llm_result";
/// Default result column label
pub const DEFAULT_RESULT_LABEL: &str = "LLM Result";

/// Environment variable overriding the endpoint
pub const ENV_ENDPOINT: &str = "LLM_API_ENDPOINT";
/// Environment variable carrying the bearer credential
pub const ENV_API_KEY: &str = "LLM_API_KEY";
/// Environment variable overriding the model
pub const ENV_MODEL: &str = "LLM_MODEL";

/// External text-generation service descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Chat-completions endpoint URL
    pub endpoint: String,
    /// Bearer credential
    pub api_key: String,
    /// Model identifier
    pub model: String,
    /// Models offered for selection
    pub available_models: Vec<String>,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl ServiceConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With endpoint
    #[inline]
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// With bearer credential
    #[inline]
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    /// With model identifier
    #[inline]
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// With request timeout
    #[inline]
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// Check if `model` is among `available_models`
    ///
    /// An empty list accepts any model.
    #[must_use]
    pub fn is_known_model(&self) -> bool {
        self.available_models.is_empty() || self.available_models.contains(&self.model)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            available_models: vec!["gpt-3.5-turbo".to_string(), "gpt-4".to_string()],
            request_timeout_secs: 60,
        }
    }
}

/// Annotator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotatorConfig {
    /// Text-generation service
    pub service: ServiceConfig,
    /// Key of the column receiving batch results
    pub result_column: String,
    /// Label of the result column
    pub result_label: String,
}

impl AnnotatorConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With service descriptor
    #[inline]
    #[must_use]
    pub fn with_service(mut self, service: ServiceConfig) -> Self {
        self.service = service;
        self
    }

    /// With result column key
    #[inline]
    #[must_use]
    pub fn with_result_column(mut self, key: impl Into<String>) -> Self {
        self.result_column = key.into();
        self
    }

    /// Parse from TOML text, missing fields taking defaults
    ///
    /// # Errors
    /// - `ConfigError::Parse` if the text is not valid TOML for this shape
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read a TOML file
    ///
    /// # Errors
    /// - `ConfigError::Read` if the file cannot be read
    /// - `ConfigError::Parse` if it is not valid TOML
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Defaults, then `path` if given, then process environment
    ///
    /// # Errors
    /// - `ConfigError` if the file is unreadable or the result is invalid
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = config.with_env(|name| std::env::var(name).ok());
        config.validate()?;
        tracing::debug!(
            "Loaded config: endpoint={} model={}",
            config.service.endpoint,
            config.service.model
        );
        Ok(config)
    }

    /// Apply overrides from an environment lookup
    ///
    /// Empty values are ignored.
    #[must_use]
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(endpoint) = get(ENV_ENDPOINT) {
            self.service.endpoint = endpoint;
        }
        if let Some(api_key) = get(ENV_API_KEY) {
            self.service.api_key = api_key;
        }
        if let Some(model) = get(ENV_MODEL) {
            self.service.model = model;
        }
        self
    }

    /// Check the configuration is usable
    ///
    /// A model outside `available_models` is accepted with a warning.
    ///
    /// # Errors
    /// - `ConfigError::Invalid` for an empty endpoint, model or result column
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("endpoint must not be empty".to_string()));
        }
        if self.service.model.trim().is_empty() {
            return Err(ConfigError::Invalid("model must not be empty".to_string()));
        }
        if self.result_column.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "result_column must not be empty".to_string(),
            ));
        }
        if !self.service.is_known_model() {
            tracing::warn!(
                "Model {} is not in available_models {:?}",
                self.service.model,
                self.service.available_models
            );
        }
        Ok(())
    }
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            result_column: DEFAULT_RESULT_COLUMN.to_string(),
            result_label: DEFAULT_RESULT_LABEL.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults() {
        let config = AnnotatorConfig::new();
        assert_eq!(config.service.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.service.model, "gpt-3.5-turbo");
        assert_eq!(config.service.available_models.len(), 2);
        assert_eq!(config.result_column, "llm_result");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn toml_partial_override() {
        let config = AnnotatorConfig::from_toml_str(
            r#"
            result_column = "summary"

            [service]
            model = "gpt-4"
            request_timeout_secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.result_column, "summary");
        assert_eq!(config.result_label, DEFAULT_RESULT_LABEL);
        assert_eq!(config.service.model, "gpt-4");
        assert_eq!(config.service.request_timeout_secs, 5);
        assert_eq!(config.service.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn toml_invalid() {
        assert!(matches!(
            AnnotatorConfig::from_toml_str("result_column = ["),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn env_overrides_file() {
        let env: HashMap<&str, &str> = [
            (ENV_ENDPOINT, "http://localhost:8080/v1/chat/completions"),
            (ENV_API_KEY, "secret"),
            (ENV_MODEL, ""),
        ]
        .into_iter()
        .collect();

        let config = AnnotatorConfig::new()
            .with_service(ServiceConfig::new().with_model("gpt-4"))
            .with_env(|name| env.get(name).map(|v| (*v).to_string()));

        assert_eq!(
            config.service.endpoint,
            "http://localhost:8080/v1/chat/completions"
        );
        assert_eq!(config.service.api_key, "secret");
        assert_eq!(config.service.model, "gpt-4");
    }

    #[test]
    fn validate_rejects_empty_fields() {
        let config = AnnotatorConfig::new().with_service(ServiceConfig::new().with_model(" "));
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = AnnotatorConfig::new().with_result_column("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn unlisted_model_is_flagged_but_valid() {
        let service = ServiceConfig::new().with_model("gpt-4");
        assert!(service.is_known_model());

        let service = ServiceConfig::new().with_model("local-llama");
        assert!(!service.is_known_model());
        let config = AnnotatorConfig::new().with_service(service);
        assert!(config.validate().is_ok());

        let mut service = ServiceConfig::new().with_model("anything");
        service.available_models.clear();
        assert!(service.is_known_model());
    }

    #[test]
    fn from_file_missing() {
        let err = AnnotatorConfig::from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn from_file_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("annotator.toml");
        std::fs::write(&path, "[service]\nendpoint = \"http://x/v1\"\n").unwrap();

        let config = AnnotatorConfig::from_file(&path).unwrap();
        assert_eq!(config.service.endpoint, "http://x/v1");
    }
}
