//! Testing utilities for the annotator workspace
//!
//! Shared fixtures and scripted text generators.

#![allow(missing_docs)]

use annotator_core::{AnnotatorConfig, Record, ServiceError, TextGenerator, Workbench};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Canned reply for one prompt
#[derive(Debug, Clone)]
pub enum Reply {
    Content(String),
    Fail(String),
}

/// Generator answering from a prompt -> reply script
///
/// Unscripted prompts are echoed back. Each reply can be delayed to force a
/// completion order different from the dispatch order.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    replies: HashMap<String, Reply>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<String>>,
    completions: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, prompt: &str, content: &str) -> Self {
        self.replies
            .insert(prompt.to_string(), Reply::Content(content.to_string()));
        self
    }

    pub fn fail(mut self, prompt: &str, reason: &str) -> Self {
        self.replies
            .insert(prompt.to_string(), Reply::Fail(reason.to_string()));
        self
    }

    pub fn delay(mut self, prompt: &str, millis: u64) -> Self {
        self.delays
            .insert(prompt.to_string(), Duration::from_millis(millis));
        self
    }

    /// Prompts in the order calls started
    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    /// Prompts in the order calls finished
    pub async fn completions(&self) -> Vec<String> {
        self.completions.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, ServiceError> {
        self.calls.lock().await.push(prompt.to_string());

        if let Some(delay) = self.delays.get(prompt) {
            tokio::time::sleep(*delay).await;
        }
        self.completions.lock().await.push(prompt.to_string());

        match self.replies.get(prompt) {
            Some(Reply::Content(content)) => Ok(content.clone()),
            Some(Reply::Fail(reason)) => Err(ServiceError::Service {
                status: 500,
                body: reason.clone(),
            }),
            None => Ok(prompt.to_string()),
        }
    }
}

/// Generator failing every call at the transport level
#[derive(Debug, Default, Clone, Copy)]
pub struct UnreachableGenerator;

#[async_trait::async_trait]
impl TextGenerator for UnreachableGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, ServiceError> {
        Err(ServiceError::Transport("connection refused".to_string()))
    }
}

/// Records from a JSON array of objects
pub fn records_from_json(value: Value) -> Vec<Record> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(record) => record,
                other => panic!("fixture element is not an object: {other}"),
            })
            .collect(),
        other => panic!("fixture is not an array: {other}"),
    }
}

/// Five records with distinct titles
pub fn five_records() -> Vec<Record> {
    records_from_json(serde_json::json!([
        {"id": 1, "title": "alpha", "tags": ["a"]},
        {"id": 2, "title": "beta", "tags": ["b"]},
        {"id": 3, "title": "gamma", "tags": []},
        {"id": 4, "title": "delta", "tags": ["d", "e"]},
        {"id": 5, "title": "epsilon", "tags": null}
    ]))
}

pub fn setup_test_workbench(generator: Arc<dyn TextGenerator>) -> Workbench {
    Workbench::new(&AnnotatorConfig::new(), generator)
}
