//! Template rendering
//!
//! Substitutes `{field}` placeholders with a record's values. Keys are
//! matched literally and substitution is a single pass over the original
//! template, so substituted values are never re-expanded.

use crate::types::Record;
use regex::Regex;
use serde_json::Value;

/// Render `template` against `record`
///
/// Placeholders naming a field absent from `record` are left untouched.
#[must_use]
pub fn render(template: &str, record: &Record) -> String {
    if template.is_empty() || record.is_empty() {
        return template.to_string();
    }

    let keys: Vec<&str> = record
        .keys()
        .map(String::as_str)
        .filter(|key| template.contains(&placeholder(key)))
        .collect();
    if keys.is_empty() {
        return template.to_string();
    }

    let alternation = keys
        .iter()
        .map(|key| regex::escape(key))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = match Regex::new(&format!(r"\{{({alternation})\}}")) {
        Ok(pattern) => pattern,
        Err(err) => {
            // Escaped literals only fail on size limits; fall back to the template.
            tracing::warn!("placeholder pattern rejected: {}", err);
            return template.to_string();
        }
    };

    pattern
        .replace_all(template, |caps: &regex::Captures<'_>| {
            record
                .get(&caps[1])
                .map(display_value)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Text form of a cell value
///
/// Strings are used verbatim, objects and arrays as compact JSON, other
/// scalars in their natural form.
#[must_use]
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Distinct placeholder names in first-appearance order
#[must_use]
pub fn placeholders(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        match after.find(&['{', '}'][..]) {
            Some(close) if after.as_bytes()[close] == b'}' => {
                let name = &after[..close];
                if !name.is_empty() && !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
                rest = &after[close + 1..];
            }
            Some(close) => rest = &after[close..],
            None => break,
        }
    }
    names
}

#[inline]
fn placeholder(key: &str) -> String {
    format!("{{{key}}}")
}
