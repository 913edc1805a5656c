//! Per-instance validation error collection.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

use crate::naming::humanize;

/// Attribute key for whole-record errors.
pub const BASE: &str = "base";

/// A single validation failure descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorEntry {
    /// The rule kind that produced the failure, e.g. `blank`, `taken`.
    pub kind: String,
    /// Custom message overriding the default text for the kind.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Substitution data for message interpolation.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub params: HashMap<String, Value>,
}

impl ErrorEntry {
    /// Create an entry for a rule kind with the default message.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: None,
            params: HashMap::new(),
        }
    }

    /// Set a custom message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Add a substitution parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.params.insert(key.into(), v);
        }
        self
    }

    /// Resolve the human message, interpolating `{param}` placeholders.
    pub fn message(&self) -> String {
        let template = self
            .message
            .clone()
            .unwrap_or_else(|| default_message(&self.kind).to_string());
        interpolate(&template, &self.params)
    }
}

impl fmt::Display for ErrorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message())
    }
}

fn default_message(kind: &str) -> &'static str {
    match kind {
        "taken" => "has already been taken",
        "blank" => "can't be blank",
        "inclusion" => "is not included in the list",
        "exclusion" => "is reserved",
        "too_short" => "is too short (minimum is {count} characters)",
        "too_long" => "is too long (maximum is {count} characters)",
        "wrong_length" => "is the wrong length",
        "not_a_number" => "is not a number",
        _ => "is invalid",
    }
}

fn interpolate(template: &str, params: &HashMap<String, Value>) -> String {
    let mut result = template.to_string();
    for (key, value) in params {
        let placeholder = format!("{{{}}}", key);
        let replacement = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => value.to_string(),
        };
        result = result.replace(&placeholder, &replacement);
    }
    result
}

/// Collection of validation failures, keyed by attribute.
///
/// Owned by a single model instance; cleared and rebuilt on each validation run.
/// Not internally synchronized.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Errors {
    #[serde(flatten)]
    entries: HashMap<String, Vec<ErrorEntry>>,
}

impl Errors {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Add a failure of the given kind for an attribute.
    pub fn add(&mut self, attribute: impl Into<String>, kind: impl Into<String>) {
        self.add_entry(attribute, ErrorEntry::new(kind));
    }

    /// Add a prepared entry for an attribute.
    pub fn add_entry(&mut self, attribute: impl Into<String>, entry: ErrorEntry) {
        self.entries.entry(attribute.into()).or_default().push(entry);
    }

    /// Merge another collection into this one.
    pub fn merge(&mut self, other: Errors) {
        for (attribute, entries) in other.entries {
            self.entries.entry(attribute).or_default().extend(entries);
        }
    }

    /// Entries recorded for an attribute, in insertion order.
    pub fn get(&self, attribute: &str) -> Option<&Vec<ErrorEntry>> {
        self.entries.get(attribute)
    }

    /// Check if the collection holds no failures.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of failures across all attributes.
    pub fn len(&self) -> usize {
        self.entries.values().map(|v| v.len()).sum()
    }

    /// Remove every recorded failure.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Attributes that have failures.
    pub fn attribute_names(&self) -> Vec<&str> {
        self.entries.keys().map(|s| s.as_str()).collect()
    }

    /// Full human messages, attribute label included.
    pub fn full_messages(&self) -> Vec<String> {
        self.entries
            .iter()
            .flat_map(|(attribute, entries)| {
                entries.iter().map(move |entry| {
                    if attribute == BASE {
                        entry.message()
                    } else {
                        format!("{} {}", humanize(attribute), entry.message())
                    }
                })
            })
            .collect()
    }
}

impl fmt::Display for Errors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} validation error(s)", self.len())
    }
}
