//! Flow run result.

use serde::Serialize;
use serde_json::Value;

/// Output of [`Flow::run`](crate::flow::Flow::run).
///
/// `Json` when a structured payload was extracted from the model text,
/// `Text` otherwise (raw text under `dont_parse`, cleaned text on fallback).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FlowOutput {
    Text(String),
    Json(Value),
}

impl FlowOutput {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Json(_) => None,
        }
    }

    pub const fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    pub const fn is_json(&self) -> bool {
        matches!(self, Self::Json(_))
    }

    /// Convert into a JSON value; text becomes a JSON string.
    pub fn into_value(self) -> Value {
        match self {
            Self::Text(text) => Value::String(text),
            Self::Json(value) => value,
        }
    }
}

impl From<String> for FlowOutput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Value> for FlowOutput {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}
