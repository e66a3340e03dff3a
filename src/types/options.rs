//! Run options: target model and generation parameters.

use serde::{Deserialize, Serialize};

use crate::error::FlowError;

/// Generation parameters for a flow.
///
/// Serialized in camelCase; this is also the `options` shape written into
/// version snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOptions {
    /// Model identifier, e.g. `gpt-4o` or `claude-3-5-sonnet-latest`
    pub model: String,

    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Nucleus sampling threshold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Maximum output tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,

    /// Stop sequences
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,

    /// Return the raw model text without structured extraction
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub dont_parse: bool,
}

impl RunOptions {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub const fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub const fn with_frequency_penalty(mut self, penalty: f32) -> Self {
        self.frequency_penalty = Some(penalty);
        self
    }

    pub const fn with_presence_penalty(mut self, penalty: f32) -> Self {
        self.presence_penalty = Some(penalty);
        self
    }

    pub fn with_stop_sequences<I, S>(mut self, stops: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stop_sequences = Some(stops.into_iter().map(Into::into).collect());
        self
    }

    /// Skip structured extraction and return the raw model text.
    pub const fn with_dont_parse(mut self, dont_parse: bool) -> Self {
        self.dont_parse = dont_parse;
        self
    }

    /// Check the options are usable for building a flow.
    pub fn validate(&self) -> Result<(), FlowError> {
        if self.model.trim().is_empty() {
            return Err(FlowError::ConfigurationError(
                "Model not specified in run options".to_string(),
            ));
        }
        Ok(())
    }
}
