//! Vendor identification from model identifiers.

use std::fmt;

use crate::error::FlowError;

/// Vendors with a built-in adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
}

const OPENAI_PREFIXES: &[&str] = &[
    "gpt-", "chatgpt-", "o1", "o3", "o4", "text-", "davinci", "babbage",
];
const ANTHROPIC_PREFIXES: &[&str] = &["claude"];

impl ProviderKind {
    pub const ALL: [ProviderKind; 2] = [ProviderKind::OpenAi, ProviderKind::Anthropic];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
        }
    }

    /// Parse a vendor id such as `"openai"`.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(id))
    }

    /// Select the vendor serving `model`.
    ///
    /// An explicit `vendor/model` prefix wins; otherwise the model name is
    /// matched against each vendor's naming prefixes.
    pub fn from_model(model: &str) -> Result<Self, FlowError> {
        let model = model.trim();
        if let Some((vendor, _)) = model.split_once('/')
            && let Some(kind) = Self::from_id(vendor)
        {
            return Ok(kind);
        }

        let lower = model.to_ascii_lowercase();
        if OPENAI_PREFIXES.iter().any(|p| lower.starts_with(p)) {
            return Ok(Self::OpenAi);
        }
        if ANTHROPIC_PREFIXES.iter().any(|p| lower.starts_with(p)) {
            return Ok(Self::Anthropic);
        }
        Err(FlowError::UnknownModel(model.to_string()))
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Drop a recognised `vendor/` prefix so the vendor API sees its own model name.
pub fn strip_vendor_prefix(model: &str) -> &str {
    let model = model.trim();
    match model.split_once('/') {
        Some((vendor, rest)) if ProviderKind::from_id(vendor).is_some() => rest,
        _ => model,
    }
}
