//! Prompt templates
//!
//! A template is a string with `{{name}}` placeholders. Parsing a template
//! yields its [`VariableContract`]: the distinct placeholder names it uses.
//! Formatting substitutes every placeholder in one left-to-right pass.
//!
//! Substitution is permissive: a placeholder whose key is absent from the
//! input becomes the empty string, and keys the template does not use are
//! ignored. Use [`PromptTemplate::missing_variables`] to check an input up
//! front when that matters.
//!
//! ```rust,ignore
//! use siumai_flow::prelude::*;
//!
//! let template = PromptTemplate::new("Translate {{text}} to {{lang}}");
//! let prompt = template.format(&prompt_input! { "text" => "hello", "lang" => "French" });
//! assert_eq!(prompt, "Translate hello to French");
//! ```

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::FlowError;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{((?-u:\w)+)\}\}").expect("placeholder pattern is valid"));

/// Values substituted into a template, keyed by placeholder name.
pub type TemplateInput = Map<String, Value>;

/// The set of placeholder names a template requires.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableContract {
    names: BTreeSet<String>,
}

impl VariableContract {
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Placeholder names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Parse a template string into its variable contract.
pub fn parse(template: &str) -> VariableContract {
    VariableContract {
        names: PLACEHOLDER
            .captures_iter(template)
            .map(|caps| caps[1].to_string())
            .collect(),
    }
}

/// Substitute every placeholder in `template` from `input`.
pub fn format(template: &str, input: &TemplateInput) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            input.get(&caps[1]).map(stringify).unwrap_or_default()
        })
        .into_owned()
}

/// String form of a substituted value.
///
/// Strings are inserted verbatim, `null` becomes empty, numbers and booleans
/// use their display form, arrays and objects are inserted as compact JSON.
fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// An immutable template plus its parsed variable contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
    variables: VariableContract,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let variables = parse(&template);
        Self {
            template,
            variables,
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub const fn variables(&self) -> &VariableContract {
        &self.variables
    }

    pub fn format(&self, input: &TemplateInput) -> String {
        format(&self.template, input)
    }

    /// Format from any value that serializes to a JSON object.
    pub fn format_serialize<T: Serialize + ?Sized>(&self, input: &T) -> Result<String, FlowError> {
        Ok(self.format(&to_template_input(input)?))
    }

    /// Contract names that `input` does not provide, in sorted order.
    pub fn missing_variables(&self, input: &TemplateInput) -> Vec<String> {
        self.variables
            .iter()
            .filter(|name| !input.contains_key(*name))
            .map(str::to_string)
            .collect()
    }
}

impl std::fmt::Display for PromptTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.template)
    }
}

impl From<&str> for PromptTemplate {
    fn from(template: &str) -> Self {
        Self::new(template)
    }
}

impl From<String> for PromptTemplate {
    fn from(template: String) -> Self {
        Self::new(template)
    }
}

/// Build a standalone template.
pub fn create_prompt_template(template: impl Into<String>) -> PromptTemplate {
    PromptTemplate::new(template)
}

/// Convert a serializable value into template input.
pub fn to_template_input<T: Serialize + ?Sized>(input: &T) -> Result<TemplateInput, FlowError> {
    match serde_json::to_value(input)? {
        Value::Object(map) => Ok(map),
        other => Err(FlowError::InvalidParameter(format!(
            "Template input must serialize to an object, got {}",
            kind_of(&other)
        ))),
    }
}

const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Build a [`TemplateInput`] from `key => value` pairs.
///
/// Values go through `serde_json::json!` (re-exported by this crate); wrap
/// compound expressions in parentheses.
#[macro_export]
macro_rules! prompt_input {
    () => {
        $crate::template::TemplateInput::new()
    };
    ($($key:expr => $value:tt),+ $(,)?) => {{
        let mut input = $crate::template::TemplateInput::new();
        $(
            input.insert(::std::string::String::from($key), $crate::__serde_json::json!($value));
        )+
        input
    }};
}
