//! Response post-processing
//!
//! Model output is free-form text that frequently wraps a JSON payload in a
//! markdown fence or surrounds it with prose. This module strips the fence
//! and locates the embedded payload:
//! - [`clean_markdown`] removes one leading/trailing fenced code block marker
//! - [`extract_json`] slices from the first `{`/`[` to the last matching closer
//! - [`parse_structured`] chains both with `serde_json` parsing
//!
//! Extraction failure is an expected outcome, not an exceptional one:
//! [`post_process`] falls back to the cleaned text whenever no payload parses.

use serde_json::Value;

use crate::error::FlowError;
use crate::types::FlowOutput;

const FENCE: &str = "```";

/// Strip a single fenced code block marker (with or without a language tag).
///
/// Text that does not start with a fence is returned unchanged.
pub fn clean_markdown(text: &str) -> String {
    let trimmed = text.trim();
    let Some(after_open) = trimmed.strip_prefix(FENCE) else {
        return text.to_string();
    };

    // Drop the info string (`json`, `JSON5`, `ts`, ...) that follows the fence.
    let body = match after_open.find('\n') {
        Some(newline) => &after_open[newline + 1..],
        None => strip_inline_tag(after_open),
    };
    let body = body.trim_end();
    body.strip_suffix(FENCE).unwrap_or(body).trim().to_string()
}

/// On a single-line fence a leading word is a language tag only when a JSON
/// value opens right after it; otherwise the word is the reply itself.
fn strip_inline_tag(line: &str) -> &str {
    let tag_len = line
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(line.len());
    let rest = &line[tag_len..];
    if tag_len > 0 && rest.trim_start().starts_with(['{', '[']) {
        rest
    } else {
        line
    }
}

/// Return the substring between the first `{`/`[` and the last matching closer.
///
/// Well-formedness is not checked here; that is left to the JSON parse.
pub fn extract_json(text: &str) -> Result<&str, FlowError> {
    let start = text
        .find(['{', '['])
        .ok_or_else(|| FlowError::ExtractionError("no JSON object or array found".into()))?;
    let close = if text[start..].starts_with('{') { '}' } else { ']' };
    match text.rfind(close) {
        Some(end) if end > start => Ok(&text[start..=end]),
        _ => Err(FlowError::ExtractionError(format!(
            "unbalanced JSON delimiters: no closing '{close}'"
        ))),
    }
}

/// Clean, extract and parse a structured payload; `None` when any step fails.
pub fn parse_structured(text: &str) -> Option<Value> {
    let cleaned = clean_markdown(text);
    let slice = extract_json(&cleaned).ok()?;
    serde_json::from_str(slice).ok()
}

/// Post-process a model response the way a flow does when parsing is enabled.
///
/// Returns the parsed payload when one is found, otherwise the cleaned text.
pub fn post_process(text: &str) -> FlowOutput {
    let cleaned = clean_markdown(text);
    let parsed = extract_json(&cleaned)
        .and_then(|slice| serde_json::from_str::<Value>(slice).map_err(FlowError::from));
    match parsed {
        Ok(value) => FlowOutput::Json(value),
        Err(e) => {
            tracing::debug!(error = %e, "No structured payload in response; returning text");
            FlowOutput::Text(cleaned)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clean_markdown_strips_tagged_fence() {
        assert_eq!(clean_markdown("```json\n{\"a\":1}\n```"), "{\"a\":1}");
    }

    #[test]
    fn clean_markdown_strips_bare_fence() {
        assert_eq!(clean_markdown("```\nplain\ntext\n```"), "plain\ntext");
    }

    #[test]
    fn clean_markdown_handles_single_line_fence() {
        assert_eq!(clean_markdown("```json{\"a\":1}```"), "{\"a\":1}");
    }

    #[test]
    fn clean_markdown_keeps_single_line_fence_body() {
        assert_eq!(clean_markdown("```42```"), "42");
        assert_eq!(clean_markdown("```hello world```"), "hello world");
        assert_eq!(clean_markdown("```json [1, 2]```"), "[1, 2]");
        assert_eq!(post_process("```yes```"), FlowOutput::Text("yes".to_string()));
    }

    #[test]
    fn clean_markdown_handles_missing_closing_fence() {
        assert_eq!(clean_markdown("```json\n[1, 2]"), "[1, 2]");
    }

    #[test]
    fn clean_markdown_leaves_unfenced_text_unchanged() {
        let text = "  Sure! Here is the answer: {\"a\": 1}\n";
        assert_eq!(clean_markdown(text), text);
    }

    #[test]
    fn extract_json_finds_object_in_prose() {
        let text = r#"Sure! {"translation": "bonjour"} Hope that helps."#;
        assert_eq!(extract_json(text).unwrap(), r#"{"translation": "bonjour"}"#);
    }

    #[test]
    fn extract_json_spans_to_last_closer() {
        let text = r#"{"a": {"b": 1}} trailing }"#;
        assert_eq!(extract_json(text).unwrap(), r#"{"a": {"b": 1}} trailing }"#);
    }

    #[test]
    fn extract_json_prefers_first_opener() {
        let text = r#"list: [1, 2] then {"a": 1}"#;
        assert_eq!(extract_json(text).unwrap(), "[1, 2]");
    }

    #[test]
    fn extract_json_fails_without_delimiters() {
        assert!(matches!(
            extract_json("no json here"),
            Err(FlowError::ExtractionError(_))
        ));
        assert!(matches!(
            extract_json("only opens {"),
            Err(FlowError::ExtractionError(_))
        ));
        assert!(matches!(
            extract_json("} before {"),
            Err(FlowError::ExtractionError(_))
        ));
    }

    #[test]
    fn parse_structured_from_fenced_output() {
        assert_eq!(
            parse_structured("```json\n{\"a\":1}\n```"),
            Some(json!({"a": 1}))
        );
        assert_eq!(parse_structured("no json here"), None);
        assert_eq!(parse_structured("{not: valid}"), None);
    }

    #[test]
    fn post_process_falls_back_to_cleaned_text() {
        assert_eq!(
            post_process("no json here"),
            FlowOutput::Text("no json here".into())
        );
        assert_eq!(
            post_process("```\n{broken\n```"),
            FlowOutput::Text("{broken".into())
        );
    }

    #[test]
    fn post_process_returns_json_payload() {
        assert_eq!(
            post_process("```json\n[{\"id\": 1}, {\"id\": 2}]\n```"),
            FlowOutput::Json(json!([{"id": 1}, {"id": 2}]))
        );
    }
}
