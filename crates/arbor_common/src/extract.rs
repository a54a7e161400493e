//! Pull one JSON object out of provider text.
//!
//! Providers are asked for bare JSON but some wrap it in prose. The policy is
//! a greedy brace scan: take everything from the first `{` to the last `}`
//! and parse that; with no such span, parse the text verbatim.
//!
//! This is a heuristic, not a tokenizer. Trailing prose that contains a `}`
//! widens the span and makes the parse fail; that is a known limitation.

use crate::error::LlmError;
use serde_json::Value;

/// Parse the JSON object embedded in `raw`.
pub fn extract_json(raw: &str) -> Result<Value, LlmError> {
    let candidate = json_span(raw).unwrap_or(raw);
    serde_json::from_str(candidate).map_err(|e| {
        LlmError::MalformedResponse(format!("no parseable JSON in provider output: {}", e))
    })
}

/// Greedy `{ ... }` span: first opening brace through the last closing brace.
pub fn json_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (start < end).then(|| &raw[start..=end])
}
