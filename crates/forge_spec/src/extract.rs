//! Extraction of structured documents from free-form collaborator output.
//!
//! Collaborators answer in prose that usually wraps a JSON object. The
//! extraction order is fixed:
//!
//! 1. the body of the first fenced block (```` ```json ````, or an untagged
//!    fence whose body is an object),
//! 2. otherwise the outermost brace pair of the raw text,
//! 3. a candidate that fails to parse is retried once after quote
//!    normalization.

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::error::{SpecError, SpecResult};

const FENCE_PATTERN: &str = r"(?s)```(?i:json)?[ \t]*\r?\n?(.*?)```";

/// Extract the candidate document text from a raw response.
///
/// Returns `None` when the response holds neither a fenced object nor a
/// brace pair.
pub fn extract_candidate(raw: &str) -> Option<String> {
    if let Ok(fence) = Regex::new(FENCE_PATTERN) {
        for captures in fence.captures_iter(raw) {
            if let Some(body) = captures.get(1) {
                let body = body.as_str().trim();
                if body.starts_with('{') {
                    debug!("Extracted document from fenced block");
                    return Some(body.to_string());
                }
            }
        }
    }

    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end > start {
        debug!("Extracted document from outermost braces");
        Some(raw[start..=end].to_string())
    } else {
        None
    }
}

/// Replace single and typographic quotes with plain double quotes.
pub fn normalize_quotes(candidate: &str) -> String {
    candidate
        .chars()
        .map(|c| match c {
            '\'' | '\u{2018}' | '\u{2019}' | '\u{201C}' | '\u{201D}' => '"',
            other => other,
        })
        .collect()
}

/// Extract and parse a JSON document, retrying once with normalized quotes.
///
/// Returns the parsed value together with the candidate text that parsed.
pub fn parse_lenient(raw: &str) -> SpecResult<(Value, String)> {
    if raw.trim().is_empty() {
        return Err(SpecError::parse("empty response", raw, ""));
    }

    let candidate = extract_candidate(raw)
        .ok_or_else(|| SpecError::parse("no structured document found in response", raw, ""))?;

    match serde_json::from_str::<Value>(&candidate) {
        Ok(value) => Ok((value, candidate)),
        Err(first) => {
            debug!("Initial parse failed ({}), retrying with normalized quotes", first);
            let normalized = normalize_quotes(&candidate);
            serde_json::from_str::<Value>(&normalized)
                .map(|value| (value, normalized))
                .map_err(|second| {
                    SpecError::parse(
                        format!(
                            "could not parse document: {} (after quote normalization: {})",
                            first, second
                        ),
                        raw,
                        candidate.clone(),
                    )
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_block_wins_over_braces() {
        let raw = "intro {not this}\n```json\n{\"a\": 1}\n```\ntrailing }";
        assert_eq!(extract_candidate(raw).as_deref(), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_untagged_fence_with_object() {
        let raw = "```\n{\"a\": 2}\n```";
        assert_eq!(extract_candidate(raw).as_deref(), Some("{\"a\": 2}"));
    }

    #[test]
    fn test_outermost_braces_fallback() {
        let raw = "Sure! {\"a\": {\"b\": 1}} hope that helps";
        assert_eq!(extract_candidate(raw).as_deref(), Some("{\"a\": {\"b\": 1}}"));
    }

    #[test]
    fn test_no_candidate() {
        assert!(extract_candidate("no json here").is_none());
        assert!(extract_candidate("} backwards {").is_none());
    }

    #[test]
    fn test_quote_normalization_retry() {
        let raw = "{'name': 'demo'}";
        let (value, parsed_from) = parse_lenient(raw).unwrap();
        assert_eq!(value["name"], "demo");
        assert_eq!(parsed_from, "{\"name\": \"demo\"}");
    }

    #[test]
    fn test_typographic_quotes() {
        let raw = "{\u{201C}name\u{201D}: \u{201C}demo\u{201D}}";
        let (value, _) = parse_lenient(raw).unwrap();
        assert_eq!(value["name"], "demo");
    }

    #[test]
    fn test_parse_error_keeps_diagnostics() {
        let raw = "result: {name: demo,,}";
        let err = parse_lenient(raw).unwrap_err();
        match err {
            SpecError::Parse { response, attempted, .. } => {
                assert_eq!(response, raw);
                assert_eq!(attempted, "{name: demo,,}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_response_is_parse_error() {
        assert!(parse_lenient("   ").unwrap_err().is_parse_error());
    }
}
