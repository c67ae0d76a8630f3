//! Recovers a JSON value from free-form model output.
//!
//! Backends only return text. Everything here is backend-agnostic: strip a
//! surrounding code fence, then when prose surrounds the payload try the
//! object or array that closes the reply before any wider span. Nothing is retried.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::{AppError, AppResult};

const EXCERPT_CHARS: usize = 80;

static FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^```(?:json)?\s*|\s*```$").expect("fence pattern is valid")
});

static EMBEDDED_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("embedded object pattern is valid"));

static EMBEDDED_ARRAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[.*\]").expect("embedded array pattern is valid"));

pub fn parse_json_reply(raw: &str) -> AppResult<Value> {
    let candidates = json_candidates(raw);
    if candidates.iter().all(|candidate| candidate.is_empty()) {
        return Err(AppError::MalformedResponse(
            "model returned an empty response".to_string(),
        ));
    }

    let mut first_error = None;
    for candidate in &candidates {
        match serde_json::from_str(candidate) {
            Ok(value) => return Ok(value),
            Err(err) => {
                first_error.get_or_insert(err);
            }
        }
    }

    let detail = first_error.map_or_else(|| "no json found".to_string(), |err| err.to_string());
    Err(AppError::MalformedResponse(format!(
        "{detail}; response began with {:?}",
        excerpt(raw)
    )))
}

/// The substring of `raw` most likely to hold the JSON payload.
pub fn json_candidate(raw: &str) -> &str {
    json_candidates(raw).first().copied().unwrap_or("")
}

/// Possible payload spans in `raw`, most likely first, without duplicates.
///
/// A reply that already starts with `{` or `[` is taken as-is. Otherwise spans
/// that run from an opener to a matching closer at the very end of the reply
/// come first, widest first. The widest object and the widest array follow for
/// replies with trailing prose.
pub fn json_candidates(raw: &str) -> Vec<&str> {
    let unfenced = strip_fences(raw.trim());

    if unfenced.starts_with(['{', '[']) {
        return vec![unfenced];
    }

    let mut candidates = Vec::new();
    for (start, opener) in unfenced.match_indices(['{', '[']) {
        let closer = if opener == "{" { '}' } else { ']' };
        if unfenced.ends_with(closer) {
            candidates.push(&unfenced[start..]);
        }
    }

    for pattern in [&EMBEDDED_OBJECT, &EMBEDDED_ARRAY] {
        if let Some(found) = pattern.find(unfenced) {
            let span = found.as_str().trim();
            if !candidates.contains(&span) {
                candidates.push(span);
            }
        }
    }

    if candidates.is_empty() {
        candidates.push(unfenced);
    }
    candidates
}

fn strip_fences(text: &str) -> &str {
    let start = FENCE
        .find(text)
        .filter(|found| found.start() == 0)
        .map_or(0, |found| found.end());
    let rest = &text[start..];

    let end = FENCE
        .find_iter(rest)
        .filter(|found| found.end() == rest.len() && found.start() > 0)
        .last()
        .map_or(rest.len(), |found| found.start());

    rest[..end].trim()
}

fn excerpt(raw: &str) -> String {
    raw.trim().chars().take(EXCERPT_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn strips_json_fence() {
        let raw = "```json\n{\"summary\":\"s\",\"priority\":\"low\",\"reasons\":[],\"suggested_actions\":[]}\n```";
        let value = parse_json_reply(raw).expect("fenced json parses");
        assert_eq!(
            value,
            json!({"summary":"s","priority":"low","reasons":[],"suggested_actions":[]})
        );
    }

    #[test]
    fn strips_bare_fence_case_insensitively() {
        assert_eq!(json_candidate("```JSON\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(json_candidate("```\n{\"a\":1}```"), "{\"a\":1}");
    }

    #[test]
    fn recovers_object_from_prose() {
        let raw = "Sure, here you go: {\"summary\":\"s\",\"priority\":\"high\",\"reasons\":[],\"suggested_actions\":[]} Thanks!";
        let value = parse_json_reply(raw).expect("embedded json parses");
        assert_eq!(value["priority"], "high");
        assert_eq!(value["reasons"], json!([]));
    }

    #[test]
    fn bracketed_prose_before_the_object_is_skipped() {
        let raw = "Triage [v1]: {\"summary\":\"Invoice due in five days.\",\"priority\":\"high\",\"reasons\":[],\"suggested_actions\":[]}";
        assert!(json_candidate(raw).starts_with("{\"summary\""));
        let value = parse_json_reply(raw).expect("trailing object parses");
        assert_eq!(value["summary"], "Invoice due in five days.");
        assert_eq!(value["priority"], "high");
    }

    #[test]
    fn bracketed_prose_with_trailing_text_falls_back_to_the_object() {
        let raw = "Triage [v1]: {\"priority\":\"low\",\"reasons\":[\"FYI\"]} Thanks!";
        let value = parse_json_reply(raw).expect("object parses");
        assert_eq!(value["reasons"], json!(["FYI"]));
    }

    #[test]
    fn trailing_array_is_recovered() {
        let raw = "Labels [draft]: [\"a\", \"b\"]";
        assert_eq!(parse_json_reply(raw).expect("array parses"), json!(["a", "b"]));
    }

    #[test]
    fn recovery_spans_nested_objects() {
        let raw = "Result:\n{\"a\":{\"b\":[1,2]},\"c\":3}\n";
        assert_eq!(parse_json_reply(raw).expect("parses"), json!({"a":{"b":[1,2]},"c":3}));
    }

    #[test]
    fn untouched_json_passes_through() {
        assert_eq!(json_candidate("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn fence_markers_inside_payload_survive() {
        let raw = "{\"body\":\"use ``` for code\"}";
        assert_eq!(parse_json_reply(raw).expect("parses")["body"], "use ``` for code");
    }

    #[test]
    fn rejects_prose_without_json() {
        let err = parse_json_reply("I cannot help with that.").expect_err("no json");
        assert!(matches!(err, AppError::MalformedResponse(_)));
    }

    #[test]
    fn rejects_broken_json_after_recovery() {
        let err = parse_json_reply("here: {\"summary\": \"cut off\"").expect_err("truncated");
        match err {
            AppError::MalformedResponse(message) => assert!(message.contains("cut off")),
            other => panic!("expected malformed response, got {other:?}"),
        }
    }

    #[test]
    fn rejects_empty_reply() {
        let err = parse_json_reply("  \n ").expect_err("empty");
        assert!(matches!(err, AppError::MalformedResponse(_)));
    }
}
