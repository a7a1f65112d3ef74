//! Sanitizing and parsing of raw model replies.
//!
//! Extractor replies are free text that should contain one JSON document,
//! sometimes wrapped in a markdown fence or surrounded by chatter. The
//! parser cleans the reply, locates the JSON and scrubs every string field
//! before anything reaches a client record.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

/// Maximum accepted reply length (200KB).
pub const MAX_RESPONSE_LENGTH: usize = 200_000;

/// Maximum length for individual string fields (10KB).
pub const MAX_FIELD_LENGTH: usize = 10_000;

const INJECTION_MARKERS: [&str; 11] = [
    "```system",
    "```assistant",
    "[INST]",
    "[/INST]",
    "<|system|>",
    "<|assistant|>",
    "<|user|>",
    "<|im_start|>",
    "<|im_end|>",
    "<<SYS>>",
    "<</SYS>>",
];

/// Errors raised while parsing a model reply.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResponseParseError {
    #[error("Response too long: {actual} bytes exceeds maximum of {max} bytes")]
    TooLong { max: usize, actual: usize },

    #[error("Response is empty")]
    Empty,

    #[error("JSON parse error: {0}")]
    Json(String),
}

/// Turns model replies into sanitized JSON values.
#[derive(Debug, Clone, Default)]
pub struct ResponseParser {
    additional_markers: Vec<String>,
}

impl ResponseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds further markers to strip from replies.
    pub fn with_additional_markers(mut self, markers: Vec<String>) -> Self {
        self.additional_markers = markers;
        self
    }

    /// Parses the JSON document contained in `reply`.
    pub fn parse(&self, reply: &str) -> Result<Value, ResponseParseError> {
        let cleaned = self.sanitize(reply)?;
        let json = locate_json(&cleaned);
        let value: Value =
            serde_json::from_str(json).map_err(|e| ResponseParseError::Json(e.to_string()))?;
        Ok(scrub_strings(value))
    }

    /// Length check, control-character removal and marker stripping.
    pub fn sanitize(&self, reply: &str) -> Result<String, ResponseParseError> {
        if reply.len() > MAX_RESPONSE_LENGTH {
            return Err(ResponseParseError::TooLong {
                max: MAX_RESPONSE_LENGTH,
                actual: reply.len(),
            });
        }
        if reply.trim().is_empty() {
            return Err(ResponseParseError::Empty);
        }

        let mut cleaned: String = reply
            .chars()
            .filter(|c| !c.is_control() || matches!(c, '\n' | '\t' | '\r'))
            .collect();
        for marker in INJECTION_MARKERS {
            cleaned = cleaned.replace(marker, "");
        }
        for marker in &self.additional_markers {
            cleaned = cleaned.replace(marker.as_str(), "");
        }
        Ok(cleaned)
    }
}

/// Finds the JSON payload: a fenced block first, then the first balanced
/// object or array, else the whole trimmed text.
fn locate_json(text: &str) -> &str {
    let trimmed = text.trim();
    if let Some(block) = fenced_block(trimmed) {
        return block;
    }

    let start = match (trimmed.find('{'), trimmed.find('[')) {
        (Some(o), Some(a)) => o.min(a),
        (Some(o), None) => o,
        (None, Some(a)) => a,
        (None, None) => return trimmed,
    };
    balanced_from(trimmed, start).unwrap_or(trimmed)
}

fn fenced_block(text: &str) -> Option<&str> {
    for fence in ["```json\n", "```json\r\n", "```\n", "```\r\n"] {
        if let Some(start) = text.find(fence) {
            let body_start = start + fence.len();
            if let Some(len) = text[body_start..].find("```") {
                return Some(text[body_start..body_start + len].trim());
            }
        }
    }
    None
}

fn balanced_from(text: &str, start: usize) -> Option<&str> {
    let bytes = text.as_bytes();
    let (open, close) = if bytes[start] == b'{' { ('{', '}') } else { ('[', ']') };
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            _ if in_string => {}
            c if c == open => depth += 1,
            c if c == close => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[start..start + offset + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

fn scrub_strings(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(scrub_field(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(scrub_strings).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, scrub_strings(v)))
                .collect(),
        ),
        other => other,
    }
}

/// A closed `<...>` span; an unmatched `<` is ordinary text.
static MARKUP_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^<>]*>").expect("valid markup regex"));

fn scrub_field(s: &str) -> String {
    let mut out = MARKUP_TAG.replace_all(s, "").into_owned();
    if out.len() > MAX_FIELD_LENGTH {
        let mut cut = MAX_FIELD_LENGTH;
        while !out.is_char_boundary(cut) {
            cut -= 1;
        }
        out.truncate(cut);
        out.push_str("...[truncated]");
    }
    out
}
