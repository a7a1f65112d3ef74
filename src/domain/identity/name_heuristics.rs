//! Regex fallback for finding the client's name in raw transcript text.
//!
//! Used when the name-only model call is unavailable or returns nothing.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

/// A client name pulled from a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedName {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub meeting_date: Option<Timestamp>,
}

impl ExtractedName {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            meeting_date: None,
        }
    }

    pub fn with_meeting_date(mut self, date: Option<Timestamp>) -> Self {
        self.meeting_date = date;
        self
    }

    /// Both parts present after trimming.
    pub fn is_complete(&self) -> bool {
        !self.first_name.trim().is_empty() && !self.last_name.trim().is_empty()
    }
}

const NAME: &str = r"(\p{Lu}[\p{L}'\-]+)";
const HONORIFIC: &str = r"(?:Mr|Mrs|Ms|Miss|Dr)\.?";

// Order matters: the first pattern that matches wins.
static PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        format!(r"(?i:client(?:\s+name)?)\s*:\s*{NAME}\s+{NAME}"),
        format!(r"(?i:meeting\s+with)\s+(?:{HONORIFIC}\s+)?{NAME}\s+{NAME}"),
        format!(r"\b{HONORIFIC}\s+{NAME}\s+{NAME}"),
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("name heuristic patterns are valid"))
    .collect()
});

/// Returns the first name found by any heuristic pattern.
pub fn guess_client_name(text: &str) -> Option<ExtractedName> {
    PATTERNS.iter().find_map(|re| {
        let caps = re.captures(text)?;
        Some(ExtractedName::new(caps.get(1)?.as_str(), caps.get(2)?.as_str()))
    })
}
