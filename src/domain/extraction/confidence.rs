//! Confidence-annotated extracted values.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Model-reported certainty in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Confidence(f64);

impl Confidence {
    pub const NONE: Self = Self(0.0);
    pub const CERTAIN: Self = Self(1.0);

    /// Creates a confidence, clamping into [0, 1]. NaN becomes zero.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self::NONE;
        }
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// True when this confidence reaches `threshold` (inclusive).
    pub fn meets(&self, threshold: f64) -> bool {
        self.0 >= threshold
    }
}

impl From<f64> for Confidence {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<Confidence> for f64 {
    fn from(c: Confidence) -> Self {
        c.0
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// One extracted fact and how sure the extractor was of it.
///
/// A `null` value means the extractor explicitly reported the field as
/// unknown. Such values are never written and never conflict, whatever
/// their confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceValue {
    pub value: Value,
    pub confidence: Confidence,
}

impl ConfidenceValue {
    pub fn new(value: impl Into<Value>, confidence: f64) -> Self {
        Self {
            value: value.into(),
            confidence: Confidence::new(confidence),
        }
    }

    /// True when the extractor produced an actual value.
    pub fn is_known(&self) -> bool {
        !self.value.is_null()
    }

    /// True when the value is known and its confidence reaches `threshold`.
    pub fn accepted_at(&self, threshold: f64) -> bool {
        self.is_known() && self.confidence.meets(threshold)
    }
}
