//! Percentage value object (0-100 scale).

use serde::{Deserialize, Serialize};
use std::fmt;

/// A value between 0 and 100 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Percentage(u8);

impl Percentage {
    /// Zero percent.
    pub const ZERO: Self = Self(0);

    /// One hundred percent.
    pub const HUNDRED: Self = Self(100);

    /// Creates a new Percentage, clamping to valid range.
    pub fn new(value: u8) -> Self {
        Self(value.min(100))
    }

    /// Rounds a fractional score to the nearest whole percent.
    ///
    /// NaN and negative scores become zero; anything above 100 clamps.
    pub fn from_score(score: f64) -> Self {
        if score.is_nan() || score <= 0.0 {
            return Self::ZERO;
        }
        Self(score.round().min(100.0) as u8)
    }

    /// Returns the value as u8.
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl Default for Percentage {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_new_clamps_to_100() {
        assert_eq!(Percentage::new(100).value(), 100);
        assert_eq!(Percentage::new(101).value(), 100);
    }

    #[test]
    fn from_score_rounds_to_nearest() {
        assert_eq!(Percentage::from_score(42.4).value(), 42);
        assert_eq!(Percentage::from_score(42.5).value(), 43);
        assert_eq!(Percentage::from_score(99.9).value(), 100);
    }

    #[test]
    fn from_score_clamps_out_of_range() {
        assert_eq!(Percentage::from_score(-3.0), Percentage::ZERO);
        assert_eq!(Percentage::from_score(f64::NAN), Percentage::ZERO);
        assert_eq!(Percentage::from_score(250.0), Percentage::HUNDRED);
    }

    #[test]
    fn percentage_displays_correctly() {
        assert_eq!(format!("{}", Percentage::new(75)), "75%");
    }

    #[test]
    fn percentage_serializes_as_plain_number() {
        let json = serde_json::to_string(&Percentage::new(42)).unwrap();
        assert_eq!(json, "42");
        let pct: Percentage = serde_json::from_str("75").unwrap();
        assert_eq!(pct.value(), 75);
    }
}
