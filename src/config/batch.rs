//! Batch import configuration

use serde::Deserialize;

use crate::domain::reconciliation::{AutoMergePolicy, OverwritePolicy, DEFAULT_AUTO_MERGE_THRESHOLD};

use super::error::ValidationError;

/// Batch auto-merge settings
#[derive(Debug, Clone, Deserialize)]
pub struct BatchConfig {
    /// Minimum confidence for a field to be merged without review
    #[serde(default = "default_threshold")]
    pub auto_merge_threshold: f64,

    /// Whether batch merges may replace data already on file
    #[serde(default)]
    pub overwrite_policy: OverwritePolicy,
}

impl BatchConfig {
    pub fn policy(&self) -> AutoMergePolicy {
        AutoMergePolicy::new(self.auto_merge_threshold, self.overwrite_policy)
    }

    /// Validate batch configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(0.0..=1.0).contains(&self.auto_merge_threshold) {
            return Err(ValidationError::InvalidThreshold);
        }
        Ok(())
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            auto_merge_threshold: default_threshold(),
            overwrite_policy: OverwritePolicy::default(),
        }
    }
}

fn default_threshold() -> f64 {
    DEFAULT_AUTO_MERGE_THRESHOLD
}
