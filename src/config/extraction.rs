//! Extraction call configuration

use serde::Deserialize;

use crate::ports::ExtractorConfig;

use super::error::ValidationError;

/// Settings for the extraction calls made to the AI provider
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    /// Sampling temperature; low values keep extraction literal
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Output token budget for a full extraction
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Transcripts are truncated to this many characters before prompting
    #[serde(default = "default_max_transcript_chars")]
    pub max_transcript_chars: usize,
}

impl ExtractionConfig {
    /// Per-call extractor settings, with an optional model override.
    pub fn extractor_config(&self, model: Option<String>) -> ExtractorConfig {
        ExtractorConfig {
            model,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            max_transcript_chars: self.max_transcript_chars,
        }
    }

    /// Validate extraction configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ValidationError::InvalidTemperature);
        }
        if self.max_tokens == 0 {
            return Err(ValidationError::MustBePositive("max_tokens"));
        }
        if self.max_transcript_chars == 0 {
            return Err(ValidationError::MustBePositive("max_transcript_chars"));
        }
        Ok(())
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            max_transcript_chars: default_max_transcript_chars(),
        }
    }
}

fn default_temperature() -> f32 {
    0.1
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_max_transcript_chars() -> usize {
    100_000
}
