//! AI provider configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::adapters::ai::{AnthropicConfig, AnthropicProvider, OpenAIConfig, OpenAIProvider};
use crate::ports::{AIError, AIProvider};

use super::error::ValidationError;

/// AI provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// OpenAI API key
    pub openai_api_key: Option<Secret<String>>,

    /// Anthropic API key
    pub anthropic_api_key: Option<Secret<String>>,

    /// Provider used for extraction
    #[serde(default = "default_provider")]
    pub provider: AiProvider,

    /// Model override; the provider's default when unset
    pub model: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries on failure
    #[serde(default = "default_retries")]
    pub max_retries: u32,
}

/// AI provider type
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    OpenAI,
    #[default]
    Anthropic,
}

impl AiConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check if OpenAI is configured
    pub fn has_openai(&self) -> bool {
        self.openai_api_key
            .as_ref()
            .is_some_and(|k| !k.expose_secret().is_empty())
    }

    /// Check if Anthropic is configured
    pub fn has_anthropic(&self) -> bool {
        self.anthropic_api_key
            .as_ref()
            .is_some_and(|k| !k.expose_secret().is_empty())
    }

    /// Validate AI configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.has_openai() && !self.has_anthropic() {
            return Err(ValidationError::NoAiProviderConfigured);
        }

        match self.provider {
            AiProvider::OpenAI if !self.has_openai() => {
                return Err(ValidationError::MissingRequired("OPENAI_API_KEY"));
            }
            AiProvider::Anthropic if !self.has_anthropic() => {
                return Err(ValidationError::MissingRequired("ANTHROPIC_API_KEY"));
            }
            _ => {}
        }

        if self.timeout_secs == 0 || self.timeout_secs > 600 {
            return Err(ValidationError::InvalidTimeout);
        }

        Ok(())
    }

    /// Builds the configured provider.
    pub fn build_provider(&self) -> Result<Arc<dyn AIProvider>, AIError> {
        let missing = |name: &str| AIError::InvalidRequest(format!("{} is not set", name));

        match self.provider {
            AiProvider::Anthropic => {
                let key = self
                    .anthropic_api_key
                    .as_ref()
                    .ok_or_else(|| missing("ANTHROPIC_API_KEY"))?;
                let mut config = AnthropicConfig::new(key.expose_secret().as_str())
                    .with_timeout(self.timeout())
                    .with_max_retries(self.max_retries);
                if let Some(model) = &self.model {
                    config = config.with_model(model.as_str());
                }
                Ok(Arc::new(AnthropicProvider::new(config)?))
            }
            AiProvider::OpenAI => {
                let key = self
                    .openai_api_key
                    .as_ref()
                    .ok_or_else(|| missing("OPENAI_API_KEY"))?;
                let mut config = OpenAIConfig::new(key.expose_secret().as_str())
                    .with_timeout(self.timeout())
                    .with_max_retries(self.max_retries);
                if let Some(model) = &self.model {
                    config = config.with_model(model.as_str());
                }
                Ok(Arc::new(OpenAIProvider::new(config)?))
            }
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            anthropic_api_key: None,
            provider: default_provider(),
            model: None,
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
        }
    }
}

fn default_provider() -> AiProvider {
    AiProvider::Anthropic
}

fn default_timeout() -> u64 {
    120
}

fn default_retries() -> u32 {
    3
}
