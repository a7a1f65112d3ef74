//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `FACT_FIND` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use fact_find::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Records stored under {}", config.storage.data_dir.display());
//! ```

mod ai;
mod batch;
mod error;
mod extraction;
mod logging;
mod storage;

pub use ai::{AiConfig, AiProvider};
pub use batch::BatchConfig;
pub use error::{ConfigError, ValidationError};
pub use extraction::ExtractionConfig;
pub use logging::LoggingConfig;
pub use storage::StorageConfig;

use serde::Deserialize;

use crate::ports::ExtractorConfig;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// AI provider configuration (OpenAI/Anthropic)
    #[serde(default)]
    pub ai: AiConfig,

    /// Extraction call settings
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Batch auto-merge settings
    #[serde(default)]
    pub batch: BatchConfig,

    /// Record and transcript storage
    #[serde(default)]
    pub storage: StorageConfig,

    /// Log filter and format
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `FACT_FIND` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `FACT_FIND__AI__PROVIDER=openai` -> `ai.provider = openai`
    /// - `FACT_FIND__BATCH__AUTO_MERGE_THRESHOLD=0.8` -> `batch.auto_merge_threshold = 0.8`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("FACT_FIND")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.ai.validate()?;
        self.extraction.validate()?;
        self.batch.validate()?;
        self.storage.validate()?;
        Ok(())
    }

    /// Per-call extractor settings, including the AI model override.
    pub fn extractor_config(&self) -> ExtractorConfig {
        self.extraction.extractor_config(self.ai.model.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::reconciliation::OverwritePolicy;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: [&str; 6] = [
        "FACT_FIND__AI__ANTHROPIC_API_KEY",
        "FACT_FIND__AI__PROVIDER",
        "FACT_FIND__AI__MODEL",
        "FACT_FIND__BATCH__AUTO_MERGE_THRESHOLD",
        "FACT_FIND__BATCH__OVERWRITE_POLICY",
        "FACT_FIND__STORAGE__DATA_DIR",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("FACT_FIND__AI__ANTHROPIC_API_KEY", "sk-ant-xxx");
        env::set_var("FACT_FIND__AI__MODEL", "claude-3-5-haiku-latest");
        env::set_var("FACT_FIND__BATCH__AUTO_MERGE_THRESHOLD", "0.8");
        env::set_var("FACT_FIND__BATCH__OVERWRITE_POLICY", "preserve_existing");
        env::set_var("FACT_FIND__STORAGE__DATA_DIR", "/var/lib/fact-find");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.ai.provider, AiProvider::Anthropic);
        assert!(config.ai.has_anthropic());
        assert_eq!(config.batch.auto_merge_threshold, 0.8);
        assert_eq!(config.batch.overwrite_policy, OverwritePolicy::PreserveExisting);
        assert_eq!(config.storage.data_dir.to_str(), Some("/var/lib/fact-find"));
        assert_eq!(config.extractor_config().model.as_deref(), Some("claude-3-5-haiku-latest"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_without_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let config = AppConfig::load().unwrap();

        assert_eq!(config.batch.auto_merge_threshold, 0.6);
        assert_eq!(config.batch.overwrite_policy, OverwritePolicy::Always);
        assert_eq!(config.storage.data_dir.to_str(), Some("./data"));
        assert_eq!(config.validate(), Err(ValidationError::NoAiProviderConfigured));
    }

    #[test]
    fn test_provider_selection() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("FACT_FIND__AI__PROVIDER", "openai");
        env::set_var("FACT_FIND__AI__ANTHROPIC_API_KEY", "sk-ant-xxx");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.ai.provider, AiProvider::OpenAI);
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("OPENAI_API_KEY"))
        );
    }
}
