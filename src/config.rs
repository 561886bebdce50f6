use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchedulerError};
use crate::types::StageOptions;

/// Configuration for the batch scheduler.
///
/// Use [`SchedulerConfig::builder()`] for ergonomic construction,
/// [`SchedulerConfig::load()`] to read a TOML file, or
/// [`SchedulerConfig::default()`] for sensible defaults.
///
/// Every field is optional in TOML:
///
/// ```toml
/// auto_process_queue = true
/// default_page_estimate_ms = 2500
///
/// [default_recognition_options]
/// language = "ja"
///
/// [default_translation_options]
/// target_language = "en"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Start the next pending batch automatically when one completes.
    pub auto_process_queue: bool,

    /// Per-page duration assumed before any page has completed.
    pub default_page_estimate_ms: u64,

    /// Finished tasks a running batch needs before its own pace is used for
    /// remaining-time estimates.
    pub remaining_estimate_min_samples: usize,

    // Tables stay after scalars so the struct serializes to valid TOML.
    /// Recognition options every task starts from; batch-level options override them.
    pub default_recognition_options: StageOptions,

    /// Translation options every task starts from; batch-level options override them.
    pub default_translation_options: StageOptions,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            auto_process_queue: false,
            // 2s recognition + 1s translation
            default_page_estimate_ms: 3000,
            remaining_estimate_min_samples: 2,
            default_recognition_options: StageOptions::new(),
            default_translation_options: StageOptions::new(),
        }
    }
}

impl SchedulerConfig {
    /// Start building a config with the builder pattern.
    pub fn builder() -> SchedulerConfigBuilder {
        SchedulerConfigBuilder::default()
    }

    /// Parse a config from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(data: &str) -> Result<Self> {
        toml::from_str(data).map_err(|e| SchedulerError::Config(e.to_string()))
    }

    /// Read and parse a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .map_err(|e| SchedulerError::Config(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_toml_str(&data)?;
        tracing::debug!(path = %path.display(), "loaded scheduler config");
        Ok(config)
    }

    /// Render the config as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| SchedulerError::Config(e.to_string()))
    }
}

/// Builder for [`SchedulerConfig`].
#[derive(Default)]
pub struct SchedulerConfigBuilder {
    config: SchedulerConfig,
}

impl SchedulerConfigBuilder {
    /// Set the default recognition options.
    pub fn with_recognition_options(mut self, options: StageOptions) -> Self {
        self.config.default_recognition_options = options;
        self
    }

    /// Set the default translation options.
    pub fn with_translation_options(mut self, options: StageOptions) -> Self {
        self.config.default_translation_options = options;
        self
    }

    /// Chain straight into the next pending batch after a completion.
    pub fn with_auto_process_queue(mut self, enabled: bool) -> Self {
        self.config.auto_process_queue = enabled;
        self
    }

    /// Set the per-page estimate used before any page has completed.
    pub fn with_default_page_estimate_ms(mut self, ms: u64) -> Self {
        self.config.default_page_estimate_ms = ms;
        self
    }

    /// Set how many finished tasks a batch needs before its own pace drives
    /// remaining-time estimates.
    pub fn with_remaining_estimate_min_samples(mut self, samples: usize) -> Self {
        self.config.remaining_estimate_min_samples = samples;
        self
    }

    /// Build the final [`SchedulerConfig`].
    pub fn build(self) -> SchedulerConfig {
        self.config
    }
}
