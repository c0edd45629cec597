//! Configuration for filter/sort URL synchronization

use crate::error::ConfigError;
use pipelines_common::UpdateStrategy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_DEBOUNCE_MS: u64 = 300;
pub const DEFAULT_FILTER_PARAM_KEY: &str = "filter";
pub const DEFAULT_SORT_PARAM_KEY: &str = "sort";

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

fn default_filter_param_key() -> String {
    DEFAULT_FILTER_PARAM_KEY.to_string()
}

fn default_sort_param_key() -> String {
    DEFAULT_SORT_PARAM_KEY.to_string()
}

/// YAML-loadable settings for a filters/sort manager.
///
/// Every field has a default, so an empty document is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiltersSortConfig {
    /// Quiet period before a browser URL write, in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Strategy used when a mutation asks for a browser URL update
    #[serde(default)]
    pub update_strategy: UpdateStrategy,
    /// Query parameter holding the filter projection
    #[serde(default = "default_filter_param_key")]
    pub filter_param_key: String,
    /// Query parameter holding the sort projection
    #[serde(default = "default_sort_param_key")]
    pub sort_param_key: String,
}

impl Default for FiltersSortConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            update_strategy: UpdateStrategy::default(),
            filter_param_key: default_filter_param_key(),
            sort_param_key: default_sort_param_key(),
        }
    }
}

impl FiltersSortConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file on disk.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&yaml)?;
        info!(
            "Loaded filters/sort config from {} (debounce {}ms, {:?})",
            path.display(),
            config.debounce_ms,
            config.update_strategy
        );
        Ok(config)
    }

    /// Both projections share one query string, so their keys must differ.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.filter_param_key.is_empty() || self.sort_param_key.is_empty() {
            return Err(ConfigError::Config(
                "query parameter keys must not be empty".to_string(),
            ));
        }
        if self.filter_param_key == self.sort_param_key {
            return Err(ConfigError::Config(format!(
                "filter and sort parameter keys must differ (both are '{}')",
                self.filter_param_key
            )));
        }
        Ok(())
    }
}
