//! Engine configuration.
//!
//! Every knob has a default matching the ETD sunburst chart, so an absent
//! or partial TOML file is fine. Command-line flags override file values.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SunburstError};
use crate::hierarchy::RebalanceConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Name given to the root when no filter is active.
    pub root_label: String,
    /// Degree names are compared on this many leading characters.
    pub filter_key_len: usize,
    /// Rings rendered at once below the zoom center.
    pub max_visible_depth: usize,
    pub rebalance: RebalanceConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            root_label: "All Theses".to_string(),
            filter_key_len: 32,
            max_visible_depth: 2,
            rebalance: RebalanceConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| SunburstError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.filter_key_len == 0 {
            return Err(SunburstError::InvalidConfig(
                "filter_key_len must be at least 1".to_string(),
            ));
        }
        if self.max_visible_depth == 0 {
            return Err(SunburstError::InvalidConfig(
                "max_visible_depth must be at least 1".to_string(),
            ));
        }
        self.rebalance.validate()
    }
}
