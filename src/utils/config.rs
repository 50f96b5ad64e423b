//! Configuration management
//!
//! This module handles loading and managing configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::encoding::{EncodingScheme, SchemeSpec};
use crate::error::Result;
use crate::model::ClassifierConfig;
use crate::training::TrainingConfig;

/// One encoding channel as written in the config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub scheme: EncodingScheme,
    /// Scheme default when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u8>,
}

impl ChannelConfig {
    pub fn to_spec(&self) -> Result<SchemeSpec> {
        match self.precision {
            Some(p) => SchemeSpec::new(self.scheme, p),
            None => Ok(SchemeSpec::with_default(self.scheme)),
        }
    }
}

/// Encoding configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingConfig {
    /// Prefix tokens with their scheme tag so code spaces cannot collide
    pub namespace_tokens: bool,
    pub channels: Vec<ChannelConfig>,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            namespace_tokens: true,
            channels: EncodingScheme::ALL
                .iter()
                .map(|&scheme| ChannelConfig {
                    scheme,
                    precision: Some(scheme.default_precision()),
                })
                .collect(),
        }
    }
}

impl EncodingConfig {
    /// Validated channel specs, in order
    pub fn specs(&self) -> Result<Vec<SchemeSpec>> {
        self.channels.iter().map(ChannelConfig::to_spec).collect()
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub encoding: EncodingConfig,
    pub model: ClassifierConfig,
    pub training: TrainingConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.encoding.specs()?;
        config.training.validate()?;
        Ok(config)
    }

    /// Load configuration from file or use default
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
