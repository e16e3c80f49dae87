//! Configuration handling for the dpcompare CLI
//!
//! Supports loading configuration from dpcompare.toml files with CLI argument overrides.

use anyhow::{Context, Result};
use dpcompare_core::CompareMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub compare: CompareConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompareConfig {
    /// Expected error rate of the fragments
    #[serde(default = "default_erate")]
    pub erate: f64,

    /// Probability cutoff for the per-length difference thresholds
    #[serde(default = "default_thresh")]
    pub thresh: f64,

    /// Minimum overlap length
    #[serde(default = "default_minlen")]
    pub minlen: i64,

    /// Comparison mode
    #[serde(default)]
    pub mode: CompareMode,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Print results as JSON
    #[serde(default)]
    pub json: bool,

    /// Print the alignment picture when a trace is available
    #[serde(default)]
    pub show_alignment: bool,
}

// Default value functions
fn default_erate() -> f64 { 0.06 }
fn default_thresh() -> f64 { 1e-6 }
fn default_minlen() -> i64 { 40 }

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            erate: default_erate(),
            thresh: default_thresh(),
            minlen: default_minlen(),
            mode: CompareMode::default(),
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => {
                log::info!("Loading configuration from: {}", path.display());
                Self::load_from_file(path)?
            }
            None => {
                let default_path = PathBuf::from("dpcompare.toml");
                if default_path.exists() {
                    log::info!("Loading configuration from: dpcompare.toml");
                    Self::load_from_file(&default_path)?
                } else {
                    log::debug!("Using default configuration");
                    Self::default()
                }
            }
        };

        Ok(config)
    }

    /// Load configuration from a specific TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse configuration file: {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write configuration file: {}", path.display()))?;

        Ok(())
    }

    /// Generate example configuration file content
    pub fn example_toml() -> Result<String> {
        toml::to_string_pretty(&Self::default())
            .context("Failed to serialize default configuration")
    }
}
