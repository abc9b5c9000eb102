use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::run::sampling::SampleMethod;

/// How conditions and blocks are drawn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SamplingConfig {
    #[serde(default)]
    pub cond_method: SampleMethod,
    #[serde(default)]
    pub block_method: SampleMethod,
    #[serde(default)]
    pub block_factors: Vec<String>,
    #[serde(default = "SamplingConfig::default_seed")]
    pub seed: u64,
    #[serde(default = "SamplingConfig::default_scan_step")]
    pub scan_step: usize,
}

impl SamplingConfig {
    fn default_seed() -> u64 {
        0
    }
    fn default_scan_step() -> usize {
        1
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            cond_method: SampleMethod::default(),
            block_method: SampleMethod::default(),
            block_factors: Vec::new(),
            seed: Self::default_seed(),
            scan_step: Self::default_scan_step(),
        }
    }
}

/// How long the session runs and what gets notified.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SessionConfig {
    /// Repeats each condition must reach per block entry.
    #[serde(default = "SessionConfig::default_cond_repeat")]
    pub cond_repeat: u64,
    /// Times each block is entered.
    #[serde(default = "SessionConfig::default_block_repeat")]
    pub block_repeat: u64,
    /// Parameter series replicated to the notification sink.
    #[serde(default)]
    pub notify_params: Vec<String>,
    /// Completed trials per notification batch; 0 notifies every trial.
    #[serde(default)]
    pub notify_batch: usize,
}

impl SessionConfig {
    fn default_cond_repeat() -> u64 {
        1
    }
    fn default_block_repeat() -> u64 {
        1
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cond_repeat: Self::default_cond_repeat(),
            block_repeat: Self::default_block_repeat(),
            notify_params: Vec::new(),
            notify_batch: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExperimentConfig {
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

impl ExperimentConfig {
    /// Read a config TOML, falling back to defaults when the file is absent
    /// or unparsable.
    pub fn load_or_default(path: &str) -> Self {
        let path_obj = Path::new(path);
        if !path_obj.exists() {
            return Self::default();
        }
        match fs::read_to_string(path_obj) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(cfg) => cfg,
                Err(err) => {
                    eprintln!("Failed to parse config {path}: {err}. Using defaults.");
                    Self::default()
                }
            },
            Err(err) => {
                eprintln!("Failed to read config {path}: {err}. Using defaults.");
                Self::default()
            }
        }
    }
}
