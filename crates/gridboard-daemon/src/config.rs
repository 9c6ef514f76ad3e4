//! Configuration loading and validation

use anyhow::{Context, Result};
use gridboard_core::OrchestratorConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub budget: BudgetConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Time between cycles in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Full registry rescan interval in seconds (also rediscovers panels)
    #[serde(default = "default_registry_ttl")]
    pub registry_ttl_secs: u64,
    /// Stop after this many cycles (0 runs until interrupted)
    #[serde(default)]
    pub max_cycles: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            registry_ttl_secs: default_registry_ttl(),
            max_cycles: 0,
        }
    }
}

fn default_interval_ms() -> u64 {
    1666 // One cycle per 100 ticks at 60 Hz
}

fn default_registry_ttl() -> u64 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Path to the world fixture (JSON)
    #[serde(default = "default_world_path")]
    pub path: String,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            path: default_world_path(),
        }
    }
}

fn default_world_path() -> String {
    "./world.json".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory that mirrors every panel's text
    #[serde(default = "default_output_dir")]
    pub dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> String {
    "./panels".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Per-cycle instruction ceiling (0 disables the check)
    #[serde(default = "default_instruction_limit")]
    pub instruction_limit: u64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            instruction_limit: default_instruction_limit(),
        }
    }
}

fn default_instruction_limit() -> u64 {
    50_000
}

impl Config {
    pub fn to_orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            registry_ttl: Duration::from_secs(self.scheduler.registry_ttl_secs),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.scheduler.interval_ms.max(1))
    }

    pub fn budget_limit(&self) -> Option<u64> {
        match self.budget.instruction_limit {
            0 => None,
            limit => Some(limit),
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}

/// Save default configuration to file
pub fn save_default_config(path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(&Config::default())?;
    std::fs::write(path, content)?;
    Ok(())
}
