//! Simulation settings loading.
//!
//! Every setting has a sensible default, so a settings file is optional.
//! The expected YAML structure is:
//! ```yaml
//! workload: processes.txt
//! tick_ms: 100
//! pool_size: 1024
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::info;

use crate::memory;

/// Simulation settings.
///
/// Loaded from YAML with [`SimConfig::load`], or defaulted entirely when no
/// settings file is given.  CLI flags override individual fields after
/// loading.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    /// Workload file consumed by `run`.
    pub workload: PathBuf,

    /// Wall-clock milliseconds per simulated tick.
    pub tick_ms: u64,

    /// Memory pool size in bytes (power of two, at least one minimum
    /// block).
    pub pool_size: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            workload: PathBuf::from("processes.txt"),
            tick_ms: 100,
            pool_size: memory::POOL_SIZE,
        }
    }
}

impl SimConfig {
    /// Parse `path` into a settings value.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened, the YAML is
    /// structurally invalid, or the memory geometry is not power-of-two.
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading simulation settings from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open settings file: {}", path.display()))?;

        let config: SimConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject memory geometry the buddy allocator cannot represent.
    pub fn validate(&self) -> Result<()> {
        if !self.pool_size.is_power_of_two() || self.pool_size < memory::MIN_BLOCK {
            bail!(
                "pool_size must be a power of two of at least {} bytes, got {}",
                memory::MIN_BLOCK,
                self.pool_size
            );
        }
        if self.tick_ms == 0 {
            bail!("tick_ms must be at least 1");
        }
        Ok(())
    }

    /// Wall-clock duration of one simulated tick.
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// How often the engine and generator poll between ticks: a tenth of a
    /// tick, floored at 1 ms so a fast clock still gets drained promptly.
    pub fn poll_period(&self) -> Duration {
        Duration::from_millis((self.tick_ms / 10).max(1))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
