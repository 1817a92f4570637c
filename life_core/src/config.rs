// config.rs - YAML configuration with per-field defaults
// Everything is optional: a 50x50 board, a two second rest period and five
// speed multipliers starting at 1.0 fill whatever the file leaves out.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use crate::driver::{DEFAULT_BASE_PERIOD, DEFAULT_SPEED_INDEX, DEFAULT_SPEED_OPTIONS, SpeedControl};
use crate::engine::MAX_GRID_SIZE;
use crate::error::LifeError;
use crate::grid::EdgePolicy;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LifeConfig {
    /// Board settings.
    #[serde(default)]
    pub grid: GridConfig,

    /// Tick scheduling settings.
    #[serde(default)]
    pub driver: DriverConfig,
}

impl LifeConfig {
    /// Load configuration from a YAML file at the given path.
    pub fn from_file(path: &Path) -> Result<Self, LifeError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, LifeError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`from_file`](Self::from_file), but a missing file yields defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, LifeError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            info!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), LifeError> {
        if self.grid.size == 0 {
            return Err(LifeError::invalid("grid.size must be positive"));
        }
        if self.grid.size > MAX_GRID_SIZE {
            return Err(LifeError::invalid(format!(
                "grid.size {} exceeds {MAX_GRID_SIZE}",
                self.grid.size
            )));
        }
        if self.driver.base_period_ms == 0 {
            return Err(LifeError::invalid("driver.base_period_ms must be positive"));
        }
        self.driver.speed_control().map(|_| ())
    }
}

/// Board configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GridConfig {
    /// Number of cells along each side.
    #[serde(default = "default_size")]
    pub size: usize,

    /// Neighbor filter at the board edges.
    #[serde(default)]
    pub edge_policy: EdgePolicy,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size: default_size(),
            edge_policy: EdgePolicy::default(),
        }
    }
}

/// Tick driver configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DriverConfig {
    /// Rest period between steps at a 1.0 multiplier.
    #[serde(default = "default_base_period_ms")]
    pub base_period_ms: u64,

    /// Selectable rate multipliers, slowest first.
    #[serde(default = "default_speed_options")]
    pub speed_options: Vec<f64>,

    /// Index into `speed_options` used at startup.
    #[serde(default = "default_speed_index")]
    pub initial_speed_index: usize,
}

impl DriverConfig {
    pub const fn base_period(&self) -> Duration {
        Duration::from_millis(self.base_period_ms)
    }

    pub fn speed_control(&self) -> Result<SpeedControl, LifeError> {
        SpeedControl::new(self.speed_options.clone(), self.initial_speed_index)
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            base_period_ms: default_base_period_ms(),
            speed_options: default_speed_options(),
            initial_speed_index: default_speed_index(),
        }
    }
}

const fn default_size() -> usize {
    50
}

fn default_base_period_ms() -> u64 {
    u64::try_from(DEFAULT_BASE_PERIOD.as_millis()).unwrap_or(2000)
}

fn default_speed_options() -> Vec<f64> {
    DEFAULT_SPEED_OPTIONS.to_vec()
}

const fn default_speed_index() -> usize {
    DEFAULT_SPEED_INDEX
}
