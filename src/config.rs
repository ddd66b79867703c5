//! Tool settings using Figment
//!
//! Settings are loaded from:
//! 1. Built-in defaults
//! 2. `m36.toml` in the working directory, or the file named by `M36_CONFIG`
//! 3. Environment variables prefixed with `M36_` (nested keys use `__`)
//!
//! # Example
//! ```no_run
//! use m36_daq::config::Settings;
//!
//! let settings = Settings::load()?;
//! println!("Loop delay: {:?}", settings.loop_delay());
//! # Ok::<(), figment::Error>(())
//! ```

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default settings file name.
pub const DEFAULT_CONFIG_FILE: &str = "m36.toml";

/// Top-level tool settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Pause after every read, in milliseconds
    pub loop_delay_ms: u64,
    /// Simulated device used for `sim*` device names
    pub simulator: SimulatorSettings,
}

/// Simulated M36 parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorSettings {
    /// Number of input channels (8 differential or 16 single-ended on real boards)
    pub channels: u32,
    /// Type of the simulated input adapter
    pub single_ended: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            loop_delay_ms: 100,
            simulator: SimulatorSettings::default(),
        }
    }
}

impl Default for SimulatorSettings {
    fn default() -> Self {
        Self {
            channels: 8,
            single_ended: false,
        }
    }
}

impl Settings {
    /// Load settings from `M36_CONFIG` (or `m36.toml`) and the environment.
    ///
    /// A missing settings file is not an error; defaults apply.
    pub fn load() -> Result<Self, figment::Error> {
        let path = std::env::var_os("M36_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_from(path)
    }

    /// Load settings from a specific file path plus environment overrides
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("M36_").ignore(&["config"]).split("__"))
            .extract()
    }

    /// Validate settings after loading
    pub fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }

        if self.simulator.channels == 0 {
            return Err("simulator.channels must be at least 1".to_string());
        }

        Ok(())
    }

    /// Pause inserted after every read.
    pub fn loop_delay(&self) -> Duration {
        Duration::from_millis(self.loop_delay_ms)
    }
}
