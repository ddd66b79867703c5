//! Tracing setup for the command-line tools.
//!
//! Tool output (readings, tables, `***` error lines) goes to stdout. Log events
//! go to stderr through `tracing-subscriber`, filtered by `RUST_LOG` when set
//! and by the `log_level` setting otherwise.
//!
//! # Example
//! ```no_run
//! use m36_daq::{config::Settings, logging};
//! use tracing::info;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::load()?;
//! logging::init_from_settings(&settings)?;
//! info!("tool started");
//! # Ok(())
//! # }
//! ```

use crate::config::Settings;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize logging from tool settings
pub fn init_from_settings(settings: &Settings) -> Result<(), String> {
    init(parse_log_level(&settings.log_level)?)
}

/// Install a compact stderr subscriber at `level` (`RUST_LOG` overrides it).
///
/// Idempotent: if a global subscriber is already installed this returns
/// `Ok(())`.
pub fn init(level: Level) -> Result<(), String> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_to_filter_string(level)));

    let fmt_layer = fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .or_else(|e| {
            if e.to_string().contains("a global default trace dispatcher has already been set") {
                Ok(())
            } else {
                Err(format!("Failed to initialize tracing: {}", e))
            }
        })
}

/// Parse log level string into tracing Level
fn parse_log_level(level: &str) -> Result<Level, String> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(format!(
            "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
            level
        )),
    }
}

/// Convert Level to env filter string
fn level_to_filter_string(level: Level) -> &'static str {
    match level {
        Level::TRACE => "trace",
        Level::DEBUG => "debug",
        Level::INFO => "info",
        Level::WARN => "warn",
        Level::ERROR => "error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert!(matches!(parse_log_level("trace"), Ok(Level::TRACE)));
        assert!(matches!(parse_log_level("warn"), Ok(Level::WARN)));
        assert!(matches!(parse_log_level("Debug"), Ok(Level::DEBUG)));
        assert!(parse_log_level("invalid").is_err());
    }

    #[test]
    fn test_filter_string_round_trips() {
        for name in ["trace", "debug", "info", "warn", "error"] {
            let level = parse_log_level(name).unwrap();
            assert_eq!(level_to_filter_string(level), name);
        }
    }

    #[test]
    fn test_init_from_settings_rejects_bad_level() {
        let settings = Settings {
            log_level: "loud".to_string(),
            ..Default::default()
        };
        assert!(init_from_settings(&settings).is_err());
    }
}
