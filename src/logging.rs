//! Tracing subscriber setup for binaries
//!
//! The library only emits `tracing` events; front ends call [`init`] once.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LogConfig;
use crate::error::WellnessError;

/// Install a global subscriber writing to stderr
pub fn init(config: &LogConfig) -> Result<(), WellnessError> {
    let filter = EnvFilter::try_new(&config.level)
        .map_err(|e| WellnessError::Config(format!("invalid log level '{}': {}", config.level, e)))?;

    let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };
    result.map_err(|e| WellnessError::Config(format!("logger already initialized: {e}")))
}
