//! Configuration loading from files (std only).

use std::fs;
use std::path::Path;

use crate::error::{ConfigError, Error, Result};

use super::MachineConfig;

/// Load configuration from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
///
/// ```rust,ignore
/// use cartesian_motion::load_config;
///
/// let config = load_config("machine.toml")?;
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<MachineConfig> {
    let content = fs::read_to_string(path.as_ref()).map_err(|e| {
        let msg = heapless::String::try_from(e.to_string().as_str()).unwrap_or_default();
        Error::Config(ConfigError::IoError(msg))
    })?;

    parse_config(&content)
}

/// Parse configuration from a TOML string.
///
/// # Errors
///
/// Returns an error if the TOML is invalid or fails validation.
pub fn parse_config(content: &str) -> Result<MachineConfig> {
    let config: MachineConfig = toml::from_str(content).map_err(|e| {
        let msg = heapless::String::try_from(e.message()).unwrap_or_default();
        Error::Config(ConfigError::ParseError(msg))
    })?;

    // Validate the configuration
    super::validation::validate_config(&config)?;

    Ok(config)
}
