//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::BffConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<BffConfig, ConfigError> {
    let config = deserialize(content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Startup configuration: the file (or defaults), then the bind override,
/// validated as a whole.
pub fn resolve_config(path: Option<&Path>, bind: Option<String>) -> Result<BffConfig, ConfigError> {
    let mut config = match path {
        Some(path) => deserialize(&fs::read_to_string(path).map_err(ConfigError::Io)?)?,
        None => BffConfig::default(),
    };
    if let Some(bind) = bind {
        config.listener.bind_address = bind;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn deserialize(content: &str) -> Result<BffConfig, ConfigError> {
    toml::from_str(content).map_err(ConfigError::Parse)
}
