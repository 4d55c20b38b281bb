//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check upstream URLs are reachable with the plain HTTP client
//! - Validate value ranges (timeouts > 0, limits > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BffConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use url::Url;

use crate::config::schema::BffConfig;
use crate::upstream::Service;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validate a parsed configuration, collecting every error found.
pub fn validate_config(config: &BffConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !is_bind_address(&config.listener.bind_address) {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a host:port address", config.listener.bind_address),
        ));
    }

    for service in Service::ALL {
        let field = format!("services.{}.url", service.config_key());
        let raw = &config.services.get(service).url;
        match Url::parse(raw) {
            Ok(url) => {
                if url.scheme() != "http" {
                    errors.push(ValidationError::new(
                        field,
                        format!("scheme '{}' is not supported, use http", url.scheme()),
                    ));
                } else if url.host_str().is_none() {
                    errors.push(ValidationError::new(field, "missing host"));
                }
            }
            Err(e) => errors.push(ValidationError::new(field, format!("invalid URL '{}': {}", raw, e))),
        }
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::new("timeouts.connect_secs", "must be greater than 0"));
    }
    if config.timeouts.upstream_secs == Some(0) {
        errors.push(ValidationError::new(
            "timeouts.upstream_secs",
            "must be greater than 0 (omit it to disable the deadline)",
        ));
    }

    if config.limits.max_fragment_bytes == 0 {
        errors.push(ValidationError::new("limits.max_fragment_bytes", "must be greater than 0"));
    }

    if config.observability.log_level.trim().is_empty() {
        errors.push(ValidationError::new("observability.log_level", "must not be empty"));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// `ip:port`, `[v6]:port` or `name:port`. Names are resolved at bind time.
fn is_bind_address(addr: &str) -> bool {
    if addr.parse::<SocketAddr>().is_ok() {
        return true;
    }
    match addr.rsplit_once(':') {
        Some((host, port)) => {
            !host.is_empty()
                && !host.contains(':')
                && !host.contains(char::is_whitespace)
                && port.parse::<u16>().is_ok()
        }
        None => false,
    }
}
