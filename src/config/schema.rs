//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::upstream::Service;

/// Root configuration for the backend-for-frontend gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BffConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream service endpoints.
    pub services: ServicesConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Size limits for buffered upstream bodies.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:10115").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:10115".to_string(),
        }
    }
}

/// Endpoint table for the three upstream services.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServicesConfig {
    pub phrase_picker: ServiceConfig,
    pub image_picker: ServiceConfig,
    pub meminator: ServiceConfig,
}

impl ServicesConfig {
    /// Endpoint configured for a logical service.
    pub fn get(&self, service: Service) -> &ServiceConfig {
        match service {
            Service::PhrasePicker => &self.phrase_picker,
            Service::ImagePicker => &self.image_picker,
            Service::Meminator => &self.meminator,
        }
    }
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            phrase_picker: ServiceConfig::new("http://phrase-picker:10117/phrase"),
            image_picker: ServiceConfig::new("http://image-picker:10118/imageUrl"),
            meminator: ServiceConfig::new("http://meminator:10116/applyPhraseToPicture"),
        }
    }
}

/// A single upstream endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Full URL the service is reached at (http only).
    pub url: String,
}

impl ServiceConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Timeout configuration for upstream calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Deadline for an upstream call to produce response headers, in seconds.
    /// Unset means calls wait indefinitely.
    pub upstream_secs: Option<u64>,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            upstream_secs: None,
        }
    }
}

/// Limits on what the gateway buffers in memory.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum size of a phrase/image fragment body in bytes.
    pub max_fragment_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_fragment_bytes: 1024 * 1024,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter directive (trace, debug, info, warn, error, or a full EnvFilter string).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
