//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → BffConfig (validated, immutable)
//!     → copied into the HTTP server and upstream client at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{parse_config, resolve_config, ConfigError};
pub use schema::BffConfig;
pub use schema::ListenerConfig;
pub use schema::LimitsConfig;
pub use schema::LogFormat;
pub use schema::ObservabilityConfig;
pub use schema::ServiceConfig;
pub use schema::ServicesConfig;
pub use schema::TimeoutConfig;
