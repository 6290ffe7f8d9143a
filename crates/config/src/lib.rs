//! Configuration for the receptionist runtime.
//!
//! Two layers, deliberately kept apart:
//! - [`settings`] — process-wide ambient settings (server, observability,
//!   storage backend, feature flags), loaded once at startup.
//! - [`resolver`] — per-tenant dialogue configuration (scenarios, slots,
//!   flows), resolved on demand and cached per spec §3/§9.

pub mod constants;
pub mod defaults;
pub mod resolver;
pub mod scenarios;
pub mod settings;

pub use resolver::{ConfigResolver, ResolverError};
pub use scenarios::{ScenarioResolver, ScenarioResolverError};
pub use settings::{
    load_settings, AuthConfig, FeatureFlags, MatcherConfig, ObservabilityConfig, RateLimitConfig,
    RuntimeEnvironment, ServerConfig, Settings, StoreBackend, StoreConfig, Tier3Config,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Environment error: {0}")]
    Environment(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
