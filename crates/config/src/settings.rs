//! Process-wide settings: the ambient stack (server, observability, feature
//! flags, storage backend) as opposed to per-tenant dialogue configuration,
//! which lives in [`crate::resolver`].

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants::{endpoints, timeouts};
use crate::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    #[default]
    Development,
    Staging,
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Top-level settings, loaded once at process start via [`load_settings`].
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub features: FeatureFlags,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub matcher: MatcherConfig,

    #[serde(default)]
    pub tier3: Tier3Config,

    /// Directory containing one tenant config file per tenant (spec §3,
    /// resolved by [`crate::resolver`]).
    #[serde(default = "default_tenant_config_dir")]
    pub tenant_config_dir: String,
}

fn default_tenant_config_dir() -> String {
    "config/tenants".to_string()
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_store()?;
        self.validate_matcher()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        let server = &self.server;

        if server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        if server.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.max_connections".to_string(),
                message: "Max connections must be at least 1".to_string(),
            });
        }

        if server.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.timeout_seconds".to_string(),
                message: "Timeout must be at least 1 second".to_string(),
            });
        }

        let rate_limit = &server.rate_limit;
        if rate_limit.enabled {
            if rate_limit.requests_per_second == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "server.rate_limit.requests_per_second".to_string(),
                    message: "Must be at least 1 when rate limiting is enabled".to_string(),
                });
            }
            if rate_limit.burst_multiplier < 1.0 {
                return Err(ConfigError::InvalidValue {
                    field: "server.rate_limit.burst_multiplier".to_string(),
                    message: format!("Must be at least 1.0, got {}", rate_limit.burst_multiplier),
                });
            }
        }

        if self.environment.is_production() && server.auth.enabled && server.auth.api_key.is_none()
        {
            return Err(ConfigError::InvalidValue {
                field: "server.auth.api_key".to_string(),
                message: "API key must be set when auth is enabled in production".to_string(),
            });
        }

        if self.environment.is_production() && server.cors_enabled && server.cors_origins.is_empty()
        {
            tracing::warn!(
                "CORS is enabled in production but no origins are configured; \
                 this may block legitimate callers"
            );
        }

        Ok(())
    }

    fn validate_store(&self) -> Result<(), ConfigError> {
        if let StoreBackend::Scylla = self.store.backend {
            if self.store.scylla_hosts.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "store.scylla_hosts".to_string(),
                    message: "at least one host is required for the scylla backend".to_string(),
                });
            }
        }
        Ok(())
    }

    fn validate_matcher(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.matcher.default_min_confidence) {
            return Err(ConfigError::InvalidValue {
                field: "matcher.default_min_confidence".to_string(),
                message: format!(
                    "must be between 0.0 and 1.0, got {}",
                    self.matcher.default_min_confidence
                ),
            });
        }
        if self.matcher.tier2_top_k == 0 {
            return Err(ConfigError::InvalidValue {
                field: "matcher.tier2_top_k".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
    #[serde(default)]
    pub cors_origins: Vec<String>,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_max_connections() -> usize {
    1000
}
fn default_timeout() -> u64 {
    30
}
fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_connections: default_max_connections(),
            timeout_seconds: default_timeout(),
            cors_enabled: default_true(),
            cors_origins: Vec::new(),
            rate_limit: RateLimitConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Set via `FRONTDESK__SERVER__AUTH__API_KEY`, never in a committed file.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_public_paths")]
    pub public_paths: Vec<String>,
}

fn default_public_paths() -> Vec<String> {
    vec!["/health".to_string(), "/ready".to_string(), "/metrics".to_string()]
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            public_paths: default_public_paths(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
    #[serde(default = "default_burst_multiplier")]
    pub burst_multiplier: f32,
}

fn default_requests_per_second() -> u32 {
    50
}
fn default_burst_multiplier() -> f32 {
    2.0
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_second: default_requests_per_second(),
            burst_multiplier: default_burst_multiplier(),
        }
    }
}

/// Pluggable call-state store backend (supplemental feature, grounded on the
/// teacher's `SessionStore` trait — see `frontdesk-store`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    InMemory,
    Scylla,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default = "default_scylla_hosts")]
    pub scylla_hosts: Vec<String>,
    #[serde(default = "default_scylla_keyspace")]
    pub keyspace: String,
    #[serde(default = "default_ttl_seconds")]
    pub call_state_ttl_seconds: u64,
    #[serde(default = "default_journal_capacity")]
    pub journal_buffer_capacity: usize,
}

fn default_scylla_hosts() -> Vec<String> {
    std::env::var("SCYLLA_HOSTS")
        .map(|s| s.split(',').map(|h| h.trim().to_string()).collect())
        .unwrap_or_else(|_| vec!["127.0.0.1:9042".to_string()])
}

fn default_scylla_keyspace() -> String {
    std::env::var("SCYLLA_KEYSPACE").unwrap_or_else(|_| "frontdesk".to_string())
}

fn default_ttl_seconds() -> u64 {
    // Call state outlives the call by a margin to survive a brief
    // reconnect; beyond this the store is free to evict (spec §3).
    4 * 3600
}

fn default_journal_capacity() -> usize {
    1024
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            scylla_hosts: default_scylla_hosts(),
            keyspace: default_scylla_keyspace(),
            call_state_ttl_seconds: default_ttl_seconds(),
            journal_buffer_capacity: default_journal_capacity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherConfig {
    #[serde(default = "default_min_confidence")]
    pub default_min_confidence: f32,
    #[serde(default = "default_tier2_top_k")]
    pub tier2_top_k: usize,
    /// Filesystem path for the tantivy (Tier-2) index. Rebuilt from tenant
    /// scenarios on config reload.
    #[serde(default = "default_index_dir")]
    pub tantivy_index_dir: String,
}

fn default_min_confidence() -> f32 {
    crate::constants::matcher::DEFAULT_MIN_CONFIDENCE
}
fn default_tier2_top_k() -> usize {
    crate::constants::matcher::TIER2_TOP_K
}
fn default_index_dir() -> String {
    "data/tantivy".to_string()
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            default_min_confidence: default_min_confidence(),
            tier2_top_k: default_tier2_top_k(),
            tantivy_index_dir: default_index_dir(),
        }
    }
}

/// Optional Tier-3 remote LLM backend (spec §4.3 Tier-3, disabled by
/// default — matching never *requires* it).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tier3Config {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_tier3_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_llm_endpoint() -> String {
    endpoints::LLM_DEFAULT.clone()
}
fn default_llm_model() -> String {
    "llama3".to_string()
}
fn default_tier3_timeout_ms() -> u64 {
    timeouts::TIER3_REQUEST_MS
}

impl Default for Tier3Config {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_llm_endpoint(),
            api_key: None,
            model: default_llm_model(),
            timeout_ms: default_tier3_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_json: bool,
    #[serde(default = "default_true")]
    pub tracing_enabled: bool,
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_metrics_port() -> u16 {
    9090
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            tracing_enabled: true,
            otlp_endpoint: None,
            metrics_enabled: true,
            metrics_port: default_metrics_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureFlags {
    /// Whether the orchestrator may fall through to Tier-3 at all; the
    /// per-request deadline (spec §4.3, §7 `DeadlineBreached`) still bounds
    /// it even when enabled.
    #[serde(default)]
    pub tier3_fallback_enabled: bool,
    #[serde(default = "default_true")]
    pub event_journal_enabled: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            tier3_fallback_enabled: false,
            event_journal_enabled: true,
        }
    }
}

/// Loads settings from `config/default.{yaml,toml}`, an optional
/// `config/{env}` overlay, then `FRONTDESK__`-prefixed environment
/// variables, in that priority order (lowest to highest).
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("FRONTDESK")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.server.port, 8080);
    }

    #[test]
    fn scylla_backend_requires_hosts() {
        let mut settings = Settings::default();
        settings.store.backend = StoreBackend::Scylla;
        settings.store.scylla_hosts = Vec::new();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn production_auth_requires_api_key() {
        let mut settings = Settings::default();
        settings.environment = RuntimeEnvironment::Production;
        settings.server.auth.enabled = true;
        assert!(settings.validate().is_err());
        settings.server.auth.api_key = Some("secret".to_string());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn matcher_confidence_out_of_range_is_rejected() {
        let mut settings = Settings::default();
        settings.matcher.default_min_confidence = 1.5;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn rate_limit_requires_positive_rate_when_enabled() {
        let mut settings = Settings::default();
        settings.server.rate_limit.enabled = true;
        settings.server.rate_limit.requests_per_second = 0;
        assert!(settings.validate().is_err());
    }
}
