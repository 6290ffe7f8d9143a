//! ScyllaDB client and connection management.

use crate::error::StoreError;
use crate::schema;
use scylla::{Session, SessionBuilder};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct ScyllaConfig {
    pub hosts: Vec<String>,
    pub keyspace: String,
    pub replication_factor: u8,
    /// Matches `StoreConfig.call_state_ttl_seconds` -- the TTL applied to
    /// `call_state` rows so an abandoned call's state ages out rather than
    /// being retained forever.
    pub call_state_ttl_seconds: u64,
}

impl Default for ScyllaConfig {
    fn default() -> Self {
        let hosts = std::env::var("SCYLLA_HOSTS")
            .map(|s| s.split(',').map(|h| h.trim().to_string()).collect())
            .unwrap_or_else(|_| vec!["127.0.0.1:9042".to_string()]);

        let keyspace = std::env::var("SCYLLA_KEYSPACE").unwrap_or_else(|_| "frontdesk".to_string());

        Self {
            hosts,
            keyspace,
            replication_factor: 1,
            call_state_ttl_seconds: 86_400,
        }
    }
}

#[derive(Clone)]
pub struct ScyllaClient {
    session: Arc<Session>,
    config: ScyllaConfig,
}

impl ScyllaClient {
    pub async fn connect(config: ScyllaConfig) -> Result<Self, StoreError> {
        tracing::info!(hosts = ?config.hosts, keyspace = %config.keyspace, "connecting to ScyllaDB");

        let session = SessionBuilder::new().known_nodes(&config.hosts).build().await?;

        Ok(Self {
            session: Arc::new(session),
            config,
        })
    }

    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        schema::create_keyspace(&self.session, &self.config.keyspace, self.config.replication_factor).await?;
        schema::create_tables(&self.session, &self.config.keyspace, self.config.call_state_ttl_seconds).await?;
        tracing::info!(keyspace = %self.config.keyspace, "schema ensured");
        Ok(())
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn keyspace(&self) -> &str {
        &self.config.keyspace
    }
}
