//! Call state store (spec §4.11) and event journal (spec §4.12) for
//! frontdesk. Backed by ScyllaDB in production, an in-process map in tests
//! and single-node deployments.

pub mod client;
pub mod error;
pub mod journal;
pub mod lock;
pub mod schema;
pub mod state;

pub use client::{ScyllaClient, ScyllaConfig};
pub use error::StoreError;
pub use journal::{EventJournal, InMemoryEventJournal, ScyllaEventJournal};
pub use lock::CallLockTable;
pub use state::{InMemoryStateStore, ScyllaStateStore, StateStore};

/// Connects to ScyllaDB, ensures the keyspace/tables exist, and returns the
/// state store and event journal wired to it.
pub async fn init_scylla(
    config: ScyllaConfig,
    journal_buffer_capacity: usize,
) -> Result<(ScyllaStateStore, ScyllaEventJournal), StoreError> {
    let client = ScyllaClient::connect(config).await?;
    client.ensure_schema().await?;
    let state_store = ScyllaStateStore::new(client.clone());
    let journal = ScyllaEventJournal::new(client, journal_buffer_capacity);
    Ok((state_store, journal))
}
