//! ScyllaDB schema for the call state store (C11) and event journal (C12).

use crate::error::StoreError;
use scylla::Session;

pub async fn create_keyspace(session: &Session, keyspace: &str, replication_factor: u8) -> Result<(), StoreError> {
    let query = format!(
        "CREATE KEYSPACE IF NOT EXISTS {} WITH replication = {{'class': 'SimpleStrategy', 'replication_factor': {}}}",
        keyspace, replication_factor
    );

    session
        .query_unpaged(query, &[])
        .await
        .map_err(|e| StoreError::Schema(format!("failed to create keyspace: {}", e)))?;

    Ok(())
}

pub async fn create_tables(session: &Session, keyspace: &str, call_state_ttl_seconds: u64) -> Result<(), StoreError> {
    // Call state (C11): one row per call, full state serialized as JSON.
    // `turn_index` is duplicated as a clustering-free column purely so an
    // operator can `SELECT turn_index` without deserializing `state_json`.
    let call_state_table = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {}.call_state (
            call_id TEXT,
            tenant_id TEXT,
            turn_index BIGINT,
            state_json TEXT,
            updated_at TIMESTAMP,
            PRIMARY KEY (call_id)
        ) WITH default_time_to_live = {}
    "#,
        keyspace, call_state_ttl_seconds
    );

    session
        .query_unpaged(call_state_table, &[])
        .await
        .map_err(|e| StoreError::Schema(format!("failed to create call_state table: {}", e)))?;

    // Event journal (C12): append-only, clustered by turn then sequence so a
    // replay reads one call's full event history in wall-clock order.
    let turn_events_table = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {}.turn_events (
            call_id TEXT,
            turn_index BIGINT,
            seq BIGINT,
            tenant_id TEXT,
            event_type TEXT,
            timestamp_ms BIGINT,
            data_json TEXT,
            PRIMARY KEY ((call_id), turn_index, seq)
        ) WITH CLUSTERING ORDER BY (turn_index ASC, seq ASC)
    "#,
        keyspace
    );

    session
        .query_unpaged(turn_events_table, &[])
        .await
        .map_err(|e| StoreError::Schema(format!("failed to create turn_events table: {}", e)))?;

    tracing::info!("all tables created successfully");
    Ok(())
}
