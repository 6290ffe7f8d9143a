//! Storage backend errors, mapped onto [`frontdesk_core::ErrorKind`] at the
//! boundary so the orchestrator only ever reasons about spec error kinds.

use frontdesk_core::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("connection failure: {0}")]
    Connection(String),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("failed to (de)serialize stored state: {0}")]
    Serialization(String),

    #[error("state invariant violated: {0}")]
    InvariantViolation(String),
}

impl From<StoreError> for ErrorKind {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvariantViolation(msg) => ErrorKind::InvariantViolation(msg),
            other => ErrorKind::TransientIo(other.to_string()),
        }
    }
}

impl From<scylla::transport::errors::NewSessionError> for StoreError {
    fn from(err: scylla::transport::errors::NewSessionError) -> Self {
        StoreError::Connection(err.to_string())
    }
}

impl From<scylla::transport::errors::QueryError> for StoreError {
    fn from(err: scylla::transport::errors::QueryError) -> Self {
        StoreError::Query(err.to_string())
    }
}
