//! Webhook HTTP server for the receptionist dialogue runtime.
//!
//! `POST /v1/turn` is the only endpoint that runs dialogue logic; everything
//! else here is process plumbing (health, metrics, config reload, tenant
//! cache invalidation) around `frontdesk_pipeline::Orchestrator`.

pub mod http;
pub mod metrics;
pub mod state;

#[cfg(test)]
mod test_support;

pub use http::create_router;
pub use metrics::init_metrics;
pub use state::AppState;
