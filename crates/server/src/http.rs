//! HTTP routes: the inbound turn webhook (spec §6) plus health/readiness/
//! metrics and a thin admin surface for config invalidation, modeled on the
//! teacher's route-table-plus-middleware-stack shape.

use axum::{
    extract::{Json, Path, State},
    http::{HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use frontdesk_core::{TenantId, TurnRequest};

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let settings = state.settings.read();
    let cors_layer = build_cors_layer(&settings.server.cors_origins, settings.server.cors_enabled);
    drop(settings);

    Router::new()
        .route("/v1/turn", post(handle_turn))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_handler))
        .route("/admin/reload-config", post(reload_config))
        .route("/admin/invalidate/:tenant_id", post(invalidate_tenant))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors_layer)
        .with_state(state)
}

fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled, allowing all origins (not for production)");
        return CorsLayer::permissive();
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!(origin = %origin, "invalid CORS origin, skipping");
                None
            })
        })
        .collect();

    if parsed_origins.is_empty() {
        tracing::info!("no CORS origins configured, defaulting to localhost:3000");
        return CorsLayer::new()
            .allow_origin("http://localhost:3000".parse::<HeaderValue>().unwrap())
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(Any);
    }

    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
        .allow_credentials(true)
}

/// `POST /v1/turn` -- the inbound turn contract of spec.md §6. Never
/// returns a server error for a dialogue failure: the orchestrator always
/// produces a well-formed `TurnOutcome`, degrading internally (spec §7).
async fn handle_turn(
    State(state): State<AppState>,
    Json(request): Json<TurnRequest>,
) -> impl IntoResponse {
    let tenant_id = request.tenant_id.as_str().to_string();
    let channel = format!("{:?}", request.channel).to_lowercase();
    let started = std::time::Instant::now();

    let outcome = state.orchestrator.run_turn(request).await;

    crate::metrics::record_turn(&tenant_id, &channel, started.elapsed().as_secs_f64());
    Json(outcome)
}

async fn health_check() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "healthy", "version": env!("CARGO_PKG_VERSION") })),
    )
}

/// Readiness additionally checks that the configured state store backend
/// is reachable, since a turn can't be served without it.
async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let probe_tenant = TenantId::from("__readiness_probe__");
    let probe_call = frontdesk_core::CallId::from("__readiness_probe__");
    let reachable = state.state_store.load(&probe_call, &probe_tenant).await.is_ok();

    let status_code = if reachable { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (
        status_code,
        Json(serde_json::json!({
            "status": if reachable { "ready" } else { "not_ready" },
            "state_store": if reachable { "ok" } else { "unreachable" },
        })),
    )
}

async fn metrics_handler() -> String {
    crate::metrics::render()
}

#[derive(Debug, Deserialize)]
struct ReloadConfigRequest {
    #[serde(default)]
    env: Option<String>,
}

async fn reload_config(
    State(state): State<AppState>,
    body: Option<Json<ReloadConfigRequest>>,
) -> impl IntoResponse {
    let env = body.and_then(|b| b.0.env);
    match state.reload_settings(env.as_deref()) {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({ "status": "reloaded" }))),
        Err(err) => {
            tracing::error!(error = %err, "settings reload failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "status": "error", "message": err })))
        }
    }
}

/// Write-through invalidation callback (spec §6 "admin interface"): the
/// admin layer owning scenario/config edits calls this after each write so
/// the next turn for that tenant resolves fresh config and rebuilds its
/// scenario matcher.
async fn invalidate_tenant(State(state): State<AppState>, Path(tenant_id): Path<String>) -> impl IntoResponse {
    let tenant_id = TenantId::from(tenant_id.as_str());
    state.invalidate_tenant(&tenant_id);
    Json(serde_json::json!({ "status": "invalidated", "tenant_id": tenant_id.as_str() }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_state;

    #[tokio::test]
    async fn router_builds_with_default_state() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let _ = create_router(state);
    }
}
