//! Frontdesk webhook server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use frontdesk_config::{load_settings, ConfigResolver, ScenarioResolver, Settings, StoreBackend};
use frontdesk_llm::{build_backend, LlmConfig, ScenarioPickerBackend};
use frontdesk_matcher::Tier3Backend;
use frontdesk_pipeline::MatcherRegistry;
use frontdesk_server::{create_router, init_metrics, AppState};
use frontdesk_store::{init_scylla, EventJournal, InMemoryEventJournal, InMemoryStateStore, ScyllaConfig, StateStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = std::env::var("FRONTDESK_ENV").ok();
    let settings = match load_settings(env.as_deref()) {
        Ok(settings) => {
            eprintln!("loaded configuration (env: {})", env.as_deref().unwrap_or("default"));
            settings
        }
        Err(e) => {
            eprintln!("failed to load config: {e}. using defaults.");
            Settings::default()
        }
    };

    init_tracing(&settings);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting frontdesk server");

    let _metrics_handle = init_metrics();
    tracing::info!("initialized prometheus metrics at /metrics");

    let config_resolver = Arc::new(ConfigResolver::new(settings.tenant_config_dir.clone()));
    let scenario_resolver = Arc::new(ScenarioResolver::new(settings.tenant_config_dir.clone()));

    let tier3_backend = build_tier3_backend(&settings);
    let matcher_registry = Arc::new(MatcherRegistry::new(scenario_resolver.clone(), tier3_backend));

    let (state_store, journal): (Arc<dyn StateStore>, Arc<dyn EventJournal>) = match settings.store.backend {
        StoreBackend::Scylla => {
            let scylla_config = ScyllaConfig {
                hosts: settings.store.scylla_hosts.clone(),
                keyspace: settings.store.keyspace.clone(),
                replication_factor: 1,
                call_state_ttl_seconds: settings.store.call_state_ttl_seconds,
            };
            match init_scylla(scylla_config, settings.store.journal_buffer_capacity).await {
                Ok((store, journal)) => {
                    tracing::info!(hosts = ?settings.store.scylla_hosts, "scylla store connected");
                    (Arc::new(store), Arc::new(journal))
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to connect to scylla, falling back to in-memory store");
                    (Arc::new(InMemoryStateStore::new()), Arc::new(InMemoryEventJournal::new()))
                }
            }
        }
        StoreBackend::InMemory => {
            tracing::info!("using in-memory call state store and event journal");
            (Arc::new(InMemoryStateStore::new()), Arc::new(InMemoryEventJournal::new()))
        }
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let state = AppState::new(settings, config_resolver, scenario_resolver, matcher_registry, state_store, journal);

    let app = create_router(state);

    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    tracing::info!(%addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

fn build_tier3_backend(settings: &Settings) -> Option<Arc<dyn Tier3Backend>> {
    if !settings.tier3.enabled {
        return None;
    }

    let llm_config = LlmConfig {
        model: settings.tier3.model.clone(),
        endpoint: settings.tier3.endpoint.clone(),
        api_key: settings.tier3.api_key.clone(),
        timeout: std::time::Duration::from_millis(settings.tier3.timeout_ms),
        ..LlmConfig::default()
    };

    match build_backend(llm_config) {
        Ok(backend) => {
            tracing::info!(endpoint = %settings.tier3.endpoint, "tier-3 llm backend enabled");
            Some(Arc::new(ScenarioPickerBackend::new(backend)))
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to build tier-3 backend, scenario matching proceeds without it");
            None
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install ctrl+c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install sigterm handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received ctrl+c, shutting down"),
        _ = terminate => tracing::info!("received sigterm, shutting down"),
    }
}

#[cfg(feature = "telemetry")]
fn init_tracing(settings: &Settings) {
    use opentelemetry_otlp::WithExportConfig;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("frontdesk={},tower_http=debug", settings.observability.log_level).into());

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if settings.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    if let Some(otlp_endpoint) = &settings.observability.otlp_endpoint {
        if settings.observability.tracing_enabled {
            match opentelemetry_otlp::new_pipeline()
                .tracing()
                .with_exporter(opentelemetry_otlp::new_exporter().tonic().with_endpoint(otlp_endpoint))
                .with_trace_config(opentelemetry_sdk::trace::Config::default().with_resource(
                    opentelemetry_sdk::Resource::new(vec![
                        opentelemetry::KeyValue::new("service.name", "frontdesk"),
                        opentelemetry::KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
                    ]),
                ))
                .install_batch(opentelemetry_sdk::runtime::Tokio)
            {
                Ok(tracer) => {
                    let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);
                    subscriber.with(fmt_layer).with(otel_layer).init();
                    tracing::info!(endpoint = %otlp_endpoint, "opentelemetry tracing enabled");
                    return;
                }
                Err(e) => eprintln!("failed to initialize opentelemetry: {e}. falling back."),
            }
        }
    }
    subscriber.with(fmt_layer).init();
}

#[cfg(not(feature = "telemetry"))]
fn init_tracing(settings: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("frontdesk={},tower_http=debug", settings.observability.log_level).into());

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if settings.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    subscriber.with(fmt_layer).init();
}
