//! Operator CLI (spec §6): `replay --call <id>` dumps a call's recorded
//! turn events in order for regression inspection; `validate-config
//! --tenant <id>` checks a tenant's resolved config and scenario catalog
//! against the invariants the orchestrator assumes at runtime. Exit codes
//! fixed by spec.md §6: 0 success, 2 invariant violation, 3 missing data,
//! 1 other error.

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use frontdesk_config::{load_settings, ConfigResolver, ScenarioResolver, StoreBackend};
use frontdesk_core::{CallId, TenantId};
use frontdesk_store::{init_scylla, EventJournal, InMemoryEventJournal, ScyllaConfig};

#[derive(Parser)]
#[command(name = "frontdesk-cli", about = "Operator CLI for the frontdesk dialogue runtime")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory holding tenant config and scenario catalog files.
    #[arg(long, global = true, default_value = "config/tenants")]
    tenant_config_dir: String,

    /// Named settings environment to load (mirrors `FRONTDESK_ENV`).
    #[arg(long, global = true)]
    env: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Re-runs stored events for a call for regression inspection.
    Replay {
        #[arg(long)]
        call: String,
    },
    /// Validates a tenant's resolved config and scenario catalog.
    ValidateConfig {
        #[arg(long)]
        tenant: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.command {
        Command::Replay { call } => replay(cli.env.as_deref(), &call).await,
        Command::ValidateConfig { tenant } => validate_config(&cli.tenant_config_dir, &tenant),
    }
}

/// Connects to whichever store backend the resolved settings name (spec §6):
/// a real deployment replays against the Scylla-backed journal, while a
/// settings file with no override falls back to an empty in-memory journal
/// and reports no events found.
async fn replay(env: Option<&str>, call: &str) -> ExitCode {
    let settings = match load_settings(env) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("failed to load settings: {e}");
            return ExitCode::from(1);
        }
    };

    let journal: Arc<dyn EventJournal> = match settings.store.backend {
        StoreBackend::Scylla => {
            let scylla_config = ScyllaConfig {
                hosts: settings.store.scylla_hosts.clone(),
                keyspace: settings.store.keyspace.clone(),
                replication_factor: 1,
                call_state_ttl_seconds: settings.store.call_state_ttl_seconds,
            };
            match init_scylla(scylla_config, settings.store.journal_buffer_capacity).await {
                Ok((_store, journal)) => Arc::new(journal),
                Err(e) => {
                    eprintln!("failed to connect to scylla: {e}");
                    return ExitCode::from(1);
                }
            }
        }
        StoreBackend::InMemory => Arc::new(InMemoryEventJournal::new()),
    };

    let call_id = CallId::from(call);
    let events = match journal.replay(&call_id).await {
        Ok(events) => events,
        Err(e) => {
            eprintln!("failed to read event journal: {e}");
            return ExitCode::from(1);
        }
    };

    if events.is_empty() {
        eprintln!("no events found for call {call}");
        return ExitCode::from(3);
    }

    for event in events {
        println!(
            "{}  turn={} seq={} {:?}  {}",
            event.timestamp_ms, event.turn_index, event.seq, event.event_type, event.data
        );
    }
    ExitCode::from(0)
}

fn validate_config(tenant_config_dir: &str, tenant: &str) -> ExitCode {
    let config_resolver = ConfigResolver::new(tenant_config_dir);
    let scenario_resolver = ScenarioResolver::new(tenant_config_dir);
    let tenant_id = TenantId::from(tenant);

    let (tenant_config, fell_back) = config_resolver.resolve(&tenant_id);
    if fell_back {
        eprintln!("tenant {tenant}: config override failed to load, fell back to platform default");
        return ExitCode::from(3);
    }

    let scenarios = match scenario_resolver.resolve(&tenant_id) {
        Ok(scenarios) => scenarios,
        Err(e) => {
            eprintln!("tenant {tenant}: failed to load scenario catalog: {e}");
            return ExitCode::from(3);
        }
    };

    if scenarios.is_empty() {
        eprintln!("tenant {tenant}: scenario catalog is empty");
        return ExitCode::from(2);
    }

    if tenant_config.discovery_flow.steps.is_empty() && tenant_config.booking_flow.steps.is_empty() {
        eprintln!("tenant {tenant}: neither discovery nor booking flow declares any steps");
        return ExitCode::from(2);
    }

    let mut invalid = 0;
    for scenario in scenarios.iter() {
        if let Err(err) = scenario.validate() {
            eprintln!("tenant {tenant}: {err}");
            invalid += 1;
        }
    }

    if invalid > 0 {
        return ExitCode::from(2);
    }

    println!("tenant {tenant}: config and {} scenarios OK", scenarios.len());
    ExitCode::from(0)
}
