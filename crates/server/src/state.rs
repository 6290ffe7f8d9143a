//! Application state shared across HTTP handlers.

use std::sync::Arc;
use std::time::Duration;

use frontdesk_config::{ConfigResolver, ScenarioResolver, Settings};
use frontdesk_pipeline::{MatcherRegistry, Orchestrator};
use frontdesk_store::{CallLockTable, EventJournal, StateStore};
use parking_lot::RwLock;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<RwLock<Settings>>,
    pub config_resolver: Arc<ConfigResolver>,
    pub scenario_resolver: Arc<ScenarioResolver>,
    pub matcher_registry: Arc<MatcherRegistry>,
    pub state_store: Arc<dyn StateStore>,
    pub journal: Arc<dyn EventJournal>,
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        settings: Settings,
        config_resolver: Arc<ConfigResolver>,
        scenario_resolver: Arc<ScenarioResolver>,
        matcher_registry: Arc<MatcherRegistry>,
        state_store: Arc<dyn StateStore>,
        journal: Arc<dyn EventJournal>,
    ) -> Self {
        let locks = Arc::new(CallLockTable::new());
        let tier3_timeout = Duration::from_millis(settings.tier3.timeout_ms);
        let orchestrator = Arc::new(Orchestrator::new(
            config_resolver.clone(),
            matcher_registry.clone(),
            state_store.clone(),
            journal.clone(),
            locks,
            settings.matcher.default_min_confidence,
            settings.features.tier3_fallback_enabled,
            tier3_timeout,
        ));

        Self {
            settings: Arc::new(RwLock::new(settings)),
            config_resolver,
            scenario_resolver,
            matcher_registry,
            state_store,
            journal,
            orchestrator,
        }
    }

    /// Re-reads settings from disk/env; does not rebuild the orchestrator,
    /// since per-tenant state is what actually changes at runtime (tenant
    /// config/scenario invalidation go through `invalidate_tenant`).
    pub fn reload_settings(&self, env: Option<&str>) -> Result<(), String> {
        let reloaded = frontdesk_config::load_settings(env).map_err(|e| e.to_string())?;
        *self.settings.write() = reloaded;
        Ok(())
    }

    /// Drops a tenant's cached config and scenario matcher so the next turn
    /// resolves fresh copies of both (spec §4.13's write-through invalidation
    /// callback).
    pub fn invalidate_tenant(&self, tenant_id: &frontdesk_core::TenantId) {
        self.config_resolver.invalidate(tenant_id);
        self.scenario_resolver.invalidate(tenant_id);
        self.matcher_registry.invalidate(tenant_id);
    }
}
