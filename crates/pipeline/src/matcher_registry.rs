//! Per-tenant `ScenarioMatcher` cache (spec §4.3). Mirrors
//! `ConfigResolver`/`ScenarioResolver`'s cache-with-invalidate shape, but
//! caches the built matcher (Tier-2 index included) rather than the raw
//! catalog, since building the index is the expensive part.

use std::sync::Arc;

use dashmap::DashMap;
use frontdesk_config::ScenarioResolver;
use frontdesk_core::{Scenario, ScenarioId, TenantId};
use frontdesk_matcher::{ScenarioMatcher, Tier3Backend};

use crate::error::PipelineError;

pub struct MatcherRegistry {
    scenarios: Arc<ScenarioResolver>,
    tier3_backend: Option<Arc<dyn Tier3Backend>>,
    cache: DashMap<TenantId, Arc<ScenarioMatcher>>,
}

impl MatcherRegistry {
    pub fn new(scenarios: Arc<ScenarioResolver>, tier3_backend: Option<Arc<dyn Tier3Backend>>) -> Self {
        Self {
            scenarios,
            tier3_backend,
            cache: DashMap::new(),
        }
    }

    /// Resolves (building and caching on first use) the matcher for a
    /// tenant's current scenario catalog.
    pub fn resolve(&self, tenant_id: &TenantId) -> Result<Arc<ScenarioMatcher>, PipelineError> {
        if let Some(cached) = self.cache.get(tenant_id) {
            return Ok(cached.clone());
        }

        let scenarios = self
            .scenarios
            .resolve(tenant_id)
            .map_err(|e| PipelineError::ScenarioCatalog(e.to_string()))?;

        let mut matcher = ScenarioMatcher::new((*scenarios).clone())
            .map_err(|e| PipelineError::Matcher(e.to_string()))?;
        if let Some(backend) = &self.tier3_backend {
            matcher = matcher.with_tier3_backend(backend.clone());
        }

        let matcher = Arc::new(matcher);
        self.cache.insert(tenant_id.clone(), matcher.clone());
        Ok(matcher)
    }

    /// Drops a tenant's cached matcher; the next [`resolve`](Self::resolve)
    /// rebuilds it from the (presumably just-updated) scenario catalog.
    pub fn invalidate(&self, tenant_id: &TenantId) {
        self.cache.remove(tenant_id);
    }

    /// Raw catalog access for stages that need more than a match result --
    /// S4A-1 triage's candidate cards and S4A-2's scenario-id-to-body
    /// lookup both go through here rather than duplicating the resolver.
    pub fn scenarios(&self, tenant_id: &TenantId) -> Result<Arc<Vec<Scenario>>, PipelineError> {
        self.scenarios
            .resolve(tenant_id)
            .map_err(|e| PipelineError::ScenarioCatalog(e.to_string()))
    }

    pub fn scenario(&self, tenant_id: &TenantId, scenario_id: &ScenarioId) -> Option<Scenario> {
        self.scenarios(tenant_id).ok()?.iter().find(|s| &s.id == scenario_id).cloned()
    }
}
