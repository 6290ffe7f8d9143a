//! Shared test fixtures for this crate's `#[cfg(test)]` modules.

#![cfg(test)]

use std::path::Path;
use std::sync::Arc;

use frontdesk_config::{ConfigResolver, ScenarioResolver, Settings};
use frontdesk_pipeline::MatcherRegistry;
use frontdesk_store::{InMemoryEventJournal, InMemoryStateStore};

use crate::state::AppState;

pub fn test_state(tenant_dir: &Path) -> AppState {
    let config_resolver = Arc::new(ConfigResolver::new(tenant_dir));
    let scenario_resolver = Arc::new(ScenarioResolver::new(tenant_dir));
    let matcher_registry = Arc::new(MatcherRegistry::new(scenario_resolver.clone(), None));
    AppState::new(
        Settings::default(),
        config_resolver,
        scenario_resolver,
        matcher_registry,
        Arc::new(InMemoryStateStore::new()),
        Arc::new(InMemoryEventJournal::new()),
    )
}
