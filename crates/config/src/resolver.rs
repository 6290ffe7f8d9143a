//! Tenant configuration resolver (spec §3, §9 "Configuration layering").
//!
//! Resolution merges the platform default with a tenant's override file:
//! detection-trigger pattern sets are list-*replace* (a non-empty tenant
//! list wins outright, spec §4.x), vocabulary is list-*additive* (tenant
//! entries are merged into the platform defaults, spec §4.13). Everything
//! else a tenant declares replaces the corresponding platform default
//! wholesale.
//!
//! Resolved configs are cached per tenant behind a concurrent map — many
//! turn-pipeline workers read, [`ConfigResolver::invalidate`] is the single
//! writer path, called when an operator pushes a new tenant file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use frontdesk_core::{DetectionTriggersConfig, PatternSet, TenantConfig, TenantId, VocabularyConfig};
use thiserror::Error;

use crate::defaults::platform_default;

#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("no override file for tenant {0}")]
    NotFound(TenantId),

    #[error("failed to read tenant config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse tenant config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

pub struct ConfigResolver {
    tenant_config_dir: PathBuf,
    cache: DashMap<TenantId, Arc<TenantConfig>>,
}

impl ConfigResolver {
    pub fn new(tenant_config_dir: impl Into<PathBuf>) -> Self {
        Self {
            tenant_config_dir: tenant_config_dir.into(),
            cache: DashMap::new(),
        }
    }

    /// Resolves a tenant's configuration, using the cache when present.
    /// On any load or parse failure this falls back to the platform
    /// default rather than failing the turn (spec §7 `ConfigInvalid` is
    /// reserved for startup/validate-config checks, not per-turn lookups) —
    /// callers should emit an alert event when the fallback path is taken.
    pub fn resolve(&self, tenant_id: &TenantId) -> (Arc<TenantConfig>, bool) {
        if let Some(cached) = self.cache.get(tenant_id) {
            return (cached.clone(), false);
        }

        let (resolved, fell_back) = match self.load_tenant_override(tenant_id) {
            Ok(tenant_override) => (Arc::new(merge(&platform_default(), tenant_override)), false),
            Err(ResolverError::NotFound(_)) => (Arc::new(platform_default()), false),
            Err(err) => {
                tracing::error!(
                    tenant_id = %tenant_id,
                    error = %err,
                    "falling back to platform default config"
                );
                (Arc::new(platform_default()), true)
            }
        };

        self.cache.insert(tenant_id.clone(), resolved.clone());
        (resolved, fell_back)
    }

    /// Drops a tenant's cached config. The next [`resolve`](Self::resolve)
    /// call re-reads its override file.
    pub fn invalidate(&self, tenant_id: &TenantId) {
        self.cache.remove(tenant_id);
    }

    fn load_tenant_override(&self, tenant_id: &TenantId) -> Result<TenantConfig, ResolverError> {
        for ext in ["toml", "yaml", "yml", "json"] {
            let path = self.tenant_config_dir.join(format!("{}.{}", tenant_id.as_str(), ext));
            if path.exists() {
                return parse_tenant_file(&path);
            }
        }
        Err(ResolverError::NotFound(tenant_id.clone()))
    }
}

fn parse_tenant_file(path: &Path) -> Result<TenantConfig, ResolverError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ResolverError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str(&contents).map_err(|e| ResolverError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        }),
        Some("json") => serde_json::from_str(&contents).map_err(|e| ResolverError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        }),
        _ => serde_yaml::from_str(&contents).map_err(|e| ResolverError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        }),
    }
}

fn merge(platform: &TenantConfig, tenant: TenantConfig) -> TenantConfig {
    TenantConfig {
        triage: tenant.triage,
        discovery: tenant.discovery,
        experimental_s4a: tenant.experimental_s4a,
        detection_triggers: merge_triggers(&platform.detection_triggers, tenant.detection_triggers),
        slots: if tenant.slots.is_empty() { platform.slots.clone() } else { tenant.slots },
        discovery_flow: if tenant.discovery_flow.steps.is_empty() {
            platform.discovery_flow.clone()
        } else {
            tenant.discovery_flow
        },
        booking_flow: if tenant.booking_flow.steps.is_empty() {
            platform.booking_flow.clone()
        } else {
            tenant.booking_flow
        },
        openers: if tenant.openers.is_empty() { platform.openers.clone() } else { tenant.openers },
        vocabulary: merge_vocabulary(&platform.vocabulary, tenant.vocabulary),
        connection_quality: tenant.connection_quality,
        escalation: tenant.escalation,
        greeting: tenant.greeting,
    }
}

fn merge_triggers(
    platform: &DetectionTriggersConfig,
    tenant: DetectionTriggersConfig,
) -> DetectionTriggersConfig {
    DetectionTriggersConfig {
        describing_problem: PatternSet::resolve(&tenant.describing_problem, &platform.describing_problem),
        trust_concern: PatternSet::resolve(&tenant.trust_concern, &platform.trust_concern),
        caller_feels_ignored: PatternSet::resolve(
            &tenant.caller_feels_ignored,
            &platform.caller_feels_ignored,
        ),
        refused_slot: PatternSet::resolve(&tenant.refused_slot, &platform.refused_slot),
    }
}

fn merge_vocabulary(platform: &VocabularyConfig, tenant: VocabularyConfig) -> VocabularyConfig {
    let mut synonyms = platform.synonyms.clone();
    synonyms.extend(tenant.synonyms);

    let mut fillers = platform.fillers.clone();
    for filler in tenant.fillers {
        if !fillers.contains(&filler) {
            fillers.push(filler);
        }
    }

    VocabularyConfig { synonyms, fillers }
}
