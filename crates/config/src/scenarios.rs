//! Per-tenant scenario catalog resolution (spec §3, §4.3). Siblings
//! [`crate::resolver::ConfigResolver`] but kept as its own cache: a
//! tenant's scenario catalog changes on a different cadence (content
//! team edits) than dialogue configuration (engineering-owned).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use frontdesk_core::{Scenario, TenantId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScenarioResolverError {
    #[error("failed to read scenario catalog file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse scenario catalog file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("scenario catalog for tenant {0} failed validation: {1}")]
    Invalid(TenantId, String),
}

pub struct ScenarioResolver {
    catalog_dir: PathBuf,
    cache: DashMap<TenantId, Arc<Vec<Scenario>>>,
}

impl ScenarioResolver {
    pub fn new(catalog_dir: impl Into<PathBuf>) -> Self {
        Self {
            catalog_dir: catalog_dir.into(),
            cache: DashMap::new(),
        }
    }

    /// Resolves a tenant's scenario catalog. A missing file is not an
    /// error -- a tenant with no catalog simply has an empty one, and
    /// matching degrades to "no match" (spec §4.3, same fail-open posture
    /// as the dialogue config resolver).
    pub fn resolve(&self, tenant_id: &TenantId) -> Result<Arc<Vec<Scenario>>, ScenarioResolverError> {
        if let Some(cached) = self.cache.get(tenant_id) {
            return Ok(cached.clone());
        }

        let scenarios = match self.load(tenant_id) {
            Ok(scenarios) => scenarios,
            Err(ScenarioResolverError::Io { .. }) => Vec::new(),
            Err(err) => return Err(err),
        };

        for scenario in &scenarios {
            scenario
                .validate()
                .map_err(|e| ScenarioResolverError::Invalid(tenant_id.clone(), e))?;
        }

        let resolved = Arc::new(scenarios);
        self.cache.insert(tenant_id.clone(), resolved.clone());
        Ok(resolved)
    }

    pub fn invalidate(&self, tenant_id: &TenantId) {
        self.cache.remove(tenant_id);
    }

    fn load(&self, tenant_id: &TenantId) -> Result<Vec<Scenario>, ScenarioResolverError> {
        for ext in ["json", "yaml", "yml", "toml"] {
            let path = self
                .catalog_dir
                .join(format!("{}.scenarios.{}", tenant_id.as_str(), ext));
            if path.exists() {
                return parse_catalog_file(&path);
            }
        }
        Err(ScenarioResolverError::Io {
            path: self.catalog_dir.join(format!("{}.scenarios.*", tenant_id.as_str())),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no catalog file"),
        })
    }
}

fn parse_catalog_file(path: &Path) -> Result<Vec<Scenario>, ScenarioResolverError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ScenarioResolverError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&contents).map_err(|e| ScenarioResolverError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        }),
        Some("toml") => toml::from_str(&contents).map_err(|e| ScenarioResolverError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        }),
        _ => serde_yaml::from_str(&contents).map_err(|e| ScenarioResolverError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_catalog_resolves_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = ScenarioResolver::new(dir.path());
        let scenarios = resolver.resolve(&TenantId::from("ghost")).unwrap();
        assert!(scenarios.is_empty());
    }

    #[test]
    fn catalog_is_cached_until_invalidated() {
        let dir = tempfile::tempdir().unwrap();
        let tenant_id = TenantId::from("acme");
        let path = dir.path().join("acme.scenarios.json");
        std::fs::write(
            &path,
            r#"[{"id":"hours","type":"FAQ","triggers":["what are your hours"],
               "min_confidence":0.5,"reply_strategy":"QUICK_ONLY",
               "quick_replies":[{"text":"9 to 5","weight":1.0}]}]"#,
        )
        .unwrap();

        let resolver = ScenarioResolver::new(dir.path());
        let scenarios = resolver.resolve(&tenant_id).unwrap();
        assert_eq!(scenarios.len(), 1);

        std::fs::remove_file(&path).unwrap();
        let still_cached = resolver.resolve(&tenant_id).unwrap();
        assert_eq!(still_cached.len(), 1);

        resolver.invalidate(&tenant_id);
        let refreshed = resolver.resolve(&tenant_id).unwrap();
        assert!(refreshed.is_empty());
    }

    #[test]
    fn invalid_scenario_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let tenant_id = TenantId::from("acme");
        let path = dir.path().join("acme.scenarios.json");
        std::fs::write(
            &path,
            r#"[{"id":"empty","type":"FAQ","triggers":["hi"],
               "min_confidence":0.5,"reply_strategy":"QUICK_ONLY"}]"#,
        )
        .unwrap();

        let resolver = ScenarioResolver::new(dir.path());
        assert!(resolver.resolve(&tenant_id).is_err());
    }
}
