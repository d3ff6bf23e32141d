// Project id -> domain name, resolved through an identity backend and cached per run.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

/// Bucket used whenever a domain cannot be resolved.
pub const UNKNOWN_DOMAIN: &str = "unknown";

#[async_trait]
pub trait DomainResolver: Send + Sync {
    async fn domain_for_project(&self, project_id: &str) -> anyhow::Result<String>;
}

/// Resolver over a fixed project -> domain table (e.g. from config).
#[derive(Debug, Clone, Default)]
pub struct StaticDomainResolver {
    domains: BTreeMap<String, String>,
}

impl StaticDomainResolver {
    pub fn new(domains: BTreeMap<String, String>) -> Self {
        Self { domains }
    }
}

#[async_trait]
impl DomainResolver for StaticDomainResolver {
    async fn domain_for_project(&self, project_id: &str) -> anyhow::Result<String> {
        self.domains
            .get(project_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no domain configured for project {}", project_id))
    }
}

/// Caches domain names per project id, failures included (as `"unknown"`).
/// Entries are never invalidated; call `reset` between independent report runs.
pub struct DomainCache {
    resolver: Arc<dyn DomainResolver>,
    cache: HashMap<String, String>,
}

impl DomainCache {
    pub fn new(resolver: Arc<dyn DomainResolver>) -> Self {
        Self {
            resolver,
            cache: HashMap::new(),
        }
    }

    pub async fn domain_name(&mut self, project_id: &str) -> String {
        if let Some(name) = self.cache.get(project_id) {
            return name.clone();
        }
        let name = match self.resolver.domain_for_project(project_id).await {
            Ok(name) => name,
            Err(e) => {
                warn!(project_id = %project_id, error = %e, "unable to retrieve domain for project");
                UNKNOWN_DOMAIN.to_string()
            }
        };
        self.cache.insert(project_id.to_string(), name.clone());
        name
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn reset(&mut self) {
        self.cache.clear();
    }
}
