//! Registry of named clusters and their cached connections.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use crate::config::ClusterConfig;
use crate::db::{self, SqlExecutor};
use crate::error::{ConsoleError, Result};
use crate::secrets::SecretStorage;
use tracing::{debug, info};

/// One row of `cluster list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterSummary {
    pub name: String,
    pub address: String,
    pub user: String,
}

/// Resolves cluster names to connections, connecting lazily.
///
/// Connections are cached per name, so every caller asking for the same
/// cluster shares one pool.
pub struct ConnectionRegistry {
    clusters: BTreeMap<String, ClusterConfig>,
    cache: Mutex<HashMap<String, Arc<dyn SqlExecutor>>>,
    secrets: SecretStorage,
}

impl ConnectionRegistry {
    /// Creates a registry over the configured clusters.
    pub fn new(clusters: BTreeMap<String, ClusterConfig>) -> Self {
        Self {
            clusters,
            cache: Mutex::new(HashMap::new()),
            secrets: SecretStorage::new(),
        }
    }

    /// Registers a ready connection under `name`, bypassing configuration.
    pub fn register(&self, name: impl Into<String>, executor: Arc<dyn SqlExecutor>) {
        self.lock_cache().insert(name.into(), executor);
    }

    /// Returns true if `name` is configured or registered.
    pub fn contains(&self, name: &str) -> bool {
        self.clusters.contains_key(name) || self.lock_cache().contains_key(name)
    }

    /// Returns all known cluster names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.clusters.keys().cloned().collect();
        for name in self.lock_cache().keys() {
            if !self.clusters.contains_key(name) {
                names.push(name.clone());
            }
        }
        names.sort();
        names
    }

    /// Describes every known cluster for listing.
    pub fn summaries(&self) -> Vec<ClusterSummary> {
        self.names()
            .into_iter()
            .map(|name| match self.clusters.get(&name) {
                Some(config) => {
                    let config = config.resolved().unwrap_or_else(|_| config.clone());
                    ClusterSummary {
                        address: config.address(),
                        user: config.user.clone().unwrap_or_else(|| "root".to_string()),
                        name,
                    }
                }
                None => ClusterSummary {
                    name,
                    address: "(registered)".to_string(),
                    user: String::new(),
                },
            })
            .collect()
    }

    /// Returns the connection for `name`, connecting on first use.
    pub async fn get_connection(&self, name: &str) -> Result<Arc<dyn SqlExecutor>> {
        if let Some(existing) = self.lock_cache().get(name) {
            return Ok(Arc::clone(existing));
        }

        let config = self.connection_config(name)?;
        info!("Connecting to cluster '{}' at {}", name, config.display_string());
        let executor = db::connect(&config).await?;

        // Another caller may have connected meanwhile; keep the first pool.
        let mut cache = self.lock_cache();
        let shared = cache
            .entry(name.to_string())
            .or_insert_with(|| Arc::clone(&executor));
        Ok(Arc::clone(shared))
    }

    /// Builds the effective connection settings for a configured cluster.
    fn connection_config(&self, name: &str) -> Result<ClusterConfig> {
        let configured = self
            .clusters
            .get(name)
            .ok_or_else(|| ConsoleError::config(format!("cluster '{name}' is not configured")))?;

        let mut config = configured.resolved()?;
        config.apply_env_defaults();

        if config.password.is_none() {
            let key = SecretStorage::cluster_password_key(name);
            config.password = self.secrets.retrieve(&key)?;
            if config.password.is_some() {
                debug!("Using keyring password for cluster '{}'", name);
            }
        }

        Ok(config)
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<dyn SqlExecutor>>> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MockDatabaseClient;

    fn registry() -> ConnectionRegistry {
        let mut clusters = BTreeMap::new();
        clusters.insert(
            "prod".to_string(),
            ClusterConfig {
                host: Some("10.0.0.1".to_string()),
                user: Some("dba".to_string()),
                ..ClusterConfig::default()
            },
        );
        ConnectionRegistry::new(clusters)
    }

    #[test]
    fn test_contains_configured_and_registered() {
        let registry = registry();
        assert!(registry.contains("prod"));
        assert!(!registry.contains("dev"));

        registry.register("dev", Arc::new(MockDatabaseClient::new()));
        assert!(registry.contains("dev"));
        assert_eq!(registry.names(), vec!["dev".to_string(), "prod".to_string()]);
    }

    #[test]
    fn test_summaries() {
        let summaries = registry().summaries();
        assert_eq!(
            summaries,
            vec![ClusterSummary {
                name: "prod".to_string(),
                address: "10.0.0.1:4000".to_string(),
                user: "dba".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_registered_connection_is_shared() {
        let registry = registry();
        let mock: Arc<dyn SqlExecutor> = Arc::new(MockDatabaseClient::new());
        registry.register("dev", Arc::clone(&mock));

        let first = registry.get_connection("dev").await.unwrap();
        let second = registry.get_connection("dev").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first, &mock));
    }

    #[tokio::test]
    async fn test_unknown_cluster_is_config_error() {
        let err = registry().get_connection("missing").await.err().unwrap();
        assert!(matches!(err, ConsoleError::Config(_)));
        assert!(err.to_string().contains("missing"));
    }
}
