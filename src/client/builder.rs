use crate::api::{ApiKeyCache, ProjectCache, TestRunCache};
use crate::cache::{CacheStore, MemoryStore, NullStore, RequestCoordinator};
use crate::client::core::TestFlowClient;
use crate::config::{ClientConfig, Environment};
use crate::error::ApiError;
use crate::session::Session;
use crate::transport::HttpTransport;
use std::sync::Arc;
use std::time::Duration;

/// Builder for [`TestFlowClient`].
///
/// Keep this surface small and predictable; anything env-configurable comes
/// in through [`ClientConfig::from_env`].
pub struct TestFlowClientBuilder {
    config: ClientConfig,
    token: Option<String>,
}

impl TestFlowClientBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::from_env(),
            token: None,
        }
    }

    /// Start from an explicit config instead of the environment.
    pub fn with_config(config: ClientConfig) -> Self {
        Self {
            config,
            token: None,
        }
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.config.environment = environment;
        self
    }

    /// Override the resolved base URL (primarily for mock servers in tests).
    pub fn base_url_override(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url_override = Some(base_url.into());
        self
    }

    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.config.http_timeout = timeout;
        self
    }

    /// Finite entry lifetime; the default is invalidation-driven freshness.
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.config.default_ttl = Some(ttl);
        self
    }

    /// Run with the response cache disabled ([`NullStore`]); in-flight
    /// de-duplication still applies.
    pub fn cache_enabled(mut self, enabled: bool) -> Self {
        self.config.cache_enabled = enabled;
        self
    }

    pub fn liveness_interval(mut self, interval: Duration) -> Self {
        self.config.liveness_interval = Some(interval);
        self
    }

    /// Install a bearer token up front, bypassing keyring/env discovery.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Assemble the client.
    ///
    /// Must run inside a tokio runtime when a liveness interval is set (the
    /// ping task spawns immediately).
    pub fn build(self) -> Result<TestFlowClient, ApiError> {
        let transport = Arc::new(HttpTransport::new(&self.config)?);
        if let Some(token) = self.token {
            transport.token_handle().store(Some(Arc::new(token)));
        }

        let store: Arc<dyn CacheStore> = if self.config.cache_enabled {
            Arc::new(MemoryStore::new(self.config.max_cache_entries))
        } else {
            Arc::new(NullStore::new())
        };
        let coordinator = Arc::new(RequestCoordinator::new(store, self.config.default_ttl));

        let projects = Arc::new(ProjectCache::new(
            Arc::clone(&transport),
            Arc::clone(&coordinator),
        ));
        let api_keys = Arc::new(ApiKeyCache::new(
            Arc::clone(&transport),
            Arc::clone(&coordinator),
        ));
        let test_runs = Arc::new(TestRunCache::new(
            Arc::clone(&transport),
            Arc::clone(&coordinator),
        ));
        let session = Arc::new(Session::new(
            Arc::clone(&transport),
            Arc::clone(&coordinator),
            Arc::clone(&projects),
            Arc::clone(&api_keys),
        ));

        if let Some(interval) = self.config.liveness_interval {
            session.start_liveness_ping(interval);
        }

        Ok(TestFlowClient {
            config: self.config,
            transport,
            coordinator,
            projects,
            api_keys,
            test_runs,
            session,
        })
    }
}

impl Default for TestFlowClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
