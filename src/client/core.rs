use crate::api::{ApiKeyCache, ProjectCache, TestRunCache};
use crate::cache::{CoordinatorStats, RequestCoordinator};
use crate::config::ClientConfig;
use crate::guard::ApiKeyGate;
use crate::session::Session;
use crate::transport::HttpTransport;
use std::sync::Arc;

/// Assembled TestFlowX client.
///
/// One transport, one store, one in-flight registry; every domain cache is
/// a view over the same coordinator, which is what lets concurrent
/// consumers of different views collapse into single network calls.
pub struct TestFlowClient {
    pub(crate) config: ClientConfig,
    pub(crate) transport: Arc<HttpTransport>,
    pub(crate) coordinator: Arc<RequestCoordinator>,
    pub(crate) projects: Arc<ProjectCache>,
    pub(crate) api_keys: Arc<ApiKeyCache>,
    pub(crate) test_runs: Arc<TestRunCache>,
    pub(crate) session: Arc<Session>,
}

impl TestFlowClient {
    /// Build a client from the environment with defaults.
    pub fn new() -> Result<Self, crate::error::ApiError> {
        crate::client::builder::TestFlowClientBuilder::new().build()
    }

    pub fn builder() -> crate::client::builder::TestFlowClientBuilder {
        crate::client::builder::TestFlowClientBuilder::new()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    pub fn projects(&self) -> &Arc<ProjectCache> {
        &self.projects
    }

    pub fn api_keys(&self) -> &Arc<ApiKeyCache> {
        &self.api_keys
    }

    pub fn test_runs(&self) -> &Arc<TestRunCache> {
        &self.test_runs
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// A fresh guard over this client's api-key cache.
    pub fn api_key_gate(&self) -> ApiKeyGate {
        ApiKeyGate::new(Arc::clone(&self.api_keys))
    }

    /// Cache-core counters (hits, misses, de-dup joins, fetches, errors).
    pub fn cache_stats(&self) -> CoordinatorStats {
        self.coordinator.stats()
    }
}
