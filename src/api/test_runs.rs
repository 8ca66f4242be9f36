use crate::cache::{RequestCoordinator, RequestKey, RequestOptions};
use crate::error::ApiError;
use crate::transport::HttpTransport;
use crate::types::{TestRun, TestRunsResponse};
use std::sync::Arc;

/// Domain cache for test-run listings.
///
/// Runs are large, per-project collections, so unlike api keys they are
/// fetched scoped: one cache entry per project id.
pub struct TestRunCache {
    transport: Arc<HttpTransport>,
    coordinator: Arc<RequestCoordinator>,
}

impl TestRunCache {
    pub fn new(transport: Arc<HttpTransport>, coordinator: Arc<RequestCoordinator>) -> Self {
        Self {
            transport,
            coordinator,
        }
    }

    fn runs_key(project_id: &str) -> RequestKey {
        RequestKey::get("/test-runs").with_param("projectId", project_id)
    }

    pub async fn project_test_runs(&self, project_id: &str) -> Result<Vec<TestRun>, ApiError> {
        self.load(project_id, RequestOptions::default()).await
    }

    pub async fn refresh_test_runs(&self, project_id: &str) -> Result<Vec<TestRun>, ApiError> {
        self.coordinator.invalidate(&Self::runs_key(project_id)).await;
        self.load(project_id, RequestOptions::force_refresh()).await
    }

    async fn load(
        &self,
        project_id: &str,
        options: RequestOptions,
    ) -> Result<Vec<TestRun>, ApiError> {
        let key = Self::runs_key(project_id);
        let params = key.query_params();
        let transport = Arc::clone(&self.transport);
        let resp = self
            .coordinator
            .request_as::<TestRunsResponse, _, _>(&key, options, move || async move {
                transport.get_json("/test-runs", &params).await
            })
            .await?;
        Ok(resp.test_runs)
    }
}
