use crate::cache::{RequestCoordinator, RequestKey, RequestOptions};
use crate::error::ApiError;
use crate::transport::HttpTransport;
use crate::types::{ApiKey, ApiKeyMutationResponse, ApiKeyStatus, ApiKeysResponse, CreateApiKeyRequest};
use reqwest::Method;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

const COLLECTION_ENDPOINT: &str = "/api-keys";

/// Observable api-key state for UI consumers.
#[derive(Debug, Clone, Default)]
pub struct ApiKeyState {
    pub all_keys: Vec<ApiKey>,
    pub loaded: bool,
    pub loading: bool,
    pub error: Option<String>,
}

/// Domain cache for API keys.
///
/// Contract: the full key collection is fetched once, unscoped, and cached
/// under the collection key; per-project views filter client-side. One fetch
/// therefore serves the gate check, the list view, and every project, and a
/// concurrently mounting gate + list collapse into a single request via the
/// in-flight registry.
pub struct ApiKeyCache {
    transport: Arc<HttpTransport>,
    coordinator: Arc<RequestCoordinator>,
    state: watch::Sender<ApiKeyState>,
}

impl ApiKeyCache {
    pub fn new(transport: Arc<HttpTransport>, coordinator: Arc<RequestCoordinator>) -> Self {
        let (state, _) = watch::channel(ApiKeyState::default());
        Self {
            transport,
            coordinator,
            state,
        }
    }

    fn collection_key() -> RequestKey {
        RequestKey::get(COLLECTION_ENDPOINT)
    }

    async fn load_collection(&self, options: RequestOptions) -> Result<Vec<ApiKey>, ApiError> {
        self.state.send_modify(|s| s.loading = true);

        let transport = Arc::clone(&self.transport);
        let result = self
            .coordinator
            .request_as::<ApiKeysResponse, _, _>(&Self::collection_key(), options, move || {
                async move { transport.get_json(COLLECTION_ENDPOINT, &[]).await }
            })
            .await;

        match result {
            Ok(resp) => {
                let keys = resp.api_keys;
                self.state.send_modify(|s| {
                    s.all_keys = keys.clone();
                    s.loaded = true;
                    s.loading = false;
                    s.error = None;
                });
                Ok(keys)
            }
            Err(err) => {
                warn!(kind = err.kind.as_str(), "api-key fetch failed");
                self.state.send_modify(|s| {
                    s.loading = false;
                    s.error = Some(err.to_string());
                });
                Err(err)
            }
        }
    }

    /// The full cached key collection.
    pub async fn all_api_keys(&self) -> Result<Vec<ApiKey>, ApiError> {
        self.load_collection(RequestOptions::default()).await
    }

    /// Keys scoped to one project — a client-side filter over the shared
    /// collection fetch, never a second round trip.
    pub async fn project_api_keys(&self, project_id: &str) -> Result<Vec<ApiKey>, ApiError> {
        let keys = self.load_collection(RequestOptions::default()).await?;
        Ok(keys.into_iter().filter(|k| k.belongs_to(project_id)).collect())
    }

    /// Derived gate view over the same underlying fetch.
    ///
    /// Infallible by design: a failed check resolves to the no-keys status
    /// (fail closed) with the error recorded in [`ApiKeyState`], so a guard
    /// component always reaches a deterministic decision.
    pub async fn check_api_keys(&self, project_id: &str) -> ApiKeyStatus {
        match self.project_api_keys(project_id).await {
            Ok(keys) => ApiKeyStatus {
                has_keys: !keys.is_empty(),
                is_verified: keys.iter().any(|k| k.verified),
            },
            Err(err) => {
                warn!(project_id, kind = err.kind.as_str(), "key check failed closed");
                ApiKeyStatus::default()
            }
        }
    }

    /// Invalidate and refetch the collection; scoped result when a project
    /// id is given. Mutation call sites use this after create/revoke/rotate.
    pub async fn refresh_api_keys(&self, project_id: Option<&str>) -> Result<Vec<ApiKey>, ApiError> {
        self.invalidate_collection().await;
        let keys = self.load_collection(RequestOptions::force_refresh()).await?;
        Ok(match project_id {
            Some(id) => keys.into_iter().filter(|k| k.belongs_to(id)).collect(),
            None => keys,
        })
    }

    /// `POST /api-keys`. The response carries the full secret exactly once.
    pub async fn create_api_key(
        &self,
        request: &CreateApiKeyRequest,
    ) -> Result<ApiKeyMutationResponse, ApiError> {
        let body = serde_json::to_value(request)?;
        let value = self
            .transport
            .send_json(Method::POST, COLLECTION_ENDPOINT, Some(&body))
            .await?;
        self.invalidate_collection().await;
        info!(name = %request.name, project_id = %request.project_id, "api key created");
        serde_json::from_value(value).map_err(ApiError::from)
    }

    /// `DELETE /api-keys/{id}/revoke`.
    pub async fn revoke_api_key(&self, key_id: &str) -> Result<(), ApiError> {
        self.transport
            .send_json(Method::DELETE, &format!("/api-keys/{key_id}/revoke"), None)
            .await?;
        self.invalidate_collection().await;
        info!(key_id, "api key revoked");
        Ok(())
    }

    /// `POST /api-keys/{id}/rotate`. Returns the replacement key.
    pub async fn rotate_api_key(&self, key_id: &str) -> Result<ApiKeyMutationResponse, ApiError> {
        let value = self
            .transport
            .send_json(Method::POST, &format!("/api-keys/{key_id}/rotate"), None)
            .await?;
        self.invalidate_collection().await;
        info!(key_id, "api key rotated");
        serde_json::from_value(value).map_err(ApiError::from)
    }

    /// Drops the collection entry and every scoped variant of it, so reads
    /// issued after a mutation returns cannot observe pre-mutation data.
    async fn invalidate_collection(&self) {
        self.coordinator.invalidate_endpoint(COLLECTION_ENDPOINT).await;
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn state(&self) -> ApiKeyState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ApiKeyState> {
        self.state.subscribe()
    }

    /// Session teardown: forget the denormalized view. The shared store is
    /// cleared separately by the session handler.
    pub fn reset(&self) {
        self.state.send_replace(ApiKeyState::default());
    }
}
