use crate::cache::{RequestCoordinator, RequestKey, RequestOptions};
use crate::error::ApiError;
use crate::transport::HttpTransport;
use crate::types::{Project, ProjectResponse};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Observable project-loading state for UI consumers.
#[derive(Debug, Clone, Default)]
pub struct ProjectState {
    pub current: Option<Project>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Domain cache for single projects.
///
/// Keeps the denormalized "currently loaded project" view on top of the
/// shared coordinator. A failed fetch leaves the previous project in place
/// and records the error string.
pub struct ProjectCache {
    transport: Arc<HttpTransport>,
    coordinator: Arc<RequestCoordinator>,
    state: watch::Sender<ProjectState>,
}

impl ProjectCache {
    pub fn new(transport: Arc<HttpTransport>, coordinator: Arc<RequestCoordinator>) -> Self {
        let (state, _) = watch::channel(ProjectState::default());
        Self {
            transport,
            coordinator,
            state,
        }
    }

    /// Load a project, preferring the already-loaded view and then the
    /// shared cache.
    ///
    /// When `id` matches the currently loaded project this returns without
    /// consulting the coordinator at all — the coarse guard above the
    /// generic cache that keeps repeated mounts for the active project free.
    pub async fn fetch_project(&self, id: &str) -> Result<Project, ApiError> {
        let already_loaded = {
            let state = self.state.borrow();
            state.current.as_ref().filter(|p| p.id == id).cloned()
        };
        if let Some(project) = already_loaded {
            debug!(project_id = id, "project already loaded");
            return Ok(project);
        }
        self.load(id, RequestOptions::default()).await
    }

    /// Drop the cached entry and refetch, bypassing both de-dup layers.
    pub async fn refresh_project(&self, id: &str) -> Result<Project, ApiError> {
        self.coordinator.invalidate(&Self::project_key(id)).await;
        self.load(id, RequestOptions::force_refresh()).await
    }

    async fn load(&self, id: &str, options: RequestOptions) -> Result<Project, ApiError> {
        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });

        let key = Self::project_key(id);
        let transport = Arc::clone(&self.transport);
        let path = format!("/projects/{id}");
        let result = self
            .coordinator
            .request_as::<ProjectResponse, _, _>(&key, options, move || async move {
                transport.get_json(&path, &[]).await
            })
            .await;

        match result {
            Ok(resp) => {
                let project = resp.project;
                self.state.send_modify(|s| {
                    s.current = Some(project.clone());
                    s.loading = false;
                    s.error = None;
                });
                Ok(project)
            }
            Err(err) => {
                warn!(project_id = id, kind = err.kind.as_str(), "project fetch failed");
                self.state.send_modify(|s| {
                    s.loading = false;
                    s.error = Some(err.to_string());
                });
                Err(err)
            }
        }
    }

    /// Reset the loaded view (project switcher, logout). The shared cache
    /// entry, if any, is left to the coordinator's own invalidation paths.
    pub fn clear_project(&self) {
        self.state.send_replace(ProjectState::default());
    }

    pub fn current_project(&self) -> Option<Project> {
        self.state.borrow().current.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn state(&self) -> ProjectState {
        self.state.borrow().clone()
    }

    /// Watch for state transitions (loading → loaded/error).
    pub fn subscribe(&self) -> watch::Receiver<ProjectState> {
        self.state.subscribe()
    }

    fn project_key(id: &str) -> RequestKey {
        RequestKey::get(format!("/projects/{id}"))
    }
}
