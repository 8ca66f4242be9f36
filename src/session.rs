//! Session lifecycle: bearer-token storage, teardown, liveness ping.

use crate::api::{ApiKeyCache, ProjectCache};
use crate::cache::RequestCoordinator;
use crate::transport::HttpTransport;
use arc_swap::ArcSwapOption;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Owns the authenticated session around the shared cache core.
///
/// Logout clears the store and every denormalized domain view, so one
/// user's cached data can never be served into the next session. In-flight
/// fetches settle on their own and deregister themselves.
pub struct Session {
    token: Arc<ArcSwapOption<String>>,
    transport: Arc<HttpTransport>,
    coordinator: Arc<RequestCoordinator>,
    projects: Arc<ProjectCache>,
    api_keys: Arc<ApiKeyCache>,
    ping_task: Mutex<Option<JoinHandle<()>>>,
}

impl Session {
    pub fn new(
        transport: Arc<HttpTransport>,
        coordinator: Arc<RequestCoordinator>,
        projects: Arc<ProjectCache>,
        api_keys: Arc<ApiKeyCache>,
    ) -> Self {
        Self {
            token: transport.token_handle(),
            transport,
            coordinator,
            projects,
            api_keys,
            ping_task: Mutex::new(None),
        }
    }

    /// Install a bearer token; subsequent requests carry it.
    pub fn login(&self, token: impl Into<String>) {
        self.token.store(Some(Arc::new(token.into())));
        info!("session token installed");
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.load().is_some()
    }

    /// Tear the session down: drop the token, the shared cache, and every
    /// domain view.
    pub async fn logout(&self) {
        self.token.store(None);
        self.coordinator.clear().await;
        self.projects.clear_project();
        self.api_keys.reset();
        info!("session cleared");
    }

    /// Start the fire-and-forget liveness ping. Uncoordinated with the
    /// cache; failures are logged and otherwise ignored.
    pub fn start_liveness_ping(&self, interval: Duration) {
        let transport = Arc::clone(&self.transport);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; skip it so the ping starts
            // one interval after session setup.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match transport.get_json("/health", &[]).await {
                    Ok(_) => debug!("liveness ping ok"),
                    Err(err) => debug!(kind = err.kind.as_str(), "liveness ping failed"),
                }
            }
        });
        if let Some(previous) = self.ping_task.lock().unwrap().replace(handle) {
            previous.abort();
        }
    }

    pub fn stop_liveness_ping(&self) {
        if let Some(handle) = self.ping_task.lock().unwrap().take() {
            handle.abort();
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // Don't leave a detached ping running past the session.
        if let Some(handle) = self.ping_task.lock().unwrap().take() {
            handle.abort();
        }
    }
}
