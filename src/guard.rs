//! Route-guard collaborator: blocks rendering until the api-key
//! precondition resolves.

use crate::api::ApiKeyCache;
use crate::types::ApiKeyStatus;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Terminal decision for a guarded route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// The project has at least one key; render the guarded children.
    RenderChildren,
    /// No keys (or the check failed): send the user to the api-keys page.
    RedirectToApiKeys,
}

/// Observable gate lifecycle: `Checking` until the key check resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GateState {
    #[default]
    Checking,
    Resolved(GateDecision),
}

/// Resolved outcome handed to the routing layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateOutcome {
    pub decision: GateDecision,
    pub status: ApiKeyStatus,
    /// Error string when the check failed and the gate failed closed.
    pub error: Option<String>,
}

/// The `ApiKeyCheck` guard: `Checking -> {RedirectToApiKeys | RenderChildren}`.
///
/// Evaluation always terminates in a decision — a failed check resolves to
/// the redirect (fail closed) rather than leaving the caller in `Checking`.
/// The underlying key fetch is shared with any concurrently mounted list
/// view through the in-flight registry, so gate + list cost one request.
pub struct ApiKeyGate {
    keys: Arc<ApiKeyCache>,
    state: watch::Sender<GateState>,
}

impl ApiKeyGate {
    pub fn new(keys: Arc<ApiKeyCache>) -> Self {
        let (state, _) = watch::channel(GateState::default());
        Self { keys, state }
    }

    /// Run the check for `project_id` and resolve the gate.
    pub async fn evaluate(&self, project_id: &str) -> GateOutcome {
        self.state.send_replace(GateState::Checking);
        let status = self.keys.check_api_keys(project_id).await;
        let error = self.keys.state().error;

        let decision = if status.has_keys {
            GateDecision::RenderChildren
        } else {
            GateDecision::RedirectToApiKeys
        };
        debug!(project_id, ?decision, "gate resolved");
        self.state.send_replace(GateState::Resolved(decision));

        GateOutcome {
            decision,
            status,
            error,
        }
    }

    pub fn state(&self) -> GateState {
        *self.state.borrow()
    }

    /// Watch the `Checking -> Resolved` transition.
    pub fn subscribe(&self) -> watch::Receiver<GateState> {
        self.state.subscribe()
    }
}
