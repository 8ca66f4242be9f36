//! In-flight request de-duplication.

use super::key::RequestKey;
use crate::error::ApiError;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Outcome future shared by every caller of one in-flight request.
pub type SharedFetch = Shared<BoxFuture<'static, Result<serde_json::Value, ApiError>>>;

/// Tracks the one future currently resolving each key, so concurrent callers
/// share a single network call instead of racing duplicates.
///
/// The check-and-register in [`get_or_start`](Self::get_or_start) is a
/// single synchronous critical section: no await point separates the lookup
/// from the insert, which is the whole anti-duplication guarantee.
pub struct InFlightRegistry {
    entries: Arc<Mutex<HashMap<RequestKey, SharedFetch>>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Join the in-flight request for `key`, or start one via `factory`.
    ///
    /// Returns the shared outcome future and whether this call started the
    /// fetch. The factory must only construct its future — any real work
    /// belongs inside it. The fetch runs on a spawned task, so it settles
    /// (and deregisters itself) even if every caller is cancelled first; a
    /// timed-out fetch therefore never wedges the key.
    pub fn get_or_start<F>(&self, key: &RequestKey, factory: F) -> (SharedFetch, bool)
    where
        F: FnOnce() -> BoxFuture<'static, Result<serde_json::Value, ApiError>>,
    {
        let mut entries = self.entries.lock().unwrap();
        if let Some(existing) = entries.get(key) {
            debug!(key = %key, "joining in-flight request");
            return (existing.clone(), false);
        }

        let fut = factory();
        let registry = Arc::clone(&self.entries);
        let settled_key = key.clone();
        let task = tokio::spawn(async move {
            let result = fut.await;
            registry.lock().unwrap().remove(&settled_key);
            result
        });
        let shared: SharedFetch = async move {
            match task.await {
                Ok(result) => result,
                // The fetch task itself died (panic or runtime shutdown).
                Err(join_err) => Err(ApiError::unknown(format!("fetch task failed: {join_err}"))),
            }
        }
        .boxed()
        .shared();

        entries.insert(key.clone(), shared.clone());
        (shared, true)
    }

    /// Whether a request for `key` is currently in flight.
    pub fn contains(&self, key: &RequestKey) -> bool {
        self.entries.lock().unwrap().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InFlightRegistry {
    fn default() -> Self {
        Self::new()
    }
}
