//! Get-or-fetch orchestration over store + registry.

use super::inflight::InFlightRegistry;
use super::key::RequestKey;
use super::store::CacheStore;
use crate::error::ApiError;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Per-request options for [`RequestCoordinator::request`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestOptions {
    /// Skip the cache read (not the in-flight registry: a forced refresh
    /// still joins a fetch that is already running for the key).
    pub force_refresh: bool,
    /// Entry lifetime override; falls back to the coordinator default.
    pub ttl: Option<Duration>,
}

impl RequestOptions {
    pub fn force_refresh() -> Self {
        Self {
            force_refresh: true,
            ttl: None,
        }
    }
}

/// Counters observed across the coordinator's lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoordinatorStats {
    pub hits: u64,
    pub misses: u64,
    /// Calls that joined an already-in-flight fetch instead of starting one.
    pub dedup_joins: u64,
    /// Fetches actually started.
    pub fetches: u64,
    pub errors: u64,
}

#[derive(Default)]
struct AtomicStats {
    hits: AtomicU64,
    misses: AtomicU64,
    dedup_joins: AtomicU64,
    fetches: AtomicU64,
    errors: AtomicU64,
}

impl AtomicStats {
    fn snapshot(&self) -> CoordinatorStats {
        CoordinatorStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            dedup_joins: self.dedup_joins.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Orchestrates store + registry to answer get-or-fetch requests.
///
/// The contract, in order:
/// 1. a fresh cache hit returns immediately (unless `force_refresh`);
/// 2. otherwise the registry either joins the in-flight fetch for the key or
///    starts one;
/// 3. a successful result is written to the store *before* the registry
///    entry is released, so there is no instant where neither can answer;
/// 4. errors propagate as values to every waiter and are never cached.
pub struct RequestCoordinator {
    store: Arc<dyn CacheStore>,
    inflight: InFlightRegistry,
    default_ttl: Option<Duration>,
    stats: Arc<AtomicStats>,
}

impl RequestCoordinator {
    pub fn new(store: Arc<dyn CacheStore>, default_ttl: Option<Duration>) -> Self {
        Self {
            store,
            inflight: InFlightRegistry::new(),
            default_ttl,
            stats: Arc::new(AtomicStats::default()),
        }
    }

    /// Answer a get-or-fetch request for `key`.
    ///
    /// `fetch` is invoked at most once per in-flight cycle, and only when no
    /// fresh cached value exists.
    pub async fn request<F, Fut>(
        &self,
        key: &RequestKey,
        options: RequestOptions,
        fetch: F,
    ) -> Result<serde_json::Value, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<serde_json::Value, ApiError>> + Send + 'static,
    {
        if !options.force_refresh {
            if let Some(value) = self.store.get(key).await {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "cache hit");
                return Ok(value);
            }
        }
        self.stats.misses.fetch_add(1, Ordering::Relaxed);

        let store = Arc::clone(&self.store);
        let ttl = options.ttl.or(self.default_ttl);
        let store_key = key.clone();
        let (shared, started) = self.inflight.get_or_start(key, move || {
            let fut = fetch();
            async move {
                let result = fut.await;
                if let Ok(ref value) = result {
                    // Written before the registry entry is released.
                    store.put(&store_key, value.clone(), ttl).await;
                }
                result
            }
            .boxed()
        });

        if started {
            self.stats.fetches.fetch_add(1, Ordering::Relaxed);
        } else {
            self.stats.dedup_joins.fetch_add(1, Ordering::Relaxed);
        }

        let result = shared.await;
        if result.is_err() {
            self.stats.errors.fetch_add(1, Ordering::Relaxed);
        }
        result
    }

    /// [`request`](Self::request) plus typed deserialization; a payload that
    /// does not match `T` surfaces as a `Validation` error.
    pub async fn request_as<T, F, Fut>(
        &self,
        key: &RequestKey,
        options: RequestOptions,
        fetch: F,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<serde_json::Value, ApiError>> + Send + 'static,
    {
        let value = self.request(key, options, fetch).await?;
        serde_json::from_value(value).map_err(ApiError::from)
    }

    /// Drop one cached entry. Visible to every read issued after this
    /// returns; an in-flight fetch for the key is unaffected (its result
    /// lands in the next cycle's cache, per the serializable-per-key model).
    pub async fn invalidate(&self, key: &RequestKey) {
        if self.store.invalidate(key).await {
            debug!(key = %key, "invalidated cache entry");
        }
    }

    /// Drop every entry addressing `endpoint`, regardless of params.
    pub async fn invalidate_endpoint(&self, endpoint: &str) {
        let dropped = self
            .store
            .invalidate_matching(&|k| k.matches_endpoint(endpoint))
            .await;
        debug!(endpoint, dropped, "invalidated endpoint family");
    }

    /// Drop every entry tied to a project: its own resource plus any query
    /// scoped to it. Mutation call sites use this after create/revoke/rotate.
    pub async fn invalidate_project(&self, project_id: &str) {
        let resource = format!("/projects/{project_id}");
        let dropped = self
            .store
            .invalidate_matching(&|k| {
                k.matches_endpoint(&resource) || k.has_param("projectId", project_id)
            })
            .await;
        debug!(project_id, dropped, "invalidated project entries");
    }

    /// Session teardown: drop all cached entries. In-flight fetches settle
    /// on their own and deregister themselves.
    pub async fn clear(&self) {
        self.store.clear().await;
        debug!("cache cleared");
    }

    pub fn stats(&self) -> CoordinatorStats {
        self.stats.snapshot()
    }

    pub fn store_name(&self) -> &'static str {
        self.store.name()
    }

    #[cfg(test)]
    pub(crate) fn inflight_len(&self) -> usize {
        self.inflight.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::store::MemoryStore;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    fn coordinator() -> RequestCoordinator {
        RequestCoordinator::new(Arc::new(MemoryStore::new(100)), None)
    }

    fn key() -> RequestKey {
        RequestKey::get("/projects/p1")
    }

    fn counting_fetch(
        calls: &Arc<AtomicUsize>,
        value: serde_json::Value,
    ) -> impl Future<Output = Result<serde_json::Value, ApiError>> + Send + 'static {
        let calls = Arc::clone(calls);
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(value)
        }
    }

    #[tokio::test]
    async fn hit_after_fetch_skips_network() {
        let coord = coordinator();
        let calls = Arc::new(AtomicUsize::new(0));

        let first = coord
            .request(&key(), RequestOptions::default(), || {
                counting_fetch(&calls, json!({"id": "p1"}))
            })
            .await
            .unwrap();
        let second = coord
            .request(&key(), RequestOptions::default(), || {
                counting_fetch(&calls, json!({"id": "other"}))
            })
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let stats = coord.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.fetches, 1);
    }

    #[tokio::test]
    async fn concurrent_requests_coalesce() {
        let coord = Arc::new(coordinator());
        let calls = Arc::new(AtomicUsize::new(0));

        let slow_fetch = || {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(json!({"id": "p1"}))
            }
        };

        let k = key();
        let (a, b, c) = tokio::join!(
            coord.request(&k, RequestOptions::default(), slow_fetch),
            coord.request(&k, RequestOptions::default(), slow_fetch),
            coord.request(&k, RequestOptions::default(), slow_fetch),
        );

        assert_eq!(a.unwrap(), json!({"id": "p1"}));
        assert_eq!(b.unwrap(), json!({"id": "p1"}));
        assert_eq!(c.unwrap(), json!({"id": "p1"}));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(coord.stats().dedup_joins, 2);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let coord = coordinator();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            coord
                .request(&key(), RequestOptions::default(), || {
                    counting_fetch(&calls, json!(1))
                })
                .await
                .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        coord.invalidate(&key()).await;
        coord
            .request(&key(), RequestOptions::default(), || {
                counting_fetch(&calls, json!(2))
            })
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn errors_are_never_cached() {
        let coord = coordinator();
        let calls = Arc::new(AtomicUsize::new(0));

        let failing = || {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ApiError::network("down"))
            }
        };

        assert!(coord
            .request(&key(), RequestOptions::default(), failing)
            .await
            .is_err());
        assert!(coord
            .request(&key(), RequestOptions::default(), failing)
            .await
            .is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(coord.stats().errors, 2);
        assert_eq!(coord.inflight_len(), 0);
    }

    #[tokio::test]
    async fn force_refresh_bypasses_cache_read() {
        let coord = coordinator();
        let calls = Arc::new(AtomicUsize::new(0));

        coord
            .request(&key(), RequestOptions::default(), || {
                counting_fetch(&calls, json!("stale"))
            })
            .await
            .unwrap();
        let refreshed = coord
            .request(&key(), RequestOptions::force_refresh(), || {
                counting_fetch(&calls, json!("fresh"))
            })
            .await
            .unwrap();

        assert_eq!(refreshed, json!("fresh"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        // The refreshed value replaced the cached one.
        let cached = coord
            .request(&key(), RequestOptions::default(), || {
                counting_fetch(&calls, json!("never"))
            })
            .await
            .unwrap();
        assert_eq!(cached, json!("fresh"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidate_project_drops_resource_and_scoped_queries() {
        let coord = coordinator();
        let calls = Arc::new(AtomicUsize::new(0));
        let p1 = RequestKey::get("/projects/p1");
        let keys_p1 = RequestKey::get("/api-keys").with_param("projectId", "p1");
        let p2 = RequestKey::get("/projects/p2");

        for k in [&p1, &keys_p1, &p2] {
            coord
                .request(k, RequestOptions::default(), || {
                    counting_fetch(&calls, json!("v"))
                })
                .await
                .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        coord.invalidate_project("p1").await;

        // p1-tied entries refetch, p2 still hits.
        for k in [&p1, &keys_p1, &p2] {
            coord
                .request(k, RequestOptions::default(), || {
                    counting_fetch(&calls, json!("v2"))
                })
                .await
                .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn typed_requests_validate_shape() {
        #[derive(Debug, serde::Deserialize)]
        struct Narrow {
            #[allow(dead_code)]
            id: u64,
        }

        let coord = coordinator();
        let err = coord
            .request_as::<Narrow, _, _>(&key(), RequestOptions::default(), || async {
                Ok(json!({"id": "not-a-number"}))
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Validation);
    }
}
