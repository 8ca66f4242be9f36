//! 领域缓存：绑定具体端点的协调器特化。
//!
//! # Domain Caches
//!
//! Thin specializations of [`RequestCoordinator`](crate::cache::RequestCoordinator)
//! bound to concrete endpoints. All three share one coordinator, one store,
//! and one in-flight registry — the consolidation that keeps a gate check
//! and a list view from racing duplicate fetches.
//!
//! | Cache | Endpoints |
//! |-------|-----------|
//! | [`ProjectCache`] | `GET /projects/{id}` |
//! | [`ApiKeyCache`] | `GET /api-keys` + key mutations |
//! | [`TestRunCache`] | `GET /test-runs?projectId=<id>` |

mod api_keys;
mod projects;
mod test_runs;

pub use api_keys::{ApiKeyCache, ApiKeyState};
pub use projects::{ProjectCache, ProjectState};
pub use test_runs::TestRunCache;
