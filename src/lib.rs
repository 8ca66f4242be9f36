//! # testflowx-client
//!
//! TestFlowX 测试结果平台的 Rust 客户端 SDK，内置请求去重与响应缓存。
//!
//! Client SDK for the TestFlowX test-results API: projects, API keys, and
//! test runs over a shared request de-duplication and caching core.
//!
//! ## Overview
//!
//! Dashboards mount many views of the same remote data at once. The naive
//! result is N identical fetches per screen; the core of this crate makes
//! that impossible: for any request identity, at most one network call is
//! in flight, every concurrent caller shares its outcome, and cached
//! responses stay coherent across mutations through explicit invalidation.
//!
//! ## Core Guarantees
//!
//! - **Singleflight**: concurrent requests for one key collapse into one
//!   network call; all callers see the same value or the same error.
//! - **Coherent invalidation**: an invalidation is visible to every read
//!   issued after it returns; key mutations invalidate their family before
//!   the mutation call completes.
//! - **Errors as values**: failures are classified once at the transport
//!   boundary and never cached.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use testflowx_client::{Environment, TestFlowClient};
//!
//! #[tokio::main]
//! async fn main() -> testflowx_client::Result<()> {
//!     let client = TestFlowClient::builder()
//!         .environment(Environment::Production)
//!         .token("tfx_live_...")
//!         .build()?;
//!
//!     // Both observe one GET /projects/p1 even when racing.
//!     let (a, b) = tokio::join!(
//!         client.projects().fetch_project("p1"),
//!         client.projects().fetch_project("p1"),
//!     );
//!     println!("{} / {}", a?.name, b?.name);
//!
//!     let gate = client.api_key_gate();
//!     let outcome = gate.evaluate("p1").await;
//!     println!("decision: {:?}", outcome.decision);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cache`] | Request keys, store backends, singleflight, coordinator |
//! | [`transport`] | One-call-per-invocation HTTP fetcher |
//! | [`api`] | Domain caches: projects, api keys, test runs |
//! | [`guard`] | Route-guard state machine over the key check |
//! | [`session`] | Token lifecycle, teardown, liveness ping |
//! | [`types`] | Typed wire envelopes (the validation boundary) |
//! | [`config`] | Environments, timeouts, TTL |
//! | [`error`] | Classified error kinds, error-as-value convention |

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod guard;
pub mod session;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use api::{ApiKeyCache, ApiKeyState, ProjectCache, ProjectState, TestRunCache};
pub use cache::{CoordinatorStats, RequestCoordinator, RequestKey, RequestOptions};
pub use client::{TestFlowClient, TestFlowClientBuilder};
pub use config::{ClientConfig, Environment};
pub use error::{ApiError, ErrorKind};
pub use guard::{ApiKeyGate, GateDecision, GateOutcome, GateState};
pub use session::Session;
pub use types::{ApiKey, ApiKeyStatus, Project, TestRun};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, ApiError>;
