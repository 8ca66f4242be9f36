//! 请求缓存核心：请求去重与响应缓存的协调层。
//!
//! # Request Cache Core
//!
//! This module is the crate's center of gravity: it guarantees that, for any
//! request identity, at most one network call is in flight at a time, and
//! that cached responses stay coherent across mutations.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`RequestKey`] | Canonical identity of a cacheable request |
//! | [`CacheStore`] | Backend trait for cached responses |
//! | [`MemoryStore`] | Bounded in-memory store with lazy TTL expiration |
//! | [`NullStore`] | No-op store for running cache-disabled |
//! | [`InFlightRegistry`] | Singleflight: concurrent callers share one fetch |
//! | [`RequestCoordinator`] | Get-or-fetch orchestration, invalidation, stats |
//!
//! ## Invariants
//!
//! - At most one fetch per key is in flight at any instant; the
//!   check-and-register step is a synchronous critical section.
//! - A read never returns a value fetched for a different key.
//! - Invalidation of a key is visible to every read issued after the call
//!   returns.
//! - Errors propagate to every waiter and are never cached.

mod coordinator;
mod inflight;
mod key;
mod store;

pub use coordinator::{CoordinatorStats, RequestCoordinator, RequestOptions};
pub use inflight::{InFlightRegistry, SharedFetch};
pub use key::RequestKey;
pub use store::{CacheStore, KeyMatcher, MemoryStore, NullStore};
