//! Key-value storage for cached execution results.
//!
//! [`ResultStore`] is the string-keyed, string-valued seam; [`RedisStore`]
//! backs it in production and [`MemoryStore`] in tests. [`ResultCache`]
//! layers JSON encoding of [`adaptogen_core::ExecutionResult`] on top.

pub mod cache;
pub mod memory;
pub mod redis_store;

use std::future::Future;

use thiserror::Error;

pub use cache::ResultCache;
pub use memory::MemoryStore;
pub use redis_store::RedisStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("store unavailable")]
    Unavailable,

    #[error("failed to encode result for {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to decode cached result for {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A networked string store with get/set/ping semantics.
///
/// Futures are `Send` so callers may await them from spawned tasks and cron
/// callbacks on a multi-threaded runtime.
pub trait ResultStore: Send + Sync + 'static {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;

    /// Overwrite the value stored under `key`.
    fn set(&self, key: &str, value: String) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Round-trip a no-op to check reachability.
    fn ping(&self) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Close the connection gracefully.
    fn quit(&self) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Drop the connection without a close handshake.
    fn disconnect(&self) -> impl Future<Output = ()> + Send;
}
