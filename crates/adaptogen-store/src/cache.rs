//! JSON-encoded execution results keyed by command fingerprint.

use adaptogen_core::{ExecutionResult, Fingerprint};

use crate::{ResultStore, StoreError};

/// Latest [`ExecutionResult`] per fingerprint. Entries never expire; a
/// `put` simply overwrites whatever was there.
#[derive(Debug)]
pub struct ResultCache<S> {
    store: S,
}

impl<S: ResultStore> ResultCache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Underlying store, for health checks and shutdown.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the store is unreachable or the stored value
    /// is not a valid result record.
    pub async fn get(&self, key: &Fingerprint) -> Result<Option<ExecutionResult>, StoreError> {
        let Some(raw) = self.store.get(key.as_str()).await? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StoreError::Decode {
                key: key.to_string(),
                source,
            })
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the store is unreachable.
    pub async fn put(&self, key: &Fingerprint, result: &ExecutionResult) -> Result<(), StoreError> {
        let raw = serde_json::to_string(result).map_err(|source| StoreError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.store.set(key.as_str(), raw).await
    }
}

#[cfg(test)]
mod tests {
    use adaptogen_core::fingerprint;

    use super::*;
    use crate::MemoryStore;

    #[tokio::test]
    async fn get_reports_corrupt_entries() {
        let store = MemoryStore::new();
        let key = fingerprint("echo corrupt");
        store.set(key.as_str(), "{not json".to_string()).await.unwrap();

        let cache = ResultCache::new(store);
        let err = cache.get(&key).await.unwrap_err();
        assert!(matches!(err, StoreError::Decode { .. }), "got {err:?}");
    }
}
