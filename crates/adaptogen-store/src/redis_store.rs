//! Redis-backed [`ResultStore`].

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::RwLock;

use crate::{ResultStore, StoreError};

/// Shared Redis connection used by request handlers and scheduled jobs.
///
/// Holds a [`ConnectionManager`], which multiplexes commands over one
/// connection and reconnects after transient drops. Once [`quit`] or
/// [`disconnect`] has run, every operation fails with
/// [`StoreError::Unavailable`].
///
/// [`quit`]: ResultStore::quit
/// [`disconnect`]: ResultStore::disconnect
pub struct RedisStore {
    connection: RwLock<Option<ConnectionManager>>,
}

impl RedisStore {
    /// Open a connection to `url` and verify it with a `PING`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Redis`] if the URL is malformed or the server
    /// cannot be reached.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        let manager = ConnectionManager::new(client).await?;
        let store = Self {
            connection: RwLock::new(Some(manager)),
        };
        store.ping().await?;
        tracing::info!("store: connected to redis");
        Ok(store)
    }

    async fn connection(&self) -> Result<ConnectionManager, StoreError> {
        self.connection
            .read()
            .await
            .clone()
            .ok_or(StoreError::Unavailable)
    }
}

impl ResultStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        conn.set::<_, _, ()>(key, value).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        let _pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    async fn quit(&self) -> Result<(), StoreError> {
        let mut slot = self.connection.write().await;
        let Some(mut conn) = slot.take() else {
            return Ok(());
        };
        let _ok: String = redis::cmd("QUIT").query_async(&mut conn).await?;
        Ok(())
    }

    async fn disconnect(&self) {
        self.connection.write().await.take();
    }
}
