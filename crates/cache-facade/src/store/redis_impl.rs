//! # Redis Store
//!
//! [`CacheStore`] backed by a single multiplexed Redis connection.
//!
//! Opening the store only parses the URL. The managed connection is
//! established by the first operation (or health check) that needs it; while
//! the server is unreachable every operation fails with
//! [`CacheError::Connection`](crate::CacheError::Connection) and the next one
//! tries again.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, Client};
use tokio::sync::OnceCell;

use super::traits::CacheStore;
use crate::error::Result;

/// Redis backend sharing one managed connection across all callers
#[derive(Clone)]
pub struct RedisStore {
    client: Client,
    manager_config: ConnectionManagerConfig,
    conn: Arc<OnceCell<ConnectionManager>>,
}

impl RedisStore {
    /// Open a client for `url` without touching the network
    ///
    /// Each connection attempt gives up after `connect_timeout`, and failed
    /// attempts are not retried.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed.
    pub fn open(url: &str, connect_timeout: Duration) -> Result<Self> {
        let client = Client::open(url)?;
        let manager_config = ConnectionManagerConfig::new()
            .set_number_of_retries(0)
            .set_connection_timeout(connect_timeout);

        Ok(Self {
            client,
            manager_config,
            conn: Arc::new(OnceCell::new()),
        })
    }

    /// Whether the managed connection has been established
    pub fn is_established(&self) -> bool {
        self.conn.initialized()
    }

    async fn connection(&self) -> Result<ConnectionManager> {
        let conn = self
            .conn
            .get_or_try_init(|| async {
                let conn = ConnectionManager::new_with_config(
                    self.client.clone(),
                    self.manager_config.clone(),
                )
                .await?;
                tracing::info!("Redis connection established");
                Ok::<_, redis::RedisError>(conn)
            })
            .await?;

        Ok(conn.clone())
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: () = conn.set_ex(key, value, ttl_secs).await?;
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection().await?;
        let deleted: i64 = conn.del(key).await?;
        Ok(deleted > 0)
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
