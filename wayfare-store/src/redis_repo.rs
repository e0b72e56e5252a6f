use async_trait::async_trait;
use chrono::Utc;
use redis::{AsyncCommands, RedisResult};
use std::sync::Arc;
use tracing::info;

use wayfare_core::verification::{CodeStore, VerificationCode};
use wayfare_core::StoreError;

#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
}

impl RedisClient {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    pub async fn set_code(
        &self,
        email: &str,
        payload: &str,
        ttl_seconds: u64,
    ) -> Result<(), redis::RedisError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("verification:{}", email);
        conn.set_ex::<_, _, ()>(key, payload, ttl_seconds).await?;
        info!("Verification code stored for {}", email);
        Ok(())
    }

    pub async fn get_code(&self, email: &str) -> Result<Option<String>, redis::RedisError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("verification:{}", email);
        let payload: Option<String> = conn.get(key).await?;
        Ok(payload)
    }

    pub async fn del_code(&self, email: &str) -> Result<(), redis::RedisError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("verification:{}", email);
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    pub async fn check_rate_limit(
        &self,
        key: &str,
        limit: i64,
        window_seconds: i64,
    ) -> RedisResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let (count,): (i64,) = redis::pipe()
            .atomic()
            .incr(key, 1)
            .expire(key, window_seconds)
            .query_async(&mut conn)
            .await?;

        Ok(count <= limit)
    }
}

/// Redis-backed `CodeStore` so verification codes survive restarts and are
/// shared across instances. The redundant SET EX deadline only garbage
/// collects; the authoritative expiry stays inside the stored value.
pub struct RedisCodeStore {
    client: Arc<RedisClient>,
}

impl RedisCodeStore {
    pub fn new(client: Arc<RedisClient>) -> Self {
        Self { client }
    }
}

fn map_redis(err: redis::RedisError) -> StoreError {
    StoreError::Storage(err.to_string())
}

#[async_trait]
impl CodeStore for RedisCodeStore {
    async fn put(&self, key: &str, value: VerificationCode) -> Result<(), StoreError> {
        let payload =
            serde_json::to_string(&value).map_err(|e| StoreError::Storage(e.to_string()))?;
        // Keep the key around a little past its logical expiry so an expired
        // submission can still be told apart from an unknown one.
        let ttl = (value.expires_at - Utc::now()).num_seconds().max(1) as u64 + 60;
        self.client
            .set_code(key, &payload, ttl)
            .await
            .map_err(map_redis)
    }

    async fn get(&self, key: &str) -> Result<Option<VerificationCode>, StoreError> {
        let payload = self.client.get_code(key).await.map_err(map_redis)?;
        payload
            .map(|p| serde_json::from_str(&p).map_err(|e| StoreError::Storage(e.to_string())))
            .transpose()
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.client.del_code(key).await.map_err(map_redis)
    }
}
