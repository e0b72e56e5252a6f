//! Short-lived verification codes authorizing a password change.
//!
//! Codes live behind the `CodeStore` capability so deployments can swap the
//! process-local map for an external expiring key-value store without touching
//! the service logic. Expiry is carried in the stored value: an expired
//! submission is reported as expired (and removed), not as unknown.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::StoreError;

pub const CODE_TTL_MINUTES: i64 = 15;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationCode {
    pub code: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Expiring key-value capability: put/get/delete keyed by user email.
#[async_trait]
pub trait CodeStore: Send + Sync {
    async fn put(&self, key: &str, value: VerificationCode) -> Result<(), StoreError>;

    async fn get(&self, key: &str) -> Result<Option<VerificationCode>, StoreError>;

    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// Process-local store. State is lost on restart and not shared across
/// instances; multi-instance deployments use the Redis-backed store instead.
#[derive(Default)]
pub struct MemoryCodeStore {
    entries: RwLock<HashMap<String, VerificationCode>>,
}

impl MemoryCodeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CodeStore for MemoryCodeStore {
    async fn put(&self, key: &str, value: VerificationCode) -> Result<(), StoreError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<VerificationCode>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("verification code is invalid")]
    InvalidCode,
    #[error("verification code has expired")]
    ExpiredCode,
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct VerificationService {
    store: Arc<dyn CodeStore>,
    ttl: Duration,
}

impl VerificationService {
    pub fn new(store: Arc<dyn CodeStore>) -> Self {
        Self {
            store,
            ttl: Duration::minutes(CODE_TTL_MINUTES),
        }
    }

    /// Issue a fresh 6-digit code for the given account. A previously issued
    /// code for the same email is superseded.
    pub async fn issue(&self, email: &str, user_id: Uuid) -> Result<VerificationCode, VerificationError> {
        self.issue_at(email, user_id, Utc::now()).await
    }

    pub async fn issue_at(
        &self,
        email: &str,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<VerificationCode, VerificationError> {
        let code = format!("{:06}", rand::thread_rng().gen_range(0..1_000_000));
        let entry = VerificationCode {
            code,
            user_id,
            expires_at: now + self.ttl,
        };
        self.store.put(email, entry.clone()).await?;
        info!(email, expires_at = %entry.expires_at, "verification code issued");
        Ok(entry)
    }

    /// Single-use consumption: a matching, unexpired code is deleted and the
    /// owning user id returned. An expired code is deleted and reported as
    /// expired. Anything else is invalid.
    pub async fn consume(&self, email: &str, code: &str) -> Result<Uuid, VerificationError> {
        self.consume_at(email, code, Utc::now()).await
    }

    pub async fn consume_at(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Uuid, VerificationError> {
        let entry = self
            .store
            .get(email)
            .await?
            .ok_or(VerificationError::InvalidCode)?;

        if now > entry.expires_at {
            self.store.delete(email).await?;
            return Err(VerificationError::ExpiredCode);
        }
        if entry.code != code {
            return Err(VerificationError::InvalidCode);
        }

        self.store.delete(email).await?;
        Ok(entry.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> (VerificationService, Arc<MemoryCodeStore>) {
        let store = Arc::new(MemoryCodeStore::new());
        (VerificationService::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_issue_and_consume() {
        let (service, _) = service();
        let user_id = Uuid::new_v4();

        let issued = service.issue("traveler@example.com", user_id).await.unwrap();
        assert_eq!(issued.code.len(), 6);
        assert!(issued.code.chars().all(|c| c.is_ascii_digit()));

        let consumed = service
            .consume("traveler@example.com", &issued.code)
            .await
            .unwrap();
        assert_eq!(consumed, user_id);
    }

    #[tokio::test]
    async fn test_code_is_single_use() {
        let (service, _) = service();
        let issued = service.issue("traveler@example.com", Uuid::new_v4()).await.unwrap();

        service.consume("traveler@example.com", &issued.code).await.unwrap();
        let second = service.consume("traveler@example.com", &issued.code).await;
        assert!(matches!(second, Err(VerificationError::InvalidCode)));
    }

    #[tokio::test]
    async fn test_wrong_code_rejected_but_kept() {
        let (service, _) = service();
        let issued = service.issue("traveler@example.com", Uuid::new_v4()).await.unwrap();

        let wrong = service.consume("traveler@example.com", "000000").await;
        // Guard against the 1-in-a-million collision with the real code.
        if issued.code != "000000" {
            assert!(matches!(wrong, Err(VerificationError::InvalidCode)));
            // A mistyped code does not burn the issued one.
            service.consume("traveler@example.com", &issued.code).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_expired_code_is_rejected_and_removed() {
        let (service, store) = service();
        let issued_at = Utc::now();
        let issued = service
            .issue_at("traveler@example.com", Uuid::new_v4(), issued_at)
            .await
            .unwrap();

        // Just past the 15 minute window.
        let later = issued_at + Duration::minutes(CODE_TTL_MINUTES) + Duration::seconds(1);
        let result = service
            .consume_at("traveler@example.com", &issued.code, later)
            .await;
        assert!(matches!(result, Err(VerificationError::ExpiredCode)));

        // The entry is gone, so a retry reports invalid rather than expired.
        assert!(store.get("traveler@example.com").await.unwrap().is_none());
        let retry = service
            .consume_at("traveler@example.com", &issued.code, later)
            .await;
        assert!(matches!(retry, Err(VerificationError::InvalidCode)));
    }

    #[tokio::test]
    async fn test_unknown_email_is_invalid() {
        let (service, _) = service();
        let result = service.consume("nobody@example.com", "123456").await;
        assert!(matches!(result, Err(VerificationError::InvalidCode)));
    }
}
