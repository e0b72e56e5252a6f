use async_trait::async_trait;
use uuid::Uuid;

use crate::review::{Review, ReviewPatch};
use crate::tour::{TourPackage, TourSummary};
use wayfare_core::StoreError;

/// Repository trait for tour package lookups
#[async_trait]
pub trait PackageRepository: Send + Sync {
    async fn find(&self, id: Uuid) -> Result<Option<TourPackage>, StoreError>;
}

/// Repository trait for tour lookups
#[async_trait]
pub trait TourRepository: Send + Sync {
    async fn find_summary(&self, id: Uuid) -> Result<Option<TourSummary>, StoreError>;
}

/// Repository trait for review data access
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Insert a review. A second review for the same (user, tour) pair is a
    /// `StoreError::Conflict`.
    async fn insert(&self, review: &Review) -> Result<(), StoreError>;

    async fn find(&self, id: Uuid) -> Result<Option<Review>, StoreError>;

    async fn update(&self, id: Uuid, patch: &ReviewPatch) -> Result<Review, StoreError>;

    async fn set_approved(&self, id: Uuid, approved: bool) -> Result<Review, StoreError>;

    /// Delete a review, returning the deleted row so the caller can recompute
    /// the affected tour's rating.
    async fn delete(&self, id: Uuid) -> Result<Review, StoreError>;

    async fn list_approved_ratings(&self, tour_id: Uuid) -> Result<Vec<i32>, StoreError>;
}
