use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    Booking, BookingDetail, BookingFilter, BookingStats, BookingStatus, BookingUpdate,
};
use wayfare_core::StoreError;

/// Repository trait for booking data access. List projections are ordered
/// newest-first.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Insert a new booking. A duplicate reference is a `StoreError::Conflict`
    /// naming the reference constraint.
    async fn insert(&self, booking: &Booking) -> Result<(), StoreError>;

    async fn find(&self, id: Uuid) -> Result<Option<Booking>, StoreError>;

    async fn find_detail(&self, id: Uuid) -> Result<Option<BookingDetail>, StoreError>;

    async fn list(&self, filter: &BookingFilter) -> Result<Vec<BookingDetail>, StoreError>;

    async fn update_status(&self, id: Uuid, status: BookingStatus) -> Result<(), StoreError>;

    async fn update_fields(&self, id: Uuid, update: &BookingUpdate) -> Result<Booking, StoreError>;

    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;

    async fn stats(&self) -> Result<BookingStats, StoreError>;

    /// Record the persisted voucher location, returning the previously stored
    /// one (if any) so the caller can clean it up.
    async fn set_voucher_path(&self, id: Uuid, path: &str) -> Result<Option<String>, StoreError>;
}
