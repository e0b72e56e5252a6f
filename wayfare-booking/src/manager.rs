use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{
    Booking, BookingDetail, BookingFilter, BookingStats, BookingStatus, BookingUpdate,
    CreateBooking,
};
use crate::repository::BookingRepository;
use crate::{pricing, reference};
use wayfare_catalog::PackageRepository;
use wayfare_core::StoreError;

/// How many fresh references to try before giving up on a create.
const MAX_REFERENCE_ATTEMPTS: u32 = 3;

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("booking not found: {0}")]
    NotFound(Uuid),
    #[error("package not found: {0}")]
    PackageNotFound(Uuid),
    #[error("invalid booking: {0}")]
    Validation(String),
    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },
    #[error("could not allocate a unique booking reference")]
    ReferenceExhausted,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Manages the booking lifecycle: creation with price computation and
/// reference assignment, read projections, guarded status transitions,
/// updates, removal and stats.
pub struct BookingManager {
    bookings: Arc<dyn BookingRepository>,
    packages: Arc<dyn PackageRepository>,
}

impl BookingManager {
    pub fn new(bookings: Arc<dyn BookingRepository>, packages: Arc<dyn PackageRepository>) -> Self {
        Self { bookings, packages }
    }

    /// Create a booking in PENDING state. The total is computed from the
    /// package's tier prices at this moment and never recomputed.
    pub async fn create(
        &self,
        customer_id: Uuid,
        request: CreateBooking,
    ) -> Result<BookingDetail, BookingError> {
        request.party.validate().map_err(BookingError::Validation)?;

        let package = self
            .packages
            .find(request.package_id)
            .await?
            .ok_or(BookingError::PackageNotFound(request.package_id))?;
        if package.tour_id != request.tour_id {
            return Err(BookingError::Validation(format!(
                "package {} does not belong to tour {}",
                package.id, request.tour_id
            )));
        }

        let total = pricing::party_total(&request.party, &package);

        for attempt in 1..=MAX_REFERENCE_ATTEMPTS {
            let booking = Booking::new(customer_id, &request, reference::generate(), total, &package);
            match self.bookings.insert(&booking).await {
                Ok(()) => {
                    info!(
                        booking_id = %booking.id,
                        reference = %booking.reference,
                        %total,
                        "booking created"
                    );
                    return self
                        .bookings
                        .find_detail(booking.id)
                        .await?
                        .ok_or_else(|| {
                            StoreError::Storage("created booking vanished".to_string()).into()
                        });
                }
                Err(StoreError::Conflict(constraint)) if constraint.contains("reference") => {
                    warn!(attempt, "booking reference collided, regenerating");
                }
                Err(other) => return Err(other.into()),
            }
        }
        Err(BookingError::ReferenceExhausted)
    }

    pub async fn get(&self, id: Uuid) -> Result<BookingDetail, BookingError> {
        self.bookings
            .find_detail(id)
            .await?
            .ok_or(BookingError::NotFound(id))
    }

    pub async fn list(&self, filter: BookingFilter) -> Result<Vec<BookingDetail>, BookingError> {
        Ok(self.bookings.list(&filter).await?)
    }

    pub async fn list_by_customer(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<BookingDetail>, BookingError> {
        let filter = BookingFilter {
            customer_id: Some(customer_id),
            ..Default::default()
        };
        Ok(self.bookings.list(&filter).await?)
    }

    /// Transition a booking per the status table; anything else is rejected.
    pub async fn update_status(
        &self,
        id: Uuid,
        next: BookingStatus,
    ) -> Result<BookingDetail, BookingError> {
        let booking = self
            .bookings
            .find(id)
            .await?
            .ok_or(BookingError::NotFound(id))?;

        if !booking.status.can_transition_to(next) {
            return Err(BookingError::InvalidTransition {
                from: booking.status,
                to: next,
            });
        }

        self.bookings.update_status(id, next).await?;
        info!(booking_id = %id, from = %booking.status, to = %next, "booking status updated");
        self.get(id).await
    }

    pub async fn update(
        &self,
        id: Uuid,
        update: BookingUpdate,
    ) -> Result<BookingDetail, BookingError> {
        if update.touches_party() {
            let current = self
                .bookings
                .find(id)
                .await?
                .ok_or(BookingError::NotFound(id))?;
            let mut party = current.party();
            if let Some(adults) = update.adults {
                party.adults = adults;
            }
            if let Some(children) = update.children {
                party.children = children;
            }
            if let Some(infants) = update.infants {
                party.infants = infants;
            }
            party.validate().map_err(BookingError::Validation)?;
        }

        match self.bookings.update_fields(id, &update).await {
            Ok(_) => self.get(id).await,
            Err(StoreError::NotFound) => Err(BookingError::NotFound(id)),
            Err(other) => Err(other.into()),
        }
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), BookingError> {
        match self.bookings.delete(id).await {
            Ok(()) => Ok(()),
            Err(StoreError::NotFound) => Err(BookingError::NotFound(id)),
            Err(other) => Err(other.into()),
        }
    }

    pub async fn stats(&self) -> Result<BookingStats, BookingError> {
        Ok(self.bookings.stats().await?)
    }
}
