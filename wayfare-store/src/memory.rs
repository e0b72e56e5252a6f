//! In-memory repository implementations.
//!
//! Behaviorally equivalent to the Postgres repositories, including the
//! conflict semantics (duplicate booking reference, duplicate review per
//! user+tour). Used for test isolation and single-instance development runs.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use wayfare_booking::{
    Booking, BookingDetail, BookingFilter, BookingRepository, BookingStats, BookingStatus,
    BookingUpdate, CustomerSummary,
};
use wayfare_catalog::{
    PackageRepository, Review, ReviewPatch, ReviewRepository, TourPackage, TourRepository,
    TourSummary,
};
use wayfare_core::identity::{User, UserRepository};
use wayfare_core::StoreError;

pub const BOOKING_REFERENCE_CONSTRAINT: &str = "bookings_reference_key";
pub const REVIEW_USER_TOUR_CONSTRAINT: &str = "reviews_user_tour_key";

#[derive(Default)]
pub struct MemoryRepository {
    users: RwLock<HashMap<Uuid, User>>,
    tours: RwLock<HashMap<Uuid, TourSummary>>,
    packages: RwLock<HashMap<Uuid, TourPackage>>,
    bookings: RwLock<HashMap<Uuid, Booking>>,
    reviews: RwLock<HashMap<Uuid, Review>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_user(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }

    pub async fn seed_tour(&self, title: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.tours.write().await.insert(
            id,
            TourSummary {
                id,
                title: title.to_string(),
            },
        );
        id
    }

    pub async fn seed_package(&self, package: TourPackage) {
        self.packages.write().await.insert(package.id, package);
    }

    pub async fn seed_review(&self, review: Review) {
        self.reviews.write().await.insert(review.id, review);
    }

    async fn detail(&self, booking: Booking) -> Result<BookingDetail, StoreError> {
        let tour = self
            .tours
            .read()
            .await
            .get(&booking.tour_id)
            .cloned()
            .ok_or_else(|| StoreError::Storage("booking references unknown tour".to_string()))?;
        let package = self
            .packages
            .read()
            .await
            .get(&booking.package_id)
            .map(|p| p.summary())
            .ok_or_else(|| StoreError::Storage("booking references unknown package".to_string()))?;
        let customer = self
            .users
            .read()
            .await
            .get(&booking.customer_id)
            .map(|u| CustomerSummary {
                id: u.id,
                name: u.name.clone(),
                email: u.email.clone(),
            })
            .ok_or_else(|| StoreError::Storage("booking references unknown customer".to_string()))?;

        Ok(BookingDetail {
            booking,
            tour,
            package,
            customer,
        })
    }
}

#[async_trait]
impl BookingRepository for MemoryRepository {
    async fn insert(&self, booking: &Booking) -> Result<(), StoreError> {
        let mut bookings = self.bookings.write().await;
        if bookings.values().any(|b| b.reference == booking.reference) {
            return Err(StoreError::Conflict(
                BOOKING_REFERENCE_CONSTRAINT.to_string(),
            ));
        }
        bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        Ok(self.bookings.read().await.get(&id).cloned())
    }

    async fn find_detail(&self, id: Uuid) -> Result<Option<BookingDetail>, StoreError> {
        let booking = match self.bookings.read().await.get(&id).cloned() {
            Some(booking) => booking,
            None => return Ok(None),
        };
        self.detail(booking).await.map(Some)
    }

    async fn list(&self, filter: &BookingFilter) -> Result<Vec<BookingDetail>, StoreError> {
        let mut matched: Vec<Booking> = self
            .bookings
            .read()
            .await
            .values()
            .filter(|b| filter.customer_id.map_or(true, |c| b.customer_id == c))
            .filter(|b| filter.tour_id.map_or(true, |t| b.tour_id == t))
            .filter(|b| filter.status.map_or(true, |s| b.status == s))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut details = Vec::with_capacity(matched.len());
        for booking in matched {
            details.push(self.detail(booking).await?);
        }
        Ok(details)
    }

    async fn update_status(&self, id: Uuid, status: BookingStatus) -> Result<(), StoreError> {
        let mut bookings = self.bookings.write().await;
        let booking = bookings.get_mut(&id).ok_or(StoreError::NotFound)?;
        booking.status = status;
        booking.updated_at = Utc::now();
        Ok(())
    }

    async fn update_fields(&self, id: Uuid, update: &BookingUpdate) -> Result<Booking, StoreError> {
        let mut bookings = self.bookings.write().await;
        let booking = bookings.get_mut(&id).ok_or(StoreError::NotFound)?;
        if let Some(adults) = update.adults {
            booking.adults = adults;
        }
        if let Some(children) = update.children {
            booking.children = children;
        }
        if let Some(infants) = update.infants {
            booking.infants = infants;
        }
        if let Some(tour_date) = update.tour_date {
            booking.tour_date = tour_date;
        }
        if let Some(contact_email) = &update.contact_email {
            booking.contact_email = contact_email.clone();
        }
        if let Some(contact_phone) = &update.contact_phone {
            booking.contact_phone = Some(contact_phone.clone());
        }
        booking.updated_at = Utc::now();
        Ok(booking.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.bookings
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn stats(&self) -> Result<BookingStats, StoreError> {
        let bookings = self.bookings.read().await;
        let mut stats = BookingStats {
            total: bookings.len() as i64,
            pending: 0,
            confirmed: 0,
            cancelled: 0,
        };
        for booking in bookings.values() {
            match booking.status {
                BookingStatus::Pending => stats.pending += 1,
                BookingStatus::Confirmed => stats.confirmed += 1,
                BookingStatus::Cancelled => stats.cancelled += 1,
            }
        }
        Ok(stats)
    }

    async fn set_voucher_path(&self, id: Uuid, path: &str) -> Result<Option<String>, StoreError> {
        let mut bookings = self.bookings.write().await;
        let booking = bookings.get_mut(&id).ok_or(StoreError::NotFound)?;
        let previous = booking.voucher_path.replace(path.to_string());
        booking.updated_at = Utc::now();
        Ok(previous)
    }
}

#[async_trait]
impl PackageRepository for MemoryRepository {
    async fn find(&self, id: Uuid) -> Result<Option<TourPackage>, StoreError> {
        Ok(self.packages.read().await.get(&id).cloned())
    }
}

#[async_trait]
impl TourRepository for MemoryRepository {
    async fn find_summary(&self, id: Uuid) -> Result<Option<TourSummary>, StoreError> {
        Ok(self.tours.read().await.get(&id).cloned())
    }
}

#[async_trait]
impl ReviewRepository for MemoryRepository {
    async fn insert(&self, review: &Review) -> Result<(), StoreError> {
        let mut reviews = self.reviews.write().await;
        if reviews
            .values()
            .any(|r| r.user_id == review.user_id && r.tour_id == review.tour_id)
        {
            return Err(StoreError::Conflict(REVIEW_USER_TOUR_CONSTRAINT.to_string()));
        }
        reviews.insert(review.id, review.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Review>, StoreError> {
        Ok(self.reviews.read().await.get(&id).cloned())
    }

    async fn update(&self, id: Uuid, patch: &ReviewPatch) -> Result<Review, StoreError> {
        let mut reviews = self.reviews.write().await;
        let review = reviews.get_mut(&id).ok_or(StoreError::NotFound)?;
        if let Some(rating) = patch.rating {
            review.rating = rating;
        }
        if let Some(title) = &patch.title {
            review.title = Some(title.clone());
        }
        if let Some(content) = &patch.content {
            review.content = content.clone();
        }
        review.updated_at = Utc::now();
        Ok(review.clone())
    }

    async fn set_approved(&self, id: Uuid, approved: bool) -> Result<Review, StoreError> {
        let mut reviews = self.reviews.write().await;
        let review = reviews.get_mut(&id).ok_or(StoreError::NotFound)?;
        review.approved = approved;
        review.updated_at = Utc::now();
        Ok(review.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<Review, StoreError> {
        self.reviews
            .write()
            .await
            .remove(&id)
            .ok_or(StoreError::NotFound)
    }

    async fn list_approved_ratings(&self, tour_id: Uuid) -> Result<Vec<i32>, StoreError> {
        Ok(self
            .reviews
            .read()
            .await
            .values()
            .filter(|r| r.tour_id == tour_id && r.approved)
            .map(|r| r.rating)
            .collect())
    }
}

#[async_trait]
impl UserRepository for MemoryRepository {
    async fn find(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(StoreError::NotFound)?;
        user.password_hash = password_hash.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use wayfare_core::identity::UserRole;

    fn booking(customer_id: Uuid, tour_id: Uuid, package_id: Uuid, reference: &str) -> Booking {
        let now = Utc::now();
        Booking {
            id: Uuid::new_v4(),
            reference: reference.to_string(),
            customer_id,
            tour_id,
            package_id,
            adults: 2,
            children: 0,
            infants: 0,
            tour_date: NaiveDate::from_ymd_opt(2026, 9, 12).unwrap(),
            total: dec!(200.00),
            currency: "EUR".to_string(),
            contact_email: "ana@example.com".to_string(),
            contact_phone: None,
            status: BookingStatus::Pending,
            voucher_path: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_duplicate_reference_conflicts() {
        let repo = MemoryRepository::new();
        let customer_id = Uuid::new_v4();
        let tour_id = Uuid::new_v4();
        let package_id = Uuid::new_v4();

        BookingRepository::insert(&repo, &booking(customer_id, tour_id, package_id, "BK1A"))
            .await
            .unwrap();
        let duplicate =
            BookingRepository::insert(&repo, &booking(customer_id, tour_id, package_id, "BK1A"))
                .await;
        assert!(matches!(
            duplicate,
            Err(StoreError::Conflict(c)) if c == BOOKING_REFERENCE_CONSTRAINT
        ));
    }

    #[tokio::test]
    async fn test_duplicate_review_conflicts() {
        let repo = MemoryRepository::new();
        let user_id = Uuid::new_v4();
        let tour_id = Uuid::new_v4();
        let now = Utc::now();
        let review = Review {
            id: Uuid::new_v4(),
            tour_id,
            user_id,
            rating: 5,
            title: None,
            content: "Great".to_string(),
            approved: true,
            created_at: now,
            updated_at: now,
        };
        ReviewRepository::insert(&repo, &review).await.unwrap();

        let second = Review {
            id: Uuid::new_v4(),
            ..review.clone()
        };
        let duplicate = ReviewRepository::insert(&repo, &second).await;
        assert!(matches!(
            duplicate,
            Err(StoreError::Conflict(c)) if c == REVIEW_USER_TOUR_CONSTRAINT
        ));
    }

    #[tokio::test]
    async fn test_seeded_user_lookup() {
        let repo = MemoryRepository::new();
        let user = User {
            id: Uuid::new_v4(),
            email: "Ana@Example.com".to_string(),
            name: "Ana".to_string(),
            password_hash: "hash".to_string(),
            role: UserRole::Customer,
            created_at: Utc::now(),
        };
        repo.seed_user(user.clone()).await;

        let found = repo.find_by_email("ana@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
    }
}
