use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::repository::{ReviewRepository, TourRepository};
use wayfare_core::StoreError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub tour_id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
    pub title: Option<String>,
    pub content: String,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Review {
    /// Reviews go live immediately; moderation can pull them later.
    pub fn new(user_id: Uuid, tour_id: Uuid, input: NewReview) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tour_id,
            user_id,
            rating: input.rating,
            title: input.title,
            content: input.content,
            approved: true,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewReview {
    pub rating: i32,
    pub title: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewPatch {
    pub rating: Option<i32>,
    pub title: Option<String>,
    pub content: Option<String>,
}

/// Aggregated rating picture for a tour: mean to one decimal, approved count,
/// and a zero-filled histogram over ratings 1-5.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingSummary {
    pub average_rating: f64,
    pub total_reviews: i64,
    pub distribution: BTreeMap<u8, i64>,
}

pub fn summarize(ratings: &[i32]) -> RatingSummary {
    let mut distribution: BTreeMap<u8, i64> = (1..=5).map(|r| (r, 0)).collect();
    for rating in ratings {
        if (1..=5).contains(rating) {
            *distribution.entry(*rating as u8).or_insert(0) += 1;
        }
    }

    let total = ratings.len() as i64;
    let average = if total == 0 {
        0.0
    } else {
        let sum: i64 = ratings.iter().map(|r| *r as i64).sum();
        let mean = sum as f64 / total as f64;
        (mean * 10.0).round() / 10.0
    };

    RatingSummary {
        average_rating: average,
        total_reviews: total,
        distribution,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("review not found: {0}")]
    NotFound(Uuid),
    #[error("tour not found: {0}")]
    TourNotFound(Uuid),
    #[error("a review for this tour already exists")]
    AlreadyReviewed,
    #[error("rating must be between 1 and 5, got {0}")]
    InvalidRating(i32),
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for ReviewError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(_) => ReviewError::AlreadyReviewed,
            other => ReviewError::Store(other),
        }
    }
}

fn validate_rating(rating: i32) -> Result<(), ReviewError> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(ReviewError::InvalidRating(rating))
    }
}

/// Review CRUD plus rating aggregation. Every mutation that can change the
/// approved set recomputes the affected tour's average; the value is derived
/// on demand for reporting and surfaced here through logging.
pub struct ReviewService {
    reviews: Arc<dyn ReviewRepository>,
    tours: Arc<dyn TourRepository>,
}

impl ReviewService {
    pub fn new(reviews: Arc<dyn ReviewRepository>, tours: Arc<dyn TourRepository>) -> Self {
        Self { reviews, tours }
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        tour_id: Uuid,
        input: NewReview,
    ) -> Result<Review, ReviewError> {
        validate_rating(input.rating)?;
        self.tours
            .find_summary(tour_id)
            .await?
            .ok_or(ReviewError::TourNotFound(tour_id))?;

        let review = Review::new(user_id, tour_id, input);
        self.reviews.insert(&review).await?;
        self.recompute(tour_id).await?;
        Ok(review)
    }

    pub async fn find(&self, id: Uuid) -> Result<Review, ReviewError> {
        self.reviews
            .find(id)
            .await?
            .ok_or(ReviewError::NotFound(id))
    }

    pub async fn update(&self, id: Uuid, patch: ReviewPatch) -> Result<Review, ReviewError> {
        if let Some(rating) = patch.rating {
            validate_rating(rating)?;
        }
        let updated = match self.reviews.update(id, &patch).await {
            Ok(review) => review,
            Err(StoreError::NotFound) => return Err(ReviewError::NotFound(id)),
            Err(other) => return Err(other.into()),
        };
        self.recompute(updated.tour_id).await?;
        Ok(updated)
    }

    pub async fn set_approved(&self, id: Uuid, approved: bool) -> Result<Review, ReviewError> {
        let updated = match self.reviews.set_approved(id, approved).await {
            Ok(review) => review,
            Err(StoreError::NotFound) => return Err(ReviewError::NotFound(id)),
            Err(other) => return Err(other.into()),
        };
        self.recompute(updated.tour_id).await?;
        Ok(updated)
    }

    pub async fn remove(&self, id: Uuid) -> Result<Review, ReviewError> {
        let removed = match self.reviews.delete(id).await {
            Ok(review) => review,
            Err(StoreError::NotFound) => return Err(ReviewError::NotFound(id)),
            Err(other) => return Err(other.into()),
        };
        self.recompute(removed.tour_id).await?;
        Ok(removed)
    }

    pub async fn stats(&self, tour_id: Uuid) -> Result<RatingSummary, ReviewError> {
        let ratings = self.reviews.list_approved_ratings(tour_id).await?;
        Ok(summarize(&ratings))
    }

    async fn recompute(&self, tour_id: Uuid) -> Result<(), ReviewError> {
        let ratings = self.reviews.list_approved_ratings(tour_id).await?;
        let summary = summarize(&ratings);
        info!(
            %tour_id,
            average = summary.average_rating,
            approved = summary.total_reviews,
            "tour rating recomputed"
        );
        Ok(())
    }
}
