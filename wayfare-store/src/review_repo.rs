use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::map_sqlx;
use wayfare_catalog::{Review, ReviewPatch, ReviewRepository};
use wayfare_core::StoreError;

pub struct PgReviewRepository {
    pool: PgPool,
}

impl PgReviewRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: Uuid,
    tour_id: Uuid,
    user_id: Uuid,
    rating: i32,
    title: Option<String>,
    content: String,
    approved: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Review {
            id: row.id,
            tour_id: row.tour_id,
            user_id: row.user_id,
            rating: row.rating,
            title: row.title,
            content: row.content,
            approved: row.approved,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const REVIEW_COLUMNS: &str =
    "id, tour_id, user_id, rating, title, content, approved, created_at, updated_at";

#[async_trait]
impl ReviewRepository for PgReviewRepository {
    async fn insert(&self, review: &Review) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO reviews (id, tour_id, user_id, rating, title, content, approved, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(review.id)
        .bind(review.tour_id)
        .bind(review.user_id)
        .bind(review.rating)
        .bind(&review.title)
        .bind(&review.content)
        .bind(review.approved)
        .bind(review.created_at)
        .bind(review.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Review>, StoreError> {
        let sql = format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1");
        let row = sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;

        Ok(row.map(Review::from))
    }

    async fn update(&self, id: Uuid, patch: &ReviewPatch) -> Result<Review, StoreError> {
        let sql = format!(
            r#"
            UPDATE reviews SET
                rating = COALESCE($2, rating),
                title = COALESCE($3, title),
                content = COALESCE($4, content),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {REVIEW_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(id)
            .bind(patch.rating)
            .bind(&patch.title)
            .bind(&patch.content)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;

        row.map(Review::from).ok_or(StoreError::NotFound)
    }

    async fn set_approved(&self, id: Uuid, approved: bool) -> Result<Review, StoreError> {
        let sql = format!(
            r#"
            UPDATE reviews SET approved = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {REVIEW_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(id)
            .bind(approved)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;

        row.map(Review::from).ok_or(StoreError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<Review, StoreError> {
        let sql = format!("DELETE FROM reviews WHERE id = $1 RETURNING {REVIEW_COLUMNS}");
        let row = sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;

        row.map(Review::from).ok_or(StoreError::NotFound)
    }

    async fn list_approved_ratings(&self, tour_id: Uuid) -> Result<Vec<i32>, StoreError> {
        sqlx::query_scalar::<_, i32>(
            "SELECT rating FROM reviews WHERE tour_id = $1 AND approved = TRUE",
        )
        .bind(tour_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)
    }
}
