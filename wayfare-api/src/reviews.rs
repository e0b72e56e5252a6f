use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::auth::Claims;
use crate::state::AppState;
use wayfare_catalog::{NewReview, RatingSummary, Review, ReviewPatch};
use wayfare_shared::events::ReviewModeratedEvent;

async fn authorize_review_access(
    state: &AppState,
    claims: &Claims,
    id: Uuid,
) -> Result<Review, AppError> {
    let review = state.reviews.find(id).await?;
    if claims.is_admin() || claims.user_id()? == review.user_id {
        Ok(review)
    } else {
        Err(AppError::Forbidden(
            "review belongs to another user".to_string(),
        ))
    }
}

/// POST /v1/tours/{tour_id}/reviews
pub async fn create_review(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(tour_id): Path<Uuid>,
    Json(req): Json<NewReview>,
) -> Result<(StatusCode, Json<Review>), AppError> {
    let user_id = claims.user_id()?;
    let review = state.reviews.create(user_id, tour_id, req).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// GET /v1/tours/{tour_id}/reviews/stats
pub async fn tour_review_stats(
    State(state): State<AppState>,
    Path(tour_id): Path<Uuid>,
) -> Result<Json<RatingSummary>, AppError> {
    Ok(Json(state.reviews.stats(tour_id).await?))
}

/// PATCH /v1/reviews/{id}
pub async fn update_review(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<ReviewPatch>,
) -> Result<Json<Review>, AppError> {
    authorize_review_access(&state, &claims, id).await?;
    let review = state.reviews.update(id, req).await?;
    Ok(Json(review))
}

/// DELETE /v1/reviews/{id}
pub async fn delete_review(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    authorize_review_access(&state, &claims, id).await?;
    state.reviews.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/reviews/{id}/approve
pub async fn approve_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Review>, AppError> {
    moderate(state, id, true).await
}

/// POST /v1/reviews/{id}/reject
pub async fn reject_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Review>, AppError> {
    moderate(state, id, false).await
}

async fn moderate(state: AppState, id: Uuid, approved: bool) -> Result<Json<Review>, AppError> {
    let review = state.reviews.set_approved(id, approved).await?;

    info!(
        event = ?ReviewModeratedEvent {
            review_id: review.id,
            tour_id: review.tour_id,
            approved,
            timestamp: Utc::now().timestamp(),
        },
        "review moderated"
    );

    Ok(Json(review))
}
