use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::auth::Claims;
use crate::state::AppState;
use wayfare_booking::{
    BookingDetail, BookingFilter, BookingStats, BookingStatus, BookingUpdate, CreateBooking,
};
use wayfare_catalog::{PackageSummary, TourSummary};
use wayfare_shared::events::{BookingCreatedEvent, VoucherIssuedEvent};
use wayfare_shared::Masked;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub id: Uuid,
    pub reference: String,
    pub status: BookingStatus,
    pub tour: TourSummary,
    pub package: PackageSummary,
    pub customer_name: String,
    pub customer_email: Masked<String>,
    pub adults: i32,
    pub children: i32,
    pub infants: i32,
    pub tour_date: NaiveDate,
    pub total: Decimal,
    pub currency: String,
    pub contact_email: Masked<String>,
    pub contact_phone: Option<String>,
    pub voucher_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BookingDetail> for BookingResponse {
    fn from(detail: BookingDetail) -> Self {
        let booking = detail.booking;
        Self {
            id: booking.id,
            reference: booking.reference,
            status: booking.status,
            tour: detail.tour,
            package: detail.package,
            customer_name: detail.customer.name,
            customer_email: Masked(detail.customer.email),
            adults: booking.adults,
            children: booking.children,
            infants: booking.infants,
            tour_date: booking.tour_date,
            total: booking.total,
            currency: booking.currency,
            contact_email: Masked(booking.contact_email),
            contact_phone: booking.contact_phone,
            voucher_path: booking.voucher_path,
            created_at: booking.created_at,
            updated_at: booking.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListBookingsQuery {
    pub customer_id: Option<Uuid>,
    pub tour_id: Option<Uuid>,
    pub status: Option<BookingStatus>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: BookingStatus,
}

#[derive(Debug, Serialize)]
pub struct VoucherPathResponse {
    pub voucher_path: String,
}

fn authorize_booking_access(claims: &Claims, detail: &BookingDetail) -> Result<(), AppError> {
    if claims.is_admin() || claims.user_id()? == detail.booking.customer_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "booking belongs to another customer".to_string(),
        ))
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/bookings
/// Create a booking; voucher generation is kicked off in the background and
/// must never fail the creation.
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateBooking>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    let customer_id = claims.user_id()?;
    let detail = state.bookings.create(customer_id, req).await?;

    info!(
        event = ?BookingCreatedEvent {
            booking_id: detail.booking.id,
            reference: detail.booking.reference.clone(),
            customer_id,
            tour_id: detail.booking.tour_id,
            total_amount: detail.booking.total.to_string(),
            currency: detail.booking.currency.clone(),
            timestamp: Utc::now().timestamp(),
        },
        "booking created"
    );

    let vouchers = state.vouchers.clone();
    let booking_id = detail.booking.id;
    tokio::spawn(async move {
        match vouchers.persist(booking_id).await {
            Ok(path) => info!(%booking_id, path, "voucher prepared"),
            Err(e) => warn!(%booking_id, error = %e, "voucher preparation failed, booking unaffected"),
        }
    });

    Ok((StatusCode::CREATED, Json(detail.into())))
}

/// GET /v1/bookings
/// Admin listing with optional customer/tour/status filters, newest first.
pub async fn list_bookings(
    State(state): State<AppState>,
    Query(query): Query<ListBookingsQuery>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    let filter = BookingFilter {
        customer_id: query.customer_id,
        tour_id: query.tour_id,
        status: query.status,
    };
    let details = state.bookings.list(filter).await?;
    Ok(Json(details.into_iter().map(Into::into).collect()))
}

/// GET /v1/bookings/mine
pub async fn list_my_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    let customer_id = claims.user_id()?;
    let details = state.bookings.list_by_customer(customer_id).await?;
    Ok(Json(details.into_iter().map(Into::into).collect()))
}

/// GET /v1/bookings/stats
pub async fn booking_stats(State(state): State<AppState>) -> Result<Json<BookingStats>, AppError> {
    Ok(Json(state.bookings.stats().await?))
}

/// GET /v1/bookings/{id}
pub async fn get_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingResponse>, AppError> {
    let detail = state.bookings.get(id).await?;
    authorize_booking_access(&claims, &detail)?;
    Ok(Json(detail.into()))
}

/// PATCH /v1/bookings/{id}/status
pub async fn update_booking_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let detail = state.bookings.update_status(id, req.status).await?;
    Ok(Json(detail.into()))
}

/// PATCH /v1/bookings/{id}
pub async fn update_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<BookingUpdate>,
) -> Result<Json<BookingResponse>, AppError> {
    let detail = state.bookings.update(id, req).await?;
    Ok(Json(detail.into()))
}

/// DELETE /v1/bookings/{id}
pub async fn delete_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.bookings.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/bookings/{id}/voucher
/// Streams the voucher PDF. A previously persisted file is served when it
/// still exists; otherwise the voucher is regenerated on the fly, so a failed
/// background generation heals itself on the next download.
pub async fn download_voucher(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let detail = state.bookings.get(id).await?;
    authorize_booking_access(&claims, &detail)?;

    let bytes = match detail.booking.voucher_path.as_deref() {
        Some(path) => match state.vouchers.load_persisted(path).await {
            Some(bytes) => bytes,
            None => state.vouchers.generate(id).await?,
        },
        None => state.vouchers.generate(id).await?,
    };

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}.pdf\"", detail.booking.reference),
        ),
    ];
    Ok((headers, bytes))
}

/// POST /v1/bookings/{id}/voucher
/// Regenerate and persist the voucher, returning its public path.
pub async fn persist_voucher(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<VoucherPathResponse>, AppError> {
    let path = state.vouchers.persist(id).await?;

    info!(
        event = ?VoucherIssuedEvent {
            booking_id: id,
            path: path.clone(),
            timestamp: Utc::now().timestamp(),
        },
        "voucher issued"
    );

    Ok(Json(VoucherPathResponse { voucher_path: path }))
}
