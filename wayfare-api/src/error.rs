use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use wayfare_booking::{BookingError, VoucherError};
use wayfare_catalog::ReviewError;
use wayfare_core::verification::VerificationError;
use wayfare_core::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    /// Voucher pipeline failures are surfaced with the underlying error text.
    #[error("Could not generate voucher: {0}")]
    Voucher(String),
    #[error("{0}")]
    Internal(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Voucher(msg) => {
                tracing::error!("Voucher generation failed: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Could not generate voucher: {}", msg),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
            AppError::Other(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AppError::NotFound("record not found".to_string()),
            StoreError::Conflict(constraint) => AppError::Conflict(format!("conflict on {constraint}")),
            StoreError::Storage(msg) => AppError::Internal(msg),
        }
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::NotFound(_) | BookingError::PackageNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            BookingError::Validation(msg) => AppError::Validation(msg),
            BookingError::InvalidTransition { .. } => AppError::Conflict(err.to_string()),
            BookingError::ReferenceExhausted => AppError::Internal(err.to_string()),
            BookingError::Store(store) => store.into(),
        }
    }
}

impl From<ReviewError> for AppError {
    fn from(err: ReviewError) -> Self {
        match err {
            ReviewError::NotFound(_) | ReviewError::TourNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            ReviewError::AlreadyReviewed => AppError::Conflict(err.to_string()),
            ReviewError::InvalidRating(_) => AppError::Validation(err.to_string()),
            ReviewError::Store(store) => store.into(),
        }
    }
}

impl From<VerificationError> for AppError {
    fn from(err: VerificationError) -> Self {
        match err {
            VerificationError::InvalidCode | VerificationError::ExpiredCode => {
                AppError::Validation(err.to_string())
            }
            VerificationError::Store(store) => store.into(),
        }
    }
}

impl From<VoucherError> for AppError {
    fn from(err: VoucherError) -> Self {
        match err {
            VoucherError::NotFound(id) => AppError::NotFound(format!("booking not found: {id}")),
            other => AppError::Voucher(other.to_string()),
        }
    }
}
