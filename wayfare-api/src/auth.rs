use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::middleware::auth::Claims;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct CodeRequestedResponse {
    pub message: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmPasswordChangeRequest {
    pub code: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// POST /v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = state
        .users
        .find_by_email(&req.email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("invalid credentials".to_string()))?;

    let parsed = PasswordHash::new(&user.password_hash)
        .map_err(|e| AppError::Internal(format!("corrupt password hash: {e}")))?;
    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed)
        .map_err(|_| AppError::Unauthorized("invalid credentials".to_string()))?;

    let claims = Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        role: user.role.as_str().to_string(),
        exp: (Utc::now() + Duration::seconds(state.auth.expiration as i64)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.auth.secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token encoding failed: {e}")))?;

    Ok(Json(AuthResponse { token }))
}

/// POST /v1/auth/password-change/request
///
/// Issues a 6-digit code for the authenticated account. Delivery (mail-out)
/// is handled by the notification layer; the code is never returned here.
pub async fn request_password_change(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<CodeRequestedResponse>, AppError> {
    let user_id = claims.user_id()?;
    let issued = state.verification.issue(&claims.email, user_id).await?;

    Ok(Json(CodeRequestedResponse {
        message: "verification code sent".to_string(),
        expires_at: issued.expires_at,
    }))
}

/// POST /v1/auth/password-change/confirm
pub async fn confirm_password_change(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ConfirmPasswordChangeRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if req.new_password.len() < 8 {
        return Err(AppError::Validation(
            "password must be at least 8 characters".to_string(),
        ));
    }

    let user_id = state.verification.consume(&claims.email, &req.code).await?;
    let hash = hash_password(&req.new_password)?;
    state.users.update_password(user_id, &hash).await?;

    tracing::info!(%user_id, "password changed");
    Ok(Json(MessageResponse {
        message: "password updated".to_string(),
    }))
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}
