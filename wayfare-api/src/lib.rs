use axum::{
    extract::{Request, State},
    http::Method,
    response::IntoResponse,
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod bookings;
pub mod error;
pub mod middleware;
pub mod reviews;
pub mod state;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    let public = Router::new()
        .route("/v1/auth/login", post(auth::login))
        .route(
            "/v1/tours/{tour_id}/reviews/stats",
            get(reviews::tour_review_stats),
        );

    let authenticated = Router::new()
        .route(
            "/v1/auth/password-change/request",
            post(auth::request_password_change),
        )
        .route(
            "/v1/auth/password-change/confirm",
            post(auth::confirm_password_change),
        )
        .route("/v1/bookings", post(bookings::create_booking))
        .route("/v1/bookings/mine", get(bookings::list_my_bookings))
        .route("/v1/bookings/{id}", get(bookings::get_booking))
        .route("/v1/bookings/{id}/voucher", get(bookings::download_voucher))
        .route("/v1/tours/{tour_id}/reviews", post(reviews::create_review))
        .route(
            "/v1/reviews/{id}",
            patch(reviews::update_review).delete(reviews::delete_review),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    let admin = Router::new()
        .route("/v1/bookings", get(bookings::list_bookings))
        .route("/v1/bookings/stats", get(bookings::booking_stats))
        .route(
            "/v1/bookings/{id}",
            patch(bookings::update_booking).delete(bookings::delete_booking),
        )
        .route(
            "/v1/bookings/{id}/status",
            patch(bookings::update_booking_status),
        )
        .route("/v1/bookings/{id}/voucher", post(bookings::persist_voucher))
        .route("/v1/reviews/{id}/approve", post(reviews::approve_review))
        .route("/v1/reviews/{id}/reject", post(reviews::reject_review))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_admin,
        ));

    Router::new()
        .merge(public)
        .merge(authenticated)
        .merge(admin)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
}

async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: axum::middleware::Next,
) -> Result<impl IntoResponse, impl IntoResponse> {
    let Some(redis) = &state.redis else {
        return Ok(next.run(req).await);
    };

    let client = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .unwrap_or("unknown")
        .trim()
        .to_string();
    let key = format!("ratelimit:{}", client);

    match redis.check_rate_limit(&key, 100, 60).await {
        Ok(true) => Ok(next.run(req).await),
        Ok(false) => Err((axum::http::StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded")),
        Err(_) => Ok(next.run(req).await), // Fail open
    }
}
