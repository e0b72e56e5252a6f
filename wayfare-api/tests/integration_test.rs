use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use wayfare_api::auth::hash_password;
use wayfare_api::state::AuthConfig;
use wayfare_api::{app, AppState};
use wayfare_booking::{BookingManager, VoucherConfig, VoucherProducer};
use wayfare_catalog::{Review, ReviewService, TourPackage};
use wayfare_core::identity::{User, UserRole};
use wayfare_core::verification::{CodeStore, MemoryCodeStore, VerificationService};
use wayfare_store::memory::MemoryRepository;

const CUSTOMER_EMAIL: &str = "ana@example.com";
const CUSTOMER_PASSWORD: &str = "travel-far-2026";
const ADMIN_EMAIL: &str = "ops@wayfare.example";
const ADMIN_PASSWORD: &str = "keep-the-lights-on";

struct TestContext {
    app: Router,
    repo: Arc<MemoryRepository>,
    codes: Arc<MemoryCodeStore>,
    customer_id: Uuid,
    tour_id: Uuid,
    package_id: Uuid,
}

async fn setup() -> TestContext {
    let repo = Arc::new(MemoryRepository::new());
    let codes = Arc::new(MemoryCodeStore::new());

    let customer = User {
        id: Uuid::new_v4(),
        email: CUSTOMER_EMAIL.to_string(),
        name: "Ana".to_string(),
        password_hash: hash_password(CUSTOMER_PASSWORD).unwrap(),
        role: UserRole::Customer,
        created_at: Utc::now(),
    };
    let customer_id = customer.id;
    repo.seed_user(customer).await;

    let admin = User {
        id: Uuid::new_v4(),
        email: ADMIN_EMAIL.to_string(),
        name: "Ops".to_string(),
        password_hash: hash_password(ADMIN_PASSWORD).unwrap(),
        role: UserRole::Admin,
        created_at: Utc::now(),
    };
    repo.seed_user(admin).await;

    let tour_id = repo.seed_tour("Lisbon Walking Tour").await;
    let package = TourPackage {
        id: Uuid::new_v4(),
        tour_id,
        name: "Classic".to_string(),
        adult_price: dec!(100.00),
        child_price: dec!(50.00),
        infant_price: dec!(0.00),
        currency: "EUR".to_string(),
        language: "English".to_string(),
        capacity: 15,
    };
    let package_id = package.id;
    repo.seed_package(package).await;

    let output_dir = std::env::temp_dir().join(format!("wayfare-api-test-{}", Uuid::new_v4()));
    let state = AppState {
        users: repo.clone(),
        bookings: Arc::new(BookingManager::new(repo.clone(), repo.clone())),
        vouchers: Arc::new(VoucherProducer::new(
            repo.clone(),
            VoucherConfig {
                frontend_base_url: "http://localhost:3000".to_string(),
                output_dir: PathBuf::from(output_dir),
                public_prefix: "/uploads/vouchers".to_string(),
            },
        )),
        reviews: Arc::new(ReviewService::new(repo.clone(), repo.clone())),
        verification: Arc::new(VerificationService::new(codes.clone())),
        redis: None,
        auth: AuthConfig {
            secret: "integration-test-secret".to_string(),
            expiration: 3600,
        },
    };

    TestContext {
        app: app(state),
        repo,
        codes,
        customer_id,
        tour_id,
        package_id,
    }
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value, Option<String>) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value, content_type)
}

async fn send_raw(app: &Router, uri: &str, token: &str) -> (StatusCode, Vec<u8>, Option<String>) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec(), content_type)
}

async fn login(app: &Router, email: &str, password: &str) -> String {
    let (status, body, _) = send(
        app,
        "POST",
        "/v1/auth/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["token"].as_str().unwrap().to_string()
}

fn booking_request(ctx: &TestContext) -> Value {
    json!({
        "tour_id": ctx.tour_id,
        "package_id": ctx.package_id,
        "adults": 2,
        "children": 1,
        "infants": 0,
        "tour_date": "2026-09-12",
        "contact_email": CUSTOMER_EMAIL,
    })
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let ctx = setup().await;

    let (status, _, _) = send(
        &ctx.app,
        "POST",
        "/v1/auth/login",
        None,
        Some(json!({ "email": CUSTOMER_EMAIL, "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = send(
        &ctx.app,
        "POST",
        "/v1/auth/login",
        None,
        Some(json!({ "email": "ghost@example.com", "password": "whatever" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_booking_create_and_read_flow() {
    let ctx = setup().await;
    let token = login(&ctx.app, CUSTOMER_EMAIL, CUSTOMER_PASSWORD).await;

    // Unauthenticated create is rejected.
    let (status, _, _) = send(&ctx.app, "POST", "/v1/bookings", None, Some(booking_request(&ctx))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body, _) = send(
        &ctx.app,
        "POST",
        "/v1/bookings",
        Some(&token),
        Some(booking_request(&ctx)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    assert_eq!(body["status"], "PENDING");
    assert_eq!(body["total"], "250.00");
    assert_eq!(body["currency"], "EUR");
    assert!(body["reference"].as_str().unwrap().starts_with("BK"));
    assert_eq!(body["tour"]["title"], "Lisbon Walking Tour");
    let booking_id = body["id"].as_str().unwrap().to_string();

    let (status, body, _) = send(&ctx.app, "GET", "/v1/bookings/mine", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _, _) = send(
        &ctx.app,
        "GET",
        &format!("/v1/bookings/{booking_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Another customer cannot read someone else's booking.
    let other = User {
        id: Uuid::new_v4(),
        email: "bruno@example.com".to_string(),
        name: "Bruno".to_string(),
        password_hash: hash_password("some-other-pass").unwrap(),
        role: UserRole::Customer,
        created_at: Utc::now(),
    };
    ctx.repo.seed_user(other).await;
    let other_token = login(&ctx.app, "bruno@example.com", "some-other-pass").await;
    let (status, _, _) = send(
        &ctx.app,
        "GET",
        &format!("/v1/bookings/{booking_id}"),
        Some(&other_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Creating against an unknown package is a 404.
    let mut bad = booking_request(&ctx);
    bad["package_id"] = json!(Uuid::new_v4());
    let (status, _, _) = send(&ctx.app, "POST", "/v1/bookings", Some(&token), Some(bad)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // A party without adults is a 400.
    let mut empty = booking_request(&ctx);
    empty["adults"] = json!(0);
    let (status, _, _) = send(&ctx.app, "POST", "/v1/bookings", Some(&token), Some(empty)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_surface_and_status_transitions() {
    let ctx = setup().await;
    let customer_token = login(&ctx.app, CUSTOMER_EMAIL, CUSTOMER_PASSWORD).await;
    let admin_token = login(&ctx.app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let (_, created, _) = send(
        &ctx.app,
        "POST",
        "/v1/bookings",
        Some(&customer_token),
        Some(booking_request(&ctx)),
    )
    .await;
    let booking_id = created["id"].as_str().unwrap().to_string();

    // Customers cannot use the admin surface.
    for uri in ["/v1/bookings", "/v1/bookings/stats"] {
        let (status, _, _) = send(&ctx.app, "GET", uri, Some(&customer_token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "customer reached {uri}");
    }

    let (status, listed, _) = send(&ctx.app, "GET", "/v1/bookings", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, filtered, _) = send(
        &ctx.app,
        "GET",
        "/v1/bookings?status=CONFIRMED",
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(filtered.as_array().unwrap().is_empty());

    let (status, confirmed, _) = send(
        &ctx.app,
        "PATCH",
        &format!("/v1/bookings/{booking_id}/status"),
        Some(&admin_token),
        Some(json!({ "status": "CONFIRMED" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(confirmed["status"], "CONFIRMED");

    // Confirmed bookings cannot go back to pending.
    let (status, _, _) = send(
        &ctx.app,
        "PATCH",
        &format!("/v1/bookings/{booking_id}/status"),
        Some(&admin_token),
        Some(json!({ "status": "PENDING" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, stats, _) = send(
        &ctx.app,
        "GET",
        "/v1/bookings/stats",
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total"], 1);
    assert_eq!(stats["confirmed"], 1);
    assert_eq!(stats["pending"], 0);
}

#[tokio::test]
async fn test_voucher_download_and_persist() {
    let ctx = setup().await;
    let customer_token = login(&ctx.app, CUSTOMER_EMAIL, CUSTOMER_PASSWORD).await;
    let admin_token = login(&ctx.app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let (_, created, _) = send(
        &ctx.app,
        "POST",
        "/v1/bookings",
        Some(&customer_token),
        Some(booking_request(&ctx)),
    )
    .await;
    let booking_id = created["id"].as_str().unwrap().to_string();

    // On-demand download regenerates even if the background persist has not
    // landed yet.
    let (status, bytes, content_type) = send_raw(
        &ctx.app,
        &format!("/v1/bookings/{booking_id}/voucher"),
        &customer_token,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/pdf"));
    assert!(bytes.starts_with(b"%PDF"));

    // Explicit persist returns the public path and records it on the booking.
    let (status, persisted, _) = send(
        &ctx.app,
        "POST",
        &format!("/v1/bookings/{booking_id}/voucher"),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "persist failed: {persisted}");
    let path = persisted["voucher_path"].as_str().unwrap();
    assert!(path.starts_with("/uploads/vouchers/booking-"));

    let (status, body, _) = send(
        &ctx.app,
        "GET",
        &format!("/v1/bookings/{booking_id}"),
        Some(&customer_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["voucher_path"].as_str(), Some(path));

    // Download now serves the persisted file.
    let (status, bytes, _) = send_raw(
        &ctx.app,
        &format!("/v1/bookings/{booking_id}/voucher"),
        &customer_token,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(bytes.starts_with(b"%PDF"));

    // Unknown booking is a 404.
    let (status, _, _) = send(
        &ctx.app,
        "GET",
        &format!("/v1/bookings/{}/voucher", Uuid::new_v4()),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_review_flow_and_stats() {
    let ctx = setup().await;
    let token = login(&ctx.app, CUSTOMER_EMAIL, CUSTOMER_PASSWORD).await;

    let (status, review, _) = send(
        &ctx.app,
        "POST",
        &format!("/v1/tours/{}/reviews", ctx.tour_id),
        Some(&token),
        Some(json!({ "rating": 5, "title": "Wonderful", "content": "Great guide." })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(review["approved"], true);

    // One review per user and tour.
    let (status, _, _) = send(
        &ctx.app,
        "POST",
        &format!("/v1/tours/{}/reviews", ctx.tour_id),
        Some(&token),
        Some(json!({ "rating": 4, "content": "Second thoughts." })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Seed the remaining ratings [5, 4, 3, 5] from other users.
    for rating in [5, 4, 3, 5] {
        let now = Utc::now();
        ctx.repo
            .seed_review(Review {
                id: Uuid::new_v4(),
                tour_id: ctx.tour_id,
                user_id: Uuid::new_v4(),
                rating,
                title: None,
                content: "Seeded".to_string(),
                approved: true,
                created_at: now,
                updated_at: now,
            })
            .await;
    }

    let (status, stats, _) = send(
        &ctx.app,
        "GET",
        &format!("/v1/tours/{}/reviews/stats", ctx.tour_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["average_rating"], 4.4);
    assert_eq!(stats["total_reviews"], 5);
    assert_eq!(stats["distribution"]["3"], 1);
    assert_eq!(stats["distribution"]["5"], 3);
    assert_eq!(stats["distribution"]["1"], 0);

    // Stats on a tour with no reviews is all zeros, not an error.
    let empty_tour = ctx.repo.seed_tour("Porto Food Tour").await;
    let (status, stats, _) = send(
        &ctx.app,
        "GET",
        &format!("/v1/tours/{empty_tour}/reviews/stats"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["average_rating"], 0.0);
    assert_eq!(stats["total_reviews"], 0);

    // Moderation is admin-only and removes the review from the aggregate.
    let review_id = review["id"].as_str().unwrap().to_string();
    let (status, _, _) = send(
        &ctx.app,
        "POST",
        &format!("/v1/reviews/{review_id}/reject"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin_token = login(&ctx.app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let (status, _, _) = send(
        &ctx.app,
        "POST",
        &format!("/v1/reviews/{review_id}/reject"),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, stats, _) = send(
        &ctx.app,
        "GET",
        &format!("/v1/tours/{}/reviews/stats", ctx.tour_id),
        None,
        None,
    )
    .await;
    assert_eq!(stats["total_reviews"], 4);
}

#[tokio::test]
async fn test_password_change_flow() {
    let ctx = setup().await;
    let token = login(&ctx.app, CUSTOMER_EMAIL, CUSTOMER_PASSWORD).await;

    let (status, body, _) = send(
        &ctx.app,
        "POST",
        "/v1/auth/password-change/request",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "request failed: {body}");

    // The code is delivered out of band; fish it out of the store.
    let issued = ctx.codes.get(CUSTOMER_EMAIL).await.unwrap().unwrap();
    assert_eq!(issued.user_id, ctx.customer_id);

    // A wrong code is rejected.
    let wrong = if issued.code == "000000" { "111111" } else { "000000" };
    let (status, _, _) = send(
        &ctx.app,
        "POST",
        "/v1/auth/password-change/confirm",
        Some(&token),
        Some(json!({ "code": wrong, "new_password": "a-brand-new-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = send(
        &ctx.app,
        "POST",
        "/v1/auth/password-change/confirm",
        Some(&token),
        Some(json!({ "code": issued.code, "new_password": "a-brand-new-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Old password no longer works; the new one does; the code is spent.
    let (status, _, _) = send(
        &ctx.app,
        "POST",
        "/v1/auth/login",
        None,
        Some(json!({ "email": CUSTOMER_EMAIL, "password": CUSTOMER_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    login(&ctx.app, CUSTOMER_EMAIL, "a-brand-new-pass").await;

    let (status, _, _) = send(
        &ctx.app,
        "POST",
        "/v1/auth/password-change/confirm",
        Some(&token),
        Some(json!({ "code": issued.code, "new_password": "yet-another-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
