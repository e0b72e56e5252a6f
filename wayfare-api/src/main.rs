use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wayfare_api::{app, state::AuthConfig, AppState};
use wayfare_booking::{BookingManager, BookingRepository, VoucherConfig, VoucherProducer};
use wayfare_catalog::{PackageRepository, ReviewRepository, ReviewService, TourRepository};
use wayfare_core::identity::UserRepository;
use wayfare_core::verification::{CodeStore, MemoryCodeStore, VerificationService};
use wayfare_store::{
    DbClient, PgBookingRepository, PgCatalogRepository, PgReviewRepository, PgUserRepository,
    RedisClient, RedisCodeStore,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wayfare_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = wayfare_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Wayfare API on port {}", config.server.port);

    let db = DbClient::new(&config.database)
        .await
        .expect("Failed to connect to database");
    db.migrate().await.expect("Failed to run migrations");
    let pool = db.pool.clone();

    let booking_repo: Arc<dyn BookingRepository> = Arc::new(PgBookingRepository::new(pool.clone()));
    let catalog_repo = Arc::new(PgCatalogRepository::new(pool.clone()));
    let package_repo: Arc<dyn PackageRepository> = catalog_repo.clone();
    let tour_repo: Arc<dyn TourRepository> = catalog_repo;
    let review_repo: Arc<dyn ReviewRepository> = Arc::new(PgReviewRepository::new(pool.clone()));
    let user_repo: Arc<dyn UserRepository> = Arc::new(PgUserRepository::new(pool));

    // Redis is optional: without it, verification codes live in the process
    // and rate limiting is off.
    let redis = if config.redis.url.is_empty() {
        None
    } else {
        let client = RedisClient::new(&config.redis.url)
            .await
            .expect("Failed to connect to Redis");
        Some(Arc::new(client))
    };
    let code_store: Arc<dyn CodeStore> = match &redis {
        Some(client) => Arc::new(RedisCodeStore::new(client.clone())),
        None => Arc::new(MemoryCodeStore::new()),
    };

    let app_state = AppState {
        users: user_repo,
        bookings: Arc::new(BookingManager::new(booking_repo.clone(), package_repo)),
        vouchers: Arc::new(VoucherProducer::new(
            booking_repo,
            VoucherConfig {
                frontend_base_url: config.frontend.base_url.clone(),
                output_dir: PathBuf::from(&config.voucher.output_dir),
                public_prefix: config.voucher.public_prefix.clone(),
            },
        )),
        reviews: Arc::new(ReviewService::new(review_repo, tour_repo)),
        verification: Arc::new(VerificationService::new(code_store)),
        redis,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
