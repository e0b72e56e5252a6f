use std::sync::Arc;

use wayfare_booking::{BookingManager, VoucherProducer};
use wayfare_catalog::ReviewService;
use wayfare_core::identity::UserRepository;
use wayfare_core::verification::VerificationService;
use wayfare_store::RedisClient;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub bookings: Arc<BookingManager>,
    pub vouchers: Arc<VoucherProducer>,
    pub reviews: Arc<ReviewService>,
    pub verification: Arc<VerificationService>,
    /// Absent in single-instance deployments; rate limiting then fails open.
    pub redis: Option<Arc<RedisClient>>,
    pub auth: AuthConfig,
}
