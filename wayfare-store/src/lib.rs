pub mod app_config;
pub mod booking_repo;
pub mod catalog_repo;
pub mod database;
pub mod memory;
pub mod redis_repo;
pub mod review_repo;
pub mod user_repo;

pub use booking_repo::PgBookingRepository;
pub use catalog_repo::PgCatalogRepository;
pub use database::DbClient;
pub use redis_repo::{RedisClient, RedisCodeStore};
pub use review_repo::PgReviewRepository;
pub use user_repo::PgUserRepository;
