pub mod manager;
pub mod models;
pub mod pricing;
pub mod qr;
pub mod reference;
pub mod repository;
pub mod voucher;

pub use manager::{BookingError, BookingManager};
pub use models::{
    Booking, BookingDetail, BookingFilter, BookingStats, BookingStatus, BookingUpdate,
    CreateBooking, CustomerSummary, PartyComposition,
};
pub use repository::BookingRepository;
pub use voucher::{VoucherConfig, VoucherError, VoucherProducer};
