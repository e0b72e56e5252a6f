pub mod repository;
pub mod review;
pub mod tour;

pub use repository::{PackageRepository, ReviewRepository, TourRepository};
pub use review::{NewReview, RatingSummary, Review, ReviewError, ReviewPatch, ReviewService};
pub use tour::{PackageSummary, TourPackage, TourSummary};
