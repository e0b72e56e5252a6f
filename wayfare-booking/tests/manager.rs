//! Cross-crate tests for `BookingManager` against the in-memory repository.
//!
//! These live in `tests/` rather than inside the library's unit-test module
//! because they depend on `wayfare-store` (a dev-dependency that in turn
//! depends on `wayfare-booking`). As an integration test, `wayfare-booking`
//! links as the real rlib — the same build `wayfare-store` was compiled
//! against — so the repository trait implementations unify.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use uuid::Uuid;

use wayfare_booking::{
    BookingError, BookingFilter, BookingManager, BookingStatus, BookingUpdate, CreateBooking,
    PartyComposition,
};
use wayfare_catalog::TourPackage;
use wayfare_core::identity::{User, UserRole};
use wayfare_store::memory::MemoryRepository;

async fn setup() -> (BookingManager, Arc<MemoryRepository>, Uuid, Uuid, Uuid) {
    let repo = Arc::new(MemoryRepository::new());

    let customer = User {
        id: Uuid::new_v4(),
        email: "ana@example.com".to_string(),
        name: "Ana".to_string(),
        password_hash: "unused".to_string(),
        role: UserRole::Customer,
        created_at: chrono::Utc::now(),
    };
    let customer_id = customer.id;
    repo.seed_user(customer).await;

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

    let manager = BookingManager::new(repo.clone(), repo.clone());
    (manager, repo, customer_id, tour_id, package_id)
}

fn request(tour_id: Uuid, package_id: Uuid) -> CreateBooking {
    CreateBooking {
        tour_id,
        package_id,
        party: PartyComposition { adults: 2, children: 1, infants: 0 },
        tour_date: NaiveDate::from_ymd_opt(2026, 9, 12).unwrap(),
        contact_email: "ana@example.com".to_string(),
        contact_phone: None,
    }
}

#[tokio::test]
async fn test_create_computes_total_and_reference() {
    let (manager, _, customer_id, tour_id, package_id) = setup().await;

    let detail = manager
        .create(customer_id, request(tour_id, package_id))
        .await
        .unwrap();

    assert_eq!(detail.booking.total, dec!(250.00));
    assert_eq!(detail.booking.status, BookingStatus::Pending);
    assert!(detail.booking.reference.starts_with("BK"));
    assert_eq!(detail.tour.title, "Lisbon Walking Tour");
    assert_eq!(detail.package.name, "Classic");
    assert_eq!(detail.customer.id, customer_id);
}

#[tokio::test]
async fn test_create_missing_package() {
    let (manager, _, customer_id, tour_id, _) = setup().await;

    let result = manager
        .create(customer_id, request(tour_id, Uuid::new_v4()))
        .await;
    assert!(matches!(result, Err(BookingError::PackageNotFound(_))));
}

#[tokio::test]
async fn test_create_rejects_empty_party() {
    let (manager, _, customer_id, tour_id, package_id) = setup().await;

    let mut req = request(tour_id, package_id);
    req.party.adults = 0;
    let result = manager.create(customer_id, req).await;
    assert!(matches!(result, Err(BookingError::Validation(_))));
}

#[tokio::test]
async fn test_status_transitions() {
    let (manager, _, customer_id, tour_id, package_id) = setup().await;
    let detail = manager
        .create(customer_id, request(tour_id, package_id))
        .await
        .unwrap();
    let id = detail.booking.id;

    let confirmed = manager
        .update_status(id, BookingStatus::Confirmed)
        .await
        .unwrap();
    assert_eq!(confirmed.booking.status, BookingStatus::Confirmed);

    // Confirmed bookings cannot go back to pending.
    let back = manager.update_status(id, BookingStatus::Pending).await;
    assert!(matches!(back, Err(BookingError::InvalidTransition { .. })));

    let cancelled = manager
        .update_status(id, BookingStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(cancelled.booking.status, BookingStatus::Cancelled);

    // Cancelled is terminal.
    let revive = manager.update_status(id, BookingStatus::Confirmed).await;
    assert!(matches!(revive, Err(BookingError::InvalidTransition { .. })));
}

#[tokio::test]
async fn test_list_is_newest_first_and_filtered() {
    let (manager, _, customer_id, tour_id, package_id) = setup().await;

    let first = manager
        .create(customer_id, request(tour_id, package_id))
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = manager
        .create(customer_id, request(tour_id, package_id))
        .await
        .unwrap();

    let all = manager.list(BookingFilter::default()).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].booking.id, second.booking.id);
    assert_eq!(all[1].booking.id, first.booking.id);

    manager
        .update_status(second.booking.id, BookingStatus::Confirmed)
        .await
        .unwrap();
    let confirmed_only = manager
        .list(BookingFilter {
            status: Some(BookingStatus::Confirmed),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(confirmed_only.len(), 1);
    assert_eq!(confirmed_only[0].booking.id, second.booking.id);

    let mine = manager.list_by_customer(customer_id).await.unwrap();
    assert_eq!(mine.len(), 2);
    let nobody = manager.list_by_customer(Uuid::new_v4()).await.unwrap();
    assert!(nobody.is_empty());
}

#[tokio::test]
async fn test_stats_partitions_by_status() {
    let (manager, _, customer_id, tour_id, package_id) = setup().await;

    for _ in 0..3 {
        manager
            .create(customer_id, request(tour_id, package_id))
            .await
            .unwrap();
    }
    let all = manager.list(BookingFilter::default()).await.unwrap();
    manager
        .update_status(all[0].booking.id, BookingStatus::Confirmed)
        .await
        .unwrap();
    manager
        .update_status(all[1].booking.id, BookingStatus::Cancelled)
        .await
        .unwrap();

    let stats = manager.stats().await.unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.pending, 1);
    assert_eq!(stats.confirmed, 1);
    assert_eq!(stats.cancelled, 1);
}

#[tokio::test]
async fn test_update_validates_party() {
    let (manager, _, customer_id, tour_id, package_id) = setup().await;
    let detail = manager
        .create(customer_id, request(tour_id, package_id))
        .await
        .unwrap();

    let result = manager
        .update(
            detail.booking.id,
            BookingUpdate {
                adults: Some(0),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(BookingError::Validation(_))));

    let updated = manager
        .update(
            detail.booking.id,
            BookingUpdate {
                children: Some(4),
                contact_phone: Some("+351 912 345 678".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.booking.children, 4);
    // The total is a creation-time snapshot and does not move with the party.
    assert_eq!(updated.booking.total, dec!(250.00));
}

#[tokio::test]
async fn test_remove_missing_booking() {
    let (manager, _, _, _, _) = setup().await;
    let result = manager.remove(Uuid::new_v4()).await;
    assert!(matches!(result, Err(BookingError::NotFound(_))));
}
