use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use wayfare_catalog::{PackageSummary, TourPackage, TourSummary};

/// Booking status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(BookingStatus::Pending),
            "CONFIRMED" => Some(BookingStatus::Confirmed),
            "CANCELLED" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }

    /// Allowed transitions: PENDING -> CONFIRMED, PENDING -> CANCELLED,
    /// CONFIRMED -> CANCELLED. CANCELLED is terminal.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Confirmed)
                | (BookingStatus::Pending, BookingStatus::Cancelled)
                | (BookingStatus::Confirmed, BookingStatus::Cancelled)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Party composition for a booking. Adults carry the booking; children and
/// infants may be zero.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PartyComposition {
    pub adults: i32,
    pub children: i32,
    pub infants: i32,
}

impl PartyComposition {
    pub fn validate(&self) -> Result<(), String> {
        if self.adults < 1 {
            return Err(format!("at least one adult is required, got {}", self.adults));
        }
        if self.children < 0 || self.infants < 0 {
            return Err("participant counts cannot be negative".to_string());
        }
        Ok(())
    }

    pub fn headcount(&self) -> i32 {
        self.adults + self.children + self.infants
    }
}

/// A confirmed-or-pending purchase of a tour package for a date.
///
/// The total is a creation-time snapshot of the package's per-person prices
/// times the party composition; later price changes do not touch it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub reference: String,
    pub customer_id: Uuid,
    pub tour_id: Uuid,
    pub package_id: Uuid,
    pub adults: i32,
    pub children: i32,
    pub infants: i32,
    pub tour_date: NaiveDate,
    pub total: Decimal,
    pub currency: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub status: BookingStatus,
    pub voucher_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(
        customer_id: Uuid,
        request: &CreateBooking,
        reference: String,
        total: Decimal,
        package: &TourPackage,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            reference,
            customer_id,
            tour_id: request.tour_id,
            package_id: request.package_id,
            adults: request.party.adults,
            children: request.party.children,
            infants: request.party.infants,
            tour_date: request.tour_date,
            total,
            currency: package.currency.clone(),
            contact_email: request.contact_email.clone(),
            contact_phone: request.contact_phone.clone(),
            status: BookingStatus::Pending,
            voucher_path: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn party(&self) -> PartyComposition {
        PartyComposition {
            adults: self.adults,
            children: self.children,
            infants: self.infants,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBooking {
    pub tour_id: Uuid,
    pub package_id: Uuid,
    #[serde(flatten)]
    pub party: PartyComposition,
    pub tour_date: NaiveDate,
    pub contact_email: String,
    pub contact_phone: Option<String>,
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingUpdate {
    pub adults: Option<i32>,
    pub children: Option<i32>,
    pub infants: Option<i32>,
    pub tour_date: Option<NaiveDate>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
}

impl BookingUpdate {
    pub fn touches_party(&self) -> bool {
        self.adults.is_some() || self.children.is_some() || self.infants.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub customer_id: Option<Uuid>,
    pub tour_id: Option<Uuid>,
    pub status: Option<BookingStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// A booking joined with the summaries read projections return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingDetail {
    pub booking: Booking,
    pub tour: TourSummary,
    pub package: PackageSummary,
    pub customer: CustomerSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingStats {
    pub total: i64,
    pub pending: i64,
    pub confirmed: i64,
    pub cancelled: i64,
}
