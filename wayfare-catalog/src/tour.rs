use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The slice of a tour that booking projections and vouchers need.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourSummary {
    pub id: Uuid,
    pub title: String,
}

/// A purchasable tour variant with its own per-person pricing tiers.
///
/// Unit prices are fixed-point amounts in the package currency. Capacity is
/// informational: bookings are not counted against it (overbooking is an
/// accepted product trade-off, see DESIGN.md).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourPackage {
    pub id: Uuid,
    pub tour_id: Uuid,
    pub name: String,
    pub adult_price: Decimal,
    pub child_price: Decimal,
    pub infant_price: Decimal,
    pub currency: String,
    pub language: String,
    pub capacity: i32,
}

impl TourPackage {
    pub fn summary(&self) -> PackageSummary {
        PackageSummary {
            id: self.id,
            name: self.name.clone(),
            language: self.language.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageSummary {
    pub id: Uuid,
    pub name: String,
    pub language: String,
}
