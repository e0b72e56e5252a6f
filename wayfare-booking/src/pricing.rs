//! Pure pricing math - no database access.

use rust_decimal::Decimal;

use crate::models::PartyComposition;
use wayfare_catalog::TourPackage;

/// Total charge for a party against a package's per-person tier prices.
///
/// Exact fixed-point arithmetic: `adults*adult_price + children*child_price +
/// infants*infant_price`, no rounding beyond the precision already carried by
/// the unit prices.
pub fn party_total(party: &PartyComposition, package: &TourPackage) -> Decimal {
    Decimal::from(party.adults) * package.adult_price
        + Decimal::from(party.children) * package.child_price
        + Decimal::from(party.infants) * package.infant_price
}
