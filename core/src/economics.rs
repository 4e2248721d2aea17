//! Parcel-level economics.
//!
//! Dollar figures are deliberately coarse: the model cares about the
//! relative pressure of taxes and timber revenue on enrollment and
//! harvest decisions, not about accounting precision.

use crate::types::{round_to, ACRE_IN_SQUARE_METERS};

/// Assessed value of forest land, dollars per acre.
const ASSESSED_VALUE: f64 = 1500.0;

/// US short ton, in kg.
const SHORT_TON_KG: f64 = 907.18474;

/// Green weight is roughly double the dry weight for standing timber.
const GREEN_WEIGHT_FACTOR: f64 = 2.0;

/// Annual property taxes for a parcel, rounded to cents.
/// `area` is in square meters; millage is applied per $1000 of
/// assessed value.
pub fn assess_taxes(area: f64, millage: f64) -> f64 {
    let assessed = (area / ACRE_IN_SQUARE_METERS) * ASSESSED_VALUE;
    round_to((assessed / 1000.0) * millage, 2)
}

/// Convert dry biomass in kg to green tons at the scale house.
pub fn green_tons(dry_kg: f64) -> f64 {
    dry_kg * GREEN_WEIGHT_FACTOR / SHORT_TON_KG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxes_scale_with_area_and_millage() {
        // One acre at 20 mills: 1500 / 1000 * 20 = 30 dollars.
        let taxes = assess_taxes(ACRE_IN_SQUARE_METERS, 20.0);
        assert!((taxes - 30.0).abs() < 1e-9);
        // Half the millage, half the taxes.
        assert!((assess_taxes(ACRE_IN_SQUARE_METERS, 10.0) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn taxes_round_to_cents() {
        let taxes = assess_taxes(1234.5, 19.7);
        assert!((taxes * 100.0 - (taxes * 100.0).round()).abs() < 1e-9);
    }

    #[test]
    fn green_tons_doubles_dry_weight() {
        let tons = green_tons(907.18474);
        assert!((tons - 2.0).abs() < 1e-9);
    }
}
