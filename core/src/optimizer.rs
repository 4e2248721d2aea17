//! Harvest timing by net present value.
//!
//! An economically-minded owner does not cut the moment a stand is
//! merchantable; they weigh the growing value of the timber against
//! the discount on money received later. The optimizer projects the
//! parcel forward season by season, bids each projected year, and
//! picks the offset with the highest discounted bid.
//!
//! RULE: Projection works on a private copy of the stands. The shared
//! grid is never touched. Ties break toward the earliest year.

use serde::{Deserialize, Serialize};

use crate::forest::Stand;
use crate::growth::GrowthModel;
use crate::harvesting::{harvest_value, harvestable, project};
use crate::types::Tick;

/// Longest projection in growing seasons.
pub const DEFAULT_HORIZON: u64 = 100;

/// Parcels larger than this only need this much qualifying area.
pub const HARVEST_AREA_CAP_ACRES: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HarvestPlan {
    /// Seasons from now at which to harvest.
    pub offset: Tick,
    /// The discounted bid at that offset, in dollars.
    pub bid: f64,
}

pub struct HarvestTimingOptimizer {
    horizon: u64,
}

impl Default for HarvestTimingOptimizer {
    fn default() -> Self {
        Self::new(DEFAULT_HORIZON)
    }
}

impl HarvestTimingOptimizer {
    pub fn new(horizon: u64) -> Self {
        Self { horizon }
    }

    /// Find the harvest offset with the best net present value.
    ///
    /// At each projected season the bid covers the stands at or above
    /// `min_dbh` and fully stocked; the bid is zero unless those
    /// stands cover the minimum area, the lesser of the parcel area
    /// and the 40 acre cap.
    pub fn optimize(
        &self,
        stands: &[Stand],
        model: &dyn GrowthModel,
        acres_per_pixel: f64,
        min_dbh: f64,
        discount_rate: f64,
    ) -> HarvestPlan {
        let parcel_acres = stands.len() as f64 * acres_per_pixel;
        let min_area = parcel_acres.min(HARVEST_AREA_CAP_ACRES);

        let mut best = HarvestPlan { offset: 0, bid: 0.0 };
        let mut projected: Vec<Stand> = stands.to_vec();

        for offset in 0..=self.horizon {
            if offset > 0 {
                projected = project(&projected, model, acres_per_pixel);
            }

            let qualifying = harvestable(&projected, min_dbh);
            let area = qualifying.len() as f64 * acres_per_pixel;
            let value = if area < min_area {
                0.0
            } else {
                harvest_value(&qualifying)
            };

            let bid = npv(value, discount_rate, offset);
            if bid > best.bid {
                best = HarvestPlan { offset, bid };
            }
        }
        best
    }
}

/// Present value of `value` dollars received `years` from now.
pub fn npv(value: f64, rate: f64, years: u64) -> f64 {
    value / (1.0 + rate).powi(years as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn npv_discounts_future_value() {
        assert_eq!(npv(100.0, 0.05, 0), 100.0);
        assert!((npv(100.0, 0.05, 1) - 95.238_095).abs() < 1e-5);
        assert!(npv(100.0, 0.05, 10) < npv(100.0, 0.05, 1));
    }

    #[test]
    fn zero_rate_never_discounts() {
        assert_eq!(npv(100.0, 0.0, 50), 100.0);
    }
}
