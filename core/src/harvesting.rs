//! Stand merchantability and valuation.
//!
//! Stumpage bids use the Scribner Decimal C log rule on the stand's
//! mean tree. Only sawtimber-size stands attract a bid; smaller
//! merchantability classes gate harvest eligibility but are sold as
//! biomass rather than logs.

use crate::forest::Stand;
use crate::growth::GrowthModel;
use crate::stocking::StockingCondition;
use crate::types::round_to;

/// Merchantability DBH thresholds, in cm.
pub const PULPWOOD_DBH: f64 = 22.86;
pub const CHIP_N_SAW_DBH: f64 = 25.4;
pub const SAWTIMBER_DBH: f64 = 35.56;
pub const VENEER_DBH: f64 = 40.64;

/// Filter to the stands that can be cut: at or above the DBH given
/// and at least fully stocked.
pub fn harvestable(stands: &[Stand], min_dbh: f64) -> Vec<Stand> {
    stands
        .iter()
        .filter(|stand| stand.dbh >= min_dbh && stand.stocking >= StockingCondition::Full)
        .cloned()
        .collect()
}

/// Stumpage bid for the given stands, in dollars.
///
/// Per stand: DBH to inches and height to feet, both rounded to two
/// decimals, Scribner Decimal C board feet for the mean tree, to
/// thousands of board feet, times the species sawtimber value. Stands
/// under sawtimber size bid zero.
pub fn harvest_value(stands: &[Stand]) -> f64 {
    let mut value = 0.0;
    for stand in stands {
        let height = stand.species.height(stand.dbh);

        let dbh_in = round_to(stand.dbh * 0.39, 2);
        let height_ft = round_to(height * 3.28084, 2);

        let board_feet = (0.79 * dbh_in * dbh_in - 2.0 * dbh_in - 4.0) * (height_ft / 16.0);
        let mbf = board_feet / 1000.0;

        value += mbf * stand_bid(stand);
    }
    value
}

fn stand_bid(stand: &Stand) -> f64 {
    if stand.dbh >= SAWTIMBER_DBH {
        stand.species.sawtimber_value()
    } else {
        // Only bidding on sawtimber.
        0.0
    }
}

/// Advance a private copy of the stands by one growing season.
/// Projection never touches the shared grid.
pub fn project(stands: &[Stand], model: &dyn GrowthModel, acres_per_pixel: f64) -> Vec<Stand> {
    stands
        .iter()
        .map(|stand| model.grow_stand(stand, acres_per_pixel))
        .collect()
}
