//! Stand growth models.
//!
//! A growth model is the pluggable biology of the simulation: it
//! seeds the initial forest state and advances one stand by one
//! growing season. Models must be pure per stand so that grid passes
//! can run on any number of workers and harvest projections can be
//! computed without touching shared state.
//!
//! RULE: A model may not carry mutable state or draw from a shared
//! RNG inside grow_stand. Per-stand noise comes from cell_stream,
//! which is a function of (master seed, coordinates, stand age).

use crate::forest::Stand;
use crate::landcover::LandCoverClass;
use crate::rng::{cell_stream, SimStream};
use crate::species::Species;
use crate::stocking::{stocking_ratio, StockingCondition, StockingGuideEntry};
use crate::types::Coord;

pub trait GrowthModel: Send + Sync {
    /// Seed the initial stand for a cell. Non-woody cells come back
    /// empty. `stream` is the run's growth stream; initialization is
    /// single-threaded so sequential draws are deterministic.
    fn initial_stand(
        &self,
        stream: &mut SimStream,
        coord: Coord,
        land_cover: LandCoverClass,
        acres_per_pixel: f64,
    ) -> Stand;

    /// Advance a stand by one growing season and return the result.
    /// Never mutates anything shared; the caller decides what to do
    /// with the returned stand.
    fn grow_stand(&self, stand: &Stand, acres_per_pixel: f64) -> Stand;

    /// The stocking guide for stands on the given land cover.
    fn stocking_guide(&self, land_cover: LandCoverClass) -> &[StockingGuideEntry];

    /// The reference species for a cell. Must be a pure function of
    /// the cover class and coordinates.
    fn species_for(&self, land_cover: LandCoverClass, coord: Coord) -> Species;
}

/// Even-aged whole-stand model for the western Upper Peninsula.
///
/// Red maple is the reference hardwood (deciduous forest, woody
/// wetlands, and mixed forest per DNR readings) and eastern white
/// pine the reference softwood. Mixed-forest cells alternate between
/// the two by coordinate parity.
pub struct EvenAgedGrowthModel {
    master_seed: u64,
    hardwood_guide: Vec<StockingGuideEntry>,
    softwood_guide: Vec<StockingGuideEntry>,
}

/// Stocking ratio above which a stand sheds trees to competition.
const SELF_THINNING_RATIO: f64 = 160.0;

impl EvenAgedGrowthModel {
    pub fn new(master_seed: u64) -> Self {
        Self {
            master_seed,
            hardwood_guide: hardwood_stocking_guide(),
            softwood_guide: softwood_stocking_guide(),
        }
    }
}

impl GrowthModel for EvenAgedGrowthModel {
    fn initial_stand(
        &self,
        stream: &mut SimStream,
        coord: Coord,
        land_cover: LandCoverClass,
        acres_per_pixel: f64,
    ) -> Stand {
        if !land_cover.is_woody_biomass() {
            return Stand::empty(coord, land_cover);
        }

        let species = self.species_for(land_cover, coord);

        // Scale the noise base to the DBH, then seed the stand at the
        // fully-stocked guide density skewed by up to +/- 20%.
        let dbh = species.max_dbh() * stream.next_f64();
        let guide = self.stocking_guide(land_cover);
        let ideal = guide_trees_per_acre(guide, dbh) * acres_per_pixel;
        let skew = (stream.next_u64_below(41) as f64 - 20.0) / 100.0;
        let tree_count = (ideal - ideal * skew) as u32;

        // Loose estimate: age from the mean growth rate.
        let age = (dbh / species.dbh_growth_rate()) as u32;

        Stand {
            coord,
            land_cover,
            species,
            dbh,
            tree_count,
            age,
            stocking: StockingCondition::Nonstocked,
        }
    }

    fn grow_stand(&self, stand: &Stand, acres_per_pixel: f64) -> Stand {
        let mut next = stand.clone();
        if !stand.land_cover.is_woody_biomass() {
            return next;
        }

        let species = stand.species;
        let mut stream = cell_stream(self.master_seed, stand.coord.x, stand.coord.y, stand.age);

        // Grow the trunk with +/- 10% noise, clamped at the maximum.
        if next.dbh < species.max_dbh() {
            let mean = species.dbh_growth_rate();
            let value = mean + mean * stream.range(-0.1, 0.1);
            next.dbh = (next.dbh + value).min(species.max_dbh());
        }

        next.age += 1;

        // Competition sheds up to 10% of the trees in crowded stands.
        let guide = self.stocking_guide(stand.land_cover);
        let ratio = stocking_ratio(guide, next.dbh, next.tree_count as f64, acres_per_pixel);
        if ratio > SELF_THINNING_RATIO {
            let thinning = stream.next_u64_below(10) as f64 / 100.0;
            next.tree_count -= (next.tree_count as f64 * thinning) as u32;
        }

        let ratio = stocking_ratio(guide, next.dbh, next.tree_count as f64, acres_per_pixel);
        next.stocking = StockingCondition::classify(ratio);
        next
    }

    fn stocking_guide(&self, land_cover: LandCoverClass) -> &[StockingGuideEntry] {
        match land_cover {
            LandCoverClass::EvergreenForest => &self.softwood_guide,
            _ => &self.hardwood_guide,
        }
    }

    fn species_for(&self, land_cover: LandCoverClass, coord: Coord) -> Species {
        match land_cover {
            LandCoverClass::EvergreenForest => Species::EasternWhitePine,
            LandCoverClass::MixedForest => {
                if (coord.x + coord.y) % 2 == 0 {
                    Species::RedMaple
                } else {
                    Species::EasternWhitePine
                }
            }
            _ => Species::RedMaple,
        }
    }
}

/// Fully-stocked trees per acre for the given mean DBH, same scan
/// rule as the basal-area lookup.
pub fn guide_trees_per_acre(guide: &[StockingGuideEntry], dbh: f64) -> f64 {
    for (ndx, entry) in guide.iter().enumerate() {
        if dbh < entry.dbh_break {
            let ideal = if ndx > 0 { &guide[ndx - 1] } else { &guide[0] };
            return ideal.ideal_trees_per_acre;
        }
    }
    guide[guide.len() - 1].ideal_trees_per_acre
}

fn entry(dbh_break: f64, ideal_basal_area: f64, ideal_trees_per_acre: f64) -> StockingGuideEntry {
    StockingGuideEntry {
        dbh_break,
        ideal_basal_area,
        ideal_trees_per_acre,
    }
}

/// Even-aged northern hardwoods guide (red maple reference), basal
/// area in square meters per acre.
fn hardwood_stocking_guide() -> Vec<StockingGuideEntry> {
    vec![
        entry(5.08, 2.8, 1210.0),
        entry(10.16, 4.6, 700.0),
        entry(15.24, 6.2, 430.0),
        entry(20.32, 7.6, 290.0),
        entry(25.40, 8.8, 215.0),
        entry(30.48, 9.8, 165.0),
        entry(35.56, 10.6, 130.0),
        entry(40.64, 11.2, 105.0),
        entry(45.72, 11.7, 85.0),
        entry(50.80, 12.0, 75.0),
    ]
}

/// Even-aged white pine guide, basal area in square meters per acre.
fn softwood_stocking_guide() -> Vec<StockingGuideEntry> {
    vec![
        entry(5.08, 3.5, 1500.0),
        entry(10.16, 6.0, 900.0),
        entry(15.24, 8.3, 560.0),
        entry(20.32, 10.2, 380.0),
        entry(25.40, 11.8, 280.0),
        entry(30.48, 13.1, 215.0),
        entry(35.56, 14.2, 170.0),
        entry(40.64, 15.1, 140.0),
        entry(45.72, 15.8, 115.0),
        entry(50.80, 16.3, 100.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn woody_stand(dbh: f64, age: u32) -> Stand {
        Stand {
            coord: Coord::new(3, 7),
            land_cover: LandCoverClass::DeciduousForest,
            species: Species::RedMaple,
            dbh,
            tree_count: 200,
            age,
            stocking: StockingCondition::Nonstocked,
        }
    }

    #[test]
    fn growth_is_pure_per_stand() {
        let model = EvenAgedGrowthModel::new(42);
        let stand = woody_stand(20.0, 35);
        let a = model.grow_stand(&stand, 0.25);
        let b = model.grow_stand(&stand, 0.25);
        assert_eq!(a.dbh, b.dbh);
        assert_eq!(a.tree_count, b.tree_count);
        assert_eq!(a.age, stand.age + 1);
    }

    #[test]
    fn growth_clamps_at_maximum_dbh() {
        let model = EvenAgedGrowthModel::new(42);
        let mut stand = woody_stand(75.9, 130);
        for _ in 0..5 {
            stand = model.grow_stand(&stand, 0.25);
        }
        assert!(stand.dbh <= Species::RedMaple.max_dbh());
    }

    #[test]
    fn growth_noise_stays_within_ten_percent() {
        let model = EvenAgedGrowthModel::new(7);
        let rate = Species::RedMaple.dbh_growth_rate();
        for age in 0..50 {
            let stand = woody_stand(20.0, age);
            let grown = model.grow_stand(&stand, 0.25);
            let delta = grown.dbh - stand.dbh;
            assert!(delta >= rate * 0.9 - 1e-9 && delta <= rate * 1.1 + 1e-9);
        }
    }

    #[test]
    fn non_woody_cells_do_not_grow() {
        let model = EvenAgedGrowthModel::new(42);
        let stand = Stand::empty(Coord::new(0, 0), LandCoverClass::Developed);
        let grown = model.grow_stand(&stand, 0.25);
        assert_eq!(grown.dbh, 0.0);
        assert_eq!(grown.age, 0);
    }

    #[test]
    fn mixed_forest_species_follows_cell_parity() {
        let model = EvenAgedGrowthModel::new(42);
        let a = model.species_for(LandCoverClass::MixedForest, Coord::new(2, 2));
        let b = model.species_for(LandCoverClass::MixedForest, Coord::new(2, 3));
        assert_eq!(a, Species::RedMaple);
        assert_eq!(b, Species::EasternWhitePine);
    }
}
