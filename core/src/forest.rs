//! The forest grid and its stands.
//!
//! The grid owns one row-major vector per field (land cover, DBH,
//! tree count, age, stocking, species) rather than a vector of stand
//! structs, so that grid passes can hand each worker a disjoint
//! mutable row band of exactly the fields the pass writes.
//!
//! RULE: set_stand never writes the stocking field. Stocking is only
//! written by recompute_stocking, which runs strictly after growth.
//!
//! Biomass figures are kg dry weight throughout; callers convert to
//! green tons at the market boundary.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::executor::{partition_rows, ParallelGridExecutor};
use crate::growth::GrowthModel;
use crate::landcover::LandCoverClass;
use crate::rng::SimStream;
use crate::species::Species;
use crate::stocking::{stocking_ratio, StockingCondition};
use crate::types::{Coord, ACRE_IN_SQUARE_METERS};

/// Replanting density after a clear cut, per common US guidelines.
pub const REPLANT_TREES_PER_ACRE: f64 = 300.0;

/// A snapshot of one cell of the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stand {
    pub coord: Coord,
    pub land_cover: LandCoverClass,
    pub species: Species,
    /// Arithmetic mean diameter at breast height, in cm.
    pub dbh: f64,
    pub tree_count: u32,
    /// Stand age in growing seasons.
    pub age: u32,
    pub stocking: StockingCondition,
}

impl Stand {
    /// An empty stand: no trees, no growth. Used for non-woody cells.
    pub fn empty(coord: Coord, land_cover: LandCoverClass) -> Self {
        Self {
            coord,
            land_cover,
            species: Species::RedMaple,
            dbh: 0.0,
            tree_count: 0,
            age: 0,
            stocking: StockingCondition::Nonstocked,
        }
    }
}

/// Instruction to remove a fraction of one stand's trees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThinningPlan {
    pub coord: Coord,
    /// Fraction of the trees to remove, in [0, 1].
    pub fraction: f64,
}

/// Biomass removed by a harvest or thinning operation, kg dry weight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Harvest {
    pub stem_biomass: f64,
    pub total_biomass: f64,
}

impl Harvest {
    pub fn accumulate(&mut self, other: Harvest) {
        self.stem_biomass += other.stem_biomass;
        self.total_biomass += other.total_biomass;
    }
}

pub struct ForestGrid {
    width: usize,
    height: usize,
    acres_per_pixel: f64,
    model: Arc<dyn GrowthModel>,
    land_cover: Vec<LandCoverClass>,
    species: Vec<Species>,
    dbh: Vec<f64>,
    tree_count: Vec<u32>,
    age: Vec<u32>,
    stocking: Vec<StockingCondition>,
}

impl ForestGrid {
    /// Build the grid from a land-cover raster, seeding every cell
    /// through the growth model. `pixel_edge` is the cell edge length
    /// in meters. Initialization is single-threaded and consumes the
    /// growth stream sequentially in row-major order.
    pub fn new(
        width: usize,
        height: usize,
        pixel_edge: f64,
        land_cover: Vec<LandCoverClass>,
        model: Arc<dyn GrowthModel>,
        stream: &mut SimStream,
    ) -> SimResult<Self> {
        if width == 0 || height == 0 {
            return Err(SimError::Configuration(
                "grid dimensions must be non-zero".to_string(),
            ));
        }
        if land_cover.len() != width * height {
            return Err(SimError::Configuration(format!(
                "land cover raster has {} cells, expected {}",
                land_cover.len(),
                width * height
            )));
        }
        if pixel_edge <= 0.0 {
            return Err(SimError::Configuration(
                "pixel edge length must be positive".to_string(),
            ));
        }

        let cells = width * height;
        let acres_per_pixel = (pixel_edge * pixel_edge) / ACRE_IN_SQUARE_METERS;
        let mut grid = Self {
            width,
            height,
            acres_per_pixel,
            model,
            land_cover,
            species: Vec::with_capacity(cells),
            dbh: Vec::with_capacity(cells),
            tree_count: Vec::with_capacity(cells),
            age: Vec::with_capacity(cells),
            stocking: vec![StockingCondition::Nonstocked; cells],
        };

        for y in 0..height {
            for x in 0..width {
                let coord = Coord::new(x, y);
                let cover = grid.land_cover[y * width + x];
                let stand = grid
                    .model
                    .initial_stand(stream, coord, cover, acres_per_pixel);
                grid.species.push(stand.species);
                grid.dbh.push(stand.dbh);
                grid.tree_count.push(stand.tree_count);
                grid.age.push(stand.age);
            }
        }

        log::info!(
            "forest grid ready: {width}x{height} cells, {:.3} acres per pixel",
            acres_per_pixel
        );
        Ok(grid)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn acres_per_pixel(&self) -> f64 {
        self.acres_per_pixel
    }

    pub fn growth_model(&self) -> &Arc<dyn GrowthModel> {
        &self.model
    }

    fn index(&self, x: usize, y: usize) -> usize {
        assert!(x < self.width && y < self.height, "coordinates out of bounds");
        y * self.width + x
    }

    /// Snapshot the stand at the given cell.
    pub fn stand(&self, x: usize, y: usize) -> Stand {
        let ndx = self.index(x, y);
        Stand {
            coord: Coord::new(x, y),
            land_cover: self.land_cover[ndx],
            species: self.species[ndx],
            dbh: self.dbh[ndx],
            tree_count: self.tree_count[ndx],
            age: self.age[ndx],
            stocking: self.stocking[ndx],
        }
    }

    /// Write a stand's mutable fields back to the grid. Land cover,
    /// species, and stocking are never written through this path.
    pub fn set_stand(&mut self, stand: &Stand) {
        let ndx = self.index(stand.coord.x, stand.coord.y);
        self.dbh[ndx] = stand.dbh;
        self.tree_count[ndx] = stand.tree_count;
        self.age[ndx] = stand.age;
    }

    /// Grow every woody stand by one season. Results are identical
    /// for any worker count.
    pub fn grow(&mut self, exec: &ParallelGridExecutor) {
        let ranges = partition_rows(self.height, exec.workers());
        let width = self.width;
        let acres = self.acres_per_pixel;
        let model = Arc::clone(&self.model);
        let land_cover = &self.land_cover;
        let species = &self.species;
        let stocking = &self.stocking;

        let dbh_bands = split_rows(&mut self.dbh, &ranges, width);
        let count_bands = split_rows(&mut self.tree_count, &ranges, width);
        let age_bands = split_rows(&mut self.age, &ranges, width);

        exec.scope(|s| {
            for (((range, dbh), tree_count), age) in ranges
                .iter()
                .cloned()
                .zip(dbh_bands)
                .zip(count_bands)
                .zip(age_bands)
            {
                let model = Arc::clone(&model);
                s.spawn(move |_| {
                    for (row, y) in range.enumerate() {
                        for x in 0..width {
                            let ndx = y * width + x;
                            if !land_cover[ndx].is_woody_biomass() {
                                continue;
                            }
                            let local = row * width + x;
                            let stand = Stand {
                                coord: Coord::new(x, y),
                                land_cover: land_cover[ndx],
                                species: species[ndx],
                                dbh: dbh[local],
                                tree_count: tree_count[local],
                                age: age[local],
                                stocking: stocking[ndx],
                            };
                            let grown = model.grow_stand(&stand, acres);
                            dbh[local] = grown.dbh;
                            tree_count[local] = grown.tree_count;
                            age[local] = grown.age;
                        }
                    }
                });
            }
        });
    }

    /// Reclassify the stocking of every cell. The only writer of the
    /// stocking field; runs strictly after grow.
    pub fn recompute_stocking(&mut self, exec: &ParallelGridExecutor) {
        let ranges = partition_rows(self.height, exec.workers());
        let width = self.width;
        let acres = self.acres_per_pixel;
        let model = Arc::clone(&self.model);
        let land_cover = &self.land_cover;
        let dbh = &self.dbh;
        let tree_count = &self.tree_count;

        let stocking_bands = split_rows(&mut self.stocking, &ranges, width);

        exec.scope(|s| {
            for (range, stocking) in ranges.iter().cloned().zip(stocking_bands) {
                let model = Arc::clone(&model);
                s.spawn(move |_| {
                    for (row, y) in range.enumerate() {
                        for x in 0..width {
                            let ndx = y * width + x;
                            let local = row * width + x;
                            let cover = land_cover[ndx];
                            if !cover.is_woody_biomass() {
                                stocking[local] = StockingCondition::Nonstocked;
                                continue;
                            }
                            let guide = model.stocking_guide(cover);
                            let ratio = stocking_ratio(
                                guide,
                                dbh[ndx],
                                tree_count[ndx] as f64,
                                acres,
                            );
                            stocking[local] = StockingCondition::classify(ratio);
                        }
                    }
                });
            }
        });
    }

    /// Clear-cut the given stands and return the removed biomass.
    /// Each stand is reset to bare reseeded ground: DBH 0, age 0,
    /// replanting density of trees. Harvesting an already-reset cell
    /// removes nothing.
    pub fn harvest(&mut self, stands: &[Coord]) -> Harvest {
        let mut removed = Harvest::default();
        let replanted = (REPLANT_TREES_PER_ACRE * self.acres_per_pixel) as u32;
        for coord in stands {
            let ndx = self.index(coord.x, coord.y);
            let species = self.species[ndx];
            let dbh = self.dbh[ndx];
            let count = self.tree_count[ndx] as f64;
            removed.stem_biomass += species.stem_biomass(dbh) * count;
            removed.total_biomass += species.biomass(dbh) * count;

            self.dbh[ndx] = 0.0;
            self.tree_count[ndx] = replanted;
            self.age[ndx] = 0;
        }
        removed
    }

    /// Remove a fraction of the trees from each planned stand. The
    /// removed biomass is valued at the pre-thinning diameter; DBH
    /// and age are untouched. Fractions outside [0, 1] are clamped
    /// so a removal can never exceed the standing count.
    pub fn thin(&mut self, plans: &[ThinningPlan]) -> Harvest {
        let mut removed = Harvest::default();
        for plan in plans {
            let ndx = self.index(plan.coord.x, plan.coord.y);
            let species = self.species[ndx];
            let dbh = self.dbh[ndx];
            let count = self.tree_count[ndx];
            let taken = (count as f64 * plan.fraction.clamp(0.0, 1.0)) as u32;
            self.tree_count[ndx] = count - taken;

            removed.stem_biomass += species.stem_biomass(dbh) * taken as f64;
            removed.total_biomass += species.biomass(dbh) * taken as f64;
        }
        removed
    }

    /// Total standing above-ground biomass across the grid, kg.
    pub fn total_biomass(&self) -> f64 {
        let mut biomass = 0.0;
        for ndx in 0..self.land_cover.len() {
            if !self.land_cover[ndx].is_woody_biomass() {
                continue;
            }
            biomass += self.species[ndx].biomass(self.dbh[ndx]) * self.tree_count[ndx] as f64;
        }
        biomass
    }
}

/// Split a row-major field into one mutable slice per row range.
/// Ranges must be contiguous and ascending, as partition_rows
/// produces them.
fn split_rows<'a, T>(
    cells: &'a mut [T],
    ranges: &[std::ops::Range<usize>],
    width: usize,
) -> Vec<&'a mut [T]> {
    let mut rest = cells;
    let mut bands = Vec::with_capacity(ranges.len());
    for range in ranges {
        let (band, tail) = rest.split_at_mut(range.len() * width);
        bands.push(band);
        rest = tail;
    }
    bands
}
