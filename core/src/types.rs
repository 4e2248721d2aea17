//! Shared primitive types used across the entire simulation.

use serde::{Deserialize, Serialize};

/// A simulation tick. One tick = one growing season (a year).
pub type Tick = u64;

/// A stable, unique identifier for a parcel agent within a run.
pub type AgentId = u32;

/// A stable identifier for a registered biomass consumer.
pub type ConsumerId = u32;

/// Grid coordinates of a single stand (pixel) in the forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub x: usize,
    pub y: usize,
}

impl Coord {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// Size of one acre of land in square meters.
pub const ACRE_IN_SQUARE_METERS: f64 = 4046.86;

/// The height at which a diameter-at-breast-height measurement is taken, in meters.
pub const DBH_TAKEN_AT: f64 = 1.37;

/// Round a value to the given number of decimal places.
pub fn round_to(value: f64, places: u32) -> f64 {
    let units = 10f64.powi(places as i32);
    (value * units).round() / units
}
