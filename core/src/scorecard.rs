//! Per-tick telemetry snapshot.
//!
//! The engine assembles one scorecard at the end of every tick.
//! Consumers poll it; nothing is ever pushed.

use crate::types::Tick;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scorecard {
    pub tick: Tick,
    /// Harvest requests queued this tick, served or not.
    pub harvest_demand: usize,
    /// Harvest requests served this tick.
    pub harvest_supplied: usize,
    /// Kg dry stem wood removed this tick.
    pub tick_stem_biomass: f64,
    /// Kg dry weight removed this tick in total.
    pub tick_total_biomass: f64,
    pub cumulative_stem_biomass: f64,
    pub cumulative_total_biomass: f64,
    pub vip_subscriptions: usize,
    /// Enrolled area in square meters.
    pub vip_enrolled_area: f64,
    /// Standing above-ground biomass across the grid, kg.
    pub standing_biomass: f64,
}
