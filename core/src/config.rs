//! Run configuration.
//!
//! A run is fully described by one JSON config plus the master seed.
//! Validation happens once at engine construction; a bad config is a
//! fatal Configuration error, never a silently patched value.

use serde::{Deserialize, Serialize};

use crate::agent::AgentKind;
use crate::error::{SimError, SimResult};
use crate::landcover::LandCoverClass;
use crate::types::{AgentId, Coord};
use crate::vip::VipPolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    pub width: usize,
    pub height: usize,
    /// Cell edge length in meters.
    pub pixel_edge: f64,
    /// NLCD grid codes, row-major. Empty means uniform deciduous
    /// forest, which is what most tests want.
    #[serde(default)]
    pub land_cover: Vec<u8>,
}

impl GridConfig {
    /// Decode the raster into cover classes.
    pub fn land_cover_classes(&self) -> SimResult<Vec<LandCoverClass>> {
        let cells = self.width * self.height;
        if self.land_cover.is_empty() {
            return Ok(vec![LandCoverClass::DeciduousForest; cells]);
        }
        if self.land_cover.len() != cells {
            return Err(SimError::Configuration(format!(
                "land cover raster has {} codes, expected {}",
                self.land_cover.len(),
                cells
            )));
        }
        self.land_cover
            .iter()
            .map(|&code| {
                LandCoverClass::from_grid_code(code).ok_or_else(|| {
                    SimError::Configuration(format!("unknown land cover grid code {code}"))
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub id: AgentId,
    pub kind: AgentKind,
    /// Cells of the parcel the agent owns.
    pub parcel: Vec<Coord>,
    /// Ids of adjacent parcel owners, supplied by whoever built the
    /// parcel map.
    #[serde(default)]
    pub neighbors: Vec<AgentId>,
    /// Odds per tick that an ecosystem agent looks into harvesting.
    #[serde(default)]
    pub harvest_odds: f64,
    /// Willingness of an ecosystem agent to join the incentive
    /// program at all.
    #[serde(default)]
    pub willingness_to_join_vip: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    pub grid: GridConfig,
    /// Requests the market can serve per tick.
    pub harvest_capacity: usize,
    /// Base property tax millage rate.
    pub millage_rate: f64,
    /// Range the per-agent discount rate is drawn from.
    pub discount_rate_min: f64,
    pub discount_rate_max: f64,
    /// Longest harvest projection, in growing seasons.
    #[serde(default = "default_horizon")]
    pub npv_horizon: u64,
    /// Grid pass workers. None means available parallelism.
    #[serde(default)]
    pub workers: Option<usize>,
    /// The incentive program on offer, if any.
    #[serde(default)]
    pub vip_policy: Option<VipPolicy>,
    pub agents: Vec<AgentConfig>,
}

fn default_horizon() -> u64 {
    crate::optimizer::DEFAULT_HORIZON
}

impl SimConfig {
    /// Load from a JSON file.
    /// In tests, use SimConfig::default_test().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: SimConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn validate(&self) -> SimResult<()> {
        if self.grid.width == 0 || self.grid.height == 0 {
            return Err(SimError::Configuration(
                "grid dimensions must be non-zero".to_string(),
            ));
        }
        if self.grid.pixel_edge <= 0.0 {
            return Err(SimError::Configuration(
                "pixel edge length must be positive".to_string(),
            ));
        }
        if let Some(0) = self.workers {
            return Err(SimError::Configuration(
                "worker count must be at least 1".to_string(),
            ));
        }
        if self.millage_rate < 0.0 {
            return Err(SimError::Configuration(
                "millage rate must not be negative".to_string(),
            ));
        }
        if self.discount_rate_min < 0.0 || self.discount_rate_max < self.discount_rate_min {
            return Err(SimError::Configuration(
                "discount rate range is inverted or negative".to_string(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for agent in &self.agents {
            if !seen.insert(agent.id) {
                return Err(SimError::Configuration(format!(
                    "duplicate agent id {}",
                    agent.id
                )));
            }
            if agent.parcel.is_empty() {
                return Err(SimError::Configuration(format!(
                    "agent {} has an empty parcel",
                    agent.id
                )));
            }
            for coord in &agent.parcel {
                if coord.x >= self.grid.width || coord.y >= self.grid.height {
                    return Err(SimError::Configuration(format!(
                        "agent {} parcel cell ({}, {}) is out of bounds",
                        agent.id, coord.x, coord.y
                    )));
                }
            }
            if !(0.0..=1.0).contains(&agent.harvest_odds)
                || !(0.0..=1.0).contains(&agent.willingness_to_join_vip)
            {
                return Err(SimError::Configuration(format!(
                    "agent {} probabilities must be within [0, 1]",
                    agent.id
                )));
            }
        }
        Ok(())
    }

    /// A small, fully deterministic config for tests: an 8x8 uniform
    /// deciduous grid with 200 m pixels (just under 10 acres each)
    /// and one agent of each kind.
    pub fn default_test() -> Self {
        Self {
            grid: GridConfig {
                width: 8,
                height: 8,
                pixel_edge: 200.0,
                land_cover: Vec::new(),
            },
            harvest_capacity: 2,
            millage_rate: 35.0,
            discount_rate_min: 0.03,
            discount_rate_max: 0.07,
            npv_horizon: 50,
            workers: Some(2),
            vip_policy: Some(VipPolicy::FlatDiscount { mills: 15.0 }),
            agents: vec![
                AgentConfig {
                    id: 1,
                    kind: AgentKind::Economic,
                    parcel: vec![Coord::new(0, 0), Coord::new(1, 0), Coord::new(0, 1)],
                    neighbors: vec![2],
                    harvest_odds: 0.0,
                    willingness_to_join_vip: 0.0,
                },
                AgentConfig {
                    id: 2,
                    kind: AgentKind::Ecosystem,
                    parcel: vec![Coord::new(3, 3), Coord::new(4, 3), Coord::new(3, 4)],
                    neighbors: vec![1],
                    harvest_odds: 0.3,
                    willingness_to_join_vip: 0.5,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_test_config_is_valid() {
        SimConfig::default_test().validate().unwrap();
    }

    #[test]
    fn duplicate_agent_ids_are_rejected() {
        let mut config = SimConfig::default_test();
        config.agents[1].id = config.agents[0].id;
        assert!(matches!(
            config.validate(),
            Err(SimError::Configuration(_))
        ));
    }

    #[test]
    fn out_of_bounds_parcel_is_rejected() {
        let mut config = SimConfig::default_test();
        config.agents[0].parcel.push(Coord::new(99, 0));
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_land_cover_code_is_rejected() {
        let mut config = SimConfig::default_test();
        config.grid.land_cover = vec![17; 64];
        assert!(config.grid.land_cover_classes().is_err());
    }

    #[test]
    fn empty_raster_defaults_to_deciduous() {
        let config = SimConfig::default_test();
        let classes = config.grid.land_cover_classes().unwrap();
        assert_eq!(classes.len(), 64);
        assert!(classes
            .iter()
            .all(|&c| c == LandCoverClass::DeciduousForest));
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = SimConfig::default_test();
        let json = serde_json::to_string(&config).unwrap();
        let back: SimConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.agents.len(), config.agents.len());
        assert_eq!(back.grid.width, config.grid.width);
    }
}
