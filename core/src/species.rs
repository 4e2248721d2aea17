//! Tree species capabilities.
//!
//! The engine models two reference species for the western Upper
//! Peninsula: red maple as the hardwood reference and eastern white
//! pine as the softwood reference. Allometric forms:
//!   - biomass: ln-ln whole-tree equation, exp(b0 + b1 * ln(dbh))
//!   - stem fraction: component-ratio form, exp(c0 + c1 / dbh)
//!   - height: Kershaw et al. 2008 height-diameter equation
//!
//! Red maple reaches sawtimber size in roughly 60 years from seeding.

use crate::types::DBH_TAKEN_AT;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    RedMaple,
    EasternWhitePine,
}

impl Species {
    pub fn name(&self) -> &'static str {
        match self {
            Self::RedMaple => "Red Maple",
            Self::EasternWhitePine => "Eastern White Pine",
        }
    }

    /// Maximum mean stand DBH, in cm.
    pub fn max_dbh(&self) -> f64 {
        match self {
            Self::RedMaple => 76.0,
            Self::EasternWhitePine => 102.0,
        }
    }

    /// Mean annual DBH growth, in cm per year.
    pub fn dbh_growth_rate(&self) -> f64 {
        match self {
            Self::RedMaple => 0.57,
            Self::EasternWhitePine => 0.75,
        }
    }

    /// Total above-ground biomass of a representative tree, in kg dry weight.
    pub fn biomass(&self, dbh: f64) -> f64 {
        if dbh <= 0.0 {
            return 0.0;
        }
        let (beta0, beta1) = match self {
            Self::RedMaple => (-2.0127, 2.4342),
            Self::EasternWhitePine => (-2.5356, 2.4349),
        };
        (beta0 + beta1 * dbh.ln()).exp()
    }

    /// Stem-wood biomass of a representative tree, in kg dry weight.
    pub fn stem_biomass(&self, dbh: f64) -> f64 {
        if dbh <= 0.0 {
            return 0.0;
        }
        let (c0, c1) = match self {
            // Jenkins component ratios, hardwood and softwood stem wood
            Self::RedMaple => (-0.3065, -5.4240),
            Self::EasternWhitePine => (-0.3737, -1.8055),
        };
        self.biomass(dbh) * (c0 + c1 / dbh).exp()
    }

    /// Height of a representative tree with the given DBH, in meters.
    pub fn height(&self, dbh: f64) -> f64 {
        if dbh <= 0.0 {
            return 0.0;
        }
        let (b1, b2, b3) = match self {
            Self::RedMaple => (29.007, 0.053, 1.175),
            Self::EasternWhitePine => (33.826, 0.047, 1.054),
        };
        DBH_TAKEN_AT + b1 * (1.0 - (-b2 * dbh).exp()).powf(b3)
    }

    /// The value of one thousand board feet of sawtimber, in dollars.
    pub fn sawtimber_value(&self) -> f64 {
        match self {
            Self::RedMaple => 450.0,
            Self::EasternWhitePine => 105.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn biomass_is_monotonic_in_dbh() {
        for species in [Species::RedMaple, Species::EasternWhitePine] {
            let mut last = 0.0;
            for dbh in [5.0, 10.0, 20.0, 40.0, 60.0] {
                let biomass = species.biomass(dbh);
                assert!(biomass > last, "{} biomass not monotonic", species.name());
                last = biomass;
            }
        }
    }

    #[test]
    fn stem_biomass_is_a_fraction_of_total() {
        for species in [Species::RedMaple, Species::EasternWhitePine] {
            for dbh in [10.0, 25.0, 50.0] {
                let total = species.biomass(dbh);
                let stem = species.stem_biomass(dbh);
                assert!(stem > 0.0 && stem < total);
            }
        }
    }

    #[test]
    fn zero_dbh_has_no_biomass_and_no_height() {
        assert_eq!(Species::RedMaple.biomass(0.0), 0.0);
        assert_eq!(Species::RedMaple.height(0.0), 0.0);
    }
}
