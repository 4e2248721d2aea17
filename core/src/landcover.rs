//! NLCD-style land cover classification.
//!
//! Grid codes match the NLCD 2011 values so externally supplied cover
//! rasters can be consumed without translation. Only the classes the
//! growth model distinguishes are carried; everything else maps to
//! the non-forest classes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandCoverClass {
    OpenWater,
    Developed,
    Barren,
    DeciduousForest,
    EvergreenForest,
    MixedForest,
    Grassland,
    Pasture,
    WoodyWetlands,
}

impl LandCoverClass {
    /// The NLCD 2011 grid code for this class.
    pub fn grid_code(&self) -> u8 {
        match self {
            Self::OpenWater => 11,
            Self::Developed => 21,
            Self::Barren => 31,
            Self::DeciduousForest => 41,
            Self::EvergreenForest => 42,
            Self::MixedForest => 43,
            Self::Grassland => 71,
            Self::Pasture => 81,
            Self::WoodyWetlands => 90,
        }
    }

    /// Decode an NLCD grid code, if it is one we carry.
    pub fn from_grid_code(code: u8) -> Option<Self> {
        match code {
            11 | 12 => Some(Self::OpenWater),
            21..=24 => Some(Self::Developed),
            31 => Some(Self::Barren),
            41 => Some(Self::DeciduousForest),
            42 => Some(Self::EvergreenForest),
            43 => Some(Self::MixedForest),
            71..=74 => Some(Self::Grassland),
            81 | 82 => Some(Self::Pasture),
            90 | 95 => Some(Self::WoodyWetlands),
            _ => None,
        }
    }

    /// Whether stands on this cover grow woody biomass. Growth, stocking,
    /// and harvest all skip cells that are not woody biomass.
    pub fn is_woody_biomass(&self) -> bool {
        matches!(
            self,
            Self::DeciduousForest | Self::EvergreenForest | Self::MixedForest | Self::WoodyWetlands
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenWater => "Open Water",
            Self::Developed => "Developed",
            Self::Barren => "Barren Land",
            Self::DeciduousForest => "Deciduous Forest",
            Self::EvergreenForest => "Evergreen Forest",
            Self::MixedForest => "Mixed Forest",
            Self::Grassland => "Grassland/Herbaceous",
            Self::Pasture => "Pasture/Hay",
            Self::WoodyWetlands => "Woody Wetlands",
        }
    }
}
