//! Stand stocking classification.
//!
//! RULE: The stocking ratio is a pure function of the stand and the
//! stocking guide. Only the stocking pass writes a stand's condition;
//! growth and harvest never touch it directly.
//!
//! The ratio compares the stand's basal area per acre against the
//! fully-stocked ideal from the guide: scan the guide in order and use
//! the entry just below the first break the mean DBH falls under, or
//! the last entry when the DBH is past every break.

use serde::{Deserialize, Serialize};

/// Percent-stocking condition classes, USFS FIA coding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockingCondition {
    Nonstocked,
    Poor,
    Moderate,
    Full,
    Overstocked,
}

impl StockingCondition {
    pub fn code(&self) -> u8 {
        match self {
            Self::Nonstocked => 0,
            Self::Poor => 1,
            Self::Moderate => 2,
            Self::Full => 3,
            Self::Overstocked => 4,
        }
    }

    /// Classify a percent-stocking ratio. Boundaries are exclusive:
    /// a ratio of exactly 100.0 is Moderate, not Full.
    pub fn classify(ratio: f64) -> Self {
        if ratio > 130.0 {
            Self::Overstocked
        } else if ratio > 100.0 {
            Self::Full
        } else if ratio > 60.0 {
            Self::Moderate
        } else if ratio > 10.0 {
            Self::Poor
        } else {
            Self::Nonstocked
        }
    }
}

/// One row of a species stocking guide, ordered by ascending DBH break.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StockingGuideEntry {
    /// Mean stand DBH break, in cm.
    pub dbh_break: f64,
    /// Fully-stocked basal area, in square meters per acre.
    pub ideal_basal_area: f64,
    /// Fully-stocked tree count, per acre.
    pub ideal_trees_per_acre: f64,
}

/// Basal area of a single tree with the given mean DBH, in square meters.
pub fn basal_area(dbh: f64) -> f64 {
    0.00007854 * dbh * dbh
}

/// Fully-stocked basal area per acre for the given mean DBH.
///
/// Scans for the first break the DBH is under and uses the previous
/// entry (or the first when the DBH is under every break); falls
/// through to the last entry for stands past the end of the guide.
pub fn ideal_basal_area(guide: &[StockingGuideEntry], dbh: f64) -> f64 {
    for (ndx, entry) in guide.iter().enumerate() {
        if dbh < entry.dbh_break {
            let ideal = if ndx > 0 { &guide[ndx - 1] } else { &guide[0] };
            return ideal.ideal_basal_area;
        }
    }
    guide[guide.len() - 1].ideal_basal_area
}

/// Percent stocking of a stand: 100 times the ratio of the stand's
/// basal area per acre to the fully-stocked ideal.
pub fn stocking_ratio(
    guide: &[StockingGuideEntry],
    dbh: f64,
    tree_count: f64,
    acres_per_pixel: f64,
) -> f64 {
    let trees_per_acre = tree_count / acres_per_pixel;
    let actual = basal_area(dbh) * trees_per_acre;
    100.0 * (actual / ideal_basal_area(guide, dbh))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guide() -> Vec<StockingGuideEntry> {
        vec![
            StockingGuideEntry {
                dbh_break: 10.0,
                ideal_basal_area: 4.0,
                ideal_trees_per_acre: 700.0,
            },
            StockingGuideEntry {
                dbh_break: 20.0,
                ideal_basal_area: 8.0,
                ideal_trees_per_acre: 300.0,
            },
            StockingGuideEntry {
                dbh_break: 30.0,
                ideal_basal_area: 10.0,
                ideal_trees_per_acre: 150.0,
            },
        ]
    }

    #[test]
    fn classification_boundaries_are_exclusive() {
        assert_eq!(StockingCondition::classify(131.0), StockingCondition::Overstocked);
        assert_eq!(StockingCondition::classify(130.0), StockingCondition::Full);
        assert_eq!(StockingCondition::classify(100.0), StockingCondition::Moderate);
        assert_eq!(StockingCondition::classify(60.0), StockingCondition::Poor);
        assert_eq!(StockingCondition::classify(10.0), StockingCondition::Nonstocked);
        assert_eq!(StockingCondition::classify(0.0), StockingCondition::Nonstocked);
    }

    #[test]
    fn conditions_order_from_nonstocked_to_overstocked() {
        assert!(StockingCondition::Nonstocked < StockingCondition::Poor);
        assert!(StockingCondition::Full < StockingCondition::Overstocked);
        assert_eq!(StockingCondition::Overstocked.code(), 4);
    }

    #[test]
    fn guide_scan_uses_previous_entry() {
        // Under the first break: first entry.
        assert_eq!(ideal_basal_area(&guide(), 5.0), 4.0);
        // Between the first and second break: first entry.
        assert_eq!(ideal_basal_area(&guide(), 15.0), 4.0);
        // Between the second and third break: second entry.
        assert_eq!(ideal_basal_area(&guide(), 25.0), 8.0);
        // Past every break: last entry.
        assert_eq!(ideal_basal_area(&guide(), 50.0), 10.0);
    }

    #[test]
    fn ratio_scales_with_tree_count() {
        let g = guide();
        let sparse = stocking_ratio(&g, 25.0, 100.0, 1.0);
        let dense = stocking_ratio(&g, 25.0, 200.0, 1.0);
        assert!((dense - 2.0 * sparse).abs() < 1e-9);
    }

    #[test]
    fn ratio_matches_hand_computation() {
        // dbh 25, 180 trees on a 1-acre pixel, ideal 8.0 m^2/ac.
        let expected = 100.0 * (0.00007854 * 625.0 * 180.0) / 8.0;
        let actual = stocking_ratio(&guide(), 25.0, 180.0, 1.0);
        assert!((actual - expected).abs() < 1e-9);
    }
}
