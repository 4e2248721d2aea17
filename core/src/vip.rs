//! Voluntary incentive program for forest landowners.
//!
//! Enrolled owners trade a commitment to active management (a lower
//! minimum harvest DBH, and an obligation to harvest once the parcel
//! matures) for a property-tax millage reduction. Two
//! incentive designs are modeled: a flat discount, and an
//! agglomeration bonus that pays extra mills per enrolled neighbor to
//! encourage contiguous managed blocks.
//!
//! RULE: Enrollment bookkeeping is loud. Double enrollment and
//! unenrollment of a non-member are errors returned to the caller,
//! never silently absorbed; the aggregates must always equal the sum
//! over the enrolled set.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::harvesting::PULPWOOD_DBH;
use crate::types::{AgentId, ACRE_IN_SQUARE_METERS};

/// Minimum parcel size to qualify for the program, in acres.
pub const BASE_ACREAGE: f64 = 10.0;

/// Average stand age past which a member is obliged to harvest.
pub const MUST_HARVEST_BY_AGE: f64 = 40.0;

/// Millage reduction design, selected at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum VipPolicy {
    /// A flat reduction for every member.
    FlatDiscount { mills: f64 },
    /// A base reduction plus a bonus per enrolled neighbor.
    Agglomeration { mills: f64, bonus_per_neighbor: f64 },
}

pub struct VipProgram {
    policy: VipPolicy,
    /// Enrolled agents and the area they enrolled with, square meters.
    enrolled: HashMap<AgentId, f64>,
    enrolled_area: f64,
}

impl VipProgram {
    pub fn new(policy: VipPolicy) -> Self {
        Self {
            policy,
            enrolled: HashMap::new(),
            enrolled_area: 0.0,
        }
    }

    pub fn policy(&self) -> VipPolicy {
        self.policy
    }

    /// Enroll an agent with the given parcel area, in square meters.
    pub fn enroll(&mut self, agent: AgentId, area: f64) -> SimResult<()> {
        if self.enrolled.contains_key(&agent) {
            return Err(SimError::AlreadyEnrolled { agent });
        }
        self.enrolled.insert(agent, area);
        self.enrolled_area += area;
        log::debug!("agent {agent} enrolled {area:.0} sq m");
        Ok(())
    }

    /// Remove an agent from the program, releasing the area recorded
    /// at enrollment time.
    pub fn unenroll(&mut self, agent: AgentId) -> SimResult<()> {
        match self.enrolled.remove(&agent) {
            Some(area) => {
                self.enrolled_area = (self.enrolled_area - area).max(0.0);
                log::debug!("agent {agent} unenrolled {area:.0} sq m");
                Ok(())
            }
            None => Err(SimError::NotEnrolled { agent }),
        }
    }

    pub fn is_enrolled(&self, agent: AgentId) -> bool {
        self.enrolled.contains_key(&agent)
    }

    /// Millage rate reduction for an agent with the given number of
    /// enrolled neighbors. The agglomeration design pays the flat
    /// mills when the agent has no neighbors at all.
    pub fn incentive(&self, enrolled_neighbors: usize) -> f64 {
        match self.policy {
            VipPolicy::FlatDiscount { mills } => mills,
            VipPolicy::Agglomeration {
                mills,
                bonus_per_neighbor,
            } => mills + enrolled_neighbors as f64 * bonus_per_neighbor,
        }
    }

    /// Minimum parcel size to qualify, in acres.
    pub fn minimum_acreage(&self) -> f64 {
        BASE_ACREAGE
    }

    /// Members commit to harvesting once stands reach pulpwood size.
    pub fn minimum_harvest_dbh(&self) -> f64 {
        PULPWOOD_DBH
    }

    /// The commitment side of the program: a member whose parcel
    /// averages this age or older must harvest.
    pub fn must_harvest_by_age(&self) -> f64 {
        MUST_HARVEST_BY_AGE
    }

    pub fn subscription_count(&self) -> usize {
        self.enrolled.len()
    }

    /// Total enrolled area in square meters. Never negative.
    pub fn enrolled_area(&self) -> f64 {
        self.enrolled_area
    }

    /// Total enrolled area in acres.
    pub fn enrolled_acres(&self) -> f64 {
        self.enrolled_area / ACRE_IN_SQUARE_METERS
    }

    /// Clear all enrollment state for a fresh run.
    pub fn reset(&mut self) {
        self.enrolled.clear();
        self.enrolled_area = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enrollment_tracks_count_and_area() {
        let mut vip = VipProgram::new(VipPolicy::FlatDiscount { mills: 15.0 });
        vip.enroll(1, 50_000.0).unwrap();
        vip.enroll(2, 30_000.0).unwrap();
        assert_eq!(vip.subscription_count(), 2);
        assert_eq!(vip.enrolled_area(), 80_000.0);

        vip.unenroll(1).unwrap();
        assert_eq!(vip.subscription_count(), 1);
        assert_eq!(vip.enrolled_area(), 30_000.0);
    }

    #[test]
    fn double_enrollment_is_rejected() {
        let mut vip = VipProgram::new(VipPolicy::FlatDiscount { mills: 15.0 });
        vip.enroll(1, 50_000.0).unwrap();
        assert!(matches!(
            vip.enroll(1, 50_000.0),
            Err(SimError::AlreadyEnrolled { agent: 1 })
        ));
        // The failed call must not disturb the aggregates.
        assert_eq!(vip.subscription_count(), 1);
        assert_eq!(vip.enrolled_area(), 50_000.0);
    }

    #[test]
    fn unknown_unenrollment_is_rejected() {
        let mut vip = VipProgram::new(VipPolicy::FlatDiscount { mills: 15.0 });
        assert!(matches!(
            vip.unenroll(9),
            Err(SimError::NotEnrolled { agent: 9 })
        ));
        assert_eq!(vip.enrolled_area(), 0.0);
    }

    #[test]
    fn agglomeration_pays_per_enrolled_neighbor() {
        let vip = VipProgram::new(VipPolicy::Agglomeration {
            mills: 15.0,
            bonus_per_neighbor: 1.0,
        });
        assert_eq!(vip.incentive(0), 15.0);
        assert_eq!(vip.incentive(3), 18.0);
    }

    #[test]
    fn reset_clears_everything() {
        let mut vip = VipProgram::new(VipPolicy::FlatDiscount { mills: 15.0 });
        vip.enroll(1, 50_000.0).unwrap();
        vip.reset();
        assert_eq!(vip.subscription_count(), 0);
        assert_eq!(vip.enrolled_area(), 0.0);
        assert!(!vip.is_enrolled(1));
    }
}
