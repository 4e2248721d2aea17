//! Non-industrial private forest landowner agents.
//!
//! Two owner archetypes drive land-use decisions. Economic owners
//! treat the parcel as an asset: they time harvests by net present
//! value and join the incentive program when the projected after-tax
//! profit says to. Ecosystem owners value the standing forest: they
//! only occasionally look into harvesting and join the program out of
//! conviction rather than arithmetic.
//!
//! Agents never touch the grid or the market state directly outside
//! the context handed to them for the phase; the engine owns both.

use serde::{Deserialize, Serialize};

use crate::economics::assess_taxes;
use crate::error::SimResult;
use crate::event::SimEvent;
use crate::forest::Stand;
use crate::growth::GrowthModel;
use crate::harvesting::{harvest_value, harvestable, SAWTIMBER_DBH};
use crate::market::{HarvestMarket, HarvestReceipt};
use crate::optimizer::HarvestTimingOptimizer;
use crate::rng::SimStream;
use crate::types::{AgentId, Coord, Tick, ACRE_IN_SQUARE_METERS};
use crate::vip::VipProgram;

/// Margin a harvest bid must clear over taxes before an ecosystem
/// owner will cut.
const ECOSYSTEM_PROFIT_MARGIN: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Economic,
    Ecosystem,
}

/// Everything an agent may see and touch during the policy phase.
pub struct PolicyContext<'a> {
    pub tick: Tick,
    pub vip: &'a mut VipProgram,
    pub millage_rate: f64,
    pub acres_per_pixel: f64,
    pub enrolled_neighbors: usize,
    pub model: &'a dyn GrowthModel,
    pub optimizer: &'a HarvestTimingOptimizer,
    pub stream: &'a mut SimStream,
}

/// Everything an agent may see and touch during the harvest phase.
pub struct HarvestContext<'a> {
    pub tick: Tick,
    pub market: &'a mut HarvestMarket,
    pub vip: Option<&'a VipProgram>,
    pub millage_rate: f64,
    pub acres_per_pixel: f64,
    pub enrolled_neighbors: usize,
    pub model: &'a dyn GrowthModel,
    pub optimizer: &'a HarvestTimingOptimizer,
    pub stream: &'a mut SimStream,
}

pub struct ParcelAgent {
    pub id: AgentId,
    pub kind: AgentKind,
    parcel: Vec<Coord>,
    neighbors: Vec<AgentId>,
    /// Personal time preference, drawn once at creation.
    discount_rate: f64,
    harvest_odds: f64,
    willingness_to_join_vip: f64,
    enrolled: bool,
    harvested_since_enrollment: bool,
    /// Taxes accrued since the last harvest.
    taxes_paid: f64,
    planned_harvest: Option<Tick>,
}

impl ParcelAgent {
    pub fn new(
        id: AgentId,
        kind: AgentKind,
        parcel: Vec<Coord>,
        neighbors: Vec<AgentId>,
        discount_rate: f64,
        harvest_odds: f64,
        willingness_to_join_vip: f64,
    ) -> Self {
        Self {
            id,
            kind,
            parcel,
            neighbors,
            discount_rate,
            harvest_odds,
            willingness_to_join_vip,
            enrolled: false,
            harvested_since_enrollment: false,
            taxes_paid: 0.0,
            planned_harvest: None,
        }
    }

    pub fn parcel(&self) -> &[Coord] {
        &self.parcel
    }

    pub fn neighbors(&self) -> &[AgentId] {
        &self.neighbors
    }

    pub fn is_enrolled(&self) -> bool {
        self.enrolled
    }

    pub fn planned_harvest(&self) -> Option<Tick> {
        self.planned_harvest
    }

    /// Whether the agent has harvested since joining the program.
    pub fn harvested_since_enrollment(&self) -> bool {
        self.harvested_since_enrollment
    }

    pub fn discount_rate(&self) -> f64 {
        self.discount_rate
    }

    fn parcel_area(&self, acres_per_pixel: f64) -> f64 {
        self.parcel.len() as f64 * acres_per_pixel * ACRE_IN_SQUARE_METERS
    }

    fn parcel_acres(&self, acres_per_pixel: f64) -> f64 {
        self.parcel.len() as f64 * acres_per_pixel
    }

    /// Consider joining the incentive program. Returns the enrollment
    /// event if the agent joined.
    pub fn policy_step(
        &mut self,
        stands: &[Stand],
        ctx: &mut PolicyContext,
    ) -> SimResult<Option<SimEvent>> {
        if self.enrolled {
            return Ok(None);
        }
        if self.parcel_acres(ctx.acres_per_pixel) < ctx.vip.minimum_acreage() {
            return Ok(None);
        }

        let join = match self.kind {
            AgentKind::Economic => self.weigh_program(stands, ctx),
            AgentKind::Ecosystem => {
                // The owner has to feel like dealing with it at all.
                ctx.stream.chance(self.harvest_odds)
                    && ctx.stream.chance(self.willingness_to_join_vip)
                    && self.program_saves_taxes(ctx)
            }
        };

        if !join {
            return Ok(None);
        }

        let area = self.parcel_area(ctx.acres_per_pixel);
        ctx.vip.enroll(self.id, area)?;
        self.enrolled = true;
        self.harvested_since_enrollment = false;
        log::info!("agent {} enrolled in the incentive program", self.id);
        Ok(Some(SimEvent::VipEnrolled {
            tick: ctx.tick,
            agent: self.id,
            area,
        }))
    }

    /// Does the program beat the owner's preferred harvest plan?
    /// Compares after-tax profit at the owner's sawtimber timing to
    /// the program's pulpwood timing under the reduced millage.
    fn weigh_program(&self, stands: &[Stand], ctx: &mut PolicyContext) -> bool {
        let preferred = self.project_profit(stands, SAWTIMBER_DBH, ctx.millage_rate, ctx);
        let reduced = ctx.millage_rate - ctx.vip.incentive(ctx.enrolled_neighbors);
        let program = self.project_profit(stands, ctx.vip.minimum_harvest_dbh(), reduced, ctx);
        program > preferred
    }

    fn project_profit(
        &self,
        stands: &[Stand],
        min_dbh: f64,
        millage: f64,
        ctx: &PolicyContext,
    ) -> f64 {
        let plan = ctx.optimizer.optimize(
            stands,
            ctx.model,
            ctx.acres_per_pixel,
            min_dbh,
            self.discount_rate,
        );
        let area = self.parcel_area(ctx.acres_per_pixel);
        let taxes = self.taxes_paid + assess_taxes(area, millage) * plan.offset as f64;
        plan.bid - taxes
    }

    fn program_saves_taxes(&self, ctx: &PolicyContext) -> bool {
        let area = self.parcel_area(ctx.acres_per_pixel);
        let current = assess_taxes(area, ctx.millage_rate);
        let reduced = ctx.millage_rate - ctx.vip.incentive(ctx.enrolled_neighbors);
        assess_taxes(area, reduced) < current
    }

    /// Accrue taxes and decide whether to queue a harvest request.
    pub fn harvest_step(&mut self, stands: &[Stand], ctx: &mut HarvestContext) -> Vec<SimEvent> {
        let mut events = Vec::new();
        let millage = self.effective_millage(ctx);
        let area = self.parcel_area(ctx.acres_per_pixel);
        self.taxes_paid += assess_taxes(area, millage);

        match self.kind {
            AgentKind::Economic => self.economic_harvest(stands, ctx, &mut events),
            AgentKind::Ecosystem => self.ecosystem_harvest(stands, ctx, millage, &mut events),
        }
        events
    }

    fn effective_millage(&self, ctx: &HarvestContext) -> f64 {
        match (self.enrolled, ctx.vip) {
            (true, Some(vip)) => ctx.millage_rate - vip.incentive(ctx.enrolled_neighbors),
            _ => ctx.millage_rate,
        }
    }

    fn harvest_dbh(&self, ctx: &HarvestContext) -> f64 {
        match (self.enrolled, ctx.vip) {
            (true, Some(vip)) => vip.minimum_harvest_dbh(),
            _ => SAWTIMBER_DBH,
        }
    }

    fn economic_harvest(
        &mut self,
        stands: &[Stand],
        ctx: &mut HarvestContext,
        events: &mut Vec<SimEvent>,
    ) {
        let min_dbh = self.harvest_dbh(ctx);

        if self.planned_harvest.is_none() {
            let plan = ctx.optimizer.optimize(
                stands,
                ctx.model,
                ctx.acres_per_pixel,
                min_dbh,
                self.discount_rate,
            );
            if plan.bid > 0.0 {
                let at = ctx.tick + plan.offset;
                self.planned_harvest = Some(at);
                events.push(SimEvent::HarvestScheduled {
                    tick: ctx.tick,
                    agent: self.id,
                    offset: plan.offset,
                    bid: plan.bid,
                });
            }
            // Nothing on the parcel is worth cutting within the
            // horizon; try again next season.
        }

        if let Some(at) = self.planned_harvest {
            if ctx.tick >= at {
                let qualifying = harvestable(stands, min_dbh);
                if qualifying.is_empty() {
                    // The stand fell behind the projection; replan.
                    self.planned_harvest = None;
                    return;
                }
                let coords: Vec<Coord> = qualifying.iter().map(|s| s.coord).collect();
                events.push(SimEvent::HarvestRequested {
                    tick: ctx.tick,
                    agent: self.id,
                    stands: coords.len(),
                });
                ctx.market.request_harvest(self.id, coords, None);
            }
        }
    }

    fn ecosystem_harvest(
        &mut self,
        stands: &[Stand],
        ctx: &mut HarvestContext,
        millage: f64,
        events: &mut Vec<SimEvent>,
    ) {
        let harvesting = if self.obliged_to_harvest(stands, ctx) {
            true
        } else if ctx.stream.chance(self.harvest_odds) && minimal_harvest_conditions(stands) {
            // Only cut when the bid clears taxes owed with some margin.
            let bid = harvest_value(&harvestable(stands, self.harvest_dbh(ctx)));
            let area = self.parcel_area(ctx.acres_per_pixel);
            let taxes = assess_taxes(area, millage);
            bid > taxes * (1.0 + ECOSYSTEM_PROFIT_MARGIN)
        } else {
            false
        };
        if !harvesting {
            return;
        }

        let coords: Vec<Coord> = stands.iter().map(|s| s.coord).collect();
        events.push(SimEvent::HarvestRequested {
            tick: ctx.tick,
            agent: self.id,
            stands: coords.len(),
        });
        ctx.market.request_harvest(self.id, coords, None);
    }

    /// The commitment side of enrollment: a member whose parcel has
    /// matured past the program threshold and who has not harvested
    /// since joining must cut this season, regardless of odds or
    /// profitability.
    fn obliged_to_harvest(&self, stands: &[Stand], ctx: &HarvestContext) -> bool {
        let Some(vip) = ctx.vip else {
            return false;
        };
        self.enrolled
            && !self.harvested_since_enrollment
            && average_stand_age(stands) >= vip.must_harvest_by_age()
    }

    /// The market served this agent's request.
    pub fn on_harvested(&mut self, receipt: &HarvestReceipt) {
        debug_assert_eq!(receipt.agent, self.id);
        self.harvested_since_enrollment = self.enrolled;
        self.planned_harvest = None;
        self.taxes_paid = 0.0;
    }

    /// The market dropped this agent's request for capacity; the
    /// plan stays live so the agent asks again next season.
    pub fn on_dropped(&mut self) {
        log::debug!("agent {} harvest request dropped", self.id);
    }
}

/// Whole-parcel gate before an ecosystem owner considers cutting:
/// fully stocked on average and carrying sawtimber.
pub fn minimal_harvest_conditions(stands: &[Stand]) -> bool {
    if stands.is_empty() {
        return false;
    }
    let size = stands.len() as f64;
    let avg_stocking: f64 = stands.iter().map(|s| s.stocking.code() as f64).sum::<f64>() / size;
    let avg_dbh: f64 = stands.iter().map(|s| s.dbh).sum::<f64>() / size;
    avg_stocking > 3.0 && avg_dbh > SAWTIMBER_DBH
}

/// Mean stand age across a parcel, in growing seasons.
fn average_stand_age(stands: &[Stand]) -> f64 {
    if stands.is_empty() {
        return 0.0;
    }
    stands.iter().map(|s| s.age as f64).sum::<f64>() / stands.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::growth::EvenAgedGrowthModel;
    use crate::landcover::LandCoverClass;
    use crate::species::Species;
    use crate::stocking::StockingCondition;
    use crate::vip::{VipPolicy, VipProgram};

    fn stand(dbh: f64, stocking: StockingCondition) -> Stand {
        Stand {
            coord: Coord::new(0, 0),
            land_cover: LandCoverClass::DeciduousForest,
            species: Species::RedMaple,
            dbh,
            tree_count: 150,
            age: 60,
            stocking,
        }
    }

    /// An ecosystem owner who never volunteers a harvest.
    fn reluctant_member() -> ParcelAgent {
        let mut agent = ParcelAgent::new(
            1,
            AgentKind::Ecosystem,
            vec![Coord::new(0, 0)],
            vec![],
            0.05,
            0.0,
            0.0,
        );
        agent.enrolled = true;
        agent
    }

    #[test]
    fn minimal_conditions_need_stocking_and_size() {
        let good = vec![stand(40.0, StockingCondition::Overstocked)];
        assert!(minimal_harvest_conditions(&good));

        let small = vec![stand(30.0, StockingCondition::Overstocked)];
        assert!(!minimal_harvest_conditions(&small));

        let thin = vec![stand(40.0, StockingCondition::Moderate)];
        assert!(!minimal_harvest_conditions(&thin));

        assert!(!minimal_harvest_conditions(&[]));
    }

    #[test]
    fn members_are_compelled_to_harvest_once_the_parcel_matures() {
        let vip = VipProgram::new(VipPolicy::FlatDiscount { mills: 15.0 });
        let model = EvenAgedGrowthModel::new(3);
        let optimizer = HarvestTimingOptimizer::default();
        let mut market = HarvestMarket::new();
        let mut stream = SimStream::new(3, 9);

        let mut agent = reluctant_member();
        // Sixty seasons old, past the forty-season obligation; too
        // thin and too small to clear the voluntary gates.
        let stands = vec![stand(30.0, StockingCondition::Moderate)];

        let mut ctx = HarvestContext {
            tick: 5,
            market: &mut market,
            vip: Some(&vip),
            millage_rate: 35.0,
            acres_per_pixel: 10.0,
            enrolled_neighbors: 0,
            model: &model,
            optimizer: &optimizer,
            stream: &mut stream,
        };
        let events = agent.harvest_step(&stands, &mut ctx);

        assert!(events
            .iter()
            .any(|e| matches!(e, SimEvent::HarvestRequested { agent: 1, .. })));
        assert_eq!(market.pending(), 1);
    }

    #[test]
    fn young_member_parcels_are_not_compelled() {
        let vip = VipProgram::new(VipPolicy::FlatDiscount { mills: 15.0 });
        let model = EvenAgedGrowthModel::new(3);
        let optimizer = HarvestTimingOptimizer::default();
        let mut market = HarvestMarket::new();
        let mut stream = SimStream::new(3, 9);

        let mut agent = reluctant_member();
        let mut young = stand(10.0, StockingCondition::Moderate);
        young.age = 15;

        let mut ctx = HarvestContext {
            tick: 5,
            market: &mut market,
            vip: Some(&vip),
            millage_rate: 35.0,
            acres_per_pixel: 10.0,
            enrolled_neighbors: 0,
            model: &model,
            optimizer: &optimizer,
            stream: &mut stream,
        };
        let events = agent.harvest_step(&[young], &mut ctx);

        assert!(events.is_empty());
        assert_eq!(market.pending(), 0);
    }

    #[test]
    fn a_receipt_discharges_the_member_obligation() {
        let vip = VipProgram::new(VipPolicy::FlatDiscount { mills: 15.0 });
        let model = EvenAgedGrowthModel::new(3);
        let optimizer = HarvestTimingOptimizer::default();
        let mut market = HarvestMarket::new();
        let mut stream = SimStream::new(3, 9);

        let mut agent = reluctant_member();
        agent.on_harvested(&HarvestReceipt {
            agent: 1,
            stem_biomass: 10.0,
            total_biomass: 25.0,
        });
        assert!(agent.harvested_since_enrollment());

        let stands = vec![stand(30.0, StockingCondition::Moderate)];
        let mut ctx = HarvestContext {
            tick: 9,
            market: &mut market,
            vip: Some(&vip),
            millage_rate: 35.0,
            acres_per_pixel: 10.0,
            enrolled_neighbors: 0,
            model: &model,
            optimizer: &optimizer,
            stream: &mut stream,
        };
        let events = agent.harvest_step(&stands, &mut ctx);

        assert!(events.is_empty());
        assert_eq!(market.pending(), 0);
    }
}
