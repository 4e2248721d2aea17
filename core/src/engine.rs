//! The tick driver.
//!
//! One tick is one growing season. Phases run in a fixed order:
//!
//!   1. policy phase — each agent weighs the incentive program
//!   2. harvest phase — each agent accrues taxes and queues requests
//!   3. growth pass over the grid
//!   4. stocking pass, strictly after growth
//!   5. market drain against the harvest capacity
//!
//! Agents step sequentially in configuration order; only the grid
//! passes are parallel. Given the same config and seed, a run
//! produces byte-identical event logs on any machine and any worker
//! count.

use std::sync::Arc;

use crate::agent::{HarvestContext, ParcelAgent, PolicyContext};
use crate::config::SimConfig;
use crate::error::SimResult;
use crate::event::SimEvent;
use crate::executor::ParallelGridExecutor;
use crate::forest::{ForestGrid, Stand};
use crate::growth::EvenAgedGrowthModel;
use crate::market::HarvestMarket;
use crate::optimizer::HarvestTimingOptimizer;
use crate::rng::{SimStream, StreamBank, StreamSlot};
use crate::scorecard::Scorecard;
use crate::types::Tick;
use crate::vip::VipProgram;

pub struct SimEngine {
    config: SimConfig,
    seed: u64,
    tick: Tick,
    grid: ForestGrid,
    exec: ParallelGridExecutor,
    market: HarvestMarket,
    vip: Option<VipProgram>,
    agents: Vec<ParcelAgent>,
    optimizer: HarvestTimingOptimizer,
    agents_stream: SimStream,
    policy_stream: SimStream,
    scorecard: Scorecard,
}

impl SimEngine {
    /// Wire up a run. Fails fast on any configuration problem.
    pub fn new(config: SimConfig, seed: u64) -> SimResult<Self> {
        config.validate()?;

        let bank = StreamBank::new(seed);
        let mut growth_stream = bank.for_stream(StreamSlot::Growth);
        let mut agents_stream = bank.for_stream(StreamSlot::Agents);
        let policy_stream = bank.for_stream(StreamSlot::Policy);

        let model = Arc::new(EvenAgedGrowthModel::new(seed));
        let mut grid = ForestGrid::new(
            config.grid.width,
            config.grid.height,
            config.grid.pixel_edge,
            config.grid.land_cover_classes()?,
            model,
            &mut growth_stream,
        )?;

        let exec = match config.workers {
            Some(workers) => ParallelGridExecutor::new(workers)?,
            None => ParallelGridExecutor::with_available_parallelism()?,
        };

        // Seeded stands start with their stocking classified, the
        // same as after any growth pass.
        grid.recompute_stocking(&exec);

        let vip = config.vip_policy.map(VipProgram::new);

        // Each owner draws their time preference once, in config order.
        let agents = config
            .agents
            .iter()
            .map(|a| {
                ParcelAgent::new(
                    a.id,
                    a.kind,
                    a.parcel.clone(),
                    a.neighbors.clone(),
                    agents_stream.range(config.discount_rate_min, config.discount_rate_max),
                    a.harvest_odds,
                    a.willingness_to_join_vip,
                )
            })
            .collect();

        let optimizer = HarvestTimingOptimizer::new(config.npv_horizon);

        log::info!(
            "engine ready: seed {seed}, {} agents, capacity {}",
            config.agents.len(),
            config.harvest_capacity
        );

        Ok(Self {
            config,
            seed,
            tick: 0,
            grid,
            exec,
            market: HarvestMarket::new(),
            vip,
            agents,
            optimizer,
            agents_stream,
            policy_stream,
            scorecard: Scorecard::default(),
        })
    }

    pub fn current_tick(&self) -> Tick {
        self.tick
    }

    pub fn grid(&self) -> &ForestGrid {
        &self.grid
    }

    pub fn market(&self) -> &HarvestMarket {
        &self.market
    }

    pub fn vip(&self) -> Option<&VipProgram> {
        self.vip.as_ref()
    }

    pub fn agents(&self) -> &[ParcelAgent] {
        &self.agents
    }

    pub fn scorecard(&self) -> &Scorecard {
        &self.scorecard
    }

    /// Advance one growing season and return everything that happened.
    pub fn tick(&mut self) -> SimResult<Vec<SimEvent>> {
        let mut events = Vec::new();
        if self.tick == 0 {
            events.push(SimEvent::RunInitialized {
                seed: self.seed,
                width: self.grid.width(),
                height: self.grid.height(),
            });
        }

        self.tick += 1;
        let tick = self.tick;
        events.push(SimEvent::TickStarted { tick });

        self.policy_phase(tick, &mut events)?;
        self.harvest_phase(tick, &mut events);

        self.grid.grow(&self.exec);
        self.grid.recompute_stocking(&self.exec);

        let report = self.market.drain(self.config.harvest_capacity, &mut self.grid);

        let mut tick_stem = 0.0;
        let mut tick_total = 0.0;
        for receipt in &report.receipts {
            if let Some(agent) = self.agents.iter_mut().find(|a| a.id == receipt.agent) {
                agent.on_harvested(receipt);
            }
            tick_stem += receipt.stem_biomass;
            tick_total += receipt.total_biomass;
            events.push(SimEvent::ParcelHarvested {
                tick,
                agent: receipt.agent,
                stem_biomass: receipt.stem_biomass,
                total_biomass: receipt.total_biomass,
            });
        }
        for dropped in report.dropped {
            if let Some(agent) = self.agents.iter_mut().find(|a| a.id == dropped) {
                agent.on_dropped();
            }
            events.push(SimEvent::RequestDropped {
                tick,
                agent: dropped,
            });
        }

        self.scorecard = Scorecard {
            tick,
            harvest_demand: self.market.demand(),
            harvest_supplied: self.market.supplied(),
            tick_stem_biomass: tick_stem,
            tick_total_biomass: tick_total,
            cumulative_stem_biomass: self.market.cumulative_stem_biomass(),
            cumulative_total_biomass: self.market.cumulative_total_biomass(),
            vip_subscriptions: self.vip.as_ref().map_or(0, |v| v.subscription_count()),
            vip_enrolled_area: self.vip.as_ref().map_or(0.0, |v| v.enrolled_area()),
            standing_biomass: self.grid.total_biomass(),
        };

        events.push(SimEvent::TickCompleted {
            tick,
            demand: self.market.demand(),
            supplied: self.market.supplied(),
        });
        Ok(events)
    }

    /// Run `n` ticks and collect every event.
    pub fn run_ticks(&mut self, n: u64) -> SimResult<Vec<SimEvent>> {
        let mut events = Vec::new();
        for _ in 0..n {
            events.extend(self.tick()?);
        }
        Ok(events)
    }

    fn parcel_stands(&self, agent: usize) -> Vec<Stand> {
        self.agents[agent]
            .parcel()
            .iter()
            .map(|c| self.grid.stand(c.x, c.y))
            .collect()
    }

    fn policy_phase(&mut self, tick: Tick, events: &mut Vec<SimEvent>) -> SimResult<()> {
        let Some(vip) = self.vip.as_mut() else {
            return Ok(());
        };
        let acres_per_pixel = self.grid.acres_per_pixel();
        let model = Arc::clone(self.grid.growth_model());

        for idx in 0..self.agents.len() {
            let stands: Vec<Stand> = self.agents[idx]
                .parcel()
                .iter()
                .map(|c| self.grid.stand(c.x, c.y))
                .collect();
            let enrolled_neighbors = self.agents[idx]
                .neighbors()
                .iter()
                .filter(|id| vip.is_enrolled(**id))
                .count();

            let mut ctx = PolicyContext {
                tick,
                vip: &mut *vip,
                millage_rate: self.config.millage_rate,
                acres_per_pixel,
                enrolled_neighbors,
                model: model.as_ref(),
                optimizer: &self.optimizer,
                stream: &mut self.policy_stream,
            };
            if let Some(event) = self.agents[idx].policy_step(&stands, &mut ctx)? {
                events.push(event);
            }
        }
        Ok(())
    }

    fn harvest_phase(&mut self, tick: Tick, events: &mut Vec<SimEvent>) {
        let acres_per_pixel = self.grid.acres_per_pixel();
        let model = Arc::clone(self.grid.growth_model());

        for idx in 0..self.agents.len() {
            let stands = self.parcel_stands(idx);
            let enrolled_neighbors = match self.vip.as_ref() {
                Some(vip) => self.agents[idx]
                    .neighbors()
                    .iter()
                    .filter(|id| vip.is_enrolled(**id))
                    .count(),
                None => 0,
            };

            let mut ctx = HarvestContext {
                tick,
                market: &mut self.market,
                vip: self.vip.as_ref(),
                millage_rate: self.config.millage_rate,
                acres_per_pixel,
                enrolled_neighbors,
                model: model.as_ref(),
                optimizer: &self.optimizer,
                stream: &mut self.agents_stream,
            };
            events.extend(self.agents[idx].harvest_step(&stands, &mut ctx));
        }
    }
}
