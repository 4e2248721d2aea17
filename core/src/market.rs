//! The aggregate harvest market.
//!
//! Landowner agents do not cut their own timber; they queue requests
//! with the market, which processes them against a per-tick capacity
//! that models the loggers available in the region.
//!
//! RULE: Requests are served strictly first-come first-served. A
//! drain processes at most `capacity` requests in queue order and
//! drops the rest; the queue is always empty after a drain. Dropped
//! demand still counts toward the demand figure for the tick.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::economics::green_tons;
use crate::forest::{ForestGrid, Harvest, ThinningPlan};
use crate::types::{AgentId, ConsumerId, Coord};

/// Anything that accepts delivered biomass, mills and biorefineries
/// for instance. Deliveries are in green tons.
pub trait BiomassConsumer {
    fn receive(&mut self, green_tons: f64);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarvestKind {
    /// Clear-cut the listed stands.
    Clear(Vec<Coord>),
    /// Remove a fraction of the trees from each listed stand.
    Thin(Vec<ThinningPlan>),
}

#[derive(Debug, Clone)]
pub struct HarvestRequest {
    pub agent: AgentId,
    pub kind: HarvestKind,
    pub deliver_to: Option<ConsumerId>,
    /// Position in the queue for the tick, assigned by the market.
    pub queue_order: usize,
}

/// The outcome of one served request, routed back to the agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HarvestReceipt {
    pub agent: AgentId,
    /// Kg dry weight of stem wood removed.
    pub stem_biomass: f64,
    /// Kg dry weight removed in total.
    pub total_biomass: f64,
}

/// What a drain did: receipts for served requests, in queue order,
/// and the agents whose requests were dropped for capacity.
#[derive(Debug, Clone, Default)]
pub struct DrainReport {
    pub receipts: Vec<HarvestReceipt>,
    pub dropped: Vec<AgentId>,
}

#[derive(Default)]
pub struct HarvestMarket {
    requests: Vec<HarvestRequest>,
    consumers: HashMap<ConsumerId, Box<dyn BiomassConsumer + Send>>,
    next_consumer: ConsumerId,
    demand: usize,
    supplied: usize,
    cumulative_stem_biomass: f64,
    cumulative_total_biomass: f64,
}

impl HarvestMarket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a biomass consumer and hand back its delivery id.
    pub fn register_consumer(&mut self, consumer: Box<dyn BiomassConsumer + Send>) -> ConsumerId {
        let id = self.next_consumer;
        self.next_consumer += 1;
        self.consumers.insert(id, consumer);
        id
    }

    /// Queue a clear-cut request for the next drain.
    pub fn request_harvest(
        &mut self,
        agent: AgentId,
        stands: Vec<Coord>,
        deliver_to: Option<ConsumerId>,
    ) {
        let queue_order = self.requests.len();
        self.requests.push(HarvestRequest {
            agent,
            kind: HarvestKind::Clear(stands),
            deliver_to,
            queue_order,
        });
    }

    /// Queue a thinning request for the next drain.
    pub fn request_thinning(
        &mut self,
        agent: AgentId,
        plans: Vec<ThinningPlan>,
        deliver_to: Option<ConsumerId>,
    ) {
        let queue_order = self.requests.len();
        self.requests.push(HarvestRequest {
            agent,
            kind: HarvestKind::Thin(plans),
            deliver_to,
            queue_order,
        });
    }

    /// Number of requests waiting for the next drain.
    pub fn pending(&self) -> usize {
        self.requests.len()
    }

    /// Serve up to `capacity` queued requests against the grid and
    /// drop the rest. Returns one receipt per served request, in
    /// queue order, plus the dropped agents.
    pub fn drain(&mut self, capacity: usize, grid: &mut ForestGrid) -> DrainReport {
        let requests = std::mem::take(&mut self.requests);
        self.demand = requests.len();
        self.supplied = 0;

        let mut report = DrainReport::default();
        for request in requests {
            if self.supplied >= capacity {
                log::info!(
                    "harvest capacity {capacity} exhausted, dropping request from agent {}",
                    request.agent
                );
                report.dropped.push(request.agent);
                continue;
            }

            let removed: Harvest = match &request.kind {
                HarvestKind::Clear(stands) => grid.harvest(stands),
                HarvestKind::Thin(plans) => grid.thin(plans),
            };

            if let Some(id) = request.deliver_to {
                if let Some(consumer) = self.consumers.get_mut(&id) {
                    consumer.receive(green_tons(removed.total_biomass));
                } else {
                    log::warn!("agent {} addressed unknown consumer {id}", request.agent);
                }
            }

            self.cumulative_stem_biomass += removed.stem_biomass;
            self.cumulative_total_biomass += removed.total_biomass;
            self.supplied += 1;

            report.receipts.push(HarvestReceipt {
                agent: request.agent,
                stem_biomass: removed.stem_biomass,
                total_biomass: removed.total_biomass,
            });
        }
        report
    }

    /// Requests queued at the last drain, served or not.
    pub fn demand(&self) -> usize {
        self.demand
    }

    /// Requests actually served at the last drain.
    pub fn supplied(&self) -> usize {
        self.supplied
    }

    /// Kg dry weight of stem wood removed across the whole run.
    pub fn cumulative_stem_biomass(&self) -> f64 {
        self.cumulative_stem_biomass
    }

    /// Kg dry weight removed in total across the whole run.
    pub fn cumulative_total_biomass(&self) -> f64 {
        self.cumulative_total_biomass
    }
}
