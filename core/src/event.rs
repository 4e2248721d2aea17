//! The tick event log.
//!
//! Every externally observable thing that happens during a tick is
//! recorded as an event and returned to the caller. Consumers that
//! want structured telemetry serialize the events; nothing inside
//! the engine reads them back.

use crate::types::{AgentId, Tick};
use serde::{Deserialize, Serialize};

/// Every event emitted during simulation.
/// Variants are only ever appended — never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    // ── Engine events ──────────────────────────────
    RunInitialized {
        seed: u64,
        width: usize,
        height: usize,
    },
    TickStarted {
        tick: Tick,
    },
    TickCompleted {
        tick: Tick,
        demand: usize,
        supplied: usize,
    },

    // ── Policy events ──────────────────────────────
    VipEnrolled {
        tick: Tick,
        agent: AgentId,
        area: f64,
    },

    // ── Harvest events ─────────────────────────────
    HarvestScheduled {
        tick: Tick,
        agent: AgentId,
        offset: Tick,
        bid: f64,
    },
    HarvestRequested {
        tick: Tick,
        agent: AgentId,
        stands: usize,
    },
    ParcelHarvested {
        tick: Tick,
        agent: AgentId,
        stem_biomass: f64,
        total_biomass: f64,
    },
    RequestDropped {
        tick: Tick,
        agent: AgentId,
    },
}
