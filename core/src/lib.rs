//! forestsim-core — a deterministic forest land-use simulation engine.
//!
//! The engine models a gridded forest growing season by season,
//! landowner agents deciding when to harvest and whether to join a
//! tax-incentive program, and a capacity-constrained harvest market
//! that turns requests into removed biomass.
//!
//! Everything is driven from [`engine::SimEngine`]: build one from a
//! [`config::SimConfig`] and a master seed, call `tick()`, and read
//! the returned events and the polled [`scorecard::Scorecard`].

pub mod agent;
pub mod config;
pub mod economics;
pub mod engine;
pub mod error;
pub mod event;
pub mod executor;
pub mod forest;
pub mod growth;
pub mod harvesting;
pub mod landcover;
pub mod market;
pub mod optimizer;
pub mod rng;
pub mod scorecard;
pub mod species;
pub mod stocking;
pub mod types;
pub mod vip;
