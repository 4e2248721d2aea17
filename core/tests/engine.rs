//! End-to-end engine behavior over the public API.

use forestsim_core::{
    config::{AgentConfig, SimConfig},
    agent::AgentKind,
    engine::SimEngine,
    error::SimError,
    event::SimEvent,
    species::Species,
    types::Coord,
    vip::VipPolicy,
};

#[test]
fn bad_config_fails_fast() {
    let mut config = SimConfig::default_test();
    config.grid.width = 0;
    assert!(matches!(
        SimEngine::new(config, 1),
        Err(SimError::Configuration(_))
    ));
}

#[test]
fn ticks_advance_and_report() {
    let mut engine = SimEngine::new(SimConfig::default_test(), 42).expect("engine");
    let events = engine.run_ticks(10).expect("run");

    assert_eq!(engine.current_tick(), 10);
    let started = events
        .iter()
        .filter(|e| matches!(e, SimEvent::TickStarted { .. }))
        .count();
    let completed = events
        .iter()
        .filter(|e| matches!(e, SimEvent::TickCompleted { .. }))
        .count();
    assert_eq!(started, 10);
    assert_eq!(completed, 10);

    let scorecard = engine.scorecard();
    assert_eq!(scorecard.tick, 10);
    assert!(scorecard.standing_biomass > 0.0);
    assert!(scorecard.harvest_supplied <= scorecard.harvest_demand);
}

#[test]
fn stand_invariants_hold_over_a_long_run() {
    let mut engine = SimEngine::new(SimConfig::default_test(), 7).expect("engine");
    engine.run_ticks(60).expect("run");

    let grid = engine.grid();
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let stand = grid.stand(x, y);
            assert!(stand.dbh >= 0.0);
            assert!(stand.dbh <= stand.species.max_dbh() + 1e-9);
        }
    }
}

#[test]
fn vip_aggregates_match_the_enrolled_agents() {
    let mut config = SimConfig::default_test();
    // Ecosystem agents that always look into the program.
    for agent in config.agents.iter_mut() {
        agent.kind = AgentKind::Ecosystem;
        agent.harvest_odds = 1.0;
        agent.willingness_to_join_vip = 1.0;
    }
    let mut engine = SimEngine::new(config, 13).expect("engine");
    engine.run_ticks(5).expect("run");

    let vip = engine.vip().expect("program configured");
    let enrolled = engine.agents().iter().filter(|a| a.is_enrolled()).count();
    assert_eq!(vip.subscription_count(), enrolled);
    // A flat discount always saves taxes, so everyone joins.
    assert_eq!(enrolled, engine.agents().len());
    assert!(vip.enrolled_area() > 0.0);
}

#[test]
fn no_program_means_no_policy_events() {
    let mut config = SimConfig::default_test();
    config.vip_policy = None;
    let mut engine = SimEngine::new(config, 99).expect("engine");
    let events = engine.run_ticks(10).expect("run");

    assert!(engine.vip().is_none());
    assert!(!events
        .iter()
        .any(|e| matches!(e, SimEvent::VipEnrolled { .. })));
    assert_eq!(engine.scorecard().vip_subscriptions, 0);
}

#[test]
fn scheduled_harvests_eventually_reach_the_market() {
    // One economic agent on a three-cell parcel. Over a long run the
    // stands mature past sawtimber size and a plan gets scheduled.
    let config = SimConfig {
        agents: vec![AgentConfig {
            id: 1,
            kind: AgentKind::Economic,
            parcel: vec![Coord::new(0, 0), Coord::new(1, 0), Coord::new(2, 0)],
            neighbors: vec![],
            harvest_odds: 0.0,
            willingness_to_join_vip: 0.0,
        }],
        vip_policy: Some(VipPolicy::FlatDiscount { mills: 15.0 }),
        ..SimConfig::default_test()
    };
    let mut engine = SimEngine::new(config, 3).expect("engine");
    let events = engine.run_ticks(120).expect("run");

    let scheduled = events
        .iter()
        .any(|e| matches!(e, SimEvent::HarvestScheduled { agent: 1, .. }));
    assert!(scheduled, "a mature parcel should be worth scheduling");

    if events
        .iter()
        .any(|e| matches!(e, SimEvent::HarvestRequested { .. }))
    {
        // A served request resets the stands and shows up in the
        // cumulative accruals.
        assert!(engine.market().cumulative_total_biomass() > 0.0);
    }
}

#[test]
fn capacity_drops_are_reported() {
    // Five eager ecosystem owners, capacity one.
    let mut agents = Vec::new();
    for id in 1..=5u32 {
        agents.push(AgentConfig {
            id,
            kind: AgentKind::Ecosystem,
            parcel: vec![Coord::new(id as usize - 1, 2)],
            neighbors: vec![],
            harvest_odds: 1.0,
            willingness_to_join_vip: 0.0,
        });
    }
    let config = SimConfig {
        agents,
        harvest_capacity: 1,
        vip_policy: None,
        ..SimConfig::default_test()
    };
    let mut engine = SimEngine::new(config, 21).expect("engine");
    let events = engine.run_ticks(80).expect("run");

    let requested = events
        .iter()
        .filter(|e| matches!(e, SimEvent::HarvestRequested { .. }))
        .count();
    let harvested = events
        .iter()
        .filter(|e| matches!(e, SimEvent::ParcelHarvested { .. }))
        .count();
    let dropped = events
        .iter()
        .filter(|e| matches!(e, SimEvent::RequestDropped { .. }))
        .count();
    assert_eq!(requested, harvested + dropped);
}

#[test]
fn red_maple_dominates_the_default_cover() {
    let engine = SimEngine::new(SimConfig::default_test(), 11).expect("engine");
    let grid = engine.grid();
    let stand = grid.stand(0, 0);
    assert_eq!(stand.species, Species::RedMaple);
}
