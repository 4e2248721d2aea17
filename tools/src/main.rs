//! sim-runner: headless forest simulation runner.
//!
//! Usage:
//!   sim-runner --seed 12345 --ticks 100 --config run.json
//!   sim-runner --ticks 50 --events

use anyhow::Result;
use forestsim_core::{config::SimConfig, engine::SimEngine};
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let ticks = parse_arg(&args, "--ticks", 100u64);
    let emit_events = args.iter().any(|a| a == "--events");
    let config_path = args
        .windows(2)
        .find(|w| w[0] == "--config")
        .map(|w| w[1].as_str());

    let config = match config_path {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default_test(),
    };

    println!("forestsim — sim-runner");
    println!("  seed:    {seed}");
    println!("  ticks:   {ticks}");
    println!("  config:  {}", config_path.unwrap_or("<built-in test config>"));
    println!();

    let mut engine = SimEngine::new(config, seed)?;

    for _ in 0..ticks {
        let events = engine.tick()?;
        if emit_events {
            for event in &events {
                println!("{}", serde_json::to_string(event)?);
            }
        }
    }

    print_summary(&engine)?;
    Ok(())
}

fn print_summary(engine: &SimEngine) -> Result<()> {
    let scorecard = engine.scorecard();
    println!("── final scorecard ──");
    println!("{}", serde_json::to_string_pretty(scorecard)?);

    if let Some(vip) = engine.vip() {
        println!();
        println!(
            "incentive program: {} members, {:.1} acres enrolled",
            vip.subscription_count(),
            vip.enrolled_acres()
        );
    }
    Ok(())
}

fn parse_arg<T: std::str::FromStr>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
