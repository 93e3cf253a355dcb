mod config;
mod report;

use crate::config::cli::{CliOpt, Command, DelayOpt, SearchOpt};
use anyhow::bail;
use clap::Parser;
use tas_engine::env::{EnvConfig, ScenarioSelection, ScheduleSearchEnvironment};
use tas_engine::network::Topology;
use tas_engine::policy::{self, BuiltinPolicy};
use tas_engine::simulator::DelaySimulation;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let options = CliOpt::parse();
    match options.command {
        Command::Delay(delay) => run_delay(&delay),
        Command::Search(search) => run_search(&search),
    }
}

fn run_delay(options: &DelayOpt) -> anyhow::Result<()> {
    println!("--- Params ---");
    println!("* Network path: {}", options.network.display());

    let config = config::load_network_config(&options.network)?;
    let topology = Topology::new(config.network)?;

    let simulation = DelaySimulation::new(&topology, config.simulator);
    let report = simulation.run(&config.flows);
    report::print_delay_report(&report);
    Ok(())
}

fn run_search(options: &SearchOpt) -> anyhow::Result<()> {
    println!("--- Params ---");
    println!("* Policy: {}", options.policy);
    for path in &options.scenario {
        println!("* Scenario path: {}", path.display());
    }

    let topology = match &options.network {
        Some(path) => Topology::new(config::load_network_config(path)?.network)?,
        None => Topology::zonal(options.zones),
    };

    let scenarios = config::scenario::load_scenarios(&options.scenario)?;
    let selection = match options.seed {
        Some(seed) => ScenarioSelection::Seeded(seed),
        None => ScenarioSelection::Fixed(options.scenario_index),
    };
    let env_config = EnvConfig {
        max_flows: options.max_flows,
        num_queues: options.num_queues,
        max_segments: options.max_segments,
        alpha: options.alpha,
        selection,
        ..EnvConfig::default()
    };

    let mut env = ScheduleSearchEnvironment::new(&topology, scenarios, env_config)?;
    let Some(mut driving_policy) = BuiltinPolicy::from_name(&options.policy, options.num_queues)
    else {
        bail!(
            "unknown policy `{}` (available: {})",
            options.policy,
            BuiltinPolicy::names().join(", ")
        );
    };

    let outcome = policy::run_episode(&mut env, &mut driving_policy);
    report::print_search_report(&outcome.metrics, outcome.total_reward, outcome.actions.len());

    let schedule = outcome.encode_schedule(
        options.num_queues,
        options.schedule_node.as_str().into(),
        options.schedule_port,
    );
    report::print_schedule(&schedule);
    if let Some(path) = &options.schedule_out {
        report::write_schedule_json(&schedule, path)?;
    }
    Ok(())
}
