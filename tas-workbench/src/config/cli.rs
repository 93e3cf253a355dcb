use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
pub struct CliOpt {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Replay a fixed gate schedule and report per-flow delay distributions
    Delay(DelayOpt),
    /// Search for a gate schedule with a decision policy and report metrics
    Search(SearchOpt),
}

#[derive(Parser, Debug, Clone)]
pub struct DelayOpt {
    /// Path to the JSON file containing the network graph, flows, gate
    /// schedules and global parameters
    #[arg(long)]
    pub network: PathBuf,
}

#[derive(Parser, Debug, Clone)]
pub struct SearchOpt {
    /// Paths to CSV flow scenario files (one scenario per file)
    #[arg(long, required = true, num_args = 1..)]
    pub scenario: Vec<PathBuf>,

    /// Path to a JSON network file. When omitted, the generated zonal
    /// topology is used
    #[arg(long)]
    pub network: Option<PathBuf>,

    /// Number of zones in the generated topology (ignored with --network)
    #[arg(long, default_value_t = 6)]
    pub zones: usize,

    /// Name of the built-in decision policy driving the episode
    #[arg(long, default_value = "all-open")]
    pub policy: String,

    /// The number of egress queues per port
    #[arg(long, default_value_t = 8)]
    pub num_queues: usize,

    /// Scenarios with more flows than this are truncated
    #[arg(long, default_value_t = 50)]
    pub max_flows: usize,

    /// Episode length cap, in segments
    #[arg(long, default_value_t = 10)]
    pub max_segments: usize,

    /// Weight of average latency in the terminal reward
    #[arg(long, default_value_t = 0.01)]
    pub alpha: f64,

    /// Select scenarios uniformly at random with this seed instead of using
    /// --scenario-index
    #[arg(long)]
    pub seed: Option<u64>,

    /// Index of the scenario to run (ignored with --seed)
    #[arg(long, default_value_t = 0)]
    pub scenario_index: usize,

    /// Where to write the resulting gate schedule as JSON
    #[arg(long)]
    pub schedule_out: Option<PathBuf>,

    /// Node the emitted schedule targets
    #[arg(long, default_value = "Central_Switch")]
    pub schedule_node: String,

    /// Port the emitted schedule targets
    #[arg(long, default_value_t = 0)]
    pub schedule_port: u32,
}
