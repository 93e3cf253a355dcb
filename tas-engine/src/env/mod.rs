//! Segment-based schedule-search environment
//!
//! An external decision policy proposes, step by step, which queues are open
//! and how long the segment lasts; the environment advances flow
//! transmissions under link contention, carries partially transmitted
//! packets across segment boundaries, and folds the result into a reward
//! signal plus deadline/latency/idle metrics.
//!
//! All times in this module are milliseconds, matching the scenario tables
//! it consumes.

pub mod scenario;

use crate::env::scenario::{FlowScenario, ScenarioFlow};
use crate::metrics::{self, EpisodeMetrics, FlowOutcome};
use crate::network::{PathResolver, Topology};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Features per flow slot in the observation vector.
pub const NUM_FEATURES: usize = 6;

/// Scale from the policy's normalized segment scalar to milliseconds.
const SEGMENT_SCALE_MS: f64 = 20_000.0;
/// Segments shorter than this are floored, never zero or negative.
const MIN_SEGMENT_MS: f64 = 1.0;
const MEET_DEADLINE_REWARD: f64 = 0.1;
const MISS_DEADLINE_PENALTY: f64 = -0.1;
const INVALID_ACTION_PENALTY: f64 = -0.01;
/// Added to the deadline of flows still unfinished at episode end, so they
/// always count as deadline misses without breaking metrics computation.
const SYNTHETIC_FINISH_OFFSET_MS: f64 = 999_999.0;

// Observation normalization divisors. Values are clamped to [0, 1].
const DEADLINE_DIV: f64 = 10_000.0;
const SIZE_DIV: f64 = 9_000.0;
const RELEASE_DIV: f64 = 10_000.0;
const PATH_LEN_DIV: f64 = 20.0;
const EARLIEST_DIV: f64 = 200_000.0;

/// How `reset` picks the scenario for the next episode. Selection is
/// explicit and injectable so episodes stay reproducible.
#[derive(Debug, Clone, Copy)]
pub enum ScenarioSelection {
    /// Always the scenario at this index (modulo the scenario count).
    Fixed(usize),
    /// Cycle through the scenarios in order, one per episode.
    RoundRobin,
    /// Uniformly random with a fixed seed.
    Seeded(u64),
}

#[derive(Debug, Clone)]
pub struct EnvConfig {
    /// Scenarios with more flows are truncated to this count.
    pub max_flows: usize,
    pub num_queues: usize,
    /// Episode length cap, in segments.
    pub max_segments: usize,
    /// Weight of average latency in the terminal reward.
    pub alpha: f64,
    /// Rate for links without an explicit one, in bits per second.
    pub default_rate_bps: f64,
    pub selection: ScenarioSelection,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            max_flows: 50,
            num_queues: 8,
            max_segments: 10,
            alpha: 0.01,
            default_rate_bps: crate::units::FALLBACK_RATE_BPS,
            selection: ScenarioSelection::Fixed(0),
        }
    }
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("no scenarios provided")]
    NoScenarios,
    #[error("flow `{flow}` uses queue {queue}, but only {num_queues} queues are configured")]
    QueueOutOfRange {
        flow: String,
        queue: u8,
        num_queues: usize,
    },
}

/// Lifecycle of one flow within an episode: created at reset, mutated while
/// unfinished, frozen once `finish_time` is set.
#[derive(Debug, Clone)]
struct EpisodeFlow {
    queue: u8,
    /// Remaining frame size in bytes; reduced when a packet is only
    /// partially transmitted before a segment boundary.
    remaining_bytes: f64,
    /// Original deadline offset, used for the observation encoding.
    deadline: f64,
    release_time: f64,
    arrival_time: f64,
    deadline_time: f64,
    finish_time: Option<f64>,
    path: Arc<[usize]>,
    /// The hop a partially transmitted packet resumes from next segment.
    next_hop: usize,
}

/// Result of one `step` call.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub observation: Vec<f32>,
    pub reward: f64,
    pub done: bool,
    /// Present once the episode has terminated.
    pub metrics: Option<EpisodeMetrics>,
}

/// The segment-based decision process. One instance owns all mutable
/// episode state; independent instances never share anything.
pub struct ScheduleSearchEnvironment<'a> {
    topology: &'a Topology,
    scenarios: Vec<FlowScenario>,
    config: EnvConfig,
    selection_rng: fastrand::Rng,
    next_scenario: usize,

    flows: Vec<EpisodeFlow>,
    link_available: HashMap<(usize, usize), f64>,
    /// Append-only busy-interval log per directed link, merged at read time.
    link_intervals: HashMap<(usize, usize), Vec<(f64, f64)>>,
    sim_time: f64,
    step_count: usize,
    /// Set on the first `reset()`; stepping an environment that was never
    /// reset is a no-op.
    started: bool,
    done: bool,
    metrics: Option<EpisodeMetrics>,
}

impl<'a> ScheduleSearchEnvironment<'a> {
    pub fn new(
        topology: &'a Topology,
        scenarios: Vec<FlowScenario>,
        config: EnvConfig,
    ) -> Result<Self, ScenarioError> {
        if scenarios.is_empty() {
            return Err(ScenarioError::NoScenarios);
        }
        for scenario in &scenarios {
            for flow in &scenario.flows {
                if usize::from(flow.queue) >= config.num_queues {
                    return Err(ScenarioError::QueueOutOfRange {
                        flow: flow.id.clone(),
                        queue: flow.queue,
                        num_queues: config.num_queues,
                    });
                }
            }
        }

        let seed = match config.selection {
            ScenarioSelection::Seeded(seed) => seed,
            _ => 0,
        };

        Ok(Self {
            topology,
            scenarios,
            config,
            selection_rng: fastrand::Rng::with_seed(seed),
            next_scenario: 0,
            flows: Vec::new(),
            link_available: HashMap::new(),
            link_intervals: HashMap::new(),
            sim_time: 0.0,
            step_count: 0,
            started: false,
            done: false,
            metrics: None,
        })
    }

    pub fn observation_len(&self) -> usize {
        self.config.max_flows * NUM_FEATURES
    }

    pub fn action_len(&self) -> usize {
        self.config.num_queues + 1
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// The number of live flows in the current episode.
    pub fn flow_count(&self) -> usize {
        self.flows.len()
    }

    /// Starts a new episode: selects a scenario, resolves paths (flows with
    /// no path are excluded), truncates to the flow cap and returns the
    /// initial observation.
    pub fn reset(&mut self) -> Vec<f32> {
        self.started = true;
        self.sim_time = 0.0;
        self.step_count = 0;
        self.done = false;
        self.metrics = None;
        self.link_available.clear();
        self.link_intervals.clear();

        let scenario_index = self.select_scenario();
        let scenario = self.scenarios[scenario_index].flows.clone();

        // The path cache is scoped to this episode
        let mut paths = PathResolver::new();
        self.flows.clear();
        for flow in &scenario {
            if let Some(episode_flow) = self.admit_flow(flow, &mut paths) {
                self.flows.push(episode_flow);
            }
            if self.flows.len() == self.config.max_flows {
                break;
            }
        }

        debug!(
            scenario = scenario_index,
            flows = self.flows.len(),
            "episode reset"
        );
        self.observation()
    }

    fn select_scenario(&mut self) -> usize {
        match self.config.selection {
            ScenarioSelection::Fixed(index) => index % self.scenarios.len(),
            ScenarioSelection::RoundRobin => {
                let index = self.next_scenario % self.scenarios.len();
                self.next_scenario += 1;
                index
            }
            ScenarioSelection::Seeded(_) => self.selection_rng.usize(..self.scenarios.len()),
        }
    }

    fn admit_flow(&self, flow: &ScenarioFlow, paths: &mut PathResolver) -> Option<EpisodeFlow> {
        let src = self.topology.index_of(&flow.talker)?;
        let dst = self.topology.index_of(&flow.listener)?;
        let path = paths.resolve(self.topology, src, dst);
        if path.is_empty() {
            return None;
        }

        Some(EpisodeFlow {
            queue: flow.queue,
            remaining_bytes: flow.frame_size,
            deadline: flow.deadline,
            release_time: flow.release_time,
            arrival_time: flow.release_time,
            deadline_time: flow.release_time + flow.deadline,
            finish_time: None,
            path,
            next_hop: 0,
        })
    }

    /// Applies one action: decodes the per-queue open flags and the segment
    /// length, advances every admitted flow whose queue is open, and
    /// accumulates the reward. On termination the episode metrics are
    /// computed and the terminal reward term is added.
    pub fn step(&mut self, action: &[f32]) -> StepOutcome {
        // Before the first reset there is no episode to advance and no
        // flows to score, so no terminal reward can be minted either
        if !self.started || self.done {
            return StepOutcome {
                observation: self.observation(),
                reward: 0.0,
                done: self.done,
                metrics: self.metrics,
            };
        }

        let open_queues: Vec<bool> = (0..self.config.num_queues)
            .map(|q| action.get(q).copied().unwrap_or(0.0) >= 0.5)
            .collect();
        let segment = f64::from(action.get(self.config.num_queues).copied().unwrap_or(0.0))
            * SEGMENT_SCALE_MS;
        let segment = segment.max(MIN_SEGMENT_MS);

        let mut reward = 0.0;
        if !open_queues.iter().any(|&open| open) {
            reward += INVALID_ACTION_PENALTY;
        }

        let start_t = self.sim_time;
        let end_t = start_t + segment;

        for i in 0..self.flows.len() {
            if self.flows[i].finish_time.is_some() || !open_queues[usize::from(self.flows[i].queue)]
            {
                continue;
            }
            self.advance_flow(i, start_t, end_t);
        }

        // Reward flows that completed strictly within this segment
        for flow in &self.flows {
            if let Some(finish) = flow.finish_time {
                if start_t < finish && finish <= end_t {
                    reward += if finish <= flow.deadline_time {
                        MEET_DEADLINE_REWARD
                    } else {
                        MISS_DEADLINE_PENALTY
                    };
                }
            }
        }

        self.sim_time = end_t;
        self.step_count += 1;

        let all_finished = self.flows.iter().all(|f| f.finish_time.is_some());
        if self.step_count >= self.config.max_segments || all_finished {
            let episode_metrics = self.finalize();
            reward += episode_metrics.success_rate / 100.0
                - self.config.alpha * episode_metrics.average_latency;
            self.done = true;
            self.metrics = Some(episode_metrics);
        }

        StepOutcome {
            observation: self.observation(),
            reward,
            done: self.done,
            metrics: self.metrics,
        }
    }

    /// Walks one flow's remaining path within `[start_t, end_t]`. A packet
    /// that cannot finish a hop before the boundary transmits the feasible
    /// portion, keeps the untransmitted share for the next segment and
    /// resumes from the same hop.
    fn advance_flow(&mut self, index: usize, start_t: f64, end_t: f64) {
        let flow = &mut self.flows[index];
        let hops = flow.path.len().saturating_sub(1);
        let mut current_time = flow.arrival_time.max(start_t);

        while flow.next_hop < hops {
            let edge = (flow.path[flow.next_hop], flow.path[flow.next_hop + 1]);
            let Some(hop) = self
                .topology
                .hop(edge.0, edge.1, self.config.default_rate_bps)
            else {
                // Paths come from the adjacency view, so every edge should
                // resolve; an unresolvable one stalls the flow
                return;
            };

            let bytes_per_ms = hop.rate_bps / 8.0 / 1000.0;
            let tx_time = flow.remaining_bytes / bytes_per_ms;
            let available = self.link_available.get(&edge).copied().unwrap_or(0.0);
            let earliest_start = available.max(current_time);
            let finish = earliest_start + tx_time;

            if finish <= end_t {
                self.link_available.insert(edge, finish);
                self.link_intervals
                    .entry(edge)
                    .or_default()
                    .push((earliest_start, finish));
                current_time = finish;
                flow.next_hop += 1;
            } else {
                let portion = end_t - earliest_start;
                // A non-positive portion means the segment ended before the
                // transmission could begin: zero progress, not an error
                if portion > 0.0 {
                    self.link_available.insert(edge, end_t);
                    self.link_intervals
                        .entry(edge)
                        .or_default()
                        .push((earliest_start, end_t));
                    // Constant-rate extrapolation of the unsent share
                    let leftover_time = finish - end_t;
                    flow.remaining_bytes = leftover_time / tx_time * flow.remaining_bytes;
                }
                return;
            }
        }

        flow.finish_time = Some(current_time);
    }

    /// Assigns synthetic finish times to unfinished flows and computes the
    /// episode metrics. Total flow count stays the success-rate denominator.
    fn finalize(&mut self) -> EpisodeMetrics {
        for flow in &mut self.flows {
            if flow.finish_time.is_none() {
                flow.finish_time = Some(flow.deadline_time + SYNTHETIC_FINISH_OFFSET_MS);
            }
        }

        let outcomes: Vec<FlowOutcome> = self
            .flows
            .iter()
            .map(|f| FlowOutcome {
                arrival_time: f.arrival_time,
                deadline_time: f.deadline_time,
                finish_time: f.finish_time.unwrap_or(f.deadline_time),
            })
            .collect();

        let end_time = outcomes
            .iter()
            .map(|o| o.finish_time)
            .fold(0.0, f64::max);

        EpisodeMetrics {
            success_rate: metrics::success_rate(&outcomes),
            average_latency: metrics::average_latency(&outcomes),
            idle_percentage: metrics::idle_percentage(
                self.topology,
                &self.link_intervals,
                end_time,
            ),
        }
    }

    /// Fixed-length observation: one record per flow slot, zero-padded past
    /// the live flow count. All features are clamped to [0, 1].
    pub fn observation(&self) -> Vec<f32> {
        let mut observation = vec![0.0f32; self.observation_len()];

        for (i, flow) in self.flows.iter().enumerate() {
            let slot = &mut observation[i * NUM_FEATURES..(i + 1) * NUM_FEATURES];
            let unfinished = flow.finish_time.is_none();

            slot[0] = if unfinished { 1.0 } else { 0.0 };
            slot[1] = normalized(flow.deadline, DEADLINE_DIV);
            slot[2] = if unfinished {
                normalized(flow.remaining_bytes, SIZE_DIV)
            } else {
                0.0
            };
            slot[3] = normalized(flow.release_time, RELEASE_DIV);
            slot[4] = normalized(flow.path.len().saturating_sub(1) as f64, PATH_LEN_DIV);
            slot[5] = if unfinished {
                normalized(self.sim_time.max(flow.arrival_time), EARLIEST_DIV)
            } else {
                0.0
            };
        }

        observation
    }
}

fn normalized(value: f64, divisor: f64) -> f32 {
    (value / divisor).clamp(0.0, 1.0) as f32
}
