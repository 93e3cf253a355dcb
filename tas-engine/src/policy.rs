//! Decision-policy seam and episode driver
//!
//! The environment consumes its policy as a black-box function from the
//! observation vector to an action vector; how the policy was obtained
//! (training, heuristics, a human) is no concern of the core. Built-in
//! heuristic policies form a closed registry selectable by name.

use crate::encoder::{self, PortSchedule};
use crate::env::ScheduleSearchEnvironment;
use crate::metrics::EpisodeMetrics;
use std::sync::Arc;

/// A decision policy: observation in, action out. The action vector has
/// `num_queues + 1` entries in [0, 1] (per-queue open flags plus the
/// normalized segment length).
pub trait SchedulePolicy {
    fn act(&mut self, observation: &[f32]) -> Vec<f32>;
}

impl<F: FnMut(&[f32]) -> Vec<f32>> SchedulePolicy for F {
    fn act(&mut self, observation: &[f32]) -> Vec<f32> {
        self(observation)
    }
}

/// The closed set of built-in heuristic policies. These stand in for an
/// externally trained model and are primarily useful as baselines.
#[derive(Debug, Clone)]
pub enum BuiltinPolicy {
    /// Opens every queue each segment.
    AllOpen { num_queues: usize, segment: f32 },
    /// Opens one queue per segment, cycling through all of them.
    RoundRobin {
        num_queues: usize,
        segment: f32,
        next_queue: usize,
    },
}

impl BuiltinPolicy {
    /// Default normalized segment scalar (10 ms at the environment's scale).
    const DEFAULT_SEGMENT: f32 = 0.0005;

    /// Looks a policy up by registry name. Unknown names yield `None`.
    pub fn from_name(name: &str, num_queues: usize) -> Option<Self> {
        match name {
            "all-open" => Some(Self::AllOpen {
                num_queues,
                segment: Self::DEFAULT_SEGMENT,
            }),
            "round-robin" => Some(Self::RoundRobin {
                num_queues,
                segment: Self::DEFAULT_SEGMENT,
                next_queue: 0,
            }),
            _ => None,
        }
    }

    pub fn names() -> &'static [&'static str] {
        &["all-open", "round-robin"]
    }
}

impl SchedulePolicy for BuiltinPolicy {
    fn act(&mut self, _observation: &[f32]) -> Vec<f32> {
        match self {
            BuiltinPolicy::AllOpen {
                num_queues,
                segment,
            } => {
                let mut action = vec![1.0; *num_queues];
                action.push(*segment);
                action
            }
            BuiltinPolicy::RoundRobin {
                num_queues,
                segment,
                next_queue,
            } => {
                let mut action = vec![0.0; *num_queues];
                action[*next_queue] = 1.0;
                *next_queue = (*next_queue + 1) % *num_queues;
                action.push(*segment);
                action
            }
        }
    }
}

/// Everything one finished episode produced: the accepted action trace, the
/// total reward and the final metrics.
#[derive(Debug, Clone)]
pub struct EpisodeOutcome {
    pub actions: Vec<Vec<f32>>,
    pub total_reward: f64,
    pub metrics: EpisodeMetrics,
}

impl EpisodeOutcome {
    /// Encodes the action trace into a gate control list for the given
    /// (node, port) target.
    pub fn encode_schedule(&self, num_queues: usize, node: Arc<str>, port: u32) -> PortSchedule {
        encoder::encode_actions(&self.actions, num_queues, node, port)
    }
}

/// Drives one full episode: resets the environment, then feeds observations
/// to the policy until termination. The caller may abandon the loop at any
/// point instead; all state lives in the environment instance.
pub fn run_episode(
    env: &mut ScheduleSearchEnvironment<'_>,
    policy: &mut dyn SchedulePolicy,
) -> EpisodeOutcome {
    let mut observation = env.reset();
    let mut actions = Vec::new();
    let mut total_reward = 0.0;

    let metrics = loop {
        let action = policy.act(&observation);
        actions.push(action.clone());

        let outcome = env.step(&action);
        total_reward += outcome.reward;
        observation = outcome.observation;

        if let Some(metrics) = outcome.metrics {
            break metrics;
        }
    };

    EpisodeOutcome {
        actions,
        total_reward,
        metrics,
    }
}
