//! Episode metrics
//!
//! Success rate, average latency and trunk-link idle percentage over a
//! completed flow set and a record of link busy intervals. Shared by the
//! search environment's episode finalization.

use crate::network::Topology;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EpisodeMetrics {
    /// Percentage of flows finishing on or before their deadline.
    pub success_rate: f64,
    /// Mean of finish - arrival over all flows, in the episode's time unit.
    pub average_latency: f64,
    /// Percentage of the episode span during which trunk links were idle.
    pub idle_percentage: f64,
}

/// Finalized per-flow timing, with a synthetic finish time already assigned
/// to flows that never completed.
#[derive(Debug, Clone, Copy)]
pub struct FlowOutcome {
    pub arrival_time: f64,
    pub deadline_time: f64,
    pub finish_time: f64,
}

/// 100 x (flows finishing by their deadline) / total flows. An empty flow
/// set conventionally counts as fully successful.
pub fn success_rate(outcomes: &[FlowOutcome]) -> f64 {
    if outcomes.is_empty() {
        return 100.0;
    }
    let met = outcomes
        .iter()
        .filter(|o| o.finish_time <= o.deadline_time)
        .count();
    met as f64 / outcomes.len() as f64 * 100.0
}

pub fn average_latency(outcomes: &[FlowOutcome]) -> f64 {
    if outcomes.is_empty() {
        return 0.0;
    }
    let sum: f64 = outcomes
        .iter()
        .map(|o| o.finish_time - o.arrival_time)
        .sum();
    sum / outcomes.len() as f64
}

/// Idle percentage of the trunk links over `[0, end_time]`: busy intervals
/// logged on trunk links are merged with a sweep, and whatever the merged
/// set does not cover counts as idle. An episode of zero length (or one with
/// no trunk traffic at all) is conventionally 100% idle.
pub fn idle_percentage(
    topology: &Topology,
    link_intervals: &HashMap<(usize, usize), Vec<(f64, f64)>>,
    end_time: f64,
) -> f64 {
    if end_time <= 0.0 {
        return 100.0;
    }

    let trunk_busy: Vec<(f64, f64)> = link_intervals
        .iter()
        .filter(|((a, b), _)| topology.is_trunk(*a, *b))
        .flat_map(|(_, intervals)| intervals.iter().copied())
        .collect();

    let busy: f64 = merge_intervals(trunk_busy)
        .iter()
        .map(|(start, end)| end - start)
        .sum();
    let idle = (end_time - busy).max(0.0);
    idle / end_time * 100.0
}

/// Sort-and-coalesce sweep over possibly overlapping intervals. The input
/// log is never modified in place; merging happens at read time.
pub fn merge_intervals(mut intervals: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    intervals.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut merged: Vec<(f64, f64)> = Vec::with_capacity(intervals.len());
    for (start, end) in intervals {
        match merged.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}
