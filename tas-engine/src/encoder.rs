//! Action-trace encoding
//!
//! Converts the accepted action sequence of one search episode into the
//! gate-schedule representation consumed by [`GateSchedule`] and by the
//! external configuration writer, closing the loop between search output
//! and deterministic validation.
//!
//! [`GateSchedule`]: crate::gate::GateSchedule

use std::sync::Arc;

/// Minimum encoded segment length. Shorter segments produce degenerate
/// control-list rows the downstream consumers reject.
const MIN_ENCODED_SEGMENT_MS: f64 = 2.0;
/// Matches the scale the environment applies to the action's segment scalar.
const SEGMENT_SCALE_MS: f64 = 20_000.0;

/// One row of a gate control list, in milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleEntry {
    /// Running sum of all prior segment lengths.
    pub offset_ms: f64,
    /// Open/closed phase pair covering this segment.
    pub durations_ms: [f64; 2],
    /// First queue index marked open by the action, 0 when none was.
    pub queue_index: u8,
}

/// A complete control list for one (node, port) target.
#[derive(Debug, Clone)]
pub struct PortSchedule {
    pub node: Arc<str>,
    pub port: u32,
    pub num_traffic_classes: usize,
    pub schedule: Vec<ScheduleEntry>,
}

/// Maps each accepted action onto a schedule row: the segment is split
/// evenly into an open/closed pair and placed at the cumulative offset of
/// everything before it.
pub fn encode_actions(
    actions: &[Vec<f32>],
    num_queues: usize,
    node: Arc<str>,
    port: u32,
) -> PortSchedule {
    let mut offset_ms = 0.0;
    let mut schedule = Vec::with_capacity(actions.len());

    for action in actions {
        let segment_ms = (f64::from(action.get(num_queues).copied().unwrap_or(0.0))
            * SEGMENT_SCALE_MS)
            .max(MIN_ENCODED_SEGMENT_MS);
        let half_ms = segment_ms / 2.0;

        let queue_index = (0..num_queues)
            .find(|&q| action.get(q).copied().unwrap_or(0.0) >= 0.5)
            .unwrap_or(0) as u8;

        schedule.push(ScheduleEntry {
            offset_ms,
            durations_ms: [half_ms, half_ms],
            queue_index,
        });
        offset_ms += segment_ms;
    }

    PortSchedule {
        node,
        port,
        num_traffic_classes: num_queues,
        schedule,
    }
}
