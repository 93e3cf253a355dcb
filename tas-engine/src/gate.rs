//! Cyclic gate schedules
//!
//! A gate schedule is owned by exactly one (node, port, queue) triple and
//! describes when that queue's gate is open within a repeating cycle.

/// A gate control list reduced to its canonical open-interval set.
///
/// The canonical intervals are half-open `[start, end)`, pairwise disjoint,
/// sorted, and live within one cycle `[0, cycle)`. A schedule with an empty
/// duration list (cycle length 0) is treated as always open, never as a
/// division by zero.
#[derive(Debug, Clone)]
pub struct GateSchedule {
    cycle: f64,
    open_intervals: Vec<(f64, f64)>,
}

impl GateSchedule {
    /// Builds a schedule from an offset and an alternating open/closed
    /// duration list, starting with an open phase. Times are in the caller's
    /// unit; all queries use the same unit.
    pub fn new(offset: f64, durations: &[f64]) -> Self {
        let cycle: f64 = durations.iter().sum();
        if !(cycle > 0.0) {
            return Self::always_open();
        }

        let mut intervals = if durations.len() == 2 {
            // Fast path for the common [open, closed] pair
            let first_open = (cycle - offset).rem_euclid(cycle);
            let first_close = first_open + durations[0];
            if first_close <= cycle {
                vec![(first_open, first_close)]
            } else {
                vec![(first_open, cycle), (0.0, first_close - cycle)]
            }
        } else {
            let mut intervals = Vec::new();
            let mut cursor = offset.rem_euclid(cycle);
            let mut open = true;
            for &duration in durations {
                let start = cursor;
                let end = cursor + duration;
                if open {
                    let s = start.rem_euclid(cycle);
                    let e = end.rem_euclid(cycle);
                    if s < e {
                        intervals.push((s, e));
                    } else {
                        // The phase wraps past the end of the cycle
                        intervals.push((s, cycle));
                        intervals.push((0.0, e));
                    }
                }
                cursor += duration;
                open = !open;
            }
            intervals
        };

        intervals.sort_by(|a, b| a.0.total_cmp(&b.0));
        let open_intervals = merge_sorted(intervals);

        Self {
            cycle,
            open_intervals,
        }
    }

    /// The degenerate schedule of a gate with no control list: always open.
    pub fn always_open() -> Self {
        Self {
            cycle: 0.0,
            open_intervals: Vec::new(),
        }
    }

    pub fn cycle(&self) -> f64 {
        self.cycle
    }

    pub fn open_intervals(&self) -> &[(f64, f64)] {
        &self.open_intervals
    }

    /// Whether the gate is open at time `t`.
    pub fn is_open(&self, t: f64) -> bool {
        if self.cycle <= 0.0 {
            return true;
        }
        let phase = t.rem_euclid(self.cycle);
        self.open_intervals
            .iter()
            .any(|&(start, end)| start <= phase && phase < end)
    }

    /// The smallest `t' >= t` at which the gate is open. Returns `t`
    /// unchanged when the gate is already open. A schedule whose open
    /// phases all have zero length never opens; that yields infinity, which
    /// callers treat as "past any horizon".
    pub fn next_open_time(&self, t: f64) -> f64 {
        if self.cycle <= 0.0 {
            return t;
        }
        if self.open_intervals.is_empty() {
            return f64::INFINITY;
        }

        let phase = t.rem_euclid(self.cycle);
        for &(start, end) in &self.open_intervals {
            if phase < start {
                return t - phase + start;
            }
            if phase < end {
                return t;
            }
        }
        // Past the last interval of this cycle: wrap to the first interval
        // of the next one
        t - phase + self.cycle + self.open_intervals[0].0
    }
}

/// Coalesces overlapping or adjacent intervals. Input must be sorted by
/// start; empty intervals are dropped.
fn merge_sorted(intervals: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    let mut merged: Vec<(f64, f64)> = Vec::with_capacity(intervals.len());
    for (start, end) in intervals {
        match merged.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged.retain(|&(start, end)| end > start);
    merged
}

#[cfg(test)]
mod test {
    use super::*;

    const TOLERANCE: f64 = 1e-12;

    #[test]
    fn two_phase_schedule_without_offset() {
        let gate = GateSchedule::new(0.0, &[0.004, 0.006]);
        assert_eq!(gate.open_intervals(), [(0.0, 0.004)]);
        assert!(gate.is_open(0.0));
        assert!(gate.is_open(0.0039));
        assert!(!gate.is_open(0.004));
        assert!(gate.is_open(0.0105));
    }

    #[test]
    fn two_phase_schedule_with_offset() {
        // Cycle of 10ms, offset 6ms: open interval starts at (10 - 6) = 4ms
        let gate = GateSchedule::new(0.006, &[0.002, 0.008]);
        assert_eq!(gate.open_intervals(), [(0.004, 0.006)]);
    }

    #[test]
    fn two_phase_schedule_wraps_past_cycle_end() {
        // First open at (10 - 2) = 8ms, closing at 8 + 4 = 12ms, which wraps
        let gate = GateSchedule::new(0.002, &[0.004, 0.006]);
        assert_eq!(gate.open_intervals(), [(0.0, 0.002), (0.008, 0.010)]);
    }

    #[test]
    fn general_schedule_merges_touching_intervals() {
        // open [0,2) closed [2,3) open [3,4) -> two intervals, then a second
        // list where the closed phase has zero length and the opens coalesce
        let split = GateSchedule::new(0.0, &[2.0, 1.0, 1.0, 1.0]);
        assert_eq!(split.open_intervals(), [(0.0, 2.0), (3.0, 4.0)]);

        let coalesced = GateSchedule::new(0.0, &[2.0, 0.0, 1.0, 1.0]);
        assert_eq!(coalesced.open_intervals(), [(0.0, 3.0)]);
    }

    #[test]
    fn canonical_intervals_are_sorted_disjoint_and_merge_idempotent() {
        let gate = GateSchedule::new(1.5, &[1.0, 2.0, 0.5, 1.0, 2.0, 3.0]);
        let intervals = gate.open_intervals().to_vec();
        for window in intervals.windows(2) {
            assert!(window[0].1 < window[1].0);
        }
        assert_eq!(merge_sorted(intervals.clone()), intervals);
    }

    #[test]
    fn open_measure_is_preserved() {
        let durations = [1.0, 2.0, 0.5, 1.0, 2.0, 3.0];
        let open_sum: f64 = durations.iter().step_by(2).sum();
        for offset in [0.0, 0.7, 3.2, 9.5, 12.0] {
            let gate = GateSchedule::new(offset, &durations);
            let measure: f64 = gate.open_intervals().iter().map(|(s, e)| e - s).sum();
            assert!((measure - open_sum).abs() < TOLERANCE, "offset {offset}");
        }
    }

    #[test]
    fn next_open_time_is_monotonic_and_lands_on_open() {
        let gate = GateSchedule::new(0.25, &[1.0, 2.0, 0.5, 1.5]);
        let mut t = 0.0;
        while t < 20.0 {
            let next = gate.next_open_time(t);
            assert!(next >= t);
            assert!(gate.is_open(next), "t = {t}, next = {next}");
            t += 0.0831;
        }
    }

    #[test]
    fn next_open_time_keeps_already_open_instants() {
        let gate = GateSchedule::new(0.0, &[0.001, 0.001]);
        assert_eq!(gate.next_open_time(0.0005), 0.0005);
    }

    #[test]
    fn closed_phase_release_waits_for_the_next_boundary() {
        // 1ms open / 1ms closed: a packet arriving at 1.5ms may not start
        // before 2ms
        let gate = GateSchedule::new(0.0, &[0.001, 0.001]);
        assert!(!gate.is_open(0.0015));
        assert!((gate.next_open_time(0.0015) - 0.002).abs() < TOLERANCE);
    }

    #[test]
    fn wrap_to_next_cycle_past_the_last_interval() {
        let gate = GateSchedule::new(0.0, &[1.0, 1.0]);
        // Phase 1.5 is past the only interval [0, 1): next open is at 2.0
        assert!((gate.next_open_time(5.5) - 6.0).abs() < TOLERANCE);
    }

    #[test]
    fn empty_duration_list_is_always_open() {
        let gate = GateSchedule::new(0.0, &[]);
        assert!(gate.is_open(123.456));
        assert_eq!(gate.next_open_time(123.456), 123.456);
    }

    #[test]
    fn schedule_that_never_opens_reports_infinity() {
        let gate = GateSchedule::new(0.0, &[0.0, 5.0]);
        assert!(!gate.is_open(1.0));
        assert_eq!(gate.next_open_time(1.0), f64::INFINITY);
    }
}
