//! Best-effort parsing of unit-carrying strings
//!
//! Config surfaces use strings like `"100Mbps"`, `"1000B"`, `"200us"` and
//! `"[4ms,6ms]"`. Parsing never fails: unrecognized input falls back to a
//! documented default and logs a warning, so a malformed field degrades one
//! value instead of aborting a whole run.

use tracing::warn;

/// Fallback rate when a link speed string is unrecognized: 100 Mbit/s.
pub const FALLBACK_RATE_BPS: f64 = 100e6;
/// Fallback packet size when a size string is unrecognized: 1000 bytes.
pub const FALLBACK_PACKET_BYTES: u64 = 1000;
/// Fallback duration when a time string is unrecognized: 200 microseconds.
pub const FALLBACK_TIME_S: f64 = 200e-6;

/// Parses `"100Mbps"` / `"1Gbps"` into bits per second.
pub fn parse_rate_bps(input: &str) -> f64 {
    let s = input.trim().to_ascii_lowercase();
    let parsed = s
        .strip_suffix("mbps")
        .map(|v| (v, 1e6))
        .or_else(|| s.strip_suffix("gbps").map(|v| (v, 1e9)))
        .and_then(|(v, scale)| v.trim().parse::<f64>().ok().map(|v| v * scale));

    parsed.unwrap_or_else(|| {
        warn!(input, "unrecognized rate, substituting 100 Mbit/s");
        FALLBACK_RATE_BPS
    })
}

/// Parses `"1000B"` (or a bare number) into bytes.
pub fn parse_packet_bytes(input: &str) -> u64 {
    let s = input.trim().to_ascii_lowercase();
    let digits = s.strip_suffix('b').unwrap_or(&s);
    digits.trim().parse::<u64>().unwrap_or_else(|_| {
        warn!(input, "unrecognized packet size, substituting 1000 bytes");
        FALLBACK_PACKET_BYTES
    })
}

/// Parses `"200us"` / `"4ms"` / `"1s"` (or a bare number of seconds) into
/// seconds.
pub fn parse_time_s(input: &str) -> f64 {
    let s = input.trim().to_ascii_lowercase();
    let parsed = s
        .strip_suffix("us")
        .map(|v| (v, 1e-6))
        .or_else(|| s.strip_suffix("ms").map(|v| (v, 1e-3)))
        .or_else(|| s.strip_suffix('s').map(|v| (v, 1.0)))
        .map_or_else(
            || s.parse::<f64>().ok(),
            |(v, scale)| v.trim().parse::<f64>().ok().map(|v| v * scale),
        );

    parsed.unwrap_or_else(|| {
        warn!(input, "unrecognized time, substituting 200 microseconds");
        FALLBACK_TIME_S
    })
}

/// Parses a bracketed duration list like `"[4ms,6ms]"` into seconds. An
/// empty list is valid and yields an always-open gate downstream.
pub fn parse_duration_list_s(input: &str) -> Vec<f64> {
    let inner = input.trim().trim_start_matches('[').trim_end_matches(']');
    if inner.trim().is_empty() {
        return Vec::new();
    }
    inner.split(',').map(parse_time_s).collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rates() {
        assert_eq!(parse_rate_bps("100Mbps"), 100e6);
        assert_eq!(parse_rate_bps(" 2.5gbps "), 2.5e9);
        assert_eq!(parse_rate_bps("fast"), FALLBACK_RATE_BPS);
    }

    #[test]
    fn packet_sizes() {
        assert_eq!(parse_packet_bytes("1000B"), 1000);
        assert_eq!(parse_packet_bytes("64"), 64);
        assert_eq!(parse_packet_bytes("big"), FALLBACK_PACKET_BYTES);
    }

    #[test]
    fn times() {
        assert_eq!(parse_time_s("200us"), 200e-6);
        assert_eq!(parse_time_s("4ms"), 4e-3);
        assert_eq!(parse_time_s("1s"), 1.0);
        assert_eq!(parse_time_s("0.25"), 0.25);
        assert_eq!(parse_time_s("soon"), FALLBACK_TIME_S);
    }

    #[test]
    fn duration_lists() {
        assert_eq!(parse_duration_list_s("[4ms,6ms]"), vec![4e-3, 6e-3]);
        assert_eq!(parse_duration_list_s("[1ms, 1ms]"), vec![1e-3, 1e-3]);
        assert!(parse_duration_list_s("[]").is_empty());
        assert!(parse_duration_list_s("").is_empty());
    }
}
