use crate::config::network::GclOutputJson;
use anyhow::Context;
use std::fs;
use std::path::Path;
use tas_engine::encoder::PortSchedule;
use tas_engine::metrics::EpisodeMetrics;
use tas_engine::simulator::DelayReport;

pub fn print_delay_report(report: &DelayReport) {
    println!("--- Delivery ---");
    println!("* Packets attempted: {}", report.attempted);
    println!("* Packets delivered: {}", report.delivered);

    println!("--- Per-flow delays ---");
    for (flow, delays) in &report.delays {
        if delays.is_empty() {
            println!("* {flow}: no delivered packets");
            continue;
        }
        let min = delays.iter().copied().fold(f64::INFINITY, f64::min);
        let max = delays.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean: f64 = delays.iter().sum::<f64>() / delays.len() as f64;
        println!(
            "* {flow}: {} packets, min {:.3} ms, mean {:.3} ms, max {:.3} ms",
            delays.len(),
            min * 1e3,
            mean * 1e3,
            max * 1e3,
        );
    }
}

pub fn print_search_report(metrics: &EpisodeMetrics, total_reward: f64, segments: usize) {
    println!("--- Episode ---");
    println!("* Segments: {segments}");
    println!("* Total reward: {total_reward:.4}");

    println!("--- Metrics ---");
    println!("* Success rate: {:.2}%", metrics.success_rate);
    println!("* Average latency: {:.3} ms", metrics.average_latency);
    println!("* Trunk idle: {:.2}%", metrics.idle_percentage);
}

pub fn print_schedule(schedule: &PortSchedule) {
    println!("--- Gate schedule ({} port {}) ---", schedule.node, schedule.port);
    for entry in &schedule.schedule {
        println!(
            "* offset {:.3} ms, open {:.3} ms / closed {:.3} ms, queue {}",
            entry.offset_ms, entry.durations_ms[0], entry.durations_ms[1], entry.queue_index,
        );
    }
}

pub fn write_schedule_json(schedule: &PortSchedule, path: &Path) -> anyhow::Result<()> {
    let output = vec![GclOutputJson::from(schedule)];
    let json = serde_json::to_vec_pretty(&output).context("failed to serialize gate schedule")?;
    fs::write(path, json)
        .with_context(|| format!("failed to store gate schedule at {}", path.display()))?;
    println!("* Gate schedule available at {}", path.display());
    Ok(())
}
