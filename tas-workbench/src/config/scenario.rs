use anyhow::Context;
use std::path::Path;
use tas_engine::env::scenario::{FlowScenario, ScenarioFlow};

/// Reads one flow scenario from a CSV table with the columns
/// `id,talker,listener,frame_size,period,deadline,release_time,queue`.
pub fn load_scenario(path: &Path) -> anyhow::Result<FlowScenario> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open scenario file {}", path.display()))?;

    let mut flows = Vec::new();
    for record in reader.deserialize() {
        let flow: ScenarioFlow = record
            .with_context(|| format!("malformed scenario record in {}", path.display()))?;
        flows.push(flow);
    }
    Ok(FlowScenario { flows })
}

/// Loads every scenario file, preserving order.
pub fn load_scenarios(paths: &[std::path::PathBuf]) -> anyhow::Result<Vec<FlowScenario>> {
    paths.iter().map(|p| load_scenario(p)).collect()
}
