pub mod cli;
pub mod network;
pub mod scenario;

use crate::config::network::{DelayRunConfig, TsnConfigJson};
use anyhow::Context;
use std::fs;
use std::path::Path;

pub fn load_network_config(path: &Path) -> anyhow::Result<DelayRunConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read network file {}", path.display()))?;
    let json: TsnConfigJson = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse network file {}", path.display()))?;
    Ok(json.into())
}
