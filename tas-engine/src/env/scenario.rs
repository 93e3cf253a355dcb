use serde::Deserialize;

/// One flow record of a search scenario, as read from a scenario table.
/// All times are milliseconds, frame sizes bytes.
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioFlow {
    pub id: String,
    /// Source node id.
    pub talker: String,
    /// Destination node id.
    pub listener: String,
    pub frame_size: f64,
    pub period: f64,
    /// Deadline offset relative to the release time.
    pub deadline: f64,
    pub release_time: f64,
    /// Queue / traffic-class index.
    pub queue: u8,
}

/// A set of flows scheduled together within one episode.
#[derive(Debug, Clone, Default)]
pub struct FlowScenario {
    pub flows: Vec<ScenarioFlow>,
}
