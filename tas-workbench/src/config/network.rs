use serde::{Deserialize, Serialize};
use tas_engine::encoder::PortSchedule;
use tas_engine::network::spec::{
    FlowSpec, LinkSpec, NetworkSpec, NodeKind, NodeSpec, PortGateSpec, QueueGateSpec,
};
use tas_engine::simulator::SimulatorConfig;
use tas_engine::units;

/// The topology/flow document consumed by the deterministic simulator and,
/// minus flows and global parameters, by the search command. All quantities
/// are unit-carrying strings; parsing is best-effort with documented
/// fallbacks.
#[derive(Deserialize, Clone)]
pub struct TsnConfigJson {
    #[serde(default)]
    nodes: Vec<TsnNodeJson>,
    #[serde(default)]
    links: Vec<TsnLinkJson>,
    #[serde(default)]
    flows: Vec<TsnFlowJson>,
    #[serde(rename = "globalConfig", default)]
    global: GlobalConfigJson,
}

#[derive(Deserialize, Clone)]
struct TsnNodeJson {
    id: String,
    #[serde(rename = "type", default)]
    kind: TsnNodeKindJson,
    #[serde(rename = "gclConfigs", default)]
    gcl_configs: Vec<PortGateJson>,
}

#[derive(Deserialize, Clone, Default)]
enum TsnNodeKindJson {
    #[serde(rename = "switch", alias = "TsnSwitch")]
    Switch,
    #[default]
    #[serde(rename = "endpoint", alias = "TsnDevice")]
    Endpoint,
}

#[derive(Deserialize, Clone)]
struct PortGateJson {
    #[serde(rename = "portIndex", default)]
    port_index: u32,
    #[serde(default)]
    schedule: Vec<GclEntryJson>,
}

#[derive(Deserialize, Clone)]
struct GclEntryJson {
    #[serde(default = "default_offset")]
    offset: String,
    #[serde(default = "default_durations")]
    durations: String,
    #[serde(rename = "queueIndex", default)]
    queue_index: u8,
}

fn default_offset() -> String {
    "0ms".to_owned()
}

fn default_durations() -> String {
    "[4ms,6ms]".to_owned()
}

#[derive(Deserialize, Clone)]
struct TsnLinkJson {
    #[serde(rename = "sourceNode")]
    source_node: String,
    #[serde(rename = "sourcePort", default)]
    source_port: u32,
    #[serde(rename = "targetNode")]
    target_node: String,
    #[serde(rename = "targetPort", default)]
    target_port: u32,
    #[serde(rename = "linkSpeed")]
    link_speed: Option<String>,
}

#[derive(Deserialize, Clone)]
struct TsnFlowJson {
    name: String,
    #[serde(rename = "sourceId")]
    source_id: String,
    #[serde(rename = "destId")]
    dest_id: String,
    #[serde(rename = "packetSize", default = "default_packet_size")]
    packet_size: String,
    #[serde(default = "default_interval")]
    interval: String,
    #[serde(rename = "trafficClass", default)]
    traffic_class: u8,
}

fn default_packet_size() -> String {
    "1000B".to_owned()
}

fn default_interval() -> String {
    "200us".to_owned()
}

#[derive(Deserialize, Clone)]
struct GlobalConfigJson {
    #[serde(rename = "defaultSimTime", default = "default_sim_time")]
    sim_time: String,
    #[serde(rename = "defaultLinkSpeed", default = "default_link_speed")]
    link_speed: String,
}

impl Default for GlobalConfigJson {
    fn default() -> Self {
        Self {
            sim_time: default_sim_time(),
            link_speed: default_link_speed(),
        }
    }
}

fn default_sim_time() -> String {
    "20ms".to_owned()
}

fn default_link_speed() -> String {
    "100Mbps".to_owned()
}

/// A fully parsed deterministic-simulation input.
pub struct DelayRunConfig {
    pub network: NetworkSpec,
    pub flows: Vec<FlowSpec>,
    pub simulator: SimulatorConfig,
}

impl From<TsnConfigJson> for DelayRunConfig {
    fn from(json: TsnConfigJson) -> Self {
        let nodes = json
            .nodes
            .into_iter()
            .map(|n| NodeSpec {
                id: n.id.into_boxed_str().into(),
                kind: match n.kind {
                    TsnNodeKindJson::Switch => NodeKind::Switch,
                    TsnNodeKindJson::Endpoint => NodeKind::Endpoint,
                },
                gates: n
                    .gcl_configs
                    .into_iter()
                    .map(|p| PortGateSpec {
                        port: p.port_index,
                        queues: p
                            .schedule
                            .into_iter()
                            .map(|s| QueueGateSpec {
                                queue: s.queue_index,
                                offset: units::parse_time_s(&s.offset),
                                durations: units::parse_duration_list_s(&s.durations),
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();

        let links = json
            .links
            .into_iter()
            .map(|l| LinkSpec {
                source: l.source_node.into_boxed_str().into(),
                source_port: l.source_port,
                target: l.target_node.into_boxed_str().into(),
                target_port: l.target_port,
                rate_bps: l.link_speed.as_deref().map(units::parse_rate_bps),
            })
            .collect();

        let flows = json
            .flows
            .into_iter()
            .map(|f| FlowSpec {
                name: f.name.into_boxed_str().into(),
                source: f.source_id.into_boxed_str().into(),
                dest: f.dest_id.into_boxed_str().into(),
                packet_bytes: units::parse_packet_bytes(&f.packet_size),
                interval: units::parse_time_s(&f.interval),
                queue: f.traffic_class,
            })
            .collect();

        let mut horizon = units::parse_time_s(&json.global.sim_time);
        if horizon <= 0.0 {
            horizon = 0.02;
        }

        Self {
            network: NetworkSpec { nodes, links },
            flows,
            simulator: SimulatorConfig {
                horizon,
                default_rate_bps: units::parse_rate_bps(&json.global.link_speed),
            },
        }
    }
}

/// The gate-schedule document written after a search run, matching the
/// `gclConfigs` shape the delay input accepts.
#[derive(Serialize)]
pub struct GclOutputJson {
    #[serde(rename = "nodeId")]
    node_id: String,
    #[serde(rename = "portIndex")]
    port_index: u32,
    #[serde(rename = "numTrafficClasses")]
    num_traffic_classes: usize,
    schedule: Vec<GclEntryOutputJson>,
}

#[derive(Serialize)]
struct GclEntryOutputJson {
    offset: String,
    durations: String,
    #[serde(rename = "queueIndex")]
    queue_index: u8,
}

impl From<&PortSchedule> for GclOutputJson {
    fn from(schedule: &PortSchedule) -> Self {
        Self {
            node_id: schedule.node.to_string(),
            port_index: schedule.port,
            num_traffic_classes: schedule.num_traffic_classes,
            schedule: schedule
                .schedule
                .iter()
                .map(|entry| GclEntryOutputJson {
                    offset: format_ms(entry.offset_ms),
                    durations: format!(
                        "[{},{}]",
                        format_ms(entry.durations_ms[0]),
                        format_ms(entry.durations_ms[1])
                    ),
                    queue_index: entry.queue_index,
                })
                .collect(),
        }
    }
}

fn format_ms(value: f64) -> String {
    format!("{value}ms")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn full_document_converts_with_units_applied() {
        let json = r#"{
            "nodes": [
                {
                    "id": "sw0",
                    "type": "TsnSwitch",
                    "gclConfigs": [
                        {
                            "portIndex": 1,
                            "numTrafficClasses": 8,
                            "schedule": [
                                {"offset": "0ms", "durations": "[1ms,1ms]", "queueIndex": 0}
                            ]
                        }
                    ]
                },
                {"id": "dev0", "type": "TsnDevice"}
            ],
            "links": [
                {"sourceNode": "sw0", "sourcePort": 1, "targetNode": "dev0", "linkSpeed": "1Gbps"}
            ],
            "flows": [
                {"name": "s1", "sourceId": "dev0", "destId": "sw0",
                 "packetSize": "500B", "interval": "4ms", "trafficClass": 3}
            ],
            "globalConfig": {"defaultSimTime": "20ms", "defaultLinkSpeed": "100Mbps"}
        }"#;

        let parsed: TsnConfigJson = serde_json::from_str(json).unwrap();
        let config = DelayRunConfig::from(parsed);

        assert_eq!(config.network.nodes.len(), 2);
        assert_eq!(config.network.nodes[0].kind, NodeKind::Switch);
        let gate = &config.network.nodes[0].gates[0].queues[0];
        assert_eq!(gate.durations, vec![1e-3, 1e-3]);

        assert_eq!(config.network.links[0].rate_bps, Some(1e9));
        assert_eq!(config.network.links[0].target_port, 0);

        let flow = &config.flows[0];
        assert_eq!(flow.packet_bytes, 500);
        assert_eq!(flow.interval, 4e-3);
        assert_eq!(flow.queue, 3);

        assert_eq!(config.simulator.horizon, 20e-3);
        assert_eq!(config.simulator.default_rate_bps, 100e6);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let parsed: TsnConfigJson = serde_json::from_str("{}").unwrap();
        let config = DelayRunConfig::from(parsed);
        assert!(config.network.nodes.is_empty());
        assert_eq!(config.simulator.horizon, 20e-3);
        assert_eq!(config.simulator.default_rate_bps, 100e6);
    }

    #[test]
    fn schedule_output_round_trips_through_the_unit_parser() {
        let schedule = PortSchedule {
            node: "Central_Switch".into(),
            port: 0,
            num_traffic_classes: 8,
            schedule: vec![tas_engine::encoder::ScheduleEntry {
                offset_ms: 10.0,
                durations_ms: [2.5, 2.5],
                queue_index: 1,
            }],
        };
        let output = GclOutputJson::from(&schedule);
        assert_eq!(output.schedule[0].offset, "10ms");
        assert_eq!(output.schedule[0].durations, "[2.5ms,2.5ms]");
        assert_eq!(
            units::parse_duration_list_s(&output.schedule[0].durations),
            vec![2.5e-3, 2.5e-3]
        );
    }
}
