use std::sync::Arc;

/// Declarative description of a switched network, as produced by the
/// workbench config layer. All unit strings have already been parsed:
/// times are seconds, rates bits per second, sizes bytes.
#[derive(Debug, Clone, Default)]
pub struct NetworkSpec {
    pub nodes: Vec<NodeSpec>,
    pub links: Vec<LinkSpec>,
}

#[derive(Debug, Clone)]
pub struct NodeSpec {
    pub id: Arc<str>,
    pub kind: NodeKind,
    /// Gate control lists, one entry per configured egress port.
    pub gates: Vec<PortGateSpec>,
}

impl NodeSpec {
    pub fn switch(id: impl Into<Arc<str>>) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::Switch,
            gates: Vec::new(),
        }
    }

    pub fn endpoint(id: impl Into<Arc<str>>) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::Endpoint,
            gates: Vec::new(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Switch,
    Endpoint,
}

/// Gate configuration for a single egress port.
#[derive(Debug, Clone)]
pub struct PortGateSpec {
    pub port: u32,
    pub queues: Vec<QueueGateSpec>,
}

/// One gate control list, owned by a (port, queue) pair of its node.
#[derive(Debug, Clone)]
pub struct QueueGateSpec {
    pub queue: u8,
    /// Offset of the cycle, in seconds.
    pub offset: f64,
    /// Alternating open/closed phase durations, in seconds, starting open.
    pub durations: Vec<f64>,
}

/// An undirected link between two nodes, with one local port index per
/// endpoint. At most one link per node pair is assumed by path resolution.
#[derive(Debug, Clone)]
pub struct LinkSpec {
    pub source: Arc<str>,
    pub source_port: u32,
    pub target: Arc<str>,
    pub target_port: u32,
    /// Transmission rate in bits per second. `None` falls back to the
    /// run-wide default rate.
    pub rate_bps: Option<f64>,
}

/// A periodically released flow, as consumed by the deterministic simulator.
#[derive(Debug, Clone)]
pub struct FlowSpec {
    pub name: Arc<str>,
    pub source: Arc<str>,
    pub dest: Arc<str>,
    pub packet_bytes: u64,
    /// Release interval in seconds.
    pub interval: f64,
    /// Traffic class selecting the egress queue at every hop.
    pub queue: u8,
}
