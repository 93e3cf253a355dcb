//! Topology view over a network spec
//!
//! Resolves node ids to dense indices once, at construction, so paths and
//! per-port availability maps can be keyed by index instead of by string.

pub mod spec;

use crate::network::spec::{LinkSpec, NetworkSpec, NodeKind, NodeSpec};
use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("link references unknown node `{0}`")]
    UnknownNode(Arc<str>),
}

/// A link with its endpoints resolved to node indices.
#[derive(Debug, Clone)]
pub struct ResolvedLink {
    pub source: usize,
    pub source_port: u32,
    pub target: usize,
    pub target_port: u32,
    pub rate_bps: Option<f64>,
}

/// The egress/ingress ports and transmission rate of one hop, as seen from
/// the transmitting side.
#[derive(Debug, Clone, Copy)]
pub struct Hop {
    pub egress_port: u32,
    pub ingress_port: u32,
    pub rate_bps: f64,
}

pub struct Topology {
    nodes: Vec<NodeSpec>,
    index_by_id: HashMap<Arc<str>, usize>,
    links: Vec<ResolvedLink>,
    adjacency: Vec<Vec<usize>>,
}

impl Topology {
    pub fn new(spec: NetworkSpec) -> Result<Self, TopologyError> {
        let mut index_by_id = HashMap::with_capacity(spec.nodes.len());
        for (i, node) in spec.nodes.iter().enumerate() {
            index_by_id.insert(node.id.clone(), i);
        }

        let mut links = Vec::with_capacity(spec.links.len());
        let mut adjacency = vec![Vec::new(); spec.nodes.len()];
        for link in &spec.links {
            let source = *index_by_id
                .get(&link.source)
                .ok_or_else(|| TopologyError::UnknownNode(link.source.clone()))?;
            let target = *index_by_id
                .get(&link.target)
                .ok_or_else(|| TopologyError::UnknownNode(link.target.clone()))?;
            adjacency[source].push(target);
            adjacency[target].push(source);
            links.push(ResolvedLink {
                source,
                source_port: link.source_port,
                target,
                target_port: link.target_port,
                rate_bps: link.rate_bps,
            });
        }

        Ok(Self {
            nodes: spec.nodes,
            index_by_id,
            links,
            adjacency,
        })
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, index: usize) -> &NodeSpec {
        &self.nodes[index]
    }

    pub fn nodes(&self) -> &[NodeSpec] {
        &self.nodes
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    /// Resolves the local ports and rate of the link between two adjacent
    /// nodes, in either orientation. `None` means the nodes are not
    /// connected, which callers map to delivery failure for that hop.
    pub fn hop(&self, from: usize, to: usize, default_rate_bps: f64) -> Option<Hop> {
        for link in &self.links {
            let rate_bps = link.rate_bps.unwrap_or(default_rate_bps);
            if link.source == from && link.target == to {
                return Some(Hop {
                    egress_port: link.source_port,
                    ingress_port: link.target_port,
                    rate_bps,
                });
            }
            if link.source == to && link.target == from {
                return Some(Hop {
                    egress_port: link.target_port,
                    ingress_port: link.source_port,
                    rate_bps,
                });
            }
        }
        None
    }

    /// A trunk link connects two switches, or a switch and a node whose name
    /// marks it central. Only trunk links count towards idle percentage.
    pub fn is_trunk(&self, a: usize, b: usize) -> bool {
        let switch_side = |x: usize, y: usize| {
            self.nodes[x].kind == NodeKind::Switch
                && (self.nodes[y].kind == NodeKind::Switch || self.nodes[y].id.contains("Central"))
        };
        switch_side(a, b) || switch_side(b, a)
    }

    /// The zonal automotive topology used by schedule-search runs that do not
    /// supply their own network file: a central switch serving one computer
    /// and `num_zones` zones of one switch, one controller and three sensors,
    /// all over 10 Mbit/s links.
    pub fn zonal(num_zones: usize) -> Self {
        const ZONAL_RATE_BPS: f64 = 10e6;

        let mut spec = NetworkSpec::default();
        spec.nodes.push(NodeSpec::switch("Central_Switch"));
        spec.nodes.push(NodeSpec::endpoint("Central_Computer"));
        let link = |source: &str, source_port: u32, target: &str, target_port: u32| LinkSpec {
            source: source.into(),
            source_port,
            target: target.into(),
            target_port,
            rate_bps: Some(ZONAL_RATE_BPS),
        };
        spec.links.push(link("Central_Switch", 0, "Central_Computer", 0));

        for z in 0..num_zones {
            let zone_switch = format!("Zone_{z}_Switch");
            spec.nodes.push(NodeSpec::switch(zone_switch.as_str()));
            spec.links
                .push(link("Central_Switch", z as u32 + 1, &zone_switch, 0));

            let controller = format!("Zone_{z}_Controller");
            spec.nodes.push(NodeSpec::endpoint(controller.as_str()));
            spec.links.push(link(&zone_switch, 1, &controller, 0));

            for s in 0..3 {
                let sensor = format!("Zone_{z}_Sensor{s}");
                spec.nodes.push(NodeSpec::endpoint(sensor.as_str()));
                spec.links.push(link(&zone_switch, s as u32 + 2, &sensor, 0));
            }
        }

        // The spec above only uses node ids that it also declares
        Topology::new(spec).expect("zonal topology is well formed")
    }
}

/// Fewest-hop path resolution, memoized per (source, destination) pair.
///
/// The cache is scoped to one simulation run or environment episode and must
/// not outlive the topology it was used with.
#[derive(Default)]
pub struct PathResolver {
    cache: HashMap<(usize, usize), Arc<[usize]>>,
}

impl PathResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the node index sequence from `src` to `dst` with minimum hop
    /// count, ties broken by traversal order. An empty path means the flow is
    /// undeliverable, not that an error occurred.
    pub fn resolve(&mut self, topology: &Topology, src: usize, dst: usize) -> Arc<[usize]> {
        if let Some(path) = self.cache.get(&(src, dst)) {
            return path.clone();
        }

        let path: Arc<[usize]> = Self::breadth_first(topology, src, dst).into();
        self.cache.insert((src, dst), path.clone());
        path
    }

    fn breadth_first(topology: &Topology, src: usize, dst: usize) -> Vec<usize> {
        let mut visited = vec![false; topology.node_count()];
        let mut parent = vec![usize::MAX; topology.node_count()];
        let mut queue = VecDeque::from([src]);
        visited[src] = true;

        let mut found = false;
        while let Some(current) = queue.pop_front() {
            if current == dst {
                found = true;
                break;
            }
            for &neighbor in &topology.adjacency[current] {
                if !visited[neighbor] {
                    visited[neighbor] = true;
                    parent[neighbor] = current;
                    queue.push_back(neighbor);
                }
            }
        }

        if !found {
            return Vec::new();
        }

        let mut path = vec![dst];
        let mut cursor = dst;
        while cursor != src {
            cursor = parent[cursor];
            path.push(cursor);
        }
        path.reverse();
        path
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn two_node_spec() -> NetworkSpec {
        NetworkSpec {
            nodes: vec![NodeSpec::endpoint("a"), NodeSpec::endpoint("b")],
            links: vec![LinkSpec {
                source: "a".into(),
                source_port: 2,
                target: "b".into(),
                target_port: 3,
                rate_bps: None,
            }],
        }
    }

    #[test]
    fn hop_resolution_works_in_both_orientations() {
        let topology = Topology::new(two_node_spec()).unwrap();
        let a = topology.index_of("a").unwrap();
        let b = topology.index_of("b").unwrap();

        let forward = topology.hop(a, b, 50e6).unwrap();
        assert_eq!(forward.egress_port, 2);
        assert_eq!(forward.ingress_port, 3);
        assert_eq!(forward.rate_bps, 50e6);

        let backward = topology.hop(b, a, 50e6).unwrap();
        assert_eq!(backward.egress_port, 3);
        assert_eq!(backward.ingress_port, 2);
    }

    #[test]
    fn hop_resolution_fails_for_unconnected_nodes() {
        let mut spec = two_node_spec();
        spec.nodes.push(NodeSpec::endpoint("c"));
        let topology = Topology::new(spec).unwrap();
        let a = topology.index_of("a").unwrap();
        let c = topology.index_of("c").unwrap();
        assert!(topology.hop(a, c, 50e6).is_none());
    }

    #[test]
    fn link_with_unknown_node_is_rejected() {
        let mut spec = two_node_spec();
        spec.links[0].target = "missing".into();
        assert!(matches!(
            Topology::new(spec),
            Err(TopologyError::UnknownNode(_))
        ));
    }

    #[test]
    fn shortest_path_in_zonal_topology() {
        let topology = Topology::zonal(3);
        let sensor = topology.index_of("Zone_1_Sensor0").unwrap();
        let computer = topology.index_of("Central_Computer").unwrap();

        let mut resolver = PathResolver::new();
        let path = resolver.resolve(&topology, sensor, computer);

        let ids: Vec<&str> = path.iter().map(|&i| &*topology.node(i).id).collect();
        assert_eq!(
            ids,
            ["Zone_1_Sensor0", "Zone_1_Switch", "Central_Switch", "Central_Computer"]
        );
    }

    #[test]
    fn disconnected_endpoints_yield_empty_path() {
        let mut spec = two_node_spec();
        spec.nodes.push(NodeSpec::endpoint("island"));
        let topology = Topology::new(spec).unwrap();
        let a = topology.index_of("a").unwrap();
        let island = topology.index_of("island").unwrap();

        let mut resolver = PathResolver::new();
        assert!(resolver.resolve(&topology, a, island).is_empty());
    }

    #[test]
    fn repeated_resolution_returns_the_cached_path() {
        let topology = Topology::zonal(2);
        let src = topology.index_of("Zone_0_Sensor1").unwrap();
        let dst = topology.index_of("Zone_1_Controller").unwrap();

        let mut resolver = PathResolver::new();
        let first = resolver.resolve(&topology, src, dst);
        let second = resolver.resolve(&topology, src, dst);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.len(), 5);
    }

    #[test]
    fn trunk_classification() {
        let topology = Topology::zonal(1);
        let central_switch = topology.index_of("Central_Switch").unwrap();
        let central_computer = topology.index_of("Central_Computer").unwrap();
        let zone_switch = topology.index_of("Zone_0_Switch").unwrap();
        let sensor = topology.index_of("Zone_0_Sensor0").unwrap();

        assert!(topology.is_trunk(central_switch, zone_switch));
        assert!(topology.is_trunk(central_switch, central_computer));
        assert!(!topology.is_trunk(zone_switch, sensor));
    }
}
