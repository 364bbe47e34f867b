// Reduced graph over the "important" nodes (the start node, plus every node
// with a positive value), with the shortest hop distance between each pair of
// them precomputed on the full graph.
//
// The search never walks the raw graph: it only ever needs "how long does it
// take to go from one important node to another", so we pay for one BFS per
// important node up front, O(I * (V + E)).

use log::{debug, info, warn};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;

pub type NodeId = u8;
pub type Cost = u32;
pub type Time = i64;
pub type Value = i64;

// Remaining nodes are tracked in a u64 mask.
pub const MAX_NODES: usize = 64;

// Stand-in travel time for unreachable pairs. Large enough that any claim
// through it leaves an agent deep in negative time.
pub const UNREACHABLE: Time = Cost::MAX as Time;

/// One node of the raw input graph. Edges have unit length.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NodeRecord {
    pub id: String,
    pub value: u32,
    #[serde(rename = "neighborIds", alias = "neighbors", default)]
    pub neighbors: Vec<String>,
}

impl NodeRecord {
    pub fn new(id: &str, value: u32, neighbors: &[&str]) -> Self {
        NodeRecord {
            id: id.to_string(),
            value,
            neighbors: neighbors.iter().map(|n| n.to_string()).collect(),
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum GraphError {
    #[error("node {0:?} is defined more than once")]
    DuplicateNode(String),
    #[error("node {node:?} lists unknown neighbor {neighbor:?}")]
    UnknownNeighbor { node: String, neighbor: String },
    #[error("start node {0:?} does not exist")]
    MissingStart(String),
    #[error("{0} important nodes, at most {MAX_NODES} are supported")]
    TooManyImportantNodes(usize),
}

#[derive(Clone, Debug)]
pub struct Graph {
    names: Vec<String>,
    values: Vec<Value>,
    // distances[from * len + to], None if unreachable.
    distances: Vec<Option<Cost>>,
    // Size of the graph this was reduced from, for reporting.
    pub original_len: usize,
}

impl Graph {
    pub fn new(records: &[NodeRecord], start: &str) -> Result<Self, GraphError> {
        let mut index: FxHashMap<&str, usize> = FxHashMap::default();
        for (i, record) in records.iter().enumerate() {
            if index.insert(record.id.as_str(), i).is_some() {
                return Err(GraphError::DuplicateNode(record.id.clone()));
            }
        }
        let start_idx = *index.get(start)
            .ok_or_else(|| GraphError::MissingStart(start.to_string()))?;

        // Tunnels work both ways, even if only one end lists them.
        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); records.len()];
        for (i, record) in records.iter().enumerate() {
            for neighbor in &record.neighbors {
                let j = *index.get(neighbor.as_str()).ok_or_else(|| {
                    GraphError::UnknownNeighbor {
                        node: record.id.clone(),
                        neighbor: neighbor.clone(),
                    }
                })?;
                adjacency[i].push(j);
                adjacency[j].push(i);
            }
        }
        for neighbors in adjacency.iter_mut() {
            neighbors.sort_unstable();
            neighbors.dedup();
        }

        // Start is always node 0, then important nodes in input order.
        let important: Vec<usize> = std::iter::once(start_idx)
            .chain((0..records.len())
                   .filter(|&i| i != start_idx && records[i].value > 0))
            .collect();
        if important.len() > MAX_NODES {
            return Err(GraphError::TooManyImportantNodes(important.len()));
        }

        let len = important.len();
        let mut reduced_index = vec![None; records.len()];
        for (reduced, &original) in important.iter().enumerate() {
            reduced_index[original] = Some(reduced);
        }

        let mut distances = vec![None; len * len];
        for (from, &source) in important.iter().enumerate() {
            let depths = bfs_depths(&adjacency, source);
            for (to, &target) in important.iter().enumerate() {
                distances[from * len + to] = depths[target];
            }
        }

        let graph = Graph {
            names: important.iter().map(|&i| records[i].id.clone()).collect(),
            values: important.iter().map(|&i| records[i].value as Value).collect(),
            distances,
            original_len: records.len(),
        };
        info!("Graph reduced from {} to {} nodes", records.len(), graph.len());
        for node in graph.nodes().filter(|&n| graph.distance(0, n).is_none()) {
            warn!("Node {} can't be reached from {}, it will be ignored",
                  graph.name(node), start);
        }
        debug!("Distances: {:?}", graph.distances);
        Ok(graph)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn start(&self) -> NodeId {
        0
    }

    pub fn nodes(&self) -> impl Iterator<Item=NodeId> {
        (0..self.len()).map(|n| n as NodeId)
    }

    pub fn name(&self, node: NodeId) -> &str {
        &self.names[node as usize]
    }

    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.names.iter().position(|n| n == name).map(|n| n as NodeId)
    }

    #[inline]
    pub fn value(&self, node: NodeId) -> Value {
        self.values[node as usize]
    }

    #[inline]
    pub fn distance(&self, from: NodeId, to: NodeId) -> Option<Cost> {
        self.distances[from as usize * self.len() + to as usize]
    }

    /// Hop distance as a time span, `UNREACHABLE` if there is no path.
    #[inline]
    pub fn travel_time(&self, from: NodeId, to: NodeId) -> Time {
        self.distance(from, to).map_or(UNREACHABLE, Time::from)
    }
}

// Depth at which every node is first reached from 'source', level by level.
fn bfs_depths(adjacency: &[Vec<usize>], source: usize) -> Vec<Option<Cost>> {
    let mut depths = vec![None; adjacency.len()];
    let mut queue = VecDeque::new();
    depths[source] = Some(0);
    queue.push_back(source);
    while let Some(node) = queue.pop_front() {
        let depth = depths[node].unwrap_or(0);
        for &next in &adjacency[node] {
            if depths[next].is_none() {
                depths[next] = Some(depth + 1);
                queue.push_back(next);
            }
        }
    }
    depths
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_graph() -> Vec<NodeRecord> {
        // A - B - X - C, with X worthless.
        vec![
            NodeRecord::new("A", 0, &["B"]),
            NodeRecord::new("B", 10, &["A", "X"]),
            NodeRecord::new("X", 0, &["B", "C"]),
            NodeRecord::new("C", 1, &["X"]),
        ]
    }

    #[test]
    fn test_keeps_only_important_nodes() {
        let graph = Graph::new(&line_graph(), "A").unwrap();
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.original_len, 4);
        assert_eq!(graph.name(graph.start()), "A");
        assert_eq!(graph.node_id("X"), None);
        let b = graph.node_id("B").unwrap();
        let c = graph.node_id("C").unwrap();
        assert_eq!(graph.value(b), 10);
        assert_eq!(graph.distance(0, b), Some(1));
        assert_eq!(graph.distance(0, c), Some(3));
        assert_eq!(graph.distance(b, c), Some(2));
        assert_eq!(graph.distance(c, c), Some(0));
    }

    #[test]
    fn test_distances_are_symmetric_with_one_way_listing() {
        // Only A lists the A-B tunnel, only C lists the B-C one.
        let records = vec![
            NodeRecord::new("A", 0, &["B"]),
            NodeRecord::new("B", 3, &[]),
            NodeRecord::new("C", 4, &["B"]),
        ];
        let graph = Graph::new(&records, "A").unwrap();
        for from in graph.nodes() {
            for to in graph.nodes() {
                assert_eq!(graph.distance(from, to), graph.distance(to, from));
            }
        }
        assert_eq!(graph.distance(0, 2), Some(2));
    }

    #[test]
    fn test_start_node_kept_even_with_value() {
        let records = vec![
            NodeRecord::new("B", 5, &["S"]),
            NodeRecord::new("S", 7, &["B"]),
        ];
        let graph = Graph::new(&records, "S").unwrap();
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.name(0), "S");
        assert_eq!(graph.name(1), "B");
    }

    #[test]
    fn test_unreachable_nodes_have_no_distance() {
        let records = vec![
            NodeRecord::new("A", 0, &["B"]),
            NodeRecord::new("B", 2, &[]),
            NodeRecord::new("Z", 9, &[]),
        ];
        let graph = Graph::new(&records, "A").unwrap();
        let z = graph.node_id("Z").unwrap();
        assert_eq!(graph.distance(0, z), None);
        assert_eq!(graph.travel_time(0, z), UNREACHABLE);
        assert_eq!(graph.travel_time(0, 1), 1);
    }

    #[test]
    fn test_rejects_malformed_graphs() {
        let duplicate = vec![
            NodeRecord::new("A", 0, &[]),
            NodeRecord::new("A", 1, &[]),
        ];
        assert_eq!(Graph::new(&duplicate, "A").unwrap_err(),
                   GraphError::DuplicateNode("A".to_string()));

        let unknown = vec![NodeRecord::new("A", 0, &["Q"])];
        assert_eq!(Graph::new(&unknown, "A").unwrap_err(),
                   GraphError::UnknownNeighbor {
                       node: "A".to_string(), neighbor: "Q".to_string() });

        assert_eq!(Graph::new(&line_graph(), "AA").unwrap_err(),
                   GraphError::MissingStart("AA".to_string()));

        let many: Vec<NodeRecord> = (0..=MAX_NODES)
            .map(|i| NodeRecord::new(&format!("N{i}"), 1, &[]))
            .collect();
        assert_eq!(Graph::new(&many, "N0").unwrap_err(),
                   GraphError::TooManyImportantNodes(MAX_NODES + 1));
    }
}
