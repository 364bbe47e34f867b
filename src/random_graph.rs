// Random connected instances, for tests, benchmarks and trying out solvers
// from the command line without an input file.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;

use crate::graph::NodeRecord;

#[derive(Deserialize, Debug, Clone)]
pub struct RandomGraphParams {
    /// Total number of nodes, including the start "N0".
    pub nodes: usize,
    /// How many nodes (other than the start) get a positive value.
    pub valued: usize,
    /// Edges added on top of the random spanning tree.
    pub extra_edges: usize,
    /// Values are drawn from 1..=max_value.
    pub max_value: u32,
}

impl Default for RandomGraphParams {
    fn default() -> Self {
        RandomGraphParams { nodes: 30, valued: 12, extra_edges: 15, max_value: 25 }
    }
}

/// Node "N0" is the start and is always worth 0. Every node is reachable from
/// it: node i > 0 is first attached to a random earlier node.
pub fn random_records<R: Rng>(params: &RandomGraphParams,
                              rng: &mut R) -> Vec<NodeRecord> {
    let nodes = params.nodes.max(1);
    let names: Vec<String> = (0..nodes).map(|i| format!("N{i}")).collect();
    let mut neighbors: Vec<Vec<usize>> = vec![Vec::new(); nodes];
    for i in 1..nodes {
        let j = rng.gen_range(0..i);
        neighbors[i].push(j);
    }
    if nodes > 1 {
        for _ in 0..params.extra_edges {
            let a = rng.gen_range(0..nodes);
            let b = rng.gen_range(0..nodes);
            if a != b && !neighbors[a].contains(&b) && !neighbors[b].contains(&a) {
                neighbors[a].push(b);
            }
        }
    }

    let mut valued: Vec<usize> = (1..nodes).collect();
    valued.shuffle(rng);
    valued.truncate(params.valued);
    let max_value = params.max_value.max(1);

    (0..nodes).map(|i| NodeRecord {
        id: names[i].clone(),
        value: if valued.contains(&i) { rng.gen_range(1..=max_value) } else { 0 },
        neighbors: neighbors[i].iter().map(|&j| names[j].clone()).collect(),
    }).collect()
}
