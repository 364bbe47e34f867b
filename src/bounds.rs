// Optimistic estimates of the best value reachable from a state, used to cut
// branches of the search.
//
// Both bounds relax the problem so they can only overestimate: a bound lower
// than the true best completion would prune the optimum away.
//
// - Independent: each node is valued as if the best-placed agent went there
//   directly, ignoring all other nodes.
// - Sorted: an agent's j-th claim (1-based) costs j activations plus a travel
//   at least as long as the distance to the farthest of the nodes claimed so
//   far, which is at least the j-th smallest distance from where the agent is
//   now. This gives each agent a list of decreasing "time slots". The best
//   possible use of all slots pairs the most valuable nodes with the largest
//   slots.

use arrayvec::ArrayVec;
use clap::ValueEnum;
use serde::Deserialize;
use std::cmp::Reverse;

use crate::graph::{Cost, Graph, Time, Value, MAX_NODES};
use crate::state::SearchState;

#[derive(ValueEnum, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BoundKind {
    /// Each node valued on its own, from the best-placed agent.
    Independent,
    /// Per-agent slots from sorted distances, paired with sorted values.
    #[default]
    Sorted,
}

pub fn upper_bound(graph: &Graph, state: &SearchState, kind: BoundKind) -> Value {
    match kind {
        BoundKind::Independent => independent_bound(graph, state),
        BoundKind::Sorted => sorted_bound(graph, state),
    }
}

pub fn independent_bound(graph: &Graph, state: &SearchState) -> Value {
    let mut upper = state.value();
    for node in state.remaining().iter() {
        let best_time = state.agents().iter()
            .filter_map(|agent| {
                graph.distance(agent.location, node)
                    .map(|d| agent.remaining - Time::from(d) - 1)
            })
            .max()
            .unwrap_or(0)
            .max(0);
        upper = upper.saturating_add(graph.value(node).saturating_mul(best_time));
    }
    upper
}

pub fn sorted_bound(graph: &Graph, state: &SearchState) -> Value {
    let remaining = state.remaining();
    if remaining.is_empty() {
        return state.value();
    }

    let mut slots: Vec<Time> = Vec::with_capacity(remaining.len());
    for agent in state.agents().iter().filter(|agent| agent.remaining > 0) {
        let mut distances: ArrayVec<Cost, MAX_NODES> = remaining.iter()
            .filter_map(|node| graph.distance(agent.location, node))
            .collect();
        distances.sort_unstable();
        for (j, &distance) in distances.iter().enumerate() {
            // Distances are sorted, so 'distance' is the max seen so far.
            let slot = agent.remaining - (j as Time + 1) - Time::from(distance);
            if slot <= 0 {
                break;
            }
            slots.push(slot);
        }
    }
    slots.sort_unstable_by_key(|&slot| Reverse(slot));

    let mut values: ArrayVec<Value, MAX_NODES> = remaining.iter()
        .map(|node| graph.value(node))
        .collect();
    values.sort_unstable_by_key(|&value| Reverse(value));

    values.iter().zip(&slots)
        .map(|(&value, &slot)| value.saturating_mul(slot))
        .fold(state.value(), Value::saturating_add)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exhaustive::best_completion;
    use crate::graph::NodeRecord;
    use crate::random_graph::{random_records, RandomGraphParams};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn make_graph() -> Graph {
        let records = vec![
            NodeRecord::new("A", 0, &["B", "X"]),
            NodeRecord::new("B", 10, &["A"]),
            NodeRecord::new("X", 0, &["A", "C"]),
            NodeRecord::new("C", 1, &["X"]),
        ];
        Graph::new(&records, "A").unwrap()
    }

    #[test]
    fn test_independent_bound() {
        let graph = make_graph();
        let root = SearchState::root(&graph, 1, 5);
        // B: 10 * (5 - 2), C: 1 * (5 - 3)
        assert_eq!(independent_bound(&graph, &root), 32);
        let b = graph.node_id("B").unwrap();
        let after_b = root.claim_with_lead(&graph, b);
        // C from B would leave -1, so it counts as 0.
        assert_eq!(independent_bound(&graph, &after_b), 30);
    }

    #[test]
    fn test_sorted_bound() {
        let graph = make_graph();
        let root = SearchState::root(&graph, 1, 5);
        // Slots: 5 - 1 - 1 = 3, then 5 - 2 - 2 = 1.
        assert_eq!(sorted_bound(&graph, &root), 10 * 3 + 1);
        let two_agents = SearchState::root(&graph, 2, 5);
        // Slots 3, 3, 1, 1: B and C both get a 3.
        assert_eq!(sorted_bound(&graph, &two_agents), 30 + 3);
    }

    #[test]
    fn test_bounds_of_terminal_state() {
        let graph = make_graph();
        let b = graph.node_id("B").unwrap();
        let c = graph.node_id("C").unwrap();
        let done = SearchState::root(&graph, 1, 9)
            .claim_with_lead(&graph, b)
            .claim_with_lead(&graph, c);
        for kind in [BoundKind::Independent, BoundKind::Sorted] {
            assert_eq!(upper_bound(&graph, &done, kind), done.value());
        }
    }

    // Walks every state reachable from the root, comparing both bounds against
    // the best completion found by brute force.
    fn check_admissible(graph: &Graph, state: &SearchState, depth: usize) {
        let best = best_completion(graph, state).value();
        for kind in [BoundKind::Independent, BoundKind::Sorted] {
            let bound = upper_bound(graph, state, kind);
            assert!(bound >= best,
                    "{kind:?} bound {bound} < best {best} after {:?}",
                    state.claims());
        }
        if depth == 0 {
            return;
        }
        for node in state.remaining().iter() {
            for agent_index in 0..state.agents().len() {
                let next = state.claim(graph, node, agent_index);
                check_admissible(graph, &next, depth - 1);
            }
        }
        if state.has_active_teammate() {
            check_admissible(graph, &state.retire_lead(), depth - 1);
        }
    }

    #[test]
    fn test_bounds_are_admissible() {
        let mut rng = SmallRng::seed_from_u64(7);
        for round in 0..25 {
            let params = RandomGraphParams {
                nodes: 8,
                valued: 5,
                extra_edges: round % 4,
                max_value: 20,
            };
            let records = random_records(&params, &mut rng);
            let graph = Graph::new(&records, "N0").unwrap();
            for agents in 1..=2 {
                let root = SearchState::root(&graph, agents, 9);
                check_admissible(&graph, &root, 4 - agents);
            }
        }
    }

    #[test]
    fn test_bounds_saturate_on_huge_values() {
        let records = vec![
            NodeRecord::new("S", 0, &["B"]),
            NodeRecord::new("B", u32::MAX, &[]),
        ];
        let graph = Graph::new(&records, "S").unwrap();
        let root = SearchState::root(&graph, 1, Time::from(u32::MAX));
        let best = best_completion(&graph, &root).value();
        assert_eq!(best, Value::MAX);
        for kind in [BoundKind::Independent, BoundKind::Sorted] {
            assert_eq!(upper_bound(&graph, &root, kind), Value::MAX);
        }
    }
}
