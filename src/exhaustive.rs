// Implementation of branch_and_bound.rs, without bounds or pruning.
//
// Tries every agent on every node it can still claim, in every order. This is
// exponential and only usable on a handful of nodes, but it is simple enough
// to trust, so the faster search is checked against it.

use crate::graph::Graph;
use crate::state::SearchState;

/// Best state reachable from 'state' through valid claims.
pub fn best_completion(graph: &Graph, state: &SearchState) -> SearchState {
    let mut best = state.clone();
    explore(graph, state, &mut best);
    best
}

fn explore(graph: &Graph, state: &SearchState, best: &mut SearchState) {
    if state.value() > best.value() {
        *best = state.clone();
    }
    let agents = state.agents();
    for agent_index in 0..agents.len() {
        // Agents at the same spot with the same time are interchangeable.
        let agent = &agents[agent_index];
        let duplicate = agents[..agent_index].iter().any(|other| {
            other.location == agent.location && other.remaining == agent.remaining
        });
        if duplicate {
            continue;
        }
        for node in state.remaining().iter() {
            if state.can_claim(graph, node, agent_index) {
                explore(graph, &state.claim(graph, node, agent_index), best);
            }
        }
    }
}
