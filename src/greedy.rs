// Greedy completion of a state, used as the lower bound of the search.
//
// Go through the remaining nodes from most to least valuable, and claim the
// first one that any agent can still reach with time to spare. Claiming moves
// an agent, which changes what is reachable, so we rescan from the top after
// every claim. With a few dozen nodes at most, the quadratic rescan is cheap.

use arrayvec::ArrayVec;
use itertools::Itertools;
use std::cmp::Reverse;

use crate::graph::{Graph, NodeId, MAX_NODES};
use crate::state::SearchState;

/// Returns a terminal state reachable from 'start' through valid claims only.
/// Its value is achievable, so it never overestimates the best completion.
pub fn greedy(graph: &Graph, start: &SearchState) -> SearchState {
    let mut candidates: ArrayVec<NodeId, MAX_NODES> = start.remaining().iter()
        .sorted_by_key(|&node| (Reverse(graph.value(node)), node))
        .collect();

    let mut current = start.clone();
    while let Some((i, agent_index)) = first_claimable(graph, &current,
                                                       &candidates) {
        current = current.claim(graph, candidates[i], agent_index);
        candidates.remove(i);
    }
    current
}

// Position in 'candidates' of the first node some agent can claim, along with
// the first agent (in lead order) able to do it.
fn first_claimable(graph: &Graph, state: &SearchState,
                   candidates: &[NodeId]) -> Option<(usize, usize)> {
    candidates.iter().enumerate().find_map(|(i, &node)| {
        (0..state.agents().len())
            .find(|&agent_index| state.can_claim(graph, node, agent_index))
            .map(|agent_index| (i, agent_index))
    })
}
