// Immutable snapshots of the search space.
//
// A state only holds what changes from one branch to another: which nodes
// are still unclaimed, where each agent is and how much time it has left, and
// the value collected so far. Everything else lives in the shared Graph.

use serde::Serialize;
use std::cmp::Reverse;

use crate::graph::{Graph, NodeId, Time, Value};

/// Set of reduced-graph nodes, as a bit mask.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct NodeSet(u64);

impl NodeSet {
    pub fn new() -> Self {
        NodeSet(0)
    }

    #[inline]
    pub fn insert(&mut self, node: NodeId) {
        self.0 |= 1u64 << node;
    }

    #[inline]
    pub fn remove(&mut self, node: NodeId) {
        self.0 &= !(1u64 << node);
    }

    #[inline]
    pub fn contains(&self, node: NodeId) -> bool {
        self.0 & (1u64 << node) != 0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Nodes in increasing id order.
    pub fn iter(&self) -> impl Iterator<Item=NodeId> {
        let mut bits = self.0;
        std::iter::from_fn(move || {
            if bits == 0 {
                None
            } else {
                let node = bits.trailing_zeros() as NodeId;
                bits &= bits - 1;
                Some(node)
            }
        })
    }
}

impl FromIterator<NodeId> for NodeSet {
    fn from_iter<I: IntoIterator<Item=NodeId>>(iter: I) -> Self {
        let mut set = NodeSet::new();
        for node in iter {
            set.insert(node);
        }
        set
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Agent {
    // Position in the agent list the problem was created with.
    pub id: usize,
    pub location: NodeId,
    pub remaining: Time,
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClaimEvent {
    pub agent: usize,
    pub node: NodeId,
    // Time left to the agent once the node is activated.
    pub remaining: Time,
}

#[derive(Clone, Debug)]
pub struct SearchState {
    remaining: NodeSet,
    // Sorted by remaining time, descending. Never empty.
    agents: Vec<Agent>,
    value: Value,
    claims: Vec<ClaimEvent>,
}

impl SearchState {
    /// Root of the search: every agent at the start node with the full budget,
    /// every node reachable from the start still to be claimed. 'agents' must
    /// be positive, see `Problem::new`.
    pub fn root(graph: &Graph, agents: usize, time_budget: Time) -> Self {
        debug_assert!(agents > 0, "a search needs at least one agent");
        let start = graph.start();
        let remaining = graph.nodes()
            .filter(|&n| n != start && graph.distance(start, n).is_some())
            .collect();
        SearchState {
            remaining,
            agents: (0..agents)
                .map(|id| Agent { id, location: start, remaining: time_budget })
                .collect(),
            value: 0,
            claims: Vec::new(),
        }
    }

    pub fn remaining(&self) -> NodeSet {
        self.remaining
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// The agent with the most remaining time.
    pub fn lead(&self) -> &Agent {
        &self.agents[0]
    }

    pub fn value(&self) -> Value {
        self.value
    }

    pub fn claims(&self) -> &[ClaimEvent] {
        &self.claims
    }

    /// Whether the given agent would still have time left after going to
    /// 'target' and activating it.
    pub fn can_claim(&self, graph: &Graph, target: NodeId,
                     agent_index: usize) -> bool {
        let agent = &self.agents[agent_index];
        match graph.distance(agent.location, target) {
            Some(distance) => agent.remaining > Time::from(distance) + 1,
            None => false,
        }
    }

    /// New state where agent 'agent_index' went to 'target' and activated it.
    ///
    /// There is no feasibility check: the agent may end up with negative time,
    /// in which case the node adds a negative value. Callers rely on the
    /// bounds to discard such states.
    pub fn claim(&self, graph: &Graph, target: NodeId,
                 agent_index: usize) -> Self {
        let mut next = self.clone();
        let agent = &mut next.agents[agent_index];
        // +1 to activate
        agent.remaining -= graph.travel_time(agent.location, target) + 1;
        agent.location = target;
        let event = ClaimEvent {
            agent: agent.id,
            node: target,
            remaining: agent.remaining,
        };
        next.value = next.value.saturating_add(
            graph.value(target).saturating_mul(event.remaining));
        next.remaining.remove(target);
        next.claims.push(event);
        next.sort_agents();
        next
    }

    /// Claim with the agent that has the most time left.
    pub fn claim_with_lead(&self, graph: &Graph, target: NodeId) -> Self {
        self.claim(graph, target, 0)
    }

    /// New state where the lead agent stops for good, letting the next agent
    /// in line make the following claims.
    pub fn retire_lead(&self) -> Self {
        let mut next = self.clone();
        next.agents[0].remaining = next.agents[0].remaining.min(0);
        next.sort_agents();
        next
    }

    /// Whether an agent other than the lead could still claim something.
    pub fn has_active_teammate(&self) -> bool {
        self.agents.len() > 1 && self.lead().remaining > 0
            && self.agents[1].remaining > 0
    }

    fn sort_agents(&mut self) {
        // Stable, so ties keep their relative order.
        self.agents.sort_by_key(|agent| Reverse(agent.remaining));
    }
}
