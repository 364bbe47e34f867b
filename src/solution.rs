use serde::Serialize;
use thiserror::Error;

use crate::graph::{Graph, NodeId, Time, Value};
use crate::problem::Problem;
use crate::state::SearchState;

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct PlannedClaim {
    pub agent: usize,
    pub node: String,
    // Time left to the agent once the node is activated.
    pub remaining: Time,
    pub value: Value,
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Solution {
    pub value: Value,
    // False if the search was stopped before it could prove optimality.
    pub complete: bool,
    pub claims: Vec<PlannedClaim>,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PlanError {
    #[error("unknown node {0:?}")]
    UnknownNode(String),
    #[error("unknown agent #{0}")]
    UnknownAgent(usize),
    #[error("node {0:?} claimed twice")]
    ClaimedTwice(String),
    #[error("agent #{agent} can't reach {node:?} in time")]
    OutOfTime { agent: usize, node: String },
    #[error("claim of {node:?} should leave {expected} time, not {found}")]
    TimeMismatch { node: String, expected: Time, found: Time },
}

impl Solution {
    /// Plan from the claims of a state.
    ///
    /// Search states may hold claims that left the agent without time. Those
    /// are dropped: they add nothing (or less than nothing), and an agent out
    /// of time never claims anything useful afterwards.
    pub fn from_state(graph: &Graph, state: &SearchState, complete: bool) -> Self {
        let claims: Vec<PlannedClaim> = state.claims().iter()
            .filter(|claim| claim.remaining > 0)
            .map(|claim| PlannedClaim {
                agent: claim.agent,
                node: graph.name(claim.node).to_string(),
                remaining: claim.remaining,
                value: graph.value(claim.node).saturating_mul(claim.remaining),
            })
            .collect();
        Solution {
            value: claims.iter()
                .map(|claim| claim.value)
                .fold(0, Value::saturating_add),
            complete,
            claims,
        }
    }

    /// Walks the plan from the start, checking every claim can really be made.
    /// Returns the value the plan collects.
    pub fn replay(&self, problem: &Problem) -> Result<Value, PlanError> {
        let graph = &problem.graph;
        let mut locations: Vec<NodeId> = vec![graph.start(); problem.agents];
        let mut times: Vec<Time> = vec![Time::from(problem.time_budget);
                                        problem.agents];
        let mut claimed = vec![false; graph.len()];
        let mut total: Value = 0;
        for claim in &self.claims {
            let node = graph.node_id(&claim.node)
                .ok_or_else(|| PlanError::UnknownNode(claim.node.clone()))?;
            if claim.agent >= problem.agents {
                return Err(PlanError::UnknownAgent(claim.agent));
            }
            if node == graph.start() || claimed[node as usize] {
                return Err(PlanError::ClaimedTwice(claim.node.clone()));
            }
            let distance = graph.distance(locations[claim.agent], node)
                .ok_or_else(|| PlanError::OutOfTime {
                    agent: claim.agent, node: claim.node.clone() })?;
            // +1 to activate
            let remaining = times[claim.agent] - Time::from(distance) - 1;
            if remaining <= 0 {
                return Err(PlanError::OutOfTime {
                    agent: claim.agent, node: claim.node.clone() });
            }
            if remaining != claim.remaining {
                return Err(PlanError::TimeMismatch {
                    node: claim.node.clone(),
                    expected: remaining,
                    found: claim.remaining,
                });
            }
            claimed[node as usize] = true;
            locations[claim.agent] = node;
            times[claim.agent] = remaining;
            total = total.saturating_add(graph.value(node).saturating_mul(remaining));
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeRecord;
    use std::sync::Arc;

    fn make_problem(agents: usize, time_budget: u32) -> Problem {
        let records = vec![
            NodeRecord::new("A", 0, &["B", "X"]),
            NodeRecord::new("B", 10, &["A"]),
            NodeRecord::new("X", 0, &["A", "C"]),
            NodeRecord::new("C", 1, &["X"]),
        ];
        let graph = Arc::new(Graph::new(&records, "A").unwrap());
        Problem::new(graph, agents, time_budget).unwrap()
    }

    #[test]
    fn test_from_state_drops_claims_out_of_time() {
        let problem = make_problem(1, 5);
        let graph = &problem.graph;
        let b = graph.node_id("B").unwrap();
        let c = graph.node_id("C").unwrap();
        let state = problem.root_state()
            .claim_with_lead(graph, b)
            .claim_with_lead(graph, c);
        assert_eq!(state.value(), 29);

        let solution = Solution::from_state(graph, &state, true);
        assert_eq!(solution.value, 30);
        assert_eq!(solution.claims, vec![PlannedClaim {
            agent: 0, node: "B".to_string(), remaining: 3, value: 30 }]);
        assert_eq!(solution.replay(&problem), Ok(30));
    }

    #[test]
    fn test_replay_rejects_bad_plans() {
        let problem = make_problem(2, 5);
        let claim = |agent: usize, node: &str, remaining: Time| PlannedClaim {
            agent, node: node.to_string(), remaining, value: 0 };
        let plan = |claims: Vec<PlannedClaim>| Solution {
            value: 0, complete: true, claims };

        assert_eq!(plan(vec![claim(0, "B", 3), claim(1, "C", 2)]).replay(&problem),
                   Ok(32));
        assert_eq!(plan(vec![claim(0, "Q", 3)]).replay(&problem),
                   Err(PlanError::UnknownNode("Q".to_string())));
        assert_eq!(plan(vec![claim(2, "B", 3)]).replay(&problem),
                   Err(PlanError::UnknownAgent(2)));
        assert_eq!(plan(vec![claim(0, "B", 3), claim(1, "B", 3)]).replay(&problem),
                   Err(PlanError::ClaimedTwice("B".to_string())));
        assert_eq!(plan(vec![claim(0, "B", 3), claim(0, "C", -1)]).replay(&problem),
                   Err(PlanError::OutOfTime { agent: 0, node: "C".to_string() }));
        assert_eq!(plan(vec![claim(0, "B", 4)]).replay(&problem),
                   Err(PlanError::TimeMismatch {
                       node: "B".to_string(), expected: 3, found: 4 }));
    }

    #[test]
    fn test_huge_values_saturate() {
        let records = vec![
            NodeRecord::new("S", 0, &["B", "C"]),
            NodeRecord::new("B", u32::MAX, &[]),
            NodeRecord::new("C", u32::MAX, &[]),
        ];
        let graph = Arc::new(Graph::new(&records, "S").unwrap());
        let problem = Problem::new(graph, 2, u32::MAX).unwrap();
        let graph = &problem.graph;
        let state = problem.root_state()
            .claim_with_lead(graph, graph.node_id("B").unwrap())
            .claim_with_lead(graph, graph.node_id("C").unwrap());
        let solution = Solution::from_state(graph, &state, true);
        assert_eq!(solution.value, Value::MAX);
        assert_eq!(solution.claims.len(), 2);
        assert_eq!(solution.replay(&problem), Ok(Value::MAX));
    }
}
