use std::sync::Arc;
use thiserror::Error;

use crate::graph::{Graph, Time};
use crate::state::SearchState;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ProblemError {
    #[error("at least one agent is needed")]
    NoAgents,
}

/// A reduced graph, plus how many agents explore it and for how long.
#[derive(Clone, Debug)]
pub struct Problem {
    pub graph: Arc<Graph>,
    pub agents: usize,
    pub time_budget: u32,
}

impl Problem {
    pub fn new(graph: Arc<Graph>, agents: usize,
               time_budget: u32) -> Result<Self, ProblemError> {
        if agents == 0 {
            return Err(ProblemError::NoAgents);
        }
        Ok(Problem { graph, agents, time_budget })
    }

    pub fn root_state(&self) -> SearchState {
        SearchState::root(&self.graph, self.agents, Time::from(self.time_budget))
    }
}
