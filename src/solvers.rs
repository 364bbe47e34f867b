// Different solver implementations to plan which nodes each agent claims.
//
// Solver                | Optimal? | Usable on                     |
// -----------------------------------------------------------------
// BranchAndBoundSolver  |     Y    | inputs like the valve reports |
// GreedySolver          |     N    | anything                      |
// ExhaustiveSolver      |     Y    | a handful of valued nodes     |

use log::{info, warn};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use crate::branch_and_bound::{branch_and_bound, SearchControl, SearchParams, SearchStats};
use crate::exhaustive::best_completion;
use crate::greedy::greedy;
use crate::problem::Problem;
use crate::solution::Solution;

pub trait Solver {
    // Name to display for this solver.
    fn name(&self) -> &str;

    // Implementation of the solver.
    fn do_solve(&mut self, problem: &Problem) -> Solution;

    // Wrapper to do_solve, to log timing and score information.
    fn solve(&mut self, problem: &Problem) -> Solution {
        let start = Instant::now();
        let solution = self.do_solve(problem);
        info!("Solver {} took {:?}", self.name(), start.elapsed());
        info!("Solver {} would collect {}, with {} claims",
              self.name(), solution.value, solution.claims.len());
        if !solution.complete {
            warn!("Solver {} did NOT prove its solution optimal.", self.name());
        }
        solution
    }
}

// Claims the most valuable node some agent can still reach, until none can.
// Fast, but can miss the optimum.
pub struct GreedySolver;

// Exact solver, see branch_and_bound.rs.
pub struct BranchAndBoundSolver {
    params: SearchParams,
    stop: Arc<AtomicBool>,
    // Statistics of the last run.
    pub stats: SearchStats,
}

// Tries every feasible plan. Only usable on tiny graphs.
pub struct ExhaustiveSolver;

impl Solver for GreedySolver {
    fn name(&self) -> &str {
        "greedy"
    }

    fn do_solve(&mut self, problem: &Problem) -> Solution {
        let state = greedy(&problem.graph, &problem.root_state());
        Solution::from_state(&problem.graph, &state, /*complete=*/false)
    }
}

impl BranchAndBoundSolver {
    pub fn new(params: SearchParams) -> Self {
        BranchAndBoundSolver {
            params,
            stop: Arc::new(AtomicBool::new(false)),
            stats: SearchStats::default(),
        }
    }

    // Setting this flag from another thread stops the search, which then
    // returns the best solution found so far.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }
}

impl Default for BranchAndBoundSolver {
    fn default() -> Self {
        BranchAndBoundSolver::new(SearchParams::default())
    }
}

impl Solver for BranchAndBoundSolver {
    fn name(&self) -> &str {
        if self.params.threads > 1 {
            "parallel-branch-and-bound"
        } else {
            "branch-and-bound"
        }
    }

    fn do_solve(&mut self, problem: &Problem) -> Solution {
        let control = SearchControl::new(self.stop.clone(), self.params.time_limit());
        let outcome = branch_and_bound(&problem.graph, &problem.root_state(),
                                       &self.params, &control);
        info!("Explored {} states: {} pruned, {} expanded, {} improvements",
              outcome.stats.popped, outcome.stats.pruned,
              outcome.stats.expanded, outcome.stats.improvements);
        self.stats = outcome.stats;
        Solution::from_state(&problem.graph, &outcome.best, outcome.complete)
    }
}

impl Solver for ExhaustiveSolver {
    fn name(&self) -> &str {
        "exhaustive"
    }

    fn do_solve(&mut self, problem: &Problem) -> Solution {
        let state = best_completion(&problem.graph, &problem.root_state());
        Solution::from_state(&problem.graph, &state, /*complete=*/true)
    }
}
