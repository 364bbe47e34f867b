pub mod bounds;
pub mod branch_and_bound;
pub mod exhaustive;
pub mod graph;
pub mod greedy;
pub mod input;
pub mod problem;
pub mod random_graph;
pub mod solution;
pub mod solvers;
pub mod state;
