use clap::{Parser, ValueEnum};
use env_logger::Env;
use log::{error, info};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde_json::Error as JSONError;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use thiserror::Error;

use harvest_planner::bounds::BoundKind;
use harvest_planner::branch_and_bound::SearchParams;
use harvest_planner::graph::{Graph, GraphError, NodeRecord};
use harvest_planner::input::{load, InputError, InputFormat};
use harvest_planner::problem::{Problem, ProblemError};
use harvest_planner::random_graph::{random_records, RandomGraphParams};
use harvest_planner::solvers::{BranchAndBoundSolver, ExhaustiveSolver, GreedySolver, Solver};

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SolverName {
    /// Exact branch and bound search.
    BranchAndBound,
    /// Greedy solver, claims the most valuable reachable node first.
    Greedy,
    /// Tries every plan, only for tiny graphs.
    Exhaustive,
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Graph file to read. A random graph is generated if omitted.
    input: Option<PathBuf>,

    /// Input format, guessed from the file extension by default.
    #[arg(long, value_enum)]
    format: Option<InputFormat>,

    /// Node the agents start from.
    #[arg(long, default_value = "AA")]
    start: String,

    /// Number of agents working together.
    #[arg(short, long, default_value_t = 1)]
    agents: usize,

    /// Time budget of each agent.
    #[arg(short, long, default_value_t = 30)]
    time: u32,

    /// Solver implementation to use to find a solution.
    #[arg(short, long, value_enum, default_value_t = SolverName::BranchAndBound)]
    solver: SolverName,

    /// When using branch-and-bound, JSON file of search params. Flags below
    /// override it.
    #[arg(long)]
    params_file: Option<PathBuf>,

    /// When using branch-and-bound, upper bound to prune with.
    #[arg(long, value_enum)]
    bound: Option<BoundKind>,

    /// When using branch-and-bound, number of worker threads.
    #[arg(long)]
    threads: Option<usize>,

    /// When using branch-and-bound, stop after this many milliseconds.
    #[arg(long)]
    time_limit_ms: Option<u64>,

    /// When using branch-and-bound, skip claims the agent has no time for.
    #[arg(long)]
    feasible_branches_only: bool,

    /// Print which agent claims which node, and when.
    #[arg(long)]
    plan: bool,

    /// Print the solution as JSON.
    #[arg(long)]
    json: bool,

    /// Without an input file, number of nodes of the random graph.
    #[arg(long, default_value_t = 30)]
    random_nodes: usize,

    /// Without an input file, seed of the random graph.
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

#[derive(Error, Debug)]
enum RunError {
    #[error("Failed reading the input: {0}")]
    Input(#[from] InputError),
    #[error("Invalid graph: {0}")]
    Graph(#[from] GraphError),
    #[error("Invalid problem: {0}")]
    Problem(#[from] ProblemError),
    #[error("Failed reading the params file: {0}")]
    ParamsFile(#[from] std::io::Error),
    #[error("Failed parsing JSON: {0}")]
    Json(#[from] JSONError),
}

fn search_params(cli: &Cli) -> Result<SearchParams, RunError> {
    let mut params = match &cli.params_file {
        Some(filename) => {
            info!("Loading search params from {}", filename.display());
            let data = std::fs::read_to_string(filename)?;
            serde_json::from_str(&data)?
        },
        None => SearchParams::default(),
    };
    if let Some(bound) = cli.bound {
        params.bound = bound;
    }
    if let Some(threads) = cli.threads {
        params.threads = threads;
    }
    if cli.time_limit_ms.is_some() {
        params.time_limit_ms = cli.time_limit_ms;
    }
    params.feasible_branches_only |= cli.feasible_branches_only;
    Ok(params)
}

fn new_solver(cli: &Cli) -> Result<Box<dyn Solver>, RunError> {
    Ok(match cli.solver {
        SolverName::BranchAndBound => {
            let params = search_params(cli)?;
            info!("Search params: {params:?}");
            Box::new(BranchAndBoundSolver::new(params))
        },
        SolverName::Greedy => Box::new(GreedySolver),
        SolverName::Exhaustive => Box::new(ExhaustiveSolver),
    })
}

fn read_records(cli: &Cli) -> Result<(Vec<NodeRecord>, String), RunError> {
    match &cli.input {
        Some(path) => {
            let format = cli.format.unwrap_or_else(|| InputFormat::from_path(path));
            info!("Reading {} as {format:?}", path.display());
            Ok((load(path, format)?, cli.start.clone()))
        },
        None => {
            info!("No input given, using a random graph (seed {})", cli.seed);
            let params = RandomGraphParams {
                nodes: cli.random_nodes,
                ..RandomGraphParams::default()
            };
            let mut rng = SmallRng::seed_from_u64(cli.seed);
            Ok((random_records(&params, &mut rng), "N0".to_string()))
        },
    }
}

fn run(cli: &Cli) -> Result<(), RunError> {
    let (records, start) = read_records(cli)?;
    let graph = Arc::new(Graph::new(&records, &start)?);
    let problem = Problem::new(graph, cli.agents, cli.time)?;
    let mut solver = new_solver(cli)?;
    let solution = solver.solve(&problem);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&solution)?);
        return Ok(());
    }
    println!("{}", solution.value);
    if cli.plan {
        for claim in &solution.claims {
            println!("agent {} claims {} with {} left: +{}",
                     claim.agent, claim.node, claim.remaining, claim.value);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    // Init logger with default value of info
    // This can be overriden with RUST_LOG env var
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("Error while solving with underlying error:");
            error!("  {}", err);
            ExitCode::FAILURE
        },
    }
}
