// Exact solver using Branch-and-Bound.
// See https://en.wikipedia.org/wiki/Branch_and_bound
//
// States are explored depth-first from an explicit stack. For each state we
// get two estimates of the best value reachable from it:
// - an upper bound (bounds.rs), optimistic. If it can't beat the best value
//   found so far, nothing below this state can either, so we drop it.
// - a lower bound (greedy.rs), an actual completion. If it beats the best
//   value found so far, it becomes the new best.
// Surviving states are branched on by letting the agent with the most time
// left claim each remaining node in turn.
//
// Claims are pushed without checking that the agent has the time for them.
// Such states carry a negative contribution and get pruned when popped.
//
// With several agents, "the agent with the most time always moves next"
// can't express plans where that agent is done while a teammate still has
// work, so states also branch on retiring the lead agent.

use log::{debug, error, info};
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{mpsc, Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use crate::bounds::{upper_bound, BoundKind};
use crate::graph::{Graph, Value};
use crate::greedy::greedy;
use crate::state::SearchState;

// Seed states handed to each worker in parallel mode. More seeds even out the
// work between workers, at the cost of a longer sequential start.
const SEEDS_PER_THREAD: usize = 8;

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SearchParams {
    /// Which upper bound to prune with.
    pub bound: BoundKind,
    /// Only branch on claims the lead agent has time for.
    pub feasible_branches_only: bool,
    /// Number of worker threads, 1 for a sequential search.
    pub threads: usize,
    /// Give up after this long and return the best solution so far.
    pub time_limit_ms: Option<u64>,
}

impl Default for SearchParams {
    fn default() -> Self {
        SearchParams {
            bound: BoundKind::default(),
            feasible_branches_only: false,
            threads: 1,
            time_limit_ms: None,
        }
    }
}

impl SearchParams {
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchStats {
    pub popped: u64,
    pub pruned: u64,
    pub expanded: u64,
    pub improvements: u64,
}

impl SearchStats {
    fn add(&mut self, other: &SearchStats) {
        self.popped += other.popped;
        self.pruned += other.pruned;
        self.expanded += other.expanded;
        self.improvements += other.improvements;
    }
}

/// When to stop searching early. Checked once per popped state.
#[derive(Clone, Debug)]
pub struct SearchControl {
    stop: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl SearchControl {
    pub fn new(stop: Arc<AtomicBool>, time_limit: Option<Duration>) -> Self {
        SearchControl {
            stop,
            deadline: time_limit.map(|limit| Instant::now() + limit),
        }
    }

    pub fn unlimited() -> Self {
        SearchControl::new(Arc::new(AtomicBool::new(false)), None)
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn should_stop(&self) -> bool {
        if self.stop.load(Ordering::Relaxed) {
            return true;
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                // Let the other workers know without each checking the clock.
                self.stop();
                true
            }
            _ => false,
        }
    }
}

/// Best state found so far, shared between workers.
///
/// The value is mirrored in an atomic for the per-state pruning check. Stale
/// reads only prune less. Updates go through the mutex, so an improvement is
/// never overwritten by a worse one.
#[derive(Debug)]
pub struct Incumbent {
    value: AtomicI64,
    state: Mutex<SearchState>,
}

impl Incumbent {
    pub fn new(state: SearchState) -> Self {
        Incumbent {
            value: AtomicI64::new(state.value()),
            state: Mutex::new(state),
        }
    }

    #[inline]
    pub fn value(&self) -> Value {
        self.value.load(Ordering::Relaxed)
    }

    /// Installs 'state' if it is strictly better. Returns whether it was.
    pub fn offer(&self, state: &SearchState) -> bool {
        if state.value() <= self.value() {
            return false;
        }
        let mut best = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.value() <= best.value() {
            return false;
        }
        *best = state.clone();
        self.value.store(state.value(), Ordering::Relaxed);
        true
    }

    pub fn snapshot(&self) -> SearchState {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[derive(Clone, Debug)]
pub struct SearchOutcome {
    pub best: SearchState,
    pub stats: SearchStats,
    // False if stopped before the stack was exhausted.
    pub complete: bool,
}

/// Depth-first branch and bound over a stack of states it owns.
pub struct BranchAndBound<'a> {
    graph: &'a Graph,
    params: &'a SearchParams,
    stack: Vec<SearchState>,
    stats: SearchStats,
}

impl<'a> BranchAndBound<'a> {
    pub fn new(graph: &'a Graph, params: &'a SearchParams,
               stack: Vec<SearchState>) -> Self {
        BranchAndBound { graph, params, stack, stats: SearchStats::default() }
    }

    pub fn stack_len(&self) -> usize {
        self.stack.len()
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Pops one state and prunes or expands it. Returns false if there was
    /// nothing left to pop.
    pub fn step(&mut self, incumbent: &Incumbent) -> bool {
        let state = match self.stack.pop() {
            Some(state) => state,
            None => return false,
        };
        self.stats.popped += 1;

        // Ties can't improve on the best, drop them too.
        let upper = upper_bound(self.graph, &state, self.params.bound);
        if upper <= incumbent.value() {
            self.stats.pruned += 1;
            return true;
        }

        let lower = greedy(self.graph, &state);
        if incumbent.offer(&lower) {
            self.stats.improvements += 1;
            info!("New best! value={} claims={:?}", lower.value(), lower.claims());
        }

        self.branch(&state);
        true
    }

    fn branch(&mut self, state: &SearchState) {
        self.stats.expanded += 1;
        // Pushed first so it is explored last.
        if state.has_active_teammate() {
            self.stack.push(state.retire_lead());
        }
        for node in state.remaining().iter() {
            if self.params.feasible_branches_only
                && !state.can_claim(self.graph, node, 0) {
                continue;
            }
            self.stack.push(state.claim_with_lead(self.graph, node));
        }
    }

    /// Runs until the stack is empty, or until 'control' says to stop.
    /// Returns whether the stack was exhausted.
    pub fn run(&mut self, incumbent: &Incumbent, control: &SearchControl) -> bool {
        while !self.stack.is_empty() {
            if control.should_stop() {
                debug!("Stopping with {} states left", self.stack.len());
                return false;
            }
            self.step(incumbent);
        }
        true
    }

    fn into_stack(self) -> Vec<SearchState> {
        self.stack
    }
}

/// Searches from 'root' for the best reachable state, in parallel if
/// 'params.threads' > 1.
pub fn branch_and_bound(graph: &Arc<Graph>, root: &SearchState,
                        params: &SearchParams,
                        control: &SearchControl) -> SearchOutcome {
    let incumbent = Arc::new(Incumbent::new(greedy(graph, root)));
    info!("Greedy start value: {}", incumbent.value());
    if params.threads <= 1 {
        let mut search = BranchAndBound::new(graph, params, vec![root.clone()]);
        let complete = search.run(&incumbent, control);
        SearchOutcome { best: incumbent.snapshot(), stats: search.stats(), complete }
    } else {
        parallel_branch_and_bound(graph, root, params, control, incumbent)
    }
}

// Expands the root sequentially until there are enough states to go around,
// deals them to workers, then each worker searches its own stack.
fn parallel_branch_and_bound(graph: &Arc<Graph>, root: &SearchState,
                             params: &SearchParams, control: &SearchControl,
                             incumbent: Arc<Incumbent>) -> SearchOutcome {
    let threads = params.threads;
    let mut seeding = BranchAndBound::new(graph, params, vec![root.clone()]);
    while seeding.stack_len() > 0
        && seeding.stack_len() < threads * SEEDS_PER_THREAD {
        if control.should_stop() {
            return SearchOutcome {
                best: incumbent.snapshot(),
                stats: seeding.stats(),
                complete: false,
            };
        }
        seeding.step(&incumbent);
    }
    let mut stats = seeding.stats();
    let seeds = seeding.into_stack();
    debug!("Dealing {} seed states to {} workers", seeds.len(), threads);

    let mut stacks: Vec<Vec<SearchState>> = vec![Vec::new(); threads];
    for (i, seed) in seeds.into_iter().enumerate() {
        stacks[i % threads].push(seed);
    }

    let mut handles = vec![];
    let (tx, rx) = mpsc::channel();
    for stack in stacks.into_iter().filter(|stack| !stack.is_empty()) {
        let tx = tx.clone();
        let graph = graph.clone();
        let params = params.clone();
        let control = control.clone();
        let incumbent = incumbent.clone();
        handles.push(thread::spawn(move || {
            let mut search = BranchAndBound::new(&graph, &params, stack);
            let complete = search.run(&incumbent, &control);
            // Only fails if the receiver is gone, and it outlives the workers.
            let _ = tx.send((search.stats(), complete));
        }));
    }
    drop(tx);  // Drop the last sender, wait until all workers are done.
    let workers = handles.len();
    let mut complete = true;
    let mut reports = 0;
    while let Ok((worker_stats, worker_complete)) = rx.recv() {
        stats.add(&worker_stats);
        complete &= worker_complete;
        reports += 1;
    }
    for handle in handles {
        if handle.join().is_err() {
            error!("A search worker panicked, its subtree is incomplete");
        }
    }
    // A worker that panicked never reported.
    complete &= reports == workers;
    SearchOutcome { best: incumbent.snapshot(), stats, complete }
}
