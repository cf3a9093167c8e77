//! Weighted-A* search driver over [`npuzzle_core`] states.
//!
//! States live in an arena owned by the run; the frontier holds arena
//! handles ordered by weighted value, and the visited map deduplicates
//! boards structurally. Published states are only ever reachable by
//! shared reference, so nothing in here mutates a state after it enters
//! the arena.

pub mod heuristic;

use fxhash::FxHashMap;
use heuristic::Heuristic;
use log::{debug, info};
use npuzzle_core::{Direction, NPuzzle};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::collections::hash_map::Entry;
use std::hash::{Hash, Hasher};
use std::time::Instant;

#[macro_export]
macro_rules! start {
    ($msg:expr) => {
        concat!("⏳ ", $msg)
    };
}

#[macro_export]
macro_rules! working {
    ($msg:expr) => {
        concat!("🛠  ", $msg)
    };
}

#[macro_export]
macro_rules! success {
    ($msg:expr) => {
        concat!("✅ ", $msg)
    };
}

/// Frontier value of a state: `weight · h + g`, saturating so extreme
/// weights stay monotonic instead of wrapping.
#[must_use]
pub fn priority_value(h: u64, g: u64, weight: u64) -> u64 {
    weight.saturating_mul(h).saturating_add(g)
}

/// Frontier ordering for one search run. The weight is explicit,
/// per-run state, so concurrent searches with different weights cannot
/// interfere, and nothing outside this ordering (addresses, arena
/// handles) ever takes part in a comparison.
#[derive(Debug, Clone, Copy)]
pub struct PriorityOrder {
    weight: u64,
}

impl PriorityOrder {
    /// Weights below 1 are clamped to 1, plain A*.
    #[must_use]
    pub fn new(weight: u64) -> Self {
        Self {
            weight: weight.max(1),
        }
    }

    #[must_use]
    pub fn weight(&self) -> u64 {
        self.weight
    }

    /// Smaller combined value first; ties go to the shallower state.
    #[must_use]
    pub fn cmp(&self, a: &NPuzzle, b: &NPuzzle) -> Ordering {
        priority_value(a.estimate(), a.cost(), self.weight)
            .cmp(&priority_value(b.estimate(), b.cost(), self.weight))
            .then(a.cost().cmp(&b.cost()))
    }
}

/// Visited-map key: hashes by fingerprint, compares by full board, so a
/// fingerprint collision costs one slice comparison instead of a wrong
/// deduplication.
struct StateKey {
    fingerprint: u64,
    board: Box<[u16]>,
}

impl StateKey {
    fn of(puzzle: &NPuzzle) -> Self {
        Self {
            fingerprint: puzzle.fingerprint(),
            board: puzzle.board().into(),
        }
    }
}

impl PartialEq for StateKey {
    fn eq(&self, other: &Self) -> bool {
        self.fingerprint == other.fingerprint && self.board == other.board
    }
}

impl Eq for StateKey {}

impl Hash for StateKey {
    fn hash<S: Hasher>(&self, state: &mut S) {
        self.fingerprint.hash(state);
    }
}

/// Frontier entry. Ordered by `(value, cost)` and nothing else, so pop
/// order never depends on arena handles and stays reproducible across
/// runs on the same input.
struct OpenEntry {
    value: u64,
    cost: u64,
    node: usize,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.cost == other.cost
    }
}

impl Eq for OpenEntry {}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value
            .cmp(&other.value)
            .then(self.cost.cmp(&other.cost))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// How a run ended. An unsolvable instance and an exhausted search are
/// normal outcomes, reported distinctly; neither is an error.
#[derive(Debug)]
pub enum Outcome {
    Solved(Solution),
    Unsolvable,
    Exhausted { expanded: u64 },
}

/// A successful search result.
#[derive(Debug)]
pub struct Solution {
    /// Hole moves from the start state to the goal, in order.
    pub moves: Vec<Direction>,
    /// Nodes expanded before the goal was popped.
    pub expanded: u64,
}

/// A weighted-A* search, configured once and reusable across instances.
pub struct Search<H> {
    heuristic: H,
    order: PriorityOrder,
    node_budget: Option<u64>,
}

impl<H: Heuristic> Search<H> {
    #[must_use]
    pub fn new(heuristic: H) -> Self {
        Self {
            heuristic,
            order: PriorityOrder::new(1),
            node_budget: None,
        }
    }

    /// Trade optimality for speed: values become `weight · h + g`.
    #[must_use]
    pub fn with_weight(mut self, weight: u64) -> Self {
        self.order = PriorityOrder::new(weight);
        self
    }

    /// Stop after expanding this many nodes and report exhaustion.
    #[must_use]
    pub fn with_node_budget(mut self, node_budget: u64) -> Self {
        self.node_budget = Some(node_budget);
        self
    }

    /// Run the search from `start` to the goal.
    ///
    /// The solvability classifier gates the whole run: an unsolvable
    /// board returns immediately without touching the frontier.
    pub fn run(&self, mut start: NPuzzle) -> Outcome {
        if !start.is_solvable() {
            info!("the start state cannot reach the goal");
            return Outcome::Unsolvable;
        }

        info!(start!("Searching with weight {}"), self.order.weight());
        let timer = Instant::now();

        start.set_estimate(self.heuristic.estimate(&start));

        let mut arena: Vec<NPuzzle> = Vec::new();
        // The move that produced each arena node; None for the root.
        let mut moved_by: Vec<Option<Direction>> = Vec::new();
        // Set when a cheaper route to the same board was found later, so
        // the stale frontier entry can be skipped on pop.
        let mut superseded: Vec<bool> = Vec::new();
        let mut open: BinaryHeap<Reverse<OpenEntry>> = BinaryHeap::new();
        let mut visited: FxHashMap<StateKey, (u64, usize)> = FxHashMap::default();

        visited.insert(StateKey::of(&start), (start.cost(), 0));
        open.push(Reverse(OpenEntry {
            value: priority_value(start.estimate(), start.cost(), self.order.weight()),
            cost: start.cost(),
            node: 0,
        }));
        arena.push(start);
        moved_by.push(None);
        superseded.push(false);

        let mut expanded: u64 = 0;

        while let Some(Reverse(entry)) = open.pop() {
            let node = entry.node;
            if superseded[node] {
                continue;
            }
            if arena[node].is_solved() {
                let solution = Solution {
                    moves: reconstruct(&arena, &moved_by, node),
                    expanded,
                };
                info!(
                    success!("solved in {} moves after expanding {} nodes in {:.3}s"),
                    solution.moves.len(),
                    expanded,
                    timer.elapsed().as_secs_f64()
                );
                return Outcome::Solved(solution);
            }
            if let Some(budget) = self.node_budget {
                if expanded >= budget {
                    info!("node budget of {budget} exhausted");
                    return Outcome::Exhausted { expanded };
                }
            }
            expanded += 1;
            if expanded % (1 << 20) == 0 {
                debug!(
                    working!("{} nodes expanded, {} in the frontier"),
                    expanded,
                    open.len()
                );
            }

            for dir in Direction::ALL {
                let Some(target) = arena[node].neighbor(dir) else {
                    continue;
                };
                let mut child = arena[node].fork(node);
                child.apply(target);

                match visited.entry(StateKey::of(&child)) {
                    Entry::Occupied(mut seen) => {
                        let (best_cost, best_node) = *seen.get();
                        if best_cost <= child.cost() {
                            continue;
                        }
                        superseded[best_node] = true;
                        seen.insert((child.cost(), arena.len()));
                    }
                    Entry::Vacant(slot) => {
                        slot.insert((child.cost(), arena.len()));
                    }
                }

                child.set_estimate(self.heuristic.estimate(&child));
                open.push(Reverse(OpenEntry {
                    value: priority_value(child.estimate(), child.cost(), self.order.weight()),
                    cost: child.cost(),
                    node: arena.len(),
                }));
                arena.push(child);
                moved_by.push(Some(dir));
                superseded.push(false);
            }
        }

        // A solvable board's whole component was expanded without popping
        // the goal, which only an earlier budget stop should produce;
        // report it the same way rather than panic.
        Outcome::Exhausted { expanded }
    }
}

/// Walk parent handles root-ward, collecting the move that produced each
/// state along the way.
fn reconstruct(arena: &[NPuzzle], moved_by: &[Option<Direction>], goal: usize) -> Vec<Direction> {
    let mut moves = Vec::new();
    let mut node = goal;
    while let Some(parent) = arena[node].parent() {
        moves.push(moved_by[node].expect("only the root lacks a producing move"));
        node = parent;
    }
    moves.reverse();
    moves
}
