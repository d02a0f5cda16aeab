// Generic A* search shared by both pathfinding layers.
//
// The group layer (rooms) and the tile layer (cells) are both small dense
// graphs indexed by integers, so one search serves both through the
// `SearchSpace` trait. Scores and came-from links live in `Vec`s indexed by
// node for O(1) access and deterministic behavior (no `HashMap`).
//
// The open set is a `BinaryHeap` with reversed ordering (min-heap on f).
// Entries with equal f pop most-recently-pushed first, tracked with an
// insertion sequence number. Nodes for which `expandable()` is false can be
// reached (and can be the goal) but their neighbors are never explored.
//
// See also: `pathfinding.rs` which implements `SearchSpace` for groups and
// tiles.
//
// **Critical constraint: determinism.** The search is a pure function of the
// space and the start/goal nodes. Float ordering uses `total_cmp`.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A graph the A* search can walk. Nodes are dense indices
/// `0..node_count()`.
pub trait SearchSpace {
    fn node_count(&self) -> usize;

    fn neighbors(&self, node: usize) -> impl Iterator<Item = usize> + '_;

    /// Cost of the step `from -> to` between adjacent nodes.
    fn cost(&self, from: usize, to: usize) -> f64;

    /// Admissible estimate of the remaining cost from `node` to `goal`.
    fn heuristic(&self, node: usize, goal: usize) -> f64;

    fn expandable(&self, _node: usize) -> bool {
        true
    }
}

/// The result of a successful search.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchResult {
    /// Nodes from start to goal, inclusive.
    pub nodes: Vec<usize>,
    pub cost: f64,
    /// Nodes closed before the goal was popped.
    pub expanded: usize,
}

/// Entry in the open set (min-heap via reversed ordering).
struct OpenEntry {
    node: usize,
    f_score: f64,
    seq: u64,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Smallest f_score is "greatest"; among equals, the latest push.
        other
            .f_score
            .total_cmp(&self.f_score)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Find the cheapest path from `start` to `goal`. Returns `None` if the goal
/// is unreachable or either node is out of range.
pub fn astar<S: SearchSpace>(space: &S, start: usize, goal: usize) -> Option<SearchResult> {
    let n = space.node_count();
    if start >= n || goal >= n {
        return None;
    }
    if start == goal {
        return Some(SearchResult {
            nodes: vec![start],
            cost: 0.0,
            expanded: 0,
        });
    }

    let mut g_score = vec![f64::INFINITY; n];
    let mut came_from: Vec<Option<usize>> = vec![None; n];
    let mut closed = vec![false; n];
    let mut seq = 0u64;
    let mut expanded = 0;

    g_score[start] = 0.0;
    let mut open = BinaryHeap::new();
    open.push(OpenEntry {
        node: start,
        f_score: space.heuristic(start, goal),
        seq,
    });

    while let Some(OpenEntry { node, .. }) = open.pop() {
        if node == goal {
            return Some(SearchResult {
                nodes: reconstruct_path(&came_from, goal),
                cost: g_score[goal],
                expanded,
            });
        }
        if closed[node] {
            continue;
        }
        closed[node] = true;
        expanded += 1;
        if !space.expandable(node) {
            continue;
        }

        let current_g = g_score[node];
        for next in space.neighbors(node) {
            if closed[next] {
                continue;
            }
            let tentative_g = current_g + space.cost(node, next);
            if tentative_g < g_score[next] {
                g_score[next] = tentative_g;
                came_from[next] = Some(node);
                seq += 1;
                open.push(OpenEntry {
                    node: next,
                    f_score: tentative_g + space.heuristic(next, goal),
                    seq,
                });
            }
        }
    }

    None
}

fn reconstruct_path(came_from: &[Option<usize>], goal: usize) -> Vec<usize> {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(prev) = came_from[current] {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}
