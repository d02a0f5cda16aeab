// Room-graph pruning: small-room removal and spanning-tree door reduction.
//
// `prune_small_rooms()` walks rooms from smallest to largest (ties by id) and
// deletes a candidate only if the rest of the graph stays connected without
// it, checked with a BFS that treats the candidate as already gone. At most
// `floor(room_count * percent / 100)` candidates are considered.
//
// `minimum_spanning_doors()` runs Prim's algorithm over rooms, weighting each
// door by the Euclidean distance between the centers of the rooms it joins.
// `reduce_to_spanning_tree()` removes every door outside that tree, except
// that each such door survives with probability `extra_door_chance`, which
// puts a few loops back into the level.
//
// See also: `graph.rs` for `reachable_count()`, `level.rs` which runs both
// passes after partitioning.
//
// **Critical constraint: determinism.** Candidate order, heap ties, and RNG
// draws are all fixed by room and door ids.

use crate::error::{DungeonError, Result};
use crate::graph::RoomGraph;
use crate::types::{DoorId, RoomId};
use delve_prng::LevelRng;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tracing::{debug, trace};

/// Remove up to `percent`% of the rooms, smallest first, never disconnecting
/// the graph. Returns the number of rooms removed.
///
/// Fails with `LastRoom` when asked to prune a graph of one room or fewer.
pub fn prune_small_rooms(graph: &mut RoomGraph, percent: f64) -> Result<usize> {
    let total = graph.room_count();
    if percent <= 0.0 {
        return Ok(0);
    }
    if total <= 1 {
        return Err(DungeonError::LastRoom { rooms: total });
    }

    let mut candidates: Vec<(i64, RoomId)> = graph
        .rooms()
        .map(|(id, node)| (node.rect.area(), id))
        .collect();
    candidates.sort_unstable();
    let limit = (total as f64 * percent / 100.0).floor() as usize;

    let mut removed = 0;
    for &(area, room) in candidates.iter().take(limit) {
        let remaining = graph.room_count() - 1;
        if remaining == 0 {
            break;
        }
        let start = graph
            .neighbors(room)
            .next()
            .or_else(|| graph.rooms().map(|(id, _)| id).find(|&id| id != room));
        let Some(start) = start else {
            break;
        };
        if graph.reachable_count(start, Some(room)) == remaining {
            trace!(%room, area, "removing small room");
            graph.remove_room(room);
            removed += 1;
        }
    }

    debug!(
        removed,
        considered = limit.min(candidates.len()),
        rooms = graph.room_count(),
        "pruned small rooms"
    );
    Ok(removed)
}

/// Door weighted by the distance between its rooms' centers.
struct DoorEntry {
    door: DoorId,
    weight: f64,
}

impl PartialEq for DoorEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DoorEntry {}

impl PartialOrd for DoorEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DoorEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap: lightest door, then lowest id, is "greatest".
        other
            .weight
            .total_cmp(&self.weight)
            .then_with(|| other.door.cmp(&self.door))
    }
}

fn door_weight(graph: &RoomGraph, door: DoorId) -> Option<f64> {
    let edge = graph.door(door)?;
    let a = graph.room(edge.rooms[0])?.center();
    let b = graph.room(edge.rooms[1])?.center();
    Some(a.distance(b))
}

/// Doors of a minimum spanning forest, in the order Prim's algorithm picks
/// them. Each component is grown from its lowest room id.
///
/// Fails with `EmptyDoorSet` when the graph has no doors at all.
pub fn minimum_spanning_doors(graph: &RoomGraph) -> Result<Vec<DoorId>> {
    if graph.door_count() == 0 {
        return Err(DungeonError::EmptyDoorSet {
            rooms: graph.room_count(),
        });
    }

    let mut visited = vec![false; graph.room_capacity()];
    let mut heap = BinaryHeap::new();
    let mut tree = Vec::new();

    for (root, _) in graph.rooms() {
        if visited[root.index()] {
            continue;
        }
        visit(graph, root, &mut visited, &mut heap);
        while let Some(DoorEntry { door, .. }) = heap.pop() {
            let Some(edge) = graph.door(door) else {
                continue;
            };
            let [a, b] = edge.rooms;
            let next = match (visited[a.index()], visited[b.index()]) {
                (true, false) => b,
                (false, true) => a,
                _ => continue,
            };
            tree.push(door);
            visit(graph, next, &mut visited, &mut heap);
        }
    }
    Ok(tree)
}

fn visit(
    graph: &RoomGraph,
    room: RoomId,
    visited: &mut [bool],
    heap: &mut BinaryHeap<DoorEntry>,
) {
    visited[room.index()] = true;
    let Some(node) = graph.room(room) else {
        return;
    };
    for &door in &node.doors {
        let Some(edge) = graph.door(door) else {
            continue;
        };
        if visited[edge.other(room).index()] {
            continue;
        }
        if let Some(weight) = door_weight(graph, door) {
            heap.push(DoorEntry { door, weight });
        }
    }
}

/// Remove every door outside the minimum spanning forest, keeping each such
/// door anyway with probability `extra_door_chance`. Returns the number of
/// doors removed.
pub fn reduce_to_spanning_tree(
    graph: &mut RoomGraph,
    extra_door_chance: f64,
    rng: &mut LevelRng,
) -> Result<usize> {
    let mut keep = vec![false; graph.door_ids().last().map_or(0, |d| d.index() + 1)];
    for door in minimum_spanning_doors(graph)? {
        keep[door.index()] = true;
    }

    let mut removed = 0;
    let mut extras = 0;
    for door in graph.door_ids() {
        if keep[door.index()] {
            continue;
        }
        if extra_door_chance > 0.0 && rng.random_bool(extra_door_chance) {
            extras += 1;
            continue;
        }
        graph.remove_door(door);
        removed += 1;
    }

    debug!(
        removed,
        extras,
        doors = graph.door_count(),
        "reduced doors to spanning tree"
    );
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Axis, Rect};

    /// 2x2 grid of rooms, all four side doors, with room 3 made small.
    fn grid_graph() -> RoomGraph {
        let mut graph = RoomGraph::new();
        let r0 = graph.add_room(Rect::new(0, 0, 10, 10));
        let r1 = graph.add_room(Rect::new(10, 0, 12, 10));
        let r2 = graph.add_room(Rect::new(0, 10, 10, 10));
        let r3 = graph.add_room(Rect::new(10, 10, 4, 4));
        let door = Rect::new(0, 0, 1, 1);
        graph.add_door(r0, r1, door, Axis::Vertical);
        graph.add_door(r0, r2, door, Axis::Horizontal);
        graph.add_door(r1, r3, door, Axis::Horizontal);
        graph.add_door(r2, r3, door, Axis::Vertical);
        graph
    }

    /// Rooms in a row, 0-1-2, with room 1 the smallest. Removing it would
    /// split the graph.
    fn bridge_graph() -> RoomGraph {
        let mut graph = RoomGraph::new();
        let a = graph.add_room(Rect::new(0, 0, 10, 10));
        let b = graph.add_room(Rect::new(10, 0, 2, 10));
        let c = graph.add_room(Rect::new(12, 0, 10, 10));
        let door = Rect::new(0, 0, 1, 1);
        graph.add_door(a, b, door, Axis::Vertical);
        graph.add_door(b, c, door, Axis::Vertical);
        graph
    }

    #[test]
    fn prune_removes_smallest_when_safe() {
        let mut graph = grid_graph();
        let removed = prune_small_rooms(&mut graph, 25.0).unwrap();
        assert_eq!(removed, 1);
        assert!(graph.room(RoomId(3)).is_none());
        assert!(graph.is_connected());
        assert_eq!(graph.door_count(), 2);
    }

    #[test]
    fn prune_keeps_bridge_room() {
        let mut graph = bridge_graph();
        let removed = prune_small_rooms(&mut graph, 50.0).unwrap();
        assert_eq!(removed, 0);
        assert_eq!(graph.room_count(), 3);
    }

    #[test]
    fn prune_zero_percent_is_noop() {
        let mut graph = grid_graph();
        assert_eq!(prune_small_rooms(&mut graph, 0.0).unwrap(), 0);
        assert_eq!(graph.room_count(), 4);
    }

    #[test]
    fn prune_never_removes_last_room() {
        let mut graph = RoomGraph::new();
        graph.add_room(Rect::new(0, 0, 10, 10));
        assert_eq!(
            prune_small_rooms(&mut graph, 100.0),
            Err(DungeonError::LastRoom { rooms: 1 })
        );
        assert_eq!(graph.room_count(), 1);

        // Full removal on two rooms still leaves one behind.
        let mut graph = RoomGraph::new();
        let a = graph.add_room(Rect::new(0, 0, 4, 4));
        let b = graph.add_room(Rect::new(4, 0, 6, 4));
        graph.add_door(a, b, Rect::new(4, 1, 1, 2), Axis::Vertical);
        let removed = prune_small_rooms(&mut graph, 100.0).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(graph.room_count(), 1);
    }

    #[test]
    fn prune_isolated_room_starts_from_any_other() {
        let mut graph = bridge_graph();
        let lonely = graph.add_room(Rect::new(40, 40, 1, 1));
        // The lonely room is the smallest; dropping it reconnects the graph.
        let removed = prune_small_rooms(&mut graph, 25.0).unwrap();
        assert_eq!(removed, 1);
        assert!(graph.room(lonely).is_none());
        assert!(graph.is_connected());
    }

    #[test]
    fn spanning_tree_keeps_room_count_minus_one() {
        let mut graph = grid_graph();
        let mut rng = LevelRng::new(5);
        let removed = reduce_to_spanning_tree(&mut graph, 0.0, &mut rng).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(graph.door_count(), graph.room_count() - 1);
        assert!(graph.is_connected());
    }

    #[test]
    fn spanning_tree_has_minimum_weight() {
        // Triangle of rooms: 0-1 and 1-2 are short, 0-2 is long.
        let mut graph = RoomGraph::new();
        let r0 = graph.add_room(Rect::new(0, 0, 10, 10));
        let r1 = graph.add_room(Rect::new(10, 0, 10, 10));
        let r2 = graph.add_room(Rect::new(20, 0, 10, 10));
        let door = Rect::new(0, 0, 1, 1);
        let long = graph.add_door(r0, r2, door, Axis::Vertical);
        let d01 = graph.add_door(r0, r1, door, Axis::Vertical);
        let d12 = graph.add_door(r1, r2, door, Axis::Vertical);

        let tree = minimum_spanning_doors(&graph).unwrap();
        assert_eq!(tree, vec![d01, d12]);
        assert!(!tree.contains(&long));
    }

    #[test]
    fn spanning_tree_ties_prefer_lowest_door() {
        let mut graph = RoomGraph::new();
        let r0 = graph.add_room(Rect::new(0, 0, 10, 10));
        let r1 = graph.add_room(Rect::new(10, 0, 10, 10));
        let door = Rect::new(0, 0, 1, 1);
        let first = graph.add_door(r0, r1, door, Axis::Vertical);
        let _second = graph.add_door(r0, r1, door, Axis::Vertical);
        assert_eq!(minimum_spanning_doors(&graph).unwrap(), vec![first]);
    }

    #[test]
    fn spanning_tree_needs_doors() {
        let mut graph = RoomGraph::new();
        graph.add_room(Rect::new(0, 0, 10, 10));
        graph.add_room(Rect::new(20, 0, 10, 10));
        assert_eq!(
            minimum_spanning_doors(&graph),
            Err(DungeonError::EmptyDoorSet { rooms: 2 })
        );
    }

    #[test]
    fn extra_door_chance_one_keeps_everything() {
        let mut graph = grid_graph();
        let mut rng = LevelRng::new(9);
        let removed = reduce_to_spanning_tree(&mut graph, 1.0, &mut rng).unwrap();
        assert_eq!(removed, 0);
        assert_eq!(graph.door_count(), 4);
    }
}
