// Binary space partitioning of the dungeon bounds into rooms.
//
// The partitioner works on the room graph directly: the root rectangle is
// added as the first room, and every successful split replaces a room with
// two children plus a door between them. Splitting is iterative over an
// explicit stack of `(RoomId, Axis)` entries.
//
// A split draws one value `r` and cuts at `floor(lerp(size * min, size *
// max, r))` along the entry's axis. Both children are extended by
// `wall_width / 2` into the cut so a wall of the full width can be carved at
// their border later. When either child would come out at or below the
// minimum room size along the cut axis, the same `r` is tried on the other
// axis; if that also fails the room is a permanent leaf. A cut is likewise
// rejected when some neighbor of the room would touch neither child along a
// seam with a cell clear of the walls (`has_passage()`), since no door could
// then reach it. Children are pushed with the opposite of the axis their
// parent was actually cut along.
//
// Connectivity inheritance: before a split room is discarded, each of its
// doors (in attachment order) is re-synthesized between the far room and
// every child that touches it. When no child can host a full door there, the
// door is re-homed onto the child that overlaps the old door most, refitted
// onto that child's own seam with the far room (`fit_door()`); the other
// child is the fallback. The parent's doors are removed afterwards, so a
// room graph that was connected before the split is still connected after
// it, and so is the rasterized floor.
//
// See also: `doors.rs` for seam door placement, `config.rs` for the split
// parameters (validated so every cut seam can host a door), `level.rs` which
// runs this as the first pipeline stage.
//
// **Critical constraint: determinism.** RNG draws happen in a fixed order:
// one per split attempt, then one per door synthesis in the order above.

use crate::config::DungeonConfig;
use crate::doors::{connect, fit_door, has_passage};
use crate::graph::RoomGraph;
use crate::types::{Axis, Rect, RoomId, lerp};
use delve_prng::LevelRng;
use tracing::{debug, trace, warn};

/// Cut `rect` along `axis` at fraction `r` of the randomness window. Returns
/// `None` if either child would be too small along the cut axis.
fn cut(rect: &Rect, axis: Axis, r: f64, config: &DungeonConfig) -> Option<(Rect, Rect)> {
    let (lo, hi) = config.randomness_bounds;
    let half_wall = config.wall_width / 2;
    let (size, min) = match axis {
        Axis::Horizontal => (rect.height, config.min_room_size.1),
        Axis::Vertical => (rect.width, config.min_room_size.0),
    };
    let split = lerp(size as f64 * lo, size as f64 * hi, r).floor() as i32;
    let first = split + half_wall;
    let second = size - split + half_wall;
    if first <= min || second <= min {
        return None;
    }
    Some(match axis {
        Axis::Horizontal => (
            Rect::new(rect.x, rect.y, rect.width, first),
            Rect::new(rect.x, rect.y + split - half_wall, rect.width, second),
        ),
        Axis::Vertical => (
            Rect::new(rect.x, rect.y, first, rect.height),
            Rect::new(rect.x + split - half_wall, rect.y, second, rect.height),
        ),
    })
}

/// Move every door of `parent` onto whichever children can reach the far
/// room, then drop the parent's doors.
fn inherit_doors(
    graph: &mut RoomGraph,
    parent: RoomId,
    children: [RoomId; 2],
    config: &DungeonConfig,
    rng: &mut LevelRng,
) {
    let Some(node) = graph.room(parent) else {
        return;
    };
    let old_doors = node.doors.clone();

    for door_id in old_doors {
        let Some(door) = graph.door(door_id).cloned() else {
            continue;
        };
        let neighbor = door.other(parent);
        if neighbor == children[0] || neighbor == children[1] {
            continue;
        }
        let Some(neighbor_rect) = graph.room(neighbor).map(|n| n.rect) else {
            continue;
        };

        let mut inherited = false;
        for child in children {
            let touches = graph
                .room(child)
                .is_some_and(|c| c.rect.intersect(&neighbor_rect).is_some());
            if touches && connect(graph, child, neighbor, config, rng).is_some() {
                inherited = true;
            }
        }

        if !inherited {
            // Longest contact with the old door footprint first; ties go to
            // the first child.
            let contact = |child: RoomId| {
                graph
                    .room(child)
                    .and_then(|c| c.rect.intersect(&door.rect))
                    .map_or(-1, |seam| seam.width.max(seam.height))
            };
            let order = if contact(children[1]) > contact(children[0]) {
                [children[1], children[0]]
            } else {
                children
            };
            let rehomed = order.into_iter().find_map(|child| {
                let rect = graph.room(child)?.rect;
                fit_door(&rect, &neighbor_rect, config).map(|(r, axis)| (child, r, axis))
            });
            match rehomed {
                Some((child, rect, axis)) => {
                    trace!(door = %door_id, %child, %rect, "re-homing door onto child");
                    graph.add_door(child, neighbor, rect, axis);
                }
                None => {
                    warn!(door = %door_id, %neighbor, "no child can reach the door's far room");
                }
            }
        }

        graph.remove_door(door_id);
    }
}

/// True when every room `room` has a door to still has a seam with a passage
/// cell against at least one of `halves`.
fn keeps_neighbors(graph: &RoomGraph, room: RoomId, halves: &(Rect, Rect), wall: i32) -> bool {
    let Some(node) = graph.room(room) else {
        return true;
    };
    node.doors.iter().all(|&door| {
        let Some(far) = graph.door(door).and_then(|d| graph.room(d.other(room))) else {
            return true;
        };
        has_passage(&halves.0, &far.rect, wall) || has_passage(&halves.1, &far.rect, wall)
    })
}

/// Partition `root` into leaf rooms joined by seam doors.
pub fn split(root: Rect, config: &DungeonConfig, rng: &mut LevelRng) -> RoomGraph {
    let mut graph = RoomGraph::new();
    let root_id = graph.add_room(root);
    let mut stack = vec![(root_id, config.first_split)];
    let mut splits = 0usize;

    while let Some((room, axis)) = stack.pop() {
        let Some(rect) = graph.room(room).map(|node| node.rect) else {
            continue;
        };
        let r = rng.next_f64();
        let fits = |axis: Axis| {
            cut(&rect, axis, r, config)
                .filter(|halves| keeps_neighbors(&graph, room, halves, config.wall_width))
                .map(|halves| (halves, axis))
        };
        let attempt = fits(axis).or_else(|| fits(axis.flipped()));
        let Some(((first, second), cut_axis)) = attempt else {
            trace!(%room, %rect, "leaf room");
            continue;
        };

        let a = graph.add_room(first);
        let b = graph.add_room(second);
        connect(&mut graph, a, b, config, rng);
        inherit_doors(&mut graph, room, [a, b], config, rng);
        graph.remove_room(room);
        splits += 1;

        let next = cut_axis.flipped();
        stack.push((a, next));
        stack.push((b, next));
    }

    debug!(
        splits,
        rooms = graph.room_count(),
        doors = graph.door_count(),
        "partitioned dungeon bounds"
    );
    graph
}
