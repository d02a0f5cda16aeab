// Door synthesis between adjacent rooms.
//
// `try_make_door()` places a door of the configured size on the seam (the
// rectangle intersection) of two rooms. A seam wider than it is tall is
// horizontal and the door slides along x; otherwise it is vertical and the
// door slides along y. The door keeps `wall_width` cells clear of both seam
// ends so it never opens into a corner. Seams too short for that are
// rejected, which is a normal outcome (`None`), not an error.
//
// This module also holds the `Triangulation` adjacency strategy: it replaces
// the partitioner's seam doors with doors proposed by a Delaunay
// triangulation of room centers, then restores just enough of the set-aside
// seam doors (chosen with a union–find over rooms) to keep the graph
// connected.
//
// See also: `partition.rs` which calls `connect()` while splitting,
// `triangulate.rs` for the Delaunay edges, `raster.rs` which carves doors.
//
// **Critical constraint: determinism.** Every call to `try_make_door()` draws
// exactly one value from the RNG, whether or not a door is placed.

use crate::config::DungeonConfig;
use crate::graph::RoomGraph;
use crate::triangulate::triangulate;
use crate::types::{Axis, DoorId, Rect, RoomId, lerp};
use delve_prng::LevelRng;
use tracing::debug;

/// Try to place a door on the seam between rectangles `a` and `b`.
///
/// Returns the door rectangle and the seam orientation, or `None` if the
/// rectangles do not share a seam long enough to host the door with wall
/// margins on both sides.
pub fn try_make_door(
    a: &Rect,
    b: &Rect,
    config: &DungeonConfig,
    rng: &mut LevelRng,
) -> Option<(Rect, Axis)> {
    let r = rng.next_f64();
    let seam = a.intersect(b)?;
    let wall = config.wall_width;
    let (door_w, door_h) = config.door_size;

    if seam.width > seam.height {
        if seam.width - 2 * wall < door_w {
            return None;
        }
        let lo = (seam.x + wall) as f64;
        let hi = (seam.right() - wall - door_w) as f64;
        let x = lerp(lo, hi, r).floor() as i32;
        Some((Rect::new(x, seam.y, door_w, door_h), Axis::Horizontal))
    } else {
        if seam.height - 2 * wall < door_h {
            return None;
        }
        let lo = (seam.y + wall) as f64;
        let hi = (seam.top() - wall - door_h) as f64;
        let y = lerp(lo, hi, r).floor() as i32;
        Some((Rect::new(seam.x, y, door_w, door_h), Axis::Vertical))
    }
}

/// Orientation of a seam, plus where it starts and how long it runs along
/// that orientation. Same rule as `try_make_door()`: wider than tall is
/// horizontal.
fn seam_span(seam: &Rect) -> (Axis, i32, i32) {
    if seam.width > seam.height {
        (Axis::Horizontal, seam.x, seam.width)
    } else {
        (Axis::Vertical, seam.y, seam.height)
    }
}

/// True when `a` and `b` share a seam with at least one cell clear of the
/// `wall_width` band at both of its ends. A door anywhere else on the seam
/// would only open into wall corners.
pub fn has_passage(a: &Rect, b: &Rect, wall_width: i32) -> bool {
    a.intersect(b)
        .is_some_and(|seam| seam_span(&seam).2 - 2 * wall_width >= 1)
}

/// Place a door on the seam of `a` and `b` without drawing from the RNG.
///
/// Used to move an existing door after a split. The door is centered on the
/// seam and may cover the wall margins; on a seam shorter than the door it
/// is shrunk along the seam. Always lies wholly on the seam and overlaps at
/// least one cell clear of the walls, or returns `None` when the seam has no
/// such cell.
pub fn fit_door(a: &Rect, b: &Rect, config: &DungeonConfig) -> Option<(Rect, Axis)> {
    let seam = a.intersect(b)?;
    let (axis, start, len) = seam_span(&seam);
    if len - 2 * config.wall_width < 1 {
        return None;
    }
    let (door_w, door_h) = config.door_size;
    Some(match axis {
        Axis::Horizontal => {
            let w = door_w.min(len);
            let x = start + (len - w) / 2;
            (Rect::new(x, seam.y, w, door_h), axis)
        }
        Axis::Vertical => {
            let h = door_h.min(len);
            let y = start + (len - h) / 2;
            (Rect::new(seam.x, y, door_w, h), axis)
        }
    })
}

/// Synthesize a door between two rooms of `graph` and attach it.
pub fn connect(
    graph: &mut RoomGraph,
    a: RoomId,
    b: RoomId,
    config: &DungeonConfig,
    rng: &mut LevelRng,
) -> Option<DoorId> {
    let rect_a = graph.room(a)?.rect;
    let rect_b = graph.room(b)?.rect;
    let (door, axis) = try_make_door(&rect_a, &rect_b, config, rng)?;
    Some(graph.add_door(a, b, door, axis))
}

// ---------------------------------------------------------------------------
// Triangulation adjacency
// ---------------------------------------------------------------------------

/// Disjoint-set forest over arena slots, with path halving.
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Merge the sets of `a` and `b`; false if they were already joined.
    fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        // Lower root wins so the forest shape does not depend on call order.
        let (lo, hi) = (ra.min(rb), ra.max(rb));
        self.parent[hi] = lo;
        true
    }
}

/// Replace seam doors with doors along Delaunay edges between room centers.
///
/// Partition doors are set aside, a door is synthesized for every
/// triangulation edge whose rooms share a feasible seam, and set-aside doors
/// are restored (in id order) only where they join two otherwise
/// disconnected components. Returns the number of triangulation doors placed.
pub fn doors_from_triangulation(
    graph: &mut RoomGraph,
    config: &DungeonConfig,
    rng: &mut LevelRng,
) -> usize {
    let rooms = graph.room_ids();
    let sites: Vec<_> = rooms
        .iter()
        .filter_map(|&id| graph.room(id).map(|node| node.center()))
        .collect();

    let set_aside: Vec<_> = graph
        .door_ids()
        .into_iter()
        .filter_map(|id| graph.remove_door(id))
        .collect();

    let triangulation = triangulate(&sites);
    let mut components = UnionFind::new(graph.room_capacity());
    let mut placed = 0;
    for &(i, j) in &triangulation.edges {
        let (a, b) = (rooms[i], rooms[j]);
        if connect(graph, a, b, config, rng).is_some() {
            components.union(a.index(), b.index());
            placed += 1;
        }
    }

    let mut restored = 0;
    for door in set_aside {
        let [a, b] = door.rooms;
        if components.union(a.index(), b.index()) {
            graph.add_door(a, b, door.rect, door.axis);
            restored += 1;
        }
    }

    debug!(
        edges = triangulation.edges.len(),
        placed, restored, "built doors from triangulation"
    );
    placed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_20() -> DungeonConfig {
        DungeonConfig {
            bounds: Rect::new(0, 0, 20, 20),
            min_room_size: (5, 5),
            wall_width: 1,
            door_size: (2, 1),
            ..DungeonConfig::default()
        }
    }

    #[test]
    fn horizontal_seam_door_stays_inside_margins() {
        let config = config_20();
        let below = Rect::new(0, 0, 20, 10);
        let above = Rect::new(0, 10, 20, 10);
        for seed in 0..50 {
            let mut rng = LevelRng::new(seed);
            let (door, axis) = try_make_door(&below, &above, &config, &mut rng).unwrap();
            assert_eq!(axis, Axis::Horizontal);
            assert_eq!(door.y, 10);
            assert_eq!((door.width, door.height), (2, 1));
            assert!(door.x >= 1, "door {door} too close to the left end");
            assert!(door.right() <= 19, "door {door} too close to the right end");
        }
    }

    #[test]
    fn vertical_seam_uses_heights() {
        let config = config_20();
        let left = Rect::new(0, 0, 10, 10);
        let right = Rect::new(10, 0, 10, 10);
        let mut rng = LevelRng::new(7);
        let (door, axis) = try_make_door(&left, &right, &config, &mut rng).unwrap();
        assert_eq!(axis, Axis::Vertical);
        assert_eq!(door.x, 10);
        assert!(door.y >= 1 && door.top() <= 9);
    }

    #[test]
    fn short_seam_is_rejected() {
        let config = config_20();
        // Shared edge of 3 cells: 3 - 2 * 1 < 2.
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(7, 10, 10, 10);
        let mut rng = LevelRng::new(1);
        assert_eq!(try_make_door(&a, &b, &config, &mut rng), None);
    }

    #[test]
    fn corner_touch_is_rejected() {
        let config = config_20();
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(10, 10, 10, 10);
        let mut rng = LevelRng::new(1);
        assert_eq!(try_make_door(&a, &b, &config, &mut rng), None);
    }

    #[test]
    fn rejection_still_consumes_one_draw() {
        let config = config_20();
        let a = Rect::new(0, 0, 10, 10);
        let far = Rect::new(50, 50, 10, 10);
        let mut rng = LevelRng::new(3);
        let mut reference = LevelRng::new(3);
        try_make_door(&a, &far, &config, &mut rng);
        reference.next_f64();
        assert_eq!(rng, reference);
    }

    #[test]
    fn triangulation_doors_keep_graph_connected() {
        let config = config_20();
        let mut graph = RoomGraph::new();
        let quads = [
            Rect::new(0, 0, 10, 10),
            Rect::new(10, 0, 10, 10),
            Rect::new(0, 10, 10, 10),
            Rect::new(10, 10, 10, 10),
        ];
        let ids: Vec<_> = quads.iter().map(|&r| graph.add_room(r)).collect();
        let mut rng = LevelRng::new(11);
        for (a, b) in [(0, 1), (2, 3), (0, 2), (1, 3)] {
            connect(&mut graph, ids[a], ids[b], &config, &mut rng).unwrap();
        }

        let placed = doors_from_triangulation(&mut graph, &config, &mut rng);
        // The diagonal edge has only a corner contact, so at most the four
        // side edges get doors.
        assert!(placed <= 4);
        assert!(graph.is_connected());
        assert!(graph.door_between(ids[0], ids[3]).is_none());
    }

    #[test]
    fn fitted_door_stays_on_a_short_seam() {
        let config = DungeonConfig {
            door_size: (2, 2),
            ..config_20()
        };
        // Vertical seam of 3 cells at x = 5, rows 7..10: too short for a
        // margined door, but its middle row is clear of both walls.
        let a = Rect::new(0, 0, 5, 10);
        let b = Rect::new(5, 7, 5, 10);
        assert_eq!(try_make_door(&a, &b, &config, &mut LevelRng::new(0)), None);
        assert!(has_passage(&a, &b, config.wall_width));

        let (door, axis) = fit_door(&a, &b, &config).unwrap();
        assert_eq!(axis, Axis::Vertical);
        assert_eq!(door, Rect::new(5, 7, 2, 2));
        assert!(door.y >= 7 && door.top() <= 10);
    }

    #[test]
    fn fitted_door_shrinks_along_the_seam() {
        let config = DungeonConfig {
            door_size: (4, 1),
            ..config_20()
        };
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(7, 10, 10, 10);
        let (door, axis) = fit_door(&a, &b, &config).unwrap();
        assert_eq!(axis, Axis::Horizontal);
        assert_eq!(door, Rect::new(7, 10, 3, 1));
    }

    #[test]
    fn seam_inside_the_walls_has_no_passage() {
        let config = config_20();
        // Two cells of shared edge are both wall band.
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(8, 10, 10, 10);
        assert!(!has_passage(&a, &b, config.wall_width));
        assert_eq!(fit_door(&a, &b, &config), None);

        let corner = Rect::new(10, 10, 10, 10);
        assert!(!has_passage(&a, &corner, config.wall_width));
    }

    #[test]
    fn union_find_merges_once() {
        let mut uf = UnionFind::new(4);
        assert!(uf.union(0, 1));
        assert!(uf.union(2, 3));
        assert!(!uf.union(1, 0));
        assert!(uf.union(1, 3));
        assert_eq!(uf.find(3), uf.find(0));
    }
}
