// Rasterization of a room graph into a `TileGrid`.
//
// Three passes over the grid, each over all rooms/doors in id order:
//   1. Room interiors: every cell of every room becomes floor and records the
//      room's index. Where rooms overlap (walls wider than one cell), the
//      later room wins.
//   2. Room outlines: a band `wall_width` cells thick along each room's
//      border becomes wall. The room index is left as is.
//   3. Door passages: each door rectangle grown by `wall_width` across its
//      seam is carved back to floor, opening the walls of both rooms.
// Cells no room covers stay undefined with no room index.
//
// The graph should be compacted first (`RoomGraph::compacted()`), so room
// indices in the grid are dense and line up with pathfinding groups.
//
// See also: `tilemap.rs` for the grid, `level.rs` which rasterizes right
// after the graph is finalized.

use crate::graph::RoomGraph;
use crate::tilemap::TileGrid;
use crate::types::{Axis, CellKind, Rect};
use tracing::debug;

/// The cells a door opens up: its rectangle extended by the wall width on
/// both sides of the seam.
pub fn door_passage(door: &Rect, axis: Axis, wall_width: i32) -> Rect {
    match axis {
        Axis::Horizontal => door.grow(0, wall_width),
        Axis::Vertical => door.grow(wall_width, 0),
    }
}

fn in_outline(rect: &Rect, x: i32, y: i32, wall_width: i32) -> bool {
    x < rect.x + wall_width
        || x >= rect.right() - wall_width
        || y < rect.y + wall_width
        || y >= rect.top() - wall_width
}

/// Rasterize `graph` over `bounds`.
pub fn rasterize(graph: &RoomGraph, bounds: Rect, wall_width: i32) -> TileGrid {
    let mut grid = TileGrid::new(bounds);

    for (id, node) in graph.rooms() {
        for (x, y) in node.rect.cells() {
            grid.set_cell(x, y, CellKind::Floor);
            grid.set_room(x, y, Some(id.0));
        }
    }

    for (_, node) in graph.rooms() {
        let rect = node.rect;
        for (x, y) in rect.cells() {
            if in_outline(&rect, x, y, wall_width) {
                grid.set_cell(x, y, CellKind::Wall);
            }
        }
    }

    for (_, door) in graph.doors() {
        let passage = door_passage(&door.rect, door.axis, wall_width);
        if let Some(clipped) = passage.overlap(&bounds) {
            for (x, y) in clipped.cells() {
                grid.set_cell(x, y, CellKind::Floor);
            }
        }
    }

    debug!(
        floor = grid.count(CellKind::Floor),
        wall = grid.count(CellKind::Wall),
        undefined = grid.count(CellKind::Undefined),
        "rasterized room graph"
    );
    grid
}
