// Occupancy and room-index grids.
//
// `TileGrid` is the cell-level view of a level: for every cell inside
// `bounds` it stores a `CellKind` and the index of the room the cell belongs
// to (if any). Both arrays are row-major with the bottom row first. Cells
// outside `bounds` read as `Undefined` with no room.
//
// Grids come from two places: `raster.rs` fills one from a generated room
// graph, and `from_raw()` accepts external arrays in the plain integer
// encoding (occupancy: 0 floor, 1 wall, -1 undefined; room index: -1 for
// none). The ASCII dump prints the top row first so the picture has y up.
//
// See also: `raster.rs` for rasterization, `pathfinding.rs` which builds its
// tile layer from this grid.

use crate::error::{DungeonError, Result};
use crate::types::{CellKind, Rect};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileGrid {
    bounds: Rect,
    cells: Vec<CellKind>,
    rooms: Vec<Option<u32>>,
}

impl TileGrid {
    /// A grid covering `bounds` with every cell undefined and roomless.
    pub fn new(bounds: Rect) -> Self {
        let len = bounds.width.max(0) as usize * bounds.height.max(0) as usize;
        Self {
            bounds,
            cells: vec![CellKind::Undefined; len],
            rooms: vec![None; len],
        }
    }

    /// Build a grid from raw integer arrays (row-major, bottom row first).
    ///
    /// `room_count` is the number of rooms in the graph the grid will be
    /// paired with; room indices at or beyond it are rejected.
    pub fn from_raw(
        bounds: Rect,
        occupancy: &[i32],
        room_index: &[i32],
        room_count: usize,
    ) -> Result<Self> {
        let mut grid = Self::new(bounds);
        let expected = grid.cells.len();
        for actual in [occupancy.len(), room_index.len()] {
            if actual != expected {
                return Err(DungeonError::GridShape { expected, actual });
            }
        }

        for (i, (x, y)) in bounds.cells().enumerate() {
            let raw = occupancy[i];
            grid.cells[i] =
                CellKind::from_raw(raw).ok_or(DungeonError::BadCell { x, y, value: raw })?;

            grid.rooms[i] = match room_index[i] {
                -1 => None,
                n if n >= 0 && (n as usize) < room_count => Some(n as u32),
                n if n >= 0 => {
                    return Err(DungeonError::UnknownRoom {
                        x,
                        y,
                        index: n as u32,
                        rooms: room_count,
                    });
                }
                value => return Err(DungeonError::BadCell { x, y, value }),
            };
        }
        Ok(grid)
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn width(&self) -> i32 {
        self.bounds.width
    }

    pub fn height(&self) -> i32 {
        self.bounds.height
    }

    fn offset(&self, x: i32, y: i32) -> Option<usize> {
        if !self.bounds.contains_cell(x, y) {
            return None;
        }
        let col = (x - self.bounds.x) as usize;
        let row = (y - self.bounds.y) as usize;
        Some(row * self.bounds.width as usize + col)
    }

    pub fn cell(&self, x: i32, y: i32) -> CellKind {
        self.offset(x, y)
            .map_or(CellKind::Undefined, |i| self.cells[i])
    }

    pub fn room_at(&self, x: i32, y: i32) -> Option<u32> {
        self.offset(x, y).and_then(|i| self.rooms[i])
    }

    /// Set a cell's occupancy. Writes outside the bounds are ignored.
    pub fn set_cell(&mut self, x: i32, y: i32, kind: CellKind) {
        if let Some(i) = self.offset(x, y) {
            self.cells[i] = kind;
        }
    }

    pub fn set_room(&mut self, x: i32, y: i32, room: Option<u32>) {
        if let Some(i) = self.offset(x, y) {
            self.rooms[i] = room;
        }
    }

    pub fn is_floor(&self, x: i32, y: i32) -> bool {
        self.cell(x, y) == CellKind::Floor
    }

    pub fn count(&self, kind: CellKind) -> usize {
        self.cells.iter().filter(|&&c| c == kind).count()
    }

    /// Occupancy in the raw integer encoding, row-major, bottom row first.
    pub fn occupancy_raw(&self) -> Vec<i32> {
        self.cells.iter().map(|c| c.to_raw()).collect()
    }

    /// Room indices in the raw integer encoding (-1 for none).
    pub fn room_index_raw(&self) -> Vec<i32> {
        self.rooms
            .iter()
            .map(|r| r.map_or(-1, |i| i as i32))
            .collect()
    }

    /// Floor cells 4-connected to `start`, in breadth-first order. Empty if
    /// `start` is not a floor cell.
    pub fn flood_fill_floor(&self, start: (i32, i32)) -> Vec<(i32, i32)> {
        let Some(first) = self.offset(start.0, start.1) else {
            return Vec::new();
        };
        if self.cells[first] != CellKind::Floor {
            return Vec::new();
        }
        let mut seen = vec![false; self.cells.len()];
        let mut queue = VecDeque::from([start]);
        let mut order = Vec::new();
        seen[first] = true;
        while let Some((x, y)) = queue.pop_front() {
            order.push((x, y));
            for (nx, ny) in [(x + 1, y), (x - 1, y), (x, y + 1), (x, y - 1)] {
                if let Some(i) = self.offset(nx, ny)
                    && !seen[i]
                    && self.cells[i] == CellKind::Floor
                {
                    seen[i] = true;
                    queue.push_back((nx, ny));
                }
            }
        }
        order
    }

    /// ASCII picture with y up. `marks` override the glyph of given cells.
    pub fn render(&self, marks: &[(i32, i32, char)]) -> String {
        let mut out = String::with_capacity(self.cells.len() + self.height().max(0) as usize);
        for y in (self.bounds.y..self.bounds.top()).rev() {
            for x in self.bounds.x..self.bounds.right() {
                let glyph = marks
                    .iter()
                    .rev()
                    .find(|&&(mx, my, _)| mx == x && my == y)
                    .map_or_else(|| self.cell(x, y).glyph(), |&(_, _, c)| c);
                out.push(glyph);
            }
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for TileGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(&[]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_three() -> TileGrid {
        // Rows bottom to top: "#.#", "..#".
        TileGrid::from_raw(
            Rect::new(0, 0, 3, 2),
            &[1, 0, 1, 0, 0, 1],
            &[0, 0, 0, -1, 1, 1],
            2,
        )
        .unwrap()
    }

    #[test]
    fn from_raw_reads_cells_and_rooms() {
        let grid = two_by_three();
        assert_eq!(grid.cell(1, 0), CellKind::Floor);
        assert_eq!(grid.cell(2, 1), CellKind::Wall);
        assert_eq!(grid.room_at(0, 1), None);
        assert_eq!(grid.room_at(1, 1), Some(1));
        assert_eq!(grid.cell(-1, 0), CellKind::Undefined);
        assert_eq!(grid.room_at(5, 5), None);
    }

    #[test]
    fn raw_roundtrip() {
        let grid = two_by_three();
        assert_eq!(grid.occupancy_raw(), vec![1, 0, 1, 0, 0, 1]);
        assert_eq!(grid.room_index_raw(), vec![0, 0, 0, -1, 1, 1]);
    }

    #[test]
    fn from_raw_rejects_bad_input() {
        let bounds = Rect::new(0, 0, 2, 1);
        assert_eq!(
            TileGrid::from_raw(bounds, &[0, 0, 0], &[0, 0], 1),
            Err(DungeonError::GridShape {
                expected: 2,
                actual: 3
            })
        );
        assert_eq!(
            TileGrid::from_raw(bounds, &[0, 4], &[0, 0], 1),
            Err(DungeonError::BadCell { x: 1, y: 0, value: 4 })
        );
        assert_eq!(
            TileGrid::from_raw(bounds, &[0, 0], &[0, 3], 2),
            Err(DungeonError::UnknownRoom {
                x: 1,
                y: 0,
                index: 3,
                rooms: 2
            })
        );
    }

    #[test]
    fn render_is_y_up() {
        let grid = two_by_three();
        assert_eq!(grid.to_string(), "..#\n#.#\n");
        assert_eq!(grid.render(&[(0, 1, '*')]), "*.#\n#.#\n");
    }

    #[test]
    fn undefined_cells_render_as_at() {
        let grid = TileGrid::new(Rect::new(0, 0, 2, 1));
        assert_eq!(grid.to_string(), "@@\n");
        assert_eq!(grid.count(CellKind::Undefined), 2);
    }

    #[test]
    fn flood_fill_is_four_connected() {
        // Floor at (0,0) and (1,1) touch only diagonally.
        let grid = TileGrid::from_raw(
            Rect::new(0, 0, 2, 2),
            &[0, 1, 1, 0],
            &[0, 0, 0, 0],
            1,
        )
        .unwrap();
        assert_eq!(grid.flood_fill_floor((0, 0)), vec![(0, 0)]);
        assert!(grid.flood_fill_floor((1, 0)).is_empty());

        let grid = two_by_three();
        let mut filled = grid.flood_fill_floor((0, 1));
        filled.sort();
        assert_eq!(filled, vec![(0, 1), (1, 0), (1, 1)]);
    }

    #[test]
    fn writes_outside_bounds_are_ignored() {
        let mut grid = TileGrid::new(Rect::new(10, 10, 2, 2));
        grid.set_cell(0, 0, CellKind::Floor);
        grid.set_cell(11, 11, CellKind::Floor);
        grid.set_room(11, 11, Some(0));
        assert_eq!(grid.count(CellKind::Floor), 1);
        assert_eq!(grid.room_at(11, 11), Some(0));
        assert!(grid.is_floor(11, 11));
    }
}
