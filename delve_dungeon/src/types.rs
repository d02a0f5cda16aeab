// Core types shared across the dungeon pipeline.
//
// Defines integer rectangles (`Rect`, used for the dungeon bounds, rooms,
// doors, and seams), float points (`Vec2`, used for room centers, triangulation
// sites, and tile positions), the split/seam `Axis`, compact arena indices
// (`RoomId`, `DoorId`, `GroupId`, `TileId`), and the occupancy `CellKind`.
// All types derive `Serialize` and `Deserialize` so a generated level can be
// dumped as JSON for external rasterizers and renderers.
//
// **Critical constraint: determinism.** All geometry that decides topology is
// integer. Floats only appear in distances, centers, and the triangulator.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Spatial types
// ---------------------------------------------------------------------------

/// An axis-aligned integer rectangle: origin `(x, y)` plus `width`/`height`.
///
/// Cells covered are `x..x + width` by `y..y + height`. The y axis points up
/// (the ASCII dump in `tilemap.rs` prints the top row first).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Exclusive top edge.
    pub const fn top(&self) -> i32 {
        self.y + self.height
    }

    pub const fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    /// True when the rectangle covers no cells.
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Geometric center in world units.
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }

    /// Intersection of two rectangles, including zero-thickness results.
    ///
    /// Two rooms that touch edge to edge produce a degenerate seam (height 0
    /// for a horizontal border, width 0 for a vertical one). Disjoint
    /// rectangles and corner-only contact return `None`.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.top().min(other.top());
        let width = x1 - x0;
        let height = y1 - y0;
        if width < 0 || height < 0 || (width == 0 && height == 0) {
            None
        } else {
            Some(Rect::new(x0, y0, width, height))
        }
    }

    /// Intersection restricted to results that cover at least one cell.
    pub fn overlap(&self, other: &Rect) -> Option<Rect> {
        self.intersect(other).filter(|r| !r.is_empty())
    }

    /// Grow (or shrink, for negative values) by `dx` on the left and right
    /// and `dy` on the bottom and top.
    pub const fn grow(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(
            self.x - dx,
            self.y - dy,
            self.width + 2 * dx,
            self.height + 2 * dy,
        )
    }

    pub const fn contains_cell(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.top()
    }

    /// Iterate covered cells, rows bottom to top, x inner.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + use<> {
        let (x0, x1) = (self.x, self.right());
        (self.y..self.top()).flat_map(move |y| (x0..x1).map(move |x| (x, y)))
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {} {}x{}]",
            self.x, self.y, self.width, self.height
        )
    }
}

/// A point in world units. Room centers, triangulation sites, and tile
/// positions (cell centers, `cell + 0.5`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    pub fn length_squared(self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    /// The grid cell this point falls in (floor of each component).
    pub fn cell(self) -> (i32, i32) {
        (self.x.floor() as i32, self.y.floor() as i32)
    }

    /// Center of the given grid cell.
    pub fn cell_center(x: i32, y: i32) -> Self {
        Self::new(x as f64 + 0.5, y as f64 + 0.5)
    }
}

impl fmt::Display for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

/// Linear interpolation between `a` and `b`; `t` is clamped to [0, 1].
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t.clamp(0.0, 1.0)
}

/// Orientation of a split line or a seam.
///
/// A `Horizontal` split cuts the rectangle with a horizontal line (the two
/// children stack vertically) and yields a `Horizontal` seam, which is wider
/// than it is tall.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    pub const fn flipped(self) -> Self {
        match self {
            Axis::Horizontal => Axis::Vertical,
            Axis::Vertical => Axis::Horizontal,
        }
    }
}

// ---------------------------------------------------------------------------
// Arena indices
// ---------------------------------------------------------------------------

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl $name {
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

arena_id!(/// Slot index of a room in a `RoomGraph`.
RoomId);
arena_id!(/// Slot index of a door in a `RoomGraph`.
DoorId);
arena_id!(/// Index of a group (room mirror) in a `PathFindingMap`.
GroupId);
arena_id!(/// Index of a tile in a `PathFindingMap`.
TileId);

// ---------------------------------------------------------------------------
// Occupancy
// ---------------------------------------------------------------------------

/// What a rasterized cell holds. Raw values match the external grid format:
/// floor = 0, wall = 1, undefined = -1.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    Floor,
    Wall,
    #[default]
    Undefined,
}

impl CellKind {
    pub const fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(CellKind::Floor),
            1 => Some(CellKind::Wall),
            -1 => Some(CellKind::Undefined),
            _ => None,
        }
    }

    pub const fn to_raw(self) -> i32 {
        match self {
            CellKind::Floor => 0,
            CellKind::Wall => 1,
            CellKind::Undefined => -1,
        }
    }

    pub const fn glyph(self) -> char {
        match self {
            CellKind::Floor => '.',
            CellKind::Wall => '#',
            CellKind::Undefined => '@',
        }
    }
}
