// Error type for the generation pipeline.
//
// Only invariant violations are errors: a bad config, a pruning or spanning
// pass asked to work on a degenerate graph, or externally supplied grids that
// do not match the room graph. Geometric rejections (a split that would make
// undersized rooms, a seam too narrow for a door) and pathfinding misses are
// normal outcomes and are expressed as `Option` / empty paths instead.
//
// See also: `config.rs` for `DungeonConfig::validate()`, `prune.rs` for
// `LastRoom` / `EmptyDoorSet`, `tilemap.rs` for the grid shape checks.

use thiserror::Error;

/// Convenient result alias for the dungeon library.
pub type Result<T> = std::result::Result<T, DungeonError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DungeonError {
    /// The generation settings cannot produce a well-formed level.
    #[error("invalid dungeon config: {reason}")]
    InvalidConfig { reason: String },

    /// Pruning was asked to remove rooms from a graph that has at most one.
    #[error("cannot prune rooms from a graph with {rooms} room(s)")]
    LastRoom { rooms: usize },

    /// Spanning-tree reduction was asked to run on a graph without doors.
    #[error("spanning-tree reduction needs at least one door ({rooms} rooms, 0 doors)")]
    EmptyDoorSet { rooms: usize },

    /// Occupancy or room-index data does not match the declared grid size.
    #[error("grid data has {actual} cells, expected {expected}")]
    GridShape { expected: usize, actual: usize },

    /// A raw grid value is outside the accepted encoding.
    #[error("cell ({x}, {y}) holds unrecognized value {value}")]
    BadCell { x: i32, y: i32, value: i32 },

    /// The room-index grid names a room the graph does not have.
    #[error("cell ({x}, {y}) names room {index}, but the graph has {rooms} rooms")]
    UnknownRoom {
        x: i32,
        y: i32,
        index: u32,
        rooms: usize,
    },
}

impl DungeonError {
    pub(crate) fn config(reason: impl Into<String>) -> Self {
        DungeonError::InvalidConfig {
            reason: reason.into(),
        }
    }
}
