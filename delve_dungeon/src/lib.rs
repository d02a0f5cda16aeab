// delve_dungeon: dungeon topology generation and hierarchical pathfinding.
//
// This crate turns a bounding rectangle and a seed into a connected level of
// rectangular rooms joined by doors, rasterizes it into an occupancy grid,
// and answers shortest-path queries over it at room and tile granularity.
// It has no rendering or engine dependencies and can be tested, benchmarked,
// and run headless (see the `delve` binary in `delve_cli`).
//
// Module overview:
// - `level.rs`:       `generate()` pipeline, `Level`, `SharedLevel` (swap-on-regenerate handle).
// - `config.rs`:      `DungeonConfig`: every tunable, JSON loading, validation.
// - `partition.rs`:   BSP splitting of the bounds with door inheritance.
// - `doors.rs`:       Seam door placement + the triangulation adjacency strategy.
// - `triangulate.rs`: Bowyer–Watson Delaunay triangulation over room centers.
// - `prune.rs`:       Connectivity-preserving small-room removal + minimum spanning tree.
// - `graph.rs`:       `RoomGraph` arena of rooms and doors.
// - `raster.rs`:      Room graph to occupancy/room-index grid.
// - `tilemap.rs`:     `TileGrid`, raw grid import, ASCII dump, flood fill.
// - `pathfinding.rs`: `PathFindingMap`: groups, tiles, grouped and flat queries.
// - `search.rs`:      Generic A* shared by both pathfinding layers.
// - `error.rs`:       `DungeonError` and the `Result` alias.
// - `prng`:           Re-exported from `delve_prng`, xoshiro256++ PRNG with SplitMix64 seeding.
// - `types.rs`:       `Rect`, `Vec2`, `Axis`, arena ids, `CellKind`.
//
// **Critical constraint: determinism.** Generation is a pure function of
// `(config, seed)`. All randomness comes from a seeded `LevelRng`; no OS
// entropy, no system time, and no iteration over std hash maps.

pub mod config;
pub mod doors;
pub mod error;
pub mod graph;
pub mod level;
pub mod partition;
pub mod pathfinding;
pub use delve_prng as prng;
pub mod prune;
pub mod raster;
pub mod search;
pub mod tilemap;
pub mod triangulate;
pub mod types;

pub use config::{AdjacencyStrategy, DungeonConfig};
pub use error::{DungeonError, Result};
pub use graph::{DoorEdge, RoomGraph, RoomNode};
pub use level::{Level, SharedLevel, generate};
pub use pathfinding::{PathFindingMap, PathMode};
pub use tilemap::TileGrid;
pub use types::{Axis, CellKind, DoorId, GroupId, Rect, RoomId, TileId, Vec2};
