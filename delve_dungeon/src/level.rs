// The generation pipeline and the generated level.
//
// `generate(config, seed)` runs the stages strictly in order:
//   1. validate the config
//   2. partition the bounds into rooms with seam doors (`partition.rs`)
//   3. optionally swap seam doors for triangulation doors (`doors.rs`)
//   4. prune small rooms (`prune.rs`)
//   5. optionally reduce doors to a spanning tree, drawing extra-door rolls
//      from a forked RNG stream
//   6. compact the graph, rasterize it (`raster.rs`), and build the
//      pathfinding map (`pathfinding.rs`)
// and returns a `Level` holding all of it. Any stage error aborts the run.
//
// `SharedLevel` is the regeneration handle for concurrent readers: queries
// grab an `Arc<Level>` snapshot, and a regeneration builds the new level off
// to the side and swaps the pointer, so no reader ever sees a half-built
// level.
//
// See also: `config.rs` for every tunable used here, `lib.rs` for the module
// map.
//
// **Critical constraint: determinism.** `generate()` is a pure function of
// `(config, seed)`. All randomness comes from one `LevelRng` seeded here.

use crate::config::{AdjacencyStrategy, DungeonConfig};
use crate::doors::doors_from_triangulation;
use crate::error::Result;
use crate::graph::RoomGraph;
use crate::partition;
use crate::pathfinding::{PathFindingMap, PathMode};
use crate::prune::{prune_small_rooms, reduce_to_spanning_tree};
use crate::raster::rasterize;
use crate::tilemap::TileGrid;
use crate::types::{RoomId, Vec2};
use delve_prng::LevelRng;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// One generated dungeon level.
#[derive(Clone, Debug)]
pub struct Level {
    pub config: DungeonConfig,
    pub seed: u64,
    /// Compacted: room ids are dense and match grid room indices.
    pub graph: RoomGraph,
    pub grid: TileGrid,
    pub map: PathFindingMap,
}

impl Level {
    pub fn find_path(&self, start: Vec2, end: Vec2, mode: PathMode) -> Vec<Vec2> {
        self.map.find_path(start, end, mode)
    }

    pub fn find_paths(&self, queries: &[(Vec2, Vec2)], mode: PathMode) -> Vec<Vec<Vec2>> {
        self.map.find_paths(queries, mode)
    }

    /// Center of a room, e.g. as a path query endpoint.
    pub fn room_center(&self, room: RoomId) -> Option<Vec2> {
        self.graph.room(room).map(|node| node.center())
    }

    /// The room owning the cell under `pos`.
    pub fn room_at(&self, pos: Vec2) -> Option<RoomId> {
        let (x, y) = pos.cell();
        self.grid.room_at(x, y).map(RoomId)
    }
}

/// Generate a level from `config` and `seed`.
pub fn generate(config: &DungeonConfig, seed: u64) -> Result<Level> {
    config.validate()?;
    let mut rng = LevelRng::new(seed);

    let mut graph = partition::split(config.bounds, config, &mut rng);

    if config.adjacency == AdjacencyStrategy::Triangulation {
        doors_from_triangulation(&mut graph, config, &mut rng);
    }

    if graph.room_count() > 1 {
        prune_small_rooms(&mut graph, config.small_room_removal_percent)?;
    } else {
        debug!("single room, skipping pruning");
    }

    if config.reduce_to_spanning_tree && graph.room_count() > 1 {
        let mut extra_rng = rng.fork();
        reduce_to_spanning_tree(&mut graph, config.extra_door_chance, &mut extra_rng)?;
    }

    let graph = graph.compacted();
    let grid = rasterize(&graph, config.bounds, config.wall_width);
    let map = PathFindingMap::build(&grid, &graph)?;

    info!(
        seed,
        rooms = graph.room_count(),
        doors = graph.door_count(),
        tiles = map.tiles().len(),
        "generated level"
    );
    Ok(Level {
        config: config.clone(),
        seed,
        graph,
        grid,
        map,
    })
}

/// A level that can be swapped out while other threads query it.
#[derive(Debug)]
pub struct SharedLevel {
    current: RwLock<Arc<Level>>,
}

impl SharedLevel {
    pub fn new(level: Level) -> Self {
        Self {
            current: RwLock::new(Arc::new(level)),
        }
    }

    /// The level as of now. Later swaps do not affect the returned snapshot.
    pub fn snapshot(&self) -> Arc<Level> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Install `level`, returning the one it replaced.
    pub fn replace(&self, level: Level) -> Arc<Level> {
        self.install(Arc::new(level))
    }

    /// Generate a fresh level and swap it in, returning the level this call
    /// installed (not whatever another writer may have installed since). On
    /// error the current level stays in place.
    pub fn regenerate(&self, config: &DungeonConfig, seed: u64) -> Result<Arc<Level>> {
        let level = Arc::new(generate(config, seed)?);
        self.install(Arc::clone(&level));
        Ok(level)
    }

    fn install(&self, next: Arc<Level>) -> Arc<Level> {
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        std::mem::replace(&mut *guard, next)
    }
}
