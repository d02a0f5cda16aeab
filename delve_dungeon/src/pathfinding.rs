// Two-level pathfinding over a generated (or externally supplied) level.
//
// `PathFindingMap` mirrors the room graph at two granularities:
//   - Groups: one per room, positioned at the room center, linked to the
//     groups of neighboring rooms. Each link carries the door rectangle the
//     two rooms share.
//   - Tiles: one per grid cell that belongs to a room, positioned at the
//     cell center, walkable iff the cell is floor. Tiles link to each of
//     their 8 neighbor cells that also has a tile (looked up through the
//     neighbor cell's own group), so links cross room borders freely.
//
// `find_path()` snaps both endpoints to the nearest walkable tile, then
// either searches the tile layer directly (`PathMode::Flat`) or first
// searches the group layer for a room sequence, picks one door tile per room
// transition, and stitches tile-layer searches between consecutive waypoints
// (`PathMode::Grouped`). Grouped mode keeps every tile search short, since
// each segment only has to cross one room.
//
// The map is immutable once built; queries take `&self` and batch queries
// run on rayon's pool.
//
// See also: `search.rs` for the A* both layers use, `tilemap.rs` for the
// grid, `graph.rs` for the room graph, `level.rs` which builds the map for a
// generated level.
//
// **Critical constraint: determinism.** Tiles are created in grid order and
// neighbors in a fixed direction order, so ids and tie-breaks are stable.

use crate::error::{DungeonError, Result};
use crate::graph::RoomGraph;
use crate::search::{SearchSpace, astar};
use crate::tilemap::TileGrid;
use crate::types::{CellKind, GroupId, Rect, RoomId, TileId, Vec2};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::{debug, trace, warn};

/// Neighbor offsets: the four sides, then the four diagonals.
const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (0, -1),
    (0, 1),
    (-1, 0),
    (1, 0),
    (1, -1),
    (1, 1),
    (-1, -1),
    (-1, 1),
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathMode {
    /// Room-level search first, then short tile searches between doors.
    #[default]
    Grouped,
    /// A single tile-level search from start to end.
    Flat,
}

#[derive(Clone, Debug)]
pub struct Tile {
    pub position: Vec2,
    pub cell: (i32, i32),
    pub walkable: bool,
    pub group: GroupId,
    pub neighbors: SmallVec<[TileId; 8]>,
}

/// A link to a neighboring group through a shared door.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroupLink {
    pub group: GroupId,
    pub door: Rect,
}

#[derive(Clone, Debug)]
pub struct Group {
    pub position: Vec2,
    pub room: RoomId,
    pub tiles: Vec<TileId>,
    pub links: SmallVec<[GroupLink; 4]>,
    by_cell: FxHashMap<(i32, i32), TileId>,
}

impl Group {
    /// The tile of this group covering world position `pos`, if any.
    pub fn tile_at(&self, pos: Vec2) -> Option<TileId> {
        self.tile_at_cell(pos.cell())
    }

    pub fn tile_at_cell(&self, cell: (i32, i32)) -> Option<TileId> {
        self.by_cell.get(&cell).copied()
    }
}

#[derive(Clone, Debug)]
pub struct PathFindingMap {
    groups: Vec<Group>,
    tiles: Vec<Tile>,
    bounds: Rect,
    /// Owning group per grid cell, row-major like the grid.
    cell_groups: Vec<Option<GroupId>>,
}

impl PathFindingMap {
    /// Build both layers from a grid and the room graph it was rasterized
    /// from. Grid room indices are room ids in `graph`.
    pub fn build(grid: &TileGrid, graph: &RoomGraph) -> Result<Self> {
        let mut room_groups: Vec<Option<GroupId>> = vec![None; graph.room_capacity()];
        let mut groups = Vec::with_capacity(graph.room_count());
        for (room, node) in graph.rooms() {
            room_groups[room.index()] = Some(GroupId(groups.len() as u32));
            groups.push(Group {
                position: node.center(),
                room,
                tiles: Vec::new(),
                links: SmallVec::new(),
                by_cell: FxHashMap::default(),
            });
        }

        for (_, door) in graph.doors() {
            let [a, b] = door.rooms;
            if let (Some(ga), Some(gb)) = (room_groups[a.index()], room_groups[b.index()]) {
                groups[ga.index()].links.push(GroupLink {
                    group: gb,
                    door: door.rect,
                });
                groups[gb.index()].links.push(GroupLink {
                    group: ga,
                    door: door.rect,
                });
            }
        }

        let bounds = grid.bounds();
        let mut tiles = Vec::new();
        let mut cell_groups = Vec::with_capacity(bounds.area().max(0) as usize);
        let mut orphan_floor = 0usize;
        for (x, y) in bounds.cells() {
            let Some(index) = grid.room_at(x, y) else {
                if grid.is_floor(x, y) {
                    orphan_floor += 1;
                }
                cell_groups.push(None);
                continue;
            };
            let group = room_groups
                .get(index as usize)
                .copied()
                .flatten()
                .ok_or_else(|| DungeonError::UnknownRoom {
                    x,
                    y,
                    index,
                    rooms: graph.room_count(),
                })?;
            let id = TileId(tiles.len() as u32);
            tiles.push(Tile {
                position: Vec2::cell_center(x, y),
                cell: (x, y),
                walkable: grid.cell(x, y) == CellKind::Floor,
                group,
                neighbors: SmallVec::new(),
            });
            let owner = &mut groups[group.index()];
            owner.tiles.push(id);
            owner.by_cell.insert((x, y), id);
            cell_groups.push(Some(group));
        }

        if orphan_floor > 0 {
            warn!(
                cells = orphan_floor,
                "floor cells without a room are not walkable"
            );
        }

        let mut map = Self {
            groups,
            tiles,
            bounds,
            cell_groups,
        };
        for i in 0..map.tiles.len() {
            let (x, y) = map.tiles[i].cell;
            let neighbors: SmallVec<[TileId; 8]> = NEIGHBOR_OFFSETS
                .iter()
                .filter_map(|&(dx, dy)| map.tile_at_cell((x + dx, y + dy)))
                .collect();
            map.tiles[i].neighbors = neighbors;
        }

        debug!(
            groups = map.groups.len(),
            tiles = map.tiles.len(),
            walkable = map.tiles.iter().filter(|t| t.walkable).count(),
            "built pathfinding map"
        );
        Ok(map)
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn group(&self, id: GroupId) -> &Group {
        &self.groups[id.index()]
    }

    pub fn tile(&self, id: TileId) -> &Tile {
        &self.tiles[id.index()]
    }

    /// The group whose position (room center) equals `center`.
    pub fn group_by_center(&self, center: Vec2) -> Option<GroupId> {
        self.groups
            .iter()
            .position(|g| g.position == center)
            .map(|i| GroupId(i as u32))
    }

    pub fn group_at_cell(&self, (x, y): (i32, i32)) -> Option<GroupId> {
        if !self.bounds.contains_cell(x, y) {
            return None;
        }
        let col = (x - self.bounds.x) as usize;
        let row = (y - self.bounds.y) as usize;
        self.cell_groups[row * self.bounds.width as usize + col]
    }

    /// The group owning the cell under world position `pos`.
    pub fn group_at(&self, pos: Vec2) -> Option<GroupId> {
        self.group_at_cell(pos.cell())
    }

    pub fn tile_at_cell(&self, cell: (i32, i32)) -> Option<TileId> {
        let group = self.group_at_cell(cell)?;
        self.group(group).tile_at_cell(cell)
    }

    /// Nearest walkable tile to `pos` by straight-line distance; ties go to
    /// the lowest tile id.
    pub fn nearest_walkable_tile(&self, pos: Vec2) -> Option<TileId> {
        let mut best: Option<(f64, usize)> = None;
        for (i, tile) in self.tiles.iter().enumerate() {
            if !tile.walkable {
                continue;
            }
            let d = tile.position.distance_squared(pos);
            if best.is_none_or(|(bd, _)| d < bd) {
                best = Some((d, i));
            }
        }
        best.map(|(_, i)| TileId(i as u32))
    }

    /// First walkable tile inside a door rectangle, scanning from its origin.
    fn door_tile(&self, door: &Rect) -> Option<TileId> {
        door.cells()
            .filter_map(|cell| self.tile_at_cell(cell))
            .find(|&t| self.tile(t).walkable)
    }

    /// Shortest route from `start` to `end` as tile-center waypoints. Empty
    /// when either position lies outside every room or no route exists.
    pub fn find_path(&self, start: Vec2, end: Vec2, mode: PathMode) -> Vec<Vec2> {
        if self.group_at(start).is_none() || self.group_at(end).is_none() {
            trace!(%start, %end, "path endpoint outside every room");
            return Vec::new();
        }
        let (Some(from), Some(to)) = (
            self.nearest_walkable_tile(start),
            self.nearest_walkable_tile(end),
        ) else {
            return Vec::new();
        };
        if from == to {
            return vec![self.tile(from).position];
        }

        let tiles = match mode {
            PathMode::Flat => self.tile_route(from, to),
            PathMode::Grouped => self.grouped_route(from, to),
        };
        tiles
            .unwrap_or_default()
            .into_iter()
            .map(|t| self.tile(t).position)
            .collect()
    }

    /// Answer many queries in parallel. Results line up with `queries`.
    pub fn find_paths(&self, queries: &[(Vec2, Vec2)], mode: PathMode) -> Vec<Vec<Vec2>> {
        queries
            .par_iter()
            .map(|&(start, end)| self.find_path(start, end, mode))
            .collect()
    }

    fn tile_route(&self, from: TileId, to: TileId) -> Option<Vec<TileId>> {
        let result = astar(&TileLayer(self), from.index(), to.index())?;
        trace!(
            from = %from,
            to = %to,
            expanded = result.expanded,
            "tile search"
        );
        Some(result.nodes.into_iter().map(|i| TileId(i as u32)).collect())
    }

    fn grouped_route(&self, from: TileId, to: TileId) -> Option<Vec<TileId>> {
        let start_group = self.tile(from).group;
        let end_group = self.tile(to).group;
        let rooms = astar(&GroupLayer(self), start_group.index(), end_group.index())?;
        trace!(rooms = rooms.nodes.len(), "group search");

        let mut waypoints = vec![from];
        for pair in rooms.nodes.windows(2) {
            let (a, b) = (GroupId(pair[0] as u32), GroupId(pair[1] as u32));
            let link = self.group(a).links.iter().find(|l| l.group == b)?;
            let Some(door) = self.door_tile(&link.door) else {
                warn!(door = %link.door, from = %a, to = %b, "door has no walkable tile");
                return None;
            };
            waypoints.push(door);
        }
        waypoints.push(to);

        let mut route: Vec<TileId> = vec![from];
        for leg in waypoints.windows(2) {
            let segment = self.tile_route(leg[0], leg[1])?;
            // Each segment starts where the previous one ended.
            route.extend(segment.into_iter().skip(1));
        }
        Some(route)
    }
}

// ---------------------------------------------------------------------------
// Search layers
// ---------------------------------------------------------------------------

struct TileLayer<'a>(&'a PathFindingMap);

impl SearchSpace for TileLayer<'_> {
    fn node_count(&self) -> usize {
        self.0.tiles.len()
    }

    fn neighbors(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.0.tiles[node].neighbors.iter().map(|t| t.index())
    }

    fn cost(&self, from: usize, to: usize) -> f64 {
        self.0.tiles[from]
            .position
            .distance(self.0.tiles[to].position)
    }

    fn heuristic(&self, node: usize, goal: usize) -> f64 {
        self.cost(node, goal)
    }

    fn expandable(&self, node: usize) -> bool {
        self.0.tiles[node].walkable
    }
}

struct GroupLayer<'a>(&'a PathFindingMap);

impl SearchSpace for GroupLayer<'_> {
    fn node_count(&self) -> usize {
        self.0.groups.len()
    }

    fn neighbors(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.0.groups[node].links.iter().map(|l| l.group.index())
    }

    fn cost(&self, from: usize, to: usize) -> f64 {
        self.0.groups[from]
            .position
            .distance(self.0.groups[to].position)
    }

    fn heuristic(&self, node: usize, goal: usize) -> f64 {
        self.cost(node, goal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::rasterize;
    use crate::types::{Axis, DoorId};

    const BOUNDS: Rect = Rect::new(0, 0, 12, 5);

    /// Two 6x5 rooms side by side with a one-cell door on row 2.
    fn pair() -> RoomGraph {
        let mut graph = RoomGraph::new();
        let a = graph.add_room(Rect::new(0, 0, 6, 5));
        let b = graph.add_room(Rect::new(6, 0, 6, 5));
        graph.add_door(a, b, Rect::new(6, 2, 1, 1), Axis::Vertical);
        graph
    }

    fn pair_map() -> PathFindingMap {
        let graph = pair();
        let grid = rasterize(&graph, BOUNDS, 1);
        PathFindingMap::build(&grid, &graph).unwrap()
    }

    fn length(path: &[Vec2]) -> f64 {
        path.windows(2).map(|w| w[0].distance(w[1])).sum()
    }

    fn assert_steps_adjacent(map: &PathFindingMap, path: &[Vec2]) {
        for w in path.windows(2) {
            assert!(w[0].distance(w[1]) < 1.5, "jump from {} to {}", w[0], w[1]);
        }
        for p in path {
            let tile = map.tile_at_cell(p.cell()).unwrap();
            assert!(map.tile(tile).walkable, "{p} is not walkable");
        }
    }

    #[test]
    fn build_mirrors_rooms_and_doors() {
        let map = pair_map();
        assert_eq!(map.groups().len(), 2);
        assert_eq!(map.tiles().len(), 60);
        assert_eq!(map.group(GroupId(0)).tiles.len(), 30);
        assert_eq!(
            map.group(GroupId(0)).links.as_slice(),
            &[GroupLink {
                group: GroupId(1),
                door: Rect::new(6, 2, 1, 1)
            }]
        );
        assert_eq!(map.group_by_center(Vec2::new(9.0, 2.5)), Some(GroupId(1)));
        assert_eq!(map.group_at(Vec2::new(6.5, 2.5)), Some(GroupId(1)));

        // Corner tile has three neighbors, interior tiles eight, and links
        // cross the room border.
        let corner = map.tile_at_cell((0, 0)).unwrap();
        assert_eq!(map.tile(corner).neighbors.len(), 3);
        let inner = map.tile_at_cell((5, 2)).unwrap();
        assert_eq!(map.tile(inner).neighbors.len(), 8);
        let across = map.tile_at_cell((6, 2)).unwrap();
        assert!(map.tile(inner).neighbors.contains(&across));
    }

    #[test]
    fn outside_position_yields_empty_path() {
        let map = pair_map();
        let inside = Vec2::new(2.5, 2.5);
        for mode in [PathMode::Grouped, PathMode::Flat] {
            assert!(map.find_path(Vec2::new(50.0, 50.0), inside, mode).is_empty());
            assert!(map.find_path(inside, Vec2::new(-1.0, 2.0), mode).is_empty());
        }
    }

    #[test]
    fn same_tile_is_single_point() {
        let map = pair_map();
        let a = Vec2::new(2.5, 2.5);
        assert_eq!(map.find_path(a, a, PathMode::Grouped), vec![a]);
        assert_eq!(map.find_path(a, a, PathMode::Flat), vec![a]);
        // A wall cell snaps to the nearest floor tile.
        assert_eq!(
            map.find_path(Vec2::new(0.5, 0.5), Vec2::new(1.5, 1.5), PathMode::Flat),
            vec![Vec2::new(1.5, 1.5)]
        );
    }

    #[test]
    fn grouped_route_passes_through_door() {
        let map = pair_map();
        let start = Vec2::new(1.5, 3.5);
        let end = Vec2::new(10.5, 1.5);
        let path = map.find_path(start, end, PathMode::Grouped);
        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&end));
        assert!(path.contains(&Vec2::new(6.5, 2.5)));
        assert_steps_adjacent(&map, &path);
        // No duplicated joints.
        assert!(path.windows(2).all(|w| w[0] != w[1]));
    }

    #[test]
    fn grouped_and_flat_agree_on_length() {
        let map = pair_map();
        let start = Vec2::new(1.5, 1.5);
        let end = Vec2::new(10.5, 3.5);
        let grouped = map.find_path(start, end, PathMode::Grouped);
        let flat = map.find_path(start, end, PathMode::Flat);
        assert_steps_adjacent(&map, &flat);
        assert!((length(&grouped) - length(&flat)).abs() < 1e-9);
    }

    #[test]
    fn flat_route_is_direction_symmetric() {
        let map = pair_map();
        let a = Vec2::new(2.5, 1.5);
        let b = Vec2::new(9.5, 3.5);
        let there = map.find_path(a, b, PathMode::Flat);
        let back = map.find_path(b, a, PathMode::Flat);
        assert!(!there.is_empty());
        assert!((length(&there) - length(&back)).abs() < 1e-9);
    }

    #[test]
    fn sealed_rooms_have_no_route() {
        let mut graph = pair();
        graph.remove_door(DoorId(0));
        let grid = rasterize(&graph, BOUNDS, 1);
        let map = PathFindingMap::build(&grid, &graph).unwrap();
        let (a, b) = (Vec2::new(2.5, 2.5), Vec2::new(9.5, 2.5));
        assert!(map.find_path(a, b, PathMode::Grouped).is_empty());
        assert!(map.find_path(a, b, PathMode::Flat).is_empty());
    }

    #[test]
    fn door_without_walkable_tile_fails_grouped_query() {
        // The graph says there is a door, but the grid was carved without it.
        let graph = pair();
        let mut sealed = graph.clone();
        sealed.remove_door(DoorId(0));
        let grid = rasterize(&sealed, BOUNDS, 1);
        let map = PathFindingMap::build(&grid, &graph).unwrap();
        let (a, b) = (Vec2::new(2.5, 2.5), Vec2::new(9.5, 2.5));
        assert!(map.find_path(a, b, PathMode::Grouped).is_empty());
    }

    #[test]
    fn batch_matches_single_queries() {
        let map = pair_map();
        let queries = vec![
            (Vec2::new(1.5, 1.5), Vec2::new(10.5, 3.5)),
            (Vec2::new(4.5, 3.5), Vec2::new(4.5, 3.5)),
            (Vec2::new(30.0, 1.0), Vec2::new(1.5, 1.5)),
        ];
        let batch = map.find_paths(&queries, PathMode::Grouped);
        for (result, &(s, e)) in batch.iter().zip(&queries) {
            assert_eq!(result, &map.find_path(s, e, PathMode::Grouped));
        }
    }

    #[test]
    fn external_grid_with_unknown_room_is_rejected() {
        let graph = pair();
        let grid = rasterize(&graph, BOUNDS, 1);
        let mut one_room = RoomGraph::new();
        one_room.add_room(Rect::new(0, 0, 6, 5));
        assert!(matches!(
            PathFindingMap::build(&grid, &one_room),
            Err(DungeonError::UnknownRoom { index: 1, .. })
        ));
    }
}
