// Room/door graph produced by the generation pipeline.
//
// Rooms and doors live in two arenas (`Vec<Option<_>>`) indexed by `RoomId`
// and `DoorId`. Removing a room or door tombstones its slot so every other id
// stays valid while partitioning and pruning mutate the graph. Once the
// pipeline is done, `compacted()` renumbers the survivors densely (in slot
// order), which is the form handed to the rasterizer and the pathfinder.
//
// A door is an undirected edge: it names both rooms it joins and each room
// lists the door in its `doors`. At most one door per room pair is expected
// but not enforced here; `door_between()` returns the lowest-id match.
//
// See also: `partition.rs` and `doors.rs` which build the graph, `prune.rs`
// which removes rooms and doors, `raster.rs` and `pathfinding.rs` which
// consume the compacted graph.
//
// **Critical constraint: determinism.** Ids are assigned sequentially and
// every iteration below walks slots in id order. No hash maps.

use crate::types::{Axis, DoorId, Rect, RoomId, Vec2};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::VecDeque;

/// A rectangular room and the doors attached to it, in attachment order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoomNode {
    pub rect: Rect,
    pub doors: SmallVec<[DoorId; 4]>,
}

impl RoomNode {
    pub fn center(&self) -> Vec2 {
        self.rect.center()
    }
}

/// A door rectangle joining exactly two rooms.
///
/// Equality treats `rooms` as an unordered pair: a door from `a` to `b` is
/// the same door as one from `b` to `a` with the same rectangle and axis.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DoorEdge {
    pub rect: Rect,
    /// Orientation of the seam the door was placed on.
    pub axis: Axis,
    pub rooms: [RoomId; 2],
}

impl DoorEdge {
    /// The endpoint that is not `room`. Returns the first endpoint when
    /// `room` is not attached to this door.
    pub fn other(&self, room: RoomId) -> RoomId {
        if self.rooms[0] == room {
            self.rooms[1]
        } else {
            self.rooms[0]
        }
    }

    pub fn joins(&self, a: RoomId, b: RoomId) -> bool {
        (self.rooms[0] == a && self.rooms[1] == b) || (self.rooms[0] == b && self.rooms[1] == a)
    }
}

impl PartialEq for DoorEdge {
    fn eq(&self, other: &Self) -> bool {
        self.rect == other.rect
            && self.axis == other.axis
            && self.joins(other.rooms[0], other.rooms[1])
    }
}

impl Eq for DoorEdge {}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomGraph {
    rooms: Vec<Option<RoomNode>>,
    doors: Vec<Option<DoorEdge>>,
}

impl RoomGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_room(&mut self, rect: Rect) -> RoomId {
        let id = RoomId(self.rooms.len() as u32);
        self.rooms.push(Some(RoomNode {
            rect,
            doors: SmallVec::new(),
        }));
        id
    }

    /// Attach a door between two live rooms. Panics if either room was
    /// removed, since that indicates a pipeline bug rather than bad input.
    pub fn add_door(&mut self, a: RoomId, b: RoomId, rect: Rect, axis: Axis) -> DoorId {
        let id = DoorId(self.doors.len() as u32);
        self.room_slot_mut(a).doors.push(id);
        self.room_slot_mut(b).doors.push(id);
        self.doors.push(Some(DoorEdge {
            rect,
            axis,
            rooms: [a, b],
        }));
        id
    }

    /// Detach and delete a door. Returns the removed edge, or `None` if the
    /// slot was already empty.
    pub fn remove_door(&mut self, id: DoorId) -> Option<DoorEdge> {
        let door = self.doors.get_mut(id.index())?.take()?;
        for room in door.rooms {
            if let Some(Some(node)) = self.rooms.get_mut(room.index()) {
                node.doors.retain(|d| *d != id);
            }
        }
        Some(door)
    }

    /// Delete a room together with every door attached to it.
    pub fn remove_room(&mut self, id: RoomId) -> Option<RoomNode> {
        let door_ids = self.room(id)?.doors.clone();
        for door in door_ids {
            self.remove_door(door);
        }
        self.rooms.get_mut(id.index())?.take()
    }

    pub fn room(&self, id: RoomId) -> Option<&RoomNode> {
        self.rooms.get(id.index())?.as_ref()
    }

    pub fn door(&self, id: DoorId) -> Option<&DoorEdge> {
        self.doors.get(id.index())?.as_ref()
    }

    fn room_slot_mut(&mut self, id: RoomId) -> &mut RoomNode {
        match self.rooms.get_mut(id.index()) {
            Some(Some(node)) => node,
            _ => panic!("door attached to missing room {id}"),
        }
    }

    /// Live rooms in id order.
    pub fn rooms(&self) -> impl Iterator<Item = (RoomId, &RoomNode)> {
        self.rooms
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|node| (RoomId(i as u32), node)))
    }

    /// Live doors in id order.
    pub fn doors(&self) -> impl Iterator<Item = (DoorId, &DoorEdge)> {
        self.doors
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|door| (DoorId(i as u32), door)))
    }

    pub fn room_ids(&self) -> Vec<RoomId> {
        self.rooms().map(|(id, _)| id).collect()
    }

    pub fn door_ids(&self) -> Vec<DoorId> {
        self.doors().map(|(id, _)| id).collect()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn door_count(&self) -> usize {
        self.doors.iter().filter(|slot| slot.is_some()).count()
    }

    /// Number of room slots ever allocated, including tombstones.
    pub fn room_capacity(&self) -> usize {
        self.rooms.len()
    }

    pub fn door_between(&self, a: RoomId, b: RoomId) -> Option<DoorId> {
        let node = self.room(a)?;
        node.doors
            .iter()
            .copied()
            .filter(|&d| self.door(d).is_some_and(|door| door.joins(a, b)))
            .min()
    }

    /// Rooms reachable through one door from `id`, in door order. A room
    /// joined by several doors is listed once per door.
    pub fn neighbors(&self, id: RoomId) -> impl Iterator<Item = RoomId> + '_ {
        self.room(id)
            .into_iter()
            .flat_map(|node| node.doors.iter())
            .filter_map(move |&d| self.door(d).map(|door| door.other(id)))
    }

    /// Count the rooms reachable from `start` by breadth-first search,
    /// treating `excluded` as if it were already removed.
    pub fn reachable_count(&self, start: RoomId, excluded: Option<RoomId>) -> usize {
        if self.room(start).is_none() || Some(start) == excluded {
            return 0;
        }
        let mut visited = vec![false; self.rooms.len()];
        let mut queue = VecDeque::new();
        visited[start.index()] = true;
        queue.push_back(start);
        let mut count = 0;
        while let Some(room) = queue.pop_front() {
            count += 1;
            for next in self.neighbors(room) {
                if Some(next) == excluded || visited[next.index()] {
                    continue;
                }
                visited[next.index()] = true;
                queue.push_back(next);
            }
        }
        count
    }

    /// True when every live room can reach every other one. An empty graph
    /// counts as connected.
    pub fn is_connected(&self) -> bool {
        match self.rooms().next() {
            Some((first, _)) => self.reachable_count(first, None) == self.room_count(),
            None => true,
        }
    }

    /// A copy with tombstones dropped and ids renumbered densely, keeping the
    /// relative order of rooms and doors.
    pub fn compacted(&self) -> RoomGraph {
        let mut remap = vec![None; self.rooms.len()];
        let mut out = RoomGraph::new();
        for (id, node) in self.rooms() {
            remap[id.index()] = Some(out.add_room(node.rect));
        }
        for (_, door) in self.doors() {
            if let (Some(a), Some(b)) = (remap[door.rooms[0].index()], remap[door.rooms[1].index()])
            {
                out.add_door(a, b, door.rect, door.axis);
            }
        }
        out
    }
}
