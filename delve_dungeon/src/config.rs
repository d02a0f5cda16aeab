// Data-driven generation settings.
//
// All tunable parameters of the dungeon pipeline live in `DungeonConfig`,
// which the caller passes explicitly to `level::generate()` together with a
// seed. The pipeline never uses magic numbers; it reads from the config.
// Configs load from JSON (missing fields fall back to `Default`), so balance
// iteration does not need a recompile.
//
// `validate()` rejects settings that would make the pipeline misbehave
// rather than merely produce an odd level: reversed randomness bounds, a
// minimum room size too small to host a door with wall margins (which would
// let a split seam come out doorless and orphan a subtree), and so on.
//
// See also: `partition.rs` (bounds, minimum size, randomness bounds, first
// split axis), `doors.rs` (wall width, door size), `prune.rs` (removal
// percent, extra door chance), `level.rs` which runs the whole pipeline.
//
// **Critical constraint: determinism.** Identical config + seed must yield an
// identical level.

use crate::error::{DungeonError, Result};
use crate::types::{Axis, Rect};
use serde::{Deserialize, Serialize};

/// Where candidate room adjacency comes from before pruning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdjacencyStrategy {
    /// Doors synthesized on split seams while partitioning, with inherited
    /// connectivity. The canonical pipeline.
    SeamDoors,
    /// Delaunay triangulation over room centers; a door per triangulation
    /// edge whose rooms share a feasible seam, topped up with seam doors only
    /// where needed to keep the graph connected.
    Triangulation,
}

/// Complete generation settings for one dungeon level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DungeonConfig {
    /// The rectangle the whole dungeon is carved from.
    pub bounds: Rect,

    /// A split is rejected when either child would be at or below this size
    /// along the split axis `(width, height)`.
    pub min_room_size: (i32, i32),

    /// Wall thickness in cells. Children are extended by `wall_width / 2`
    /// into their shared seam, and doors keep `wall_width` clear of seam ends.
    pub wall_width: i32,

    /// Door footprint `(width, height)`. Horizontal seams are measured
    /// against the width, vertical seams against the height.
    pub door_size: (i32, i32),

    /// `(min, max)` fraction of a rectangle's size where a split may land.
    pub randomness_bounds: (f64, f64),

    /// Percentage (0–100) of the smallest rooms considered for removal.
    pub small_room_removal_percent: f64,

    /// Axis the root rectangle is split along; children alternate.
    pub first_split: Axis,

    pub adjacency: AdjacencyStrategy,

    /// Trim doors down to a minimum spanning tree after pruning.
    pub reduce_to_spanning_tree: bool,

    /// Probability that a door outside the spanning tree survives the
    /// reduction anyway, reintroducing some loops. 0.0 keeps a pure tree.
    pub extra_door_chance: f64,
}

impl Default for DungeonConfig {
    fn default() -> Self {
        Self {
            bounds: Rect::new(0, 0, 64, 48),
            min_room_size: (8, 8),
            wall_width: 1,
            door_size: (2, 2),
            randomness_bounds: (0.35, 0.65),
            small_room_removal_percent: 10.0,
            first_split: Axis::Horizontal,
            adjacency: AdjacencyStrategy::SeamDoors,
            reduce_to_spanning_tree: true,
            extra_door_chance: 0.1,
        }
    }
}

impl DungeonConfig {
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Check the settings before any generation work starts.
    pub fn validate(&self) -> Result<()> {
        let (min_w, min_h) = self.min_room_size;
        let (door_w, door_h) = self.door_size;
        let (lo, hi) = self.randomness_bounds;

        if self.bounds.is_empty() {
            return Err(DungeonError::config(format!(
                "bounds {} must have positive width and height",
                self.bounds
            )));
        }
        if self.wall_width < 1 {
            return Err(DungeonError::config(format!(
                "wall_width must be at least 1, got {}",
                self.wall_width
            )));
        }
        if door_w < 1 || door_h < 1 {
            return Err(DungeonError::config(format!(
                "door_size must be positive, got {door_w}x{door_h}"
            )));
        }
        if min_w < 1 || min_h < 1 {
            return Err(DungeonError::config(format!(
                "min_room_size must be positive, got {min_w}x{min_h}"
            )));
        }
        if !(lo.is_finite() && hi.is_finite() && 0.0 <= lo && lo <= hi && hi <= 1.0) {
            return Err(DungeonError::config(format!(
                "randomness_bounds must satisfy 0 <= min <= max <= 1, got ({lo}, {hi})"
            )));
        }
        if !(0.0..=100.0).contains(&self.small_room_removal_percent) {
            return Err(DungeonError::config(format!(
                "small_room_removal_percent must be within 0..=100, got {}",
                self.small_room_removal_percent
            )));
        }
        if !(0.0..=1.0).contains(&self.extra_door_chance) {
            return Err(DungeonError::config(format!(
                "extra_door_chance must be within 0..=1, got {}",
                self.extra_door_chance
            )));
        }
        // Every split seam spans a full side of its parent, and every side is
        // at least the minimum room size, so this guarantees a door fits.
        let margin = 2 * self.wall_width;
        if min_w < door_w + margin || min_h < door_h + margin {
            return Err(DungeonError::config(format!(
                "min_room_size {min_w}x{min_h} cannot host a {door_w}x{door_h} door \
                 with {} cells of wall on each side",
                self.wall_width
            )));
        }
        if self.bounds.width < min_w || self.bounds.height < min_h {
            return Err(DungeonError::config(format!(
                "bounds {} are smaller than min_room_size {min_w}x{min_h}",
                self.bounds
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        DungeonConfig::default().validate().unwrap();
    }

    #[test]
    fn default_config_serializes() {
        let config = DungeonConfig::default();
        let json = config.to_json().unwrap();
        let restored = DungeonConfig::from_json(&json).unwrap();
        assert_eq!(config, restored);
    }

    #[test]
    fn config_loads_partial_json() {
        let json = r#"{
            "bounds": { "x": 0, "y": 0, "width": 20, "height": 20 },
            "min_room_size": [5, 5],
            "door_size": [2, 1],
            "adjacency": "Triangulation"
        }"#;
        let config = DungeonConfig::from_json(json).unwrap();
        assert_eq!(config.bounds, Rect::new(0, 0, 20, 20));
        assert_eq!(config.min_room_size, (5, 5));
        assert_eq!(config.door_size, (2, 1));
        assert_eq!(config.adjacency, AdjacencyStrategy::Triangulation);
        // Unspecified fields come from Default.
        assert_eq!(config.wall_width, 1);
        assert!(config.reduce_to_spanning_tree);
    }

    #[test]
    fn rejects_reversed_randomness_bounds() {
        let config = DungeonConfig {
            randomness_bounds: (0.7, 0.3),
            ..DungeonConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DungeonError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn rejects_min_size_too_small_for_door() {
        let config = DungeonConfig {
            min_room_size: (3, 8),
            door_size: (2, 2),
            wall_width: 1,
            ..DungeonConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_bad_percent_and_chance() {
        let config = DungeonConfig {
            small_room_removal_percent: 120.0,
            ..DungeonConfig::default()
        };
        assert!(config.validate().is_err());

        let config = DungeonConfig {
            extra_door_chance: -0.5,
            ..DungeonConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_wall_and_tiny_bounds() {
        let config = DungeonConfig {
            wall_width: 0,
            ..DungeonConfig::default()
        };
        assert!(config.validate().is_err());

        let config = DungeonConfig {
            bounds: Rect::new(0, 0, 4, 40),
            ..DungeonConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
