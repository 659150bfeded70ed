//! Procedural map configuration section.

use serde::{Deserialize, Serialize};

use crate::map::{MapKind, MazeConfig};

use super::defaults;

/// Environment generator settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MazeSection {
    /// Lattice size (n × n)
    #[serde(default = "defaults::grid_cells")]
    pub cells: usize,

    /// Extra wall cells removed after carving
    #[serde(default = "defaults::grid_cells")]
    pub removed_cells: usize,

    /// Wall half-thickness as a fraction of the hall width
    #[serde(default = "defaults::obstacle_ratio")]
    pub obstacle_ratio: f64,

    /// Keep the lattice boundary when removing cells
    #[serde(default = "defaults::enabled")]
    pub keep_boundary: bool,

    /// Occupied one-pixel rim around the field
    #[serde(default = "defaults::enabled")]
    pub outer_rim: bool,

    /// Generator: maze | boxes
    #[serde(default)]
    pub generator: MapKind,

    /// Box count for the box generator
    #[serde(default = "defaults::boxes")]
    pub boxes: usize,

    /// Box side range `[min, max]` (meters)
    #[serde(default = "defaults::box_sides")]
    pub box_sides: [f64; 2],
}

impl Default for MazeSection {
    fn default() -> Self {
        Self {
            cells: 11,
            removed_cells: 11,
            obstacle_ratio: 0.25,
            keep_boundary: true,
            outer_rim: true,
            generator: MapKind::Maze,
            boxes: 6,
            box_sides: [0.3, 0.8],
        }
    }
}

impl MazeSection {
    /// Convert to generator settings
    pub fn to_maze_config(&self) -> MazeConfig {
        MazeConfig {
            cells: self.cells,
            removed_cells: self.removed_cells,
            obstacle_ratio: self.obstacle_ratio,
            keep_boundary: self.keep_boundary,
            outer_rim: self.outer_rim,
            kind: self.generator,
            boxes: self.boxes,
            box_sides: (self.box_sides[0], self.box_sides[1]),
        }
    }
}
