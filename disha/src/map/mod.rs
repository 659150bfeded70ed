//! Occupancy maps and procedural environment generation.

pub mod generator;
pub mod occupancy;

pub use generator::{FieldSpec, MapKind, MazeConfig, MazeGenerator};
pub use occupancy::{OCCUPIED_THRESHOLD, OccupancyMap, downsample};
