//! Synthetic range sensing.
//!
//! - [`raycaster`]: ray marching against an [`OccupancyMap`](crate::map::OccupancyMap)
//! - [`reference`]: per-cell reference scan table, built in parallel
//! - [`image`] / [`slide`]: scan rasters for learned providers and the
//!   forward collision check
//! - [`noise`]: seeded noise streams

pub mod image;
pub mod noise;
pub mod raycaster;
pub mod reference;
pub mod scan;
pub mod slide;

pub use image::ScanImageStack;
pub use noise::NoiseGenerator;
pub use raycaster::{ScanOptions, cast_scan, march_ray};
pub use reference::{BuildOptions, CancelToken, ReferenceScanTable, heading_ray_offset};
pub use scan::RangeScan;
pub use slide::SlideMap;
