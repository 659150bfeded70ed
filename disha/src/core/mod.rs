//! Core types: geometry helpers, poses and actions.

pub mod action;
pub mod math;
pub mod pose;

pub use action::Action;
pub use math::{GridLimits, TWO_PI, deg_to_rad, to_index, to_real, wrap, wrap_2pi};
pub use pose::{GridGeometry, GridPose, GridShape, Pose};
