//! Discrete Bayes filter over grid poses.

pub mod belief;
pub mod transition;

pub use belief::{Belief, BeliefSnapshot, ENTROPY_FLOOR};
pub use transition::{MotionModelKind, TransitionConfig, TransitionModel};
