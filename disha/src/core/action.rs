//! Discrete motion actions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LocalizationError;

/// Motion action applied between localization steps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Rotate counter-clockwise by the rotation step
    TurnLeft,
    /// Rotate clockwise by the rotation step
    TurnRight,
    /// Move one forward step along the current heading
    GoForward,
    /// Stay in place
    Hold,
}

impl Action {
    /// Candidate order used to break selection ties
    pub const PRIORITY: [Action; 3] = [Action::TurnLeft, Action::TurnRight, Action::GoForward];

    /// Name used in configuration and logs
    pub fn name(&self) -> &'static str {
        match self {
            Action::TurnLeft => "turn_left",
            Action::TurnRight => "turn_right",
            Action::GoForward => "go_forward",
            Action::Hold => "hold",
        }
    }

    /// Whether the action changes position (not only heading)
    pub fn is_translation(&self) -> bool {
        matches!(self, Action::GoForward)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Action {
    type Err = LocalizationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "turn_left" => Ok(Action::TurnLeft),
            "turn_right" => Ok(Action::TurnRight),
            "go_forward" | "go_fwd" => Ok(Action::GoForward),
            "hold" => Ok(Action::Hold),
            other => Err(LocalizationError::config(format!(
                "undefined action name '{}'",
                other
            ))),
        }
    }
}
