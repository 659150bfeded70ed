//! Error types for disha.
//!
//! | Variant | Meaning | Recoverable |
//! |---------|---------|-------------|
//! | `Configuration` | missing inputs, bad action name, zero resolution | no |
//! | `Numerical` | belief mass collapsed, no valid scan pairs | no |
//! | `PlacementFailure` | no collision-free start pose | yes (new map) |
//! | `Cancelled` | reference table build cancelled | yes |
//! | `Io` | persistence failure | no |
//!
//! A blocked forward move is not an error. It shows up as
//! [`StepReport::collided`](crate::session::StepReport::collided).

use crate::io::IoError;

/// Result type alias
pub type Result<T> = std::result::Result<T, LocalizationError>;

/// Localization engine errors
#[derive(Debug, thiserror::Error)]
pub enum LocalizationError {
    /// Missing or malformed configuration / inputs
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Probability mass or similarity computation broke down
    #[error("Numerical error: {0}")]
    Numerical(String),

    /// No collision-free start pose found
    #[error("Placement failed after {attempts} attempts")]
    PlacementFailure {
        /// Number of placement attempts made
        attempts: usize,
    },

    /// Parallel build cancelled before completion
    #[error("Operation cancelled")]
    Cancelled,

    /// Persistence error
    #[error("I/O error: {0}")]
    Io(#[from] IoError),
}

impl LocalizationError {
    /// Shorthand for a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        LocalizationError::Configuration(msg.into())
    }

    /// Shorthand for a numerical error
    pub fn numerical(msg: impl Into<String>) -> Self {
        LocalizationError::Numerical(msg.into())
    }

    /// Short code for logging
    pub fn code(&self) -> &'static str {
        match self {
            LocalizationError::Configuration(_) => "CONFIG",
            LocalizationError::Numerical(_) => "NUMERIC",
            LocalizationError::PlacementFailure { .. } => "PLACEMENT",
            LocalizationError::Cancelled => "CANCELLED",
            LocalizationError::Io(_) => "IO",
        }
    }

    /// Whether the caller can retry (e.g. with a fresh map)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            LocalizationError::PlacementFailure { .. } | LocalizationError::Cancelled
        )
    }
}
