//! Worker lifecycle states.

use std::fmt;

/// Lifecycle of one worker generation.
///
/// `Parsed → Installing → Installed → Activating → Activated`, with
/// `Redundant` for a worker whose install or activation failed. A
/// redundant worker may be installed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Constructed, nothing run yet
    Parsed,
    /// Precaching the static assets
    Installing,
    /// Precache complete; eligible for activation right away
    Installed,
    /// Sweeping orphaned cache generations
    Activating,
    /// Controlling pages and intercepting fetches
    Activated,
    /// Install or activation failed
    Redundant,
}

impl WorkerState {
    /// Only an activated worker intercepts fetches.
    pub fn can_intercept_fetch(&self) -> bool {
        matches!(self, WorkerState::Activated)
    }

    pub fn can_install(&self) -> bool {
        matches!(self, WorkerState::Parsed | WorkerState::Redundant)
    }

    pub fn can_activate(&self) -> bool {
        matches!(self, WorkerState::Installed)
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerState::Parsed => write!(f, "parsed"),
            WorkerState::Installing => write!(f, "installing"),
            WorkerState::Installed => write!(f, "installed"),
            WorkerState::Activating => write!(f, "activating"),
            WorkerState::Activated => write!(f, "activated"),
            WorkerState::Redundant => write!(f, "redundant"),
        }
    }
}
