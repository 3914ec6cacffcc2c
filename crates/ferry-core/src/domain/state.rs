//! Task lifecycle status.

use serde::{Deserialize, Serialize};

/// Task status.
///
/// State transitions (monotonic, no way back):
/// - Init -> Processing -> Done
///
/// A task whose runner panicked, or whose handler never returns, stays at
/// `Processing`. Nothing in the executor moves it forward afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Admitted into the buffer, not yet picked up.
    #[default]
    Init,

    /// Picked up by the dispatch loop; the handler is running (or about to).
    Processing,

    /// Handler returned, with or without an error.
    Done,
}

impl TaskStatus {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Done)
    }

    /// Only forward, single-step transitions are allowed.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Init, TaskStatus::Processing) | (TaskStatus::Processing, TaskStatus::Done)
        )
    }
}
