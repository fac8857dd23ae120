use serde::{Deserialize, Serialize};

use crate::pattern::Phase;
use crate::session::SessionSummary;

/// Every state change of a session produces an Event.
/// The rendering layer consumes them; they never feed back into the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SessionStarted {
        phase: Phase,
        phase_secs: f64,
        target_cycles: u32,
    },
    /// A session was rebuilt from a saved snapshot.
    SessionResumed {
        phase: Phase,
        remaining_secs: f64,
        cycles_completed: u32,
    },
    /// Entered a phase with a non-zero duration.
    PhaseChanged {
        phase: Phase,
        duration_secs: f64,
        cycles_completed: u32,
    },
    CycleCompleted {
        cycles_completed: u32,
    },
    Paused {
        phase: Phase,
        remaining_secs: f64,
    },
    Resumed {
        phase: Phase,
        remaining_secs: f64,
    },
    SessionCompleted {
        summary: SessionSummary,
    },
    SessionExited {
        summary: SessionSummary,
    },
}
