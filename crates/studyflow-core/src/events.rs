use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{RunState, TimerPhase};

/// Every state change of the timer produces an Event.
/// Commands return it; subscribers receive it as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        phase: TimerPhase,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        phase: TimerPhase,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        phase: TimerPhase,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    /// Published to subscribers on every tick that did not finish the phase.
    Ticked {
        phase: TimerPhase,
        elapsed_ms: u64,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    PhaseCompleted {
        completed: TimerPhase,
        next: TimerPhase,
        completed_focus_count: u32,
        /// True when the user skipped rather than waiting it out.
        skipped: bool,
        at: DateTime<Utc>,
    },
    TimerSuspended {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        /// Wall-clock time spent suspended.
        gap_ms: u64,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    StatisticsReset {
        at: DateTime<Utc>,
    },
    SettingsApplied {
        state: RunState,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
}
