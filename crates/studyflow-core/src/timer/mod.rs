mod engine;
mod phase;

pub use engine::{
    format_clock, format_hours_minutes, RunState, SubscriptionId, TimerEngine, TimerSnapshot,
};
pub use phase::{
    PhaseDurations, TimerPhase, TimerSettings, DEFAULT_DAILY_GOAL, DEFAULT_LONG_BREAK_INTERVAL,
};
