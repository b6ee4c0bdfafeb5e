use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// Focus phases completed before the break upgrades to a long one.
pub const DEFAULT_LONG_BREAK_INTERVAL: u32 = 4;

/// Completed focus phases that make up a day's goal by default.
pub const DEFAULT_DAILY_GOAL: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerPhase {
    Focus,
    ShortBreak,
    LongBreak,
}

impl TimerPhase {
    /// Nominal duration in minutes when no override is configured.
    pub fn default_minutes(self) -> u32 {
        match self {
            TimerPhase::Focus => 25,
            TimerPhase::ShortBreak => 5,
            TimerPhase::LongBreak => 15,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimerPhase::Focus => "Focus",
            TimerPhase::ShortBreak => "Short Break",
            TimerPhase::LongBreak => "Long Break",
        }
    }

    pub fn is_break(self) -> bool {
        !matches!(self, TimerPhase::Focus)
    }
}

impl std::fmt::Display for TimerPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.label())
    }
}

/// Per-phase durations, in whole minutes.
///
/// Zero is unrepresentable, so a validated value can never produce an
/// empty phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseDurations {
    pub focus: NonZeroU32,
    pub short_break: NonZeroU32,
    pub long_break: NonZeroU32,
}

impl PhaseDurations {
    pub fn minutes(&self, phase: TimerPhase) -> u32 {
        match phase {
            TimerPhase::Focus => self.focus.get(),
            TimerPhase::ShortBreak => self.short_break.get(),
            TimerPhase::LongBreak => self.long_break.get(),
        }
    }

    /// Phase duration in milliseconds.
    ///
    /// Saturates instead of overflowing for absurdly large overrides.
    pub fn duration_ms(&self, phase: TimerPhase) -> u64 {
        u64::from(self.minutes(phase))
            .saturating_mul(60)
            .saturating_mul(1000)
    }
}

impl Default for PhaseDurations {
    fn default() -> Self {
        Self {
            focus: non_zero(TimerPhase::Focus.default_minutes()),
            short_break: non_zero(TimerPhase::ShortBreak.default_minutes()),
            long_break: non_zero(TimerPhase::LongBreak.default_minutes()),
        }
    }
}

/// Validated timer settings consumed by the engine.
///
/// Built from the on-disk configuration via `TryFrom<&TimerConfig>`, which
/// is where non-positive values get rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSettings {
    pub durations: PhaseDurations,
    pub daily_goal: NonZeroU32,
    pub long_break_interval: NonZeroU32,
}

impl TimerSettings {
    /// Phase that follows `completed`, given the focus count *after* the
    /// completion was recorded.
    pub fn next_phase(&self, completed: TimerPhase, completed_focus_count: u32) -> TimerPhase {
        match completed {
            TimerPhase::Focus => {
                if completed_focus_count % self.long_break_interval.get() == 0 {
                    TimerPhase::LongBreak
                } else {
                    TimerPhase::ShortBreak
                }
            }
            TimerPhase::ShortBreak | TimerPhase::LongBreak => TimerPhase::Focus,
        }
    }
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            durations: PhaseDurations::default(),
            daily_goal: non_zero(DEFAULT_DAILY_GOAL),
            long_break_interval: non_zero(DEFAULT_LONG_BREAK_INTERVAL),
        }
    }
}

fn non_zero(value: u32) -> NonZeroU32 {
    NonZeroU32::new(value).unwrap_or(NonZeroU32::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_durations() {
        let d = PhaseDurations::default();
        assert_eq!(d.duration_ms(TimerPhase::Focus), 25 * 60 * 1000);
        assert_eq!(d.duration_ms(TimerPhase::ShortBreak), 5 * 60 * 1000);
        assert_eq!(d.duration_ms(TimerPhase::LongBreak), 15 * 60 * 1000);
    }

    #[test]
    fn transition_table() {
        let s = TimerSettings::default();
        assert_eq!(s.next_phase(TimerPhase::Focus, 1), TimerPhase::ShortBreak);
        assert_eq!(s.next_phase(TimerPhase::Focus, 3), TimerPhase::ShortBreak);
        assert_eq!(s.next_phase(TimerPhase::Focus, 4), TimerPhase::LongBreak);
        assert_eq!(s.next_phase(TimerPhase::Focus, 8), TimerPhase::LongBreak);
        assert_eq!(s.next_phase(TimerPhase::ShortBreak, 4), TimerPhase::Focus);
        assert_eq!(s.next_phase(TimerPhase::LongBreak, 3), TimerPhase::Focus);
    }

    #[test]
    fn huge_override_saturates() {
        let d = PhaseDurations {
            focus: NonZeroU32::MAX,
            ..PhaseDurations::default()
        };
        assert!(d.duration_ms(TimerPhase::Focus) > 0);
    }

    #[test]
    fn phase_serializes_snake_case() {
        let json = serde_json::to_string(&TimerPhase::ShortBreak).unwrap();
        assert_eq!(json, "\"short_break\"");
    }
}
