//! Study timer engine.
//!
//! The engine is a wall-clock-based state machine. It owns no threads and
//! schedules nothing itself - whoever hosts it calls `tick()` once per
//! second while the timer runs (see [`crate::driver`]). Elapsed time is
//! always re-derived from the injected [`Clock`], so late or missed ticks
//! never make the countdown drift.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> Paused -> Running -> ... -> (phase complete) -> Idle
//!           |  on_suspend / on_resume reconcile the gap  |
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(settings, SystemClock, LogNotifier);
//! engine.start();
//! // Once per second:
//! engine.tick(); // Returns Some(Event::PhaseCompleted { .. }) when the phase ends
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::phase::{TimerPhase, TimerSettings};
use crate::clock::{millis_between, Clock};
use crate::events::Event;
use crate::notify::{NotificationPort, BREAK_DONE_BODY, COMPLETION_TITLE, FOCUS_DONE_BODY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Idle,
    Running,
    Paused,
}

/// Handle returned by [`TimerEngine::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&Event) + Send>;

/// Plain view of the engine state plus every derived display value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub phase: TimerPhase,
    pub phase_label: String,
    pub state: RunState,
    pub is_running: bool,
    pub is_paused: bool,
    pub elapsed_ms: u64,
    pub remaining_ms: u64,
    pub phase_duration_ms: u64,
    pub completed_focus_count: u32,
    pub daily_goal: u32,
    pub total_focus_ms: u64,
    pub progress_fraction: f64,
    pub session_progress: f64,
    pub formatted_remaining: String,
    pub formatted_total_focus: String,
    pub started_at: Option<DateTime<Utc>>,
    pub suspended_at: Option<DateTime<Utc>>,
    pub at: DateTime<Utc>,
}

/// Core study timer.
///
/// Sole owner of the session state. All operations are total: they either
/// change state and return the resulting [`Event`], or do nothing and
/// return `None`.
pub struct TimerEngine {
    settings: TimerSettings,
    phase: TimerPhase,
    is_running: bool,
    is_paused: bool,
    elapsed_ms: u64,
    remaining_ms: u64,
    /// Elapsed time carried over from earlier running intervals of the
    /// current phase. `tick()` adds wall-clock time since
    /// `start_wall_clock` on top of this.
    banked_elapsed_ms: u64,
    start_wall_clock: Option<DateTime<Utc>>,
    suspended_at: Option<DateTime<Utc>>,
    completed_focus_count: u32,
    total_focus_ms: u64,
    clock: Box<dyn Clock>,
    notifier: Box<dyn NotificationPort>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
}

impl TimerEngine {
    /// Create an engine in the `Idle` state with a full Focus phase ready.
    pub fn new(
        settings: TimerSettings,
        clock: impl Clock + 'static,
        notifier: impl NotificationPort + 'static,
    ) -> Self {
        let remaining_ms = settings.durations.duration_ms(TimerPhase::Focus);
        Self {
            settings,
            phase: TimerPhase::Focus,
            is_running: false,
            is_paused: false,
            elapsed_ms: 0,
            remaining_ms,
            banked_elapsed_ms: 0,
            start_wall_clock: None,
            suspended_at: None,
            completed_focus_count: 0,
            total_focus_ms: 0,
            clock: Box::new(clock),
            notifier: Box::new(notifier),
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn state(&self) -> RunState {
        if self.is_running {
            RunState::Running
        } else if self.is_paused {
            RunState::Paused
        } else {
            RunState::Idle
        }
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    pub fn start_wall_clock(&self) -> Option<DateTime<Utc>> {
        self.start_wall_clock
    }

    pub fn suspended_at(&self) -> Option<DateTime<Utc>> {
        self.suspended_at
    }

    pub fn completed_focus_count(&self) -> u32 {
        self.completed_focus_count
    }

    pub fn daily_goal(&self) -> u32 {
        self.settings.daily_goal.get()
    }

    pub fn total_focus_ms(&self) -> u64 {
        self.total_focus_ms
    }

    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    pub fn phase_duration_ms(&self) -> u64 {
        self.settings.durations.duration_ms(self.phase)
    }

    /// 0.0 .. 1.0 progress within the current phase.
    pub fn progress_fraction(&self) -> f64 {
        let total = self.phase_duration_ms();
        if total == 0 {
            return 0.0;
        }
        let done = total.saturating_sub(self.remaining_ms);
        (done as f64 / total as f64).clamp(0.0, 1.0)
    }

    /// Completed focus phases relative to the daily goal. Exceeds 1.0 once
    /// the goal is met.
    pub fn session_progress(&self) -> f64 {
        f64::from(self.completed_focus_count) / f64::from(self.settings.daily_goal.get())
    }

    /// Remaining time as zero-padded `MM:SS`.
    pub fn formatted_remaining(&self) -> String {
        format_clock(self.remaining_ms)
    }

    /// Accumulated focus time as `Hh Mm`, or `Mm` under an hour.
    pub fn formatted_total_focus(&self) -> String {
        format_hours_minutes(self.total_focus_ms)
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            phase: self.phase,
            phase_label: self.phase.label().to_string(),
            state: self.state(),
            is_running: self.is_running,
            is_paused: self.is_paused,
            elapsed_ms: self.elapsed_ms,
            remaining_ms: self.remaining_ms,
            phase_duration_ms: self.phase_duration_ms(),
            completed_focus_count: self.completed_focus_count,
            daily_goal: self.daily_goal(),
            total_focus_ms: self.total_focus_ms,
            progress_fraction: self.progress_fraction(),
            session_progress: self.session_progress(),
            formatted_remaining: self.formatted_remaining(),
            formatted_total_focus: self.formatted_total_focus(),
            started_at: self.start_wall_clock,
            suspended_at: self.suspended_at,
            at: self.clock.now(),
        }
    }

    // ── Subscriptions ────────────────────────────────────────────────

    /// Register a callback invoked with every event the engine produces,
    /// including per-tick updates.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&Event) + Send + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Returns `false` if the id was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn toggle(&mut self) -> Option<Event> {
        if self.is_running {
            self.pause()
        } else {
            self.start()
        }
    }

    pub fn start(&mut self) -> Option<Event> {
        if self.is_running {
            return None;
        }
        let now = self.clock.now();
        self.is_running = true;
        self.is_paused = false;
        self.banked_elapsed_ms = self.elapsed_ms;
        self.start_wall_clock = Some(now);
        debug!(phase = %self.phase, remaining_ms = self.remaining_ms, "timer started");
        self.emit(Event::TimerStarted {
            phase: self.phase,
            remaining_ms: self.remaining_ms,
            at: now,
        })
    }

    /// Stop ticking and keep elapsed/remaining as last computed.
    ///
    /// Also valid from idle: the phase is marked paused without progress.
    pub fn pause(&mut self) -> Option<Event> {
        self.is_running = false;
        self.is_paused = true;
        self.start_wall_clock = None;
        self.suspended_at = None;
        debug!(phase = %self.phase, remaining_ms = self.remaining_ms, "timer paused");
        let at = self.clock.now();
        self.emit(Event::TimerPaused {
            phase: self.phase,
            remaining_ms: self.remaining_ms,
            at,
        })
    }

    /// Rewind the current phase. Phase and statistics are kept.
    pub fn reset(&mut self) -> Option<Event> {
        self.is_running = false;
        self.is_paused = false;
        self.elapsed_ms = 0;
        self.banked_elapsed_ms = 0;
        self.remaining_ms = self.phase_duration_ms();
        self.start_wall_clock = None;
        self.suspended_at = None;
        debug!(phase = %self.phase, "timer reset");
        let at = self.clock.now();
        self.emit(Event::TimerReset {
            phase: self.phase,
            remaining_ms: self.remaining_ms,
            at,
        })
    }

    /// Finish the current phase right now, exactly as if it had run out.
    pub fn skip(&mut self) -> Option<Event> {
        Some(self.complete_phase(true))
    }

    /// Recompute the countdown from the wall clock.
    ///
    /// Returns `Some(Event::PhaseCompleted { .. })` when the phase ran out,
    /// `None` otherwise. A tick while not running does nothing, so a tick
    /// that was already queued when the timer stopped is harmless.
    pub fn tick(&mut self) -> Option<Event> {
        let started = self.start_wall_clock.filter(|_| self.is_running)?;
        let now = self.clock.now();
        let elapsed = self
            .banked_elapsed_ms
            .saturating_add(millis_between(started, now));
        // A clock stepping backwards must not hand time back.
        self.elapsed_ms = self.elapsed_ms.max(elapsed);
        self.remaining_ms = self.phase_duration_ms().saturating_sub(self.elapsed_ms);

        if self.remaining_ms == 0 {
            return Some(self.complete_phase(false));
        }
        let ticked = Event::Ticked {
            phase: self.phase,
            elapsed_ms: self.elapsed_ms,
            remaining_ms: self.remaining_ms,
            at: now,
        };
        self.publish(&ticked);
        None
    }

    /// The host is about to stop delivering ticks.
    pub fn on_suspend(&mut self) -> Option<Event> {
        if !self.is_running {
            return None;
        }
        let now = self.clock.now();
        self.suspended_at = Some(now);
        debug!(remaining_ms = self.remaining_ms, "timer suspended");
        self.emit(Event::TimerSuspended {
            remaining_ms: self.remaining_ms,
            at: now,
        })
    }

    /// The host can tick again: charge the suspension gap to the running
    /// phase.
    ///
    /// The start anchor is left alone, so the next tick recomputes elapsed
    /// from the wall clock and picks up any time between the last tick and
    /// the suspend.
    ///
    /// A gap covering the rest of the phase completes it once. Gaps long
    /// enough to span several phases still only advance a single phase.
    pub fn on_resume(&mut self) -> Option<Event> {
        let suspended_at = self.suspended_at.take()?;
        if !self.is_running {
            return None;
        }
        let now = self.clock.now();
        let gap_ms = millis_between(suspended_at, now);
        let duration = self.phase_duration_ms();
        self.remaining_ms = self.remaining_ms.saturating_sub(gap_ms);
        self.elapsed_ms = duration.saturating_sub(self.remaining_ms);
        debug!(gap_ms, remaining_ms = self.remaining_ms, "timer resumed");

        let resumed = Event::TimerResumed {
            gap_ms,
            remaining_ms: self.remaining_ms,
            at: now,
        };
        if self.remaining_ms == 0 {
            self.publish(&resumed);
            return Some(self.complete_phase(false));
        }
        self.emit(resumed)
    }

    /// Zero the progress counters. The running phase is untouched.
    pub fn reset_statistics(&mut self) -> Option<Event> {
        self.completed_focus_count = 0;
        self.total_focus_ms = 0;
        debug!("statistics reset");
        let at = self.clock.now();
        self.emit(Event::StatisticsReset { at })
    }

    /// Swap in new durations and goal.
    ///
    /// Time already spent in the current phase is kept; if the new duration
    /// is shorter than that, a running phase completes on its next tick.
    pub fn apply_settings(&mut self, settings: TimerSettings) -> Option<Event> {
        self.settings = settings;
        self.remaining_ms = self.phase_duration_ms().saturating_sub(self.elapsed_ms);
        debug!(?settings, remaining_ms = self.remaining_ms, "settings applied");
        let at = self.clock.now();
        self.emit(Event::SettingsApplied {
            state: self.state(),
            remaining_ms: self.remaining_ms,
            at,
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete_phase(&mut self, skipped: bool) -> Event {
        let completed = self.phase;
        self.is_running = false;
        self.is_paused = false;
        self.suspended_at = None;

        if completed == TimerPhase::Focus {
            self.completed_focus_count = self.completed_focus_count.saturating_add(1);
            self.total_focus_ms = self
                .total_focus_ms
                .saturating_add(self.settings.durations.duration_ms(TimerPhase::Focus));
        }
        let next = self
            .settings
            .next_phase(completed, self.completed_focus_count);

        self.phase = next;
        self.elapsed_ms = 0;
        self.banked_elapsed_ms = 0;
        self.remaining_ms = self.phase_duration_ms();
        self.start_wall_clock = None;

        info!(
            %completed,
            %next,
            completed_focus_count = self.completed_focus_count,
            skipped,
            "phase complete"
        );

        let body = if completed.is_break() {
            BREAK_DONE_BODY
        } else {
            FOCUS_DONE_BODY
        };
        self.notifier.notify_phase_complete(COMPLETION_TITLE, body);

        let event = Event::PhaseCompleted {
            completed,
            next,
            completed_focus_count: self.completed_focus_count,
            skipped,
            at: self.clock.now(),
        };
        self.publish(&event);
        event
    }

    fn emit(&mut self, event: Event) -> Option<Event> {
        self.publish(&event);
        Some(event)
    }

    fn publish(&mut self, event: &Event) {
        for (_, subscriber) in &mut self.subscribers {
            subscriber(event);
        }
    }
}

impl std::fmt::Debug for TimerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerEngine")
            .field("settings", &self.settings)
            .field("phase", &self.phase)
            .field("state", &self.state())
            .field("elapsed_ms", &self.elapsed_ms)
            .field("remaining_ms", &self.remaining_ms)
            .field("start_wall_clock", &self.start_wall_clock)
            .field("suspended_at", &self.suspended_at)
            .field("completed_focus_count", &self.completed_focus_count)
            .field("total_focus_ms", &self.total_focus_ms)
            .field("subscribers", &self.subscribers.len())
            .finish_non_exhaustive()
    }
}

/// Zero-padded `MM:SS`, truncating partial seconds.
pub fn format_clock(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// `Hh Mm`, or just `Mm` under an hour.
pub fn format_hours_minutes(ms: u64) -> String {
    let secs = ms / 1000;
    let hours = secs / 3600;
    let minutes = secs / 60 % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::notify::SilentNotifier;
    use std::sync::{Arc, Mutex};

    fn engine() -> (TimerEngine, ManualClock) {
        let clock = ManualClock::default();
        let engine = TimerEngine::new(TimerSettings::default(), clock.clone(), SilentNotifier);
        (engine, clock)
    }

    #[test]
    fn fresh_engine_is_idle_focus() {
        let (engine, _) = engine();
        assert_eq!(engine.state(), RunState::Idle);
        assert_eq!(engine.phase(), TimerPhase::Focus);
        assert_eq!(engine.remaining_ms(), 1_500_000);
        assert!(engine.start_wall_clock().is_none());
        assert_eq!(engine.formatted_remaining(), "25:00");
    }

    #[test]
    fn toggle_starts_then_pauses() {
        let (mut engine, clock) = engine();
        assert!(matches!(engine.toggle(), Some(Event::TimerStarted { .. })));
        assert_eq!(engine.state(), RunState::Running);
        clock.advance_secs(10);
        engine.tick();
        assert!(matches!(engine.toggle(), Some(Event::TimerPaused { .. })));
        assert_eq!(engine.state(), RunState::Paused);
        assert!(engine.start_wall_clock().is_none());
        assert_eq!(engine.remaining_ms(), 1_490_000);
    }

    #[test]
    fn pause_keeps_progress_across_restart() {
        let (mut engine, clock) = engine();
        engine.start();
        clock.advance_secs(60);
        engine.tick();
        engine.pause();
        clock.advance_secs(600);
        engine.start();
        clock.advance_secs(30);
        engine.tick();
        assert_eq!(engine.elapsed_ms(), 90_000);
        assert_eq!(engine.remaining_ms(), 1_410_000);
    }

    #[test]
    fn pause_when_idle_marks_paused() {
        let (mut engine, _) = engine();
        assert!(matches!(
            engine.pause(),
            Some(Event::TimerPaused {
                remaining_ms: 1_500_000,
                ..
            })
        ));
        assert!(engine.is_paused());
        assert!(!engine.is_running());
        assert_eq!(engine.state(), RunState::Paused);
        assert_eq!(engine.start_wall_clock(), None);
    }

    #[test]
    fn start_while_running_is_idempotent() {
        let (mut engine, clock) = engine();
        engine.start();
        let started = engine.start_wall_clock();
        clock.advance_secs(5);
        engine.tick();
        let elapsed = engine.elapsed_ms();
        assert!(engine.start().is_none());
        assert_eq!(engine.start_wall_clock(), started);
        assert_eq!(engine.elapsed_ms(), elapsed);
    }

    #[test]
    fn reset_rewinds_current_phase() {
        let (mut engine, clock) = engine();
        engine.skip();
        engine.start();
        clock.advance_secs(100);
        engine.tick();
        engine.reset();
        assert_eq!(engine.phase(), TimerPhase::ShortBreak);
        assert_eq!(engine.remaining_ms(), 300_000);
        assert_eq!(engine.elapsed_ms(), 0);
        assert_eq!(engine.state(), RunState::Idle);
        assert_eq!(engine.completed_focus_count(), 1);
    }

    #[test]
    fn tick_when_not_running_does_nothing() {
        let (mut engine, clock) = engine();
        clock.advance_secs(5_000);
        assert!(engine.tick().is_none());
        assert_eq!(engine.remaining_ms(), 1_500_000);
    }

    #[test]
    fn backwards_clock_never_adds_time() {
        let (mut engine, clock) = engine();
        engine.start();
        clock.advance_secs(100);
        engine.tick();
        clock.set(clock.now() - chrono::Duration::seconds(50));
        engine.tick();
        assert_eq!(engine.remaining_ms(), 1_400_000);
    }

    #[test]
    fn completion_accumulates_nominal_focus() {
        let (mut engine, _) = engine();
        engine.skip();
        assert_eq!(engine.total_focus_ms(), 1_500_000);
        engine.skip();
        assert_eq!(engine.total_focus_ms(), 1_500_000);
        assert_eq!(engine.phase(), TimerPhase::Focus);
    }

    #[test]
    fn derived_values() {
        let (mut engine, clock) = engine();
        engine.start();
        clock.advance_secs(375);
        engine.tick();
        assert_eq!(engine.formatted_remaining(), "18:45");
        assert!((engine.progress_fraction() - 0.25).abs() < 1e-9);

        engine.skip();
        engine.skip();
        engine.skip();
        engine.skip();
        engine.skip();
        assert_eq!(engine.completed_focus_count(), 3);
        assert!((engine.session_progress() - 0.75).abs() < 1e-9);
        assert_eq!(engine.formatted_total_focus(), "1h 15m");
    }

    #[test]
    fn format_helpers() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(59_999), "00:59");
        assert_eq!(format_clock(300_000), "05:00");
        assert_eq!(format_hours_minutes(0), "0m");
        assert_eq!(format_hours_minutes(25 * 60_000), "25m");
        assert_eq!(format_hours_minutes(3_600_000), "1h 0m");
    }

    #[test]
    fn subscribers_see_ticks_and_can_leave() {
        let (mut engine, clock) = engine();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let id = engine.subscribe(move |e| sink.lock().unwrap().push(e.clone()));

        engine.start();
        clock.advance_secs(1);
        engine.tick();
        assert!(engine.unsubscribe(id));
        assert!(!engine.unsubscribe(id));
        engine.pause();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(matches!(seen[0], Event::TimerStarted { .. }));
        assert!(matches!(
            seen[1],
            Event::Ticked {
                remaining_ms: 1_499_000,
                ..
            }
        ));
    }

    #[test]
    fn shorter_settings_complete_running_phase_on_next_tick() {
        let (mut engine, clock) = engine();
        engine.start();
        clock.advance_secs(600);
        engine.tick();

        let mut settings = TimerSettings::default();
        settings.durations.focus = std::num::NonZeroU32::new(5).unwrap();
        engine.apply_settings(settings);
        assert_eq!(engine.remaining_ms(), 0);
        assert!(engine.is_running());

        clock.advance_secs(1);
        assert!(matches!(engine.tick(), Some(Event::PhaseCompleted { .. })));
        assert_eq!(engine.total_focus_ms(), 5 * 60_000);
    }

    #[test]
    fn snapshot_mirrors_state() {
        let (mut engine, _) = engine();
        engine.start();
        let snap = engine.snapshot();
        assert_eq!(snap.state, RunState::Running);
        assert_eq!(snap.phase_label, "Focus");
        assert_eq!(snap.remaining_ms, 1_500_000);
        assert_eq!(snap.daily_goal, 4);
        assert!(snap.started_at.is_some());
    }
}
