//! Timer actor - owns the engine and delivers its ticks.
//!
//! The actor is the only place the engine lives once a host hands it over.
//! Commands and ticks are processed one at a time inside a single task, so
//! the engine never sees concurrent mutation and no lock is needed.
//!
//! The tick is a `tokio::time::Interval` polled only while the engine is
//! running and the host is in the foreground. Pausing, resetting or
//! finishing a phase disables the tick arm before the next loop iteration,
//! so no tick can land after the timer stopped.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, info};

use super::commands::{TimerCommand, TimerOp};
use crate::events::Event;
use crate::timer::TimerEngine;

/// Period between ticks while running.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

pub struct TimerActor {
    engine: TimerEngine,
    receiver: mpsc::Receiver<TimerCommand>,
    /// Set between the host's suspend and resume signals.
    suspended: bool,
}

impl TimerActor {
    /// Take ownership of `engine` and forward every event it produces to
    /// `event_publisher`.
    pub fn new(
        mut engine: TimerEngine,
        receiver: mpsc::Receiver<TimerCommand>,
        event_publisher: broadcast::Sender<Event>,
    ) -> Self {
        engine.subscribe(move |event| {
            // No receivers is fine - nobody is watching right now.
            let _ = event_publisher.send(event.clone());
        });
        Self {
            engine,
            receiver,
            suspended: false,
        }
    }

    /// Runs the actor loop until shutdown or until every handle is dropped.
    pub async fn run(mut self) {
        info!("timer actor starting");
        let mut ticker = interval(TICK_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.reset();

        loop {
            let ticking = self.engine.is_running() && !self.suspended;
            tokio::select! {
                biased;
                cmd = self.receiver.recv() => match cmd {
                    Some(TimerCommand::Shutdown) | None => break,
                    Some(cmd) => self.handle_command(cmd, &mut ticker),
                },
                _ = ticker.tick(), if ticking => {
                    self.engine.tick();
                }
            }
        }

        info!(
            completed_focus_count = self.engine.completed_focus_count(),
            "timer actor stopped"
        );
    }

    fn handle_command(&mut self, cmd: TimerCommand, ticker: &mut Interval) {
        match cmd {
            TimerCommand::Control { op, respond_to } => {
                let anchor = self.engine.start_wall_clock();
                let event = self.apply(op);
                if op == TimerOp::Resume || restarted(anchor, self.engine.start_wall_clock()) {
                    // First tick lands one full period after (re)start or resume.
                    ticker.reset();
                }
                // Ignore send error - caller may have stopped waiting.
                let _ = respond_to.send(event);
            }
            TimerCommand::Snapshot { respond_to } => {
                let _ = respond_to.send(self.engine.snapshot());
            }
            TimerCommand::Shutdown => {}
        }
    }

    fn apply(&mut self, op: TimerOp) -> Option<Event> {
        debug!(?op, "timer command");
        match op {
            TimerOp::Toggle => self.engine.toggle(),
            TimerOp::Start => self.engine.start(),
            TimerOp::Pause => self.engine.pause(),
            TimerOp::Reset => self.engine.reset(),
            TimerOp::Skip => self.engine.skip(),
            TimerOp::Suspend => {
                self.suspended = true;
                self.engine.on_suspend()
            }
            TimerOp::Resume => {
                self.suspended = false;
                self.engine.on_resume()
            }
            TimerOp::ResetStatistics => self.engine.reset_statistics(),
            TimerOp::ApplySettings(settings) => self.engine.apply_settings(settings),
        }
    }
}

fn restarted(before: Option<DateTime<Utc>>, after: Option<DateTime<Utc>>) -> bool {
    after.is_some() && after != before
}
