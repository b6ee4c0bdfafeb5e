//! Messages accepted by the timer actor.

use tokio::sync::oneshot;

use crate::events::Event;
use crate::timer::{TimerSettings, TimerSnapshot};

/// An engine operation requested by a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerOp {
    Toggle,
    Start,
    Pause,
    Reset,
    Skip,
    /// Host lifecycle: entered background.
    Suspend,
    /// Host lifecycle: became active again.
    Resume,
    ResetStatistics,
    ApplySettings(TimerSettings),
}

/// Commands sent to the timer actor.
///
/// Each request carries a oneshot channel for the reply.
#[derive(Debug)]
pub enum TimerCommand {
    /// Run one engine operation and reply with the event it produced.
    Control {
        op: TimerOp,
        respond_to: oneshot::Sender<Option<Event>>,
    },
    Snapshot {
        respond_to: oneshot::Sender<TimerSnapshot>,
    },
    /// Stop the actor loop. The engine is dropped with it.
    Shutdown,
}
