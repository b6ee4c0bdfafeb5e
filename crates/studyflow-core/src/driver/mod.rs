//! Async host for a [`TimerEngine`](crate::timer::TimerEngine).
//!
//! [`spawn`] moves the engine into a [`TimerActor`] task that delivers the
//! once-per-second tick, and returns a [`TimerHandle`] for sending commands
//! and subscribing to events.

mod actor;
mod commands;
mod handle;

pub use actor::{TimerActor, TICK_INTERVAL};
pub use commands::{TimerCommand, TimerOp};
pub use handle::TimerHandle;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::timer::TimerEngine;

/// Command queue depth.
pub const COMMAND_BUFFER: usize = 32;

/// Events buffered per subscriber before it starts lagging.
pub const EVENT_BUFFER: usize = 256;

/// Spawn the actor on the current tokio runtime.
pub fn spawn(engine: TimerEngine) -> (TimerHandle, JoinHandle<()>) {
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
    let (event_tx, _) = broadcast::channel(EVENT_BUFFER);
    let actor = TimerActor::new(engine, cmd_rx, event_tx.clone());
    let task = tokio::spawn(actor.run());
    (TimerHandle::new(cmd_tx, event_tx), task)
}
