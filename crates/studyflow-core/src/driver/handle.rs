//! Client interface for the timer actor.

use tokio::sync::{broadcast, mpsc, oneshot};

use super::commands::{TimerCommand, TimerOp};
use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::timer::{TimerSettings, TimerSnapshot};

/// Cheap-to-clone handle for driving a running timer.
///
/// ```ignore
/// let (handle, task) = driver::spawn(engine);
/// let mut events = handle.subscribe();
/// handle.start().await?;
/// while let Ok(event) = events.recv().await {
///     // render
/// }
/// ```
#[derive(Clone)]
pub struct TimerHandle {
    sender: mpsc::Sender<TimerCommand>,
    event_sender: broadcast::Sender<Event>,
}

impl TimerHandle {
    pub fn new(sender: mpsc::Sender<TimerCommand>, event_sender: broadcast::Sender<Event>) -> Self {
        Self {
            sender,
            event_sender,
        }
    }

    /// Run one engine operation.
    ///
    /// Returns the event the operation produced, or `None` if it was a no-op.
    ///
    /// # Errors
    ///
    /// `CoreError::ChannelClosed` if the actor has shut down.
    pub async fn control(&self, op: TimerOp) -> Result<Option<Event>> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(TimerCommand::Control {
                op,
                respond_to: tx,
            })
            .await
            .map_err(|_| CoreError::ChannelClosed)?;
        rx.await.map_err(|_| CoreError::ChannelClosed)
    }

    pub async fn toggle(&self) -> Result<Option<Event>> {
        self.control(TimerOp::Toggle).await
    }

    pub async fn start(&self) -> Result<Option<Event>> {
        self.control(TimerOp::Start).await
    }

    pub async fn pause(&self) -> Result<Option<Event>> {
        self.control(TimerOp::Pause).await
    }

    pub async fn reset(&self) -> Result<Option<Event>> {
        self.control(TimerOp::Reset).await
    }

    pub async fn skip(&self) -> Result<Option<Event>> {
        self.control(TimerOp::Skip).await
    }

    pub async fn suspend(&self) -> Result<Option<Event>> {
        self.control(TimerOp::Suspend).await
    }

    pub async fn resume(&self) -> Result<Option<Event>> {
        self.control(TimerOp::Resume).await
    }

    pub async fn reset_statistics(&self) -> Result<Option<Event>> {
        self.control(TimerOp::ResetStatistics).await
    }

    pub async fn apply_settings(&self, settings: TimerSettings) -> Result<Option<Event>> {
        self.control(TimerOp::ApplySettings(settings)).await
    }

    pub async fn snapshot(&self) -> Result<TimerSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(TimerCommand::Snapshot { respond_to: tx })
            .await
            .map_err(|_| CoreError::ChannelClosed)?;
        rx.await.map_err(|_| CoreError::ChannelClosed)
    }

    /// Ask the actor to stop. Pending commands queued before this one are
    /// still processed.
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(TimerCommand::Shutdown)
            .await
            .map_err(|_| CoreError::ChannelClosed)
    }

    /// Subscribe to every event the engine produces, ticks included.
    ///
    /// Slow receivers may observe `RecvError::Lagged` and miss ticks.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_sender.subscribe()
    }

    /// `true` while the actor is still accepting commands.
    pub fn is_connected(&self) -> bool {
        !self.sender.is_closed()
    }
}
