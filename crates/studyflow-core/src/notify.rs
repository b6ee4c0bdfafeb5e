//! Completion notifications.
//!
//! The engine asks a [`NotificationPort`] to tell the user a phase ended. It
//! never learns whether the request succeeded: delivery problems stay inside
//! the port, which logs and drops them.

use tracing::info;

pub const COMPLETION_TITLE: &str = "Timer Complete";
pub const FOCUS_DONE_BODY: &str = "Time for a break!";
pub const BREAK_DONE_BODY: &str = "Ready to focus?";

/// Capability for surfacing phase-completion alerts to the user.
///
/// Implementations must not panic and must not block for long; the engine
/// calls this inline from its single control flow, once per completion.
pub trait NotificationPort: Send {
    fn notify_phase_complete(&self, title: &str, body: &str);
}

/// Drops every notification. Useful when alerts are disabled in config.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNotifier;

impl NotificationPort for SilentNotifier {
    fn notify_phase_complete(&self, _title: &str, _body: &str) {}
}

/// Routes notifications into the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl NotificationPort for LogNotifier {
    fn notify_phase_complete(&self, title: &str, body: &str) {
        info!(title, body, "phase complete");
    }
}
