//! Terminal delivery for phase-completion alerts.

use std::io::Write;

use studyflow_core::NotificationPort;
use tracing::warn;

/// Writes alerts to stderr, optionally ringing the terminal bell.
#[derive(Debug, Clone, Copy)]
pub struct TerminalNotifier {
    bell: bool,
}

impl TerminalNotifier {
    pub fn new(bell: bool) -> Self {
        Self { bell }
    }

    fn render(&self, title: &str, body: &str) -> String {
        let bell = if self.bell { "\x07" } else { "" };
        format!("{bell}{title}: {body}\n")
    }
}

impl NotificationPort for TerminalNotifier {
    fn notify_phase_complete(&self, title: &str, body: &str) {
        let mut stderr = std::io::stderr().lock();
        let sent = stderr
            .write_all(self.render(title, body).as_bytes())
            .and_then(|()| stderr.flush());
        if let Err(e) = sent {
            warn!(error = %e, "failed to deliver completion notification");
        }
    }
}
