use std::time::Duration;

use tokio::time::Instant;

/// Cadence of the stall poll while a command is in flight.
pub(crate) const WATCHDOG_POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Default stall budget; user-configurable through the settings provider.
pub(crate) const DEFAULT_PROCESSING_TIMEOUT: Duration = Duration::from_secs(300);

/// Stall detector for an in-flight turn.
///
/// Armed when a command is transmitted; every inbound frame resets the
/// last-activity timestamp. The session actor polls on a fixed cadence and
/// force-completes the turn once the configured timeout elapses with no
/// inbound activity.
#[derive(Debug, Default)]
pub(crate) struct Watchdog {
    last_activity: Option<Instant>,
}

impl Watchdog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, now: Instant) {
        self.last_activity = Some(now);
    }

    pub fn disarm(&mut self) {
        self.last_activity = None;
    }

    pub fn is_armed(&self) -> bool {
        self.last_activity.is_some()
    }

    pub fn record_activity(&mut self, now: Instant) {
        if self.last_activity.is_some() {
            self.last_activity = Some(now);
        }
    }

    /// Returns the elapsed silence when it exceeds `timeout`.
    pub fn expired(&self, now: Instant, timeout: Duration) -> Option<Duration> {
        let last = self.last_activity?;
        let elapsed = now.saturating_duration_since(last);
        (elapsed >= timeout).then_some(elapsed)
    }
}

/// User-facing stall message; names the configured budget and the tool that
/// was running when the stream went quiet.
pub(crate) fn timeout_message(timeout: Duration, last_tool: Option<&str>) -> String {
    let seconds = timeout.as_secs();
    match last_tool {
        Some(tool) => {
            format!("Processing timed out after {seconds}s of inactivity (last tool: {tool})")
        }
        None => format!("Processing timed out after {seconds}s of inactivity"),
    }
}
