use std::time::Duration;

use rand::Rng;

/// Observable state of the single logical connection.
///
/// Transitions happen only inside the session actor; readers observe the
/// state through the watch channel on [`crate::AgentClient`] and through
/// [`crate::AgentEvent::Connection`] events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting { attempt: u32 },
}

pub(crate) const RECONNECT_BASE_DELAY_MS: u64 = 1000;
/// Exponent cap: nominal delay stops growing from attempt 4 onward (8s).
pub(crate) const RECONNECT_CAP_INDEX: u32 = 3;
pub(crate) const RECONNECT_JITTER_MS: u64 = 500;

/// Nominal reconnect delay for a 1-based attempt counter, before jitter.
pub(crate) fn nominal_reconnect_delay(attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(RECONNECT_CAP_INDEX);
    Duration::from_millis(RECONNECT_BASE_DELAY_MS * 2u64.saturating_pow(exponent))
}

/// Full reconnect delay: nominal backoff plus uniform jitter in `[0, 0.5)s`.
pub(crate) fn reconnect_delay(attempt: u32) -> Duration {
    let jitter = rand::thread_rng().gen_range(0..RECONNECT_JITTER_MS);
    nominal_reconnect_delay(attempt) + Duration::from_millis(jitter)
}

/// Connection lifecycle bookkeeping: state, generation tokens, and the
/// at-most-one pending reconnection.
///
/// The generation token is the sole defense against out-of-order effects
/// from superseded connection attempts: every continuation spawned for a
/// physical connection carries the token minted for it, and a message whose
/// token no longer matches the current generation is a no-op.
#[derive(Debug)]
pub(crate) struct Supervisor {
    state: ConnectionState,
    generation: u64,
    reconnect_attempt: u32,
    reconnect_pending: bool,
}

impl Supervisor {
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            generation: 0,
            reconnect_attempt: 0,
            reconnect_pending: false,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_current(&self, token: u64) -> bool {
        token == self.generation
    }

    pub fn is_viable(&self) -> bool {
        !matches!(self.state, ConnectionState::Disconnected)
    }

    /// Starts (or restarts) a physical connection attempt and mints a fresh
    /// generation token. Any scheduled reconnection is cancelled.
    pub fn begin_connect(&mut self) -> u64 {
        self.reconnect_pending = false;
        self.generation += 1;
        if !matches!(self.state, ConnectionState::Reconnecting { .. }) {
            self.state = ConnectionState::Connecting;
        }
        self.generation
    }

    /// Confirms liveness for `token`; stale tokens change nothing.
    pub fn confirm_connected(&mut self, token: u64) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.state = ConnectionState::Connected;
        self.reconnect_attempt = 0;
        true
    }

    /// Records a receive failure and, when appropriate, schedules the next
    /// reconnection. Returns the delay to wait before reconnecting.
    ///
    /// Exactly one reconnection may be scheduled at a time; a second failure
    /// while one is pending is ignored, as is any failure after a terminal
    /// `disconnect()` or from a stale generation.
    pub fn connection_lost(&mut self, token: u64) -> Option<(u32, Duration)> {
        if !self.is_current(token) || !self.is_viable() || self.reconnect_pending {
            return None;
        }

        self.reconnect_attempt += 1;
        self.reconnect_pending = true;
        self.state = ConnectionState::Reconnecting {
            attempt: self.reconnect_attempt,
        };
        Some((self.reconnect_attempt, reconnect_delay(self.reconnect_attempt)))
    }

    /// Consumes a fired reconnect timer. Returns true when the timer is still
    /// authoritative and a new connect should begin.
    pub fn reconnect_due(&mut self, token: u64) -> bool {
        if !self.is_current(token) || !self.reconnect_pending {
            return false;
        }
        self.reconnect_pending = false;
        !matches!(
            self.state,
            ConnectionState::Connected | ConnectionState::Disconnected
        )
    }

    /// Terminal, user-intentional shutdown. Bumps the generation so every
    /// in-flight continuation for the old connection becomes a no-op.
    pub fn disconnect(&mut self) {
        self.state = ConnectionState::Disconnected;
        self.generation += 1;
        self.reconnect_attempt = 0;
        self.reconnect_pending = false;
    }
}
