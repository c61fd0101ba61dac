use std::time::Duration;

/// Settle delay between liveness confirmation and the automatic reattach.
pub(crate) const ATTACH_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Bookkeeping for reattaching to a session that was mid-processing when the
/// client lost connectivity or was backgrounded.
///
/// Reattachment works by sending a minimal no-op command scoped to the
/// session, purely to provoke the server into flushing whatever output it
/// produced while the client was unreachable. The sub-state exits on the
/// first content received or on the ordinary completion frame.
#[derive(Debug, Default)]
pub(crate) struct RecoveryCoordinator {
    reattaching: Option<String>,
    pending_background: Option<(String, String)>,
}

impl RecoveryCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_reattach(&mut self, session_id: String) {
        self.reattaching = Some(session_id);
    }

    pub fn is_reattaching(&self) -> bool {
        self.reattaching.is_some()
    }

    /// Any inbound content confirms the reattachment succeeded.
    pub fn note_content(&mut self) -> Option<String> {
        self.reattaching.take()
    }

    /// Completion without content also closes the sub-state.
    pub fn finish(&mut self) -> Option<String> {
        self.reattaching.take()
    }

    /// Connection loss mid-reattach abandons the sub-state; the stored
    /// background target (if any) is what drives another attempt.
    pub fn abandon(&mut self) {
        self.reattaching = None;
    }

    pub fn store_background(&mut self, session_id: String, project_path: String) {
        self.pending_background = Some((session_id, project_path));
    }

    pub fn has_background_target(&self) -> bool {
        self.pending_background.is_some()
    }

    pub fn take_background(&mut self) -> Option<(String, String)> {
        self.pending_background.take()
    }
}
