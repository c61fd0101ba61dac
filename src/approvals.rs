use std::time::Duration;

use tracing::debug;

use agent_wire::ApprovalRequest;

/// Defensive cap on how long the client stays in the "switching" state
/// waiting for a parseable confirmation.
pub(crate) const MODEL_SWITCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Single-slot gate for permission requests.
///
/// The server should never issue concurrent approval requests on one
/// session, but the client stays defensive: a second request arriving while
/// one is pending is dropped.
#[derive(Debug, Default)]
pub(crate) struct ApprovalGate {
    pending: Option<ApprovalRequest>,
}

impl ApprovalGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `request` as the pending approval. Returns false when one is
    /// already pending (the new request is dropped).
    pub fn offer(&mut self, request: ApprovalRequest) -> bool {
        if let Some(pending) = &self.pending {
            debug!(
                dropped = %request.id,
                pending = %pending.id,
                "dropping concurrent permission request"
            );
            return false;
        }
        self.pending = Some(request);
        true
    }

    pub fn pending(&self) -> Option<&ApprovalRequest> {
        self.pending.as_ref()
    }

    /// Cleared unconditionally once a response has been attempted, whatever
    /// the transport outcome, so the UI can never wedge on a flaky send.
    pub fn clear(&mut self) {
        self.pending = None;
    }
}

/// Model-switch sub-protocol: the switch is an ordinary command whose
/// confirmation arrives as natural-language text in the next completed turn.
#[derive(Debug, Default)]
pub(crate) struct ModelSwitch {
    requested: Option<String>,
    epoch: u64,
}

impl ModelSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a switch in progress and returns the epoch guarding its timer.
    pub fn begin(&mut self, model: String) -> u64 {
        self.requested = Some(model);
        self.epoch += 1;
        self.epoch
    }

    pub fn is_switching(&self) -> bool {
        self.requested.is_some()
    }

    /// Tries to read a confirmation out of a completed turn's text.
    pub fn confirm_from_text(&mut self, text: &str) -> Option<String> {
        let requested = self.requested.as_deref()?;
        if text_confirms_switch(text, requested) {
            self.epoch += 1;
            return self.requested.take();
        }
        None
    }

    /// Fires the defensive timer; clears the flag when the epoch still holds.
    pub fn expire(&mut self, epoch: u64) -> bool {
        if self.epoch != epoch || self.requested.is_none() {
            return false;
        }
        self.requested = None;
        true
    }
}

fn text_confirms_switch(text: &str, model: &str) -> bool {
    let text = text.to_lowercase();
    text.contains("model") && text.contains(&model.to_lowercase())
}

#[cfg(test)]
mod tests {
    use agent_wire::ApprovalRequest;

    use super::{ApprovalGate, ModelSwitch};

    fn request(id: &str) -> ApprovalRequest {
        ApprovalRequest {
            id: id.to_string(),
            tool_name: "Bash".to_string(),
            description: None,
            input: None,
        }
    }

    #[test]
    fn second_request_is_dropped_while_one_is_pending() {
        let mut gate = ApprovalGate::new();
        assert!(gate.offer(request("r1")));
        assert!(!gate.offer(request("r2")));
        assert_eq!(gate.pending().map(|r| r.id.as_str()), Some("r1"));

        gate.clear();
        assert!(gate.offer(request("r2")));
    }

    #[test]
    fn switch_confirms_when_the_text_names_the_model() {
        let mut switch = ModelSwitch::new();
        switch.begin("sonnet".to_string());

        assert_eq!(switch.confirm_from_text("thinking about it"), None);
        assert!(switch.is_switching());
        assert_eq!(
            switch.confirm_from_text("Model set to Sonnet."),
            Some("sonnet".to_string())
        );
        assert!(!switch.is_switching());
    }

    #[test]
    fn stale_expiry_does_not_cancel_a_newer_switch() {
        let mut switch = ModelSwitch::new();
        let first = switch.begin("sonnet".to_string());
        let second = switch.begin("opus".to_string());

        assert!(!switch.expire(first));
        assert!(switch.is_switching());
        assert!(switch.expire(second));
        assert!(!switch.is_switching());
    }

    #[test]
    fn expiry_after_confirmation_is_a_no_op() {
        let mut switch = ModelSwitch::new();
        let epoch = switch.begin("sonnet".to_string());
        switch.confirm_from_text("model is now sonnet");

        assert!(!switch.expire(epoch));
    }
}
