//! The session actor: one serialized mutation path for all protocol state.
//!
//! Everything asynchronous — socket bridges, decode, timers — lives on
//! spawned tasks that only ever send [`CoreMsg`]s back to the actor. The
//! actor drains them one at a time, so no two frame handlers or timer
//! callbacks can race on shared state. Stale continuations are neutralized
//! by the generation token carried in every connection-scoped message.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

use agent_wire::{
    decode_frame, encode_frame, sanitize_session_id, AbortFrame, ApprovalResponseFrame,
    CommandFrame, CommandOptions, InboundFrame,
};

use crate::approvals::{ApprovalGate, ModelSwitch, MODEL_SWITCH_TIMEOUT};
use crate::assembler::{StreamAssembler, TEXT_QUIESCENCE};
use crate::collaborators::{Collaborators, NotificationKind, SettingsProvider};
use crate::error::ClientError;
use crate::event::AgentEvent;
use crate::queue::{
    CommandRequest, OutboundQueue, PendingCommand, SendFailure, SEND_GRACE_DELAY,
};
use crate::recovery::{RecoveryCoordinator, ATTACH_SETTLE_DELAY};
use crate::supervisor::{ConnectionState, Supervisor};
use crate::transport::{Transport, TransportLink, WebSocketTransport};
use crate::watchdog::{timeout_message, Watchdog, WATCHDOG_POLL_INTERVAL};

/// Messages handled by the session actor.
pub(crate) enum CoreMsg {
    // Host-facing operations.
    Connect,
    Disconnect,
    Submit(PendingCommand),
    Abort,
    Attach {
        session_id: String,
        project_path: String,
    },
    RecoverFromBackground {
        session_id: String,
        project_path: String,
    },
    RespondApproval {
        request_id: String,
        allow: bool,
        always_allow: bool,
    },
    SwitchModel {
        model: String,
    },
    ClearSession,
    SetForeground(bool),
    // Connection-scoped continuations; `token` is the generation they were
    // minted under.
    ConnectFinished {
        token: u64,
        result: Result<TransportLink, ClientError>,
    },
    Inbound {
        token: u64,
        frame: InboundFrame,
    },
    LinkClosed {
        token: u64,
    },
    ReconnectFire {
        token: u64,
    },
    AttachSettle {
        token: u64,
    },
    // Cooperative timers; each re-checks its arming condition on entry.
    RetryFire {
        command_id: Uuid,
    },
    GraceRecheck {
        command_id: Uuid,
    },
    WatchdogTick,
    FlushTick {
        epoch: u64,
    },
    SwitchExpire {
        epoch: u64,
    },
}

/// Cloneable handle to a running session actor.
///
/// Every method is fire-and-forget into the actor's mailbox; results come
/// back on the event stream returned by [`spawn`].
#[derive(Clone)]
pub struct AgentClient {
    tx: mpsc::UnboundedSender<CoreMsg>,
    state_rx: watch::Receiver<ConnectionState>,
}

impl AgentClient {
    /// Spawns a session actor over the production websocket transport.
    pub fn over_websocket(
        settings: Arc<dyn SettingsProvider>,
        collaborators: Collaborators,
    ) -> (Self, mpsc::UnboundedReceiver<AgentEvent>) {
        spawn(settings, Arc::new(WebSocketTransport::new()), collaborators)
    }

    pub fn connect(&self) {
        self.send(CoreMsg::Connect);
    }

    pub fn disconnect(&self) {
        self.send(CoreMsg::Disconnect);
    }

    /// Queues a command; returns its id for correlating failure events.
    pub fn submit(&self, request: CommandRequest) -> Uuid {
        let pending = PendingCommand::from_request(request);
        let id = pending.id;
        self.send(CoreMsg::Submit(pending));
        id
    }

    /// Asks the server to abort the current turn.
    pub fn abort(&self) {
        self.send(CoreMsg::Abort);
    }

    /// Reattaches to a session that may already be producing output.
    pub fn attach_to_session(&self, session_id: impl Into<String>, project_path: impl Into<String>) {
        self.send(CoreMsg::Attach {
            session_id: session_id.into(),
            project_path: project_path.into(),
        });
    }

    /// Resumes a session after the app returns from the background,
    /// connecting first when necessary.
    pub fn recover_from_background(
        &self,
        session_id: impl Into<String>,
        project_path: impl Into<String>,
    ) {
        self.send(CoreMsg::RecoverFromBackground {
            session_id: session_id.into(),
            project_path: project_path.into(),
        });
    }

    pub fn respond_to_approval(&self, request_id: impl Into<String>, allow: bool, always_allow: bool) {
        self.send(CoreMsg::RespondApproval {
            request_id: request_id.into(),
            allow,
            always_allow,
        });
    }

    pub fn switch_model(&self, model: impl Into<String>) {
        self.send(CoreMsg::SwitchModel {
            model: model.into(),
        });
    }

    /// Unbinds the session id; the next command starts a fresh session.
    pub fn clear_session(&self) {
        self.send(CoreMsg::ClearSession);
    }

    pub fn set_foreground(&self, foreground: bool) {
        self.send(CoreMsg::SetForeground(foreground));
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Watch channel for state-driven UI without consuming the event stream.
    pub fn state_watch(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    fn send(&self, msg: CoreMsg) {
        if self.tx.send(msg).is_err() {
            debug!("session actor is gone; dropping operation");
        }
    }
}

/// Spawns the session actor and returns its handle plus the event stream.
pub fn spawn(
    settings: Arc<dyn SettingsProvider>,
    transport: Arc<dyn Transport>,
    collaborators: Collaborators,
) -> (AgentClient, mpsc::UnboundedReceiver<AgentEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);

    let session = Session {
        settings,
        transport,
        collaborators,
        tx: tx.clone(),
        events: events_tx,
        state_tx,
        supervisor: Supervisor::new(),
        queue: OutboundQueue::new(),
        assembler: StreamAssembler::new(),
        watchdog: Watchdog::new(),
        watchdog_armed: None,
        recovery: RecoveryCoordinator::new(),
        approvals: ApprovalGate::new(),
        model_switch: ModelSwitch::new(),
        link: None,
        session_id: None,
        last_project_path: ".".to_string(),
        foreground: true,
    };
    tokio::spawn(session.run(rx));

    (AgentClient { tx, state_rx }, events_rx)
}

struct Session {
    settings: Arc<dyn SettingsProvider>,
    transport: Arc<dyn Transport>,
    collaborators: Collaborators,
    tx: mpsc::UnboundedSender<CoreMsg>,
    events: mpsc::UnboundedSender<AgentEvent>,
    state_tx: watch::Sender<ConnectionState>,

    supervisor: Supervisor,
    queue: OutboundQueue,
    assembler: StreamAssembler,
    watchdog: Watchdog,
    watchdog_armed: Option<Arc<AtomicBool>>,
    recovery: RecoveryCoordinator,
    approvals: ApprovalGate,
    model_switch: ModelSwitch,

    /// Outbound half of the current generation's link.
    link: Option<mpsc::Sender<String>>,
    session_id: Option<String>,
    last_project_path: String,
    foreground: bool,
}

impl Session {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<CoreMsg>) {
        while let Some(msg) = rx.recv().await {
            self.handle(msg);
        }
    }

    fn handle(&mut self, msg: CoreMsg) {
        match msg {
            CoreMsg::Connect => self.start_connect(),
            CoreMsg::Disconnect => self.handle_disconnect(),
            CoreMsg::Submit(pending) => {
                self.last_project_path = pending.project_path.clone();
                self.queue.push(pending);
                self.maybe_send_head();
            }
            CoreMsg::Abort => self.handle_abort(),
            CoreMsg::Attach {
                session_id,
                project_path,
            } => self.handle_attach(session_id, project_path),
            CoreMsg::RecoverFromBackground {
                session_id,
                project_path,
            } => self.handle_background_recovery(session_id, project_path),
            CoreMsg::RespondApproval {
                request_id,
                allow,
                always_allow,
            } => self.handle_approval_response(request_id, allow, always_allow),
            CoreMsg::SwitchModel { model } => self.handle_model_switch(model),
            CoreMsg::ClearSession => {
                self.session_id = None;
                self.emit(AgentEvent::SessionCleared);
            }
            CoreMsg::SetForeground(foreground) => self.foreground = foreground,
            CoreMsg::ConnectFinished { token, result } => self.handle_connect_finished(token, result),
            CoreMsg::Inbound { token, frame } => self.handle_inbound(token, frame),
            CoreMsg::LinkClosed { token } => {
                debug!(token, "link closed");
                self.connection_lost(token);
            }
            CoreMsg::ReconnectFire { token } => {
                if self.supervisor.reconnect_due(token) {
                    self.start_connect();
                }
            }
            CoreMsg::AttachSettle { token } => {
                if self.supervisor.is_current(token) {
                    if let Some((session_id, project_path)) = self.recovery.take_background() {
                        self.handle_attach(session_id, project_path);
                    }
                }
            }
            CoreMsg::RetryFire { command_id } => {
                if self.queue.retry_due(command_id) {
                    self.maybe_send_head();
                }
            }
            CoreMsg::GraceRecheck { command_id } => self.handle_grace_recheck(command_id),
            CoreMsg::WatchdogTick => self.handle_watchdog_tick(),
            CoreMsg::FlushTick { epoch } => self.handle_flush_tick(epoch),
            CoreMsg::SwitchExpire { epoch } => {
                if self.model_switch.expire(epoch) {
                    debug!("model switch timed out without confirmation");
                }
            }
        }
    }

    // --- connection lifecycle ---

    fn start_connect(&mut self) {
        let token = self.supervisor.begin_connect();
        self.link = None;
        self.set_state(self.supervisor.state());

        let endpoint = self.settings.endpoint_url();
        let transport = Arc::clone(&self.transport);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = transport.connect(&endpoint).await;
            let _ = tx.send(CoreMsg::ConnectFinished { token, result });
        });
    }

    fn handle_connect_finished(&mut self, token: u64, result: Result<TransportLink, ClientError>) {
        if !self.supervisor.is_current(token) {
            debug!(token, "discarding connect result from a superseded attempt");
            return;
        }

        match result {
            Ok(link) => {
                self.supervisor.confirm_connected(token);
                self.set_state(ConnectionState::Connected);
                let TransportLink { outbound, inbound } = link;
                self.link = Some(outbound);
                self.spawn_reader(token, inbound);

                if self.recovery.has_background_target() {
                    self.spawn_delayed(ATTACH_SETTLE_DELAY, CoreMsg::AttachSettle { token });
                }
                self.maybe_send_head();
            }
            Err(error) => {
                warn!(%error, "connection attempt failed");
                self.connection_lost(token);
            }
        }
    }

    fn handle_disconnect(&mut self) {
        self.supervisor.disconnect();
        self.link = None;
        self.reset_turn_state();
        self.set_state(ConnectionState::Disconnected);
    }

    fn connection_lost(&mut self, token: u64) {
        if !self.supervisor.is_current(token) {
            return;
        }
        self.link = None;
        // A dropped connection must not leave the UI believing a response is
        // still arriving.
        self.reset_turn_state();

        if let Some((attempt, delay)) = self.supervisor.connection_lost(token) {
            debug!(attempt, ?delay, "scheduling reconnect");
            self.set_state(ConnectionState::Reconnecting { attempt });
            self.spawn_delayed(delay, CoreMsg::ReconnectFire { token });
        }
    }

    fn reset_turn_state(&mut self) {
        self.queue.abort_turn();
        self.disarm_watchdog();
        self.assembler.clear();
        self.recovery.abandon();
    }

    /// Decodes inbound frames off the serialized mutation path and feeds the
    /// results back as generation-tagged messages.
    fn spawn_reader(&self, token: u64, mut inbound: mpsc::Receiver<String>) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            while let Some(text) = inbound.recv().await {
                match decode_frame(&text) {
                    Ok(InboundFrame::Unknown { frame_type, .. }) => {
                        debug!(%frame_type, "dropping unknown frame");
                    }
                    Ok(frame) => {
                        if tx.send(CoreMsg::Inbound { token, frame }).is_err() {
                            return;
                        }
                    }
                    Err(error) => warn!(%error, "dropping undecodable frame"),
                }
            }
            let _ = tx.send(CoreMsg::LinkClosed { token });
        });
    }

    // --- outbound path ---

    fn maybe_send_head(&mut self) {
        if !self.queue.can_send() {
            return;
        }

        match self.supervisor.state() {
            ConnectionState::Connected if self.link.is_some() => self.transmit_head(),
            ConnectionState::Disconnected => {
                let Some(head) = self.queue.head() else { return };
                let command_id = head.id;
                self.queue.begin_grace();
                self.start_connect();
                self.spawn_delayed(SEND_GRACE_DELAY, CoreMsg::GraceRecheck { command_id });
            }
            _ => {
                // A connect attempt is already under way; give it the same
                // grace window before giving up on the command.
                let Some(head) = self.queue.head() else { return };
                let command_id = head.id;
                self.queue.begin_grace();
                self.spawn_delayed(SEND_GRACE_DELAY, CoreMsg::GraceRecheck { command_id });
            }
        }
    }

    fn handle_grace_recheck(&mut self, command_id: Uuid) {
        if !self.queue.grace_due(command_id) {
            return;
        }

        if matches!(self.supervisor.state(), ConnectionState::Connected) && self.link.is_some() {
            self.transmit_head();
        } else if let Some(dropped) = self.queue.drop_head() {
            // Still not viable: fail without consuming a send retry.
            self.emit(AgentEvent::CommandFailed {
                command_id: dropped.id,
                message: ClientError::NotConnected.to_string(),
            });
            self.maybe_send_head();
        }
    }

    fn transmit_head(&mut self) {
        let Some(head) = self.queue.head() else { return };

        let frame = CommandFrame {
            command: head.payload.clone(),
            options: CommandOptions {
                cwd: head.project_path.clone(),
                session_id: head.session_id.clone().or_else(|| self.session_id.clone()),
                model: head
                    .model
                    .clone()
                    .or_else(|| self.settings.default_model()),
                permission_mode: head
                    .permission_mode
                    .clone()
                    .or_else(|| self.settings.default_permission_mode()),
                images: head.images.clone(),
            },
        };

        let text = match encode_frame(&frame) {
            Ok(text) => text,
            Err(error) => {
                let error = ClientError::from(error);
                warn!(%error, "failed to encode command");
                if let Some(dropped) = self.queue.drop_head() {
                    self.emit(AgentEvent::CommandFailed {
                        command_id: dropped.id,
                        message: error.to_string(),
                    });
                }
                return;
            }
        };

        self.arm_watchdog();
        if self.send_raw(text) {
            if let Some(sent) = self.queue.mark_sent() {
                debug!(command_id = %sent.id, attempts = sent.attempts, "command transmitted");
            }
        } else {
            self.disarm_watchdog();
            self.handle_send_failure();
        }
    }

    fn handle_send_failure(&mut self) {
        match self.queue.record_failure() {
            Some(SendFailure::Retry { command_id, delay }) => {
                debug!(%command_id, ?delay, "scheduling send retry");
                if !matches!(self.supervisor.state(), ConnectionState::Connected)
                    || self.link.is_none()
                {
                    self.start_connect();
                }
                self.spawn_delayed(delay, CoreMsg::RetryFire { command_id });
            }
            Some(SendFailure::Exhausted(dropped)) => {
                self.emit(AgentEvent::CommandFailed {
                    command_id: dropped.id,
                    message: ClientError::DeliveryExhausted {
                        attempts: dropped.attempts,
                    }
                    .to_string(),
                });
                self.maybe_send_head();
            }
            None => {}
        }
    }

    fn send_raw(&self, text: String) -> bool {
        match &self.link {
            Some(link) => link.try_send(text).is_ok(),
            None => false,
        }
    }

    // --- inbound path ---

    fn handle_inbound(&mut self, token: u64, frame: InboundFrame) {
        if !self.supervisor.is_current(token) {
            debug!(token, frame_type = frame.frame_type(), "ignoring frame from a stale generation");
            return;
        }
        self.watchdog.record_activity(Instant::now());

        match frame {
            InboundFrame::SessionCreated { session_id } => {
                match sanitize_session_id(session_id.as_deref()) {
                    Some(valid) => self.bind_session(valid),
                    None => warn!("session-created frame carried an invalid id"),
                }
            }
            InboundFrame::Response { blocks, .. } => {
                let (events, text_appended) = self.assembler.apply_blocks(blocks);
                let had_content = text_appended || !events.is_empty();
                for event in events {
                    self.emit(event);
                }
                if text_appended {
                    let epoch = self.assembler.arm_flush();
                    self.spawn_delayed(TEXT_QUIESCENCE, CoreMsg::FlushTick { epoch });
                }
                if had_content {
                    if let Some(session_id) = self.recovery.note_content() {
                        self.emit(AgentEvent::Reattached { session_id });
                    }
                }
            }
            InboundFrame::TokenBudget { usage } => {
                self.emit(AgentEvent::TokenUsageUpdated { usage });
            }
            InboundFrame::Complete { session_id } => {
                let committed = self.assembler.commit();
                if let Some(text) = committed.clone() {
                    self.emit(AgentEvent::TextCommitted { text });
                }
                if let Some(valid) = sanitize_session_id(session_id.as_deref()) {
                    self.bind_session(valid);
                }
                if let Some(session_id) = self.recovery.finish() {
                    self.emit(AgentEvent::Reattached { session_id });
                }
                self.finish_turn(AgentEvent::TurnCompleted);
                if let Some(model) = self
                    .model_switch
                    .confirm_from_text(committed.as_deref().unwrap_or(""))
                {
                    self.emit(AgentEvent::ModelSwitched { model });
                }
            }
            InboundFrame::Error { code, message } => {
                let recoverable = self.session_id.is_some()
                    && agent_wire::is_recoverable_session_error(code.as_deref(), &message);
                if recoverable {
                    debug!(%message, "recovering from an invalidated session");
                    self.session_id = None;
                    self.finish_turn(AgentEvent::SessionRecovered);
                } else {
                    self.finish_turn(AgentEvent::TurnFailed { message });
                }
            }
            InboundFrame::Aborted { .. } => {
                self.finish_turn(AgentEvent::TurnAborted);
            }
            InboundFrame::PermissionRequest { request } => {
                if self.approvals.offer(request.clone()) {
                    self.emit(AgentEvent::ApprovalRequested { request });
                }
            }
            InboundFrame::SessionsUpdated { data } => {
                self.emit(AgentEvent::SessionsUpdated { data });
            }
            InboundFrame::ProjectsUpdated { data } => {
                self.emit(AgentEvent::ProjectsUpdated { data });
            }
            InboundFrame::Unknown { .. } => {}
        }
    }

    fn bind_session(&mut self, session_id: String) {
        if self.session_id.as_deref() == Some(session_id.as_str()) {
            return;
        }
        self.session_id = Some(session_id.clone());
        self.emit(AgentEvent::SessionBound { session_id });
    }

    /// Closes the open turn with `terminal` and advances the queue.
    fn finish_turn(&mut self, terminal: AgentEvent) {
        self.disarm_watchdog();
        self.assembler.clear();
        self.emit(terminal);
        if self.queue.turn_finished() {
            self.maybe_send_head();
        }
    }

    // --- sub-protocols and recovery ---

    fn handle_abort(&mut self) {
        let Some(session_id) = self.session_id.clone() else {
            debug!("abort requested with no bound session");
            return;
        };
        match encode_frame(&AbortFrame { session_id }) {
            Ok(text) => {
                if !self.send_raw(text) {
                    debug!("abort frame could not be sent");
                }
            }
            Err(error) => warn!(%error, "failed to encode abort frame"),
        }
    }

    fn handle_attach(&mut self, session_id: String, project_path: String) {
        if !self.supervisor.is_viable() {
            warn!("ignoring reattach request while disconnected");
            return;
        }
        let Some(valid) = sanitize_session_id(Some(&session_id)) else {
            warn!(%session_id, "refusing to reattach to an invalid session id");
            return;
        };

        if self.recovery.is_reattaching() {
            debug!("superseding a reattach already in progress");
        }
        self.recovery.begin_reattach(valid.clone());
        self.last_project_path = project_path.clone();
        // A no-op command scoped to the session provokes the server into
        // flushing whatever it produced while we were unreachable.
        let probe = PendingCommand {
            session_id: Some(valid),
            ..PendingCommand::from_request(CommandRequest {
                command: String::new(),
                project_path,
                ..CommandRequest::default()
            })
        };
        self.queue.push(probe);
        self.maybe_send_head();
    }

    fn handle_background_recovery(&mut self, session_id: String, project_path: String) {
        if matches!(self.supervisor.state(), ConnectionState::Connected) {
            self.handle_attach(session_id, project_path);
            return;
        }
        self.recovery.store_background(session_id, project_path);
        self.start_connect();
    }

    fn handle_approval_response(&mut self, request_id: String, allow: bool, always_allow: bool) {
        let matches_pending = self
            .approvals
            .pending()
            .is_some_and(|pending| pending.id == request_id);
        if !matches_pending {
            debug!(%request_id, "approval response does not match the pending request");
        }

        match encode_frame(&ApprovalResponseFrame {
            request_id,
            allow,
            always_allow,
        }) {
            Ok(text) => {
                if !self.send_raw(text) {
                    warn!("approval response could not be sent");
                }
            }
            Err(error) => warn!(%error, "failed to encode approval response"),
        }
        // Cleared whatever happened above: a flaky send must not wedge the UI.
        self.approvals.clear();
    }

    fn handle_model_switch(&mut self, model: String) {
        if self.model_switch.is_switching() {
            debug!("superseding an unconfirmed model switch");
        }
        let epoch = self.model_switch.begin(model.clone());
        self.spawn_delayed(MODEL_SWITCH_TIMEOUT, CoreMsg::SwitchExpire { epoch });

        let request = CommandRequest {
            command: format!("/model {model}"),
            project_path: self.last_project_path.clone(),
            ..CommandRequest::default()
        };
        self.queue.push(PendingCommand::from_request(request));
        self.maybe_send_head();
    }

    // --- timers ---

    fn handle_watchdog_tick(&mut self) {
        if !self.queue.is_turn_open() || !self.watchdog.is_armed() {
            return;
        }
        let timeout = self.settings.processing_timeout();
        if self.watchdog.expired(Instant::now(), timeout).is_some() {
            let message = timeout_message(timeout, self.assembler.last_tool_name());
            warn!(%message, "watchdog declared a stall");
            self.finish_turn(AgentEvent::TurnFailed { message });
        }
    }

    fn handle_flush_tick(&mut self, epoch: u64) {
        if !self.assembler.flush_current(epoch) {
            return;
        }
        if let Some(text) = self.assembler.partial().map(ToString::to_string) {
            self.emit(AgentEvent::TextUpdated { text });
        }
    }

    fn arm_watchdog(&mut self) {
        self.watchdog.arm(Instant::now());
        let armed = Arc::new(AtomicBool::new(true));
        if let Some(previous) = self.watchdog_armed.replace(Arc::clone(&armed)) {
            previous.store(false, Ordering::Release);
        }
        let tx = self.tx.clone();
        tokio::spawn(async move {
            while armed.load(Ordering::Acquire) {
                tokio::time::sleep(WATCHDOG_POLL_INTERVAL).await;
                if !armed.load(Ordering::Acquire) {
                    break;
                }
                if tx.send(CoreMsg::WatchdogTick).is_err() {
                    break;
                }
            }
        });
    }

    fn disarm_watchdog(&mut self) {
        self.watchdog.disarm();
        if let Some(armed) = self.watchdog_armed.take() {
            armed.store(false, Ordering::Release);
        }
    }

    fn spawn_delayed(&self, delay: Duration, msg: CoreMsg) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(msg);
        });
    }

    // --- event plumbing ---

    fn set_state(&self, state: ConnectionState) {
        if *self.state_tx.borrow() == state {
            return;
        }
        let _ = self.state_tx.send(state);
        self.emit(AgentEvent::Connection { state });
    }

    fn emit(&self, event: AgentEvent) {
        self.collaborators
            .history
            .append(self.session_id.as_deref(), &event);

        if !self.foreground {
            match &event {
                AgentEvent::TurnCompleted => self
                    .collaborators
                    .notifier
                    .notify(NotificationKind::TurnCompleted, "The agent finished responding"),
                AgentEvent::ApprovalRequested { request } => self.collaborators.notifier.notify(
                    NotificationKind::ApprovalRequested,
                    &format!("Permission needed for {}", request.tool_name),
                ),
                AgentEvent::QuestionPosed { .. } => self
                    .collaborators
                    .notifier
                    .notify(NotificationKind::QuestionPosed, "The agent has a question"),
                _ => {}
            }
        }

        let _ = self.events.send(event);
    }
}
