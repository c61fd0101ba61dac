//! In-memory transport and harness shared by the integration tests.
//!
//! All tests run under paused tokio time, so the generous timeouts below
//! cost nothing in wall-clock terms; they exist to turn a hung test into a
//! panic with a message instead of a stuck binary.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::BoxFuture;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use pocket_agent::{
    AgentClient, AgentEvent, ClientConfig, ClientError, Collaborators, ConnectionState, Transport,
    TransportLink,
};

pub const EVENT_TIMEOUT: Duration = Duration::from_secs(3600);

/// Transport whose connections are in-memory channel pairs handed to the
/// test, one [`MockConnection`] per successful connect.
pub struct MockTransport {
    scripted_failures: Mutex<u32>,
    connections: mpsc::UnboundedSender<MockConnection>,
}

impl MockTransport {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<MockConnection>) {
        let (connections, rx) = mpsc::unbounded_channel();
        (
            Arc::new(Self {
                scripted_failures: Mutex::new(0),
                connections,
            }),
            rx,
        )
    }

    /// Scripts the next `count` connect attempts to fail at handshake.
    pub fn fail_next_connects(&self, count: u32) {
        *self.scripted_failures.lock().unwrap() = count;
    }
}

impl Transport for MockTransport {
    fn connect(&self, _endpoint: &str) -> BoxFuture<'static, Result<TransportLink, ClientError>> {
        {
            let mut failures = self.scripted_failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Box::pin(async {
                    Err(ClientError::Handshake("connection refused".to_string()))
                });
            }
        }

        let (outbound_tx, mut outbound_rx) = mpsc::channel::<String>(64);
        let (inbound_tx, inbound_rx) = mpsc::channel::<String>(64);
        let (sent_tx, sent_rx) = mpsc::unbounded_channel::<String>();
        let (kill_tx, mut kill_rx) = oneshot::channel::<()>();

        // Forwarder stands in for the socket's write half. Killing it closes
        // the outbound channel, which is exactly how a broken sink looks to
        // the client: try_send starts failing while the read half stays up.
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    outbound = outbound_rx.recv() => match outbound {
                        Some(text) => {
                            if sent_tx.send(text).is_err() {
                                break;
                            }
                        }
                        None => break,
                    },
                    _ = &mut kill_rx => break,
                }
            }
        });

        let _ = self.connections.send(MockConnection {
            sent: sent_rx,
            push: inbound_tx,
            kill: Some(kill_tx),
        });

        Box::pin(async move {
            Ok(TransportLink {
                outbound: outbound_tx,
                inbound: inbound_rx,
            })
        })
    }
}

/// Test-side handle to one live mock connection.
///
/// Dropping it closes the inbound channel, which the client observes as the
/// server closing the socket.
pub struct MockConnection {
    sent: mpsc::UnboundedReceiver<String>,
    push: mpsc::Sender<String>,
    kill: Option<oneshot::Sender<()>>,
}

impl MockConnection {
    /// Delivers one server frame to the client.
    pub async fn push_json(&self, frame: Value) {
        self.push
            .send(frame.to_string())
            .await
            .expect("client dropped the inbound channel");
    }

    /// Next frame the client transmitted, parsed.
    pub async fn next_sent(&mut self) -> Value {
        let text = tokio::time::timeout(EVENT_TIMEOUT, self.sent.recv())
            .await
            .expect("timed out waiting for an outbound frame")
            .expect("mock sink task ended");
        serde_json::from_str(&text).expect("outbound frames are JSON")
    }

    /// Non-blocking probe for an outbound frame.
    pub fn try_next_sent(&mut self) -> Option<Value> {
        let text = self.sent.try_recv().ok()?;
        Some(serde_json::from_str(&text).expect("outbound frames are JSON"))
    }

    /// Breaks the write half while keeping the read half alive.
    pub fn kill_sink(&mut self) {
        if let Some(kill) = self.kill.take() {
            let _ = kill.send(());
        }
    }
}

pub async fn next_event(events: &mut mpsc::UnboundedReceiver<AgentEvent>) -> AgentEvent {
    tokio::time::timeout(EVENT_TIMEOUT, events.recv())
        .await
        .expect("timed out waiting for an event")
        .expect("event stream closed")
}

/// Skips events until one matches `pred`; panics on timeout.
pub async fn wait_for<F>(events: &mut mpsc::UnboundedReceiver<AgentEvent>, mut pred: F) -> AgentEvent
where
    F: FnMut(&AgentEvent) -> bool,
{
    loop {
        let event = next_event(events).await;
        if pred(&event) {
            return event;
        }
    }
}

pub struct Harness {
    pub client: AgentClient,
    pub events: mpsc::UnboundedReceiver<AgentEvent>,
    pub transport: Arc<MockTransport>,
    pub connections: mpsc::UnboundedReceiver<MockConnection>,
}

pub fn harness() -> Harness {
    harness_with(Collaborators::default())
}

pub fn harness_with(collaborators: Collaborators) -> Harness {
    harness_full(ClientConfig::new("ws://agent.test/ws"), collaborators)
}

pub fn harness_full(config: ClientConfig, collaborators: Collaborators) -> Harness {
    let (transport, connections) = MockTransport::new();
    let (client, events) = pocket_agent::spawn(Arc::new(config), transport.clone(), collaborators);
    Harness {
        client,
        events,
        transport,
        connections,
    }
}

impl Harness {
    /// Connects and waits for the `connected` transition.
    pub async fn connect(&mut self) -> MockConnection {
        self.client.connect();
        wait_for(&mut self.events, |event| {
            matches!(
                event,
                AgentEvent::Connection {
                    state: ConnectionState::Connected,
                }
            )
        })
        .await;
        self.next_connection().await
    }

    pub async fn next_connection(&mut self) -> MockConnection {
        tokio::time::timeout(EVENT_TIMEOUT, self.connections.recv())
            .await
            .expect("timed out waiting for a connection")
            .expect("transport dropped")
    }
}
