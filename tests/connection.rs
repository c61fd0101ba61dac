mod support;

use std::time::Duration;

use serde_json::json;

use pocket_agent::{AgentEvent, CommandRequest, ConnectionState};

use support::{harness, next_event, wait_for};

fn request(command: &str) -> CommandRequest {
    CommandRequest {
        command: command.to_string(),
        project_path: "/work/repo".to_string(),
        ..CommandRequest::default()
    }
}

#[tokio::test(start_paused = true)]
async fn connect_goes_through_connecting_to_connected() {
    let mut h = harness();
    assert_eq!(h.client.connection_state(), ConnectionState::Disconnected);

    h.client.connect();
    assert_eq!(
        next_event(&mut h.events).await,
        AgentEvent::Connection {
            state: ConnectionState::Connecting,
        }
    );
    assert_eq!(
        next_event(&mut h.events).await,
        AgentEvent::Connection {
            state: ConnectionState::Connected,
        }
    );
    assert_eq!(h.client.connection_state(), ConnectionState::Connected);

    let _conn = h.next_connection().await;
}

#[tokio::test(start_paused = true)]
async fn server_close_triggers_backoff_and_reconnect() {
    let mut h = harness();
    let conn = h.connect().await;

    // Server goes away.
    drop(conn);
    assert_eq!(
        wait_for(&mut h.events, |e| matches!(e, AgentEvent::Connection { .. })).await,
        AgentEvent::Connection {
            state: ConnectionState::Reconnecting { attempt: 1 },
        }
    );

    // Backoff elapses and a fresh connection comes up on its own.
    wait_for(&mut h.events, |e| {
        matches!(
            e,
            AgentEvent::Connection {
                state: ConnectionState::Connected,
            }
        )
    })
    .await;
    let _conn = h.next_connection().await;
    assert_eq!(h.client.connection_state(), ConnectionState::Connected);
}

#[tokio::test(start_paused = true)]
async fn repeated_failures_escalate_the_attempt_counter() {
    let mut h = harness();
    let conn = h.connect().await;

    // The next two reconnect attempts fail at handshake.
    h.transport.fail_next_connects(2);
    drop(conn);

    for expected in 1..=3u32 {
        let event = wait_for(&mut h.events, |e| {
            matches!(
                e,
                AgentEvent::Connection {
                    state: ConnectionState::Reconnecting { .. },
                }
            )
        })
        .await;
        assert_eq!(
            event,
            AgentEvent::Connection {
                state: ConnectionState::Reconnecting { attempt: expected },
            }
        );
    }

    // Third attempt succeeds and the counter resets on confirmation.
    wait_for(&mut h.events, |e| {
        matches!(
            e,
            AgentEvent::Connection {
                state: ConnectionState::Connected,
            }
        )
    })
    .await;
    let _conn = h.next_connection().await;
}

#[tokio::test(start_paused = true)]
async fn midturn_drop_resets_the_turn_and_streaming_buffer() {
    let mut h = harness();
    let mut conn = h.connect().await;

    h.client.submit(request("long answer"));
    conn.next_sent().await;

    // Partial text lands, then the link dies before the quiescence flush.
    conn.push_json(json!({"type": "claude-response", "data": "half a thou"}))
        .await;
    drop(conn);

    wait_for(&mut h.events, |e| {
        matches!(
            e,
            AgentEvent::Connection {
                state: ConnectionState::Connected,
            }
        )
    })
    .await;
    let mut conn = h.next_connection().await;

    // The interrupted turn no longer holds the queue.
    h.client.submit(request("fresh start"));
    let frame = conn.next_sent().await;
    assert_eq!(frame["command"], "fresh start");

    // Nothing from the dead turn leaked: no flush of the abandoned buffer,
    // no terminal event for a turn that never completed.
    tokio::time::sleep(Duration::from_secs(1)).await;
    while let Ok(event) = h.events.try_recv() {
        assert!(
            !matches!(
                event,
                AgentEvent::TextUpdated { .. } | AgentEvent::TextCommitted { .. }
            ),
            "stale text from the interrupted turn: {event:?}"
        );
        assert!(!event.is_terminal(), "spurious terminal event: {event:?}");
    }
}

#[tokio::test(start_paused = true)]
async fn manual_disconnect_is_terminal() {
    let mut h = harness();
    let _conn = h.connect().await;

    h.client.disconnect();
    assert_eq!(
        next_event(&mut h.events).await,
        AgentEvent::Connection {
            state: ConnectionState::Disconnected,
        }
    );

    // No auto-reconnect, however long we wait.
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(h.connections.try_recv().is_err());
    assert!(h.events.try_recv().is_err());
    assert_eq!(h.client.connection_state(), ConnectionState::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn frames_from_a_superseded_connection_are_ignored() {
    let mut h = harness();
    let stale = h.connect().await;

    h.client.disconnect();
    assert_eq!(
        next_event(&mut h.events).await,
        AgentEvent::Connection {
            state: ConnectionState::Disconnected,
        }
    );

    // The old reader is still alive; its frames must be dropped.
    stale
        .push_json(json!({
            "type": "session-created",
            "sessionId": "6f2a9c1e-3d4b-4a5c-8e7f-0123456789ab",
        }))
        .await;
    tokio::time::sleep(Duration::from_secs(1)).await;

    h.client.clear_session();
    assert_eq!(next_event(&mut h.events).await, AgentEvent::SessionCleared);
}
