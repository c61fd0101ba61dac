mod support;

use std::time::Duration;

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
async fn send_failures_exhaust_after_three_attempts() {
    let mut h = harness();
    let mut conn = h.connect().await;

    // Break the write half; the read half stays up so no reconnect runs.
    conn.kill_sink();
    tokio::time::sleep(Duration::from_millis(1)).await;

    let command_id = h.client.submit(request("doomed"));

    // Attempts at 0s, +1s, +2s, then the command is dropped.
    let event = wait_for(&mut h.events, |e| {
        matches!(e, AgentEvent::CommandFailed { .. })
    })
    .await;
    let AgentEvent::CommandFailed {
        command_id: failed,
        message,
    } = event
    else {
        unreachable!();
    };
    assert_eq!(failed, command_id);
    assert!(message.contains('3'), "message should name the attempt count: {message}");
}

#[tokio::test(start_paused = true)]
async fn exhaustion_does_not_block_the_next_command() {
    let mut h = harness();
    let mut conn = h.connect().await;
    conn.kill_sink();
    tokio::time::sleep(Duration::from_millis(1)).await;

    let doomed = h.client.submit(request("doomed"));
    wait_for(&mut h.events, |e| {
        matches!(e, AgentEvent::CommandFailed { command_id, .. } if *command_id == doomed)
    })
    .await;
    drop(conn);

    // The link comes back and a freshly queued command flows normally.
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

    h.client.submit(request("fine"));
    let frame = conn.next_sent().await;
    assert_eq!(frame["command"], "fine");
}

#[tokio::test(start_paused = true)]
async fn submit_while_disconnected_connects_and_sends() {
    let mut h = harness();

    h.client.submit(request("wake up"));

    // The submit itself triggers the connect.
    assert_eq!(
        next_event(&mut h.events).await,
        AgentEvent::Connection {
            state: ConnectionState::Connecting,
        }
    );
    let mut conn = h.next_connection().await;

    let frame = conn.next_sent().await;
    assert_eq!(frame["command"], "wake up");
}

#[tokio::test(start_paused = true)]
async fn command_fails_fast_when_the_connect_grace_runs_out() {
    let mut h = harness();
    h.transport.fail_next_connects(50);

    let command_id = h.client.submit(request("unreachable"));

    let event = wait_for(&mut h.events, |e| {
        matches!(e, AgentEvent::CommandFailed { .. })
    })
    .await;
    let AgentEvent::CommandFailed {
        command_id: failed, ..
    } = event
    else {
        unreachable!();
    };
    assert_eq!(failed, command_id);
}
