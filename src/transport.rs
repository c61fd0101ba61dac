use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

use crate::config::validate_endpoint;
use crate::error::ClientError;

/// Channel depth between the session core and a live socket.
pub(crate) const LINK_BUFFER: usize = 64;
/// How long the liveness probe waits for its pong.
pub(crate) const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// One live connection, bridged to channel halves.
///
/// The session core only ever touches these channels; the socket itself
/// lives on the bridge tasks, so all socket I/O stays off the serialized
/// mutation path. Dropping the link (or the socket dying) closes both
/// halves, which is how each side observes the other going away.
pub struct TransportLink {
    /// Outbound text frames toward the server.
    pub outbound: mpsc::Sender<String>,
    /// Inbound text frames from the server.
    pub inbound: mpsc::Receiver<String>,
}

/// Connection factory seam.
///
/// `connect` resolves only after the channel is live: handshake done and
/// liveness confirmed. The in-memory test transport resolves immediately;
/// the websocket implementation performs a ping/pong round first.
pub trait Transport: Send + Sync + 'static {
    fn connect(&self, endpoint: &str) -> BoxFuture<'static, Result<TransportLink, ClientError>>;
}

/// Production transport: one websocket per connection generation.
#[derive(Debug, Default)]
pub struct WebSocketTransport;

impl WebSocketTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for WebSocketTransport {
    fn connect(&self, endpoint: &str) -> BoxFuture<'static, Result<TransportLink, ClientError>> {
        let endpoint = endpoint.to_string();
        Box::pin(async move {
            let url = validate_endpoint(&endpoint)?;
            let (stream, _) = tokio_tungstenite::connect_async(url.as_str())
                .await
                .map_err(|error| ClientError::Handshake(error.to_string()))?;
            debug!(%endpoint, "websocket handshake complete");

            let (mut sink, mut source) = stream.split();
            let (outbound_tx, mut outbound_rx) = mpsc::channel::<String>(LINK_BUFFER);
            let (inbound_tx, inbound_rx) = mpsc::channel::<String>(LINK_BUFFER);
            let (pong_tx, pong_rx) = oneshot::channel::<()>();

            // Reader half: text frames flow to the core; the first pong
            // confirms liveness. Dropping `inbound_tx` ends the stream from
            // the core's perspective.
            tokio::spawn(async move {
                let mut pong_tx = Some(pong_tx);
                while let Some(message) = source.next().await {
                    match message {
                        Ok(Message::Text(text)) => {
                            if inbound_tx.send(text).await.is_err() {
                                return;
                            }
                        }
                        Ok(Message::Pong(_)) => {
                            if let Some(tx) = pong_tx.take() {
                                let _ = tx.send(());
                            }
                        }
                        Ok(Message::Close(_)) => break,
                        Ok(_) => {}
                        Err(error) => {
                            warn!(%error, "websocket receive failed");
                            break;
                        }
                    }
                }
            });

            // Liveness probe gates the `connected` transition on a pong, not
            // on the first payload frame.
            sink.send(Message::Ping(Vec::new()))
                .await
                .map_err(|error| ClientError::Handshake(error.to_string()))?;
            tokio::time::timeout(PROBE_TIMEOUT, pong_rx)
                .await
                .map_err(|_| ClientError::ProbeTimeout)?
                .map_err(|_| ClientError::ProbeTimeout)?;

            // Writer half takes the sink only after the probe succeeded.
            tokio::spawn(async move {
                while let Some(text) = outbound_rx.recv().await {
                    if let Err(error) = sink.send(Message::Text(text)).await {
                        warn!(%error, "websocket send failed");
                        break;
                    }
                }
                let _ = sink.send(Message::Close(None)).await;
            });

            Ok(TransportLink {
                outbound: outbound_tx,
                inbound: inbound_rx,
            })
        })
    }
}
