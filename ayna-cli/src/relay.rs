//! Terminal transport for the live relay over `tokio-tungstenite`.

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use shared::chat::MessageRelay;
use shared::models::{RelayInbound, RelayOutbound};
use shared::relay::{RelayAction, RelayError, RelaySession, RelayState, socket_url};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

/// A live relay connection with background reader and writer tasks.
#[derive(Debug)]
pub struct RelayConnection {
    session: Arc<Mutex<RelaySession>>,
    outbound: mpsc::UnboundedSender<String>,
    inbound: mpsc::UnboundedReceiver<RelayInbound>,
    state: watch::Receiver<RelayState>,
    writer: JoinHandle<()>,
    reader: JoinHandle<()>,
}

impl RelayConnection {
    pub async fn connect(relay_url: &str) -> Result<Self> {
        let url = socket_url(relay_url)?;
        let (socket, _) = connect_async(url.as_str())
            .await
            .with_context(|| format!("failed to connect to relay at {url}"))?;
        debug!(%url, "relay socket open");
        let (mut sink, mut stream) = socket.split();

        let session = Arc::new(Mutex::new(RelaySession::new()));
        let (outbound, mut queue) = mpsc::unbounded_channel::<String>();
        let (deliver, inbound) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(RelayState::Handshaking);

        let writer = tokio::spawn(async move {
            while let Some(frame) = queue.recv().await {
                if let Err(err) = sink.send(Message::Text(frame)).await {
                    warn!(%err, "relay write failed");
                    break;
                }
            }
            if let Err(err) = sink.close().await {
                debug!(%err, "relay close");
            }
        });

        let reader_session = Arc::clone(&session);
        let replies = outbound.clone();
        let reader = tokio::spawn(async move {
            while let Some(frame) = stream.next().await {
                let text = match frame {
                    Ok(Message::Text(text)) => text,
                    Ok(Message::Close(_)) => break,
                    Ok(_) => continue,
                    Err(err) => {
                        warn!(%err, "relay connection error");
                        break;
                    }
                };
                let handled = match reader_session.lock() {
                    Ok(mut session) => session.handle_frame(&text),
                    Err(_) => break,
                };
                let actions = match handled {
                    Ok(actions) => actions,
                    Err(err) => {
                        warn!(%err, "skipping relay frame");
                        continue;
                    }
                };
                for action in actions {
                    match action {
                        RelayAction::Send(reply) => {
                            if replies.send(reply).is_err() {
                                debug!("relay writer already stopped");
                            }
                        }
                        RelayAction::Deliver(message) => {
                            if deliver.send(message).is_err() {
                                debug!("no listener for relay messages");
                            }
                        }
                        RelayAction::Connected => {
                            info!("live updates connected");
                            state_tx.send_replace(RelayState::Connected);
                        }
                        RelayAction::Closed(reason) => {
                            warn!(
                                reason = reason.as_deref().unwrap_or("server closed the session"),
                                "live updates closed"
                            );
                            state_tx.send_replace(RelayState::Closed);
                        }
                    }
                }
            }
            if let Ok(mut session) = reader_session.lock() {
                session.disconnect();
            }
            state_tx.send_replace(RelayState::Closed);
            debug!("relay stream ended");
        });

        Ok(Self {
            session,
            outbound,
            inbound,
            state,
            writer,
            reader,
        })
    }

    /// Waits for the namespace connect ack.
    pub async fn wait_connected(&mut self, limit: Duration) -> Result<()> {
        let settled = tokio::time::timeout(
            limit,
            self.state
                .wait_for(|state| matches!(state, RelayState::Connected | RelayState::Closed)),
        )
        .await
        .context("timed out waiting for the relay")?
        .map(|state| *state)
        .context("relay task stopped")?;
        match settled {
            RelayState::Connected => Ok(()),
            _ => Err(RelayError::Closed.into()),
        }
    }

    /// The next chat message, or `None` once the connection is gone.
    pub async fn next_message(&mut self) -> Option<RelayInbound> {
        self.inbound.recv().await
    }

    /// Sends the namespace disconnect and waits for the writer to flush.
    pub async fn shutdown(self) {
        let frame = self
            .session
            .lock()
            .ok()
            .and_then(|mut session| session.disconnect());
        if let Some(frame) = frame {
            if self.outbound.send(frame).is_err() {
                debug!("relay writer already stopped");
            }
        }
        drop(self.outbound);
        self.reader.abort();
        if let Err(err) = self.writer.await {
            debug!(%err, "relay writer task ended abnormally");
        }
    }
}

impl MessageRelay for RelayConnection {
    fn publish(&self, message: &RelayOutbound) -> Result<(), RelayError> {
        let frame = self
            .session
            .lock()
            .map_err(|_| RelayError::Closed)?
            .publish(message)?;
        if let Some(frame) = frame {
            self.outbound.send(frame).map_err(|_| RelayError::Closed)?;
        }
        Ok(())
    }
}
