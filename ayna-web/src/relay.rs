//! Browser transport for the live relay.
//!
//! One [`LiveChannel`] per chat view mount. A writer task drains an
//! unbounded queue into the WebSocket sink; a reader task feeds incoming
//! frames through the shared [`RelaySession`] and hands chat messages to the
//! view.

use futures::channel::mpsc::{self, UnboundedSender};
use futures::{SinkExt, StreamExt};
use gloo_net::websocket::{Message, futures::WebSocket};
use shared::chat::MessageRelay;
use shared::models::{RelayInbound, RelayOutbound};
use shared::relay::{RelayAction, RelayError, RelaySession, socket_url};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen_futures::spawn_local;
use yew::Callback;

/// Live relay connection owned by the chat page.
pub struct LiveChannel {
    session: Rc<RefCell<RelaySession>>,
    outbound: UnboundedSender<String>,
}

impl std::fmt::Debug for LiveChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveChannel")
            .field("state", &self.session.borrow().state())
            .finish_non_exhaustive()
    }
}

impl LiveChannel {
    /// Connects to `relay_url` and starts the reader and writer tasks.
    pub fn open(relay_url: &str, on_message: Callback<RelayInbound>) -> Result<Self, RelayError> {
        let url = socket_url(relay_url)?;
        let socket =
            WebSocket::open(url.as_str()).map_err(|err| RelayError::Transport(err.to_string()))?;
        log::debug!("relay socket opening at {url}");
        let (mut sink, mut stream) = socket.split();
        let (outbound, mut queue) = mpsc::unbounded::<String>();
        let session = Rc::new(RefCell::new(RelaySession::new()));

        spawn_local(async move {
            while let Some(frame) = queue.next().await {
                if let Err(err) = sink.send(Message::Text(frame)).await {
                    log::warn!("relay write failed: {err}");
                    break;
                }
            }
            if let Err(err) = sink.close().await {
                log::debug!("relay close: {err}");
            }
        });

        let reader_session = Rc::clone(&session);
        let replies = outbound.clone();
        spawn_local(async move {
            while let Some(frame) = stream.next().await {
                let text = match frame {
                    Ok(Message::Text(text)) => text,
                    Ok(Message::Bytes(_)) => {
                        log::debug!("binary relay frame ignored");
                        continue;
                    }
                    Err(err) => {
                        log::warn!("relay connection error: {err}");
                        break;
                    }
                };
                let actions = match reader_session.borrow_mut().handle_frame(&text) {
                    Ok(actions) => actions,
                    Err(err) => {
                        log::warn!("{err}");
                        continue;
                    }
                };
                for action in actions {
                    match action {
                        RelayAction::Send(reply) => {
                            if replies.unbounded_send(reply).is_err() {
                                log::debug!("relay writer already stopped");
                            }
                        }
                        RelayAction::Deliver(message) => on_message.emit(message),
                        RelayAction::Connected => log::info!("live updates connected"),
                        RelayAction::Closed(reason) => {
                            log::warn!(
                                "live updates closed: {}",
                                reason.as_deref().unwrap_or("server closed the session")
                            );
                            replies.close_channel();
                        }
                    }
                }
            }
            reader_session.borrow_mut().disconnect();
            replies.close_channel();
            log::debug!("relay stream ended");
        });

        Ok(Self { session, outbound })
    }

    /// Sends the namespace disconnect and shuts the socket.
    pub fn close(&self) {
        if let Some(frame) = self.session.borrow_mut().disconnect() {
            if self.outbound.unbounded_send(frame).is_err() {
                log::debug!("relay writer already stopped");
            }
        }
        self.outbound.close_channel();
    }
}

impl MessageRelay for LiveChannel {
    fn publish(&self, message: &RelayOutbound) -> Result<(), RelayError> {
        let frame = self.session.borrow_mut().publish(message)?;
        if let Some(frame) = frame {
            self.outbound
                .unbounded_send(frame)
                .map_err(|_| RelayError::Closed)?;
        }
        Ok(())
    }
}

/// Stand-in used when the live channel could not be opened.
#[derive(Debug, Clone, Copy, Default)]
pub struct Offline;

impl MessageRelay for Offline {
    fn publish(&self, _message: &RelayOutbound) -> Result<(), RelayError> {
        Err(RelayError::Closed)
    }
}
