//! Live message relay: a sans-IO Socket.IO client.
//!
//! [`RelaySession`] consumes raw WebSocket text frames and tells the
//! transport what to write back and what to hand to the chat view. The
//! browser and terminal transports own the socket; this module owns the
//! protocol.

mod packet;

pub use packet::{DEFAULT_NAMESPACE, EnginePacket, Handshake, SocketPacket};

use crate::models::{RelayInbound, RelayOutbound};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

/// Event name used for chat traffic in both directions.
pub const MESSAGE_EVENT: &str = "message";

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("relay connection is closed")]
    Closed,

    #[error("malformed relay frame: {0}")]
    Protocol(String),

    #[error("unsupported relay packet type `{0}`")]
    Unsupported(char),

    #[error("invalid relay url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("relay transport failed: {0}")]
    Transport(String),

    #[error("failed to encode relay payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Builds the WebSocket endpoint for a relay base such as `http://host:1337`.
///
/// # Errors
/// Fails when `base` does not parse or uses a scheme other than
/// `http`, `https`, `ws` or `wss`.
pub fn socket_url(base: &str) -> Result<Url, RelayError> {
    let invalid = |reason: &str| RelayError::InvalidUrl {
        url: base.to_string(),
        reason: reason.to_string(),
    };
    let mut url = Url::parse(base).map_err(|err| invalid(&err.to_string()))?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        _ => return Err(invalid("expected an http(s) or ws(s) url")),
    };
    url.set_scheme(scheme)
        .map_err(|()| invalid("scheme cannot be changed"))?;

    let prefix = url.path().trim_end_matches('/').to_string();
    url.set_path(&format!("{prefix}/socket.io/"));
    url.set_query(Some("EIO=4&transport=websocket"));
    url.set_fragment(None);
    Ok(url)
}

/// Connection phase of a [`RelaySession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelayState {
    /// Waiting for the Engine.IO `open` packet.
    #[default]
    Handshaking,
    /// Namespace connect sent, waiting for the ack.
    Connecting,
    /// Events flow in both directions.
    Connected,
    /// Ended by either side; publishing fails from here on.
    Closed,
}

/// What the transport must do after feeding a frame to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayAction {
    /// Write this text frame to the socket.
    Send(String),
    /// Hand this message to the chat view.
    Deliver(RelayInbound),
    /// The namespace connect was acknowledged.
    Connected,
    /// The server ended the session; the reason is set for `connect_error`.
    Closed(Option<String>),
}

/// Socket.IO client state for one connection.
#[derive(Debug)]
pub struct RelaySession {
    namespace: String,
    state: RelayState,
    pending: Vec<String>,
}

impl Default for RelaySession {
    fn default() -> Self {
        Self::new()
    }
}

impl RelaySession {
    #[must_use]
    pub fn new() -> Self {
        Self::with_namespace(DEFAULT_NAMESPACE)
    }

    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            state: RelayState::Handshaking,
            pending: Vec::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> RelayState {
        self.state
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state == RelayState::Connected
    }

    /// Feeds one inbound text frame.
    ///
    /// Frames received after the session closed are dropped.
    ///
    /// # Errors
    /// Returns [`RelayError::Protocol`] when the Engine.IO layer cannot be
    /// decoded. Undecodable Socket.IO payloads are logged and skipped.
    pub fn handle_frame(&mut self, frame: &str) -> Result<Vec<RelayAction>, RelayError> {
        if self.state == RelayState::Closed {
            debug!(frame, "frame after close dropped");
            return Ok(Vec::new());
        }

        let mut actions = Vec::new();
        match EnginePacket::decode(frame)? {
            EnginePacket::Open(handshake) => {
                debug!(sid = %handshake.sid, ping_interval = handshake.ping_interval, "relay handshake");
                self.state = RelayState::Connecting;
                let connect = SocketPacket::Connect {
                    namespace: self.namespace.clone(),
                    payload: None,
                };
                actions.push(RelayAction::Send(
                    EnginePacket::Message(connect.encode()).encode(),
                ));
            }
            EnginePacket::Ping(data) => {
                actions.push(RelayAction::Send(EnginePacket::Pong(data).encode()));
            }
            EnginePacket::Close => {
                info!("relay closed by server");
                self.close();
                actions.push(RelayAction::Closed(None));
            }
            EnginePacket::Message(payload) => self.handle_socket(&payload, &mut actions),
            EnginePacket::Pong(_) | EnginePacket::Upgrade | EnginePacket::Noop => {}
        }
        Ok(actions)
    }

    fn handle_socket(&mut self, payload: &str, actions: &mut Vec<RelayAction>) {
        let packet = match SocketPacket::decode(payload) {
            Ok(packet) => packet,
            Err(err) => {
                debug!(%err, payload, "ignoring undecodable relay packet");
                return;
            }
        };
        if packet.namespace() != self.namespace {
            debug!(namespace = packet.namespace(), "packet for another namespace");
            return;
        }

        match packet {
            SocketPacket::Connect { .. } => {
                info!(namespace = %self.namespace, "relay connected");
                self.state = RelayState::Connected;
                actions.push(RelayAction::Connected);
                actions.extend(self.pending.drain(..).map(RelayAction::Send));
            }
            SocketPacket::Event { name, args, .. } if name == MESSAGE_EVENT => {
                let Some(first) = args.into_iter().next() else {
                    debug!("message event without payload");
                    return;
                };
                match serde_json::from_value::<RelayInbound>(first) {
                    Ok(inbound) => actions.push(RelayAction::Deliver(inbound)),
                    Err(err) => debug!(%err, "ignoring message event without text"),
                }
            }
            SocketPacket::Event { name, .. } => {
                debug!(event = %name, "ignoring relay event");
            }
            SocketPacket::Ack { ack_id, .. } => {
                debug!(ack_id, "ignoring relay ack");
            }
            SocketPacket::Disconnect { .. } => {
                info!("relay namespace disconnected by server");
                self.close();
                actions.push(RelayAction::Closed(None));
            }
            SocketPacket::ConnectError { payload, .. } => {
                let reason = payload.as_ref().and_then(|value| {
                    value
                        .get("message")
                        .and_then(|message| message.as_str())
                        .map(str::to_string)
                });
                warn!(reason = reason.as_deref().unwrap_or("unspecified"), "relay connect refused");
                self.close();
                actions.push(RelayAction::Closed(reason));
            }
        }
    }

    /// Encodes an outbound chat message.
    ///
    /// Returns the frame to write when connected. Before the connect ack the
    /// frame is buffered and `None` is returned; it comes back out of
    /// [`Self::handle_frame`] as a [`RelayAction::Send`].
    ///
    /// # Errors
    /// [`RelayError::Closed`] once the session has ended.
    pub fn publish(&mut self, message: &RelayOutbound) -> Result<Option<String>, RelayError> {
        if self.state == RelayState::Closed {
            return Err(RelayError::Closed);
        }
        let packet = SocketPacket::Event {
            namespace: self.namespace.clone(),
            ack_id: None,
            name: MESSAGE_EVENT.to_string(),
            args: vec![serde_json::to_value(message)?],
        };
        let frame = EnginePacket::Message(packet.encode()).encode();
        if self.is_connected() {
            Ok(Some(frame))
        } else {
            debug!(pending = self.pending.len() + 1, "buffering relay publish");
            self.pending.push(frame);
            Ok(None)
        }
    }

    /// Ends the session, returning the namespace disconnect frame to write
    /// if the server had been told about the namespace.
    pub fn disconnect(&mut self) -> Option<String> {
        let frame = matches!(self.state, RelayState::Connecting | RelayState::Connected).then(|| {
            let packet = SocketPacket::Disconnect {
                namespace: self.namespace.clone(),
            };
            EnginePacket::Message(packet.encode()).encode()
        });
        self.close();
        frame
    }

    fn close(&mut self) {
        self.state = RelayState::Closed;
        if !self.pending.is_empty() {
            warn!(dropped = self.pending.len(), "relay closed with unsent messages");
            self.pending.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPEN: &str =
        r#"0{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;

    fn outbound(text: &str) -> RelayOutbound {
        RelayOutbound {
            username: "alice".into(),
            text: text.into(),
            token: "abc".into(),
        }
    }

    fn connected() -> RelaySession {
        let mut session = RelaySession::new();
        session.handle_frame(OPEN).unwrap();
        session.handle_frame("40{\"sid\":\"s1\"}").unwrap();
        session
    }

    /// Test relay URL construction
    #[test]
    fn socket_url_maps_http_schemes() {
        assert_eq!(
            socket_url("http://localhost:1337").unwrap().as_str(),
            "ws://localhost:1337/socket.io/?EIO=4&transport=websocket"
        );
        assert_eq!(
            socket_url("https://chat.example.com/relay/").unwrap().as_str(),
            "wss://chat.example.com/relay/socket.io/?EIO=4&transport=websocket"
        );
        assert!(matches!(
            socket_url("ftp://example.com"),
            Err(RelayError::InvalidUrl { .. })
        ));
        assert!(socket_url("not a url").is_err());
    }

    /// The handshake answers with a namespace connect.
    #[test]
    fn open_triggers_namespace_connect() {
        let mut session = RelaySession::new();
        let actions = session.handle_frame(OPEN).unwrap();
        assert_eq!(actions, vec![RelayAction::Send("40".into())]);
        assert_eq!(session.state(), RelayState::Connecting);
    }

    /// Pings are answered with the same payload.
    #[test]
    fn ping_is_answered_with_matching_pong() {
        let mut session = connected();
        assert_eq!(
            session.handle_frame("2").unwrap(),
            vec![RelayAction::Send("3".into())]
        );
        assert_eq!(
            session.handle_frame("2probe").unwrap(),
            vec![RelayAction::Send("3probe".into())]
        );
    }

    /// Messages published early go out right after the connect ack.
    #[test]
    fn publishes_are_buffered_until_connect_ack() {
        let mut session = RelaySession::new();
        assert_eq!(session.publish(&outbound("early")).unwrap(), None);
        session.handle_frame(OPEN).unwrap();
        assert_eq!(session.pending.len(), 1);

        let actions = session.handle_frame("40").unwrap();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0], RelayAction::Connected);
        let RelayAction::Send(frame) = &actions[1] else {
            panic!("expected buffered frame");
        };
        assert!(frame.starts_with(r#"42["message",{"#));
        assert!(frame.contains(r#""text":"early""#));
        assert_eq!(session.pending.len(), 0);
    }

    /// Test the wire format of a published message
    #[test]
    fn publish_when_connected_returns_frame() {
        let mut session = connected();
        let frame = session.publish(&outbound("hi")).unwrap().unwrap();
        assert_eq!(
            frame,
            r#"42["message",{"username":"alice","text":"hi","token":"abc"}]"#
        );
    }

    /// `message` events reach the view with or without a sender.
    #[test]
    fn message_events_are_delivered() {
        let mut session = connected();
        let actions = session
            .handle_frame(r#"42["message",{"sender":"bob","text":"yo"}]"#)
            .unwrap();
        assert_eq!(
            actions,
            vec![RelayAction::Deliver(RelayInbound {
                sender: Some("bob".into()),
                text: "yo".into(),
            })]
        );

        let actions = session.handle_frame(r#"42["message",{"text":"anon"}]"#).unwrap();
        assert_eq!(
            actions,
            vec![RelayAction::Deliver(RelayInbound {
                sender: None,
                text: "anon".into(),
            })]
        );
    }

    /// Unknown events and undecodable payloads leave the session connected.
    #[test]
    fn other_events_and_junk_are_ignored() {
        let mut session = connected();
        assert!(session.handle_frame(r#"42["typing",{"user":"bob"}]"#).unwrap().is_empty());
        assert!(session.handle_frame(r#"42["message",{"sender":"bob"}]"#).unwrap().is_empty());
        assert!(session.handle_frame(r#"42["message"]"#).unwrap().is_empty());
        assert!(session.handle_frame("4garbage").unwrap().is_empty());
        assert!(session.handle_frame("6").unwrap().is_empty());
        assert!(session.is_connected());
    }

    /// Test an undecodable Engine.IO frame
    #[test]
    fn malformed_engine_frame_is_an_error() {
        let mut session = RelaySession::new();
        assert!(matches!(
            session.handle_frame("x"),
            Err(RelayError::Protocol(_))
        ));
    }

    /// A refused connect drops buffered messages and closes.
    #[test]
    fn connect_error_closes_with_reason() {
        let mut session = RelaySession::new();
        session.publish(&outbound("lost")).unwrap();
        session.handle_frame(OPEN).unwrap();
        let actions = session
            .handle_frame(r#"44{"message":"Not authorized"}"#)
            .unwrap();
        assert_eq!(
            actions,
            vec![RelayAction::Closed(Some("Not authorized".into()))]
        );
        assert_eq!(session.state(), RelayState::Closed);
        assert_eq!(session.pending.len(), 0);
        assert!(matches!(
            session.publish(&outbound("late")),
            Err(RelayError::Closed)
        ));
    }

    /// Server close and namespace disconnect both end the session.
    #[test]
    fn server_close_and_disconnect_end_the_session() {
        let mut session = connected();
        assert_eq!(session.handle_frame("1").unwrap(), vec![RelayAction::Closed(None)]);
        assert!(session.handle_frame("2").unwrap().is_empty());

        let mut session = connected();
        assert_eq!(session.handle_frame("41").unwrap(), vec![RelayAction::Closed(None)]);
        assert_eq!(session.state(), RelayState::Closed);
    }

    /// Disconnect writes `41` only while a session is live.
    #[test]
    fn client_disconnect_emits_frame_once() {
        let mut session = connected();
        assert_eq!(session.disconnect().as_deref(), Some("41"));
        assert_eq!(session.disconnect(), None);

        let mut fresh = RelaySession::new();
        assert_eq!(fresh.disconnect(), None);
        assert_eq!(fresh.state(), RelayState::Closed);
    }

    /// Test namespace filtering
    #[test]
    fn packets_for_other_namespaces_are_ignored() {
        let mut session = RelaySession::with_namespace("/chat");
        assert_eq!(
            session.handle_frame(OPEN).unwrap(),
            vec![RelayAction::Send("40/chat,".into())]
        );
        assert!(session.handle_frame("40").unwrap().is_empty());
        assert_eq!(session.handle_frame("40/chat,").unwrap(), vec![RelayAction::Connected]);
    }
}
