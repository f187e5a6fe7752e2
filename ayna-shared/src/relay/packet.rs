//! Engine.IO v4 and Socket.IO v5 text packet codec.

use super::RelayError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_NAMESPACE: &str = "/";

/// Parameters the server announces in the Engine.IO `open` packet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    pub ping_interval: u64,
    pub ping_timeout: u64,
    #[serde(default)]
    pub max_payload: Option<u64>,
}

/// Transport-level packet; one per WebSocket text frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnginePacket {
    Open(Handshake),
    Close,
    Ping(String),
    Pong(String),
    Message(String),
    Upgrade,
    Noop,
}

impl EnginePacket {
    /// # Errors
    /// Returns [`RelayError::Protocol`] for empty frames, unknown packet types
    /// and unparsable handshakes.
    pub fn decode(frame: &str) -> Result<Self, RelayError> {
        let mut chars = frame.chars();
        let kind = chars
            .next()
            .ok_or_else(|| RelayError::Protocol("empty frame".into()))?;
        let data = chars.as_str();
        match kind {
            '0' => serde_json::from_str(data)
                .map(Self::Open)
                .map_err(|err| RelayError::Protocol(format!("bad handshake: {err}"))),
            '1' => Ok(Self::Close),
            '2' => Ok(Self::Ping(data.to_string())),
            '3' => Ok(Self::Pong(data.to_string())),
            '4' => Ok(Self::Message(data.to_string())),
            '5' => Ok(Self::Upgrade),
            '6' => Ok(Self::Noop),
            other => Err(RelayError::Protocol(format!(
                "unknown engine packet type `{other}`"
            ))),
        }
    }

    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::Open(handshake) => {
                format!("0{}", serde_json::to_string(handshake).unwrap_or_default())
            }
            Self::Close => "1".to_string(),
            Self::Ping(data) => format!("2{data}"),
            Self::Pong(data) => format!("3{data}"),
            Self::Message(data) => format!("4{data}"),
            Self::Upgrade => "5".to_string(),
            Self::Noop => "6".to_string(),
        }
    }
}

/// Application-level packet carried inside an Engine.IO `message`.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect {
        namespace: String,
        payload: Option<Value>,
    },
    Disconnect {
        namespace: String,
    },
    Event {
        namespace: String,
        ack_id: Option<u64>,
        name: String,
        args: Vec<Value>,
    },
    Ack {
        namespace: String,
        ack_id: u64,
        args: Vec<Value>,
    },
    ConnectError {
        namespace: String,
        payload: Option<Value>,
    },
}

impl SocketPacket {
    #[must_use]
    pub fn namespace(&self) -> &str {
        match self {
            Self::Connect { namespace, .. }
            | Self::Disconnect { namespace }
            | Self::Event { namespace, .. }
            | Self::Ack { namespace, .. }
            | Self::ConnectError { namespace, .. } => namespace,
        }
    }

    /// Parses `<type>[<namespace>,][<ack id>][<json>]`.
    ///
    /// # Errors
    /// Binary packets are rejected with [`RelayError::Unsupported`]; anything
    /// else malformed yields [`RelayError::Protocol`].
    pub fn decode(text: &str) -> Result<Self, RelayError> {
        let mut chars = text.chars();
        let kind = chars
            .next()
            .ok_or_else(|| RelayError::Protocol("empty socket packet".into()))?;
        if matches!(kind, '5' | '6') {
            return Err(RelayError::Unsupported(kind));
        }
        let mut rest = chars.as_str();

        let namespace = if rest.starts_with('/') {
            let end = rest.find(',').unwrap_or(rest.len());
            let namespace = rest[..end].to_string();
            rest = rest.get(end + 1..).unwrap_or("");
            namespace
        } else {
            DEFAULT_NAMESPACE.to_string()
        };

        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        let ack_id = if digits == 0 {
            None
        } else {
            Some(
                rest[..digits]
                    .parse::<u64>()
                    .map_err(|err| RelayError::Protocol(format!("bad ack id: {err}")))?,
            )
        };
        rest = &rest[digits..];

        let data = if rest.is_empty() {
            None
        } else {
            Some(
                serde_json::from_str::<Value>(rest)
                    .map_err(|err| RelayError::Protocol(format!("bad packet data: {err}")))?,
            )
        };

        match kind {
            '0' => Ok(Self::Connect {
                namespace,
                payload: data,
            }),
            '1' => Ok(Self::Disconnect { namespace }),
            '2' => {
                let mut args = into_array(data)?;
                if args.is_empty() {
                    return Err(RelayError::Protocol("event without a name".into()));
                }
                let Value::String(name) = args.remove(0) else {
                    return Err(RelayError::Protocol("event name is not a string".into()));
                };
                Ok(Self::Event {
                    namespace,
                    ack_id,
                    name,
                    args,
                })
            }
            '3' => Ok(Self::Ack {
                namespace,
                ack_id: ack_id
                    .ok_or_else(|| RelayError::Protocol("ack without an id".into()))?,
                args: into_array(data)?,
            }),
            '4' => Ok(Self::ConnectError {
                namespace,
                payload: data,
            }),
            other => Err(RelayError::Protocol(format!(
                "unknown socket packet type `{other}`"
            ))),
        }
    }

    #[must_use]
    pub fn encode(&self) -> String {
        let (kind, namespace, ack_id, data) = match self {
            Self::Connect { namespace, payload } => ('0', namespace, None, payload.clone()),
            Self::Disconnect { namespace } => ('1', namespace, None, None),
            Self::Event {
                namespace,
                ack_id,
                name,
                args,
            } => {
                let mut array = Vec::with_capacity(args.len() + 1);
                array.push(Value::String(name.clone()));
                array.extend(args.iter().cloned());
                ('2', namespace, *ack_id, Some(Value::Array(array)))
            }
            Self::Ack {
                namespace,
                ack_id,
                args,
            } => ('3', namespace, Some(*ack_id), Some(Value::Array(args.clone()))),
            Self::ConnectError { namespace, payload } => ('4', namespace, None, payload.clone()),
        };

        let mut out = String::new();
        out.push(kind);
        if namespace != DEFAULT_NAMESPACE {
            out.push_str(namespace);
            out.push(',');
        }
        if let Some(id) = ack_id {
            out.push_str(&id.to_string());
        }
        if let Some(data) = data {
            out.push_str(&data.to_string());
        }
        out
    }
}

fn into_array(data: Option<Value>) -> Result<Vec<Value>, RelayError> {
    match data {
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(RelayError::Protocol("packet data is not an array".into())),
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Test decoding the Engine.IO open packet
    #[test]
    fn decodes_open_handshake() {
        let frame = r#"0{"sid":"lv_VI97HAXpY6yYWAAAC","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;
        let EnginePacket::Open(handshake) = EnginePacket::decode(frame).unwrap() else {
            panic!("expected open packet");
        };
        assert_eq!(handshake.sid, "lv_VI97HAXpY6yYWAAAC");
        assert_eq!(handshake.ping_interval, 25_000);
        assert_eq!(handshake.max_payload, Some(1_000_000));
    }

    /// Pong carries the ping payload back.
    #[test]
    fn ping_echoes_payload_in_pong() {
        assert_eq!(
            EnginePacket::decode("2probe").unwrap(),
            EnginePacket::Ping("probe".into())
        );
        assert_eq!(EnginePacket::Pong("probe".into()).encode(), "3probe");
        assert_eq!(EnginePacket::decode("2").unwrap(), EnginePacket::Ping(String::new()));
    }

    /// Test invalid Engine.IO frames
    #[test]
    fn rejects_empty_and_unknown_engine_frames() {
        assert!(EnginePacket::decode("").is_err());
        assert!(EnginePacket::decode("9").is_err());
        assert!(EnginePacket::decode("0not-json").is_err());
    }

    /// Namespace and ack id are both parsed from an event.
    #[test]
    fn decodes_event_with_namespace_and_ack() {
        let packet = SocketPacket::decode(r#"2/chat,12["message",{"text":"hi"}]"#).unwrap();
        assert_eq!(
            packet,
            SocketPacket::Event {
                namespace: "/chat".into(),
                ack_id: Some(12),
                name: "message".into(),
                args: vec![json!({"text": "hi"})],
            }
        );
    }

    /// Test decoding connect and disconnect on `/`
    #[test]
    fn decodes_connect_ack_on_default_namespace() {
        let packet = SocketPacket::decode(r#"0{"sid":"abc"}"#).unwrap();
        assert_eq!(packet.namespace(), "/");
        assert!(matches!(packet, SocketPacket::Connect { payload: Some(_), .. }));
        assert_eq!(
            SocketPacket::decode("1").unwrap(),
            SocketPacket::Disconnect {
                namespace: "/".into()
            }
        );
    }

    /// Test encoding a chat event frame
    #[test]
    fn encodes_message_event_frame() {
        let packet = SocketPacket::Event {
            namespace: DEFAULT_NAMESPACE.into(),
            ack_id: None,
            name: "message".into(),
            args: vec![json!({"text": "hi"})],
        };
        let frame = EnginePacket::Message(packet.encode()).encode();
        assert_eq!(frame, r#"42["message",{"text":"hi"}]"#);
    }

    /// Only non-default namespaces are written into the packet.
    #[test]
    fn encodes_namespaced_connect() {
        let packet = SocketPacket::Connect {
            namespace: "/admin".into(),
            payload: None,
        };
        assert_eq!(packet.encode(), "0/admin,");
        let default = SocketPacket::Connect {
            namespace: "/".into(),
            payload: None,
        };
        assert_eq!(default.encode(), "0");
    }

    /// Binary packet types and junk are rejected.
    #[test]
    fn rejects_binary_and_malformed_socket_packets() {
        assert!(matches!(
            SocketPacket::decode("51-[\"message\",{\"_placeholder\":true,\"num\":0}]"),
            Err(RelayError::Unsupported('5'))
        ));
        assert!(SocketPacket::decode("2{\"not\":\"array\"}").is_err());
        assert!(SocketPacket::decode("2[]").is_err());
        assert!(SocketPacket::decode("2[42]").is_err());
        assert!(SocketPacket::decode("3[]").is_err());
    }

    /// Test decoding `connect_error`
    #[test]
    fn connect_error_keeps_payload() {
        let packet = SocketPacket::decode(r#"4{"message":"Not authorized"}"#).unwrap();
        assert_eq!(
            packet,
            SocketPacket::ConnectError {
                namespace: "/".into(),
                payload: Some(json!({"message": "Not authorized"})),
            }
        );
    }
}
