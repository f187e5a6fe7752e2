//! Chat view state: the display list and the send pipeline.

use crate::api::ApiError;
use crate::models::{ChatMessage, MessageOrigin, MessageRecord, RelayInbound, RelayOutbound};
use crate::relay::RelayError;
use crate::session::Session;
use async_trait::async_trait;
use tracing::{debug, error, warn};

/// Sender shown for live events that do not name one.
pub const LIVE_FALLBACK_SENDER: &str = "Server";
/// Sender shown for history when no username is known at fetch time.
pub const UNKNOWN_SENDER: &str = "unknown";

pub const NOT_LOGGED_IN_NOTICE: &str = "You are not logged in. Please log in to send messages.";
pub const SEND_FAILURE_NOTICE: &str = "Failed to send the message. Please try again.";
pub const HISTORY_FAILURE_NOTICE: &str = "Failed to load previous messages.";

/// Ordered display list fed by history, the live relay and local sends.
///
/// Sources are concatenated in arrival order; nothing is deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatTimeline {
    messages: Vec<ChatMessage>,
}

impl ChatTimeline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Installs fetched history.
    ///
    /// The history endpoint reports no sender, so every record is attributed
    /// to `viewer` as captured at fetch time and marked
    /// [`MessageOrigin::History`]. Any entries that arrived before the fetch
    /// completed stay after the history block.
    pub fn load_history<I>(&mut self, records: I, viewer: Option<&str>)
    where
        I: IntoIterator<Item = MessageRecord>,
    {
        let sender = viewer.filter(|name| !name.is_empty()).unwrap_or(UNKNOWN_SENDER);
        let mut merged: Vec<ChatMessage> = records
            .into_iter()
            .map(|record| ChatMessage::new(sender, record.message, MessageOrigin::History))
            .collect();
        debug!(count = merged.len(), "history loaded");
        merged.extend(
            self.messages
                .drain(..)
                .filter(|message| message.origin != MessageOrigin::History),
        );
        self.messages = merged;
    }

    /// Appends one relay event.
    pub fn push_live(&mut self, event: RelayInbound) {
        self.messages.push(live_message(event));
    }

    /// Optimistic append after a confirmed send.
    pub fn append_local(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Whether `message` should render as sent by the viewer.
    #[must_use]
    pub fn is_own(message: &ChatMessage, viewer: Option<&str>) -> bool {
        viewer.is_some_and(|name| message.sender == name)
    }
}

/// Converts a relay event into a display entry, falling back to
/// [`LIVE_FALLBACK_SENDER`] when the sender is missing or blank.
#[must_use]
pub fn live_message(event: RelayInbound) -> ChatMessage {
    let sender = event
        .sender
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| LIVE_FALLBACK_SENDER.to_string());
    ChatMessage::new(sender, event.text, MessageOrigin::Live)
}

/// A validated message ready to publish and persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// Sender name taken from the session.
    pub username: String,
    /// Draft text exactly as typed.
    pub text: String,
    /// Bearer token for the persistence call.
    pub token: String,
}

impl OutgoingMessage {
    #[must_use]
    pub fn relay_payload(&self) -> RelayOutbound {
        RelayOutbound {
            username: self.username.clone(),
            text: self.text.clone(),
            token: self.token.clone(),
        }
    }
}

/// Why a send was refused before any network activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SendRejected {
    #[error("message is empty")]
    EmptyDraft,
    #[error("not logged in")]
    NotLoggedIn,
}

impl SendRejected {
    /// Notice to show, if any. Empty drafts are ignored silently.
    #[must_use]
    pub const fn notice(self) -> Option<&'static str> {
        match self {
            Self::EmptyDraft => None,
            Self::NotLoggedIn => Some(NOT_LOGGED_IN_NOTICE),
        }
    }
}

/// Failure after the message went out on the relay.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("failed to persist message: {0}")]
    Persist(#[from] ApiError),
}

impl SendError {
    /// Notice to show: the backend's message when present.
    #[must_use]
    pub fn notice(&self) -> String {
        match self {
            Self::Persist(err) => err.backend_message().map_or_else(
                || SEND_FAILURE_NOTICE.to_string(),
                |message| format!("Failed to send the message: {message}"),
            ),
        }
    }
}

/// Publishes composed messages to everyone on the relay.
pub trait MessageRelay {
    /// # Errors
    /// Returns [`RelayError`] if the channel is already closed.
    fn publish(&self, message: &RelayOutbound) -> Result<(), RelayError>;
}

impl<T: MessageRelay + ?Sized> MessageRelay for &T {
    fn publish(&self, message: &RelayOutbound) -> Result<(), RelayError> {
        (**self).publish(message)
    }
}

/// Durable storage for sent messages.
#[async_trait(?Send)]
pub trait MessagePersistence {
    async fn persist_message(&self, text: &str, token: &str) -> Result<(), ApiError>;
}

/// Validates a draft against the current session.
///
/// # Errors
/// [`SendRejected::EmptyDraft`] for blank input, [`SendRejected::NotLoggedIn`]
/// when there is no session. Neither case may touch the network.
pub fn prepare_send(draft: &str, session: Option<&Session>) -> Result<OutgoingMessage, SendRejected> {
    if draft.trim().is_empty() {
        return Err(SendRejected::EmptyDraft);
    }
    let session = session
        .filter(|session| !session.token.is_empty() && !session.username.is_empty())
        .ok_or(SendRejected::NotLoggedIn)?;
    Ok(OutgoingMessage {
        username: session.username.clone(),
        text: draft.to_string(),
        token: session.token.clone(),
    })
}

/// Broadcasts then persists a message.
///
/// The broadcast is never retracted: if persistence fails, peers have already
/// seen the message while the sender's own list does not get it.
///
/// # Errors
/// Returns [`SendError::Persist`] when the durable write fails.
pub async fn deliver<R, P>(
    outgoing: OutgoingMessage,
    relay: &R,
    persistence: &P,
) -> Result<ChatMessage, SendError>
where
    R: MessageRelay + ?Sized,
    P: MessagePersistence + ?Sized,
{
    if let Err(err) = relay.publish(&outgoing.relay_payload()) {
        warn!(error = %err, "relay publish failed; persisting anyway");
    } else {
        debug!(username = %outgoing.username, "message published to relay");
    }

    persistence
        .persist_message(&outgoing.text, &outgoing.token)
        .await
        .inspect_err(|err| error!(error = %err, "failed to save message"))?;

    Ok(ChatMessage::new(
        outgoing.username,
        outgoing.text,
        MessageOrigin::Local,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct RecordingRelay {
        published: RefCell<Vec<RelayOutbound>>,
        closed: bool,
    }

    impl MessageRelay for RecordingRelay {
        fn publish(&self, message: &RelayOutbound) -> Result<(), RelayError> {
            if self.closed {
                return Err(RelayError::Closed);
            }
            self.published.borrow_mut().push(message.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeStore {
        reject_with: Option<Option<String>>,
        calls: Cell<usize>,
        saved: RefCell<Vec<(String, String)>>,
    }

    #[async_trait(?Send)]
    impl MessagePersistence for FakeStore {
        async fn persist_message(&self, text: &str, token: &str) -> Result<(), ApiError> {
            self.calls.set(self.calls.get() + 1);
            if let Some(message) = &self.reject_with {
                return Err(ApiError::Status {
                    status: 403,
                    message: message.clone(),
                });
            }
            self.saved
                .borrow_mut()
                .push((text.to_string(), token.to_string()));
            Ok(())
        }
    }

    fn alice() -> Session {
        Session::new("abc", "alice")
    }

    fn record(text: &str) -> MessageRecord {
        MessageRecord {
            message: text.to_string(),
        }
    }

    /// History entries carry the viewer as sender.
    #[test]
    fn history_is_attributed_to_viewer() {
        let mut timeline = ChatTimeline::new();
        timeline.load_history(vec![record("hi")], Some("alice"));

        assert_eq!(timeline.len(), 1);
        let entry = &timeline.messages()[0];
        assert_eq!(entry.sender, "alice");
        assert_eq!(entry.text, "hi");
        assert!(entry.sender_is_inferred());
    }

    /// Test history with nobody logged in
    #[test]
    fn history_without_viewer_uses_placeholder() {
        let mut timeline = ChatTimeline::new();
        timeline.load_history(vec![record("hi")], None);
        assert_eq!(timeline.messages()[0].sender, UNKNOWN_SENDER);
    }

    /// Live messages that beat the history fetch stay after it.
    #[test]
    fn live_messages_received_during_fetch_follow_history() {
        let mut timeline = ChatTimeline::new();
        timeline.push_live(RelayInbound {
            sender: Some("bob".into()),
            text: "early".into(),
        });
        timeline.load_history(vec![record("old-1"), record("old-2")], Some("alice"));

        let texts: Vec<_> = timeline.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["old-1", "old-2", "early"]);
    }

    /// Missing or blank live senders become "Server".
    #[test]
    fn live_sender_falls_back_to_server() {
        let mut timeline = ChatTimeline::new();
        timeline.push_live(RelayInbound {
            sender: None,
            text: "welcome".into(),
        });
        timeline.push_live(RelayInbound {
            sender: Some(String::new()),
            text: "blank".into(),
        });
        assert!(
            timeline
                .messages()
                .iter()
                .all(|message| message.sender == LIVE_FALLBACK_SENDER)
        );
    }

    /// Test that echoed messages are not deduplicated
    #[test]
    fn duplicates_are_kept() {
        let mut timeline = ChatTimeline::new();
        let echo = RelayInbound {
            sender: Some("alice".into()),
            text: "same".into(),
        };
        timeline.push_live(echo.clone());
        timeline.push_live(echo);
        timeline.append_local(ChatMessage::new("alice", "same", MessageOrigin::Local));
        assert_eq!(timeline.len(), 3);
    }

    /// Test own-message detection
    #[test]
    fn ownership_compares_sender_with_viewer() {
        let mine = ChatMessage::new("alice", "x", MessageOrigin::Live);
        assert!(ChatTimeline::is_own(&mine, Some("alice")));
        assert!(!ChatTimeline::is_own(&mine, Some("bob")));
        assert!(!ChatTimeline::is_own(&mine, None));
    }

    /// Blank drafts are refused without a notice.
    #[test]
    fn blank_drafts_are_rejected_silently() {
        for draft in ["", "   ", "\n\t"] {
            let err = prepare_send(draft, Some(&alice())).unwrap_err();
            assert_eq!(err, SendRejected::EmptyDraft);
            assert_eq!(err.notice(), None);
        }
    }

    /// Sending without a session asks the user to log in.
    #[test]
    fn drafts_without_session_need_login() {
        let err = prepare_send("hello", None).unwrap_err();
        assert_eq!(err, SendRejected::NotLoggedIn);
        assert_eq!(err.notice(), Some(NOT_LOGGED_IN_NOTICE));

        let half = Session::new("", "alice");
        assert_eq!(
            prepare_send("hello", Some(&half)).unwrap_err(),
            SendRejected::NotLoggedIn
        );
    }

    /// Test that the draft is sent as typed
    #[test]
    fn prepared_message_keeps_untrimmed_text() {
        let outgoing = prepare_send("  hi  ", Some(&alice())).unwrap();
        assert_eq!(outgoing.text, "  hi  ");
        assert_eq!(outgoing.username, "alice");
        assert_eq!(outgoing.token, "abc");
    }

    /// A successful send is broadcast and saved before the local entry is returned.
    #[tokio::test]
    async fn successful_send_publishes_persists_and_returns_local_message() {
        let relay = RecordingRelay::default();
        let store = FakeStore::default();
        let outgoing = prepare_send("hello", Some(&alice())).unwrap();

        let message = deliver(outgoing, &relay, &store).await.unwrap();

        assert_eq!(
            relay.published.borrow().as_slice(),
            [RelayOutbound {
                username: "alice".into(),
                text: "hello".into(),
                token: "abc".into(),
            }]
        );
        assert_eq!(
            store.saved.borrow().as_slice(),
            [("hello".to_string(), "abc".to_string())]
        );
        assert_eq!(message, ChatMessage::new("alice", "hello", MessageOrigin::Local));

        let mut timeline = ChatTimeline::new();
        timeline.append_local(message);
        assert_eq!(timeline.len(), 1);
    }

    /// A failed save does not retract the broadcast.
    #[tokio::test]
    async fn failed_persistence_keeps_broadcast_and_reports_backend_error() {
        let relay = RecordingRelay::default();
        let store = FakeStore {
            reject_with: Some(Some("Forbidden".into())),
            ..FakeStore::default()
        };
        let outgoing = prepare_send("hello", Some(&alice())).unwrap();

        let err = deliver(outgoing, &relay, &store).await.unwrap_err();

        assert_eq!(relay.published.borrow().len(), 1);
        assert_eq!(err.notice(), "Failed to send the message: Forbidden");
    }

    /// Test the generic send failure notice
    #[tokio::test]
    async fn failed_persistence_without_message_uses_generic_notice() {
        let store = FakeStore {
            reject_with: Some(None),
            ..FakeStore::default()
        };
        let outgoing = prepare_send("hello", Some(&alice())).unwrap();

        let err = deliver(outgoing, &RecordingRelay::default(), &store)
            .await
            .unwrap_err();

        assert_eq!(err.notice(), SEND_FAILURE_NOTICE);
    }

    /// A closed relay does not stop the save.
    #[tokio::test]
    async fn closed_relay_still_persists() {
        let relay = RecordingRelay {
            closed: true,
            ..RecordingRelay::default()
        };
        let store = FakeStore::default();
        let outgoing = prepare_send("hello", Some(&alice())).unwrap();

        assert!(deliver(outgoing, &relay, &store).await.is_ok());
        assert_eq!(store.calls.get(), 1);
    }
}
