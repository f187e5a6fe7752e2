use shared::chat::ChatTimeline;
use shared::models::{ChatMessage, MessageRecord, RelayInbound};
use yewdux::Store;

/// Updates to the chat display list, in arrival order.
#[derive(Debug)]
pub enum FeedAction {
    History {
        records: Vec<MessageRecord>,
        viewer: Option<String>,
    },
    Live(RelayInbound),
    Sent(ChatMessage),
}

/// Display list of the mounted chat page. Reset on every mount.
#[derive(Debug, Default, Clone, PartialEq, Store)]
pub struct ChatFeed {
    pub timeline: ChatTimeline,
}

impl ChatFeed {
    pub fn apply(&mut self, action: FeedAction) {
        match action {
            FeedAction::History { records, viewer } => {
                self.timeline.load_history(records, viewer.as_deref());
            }
            FeedAction::Live(event) => self.timeline.push_live(event),
            FeedAction::Sent(message) => self.timeline.append_local(message),
        }
    }
}
