use shared::chat::ChatTimeline;
use shared::models::ChatMessage;
use yew::{Html, Properties, classes, function_component, html};

#[derive(Properties, PartialEq)]
pub struct MessageListProps {
    pub messages: Vec<ChatMessage>,
    #[prop_or_default]
    pub viewer: Option<String>,
}

/// CSS class for a message bubble relative to the viewer.
pub fn bubble_class(message: &ChatMessage, viewer: Option<&str>) -> &'static str {
    if ChatTimeline::is_own(message, viewer) {
        "sent"
    } else {
        "received"
    }
}

#[function_component(MessageList)]
pub fn message_list(props: &MessageListProps) -> Html {
    let viewer = props.viewer.as_deref();
    html! {
        <div class="message-list">
            { for props.messages.iter().map(|message| {
                let title = message
                    .sender_is_inferred()
                    .then_some("sender inferred from the current user");
                html! {
                    <div class={classes!("message", bubble_class(message, viewer))}>
                        <div class="sender" title={title}>{ message.sender.clone() }</div>
                        <div class="text">{ message.text.clone() }</div>
                    </div>
                }
            }) }
        </div>
    }
}
