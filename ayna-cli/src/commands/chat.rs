use crate::relay::RelayConnection;
use crate::storage::session_store;
use anyhow::{Context, Result, anyhow, bail};
use clap::Subcommand;
use shared::{
    api::ChatApiClient,
    chat::{
        ChatTimeline, HISTORY_FAILURE_NOTICE, MessageRelay, SendRejected, deliver, live_message,
        prepare_send,
    },
    config::ClientConfig,
    models::{ChatMessage, RelayOutbound},
    relay::RelayError,
};
use std::time::Duration;
use tracing::warn;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Subcommand, Debug)]
pub enum ChatCommand {
    /// Print the stored message history
    History,
    /// Broadcast a message and save it
    Send {
        /// Message text, sent as typed
        text: String,
    },
    /// Print live messages until interrupted
    Follow,
}

pub async fn run(command: ChatCommand, config: &ClientConfig) -> Result<()> {
    let client = ChatApiClient::new(&config.api_base_url);
    match command {
        ChatCommand::History => history(&client).await,
        ChatCommand::Send { text } => send(&client, &config.relay_url, &text).await,
        ChatCommand::Follow => follow(&config.relay_url).await,
    }
}

fn format_line(message: &ChatMessage) -> String {
    format!("{}: {}", message.sender, message.text)
}

async fn history(client: &ChatApiClient) -> Result<()> {
    let records = client
        .list_messages()
        .await
        .context(HISTORY_FAILURE_NOTICE)?;
    let viewer = session_store().load().map(|session| session.username);

    let mut timeline = ChatTimeline::new();
    timeline.load_history(records, viewer.as_deref());
    if timeline.is_empty() {
        println!("No messages yet.");
    }
    for message in timeline.messages() {
        println!("{}", format_line(message));
    }
    Ok(())
}

async fn send(client: &ChatApiClient, relay_url: &str, text: &str) -> Result<()> {
    let session = session_store().load();
    let outgoing = match prepare_send(text, session.as_ref()) {
        Ok(outgoing) => outgoing,
        Err(SendRejected::EmptyDraft) => bail!("message is empty"),
        Err(rejected @ SendRejected::NotLoggedIn) => {
            bail!(rejected.notice().unwrap_or("not logged in"))
        }
    };

    let relay = match RelayConnection::connect(relay_url).await {
        Ok(mut relay) => {
            if let Err(err) = relay.wait_connected(CONNECT_TIMEOUT).await {
                warn!(%err, "relay not ready; message will be saved without a broadcast");
            }
            Some(relay)
        }
        Err(err) => {
            warn!(%err, "relay unavailable; message will be saved without a broadcast");
            None
        }
    };

    let result = match &relay {
        Some(relay) => deliver(outgoing, relay, client).await,
        None => deliver(outgoing, &Offline, client).await,
    };
    if let Some(relay) = relay {
        relay.shutdown().await;
    }

    let message = result.map_err(|err| anyhow!(err.notice()))?;
    println!("{}", format_line(&message));
    Ok(())
}

async fn follow(relay_url: &str) -> Result<()> {
    let mut relay = RelayConnection::connect(relay_url).await?;
    relay.wait_connected(CONNECT_TIMEOUT).await?;
    println!("Following live messages; press Ctrl-C to stop.");

    loop {
        tokio::select! {
            event = relay.next_message() => {
                let Some(event) = event else {
                    println!("Relay closed.");
                    break;
                };
                println!("{}", format_line(&live_message(event)));
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    relay.shutdown().await;
    Ok(())
}

struct Offline;

impl MessageRelay for Offline {
    fn publish(&self, _message: &RelayOutbound) -> Result<(), RelayError> {
        Err(RelayError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{MessageOrigin, RelayInbound};

    /// History lines print sender then text.
    #[test]
    fn lines_show_sender_and_text() {
        let message = ChatMessage::new("alice", "hi there", MessageOrigin::History);
        assert_eq!(format_line(&message), "alice: hi there");
    }

    /// Live events without a sender print under the server name.
    #[test]
    fn live_lines_fall_back_to_server() {
        let anonymous = live_message(RelayInbound {
            sender: None,
            text: "restarting".into(),
        });
        assert_eq!(format_line(&anonymous), "Server: restarting");

        let named = live_message(RelayInbound {
            sender: Some("bob".into()),
            text: "yo".into(),
        });
        assert_eq!(format_line(&named), "bob: yo");
    }
}
