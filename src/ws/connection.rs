//! WebSocket connection loop.
//!
//! Reads subscription commands from the client and forwards matching
//! campaign events from the event bus. Owner notifications reach only the
//! owner's own authenticated streams.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{CampaignSelection, WsCommand, WsMessage, WsMessageType};
use super::subscription::SubscriptionManager;
use crate::domain::{CampaignEvent, UserId};

/// Runs the read/write loop for a single WebSocket connection until the
/// client disconnects or the event bus closes. `viewer` is the
/// authenticated user, if any.
pub async fn run_connection(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<CampaignEvent>,
    viewer: Option<UserId>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut subs = SubscriptionManager::new();

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let reply = handle_text_message(&text, &mut subs);
                        if let Some(json) = encode(&reply)
                            && ws_tx.send(Message::text(json)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(error = %e, "ws read failed");
                        break;
                    }
                    _ => {}
                }
            }
            event = event_rx.recv() => {
                match event {
                    Ok(event) => {
                        if !subs.matches(event.campaign_id()) || !event.visible_to(viewer) {
                            continue;
                        }
                        let Some(json) = event_message(&event) else {
                            continue;
                        };
                        if ws_tx.send(Message::text(json)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!("ws connection closed");
}

fn encode(msg: &WsMessage) -> Option<String> {
    serde_json::to_string(msg)
        .map_err(|e| tracing::warn!(error = %e, "failed to encode ws message"))
        .ok()
}

fn event_message(event: &CampaignEvent) -> Option<String> {
    let payload = serde_json::to_value(event)
        .map_err(|e| {
            tracing::warn!(
                error = %e,
                event_type = event.event_type_str(),
                "failed to encode campaign event"
            );
        })
        .ok()?;
    encode(&WsMessage::new(
        uuid::Uuid::new_v4().to_string(),
        WsMessageType::Event,
        payload,
    ))
}

/// Applies one client message to `subs` and builds the reply.
fn handle_text_message(text: &str, subs: &mut SubscriptionManager) -> WsMessage {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return WsMessage::error(String::new(), 400, "malformed JSON");
    };
    if msg.msg_type != WsMessageType::Command {
        return WsMessage::error(msg.id, 400, "expected a command");
    }
    let Ok(command) = serde_json::from_value::<WsCommand>(msg.payload) else {
        return WsMessage::error(msg.id, 404, "unknown command");
    };

    match command {
        WsCommand::Subscribe { campaign_ids } => {
            let selection = CampaignSelection::parse(&campaign_ids);
            subs.subscribe(&selection);
            WsMessage::new(
                msg.id,
                WsMessageType::Response,
                serde_json::json!({
                    "subscribed": selection.ids,
                    "invalid": selection.invalid,
                    "count": subs.count(),
                    "wildcard": subs.is_subscribed_all(),
                }),
            )
        }
        WsCommand::Unsubscribe { campaign_ids } => {
            let selection = CampaignSelection::parse(&campaign_ids);
            subs.unsubscribe(&selection);
            WsMessage::new(
                msg.id,
                WsMessageType::Response,
                serde_json::json!({
                    "unsubscribed": selection.ids,
                    "invalid": selection.invalid,
                    "remaining_count": subs.count(),
                    "wildcard": subs.is_subscribed_all(),
                }),
            )
        }
    }
}
