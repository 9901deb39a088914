//! WebSocket endpoint for live queue and slot updates.
//!
//! Each session subscribes to the process-wide hub and filters queue events
//! against the set of service channels the client has joined. Slot events are
//! delivered to every session.

use std::collections::HashSet;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;

use crate::{live::LiveEvent, state::AppState};

const PING_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum ClientCommand {
    JoinService { service_id: String },
    LeaveService { service_id: String },
}

/// GET /api/ws
pub async fn live_events(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| session(socket, state))
}

async fn session(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let mut events = state.live.subscribe();
    let mut joined: HashSet<String> = HashSet::new();

    let mut ping = tokio::time::interval(PING_INTERVAL);
    // the first tick completes immediately
    ping.tick().await;

    loop {
        tokio::select! {
            _ = ping.tick() => {
                if sink.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }
            event = events.recv() => {
                match event {
                    Ok(event) => {
                        if !should_deliver(&event, &joined) {
                            continue;
                        }
                        let payload = match serde_json::to_string(&event) {
                            Ok(payload) => payload,
                            Err(err) => {
                                tracing::error!(error = %err, "failed to serialize live event");
                                continue;
                            }
                        };
                        if sink.send(Message::Text(payload)).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "live event subscriber lagged");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            message = stream.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => handle_command(&text, &mut joined),
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        tracing::debug!(error = %err, "websocket receive error");
                        break;
                    }
                }
            }
        }
    }

    tracing::debug!("live event session closed");
}

fn handle_command(text: &str, joined: &mut HashSet<String>) {
    match serde_json::from_str::<ClientCommand>(text) {
        Ok(ClientCommand::JoinService { service_id }) => {
            joined.insert(service_id);
        }
        Ok(ClientCommand::LeaveService { service_id }) => {
            joined.remove(&service_id);
        }
        Err(err) => {
            tracing::debug!(error = %err, "ignoring malformed client command");
        }
    }
}

/// Queue events reach only sessions that joined the service's channel; slot
/// events are global, matching the original broadcast behavior.
fn should_deliver(event: &LiveEvent, joined: &HashSet<String>) -> bool {
    match event {
        LiveEvent::QueueUpdated { service_id, .. } => joined.contains(service_id),
        LiveEvent::SlotUpdated { .. } => true,
    }
}
