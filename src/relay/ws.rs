//! WebSocket endpoint for the draft channel.
//!
//! `GET /ws/drafts?token=…&proto_id=…&session_id=…` joins the proto's room
//! after a token check. Frames are treated as opaque text: the relay never
//! parses draft payloads, it only forwards them to every room member —
//! sender included, since self-filtering happens client-side on user id.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::rooms::RoomRegistry;
use super::server::RelayState;

/// Query parameters scoping one draft connection.
#[derive(Debug, Deserialize)]
pub struct DraftChannelQuery {
    pub token: String,
    pub proto_id: i64,
    pub session_id: Uuid,
}

pub async fn draft_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<RelayState>,
    Query(query): Query<DraftChannelQuery>,
) -> Response {
    if query.token.is_empty() {
        return (StatusCode::UNAUTHORIZED, "missing token").into_response();
    }
    if let Some(expected) = &state.token {
        if *expected != query.token {
            return (StatusCode::UNAUTHORIZED, "invalid token").into_response();
        }
    }
    let rooms = state.rooms.clone();
    ws.on_upgrade(move |socket| handle_draft_socket(socket, rooms, query))
}

async fn handle_draft_socket(socket: WebSocket, rooms: RoomRegistry, query: DraftChannelQuery) {
    let proto_id = query.proto_id;
    let (room_tx, mut room_rx) = rooms.join(proto_id);
    tracing::info!(proto_id, session_id = %query.session_id, "draft peer joined");

    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            // ── Frames from this peer: fan out to the room ──────────
            frame = receiver.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        // No receivers is fine: the peer is drafting alone.
                        let _ = room_tx.send(text.to_string());
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {
                        // Ping/pong handled by axum; binary is not part of
                        // the protocol.
                    }
                    Some(Err(_)) => break,
                }
            }

            // ── Frames from the room: forward to this peer ──────────
            result = room_rx.recv() => {
                match result {
                    Ok(text) => {
                        if sender.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(proto_id, skipped, "slow draft peer lagged");
                        continue;
                    }
                }
            }
        }
    }

    // Best-effort close frame
    let _ = sender.send(Message::Close(None)).await;
    drop(room_rx);
    rooms.prune(proto_id);
    tracing::info!(proto_id, session_id = %query.session_id, "draft peer left");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_deserializes_all_scope_fields() {
        let query: DraftChannelQuery = serde_json::from_str(
            r#"{"token":"tok","proto_id":3,"session_id":"0d4e4f9e-94a1-4bd3-a61f-2c1c82014a92"}"#,
        )
        .unwrap();
        assert_eq!(query.token, "tok");
        assert_eq!(query.proto_id, 3);
    }

    #[test]
    fn query_requires_session_id() {
        let result: Result<DraftChannelQuery, _> =
            serde_json::from_str(r#"{"token":"tok","proto_id":3}"#);
        assert!(result.is_err());
    }
}
