//! WebSocket connection manager for the draft channel.
//!
//! Holds exactly one live connection per (proto, user) pair. `connect()` and
//! `disconnect()` are the only lifecycle entry points; the owning session
//! drives timers, so this type stays free of background tasks and cannot
//! leak a reconnect past teardown.
//!
//! Close-code policy: 1000 ("normal") is the intentional-shutdown sentinel
//! and is terminal. Any other close — and any transport error — asks the
//! session to schedule exactly one reconnect attempt after the fixed delay.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use uuid::Uuid;

use crate::errors::SyncError;

use super::envelope::DraftEnvelope;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connection lifecycle state, surfaced to the UI as the status indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    /// Status indicator label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Disconnected => "Offline",
            Self::Connecting => "Connecting",
            Self::Connected => "Live",
        }
    }
}

/// One observation from the live socket.
#[derive(Debug)]
pub enum SocketEvent {
    /// A well-formed envelope arrived.
    Message(DraftEnvelope),
    /// A frame that did not parse; the connection stays up.
    Malformed(String),
    /// The socket is gone. `reconnect` reflects the close-code policy.
    Closed { reconnect: bool },
}

/// True when a close should trigger the fixed-delay reconnect: anything but
/// an explicit normal (1000) close frame.
pub fn should_reconnect_after(frame: Option<&CloseFrame>) -> bool {
    match frame {
        Some(frame) => frame.code != CloseCode::Normal,
        None => true,
    }
}

pub struct ConnectionManager {
    ws_base: String,
    token: String,
    proto_id: i64,
    user_id: String,
    state: ConnectionState,
    session_id: Option<Uuid>,
    last_error: Option<String>,
    socket: Option<WsStream>,
}

impl ConnectionManager {
    pub fn new(
        ws_base: impl Into<String>,
        token: impl Into<String>,
        proto_id: i64,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            ws_base: ws_base.into(),
            token: token.into(),
            proto_id,
            user_id: user_id.into(),
            state: ConnectionState::Disconnected,
            session_id: None,
            last_error: None,
            socket: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.socket.is_some() && self.state == ConnectionState::Connected
    }

    /// Session id of the current connection attempt, minted per `connect()`.
    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn endpoint_url(&self, session_id: Uuid) -> String {
        format!(
            "{}/ws/drafts?token={}&proto_id={}&session_id={}",
            self.ws_base.trim_end_matches('/'),
            self.token,
            self.proto_id,
            session_id
        )
    }

    /// Open the connection. A no-op while a socket is already held. On
    /// success the one-shot announcement is sent before returning.
    pub async fn connect(&mut self) -> Result<(), SyncError> {
        if self.socket.is_some() {
            return Ok(());
        }
        let session_id = Uuid::new_v4();
        self.session_id = Some(session_id);
        self.state = ConnectionState::Connecting;

        let url = self.endpoint_url(session_id);
        match connect_async(url.as_str()).await {
            Ok((socket, _response)) => {
                self.socket = Some(socket);
                self.state = ConnectionState::Connected;
                self.last_error = None;
                tracing::debug!(proto_id = self.proto_id, %session_id, "draft channel open");
                let hello =
                    DraftEnvelope::hello(self.proto_id, self.user_id.clone(), session_id);
                self.send(&hello).await
            }
            Err(err) => {
                let detail = err.to_string();
                tracing::debug!(proto_id = self.proto_id, error = %detail, "draft channel connect failed");
                self.state = ConnectionState::Disconnected;
                self.last_error = Some(detail.clone());
                Err(SyncError::Transport(detail))
            }
        }
    }

    /// Close intentionally with code 1000 and forget the session id. The
    /// close-code policy guarantees no reconnect follows.
    pub async fn disconnect(&mut self) {
        if let Some(mut socket) = self.socket.take() {
            let frame = CloseFrame {
                code: CloseCode::Normal,
                reason: "client closing".into(),
            };
            let _ = socket.close(Some(frame)).await;
        }
        self.state = ConnectionState::Disconnected;
        self.session_id = None;
    }

    /// Send one envelope. A transport failure drops the socket so the
    /// session can schedule a reconnect.
    pub async fn send(&mut self, envelope: &DraftEnvelope) -> Result<(), SyncError> {
        let Some(socket) = self.socket.as_mut() else {
            return Err(SyncError::NotConnected);
        };
        let text = serde_json::to_string(envelope).map_err(SyncError::Encode)?;
        match socket.send(Message::Text(text.into())).await {
            Ok(()) => Ok(()),
            Err(err) => {
                let detail = err.to_string();
                self.mark_dropped(detail.clone());
                Err(SyncError::Transport(detail))
            }
        }
    }

    /// Wait for the next socket observation. Pends forever while no socket
    /// is held (the session gates this branch on `is_connected`).
    pub async fn next_event(&mut self) -> SocketEvent {
        let Some(socket) = self.socket.as_mut() else {
            return futures_util::future::pending().await;
        };
        loop {
            match socket.next().await {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<DraftEnvelope>(text.as_str()) {
                        Ok(envelope) => return SocketEvent::Message(envelope),
                        Err(err) => {
                            // Flagged, discarded, connection kept alive.
                            let detail = err.to_string();
                            self.last_error = Some(detail.clone());
                            return SocketEvent::Malformed(detail);
                        }
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    let reconnect = should_reconnect_after(frame.as_ref());
                    self.socket = None;
                    self.state = ConnectionState::Disconnected;
                    if reconnect {
                        self.last_error = Some("connection closed unexpectedly".to_string());
                    }
                    return SocketEvent::Closed { reconnect };
                }
                Some(Ok(_)) => {
                    // Ping/pong/binary frames are not part of the protocol.
                    continue;
                }
                Some(Err(err)) => {
                    self.mark_dropped(err.to_string());
                    return SocketEvent::Closed { reconnect: true };
                }
                None => {
                    self.mark_dropped("connection dropped".to_string());
                    return SocketEvent::Closed { reconnect: true };
                }
            }
        }
    }

    fn mark_dropped(&mut self, detail: String) {
        tracing::debug!(proto_id = self.proto_id, error = %detail, "draft channel dropped");
        self.socket = None;
        self.state = ConnectionState::Disconnected;
        self.last_error = Some(detail);
    }
}
