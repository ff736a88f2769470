//! The draft session: one owned object per open comment form.
//!
//! A session runs a single event loop over the command channel, the live
//! socket, the debounce and reconnect deadlines, and upload outcomes. All
//! row state is owned by the loop — the UI talks to it exclusively through
//! [`DraftSessionHandle`], so there is no shared mutable state and teardown
//! cannot leave a timer behind.
//!
//! Timing rules:
//! - local edits arm a 2 s debounce; each edit resets the deadline and only
//!   the newest snapshot is ever sent
//! - upload completions publish immediately, bypassing debounce and dedup
//! - an abnormal close (or failed connect) schedules exactly one reconnect
//!   attempt 3 s later; a normal (1000) close and `disconnect()` never do

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;
use uuid::Uuid;

use crate::api::{ApiClient, validate};
use crate::config::Config;
use crate::errors::SyncError;

use super::connection::{ConnectionManager, ConnectionState, SocketEvent};
use super::envelope::DraftEnvelope;
use super::merge::{MergeDecision, MergeFilter, RevisionClock};
use super::publisher::{DraftPublisher, OutboundDraft};
use super::rows::{DraftRow, DraftRows, MediaKind, RowPatch};
use super::upload::{UploadOutcome, run_upload};

/// Everything a session needs to scope itself to one (proto, user) pair.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub ws_url: String,
    pub token: String,
    pub user_id: String,
    pub proto_id: i64,
    pub debounce: Duration,
    pub reconnect_delay: Duration,
}

impl SessionConfig {
    pub fn from_config(config: &Config, proto_id: i64) -> Self {
        Self {
            ws_url: config.ws_url.clone(),
            token: config.token.clone(),
            user_id: config.user_id.clone(),
            proto_id,
            debounce: config.debounce,
            reconnect_delay: config.reconnect_delay,
        }
    }
}

#[derive(Debug)]
pub enum SessionCommand {
    Connect,
    Disconnect,
    Edit { row_id: Uuid, patch: RowPatch },
    AddRow,
    RemoveRow { row_id: Uuid },
    AttachMedia {
        row_id: Uuid,
        kind: MediaKind,
        path: PathBuf,
    },
    Snapshot {
        reply: oneshot::Sender<Vec<DraftRow>>,
    },
    Shutdown,
}

/// Notifications pushed to the owning UI.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    RowsChanged(Vec<DraftRow>),
    UploadFailed {
        row_id: Uuid,
        kind: MediaKind,
        message: String,
    },
}

/// Client half of a running draft session.
pub struct DraftSessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    state: watch::Receiver<ConnectionState>,
    events: mpsc::Receiver<SessionEvent>,
}

impl DraftSessionHandle {
    async fn send(&self, command: SessionCommand) -> Result<(), SyncError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SyncError::SessionClosed)
    }

    pub async fn connect(&self) -> Result<(), SyncError> {
        self.send(SessionCommand::Connect).await
    }

    pub async fn disconnect(&self) -> Result<(), SyncError> {
        self.send(SessionCommand::Disconnect).await
    }

    pub async fn edit(&self, row_id: Uuid, patch: RowPatch) -> Result<(), SyncError> {
        self.send(SessionCommand::Edit { row_id, patch }).await
    }

    pub async fn add_row(&self) -> Result<(), SyncError> {
        self.send(SessionCommand::AddRow).await
    }

    pub async fn remove_row(&self, row_id: Uuid) -> Result<(), SyncError> {
        self.send(SessionCommand::RemoveRow { row_id }).await
    }

    pub async fn attach_media(
        &self,
        row_id: Uuid,
        kind: MediaKind,
        path: PathBuf,
    ) -> Result<(), SyncError> {
        self.send(SessionCommand::AttachMedia { row_id, kind, path })
            .await
    }

    /// Current rows, as the loop sees them.
    pub async fn snapshot(&self) -> Result<Vec<DraftRow>, SyncError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Snapshot { reply }).await?;
        rx.await.map_err(|_| SyncError::SessionClosed)
    }

    /// Ask the session to close the channel (code 1000) and stop.
    pub async fn shutdown(&self) -> Result<(), SyncError> {
        self.send(SessionCommand::Shutdown).await
    }

    /// Current connection state for the status indicator.
    pub fn connection_state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// A dedicated receiver for status indicator changes, usable alongside
    /// `next_event` in one select loop.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Next UI notification; `None` once the session has stopped.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events.recv().await
    }
}

/// Spawns draft sessions. One per open comment form.
pub struct DraftSession;

impl DraftSession {
    pub fn spawn(config: SessionConfig, api: ApiClient) -> DraftSessionHandle {
        let (commands_tx, commands_rx) = mpsc::channel(64);
        let (events_tx, events_rx) = mpsc::channel(64);
        let (outcomes_tx, outcomes_rx) = mpsc::channel(16);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);

        let worker = SessionWorker {
            conn: ConnectionManager::new(
                config.ws_url,
                config.token,
                config.proto_id,
                config.user_id.clone(),
            ),
            rows: DraftRows::new(),
            publisher: DraftPublisher::new(),
            filter: MergeFilter::new(config.user_id, config.proto_id),
            clock: RevisionClock::new(),
            api,
            debounce: config.debounce,
            reconnect_delay: config.reconnect_delay,
            debounce_at: None,
            reconnect_at: None,
            state_tx,
            events_tx,
            outcomes_tx,
        };
        tokio::spawn(worker.run(commands_rx, outcomes_rx));

        DraftSessionHandle {
            commands: commands_tx,
            state: state_rx,
            events: events_rx,
        }
    }
}

struct SessionWorker {
    conn: ConnectionManager,
    rows: DraftRows,
    publisher: DraftPublisher,
    filter: MergeFilter,
    clock: RevisionClock,
    api: ApiClient,
    debounce: Duration,
    reconnect_delay: Duration,
    debounce_at: Option<Instant>,
    reconnect_at: Option<Instant>,
    state_tx: watch::Sender<ConnectionState>,
    events_tx: mpsc::Sender<SessionEvent>,
    outcomes_tx: mpsc::Sender<UploadOutcome>,
}

/// Sleep until the deadline, or pend forever when there is none. Branches
/// using this are gated on `is_some`, so the pending arm is never polled.
async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => futures_util::future::pending().await,
    }
}

impl SessionWorker {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<SessionCommand>,
        mut outcomes: mpsc::Receiver<UploadOutcome>,
    ) {
        loop {
            let connected = self.conn.is_connected();
            let debounce_armed = self.debounce_at.is_some();
            let reconnect_armed = self.reconnect_at.is_some();

            tokio::select! {
                command = commands.recv() => {
                    match command {
                        None | Some(SessionCommand::Shutdown) => break,
                        Some(command) => self.handle_command(command).await,
                    }
                }
                Some(outcome) = outcomes.recv() => {
                    self.handle_upload_outcome(outcome).await;
                }
                event = self.conn.next_event(), if connected => {
                    self.handle_socket_event(event).await;
                }
                _ = sleep_until_opt(self.debounce_at), if debounce_armed => {
                    self.debounce_at = None;
                    self.flush_debounced().await;
                }
                _ = sleep_until_opt(self.reconnect_at), if reconnect_armed => {
                    self.reconnect_at = None;
                    self.try_connect().await;
                }
            }
        }
        self.teardown().await;
    }

    async fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Connect => self.try_connect().await,
            SessionCommand::Disconnect => {
                // Cancels a scheduled reconnect along with the socket.
                self.reconnect_at = None;
                self.debounce_at = None;
                self.conn.disconnect().await;
                self.push_state();
            }
            SessionCommand::Edit { row_id, patch } => {
                if self.rows.apply(row_id, patch) {
                    self.note_local_change();
                }
            }
            SessionCommand::AddRow => {
                self.rows.add_row();
                self.note_local_change();
            }
            SessionCommand::RemoveRow { row_id } => {
                if self.rows.remove(row_id) {
                    self.note_local_change();
                }
            }
            SessionCommand::AttachMedia { row_id, kind, path } => {
                self.attach_media(row_id, kind, path);
            }
            SessionCommand::Snapshot { reply } => {
                let _ = reply.send(self.rows.rows().to_vec());
            }
            SessionCommand::Shutdown => {
                // Handled by the run loop before dispatch.
            }
        }
    }

    async fn handle_socket_event(&mut self, event: SocketEvent) {
        match event {
            SocketEvent::Message(envelope) => match self.filter.screen(envelope) {
                MergeDecision::Apply(wire) => {
                    self.rows.replace_from_wire(wire);
                    self.clock.note_merge();
                    // A pending snapshot is superseded by the merge and must
                    // not echo back out.
                    self.debounce_at = None;
                    self.emit_rows();
                }
                MergeDecision::SkipSelf => {
                    tracing::trace!("dropping self-originated draft update");
                }
                MergeDecision::SkipForeign => {
                    tracing::trace!("dropping draft update for another proto");
                }
                MergeDecision::SkipAnnouncement => {}
            },
            SocketEvent::Malformed(detail) => {
                tracing::warn!(error = %detail, "discarding malformed draft message");
            }
            SocketEvent::Closed { reconnect } => {
                self.push_state();
                if reconnect {
                    self.reconnect_at = Some(Instant::now() + self.reconnect_delay);
                }
            }
        }
    }

    fn attach_media(&mut self, row_id: Uuid, kind: MediaKind, path: PathBuf) {
        if let Err(err) = validate::check_media_size(&path, kind) {
            let message = err.to_string();
            if self.rows.fail_upload(row_id, kind, message.clone()) {
                self.note_local_change();
            }
            self.emit(SessionEvent::UploadFailed {
                row_id,
                kind,
                message,
            });
            return;
        }

        let preview_url = format!("file://{}", path.display());
        if !self.rows.begin_upload(row_id, kind, path.clone(), preview_url) {
            return;
        }
        self.note_local_change();

        tokio::spawn(run_upload(
            self.api.clone(),
            row_id,
            kind,
            path,
            self.outcomes_tx.clone(),
        ));
    }

    async fn handle_upload_outcome(&mut self, outcome: UploadOutcome) {
        match outcome.result {
            Ok(url) => {
                if !self.rows.finish_upload(outcome.row_id, outcome.kind, url) {
                    // Row was removed or replaced while uploading.
                    return;
                }
                self.clock.note_local_edit();
                self.emit_rows();
                self.flush_immediate().await;
            }
            Err(err) => {
                let message = err.to_string();
                if self.rows.fail_upload(outcome.row_id, outcome.kind, message.clone()) {
                    self.note_local_change();
                }
                self.emit(SessionEvent::UploadFailed {
                    row_id: outcome.row_id,
                    kind: outcome.kind,
                    message,
                });
            }
        }
    }

    /// A user-originated mutation happened: bump the revision, notify the
    /// UI, and arm the debounce while connected and not merely mirroring a
    /// merge.
    fn note_local_change(&mut self) {
        self.clock.note_local_edit();
        self.emit_rows();
        if self.conn.is_connected() && self.clock.should_publish() {
            self.debounce_at = Some(Instant::now() + self.debounce);
        }
    }

    async fn try_connect(&mut self) {
        let _ = self.state_tx.send(ConnectionState::Connecting);
        match self.conn.connect().await {
            Ok(()) => self.push_state(),
            Err(err) => {
                tracing::warn!(error = %err, "draft channel connect failed; will retry");
                self.push_state();
                self.reconnect_at = Some(Instant::now() + self.reconnect_delay);
            }
        }
    }

    async fn flush_debounced(&mut self) {
        if !self.conn.is_connected() || !self.clock.should_publish() {
            return;
        }
        match self.publisher.prepare_debounced(&self.rows) {
            Ok(Some(draft)) => self.send_update(draft).await,
            Ok(None) => {}
            Err(err) => tracing::warn!(error = %err, "failed to prepare draft update"),
        }
    }

    async fn flush_immediate(&mut self) {
        if !self.conn.is_connected() {
            return;
        }
        match self.publisher.prepare_immediate(&self.rows) {
            Ok(Some(draft)) => self.send_update(draft).await,
            Ok(None) => {}
            Err(err) => tracing::warn!(error = %err, "failed to prepare draft update"),
        }
    }

    async fn send_update(&mut self, draft: OutboundDraft) {
        let Some(session_id) = self.conn.session_id() else {
            return;
        };
        let envelope = DraftEnvelope::update(
            self.filter.proto_id,
            self.filter.local_user.clone(),
            session_id,
            draft.rows.clone(),
        );
        match self.conn.send(&envelope).await {
            Ok(()) => self.publisher.record_sent(draft),
            Err(err) => {
                tracing::warn!(error = %err, "draft update send failed");
                if !self.conn.is_connected() {
                    self.push_state();
                    self.reconnect_at = Some(Instant::now() + self.reconnect_delay);
                }
            }
        }
    }

    fn emit_rows(&self) {
        self.emit(SessionEvent::RowsChanged(self.rows.rows().to_vec()));
    }

    fn emit(&self, event: SessionEvent) {
        // Best-effort: a UI that stopped polling loses notifications rather
        // than stalling the loop.
        if let Err(err) = self.events_tx.try_send(event) {
            tracing::debug!(error = %err, "dropping session event");
        }
    }

    fn push_state(&self) {
        let _ = self.state_tx.send(self.conn.state());
    }

    async fn teardown(&mut self) {
        self.reconnect_at = None;
        self.debounce_at = None;
        self.conn.disconnect().await;
        self.push_state();
    }
}
