//! Typed error hierarchy for the atelier client.
//!
//! Three top-level enums cover the three subsystems:
//! - `SyncError` — draft-sync connection and publishing failures
//! - `ApiError` — request/response API failures
//! - `UploadError` — media upload failures, surfaced per row slot

use thiserror::Error;

/// Errors from the draft-sync subsystem.
///
/// Everything here is non-fatal by design: the worst outcome of a sync
/// failure is a stale or absent draft preview, never loss of persisted data.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("WebSocket transport error: {0}")]
    Transport(String),

    #[error("Not connected to the draft channel")]
    NotConnected,

    #[error("Malformed draft message: {0}")]
    MalformedMessage(String),

    #[error("Failed to serialize outbound draft message: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Draft session is no longer running")]
    SessionClosed,
}

/// Errors from the request/response API client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("API returned {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Failed to decode API response: {0}")]
    Decode(#[source] reqwest::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors from a media upload attempt.
///
/// Messages are shown inline next to the owning row slot, so every variant
/// renders as a complete human-readable sentence.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("{kind} is too large ({size} bytes, limit {limit})")]
    TooLarge {
        kind: &'static str,
        size: u64,
        limit: u64,
    },

    #[error("Could not read {path}: {source}")]
    Unreadable {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Upload rejected: {0}")]
    Rejected(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}
