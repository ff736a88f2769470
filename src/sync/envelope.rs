//! Wire format for the draft channel.
//!
//! Both directions use the same envelope: an internally tagged JSON object
//! carrying the proto scope, the sender's durable user id, the per-connection
//! session id, and a timestamp. Draft updates additionally carry a snapshot
//! of the sender's rows, reduced to the fields peers can render — upload
//! progress flags and local file paths never cross the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One draft row as transmitted to peers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WireRow {
    pub row_id: Uuid,
    pub author: String,
    pub comment: String,
    pub interpreted_comment: String,
    pub image_url: Option<String>,
    pub image_preview: Option<String>,
    pub video_url: Option<String>,
    pub video_preview: Option<String>,
    pub persisted: bool,
}

/// Payload of a draft update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DraftPayload {
    pub rows: Vec<WireRow>,
}

/// Envelope for every message on the draft channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DraftEnvelope {
    /// One-shot announcement sent right after the socket opens.
    Connected {
        proto_id: i64,
        user_id: String,
        session_id: Uuid,
        timestamp: DateTime<Utc>,
    },
    /// Snapshot of the sender's current draft rows.
    DraftUpdate {
        proto_id: i64,
        user_id: String,
        session_id: Uuid,
        timestamp: DateTime<Utc>,
        content: DraftPayload,
    },
}

impl DraftEnvelope {
    /// Build the connection announcement.
    pub fn hello(proto_id: i64, user_id: String, session_id: Uuid) -> Self {
        Self::Connected {
            proto_id,
            user_id,
            session_id,
            timestamp: Utc::now(),
        }
    }

    /// Build a draft update carrying the given row snapshot.
    pub fn update(proto_id: i64, user_id: String, session_id: Uuid, rows: Vec<WireRow>) -> Self {
        Self::DraftUpdate {
            proto_id,
            user_id,
            session_id,
            timestamp: Utc::now(),
            content: DraftPayload { rows },
        }
    }

    pub fn proto_id(&self) -> i64 {
        match self {
            Self::Connected { proto_id, .. } | Self::DraftUpdate { proto_id, .. } => *proto_id,
        }
    }

    pub fn user_id(&self) -> &str {
        match self {
            Self::Connected { user_id, .. } | Self::DraftUpdate { user_id, .. } => user_id,
        }
    }
}
