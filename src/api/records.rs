//! Client-side shadow copies of the persisted workflow records.
//!
//! All of these are defined and owned by the tracker backend; the client
//! only deserializes them for display and serializes create/update payloads.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A development cycle ("MSR") groups the styles being worked for a season.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevelopmentCycle {
    pub id: i64,
    pub name: String,
    pub season: String,
    pub status: CycleStatus,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum CycleStatus {
    Planning,
    Sampling,
    Review,
    Closed,
}

impl CycleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::Sampling => "sampling",
            Self::Review => "review",
            Self::Closed => "closed",
        }
    }
}

impl FromStr for CycleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planning" => Ok(Self::Planning),
            "sampling" => Ok(Self::Sampling),
            "review" => Ok(Self::Review),
            "closed" => Ok(Self::Closed),
            _ => Err(format!("Invalid cycle status: {}", s)),
        }
    }
}

/// A style (one garment design inside a cycle's collection).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Style {
    pub id: i64,
    pub cycle_id: i64,
    pub code: String,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A prototype garment round for a style.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proto {
    pub id: i64,
    pub style_id: i64,
    /// Sample round, starting at 1 for the first proto.
    pub round: i32,
    pub status: ProtoStatus,
    pub notes: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ProtoStatus {
    Requested,
    InProduction,
    Received,
    UnderReview,
    Approved,
    Rejected,
}

impl ProtoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::InProduction => "in_production",
            Self::Received => "received",
            Self::UnderReview => "under_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl FromStr for ProtoStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "requested" => Ok(Self::Requested),
            "in_production" => Ok(Self::InProduction),
            "received" => Ok(Self::Received),
            "under_review" => Ok(Self::UnderReview),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(format!("Invalid proto status: {}", s)),
        }
    }
}

/// One measurement point on a tech spec.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpecMeasurement {
    /// Point of measure, e.g. "chest width 1cm below armhole".
    pub point: String,
    pub value_cm: f64,
    pub tolerance_cm: f64,
}

/// Technical specification attached to a proto.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechSpec {
    pub id: i64,
    pub proto_id: i64,
    pub measurements: Vec<SpecMeasurement>,
    pub created_at: String,
    pub updated_at: String,
}

/// A persisted reviewer comment on a proto.
///
/// The draft-side counterpart of this record lives in `crate::sync::rows`;
/// once submitted, the server assigns the id and the media URLs are final.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub proto_id: i64,
    pub author: String,
    pub comment: String,
    pub interpreted_comment: String,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub created_at: String,
}

// ── Pagination ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageQuery {
    pub page: u32,
    pub per_page: u32,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 25,
        }
    }
}

/// One page of a listing response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
}

// ── Create/update payloads ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct NewCycle {
    pub name: String,
    pub season: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewStyle {
    pub cycle_id: i64,
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewProto {
    pub style_id: i64,
    pub round: i32,
    pub notes: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewComment {
    pub proto_id: i64,
    pub author: String,
    pub comment: String,
    pub interpreted_comment: String,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
}

/// Result of a successful media upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedMedia {
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_status_round_trips_through_str() {
        for status in [
            CycleStatus::Planning,
            CycleStatus::Sampling,
            CycleStatus::Review,
            CycleStatus::Closed,
        ] {
            let parsed: CycleStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn proto_status_rejects_unknown() {
        let result: Result<ProtoStatus, _> = "fitted".parse();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("fitted"));
    }

    #[test]
    fn proto_status_serializes_snake_case() {
        let json = serde_json::to_string(&ProtoStatus::InProduction).unwrap();
        assert_eq!(json, "\"in_production\"");
    }

    #[test]
    fn comment_deserializes_with_null_media() {
        let json = r#"{
            "id": 7,
            "proto_id": 3,
            "author": "Mina",
            "comment": "collar sits too high",
            "interpreted_comment": "drop collar 0.5cm",
            "image_url": null,
            "video_url": null,
            "created_at": "2026-02-01T10:00:00Z"
        }"#;
        let comment: Comment = serde_json::from_str(json).unwrap();
        assert_eq!(comment.author, "Mina");
        assert!(comment.image_url.is_none());
    }

    #[test]
    fn page_query_default_is_first_page() {
        let query = PageQuery::default();
        assert_eq!(query.page, 1);
        assert_eq!(query.per_page, 25);
    }

    #[test]
    fn page_deserializes_generic_items() {
        let json = r#"{"items":[{"point":"waist","value_cm":40.0,"tolerance_cm":0.5}],"page":1,"per_page":25,"total":1}"#;
        let page: Page<SpecMeasurement> = serde_json::from_str(json).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].point, "waist");
    }
}
