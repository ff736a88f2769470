//! Outbound draft publishing: content filter, dedup, and envelopes.
//!
//! The publisher itself is pure — it decides *what* goes out. The timing
//! (the 2 second quiet window and its cancellation) lives in the session
//! event loop, which makes the filter and dedup rules directly testable.

use crate::errors::SyncError;

use super::envelope::WireRow;
use super::rows::DraftRows;

/// A prepared outbound snapshot, held until the send succeeds.
#[derive(Debug, Clone)]
pub struct OutboundDraft {
    pub rows: Vec<WireRow>,
    serialized: String,
}

/// Builds outbound draft snapshots, suppressing empty and duplicate sends.
#[derive(Debug, Default)]
pub struct DraftPublisher {
    /// Serialized payload of the last snapshot that actually went out.
    last_sent: Option<String>,
}

impl DraftPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepare a debounced send. Returns `None` when the filtered row set is
    /// empty or byte-identical to the last successfully sent payload.
    pub fn prepare_debounced(&self, rows: &DraftRows) -> Result<Option<OutboundDraft>, SyncError> {
        let Some(draft) = Self::snapshot(rows)? else {
            return Ok(None);
        };
        if self.last_sent.as_deref() == Some(draft.serialized.as_str()) {
            return Ok(None);
        }
        Ok(Some(draft))
    }

    /// Prepare an immediate send (upload completion). Applies the same
    /// content filter but never the dedup check.
    pub fn prepare_immediate(&self, rows: &DraftRows) -> Result<Option<OutboundDraft>, SyncError> {
        Self::snapshot(rows)
    }

    /// Record a snapshot as sent, after the transport accepted it.
    pub fn record_sent(&mut self, draft: OutboundDraft) {
        self.last_sent = Some(draft.serialized);
    }

    fn snapshot(rows: &DraftRows) -> Result<Option<OutboundDraft>, SyncError> {
        let wire = rows.broadcast_rows();
        if wire.is_empty() {
            return Ok(None);
        }
        let serialized = serde_json::to_string(&wire).map_err(SyncError::Encode)?;
        Ok(Some(OutboundDraft {
            rows: wire,
            serialized,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::rows::RowPatch;

    fn rows_with_comment(text: &str) -> DraftRows {
        let mut rows = DraftRows::new();
        let id = rows.rows()[0].id;
        rows.apply(id, RowPatch::Comment(text.into()));
        rows
    }

    #[test]
    fn empty_row_list_produces_nothing() {
        let publisher = DraftPublisher::new();
        let rows = DraftRows::new(); // only the blank ready slot
        assert!(publisher.prepare_debounced(&rows).unwrap().is_none());
        assert!(publisher.prepare_immediate(&rows).unwrap().is_none());
    }

    #[test]
    fn identical_payload_is_suppressed_after_send() {
        let mut publisher = DraftPublisher::new();
        let rows = rows_with_comment("too tight");

        let first = publisher.prepare_debounced(&rows).unwrap();
        let draft = first.expect("first send should go out");
        publisher.record_sent(draft);

        // Nothing changed: the debounced path dedups.
        assert!(publisher.prepare_debounced(&rows).unwrap().is_none());
    }

    #[test]
    fn unsent_payload_is_not_recorded() {
        let publisher = DraftPublisher::new();
        let rows = rows_with_comment("too tight");

        // prepare without record_sent: a retry still produces the snapshot
        assert!(publisher.prepare_debounced(&rows).unwrap().is_some());
        assert!(publisher.prepare_debounced(&rows).unwrap().is_some());
    }

    #[test]
    fn changed_payload_goes_out_again() {
        let mut publisher = DraftPublisher::new();
        let mut rows = rows_with_comment("too tight");
        let draft = publisher.prepare_debounced(&rows).unwrap().unwrap();
        publisher.record_sent(draft);

        let id = rows.rows()[0].id;
        rows.apply(id, RowPatch::Comment("too tight at waist".into()));
        assert!(publisher.prepare_debounced(&rows).unwrap().is_some());
    }

    #[test]
    fn immediate_path_skips_dedup() {
        let mut publisher = DraftPublisher::new();
        let rows = rows_with_comment("too tight");
        let draft = publisher.prepare_immediate(&rows).unwrap().unwrap();
        publisher.record_sent(draft);

        // Same payload again: immediate sends anyway.
        assert!(publisher.prepare_immediate(&rows).unwrap().is_some());
        // ...while the debounced path would suppress it.
        assert!(publisher.prepare_debounced(&rows).unwrap().is_none());
    }

    #[test]
    fn snapshot_contains_only_qualifying_rows() {
        let rows = rows_with_comment("hem uneven");
        let publisher = DraftPublisher::new();
        let draft = publisher.prepare_debounced(&rows).unwrap().unwrap();
        assert_eq!(draft.rows.len(), 1);
        assert_eq!(draft.rows[0].comment, "hem uneven");
    }
}
