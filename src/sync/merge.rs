//! Inbound screening and echo suppression for remote draft updates.
//!
//! Screening drops self-originated and foreign-proto messages before they
//! touch local state. Echo suppression uses a pair of revision counters
//! instead of a timed guard flag: every local mutation bumps `local`, and
//! applying a remote merge records the post-merge revision in `merged`. The
//! publisher is only armed while the two differ, so a merge can never
//! re-broadcast itself and there is no settle-window race with concurrent
//! local edits.

use super::envelope::{DraftEnvelope, WireRow};

/// Decides which inbound envelopes may be applied to local state.
#[derive(Debug, Clone)]
pub struct MergeFilter {
    /// Durable identity of the local user; matching messages are echoes.
    pub local_user: String,
    /// The proto whose comment form this session edits.
    pub proto_id: i64,
}

/// Outcome of screening one inbound envelope.
#[derive(Debug, PartialEq)]
pub enum MergeDecision {
    /// Replace local rows with this snapshot.
    Apply(Vec<WireRow>),
    /// Self-originated message, dropped regardless of session id.
    SkipSelf,
    /// Message scoped to a different proto.
    SkipForeign,
    /// Peer connection announcement; nothing to merge.
    SkipAnnouncement,
}

impl MergeFilter {
    pub fn new(local_user: impl Into<String>, proto_id: i64) -> Self {
        Self {
            local_user: local_user.into(),
            proto_id,
        }
    }

    pub fn screen(&self, envelope: DraftEnvelope) -> MergeDecision {
        if envelope.user_id() == self.local_user {
            return MergeDecision::SkipSelf;
        }
        if envelope.proto_id() != self.proto_id {
            return MergeDecision::SkipForeign;
        }
        match envelope {
            DraftEnvelope::DraftUpdate { content, .. } => MergeDecision::Apply(content.rows),
            DraftEnvelope::Connected { .. } => MergeDecision::SkipAnnouncement,
        }
    }
}

/// Local/merged revision counters driving echo suppression.
#[derive(Debug, Default, Clone, Copy)]
pub struct RevisionClock {
    local: u64,
    merged: u64,
}

impl RevisionClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// A user-originated mutation of the row list.
    pub fn note_local_edit(&mut self) {
        self.local += 1;
    }

    /// A remote snapshot was applied; the resulting state must not echo.
    pub fn note_merge(&mut self) {
        self.local += 1;
        self.merged = self.local;
    }

    /// True while the current state diverges from the last merged-in state.
    pub fn should_publish(&self) -> bool {
        self.local != self.merged
    }
}
