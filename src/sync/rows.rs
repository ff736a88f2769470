//! Local draft rows for the "add comments" form.
//!
//! Rows live only in memory. Each carries a locally minted id with no
//! relation to any server-assigned comment id; the `persisted` flag marks
//! rows mirrored from the server as opposed to rows still being drafted.
//!
//! The list maintains one invariant: after any mutation it ends with exactly
//! one blank, not-yet-persisted row, so there is always an empty slot ready
//! for further input.

use std::path::PathBuf;

use uuid::Uuid;

use super::envelope::WireRow;

/// Which media slot of a row an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Human label used in error messages ("photo" / "video").
    pub fn label(&self) -> &'static str {
        match self {
            Self::Image => "photo",
            Self::Video => "video",
        }
    }
}

impl std::str::FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "photo" | "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            _ => Err(format!("Invalid media kind: {} (use photo or video)", s)),
        }
    }
}

/// One media attachment slot (photo or video) on a draft row.
///
/// A slot moves through three reference states: local file selection with a
/// preview, then an uploaded remote URL, or back to empty with an error when
/// the upload fails.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaSlot {
    pub local_path: Option<PathBuf>,
    pub preview_url: Option<String>,
    pub uploaded_url: Option<String>,
    pub uploading: bool,
    pub error: Option<String>,
}

impl MediaSlot {
    /// True when the slot holds no selection at all.
    pub fn is_empty(&self) -> bool {
        self.local_path.is_none()
            && self.preview_url.is_none()
            && self.uploaded_url.is_none()
            && !self.uploading
    }

    /// The reference peers may see: the uploaded URL, or the local preview
    /// as long as no upload is in flight. A slot mid-upload contributes
    /// nothing until its URL resolves.
    pub fn broadcast_reference(&self) -> Option<&str> {
        if let Some(url) = self.uploaded_url.as_deref() {
            return Some(url);
        }
        if self.uploading {
            return None;
        }
        self.preview_url.as_deref()
    }

    /// Preview that may cross the wire (never while uploading).
    pub fn wire_preview(&self) -> Option<String> {
        if self.uploading || self.uploaded_url.is_some() {
            None
        } else {
            self.preview_url.clone()
        }
    }

    pub fn begin_upload(&mut self, path: PathBuf, preview_url: String) {
        self.local_path = Some(path);
        self.preview_url = Some(preview_url);
        self.uploaded_url = None;
        self.uploading = true;
        self.error = None;
    }

    pub fn finish_upload(&mut self, url: String) {
        self.uploaded_url = Some(url);
        self.uploading = false;
        self.error = None;
    }

    /// Clears the selection so the user can retry, keeping only the message.
    pub fn fail_upload(&mut self, message: String) {
        self.local_path = None;
        self.preview_url = None;
        self.uploaded_url = None;
        self.uploading = false;
        self.error = Some(message);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// An in-memory, not-yet-submitted comment being composed.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftRow {
    pub id: Uuid,
    pub author: String,
    pub comment: String,
    pub interpreted_comment: String,
    pub image: MediaSlot,
    pub video: MediaSlot,
    pub persisted: bool,
}

impl DraftRow {
    pub fn blank() -> Self {
        Self {
            id: Uuid::new_v4(),
            author: String::new(),
            comment: String::new(),
            interpreted_comment: String::new(),
            image: MediaSlot::default(),
            video: MediaSlot::default(),
            persisted: false,
        }
    }

    /// Blank means: nothing typed and nothing attached (a pending upload
    /// counts as an attachment). Only blank rows qualify as the trailing
    /// ready slot.
    pub fn is_blank(&self) -> bool {
        !self.persisted
            && self.author.is_empty()
            && self.comment.is_empty()
            && self.interpreted_comment.is_empty()
            && self.image.is_empty()
            && self.video.is_empty()
    }

    /// Broadcast filter: persisted rows always qualify; draft rows qualify
    /// once they carry an author, a text, or a visible media reference.
    pub fn has_broadcast_content(&self) -> bool {
        self.persisted
            || !self.author.is_empty()
            || !self.comment.is_empty()
            || !self.interpreted_comment.is_empty()
            || self.image.broadcast_reference().is_some()
            || self.video.broadcast_reference().is_some()
    }

    pub fn slot(&self, kind: MediaKind) -> &MediaSlot {
        match kind {
            MediaKind::Image => &self.image,
            MediaKind::Video => &self.video,
        }
    }

    pub fn slot_mut(&mut self, kind: MediaKind) -> &mut MediaSlot {
        match kind {
            MediaKind::Image => &mut self.image,
            MediaKind::Video => &mut self.video,
        }
    }

    /// Reduce to the wire shape, stripping upload progress and local paths.
    pub fn to_wire(&self) -> WireRow {
        WireRow {
            row_id: self.id,
            author: self.author.clone(),
            comment: self.comment.clone(),
            interpreted_comment: self.interpreted_comment.clone(),
            image_url: self.image.uploaded_url.clone(),
            image_preview: self.image.wire_preview(),
            video_url: self.video.uploaded_url.clone(),
            video_preview: self.video.wire_preview(),
            persisted: self.persisted,
        }
    }

    pub fn from_wire(wire: WireRow) -> Self {
        Self {
            id: wire.row_id,
            author: wire.author,
            comment: wire.comment,
            interpreted_comment: wire.interpreted_comment,
            image: MediaSlot {
                local_path: None,
                preview_url: wire.image_preview,
                uploaded_url: wire.image_url,
                uploading: false,
                error: None,
            },
            video: MediaSlot {
                local_path: None,
                preview_url: wire.video_preview,
                uploaded_url: wire.video_url,
                uploading: false,
                error: None,
            },
            persisted: wire.persisted,
        }
    }
}

/// A single field edit applied to one row.
#[derive(Debug, Clone)]
pub enum RowPatch {
    Author(String),
    Comment(String),
    InterpretedComment(String),
    ClearMedia(MediaKind),
}

/// The ordered draft row list owned by one form session.
#[derive(Debug, Clone)]
pub struct DraftRows {
    rows: Vec<DraftRow>,
}

impl Default for DraftRows {
    fn default() -> Self {
        Self::new()
    }
}

impl DraftRows {
    /// Starts with the single ready slot.
    pub fn new() -> Self {
        Self {
            rows: vec![DraftRow::blank()],
        }
    }

    pub fn rows(&self) -> &[DraftRow] {
        &self.rows
    }

    fn get_mut(&mut self, id: Uuid) -> Option<&mut DraftRow> {
        self.rows.iter_mut().find(|r| r.id == id)
    }

    /// Apply a field patch. Returns false when the row no longer exists.
    pub fn apply(&mut self, id: Uuid, patch: RowPatch) -> bool {
        let Some(row) = self.get_mut(id) else {
            return false;
        };
        match patch {
            RowPatch::Author(v) => row.author = v,
            RowPatch::Comment(v) => row.comment = v,
            RowPatch::InterpretedComment(v) => row.interpreted_comment = v,
            RowPatch::ClearMedia(kind) => row.slot_mut(kind).clear(),
        }
        self.ensure_trailing_blank();
        true
    }

    /// Explicit "add row". A no-op when the trailing slot is still blank.
    pub fn add_row(&mut self) {
        self.rows.push(DraftRow::blank());
        self.ensure_trailing_blank();
    }

    /// Remove a row. Only not-yet-persisted rows may be removed.
    pub fn remove(&mut self, id: Uuid) -> bool {
        let Some(idx) = self.rows.iter().position(|r| r.id == id) else {
            return false;
        };
        if self.rows[idx].persisted {
            return false;
        }
        self.rows.remove(idx);
        self.ensure_trailing_blank();
        true
    }

    /// Wholesale replace from a remote snapshot (last message wins).
    pub fn replace_from_wire(&mut self, wire: Vec<WireRow>) {
        self.rows = wire.into_iter().map(DraftRow::from_wire).collect();
        self.ensure_trailing_blank();
    }

    /// Mark a slot as uploading. Returns false when the row is gone.
    pub fn begin_upload(
        &mut self,
        id: Uuid,
        kind: MediaKind,
        path: PathBuf,
        preview_url: String,
    ) -> bool {
        let Some(row) = self.get_mut(id) else {
            return false;
        };
        row.slot_mut(kind).begin_upload(path, preview_url);
        self.ensure_trailing_blank();
        true
    }

    /// Fold a resolved upload URL into its slot. Returns false when the row
    /// is gone (removed locally or replaced by a merge).
    pub fn finish_upload(&mut self, id: Uuid, kind: MediaKind, url: String) -> bool {
        let Some(row) = self.get_mut(id) else {
            return false;
        };
        row.slot_mut(kind).finish_upload(url);
        self.ensure_trailing_blank();
        true
    }

    /// Record an upload failure, clearing the slot selection.
    pub fn fail_upload(&mut self, id: Uuid, kind: MediaKind, message: String) -> bool {
        let Some(row) = self.get_mut(id) else {
            return false;
        };
        row.slot_mut(kind).fail_upload(message);
        self.ensure_trailing_blank();
        true
    }

    /// Rows that qualify for broadcast, reduced to the wire shape.
    pub fn broadcast_rows(&self) -> Vec<WireRow> {
        self.rows
            .iter()
            .filter(|r| r.has_broadcast_content())
            .map(DraftRow::to_wire)
            .collect()
    }

    /// Re-establish the trailing-blank invariant without re-minting ids:
    /// consecutive trailing blanks collapse to one, and a filled tail gains
    /// a fresh blank row.
    fn ensure_trailing_blank(&mut self) {
        while self.rows.len() >= 2
            && self.rows[self.rows.len() - 1].is_blank()
            && self.rows[self.rows.len() - 2].is_blank()
        {
            self.rows.pop();
        }
        if !self.rows.last().is_some_and(DraftRow::is_blank) {
            self.rows.push(DraftRow::blank());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_list_has_one_blank_row() {
        let rows = DraftRows::new();
        assert_eq!(rows.rows().len(), 1);
        assert!(rows.rows()[0].is_blank());
    }

    #[test]
    fn filling_trailing_row_appends_fresh_blank() {
        let mut rows = DraftRows::new();
        let id = rows.rows()[0].id;
        assert!(rows.apply(id, RowPatch::InterpretedComment("too tight".into())));

        assert_eq!(rows.rows().len(), 2);
        assert_eq!(rows.rows()[0].interpreted_comment, "too tight");
        assert!(!rows.rows()[0].persisted);
        assert!(rows.rows()[1].is_blank());
    }

    #[test]
    fn trailing_blank_id_is_stable_across_edits() {
        let mut rows = DraftRows::new();
        let first = rows.rows()[0].id;
        rows.apply(first, RowPatch::Author("Mina".into()));
        let blank_id = rows.rows()[1].id;
        rows.apply(first, RowPatch::Comment("hem uneven".into()));
        assert_eq!(rows.rows()[1].id, blank_id);
    }

    #[test]
    fn clearing_the_only_content_collapses_back_to_one_blank() {
        let mut rows = DraftRows::new();
        let id = rows.rows()[0].id;
        rows.apply(id, RowPatch::Author("Mina".into()));
        assert_eq!(rows.rows().len(), 2);
        rows.apply(id, RowPatch::Author(String::new()));
        assert_eq!(rows.rows().len(), 1);
    }

    #[test]
    fn add_row_on_blank_tail_is_a_no_op() {
        let mut rows = DraftRows::new();
        rows.add_row();
        assert_eq!(rows.rows().len(), 1);
    }

    #[test]
    fn remove_refuses_persisted_rows() {
        let mut rows = DraftRows::new();
        let wire = WireRow {
            row_id: Uuid::new_v4(),
            author: "Server".into(),
            comment: "approved".into(),
            interpreted_comment: String::new(),
            image_url: None,
            image_preview: None,
            video_url: None,
            video_preview: None,
            persisted: true,
        };
        let persisted_id = wire.row_id;
        rows.replace_from_wire(vec![wire]);
        assert!(!rows.remove(persisted_id));
        assert_eq!(rows.rows().len(), 2);
    }

    #[test]
    fn remove_draft_row_keeps_invariant() {
        let mut rows = DraftRows::new();
        let id = rows.rows()[0].id;
        rows.apply(id, RowPatch::Comment("sleeve twist".into()));
        assert!(rows.remove(id));
        assert_eq!(rows.rows().len(), 1);
        assert!(rows.rows()[0].is_blank());
    }

    #[test]
    fn replace_from_wire_appends_ready_slot() {
        let mut rows = DraftRows::new();
        let wire = WireRow {
            row_id: Uuid::new_v4(),
            author: "Noor".into(),
            comment: String::new(),
            interpreted_comment: "raise pocket 1cm".into(),
            image_url: None,
            image_preview: None,
            video_url: None,
            video_preview: None,
            persisted: false,
        };
        rows.replace_from_wire(vec![wire]);
        assert_eq!(rows.rows().len(), 2);
        assert_eq!(rows.rows()[0].interpreted_comment, "raise pocket 1cm");
        assert!(rows.rows()[1].is_blank());
    }

    #[test]
    fn broadcast_skips_rows_without_content() {
        let mut rows = DraftRows::new();
        let id = rows.rows()[0].id;
        rows.apply(id, RowPatch::Comment("waist sits low".into()));
        // One filled row plus the blank tail; only the filled one goes out.
        let wire = rows.broadcast_rows();
        assert_eq!(wire.len(), 1);
        assert_eq!(wire[0].comment, "waist sits low");
    }

    #[test]
    fn pending_upload_is_not_broadcast_content() {
        let mut rows = DraftRows::new();
        let id = rows.rows()[0].id;
        assert!(rows.begin_upload(
            id,
            MediaKind::Image,
            "/tmp/fit.jpg".into(),
            "file:///tmp/fit.jpg".into(),
        ));

        // The pending slot counts as content for the trailing-row invariant
        // but not for broadcast, so a ready slot appears while nothing goes
        // out yet.
        assert_eq!(rows.rows().len(), 2);
        assert!(!rows.rows()[0].is_blank());
        assert!(rows.broadcast_rows().is_empty());
    }

    #[test]
    fn upload_lifecycle_through_the_list() {
        let mut rows = DraftRows::new();
        let id = rows.rows()[0].id;
        rows.begin_upload(
            id,
            MediaKind::Video,
            "/tmp/walk.mp4".into(),
            "file:///tmp/walk.mp4".into(),
        );
        assert!(rows.finish_upload(id, MediaKind::Video, "https://m.example.com/walk.mp4".into()));
        assert_eq!(rows.broadcast_rows().len(), 1);

        let missing = Uuid::new_v4();
        assert!(!rows.finish_upload(missing, MediaKind::Video, "x".into()));
        assert!(!rows.fail_upload(missing, MediaKind::Image, "gone".into()));
    }

    #[test]
    fn finished_upload_becomes_broadcast_content() {
        let mut row = DraftRow::blank();
        row.image
            .begin_upload("/tmp/fit.jpg".into(), "file:///tmp/fit.jpg".into());
        assert!(!row.has_broadcast_content());
        row.image.finish_upload("https://media.example.com/fit.jpg".into());
        assert!(row.has_broadcast_content());

        let wire = row.to_wire();
        assert_eq!(
            wire.image_url.as_deref(),
            Some("https://media.example.com/fit.jpg")
        );
        // The preview is superseded by the remote URL.
        assert!(wire.image_preview.is_none());
    }

    #[test]
    fn failed_upload_clears_selection_and_keeps_message() {
        let mut row = DraftRow::blank();
        row.video
            .begin_upload("/tmp/walk.mp4".into(), "file:///tmp/walk.mp4".into());
        row.video.fail_upload("video is too large".into());
        assert!(row.video.is_empty());
        assert_eq!(row.video.error.as_deref(), Some("video is too large"));
    }

    #[test]
    fn wire_round_trip_preserves_visible_fields() {
        let mut row = DraftRow::blank();
        row.author = "Mina".into();
        row.comment = "shoulder pulls".into();
        row.image.preview_url = Some("file:///tmp/a.jpg".into());
        let back = DraftRow::from_wire(row.to_wire());
        assert_eq!(back.id, row.id);
        assert_eq!(back.author, "Mina");
        assert_eq!(back.comment, "shoulder pulls");
        assert_eq!(back.image.preview_url.as_deref(), Some("file:///tmp/a.jpg"));
        assert!(back.image.local_path.is_none());
    }
}
