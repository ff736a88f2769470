//! Client-side validation: submit gating for draft rows and media size caps.
//!
//! All checks run before any network call. Failures surface as inline,
//! field-scoped messages; nothing here is fatal to the form.

use std::path::Path;

use crate::errors::UploadError;
use crate::sync::rows::{DraftRow, MediaKind};

/// Photos above this size are rejected before upload.
pub const MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;

/// Videos above this size are rejected before upload.
pub const MAX_VIDEO_BYTES: u64 = 100 * 1024 * 1024;

pub fn media_size_limit(kind: MediaKind) -> u64 {
    match kind {
        MediaKind::Image => MAX_IMAGE_BYTES,
        MediaKind::Video => MAX_VIDEO_BYTES,
    }
}

/// One inline validation message, scoped to a form field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Gate a draft row before submission. Persisted rows pass trivially; draft
/// rows need an author, at least one comment text, and no upload in flight.
pub fn validate_for_submit(row: &DraftRow) -> Result<(), Vec<FieldError>> {
    if row.persisted {
        return Ok(());
    }
    let mut errors = Vec::new();
    if row.author.trim().is_empty() {
        errors.push(FieldError::new("author", "Author is required"));
    }
    if row.comment.trim().is_empty() && row.interpreted_comment.trim().is_empty() {
        errors.push(FieldError::new(
            "comment",
            "Enter a comment or an interpreted comment",
        ));
    }
    if row.image.uploading {
        errors.push(FieldError::new("image", "Photo upload still in progress"));
    }
    if row.video.uploading {
        errors.push(FieldError::new("video", "Video upload still in progress"));
    }
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Check a media file against its size cap. Returns the file size.
pub fn check_media_size(path: &Path, kind: MediaKind) -> Result<u64, UploadError> {
    let metadata = std::fs::metadata(path).map_err(|source| UploadError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let size = metadata.len();
    let limit = media_size_limit(kind);
    if size > limit {
        return Err(UploadError::TooLarge {
            kind: kind.label(),
            size,
            limit,
        });
    }
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::rows::DraftRow;
    use std::io::Write;

    fn filled_row() -> DraftRow {
        let mut row = DraftRow::blank();
        row.author = "Mina".into();
        row.comment = "collar sits too high".into();
        row
    }

    #[test]
    fn valid_row_passes() {
        assert!(validate_for_submit(&filled_row()).is_ok());
    }

    #[test]
    fn missing_author_is_reported() {
        let mut row = filled_row();
        row.author = "  ".into();
        let errors = validate_for_submit(&row).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "author");
    }

    #[test]
    fn one_comment_text_is_enough() {
        let mut row = filled_row();
        row.comment.clear();
        row.interpreted_comment = "drop collar 0.5cm".into();
        assert!(validate_for_submit(&row).is_ok());
    }

    #[test]
    fn both_texts_missing_is_reported_once() {
        let mut row = filled_row();
        row.comment.clear();
        let errors = validate_for_submit(&row).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "comment");
    }

    #[test]
    fn pending_upload_blocks_submit() {
        let mut row = filled_row();
        row.image
            .begin_upload("/tmp/fit.jpg".into(), "file:///tmp/fit.jpg".into());
        let errors = validate_for_submit(&row).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "image"));
    }

    #[test]
    fn persisted_rows_pass_trivially() {
        let mut row = DraftRow::blank();
        row.persisted = true;
        assert!(validate_for_submit(&row).is_ok());
    }

    #[test]
    fn small_file_passes_size_check() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"jpeg bytes").unwrap();
        let size = check_media_size(file.path(), MediaKind::Image).unwrap();
        assert_eq!(size, 10);
    }

    #[test]
    fn missing_file_is_unreadable() {
        let result = check_media_size(Path::new("/nonexistent/fit.jpg"), MediaKind::Image);
        assert!(matches!(result, Err(UploadError::Unreadable { .. })));
    }

    #[test]
    fn oversized_file_is_rejected_with_label() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        // Sparse-ish: write past the image cap.
        file.as_file()
            .set_len(MAX_IMAGE_BYTES + 1)
            .unwrap();
        file.flush().unwrap();
        let result = check_media_size(file.path(), MediaKind::Image);
        match result {
            Err(UploadError::TooLarge { kind, limit, .. }) => {
                assert_eq!(kind, "photo");
                assert_eq!(limit, MAX_IMAGE_BYTES);
            }
            other => panic!("Expected TooLarge, got {:?}", other),
        }
    }
}
