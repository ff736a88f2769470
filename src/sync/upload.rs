//! Background media upload task for draft rows.
//!
//! The session validates the file size, flags the slot as uploading, and
//! spawns [`run_upload`]; the outcome flows back into the session loop over
//! a channel so row state is only ever touched from one place.

use std::path::PathBuf;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::api::ApiClient;
use crate::errors::UploadError;

use super::rows::MediaKind;

/// Result of one background upload, routed back to the owning session.
#[derive(Debug)]
pub struct UploadOutcome {
    pub row_id: Uuid,
    pub kind: MediaKind,
    pub result: Result<String, UploadError>,
}

/// Upload one file and report the resulting URL (or failure).
pub async fn run_upload(
    api: ApiClient,
    row_id: Uuid,
    kind: MediaKind,
    path: PathBuf,
    outcomes: mpsc::Sender<UploadOutcome>,
) {
    let result = api
        .upload_media(&path, kind)
        .await
        .map(|media| media.url)
        .map_err(UploadError::from);
    if let Err(ref err) = result {
        tracing::debug!(%row_id, kind = kind.label(), error = %err, "media upload failed");
    }
    // The session may already be gone; that is fine.
    let _ = outcomes.send(UploadOutcome {
        row_id,
        kind,
        result,
    })
    .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn unreachable_backend_reports_failure_outcome() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"jpeg bytes").unwrap();

        // Port 1 refuses connections.
        let api = ApiClient::new("http://127.0.0.1:1", "tok");
        let (tx, mut rx) = mpsc::channel(1);
        let row_id = Uuid::new_v4();

        run_upload(api, row_id, MediaKind::Image, file.path().to_path_buf(), tx).await;

        let outcome = rx.recv().await.expect("outcome should be delivered");
        assert_eq!(outcome.row_id, row_id);
        assert_eq!(outcome.kind, MediaKind::Image);
        assert!(outcome.result.is_err());
    }
}
