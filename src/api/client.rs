//! Thin request/response client for the tracker backend.
//!
//! Every persisted entity is owned by the backend; these wrappers only move
//! JSON in and out and normalize failures into [`ApiError`] with a
//! human-readable message. The one contract the sync core depends on is
//! [`ApiClient::upload_media`]: file in, remote URL out.

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::errors::ApiError;
use crate::sync::rows::MediaKind;

use super::records::*;

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
            token: token.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.api_url.clone(), config.token.clone())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ── Generic request helpers ───────────────────────────────────────

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Http {
            status: status.as_u16(),
            message: error_message(status.as_u16(), &body),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let response = self
            .http
            .get(self.url(path))
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await
            .map_err(ApiError::Request)?;
        Self::check(response).await?.json().await.map_err(ApiError::Decode)
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .http
            .post(self.url(path))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(ApiError::Request)?;
        Self::check(response).await?.json().await.map_err(ApiError::Decode)
    }

    async fn patch_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .http
            .patch(self.url(path))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(ApiError::Request)?;
        Self::check(response).await?.json().await.map_err(ApiError::Decode)
    }

    async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let response = self
            .http
            .delete(self.url(path))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(ApiError::Request)?;
        Self::check(response).await?;
        Ok(())
    }

    fn page_params(query: PageQuery) -> Vec<(&'static str, String)> {
        vec![
            ("page", query.page.to_string()),
            ("per_page", query.per_page.to_string()),
        ]
    }

    // ── Development cycles ────────────────────────────────────────────

    pub async fn list_cycles(&self, query: PageQuery) -> Result<Page<DevelopmentCycle>, ApiError> {
        self.get_json("/api/cycles", &Self::page_params(query)).await
    }

    pub async fn get_cycle(&self, id: i64) -> Result<DevelopmentCycle, ApiError> {
        self.get_json(&format!("/api/cycles/{}", id), &[]).await
    }

    pub async fn create_cycle(&self, cycle: &NewCycle) -> Result<DevelopmentCycle, ApiError> {
        self.post_json("/api/cycles", cycle).await
    }

    pub async fn update_cycle_status(
        &self,
        id: i64,
        status: CycleStatus,
    ) -> Result<DevelopmentCycle, ApiError> {
        self.patch_json(
            &format!("/api/cycles/{}", id),
            &serde_json::json!({ "status": status }),
        )
        .await
    }

    pub async fn delete_cycle(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/api/cycles/{}", id)).await
    }

    // ── Styles ────────────────────────────────────────────────────────

    pub async fn list_styles(
        &self,
        cycle_id: i64,
        query: PageQuery,
    ) -> Result<Page<Style>, ApiError> {
        self.get_json(
            &format!("/api/cycles/{}/styles", cycle_id),
            &Self::page_params(query),
        )
        .await
    }

    pub async fn create_style(&self, style: &NewStyle) -> Result<Style, ApiError> {
        self.post_json("/api/styles", style).await
    }

    pub async fn delete_style(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/api/styles/{}", id)).await
    }

    // ── Protos ────────────────────────────────────────────────────────

    pub async fn list_protos(
        &self,
        style_id: i64,
        query: PageQuery,
    ) -> Result<Page<Proto>, ApiError> {
        self.get_json(
            &format!("/api/styles/{}/protos", style_id),
            &Self::page_params(query),
        )
        .await
    }

    pub async fn get_proto(&self, id: i64) -> Result<Proto, ApiError> {
        self.get_json(&format!("/api/protos/{}", id), &[]).await
    }

    pub async fn create_proto(&self, proto: &NewProto) -> Result<Proto, ApiError> {
        self.post_json("/api/protos", proto).await
    }

    pub async fn update_proto_status(
        &self,
        id: i64,
        status: ProtoStatus,
    ) -> Result<Proto, ApiError> {
        self.patch_json(
            &format!("/api/protos/{}", id),
            &serde_json::json!({ "status": status }),
        )
        .await
    }

    pub async fn delete_proto(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/api/protos/{}", id)).await
    }

    // ── Tech specs ────────────────────────────────────────────────────

    pub async fn get_tech_spec(&self, proto_id: i64) -> Result<Option<TechSpec>, ApiError> {
        match self
            .get_json(&format!("/api/protos/{}/spec", proto_id), &[])
            .await
        {
            Ok(spec) => Ok(Some(spec)),
            Err(ApiError::Http { status: 404, .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub async fn put_tech_spec(
        &self,
        proto_id: i64,
        measurements: &[SpecMeasurement],
    ) -> Result<TechSpec, ApiError> {
        self.post_json(
            &format!("/api/protos/{}/spec", proto_id),
            &serde_json::json!({ "measurements": measurements }),
        )
        .await
    }

    // ── Comments ──────────────────────────────────────────────────────

    pub async fn list_comments(&self, proto_id: i64) -> Result<Vec<Comment>, ApiError> {
        self.get_json(&format!("/api/protos/{}/comments", proto_id), &[])
            .await
    }

    pub async fn create_comment(&self, comment: &NewComment) -> Result<Comment, ApiError> {
        self.post_json("/api/comments", comment).await
    }

    pub async fn delete_comment(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/api/comments/{}", id)).await
    }

    // ── Media upload ──────────────────────────────────────────────────

    /// Upload a media file; the backend stores it and returns its URL.
    pub async fn upload_media(
        &self,
        path: &Path,
        kind: MediaKind,
    ) -> Result<UploadedMedia, ApiError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload.bin".to_string());

        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(self.url("/api/media"))
            .bearer_auth(&self.token)
            .query(&[("kind", kind.label())])
            .multipart(form)
            .send()
            .await
            .map_err(ApiError::Request)?;
        Self::check(response).await?.json().await.map_err(ApiError::Decode)
    }
}

/// Extract a human-readable message from an error response body.
/// The backend uses `{"error": "..."}`; anything else falls back to the raw
/// body or the bare status.
fn error_message(status: u16, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = value.get("error").and_then(|v| v.as_str()) {
            return message.to_string();
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status)
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let client = ApiClient::new("http://localhost:4710/", "tok");
        assert_eq!(client.url("/api/cycles"), "http://localhost:4710/api/cycles");
    }

    #[test]
    fn error_message_prefers_error_field() {
        let message = error_message(400, r#"{"error":"author is required"}"#);
        assert_eq!(message, "author is required");
    }

    #[test]
    fn error_message_falls_back_to_body() {
        assert_eq!(error_message(502, "bad gateway"), "bad gateway");
    }

    #[test]
    fn error_message_falls_back_to_status() {
        assert_eq!(error_message(500, "   "), "HTTP 500");
    }

    #[test]
    fn page_params_carry_both_fields() {
        let params = ApiClient::page_params(PageQuery {
            page: 3,
            per_page: 50,
        });
        assert_eq!(params[0], ("page", "3".to_string()));
        assert_eq!(params[1], ("per_page", "50".to_string()));
    }
}
