use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;

use super::auth::AccessTokenProvider;
use crate::core::bibs::bib_models::{ExportedDocument, PDF_MIME_TYPE};
use crate::core::bibs::{BibError, FileStore};

const DRIVE_BASE_URL: &str = "https://www.googleapis.com/drive/v3";
const DRIVE_UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3";

#[derive(Debug, Deserialize)]
struct FileRef {
    id: String,
}

/// Drive v3 client covering the file lifecycle of one bib.
pub struct GoogleDriveClient {
    client: Client,
    auth: Arc<dyn AccessTokenProvider>,
    base_url: String,
    upload_url: String,
}

impl GoogleDriveClient {
    pub fn new(client: Client, auth: Arc<dyn AccessTokenProvider>) -> Self {
        Self {
            client,
            auth,
            base_url: DRIVE_BASE_URL.to_string(),
            upload_url: DRIVE_UPLOAD_URL.to_string(),
        }
    }

    async fn ensure_success(response: Response, action: &str) -> Result<Response, BibError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        Err(BibError::Drive(format!("{} failed ({}): {}", action, status, text)))
    }

    async fn file_ref(response: Response, action: &str) -> Result<String, BibError> {
        let response = Self::ensure_success(response, action).await?;
        let file: FileRef = response
            .json()
            .await
            .map_err(|e| BibError::Drive(e.to_string()))?;
        Ok(file.id)
    }
}

/// A `multipart/related` body: JSON metadata first, then the media.
/// Returns the body and its content type header value.
fn multipart_related(
    boundary: &str,
    metadata: &serde_json::Value,
    mime_type: &str,
    media: &[u8],
) -> (Vec<u8>, String) {
    let mut body = Vec::with_capacity(media.len() + 512);
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata.to_string().as_bytes());
    body.extend_from_slice(format!("\r\n--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", mime_type).as_bytes());
    body.extend_from_slice(media);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    (body, format!("multipart/related; boundary={}", boundary))
}

fn random_boundary() -> String {
    format!("bib_boundary_{:016x}", rand::random::<u64>())
}

#[async_trait]
impl FileStore for GoogleDriveClient {
    async fn copy_file(&self, file_id: &str, copy_name: &str) -> Result<String, BibError> {
        let token = self.auth.access_token().await?;
        let url = format!("{}/files/{}/copy", self.base_url, file_id);

        let response = self
            .client
            .post(&url)
            .query(&[("supportsAllDrives", "true"), ("fields", "id")])
            .bearer_auth(token)
            .json(&json!({ "name": copy_name }))
            .send()
            .await
            .map_err(|e| BibError::Drive(e.to_string()))?;

        Self::file_ref(response, &format!("Copying template {}", file_id)).await
    }

    async fn export_pdf(&self, file_id: &str) -> Result<ExportedDocument, BibError> {
        let token = self.auth.access_token().await?;
        let url = format!("{}/files/{}/export", self.base_url, file_id);

        let response = self
            .client
            .get(&url)
            .query(&[("mimeType", PDF_MIME_TYPE)])
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| BibError::Drive(e.to_string()))?;

        // Status is judged by the export policy, not here.
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| BibError::Drive(e.to_string()))?
            .to_vec();

        tracing::debug!(file_id, status, size = bytes.len(), "PDF export received");

        Ok(ExportedDocument {
            status,
            content_type,
            bytes,
        })
    }

    async fn upload_file(
        &self,
        folder_id: &str,
        name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, BibError> {
        let token = self.auth.access_token().await?;
        let url = format!("{}/files", self.upload_url);
        let metadata = json!({
            "name": name,
            "mimeType": mime_type,
            "parents": [folder_id],
        });
        let (body, content_type) =
            multipart_related(&random_boundary(), &metadata, mime_type, &bytes);

        let response = self
            .client
            .post(&url)
            .query(&[
                ("uploadType", "multipart"),
                ("supportsAllDrives", "true"),
                ("fields", "id"),
            ])
            .bearer_auth(token)
            .header(CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| BibError::Drive(e.to_string()))?;

        Self::file_ref(response, &format!("Uploading {}", name)).await
    }

    async fn share_publicly(&self, file_id: &str) -> Result<(), BibError> {
        let token = self.auth.access_token().await?;
        let url = format!("{}/files/{}/permissions", self.base_url, file_id);

        let response = self
            .client
            .post(&url)
            .query(&[("supportsAllDrives", "true")])
            .bearer_auth(token)
            .json(&json!({ "role": "reader", "type": "anyone" }))
            .send()
            .await
            .map_err(|e| BibError::Drive(e.to_string()))?;

        Self::ensure_success(response, &format!("Sharing {}", file_id)).await?;
        Ok(())
    }

    async fn delete_file(&self, file_id: &str) -> Result<(), BibError> {
        let token = self.auth.access_token().await?;
        let url = format!("{}/files/{}", self.base_url, file_id);

        let response = self
            .client
            .delete(&url)
            .query(&[("supportsAllDrives", "true")])
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| BibError::Drive(e.to_string()))?;

        Self::ensure_success(response, &format!("Deleting {}", file_id)).await?;
        tracing::debug!("Deleted file {}", file_id);
        Ok(())
    }
}
