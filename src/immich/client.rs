use crate::config::{MigrationConfig, API_CALL_TIMEOUT};
use crate::immich::models::{Album, AssetInfo, AssetUpdate, AssetUploadResponse, UploadRequest, UploadedAsset};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::multipart;
use reqwest::{Client, StatusCode};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

/// Device identifier reported in every upload envelope.
pub const DEVICE_ID: &str = "gphoto-migration-tool";
/// Device-asset identifier reported in every upload envelope.
pub const DEVICE_ASSET_ID: &str = "gphoto_1";

/// Statuses retried transparently with backoff before a call is failed.
const TRANSIENT_STATUSES: &[u16] = &[429, 500, 502, 503, 504];

#[derive(Error, Debug)]
pub enum ImmichError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Server rejected request with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid API key: {0}")]
    ApiKey(#[from] reqwest::header::InvalidHeaderValue),
}

/// The slice of the Immich REST API the migration engine consumes.
///
/// A trait seam so tests can run the whole engine against an in-memory
/// server double.
#[async_trait]
pub trait ImmichApi: Send + Sync {
    /// Create-or-detect-duplicate upload of one asset.
    async fn upload_asset(&self, request: &UploadRequest) -> Result<UploadedAsset, ImmichError>;
    /// Fetch the current server-side record of an asset.
    async fn get_asset(&self, asset_id: &str) -> Result<AssetInfo, ImmichError>;
    /// Apply a metadata correction to one or more assets.
    async fn update_assets(&self, update: &AssetUpdate) -> Result<(), ImmichError>;
    /// List all albums visible to the API key.
    async fn list_albums(&self) -> Result<Vec<Album>, ImmichError>;
    /// Create a new album and return it.
    async fn create_album(&self, name: &str) -> Result<Album, ImmichError>;
    /// Add assets to an existing album.
    async fn add_to_album(&self, album_id: &str, asset_ids: &[String]) -> Result<(), ImmichError>;
}

/// Production client. One instance is shared by all workers so the
/// underlying connection pool is reused across uploads.
pub struct ImmichClient {
    client: Client,
    base_url: String,
    retry_attempts: u32,
    upload_timeout: Duration,
}

impl ImmichClient {
    pub fn new(config: &MigrationConfig) -> Result<Self, ImmichError> {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_str(&config.api_key)?);

        let client = Client::builder().default_headers(headers).build()?;

        Ok(ImmichClient {
            client,
            base_url: config.server_url.trim_end_matches('/').to_string(),
            retry_attempts: config.retry_attempts,
            upload_timeout: config.upload_timeout,
        })
    }

    /// Send a request, retrying transient server errors and connection
    /// failures with exponential backoff. The closure builds a fresh request
    /// per attempt since streamed bodies cannot be replayed.
    async fn send_with_retry<F, Fut>(
        &self,
        what: &str,
        mut send: F,
    ) -> Result<reqwest::Response, ImmichError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<reqwest::Response, ImmichError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            let retriable = match send().await {
                Ok(response) if TRANSIENT_STATUSES.contains(&response.status().as_u16()) => {
                    if attempt >= self.retry_attempts {
                        return Ok(response);
                    }
                    format!("status {}", response.status())
                }
                Ok(response) => return Ok(response),
                Err(ImmichError::Request(err))
                    if attempt < self.retry_attempts && (err.is_connect() || err.is_timeout()) =>
                {
                    err.to_string()
                }
                Err(err) => return Err(err),
            };

            attempt += 1;
            let delay = Duration::from_millis(500 * (1 << attempt.min(6)));
            warn!(
                "{} failed ({}), retrying in {:?} (attempt {}/{})",
                what, retriable, delay, attempt, self.retry_attempts
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn upload_form(&self, request: &UploadRequest) -> Result<multipart::Form, ImmichError> {
        let file = tokio::fs::File::open(&request.file_path).await?;
        let part = multipart::Part::stream(reqwest::Body::wrap_stream(ReaderStream::new(file)))
            .file_name(request.filename.clone());

        let mut form = multipart::Form::new()
            .text("deviceAssetId", request.device_asset_id.clone())
            .text("deviceId", request.device_id.clone());

        if let Some(created) = &request.file_created_at {
            form = form.text("fileCreatedAt", created.clone());
        }
        if let Some(modified) = &request.file_modified_at {
            form = form.text("fileModifiedAt", modified.clone());
        }

        Ok(form.part("assetData", part))
    }

    async fn error_body(response: reqwest::Response) -> ImmichError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        ImmichError::Status { status, body }
    }
}

#[async_trait]
impl ImmichApi for ImmichClient {
    async fn upload_asset(&self, request: &UploadRequest) -> Result<UploadedAsset, ImmichError> {
        let url = format!("{}/api/assets", self.base_url);
        let url = url.as_str();

        let response = self
            .send_with_retry("Asset upload", || async move {
                let form = self.upload_form(request).await?;
                Ok(self
                    .client
                    .post(url)
                    .header("x-immich-checksum", request.checksum_hex.as_str())
                    .multipart(form)
                    .timeout(self.upload_timeout)
                    .send()
                    .await?)
            })
            .await?;

        let status = response.status();
        if status == StatusCode::OK || status == StatusCode::CREATED {
            let body: AssetUploadResponse = response.json().await?;
            // A 200 with the duplicate marker means the checksum matched an
            // existing asset; a 201 is a fresh creation.
            let duplicate = status == StatusCode::OK && body.status.as_deref() == Some("duplicate");
            debug!(
                "Uploaded {} -> {} (duplicate: {})",
                request.filename, body.id, duplicate
            );
            Ok(UploadedAsset {
                id: body.id,
                duplicate,
            })
        } else {
            Err(Self::error_body(response).await)
        }
    }

    async fn get_asset(&self, asset_id: &str) -> Result<AssetInfo, ImmichError> {
        let url = format!("{}/api/assets/{}", self.base_url, asset_id);
        let url = url.as_str();

        let response = self
            .send_with_retry("Asset fetch", || async move {
                Ok(self
                    .client
                    .get(url)
                    .timeout(API_CALL_TIMEOUT)
                    .send()
                    .await?)
            })
            .await?;

        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(Self::error_body(response).await)
        }
    }

    async fn update_assets(&self, update: &AssetUpdate) -> Result<(), ImmichError> {
        let url = format!("{}/api/assets", self.base_url);
        let url = url.as_str();

        let response = self
            .send_with_retry("Asset update", || async move {
                Ok(self
                    .client
                    .put(url)
                    .json(update)
                    .timeout(API_CALL_TIMEOUT)
                    .send()
                    .await?)
            })
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_body(response).await)
        }
    }

    async fn list_albums(&self) -> Result<Vec<Album>, ImmichError> {
        let url = format!("{}/api/albums", self.base_url);
        let url = url.as_str();

        let response = self
            .send_with_retry("Album listing", || async move {
                Ok(self
                    .client
                    .get(url)
                    .timeout(API_CALL_TIMEOUT)
                    .send()
                    .await?)
            })
            .await?;

        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(Self::error_body(response).await)
        }
    }

    async fn create_album(&self, name: &str) -> Result<Album, ImmichError> {
        let url = format!("{}/api/albums", self.base_url);
        let url = url.as_str();
        let body = serde_json::json!({ "albumName": name });
        let body = &body;

        let response = self
            .send_with_retry("Album creation", || async move {
                Ok(self
                    .client
                    .post(url)
                    .json(body)
                    .timeout(API_CALL_TIMEOUT)
                    .send()
                    .await?)
            })
            .await?;

        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(Self::error_body(response).await)
        }
    }

    async fn add_to_album(&self, album_id: &str, asset_ids: &[String]) -> Result<(), ImmichError> {
        let url = format!("{}/api/albums/{}/assets", self.base_url, album_id);
        let url = url.as_str();
        let body = serde_json::json!({ "ids": asset_ids });
        let body = &body;

        let response = self
            .send_with_retry("Album assignment", || async move {
                Ok(self
                    .client
                    .put(url)
                    .json(body)
                    .timeout(API_CALL_TIMEOUT)
                    .send()
                    .await?)
            })
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_body(response).await)
        }
    }
}
