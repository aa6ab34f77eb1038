use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Response body of `POST /api/assets`.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetUploadResponse {
    pub id: String,
    /// `"duplicate"` when the checksum matched a stored asset
    pub status: Option<String>,
}

/// Result of an upload call after duplicate classification.
#[derive(Debug, Clone)]
pub struct UploadedAsset {
    pub id: String,
    pub duplicate: bool,
}

/// EXIF sub-record of an asset as the server reports it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExifInfo {
    #[serde(rename = "dateTimeOriginal")]
    pub date_time_original: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Current server-side asset record, `GET /api/assets/{id}`.
///
/// The server owns these fields; the engine only reads them and requests
/// corrections through [`AssetUpdate`].
#[derive(Debug, Clone, Deserialize)]
pub struct AssetInfo {
    pub id: String,
    pub checksum: Option<String>,
    #[serde(rename = "fileCreatedAt")]
    pub file_created_at: Option<String>,
    #[serde(rename = "exifInfo", default)]
    pub exif_info: ExifInfo,
}

/// Bulk metadata correction body for `PUT /api/assets`.
///
/// Only fields that actually need correcting are serialized; an update where
/// nothing is set must not be sent at all.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AssetUpdate {
    pub ids: Vec<String>,
    #[serde(rename = "dateTimeOriginal", skip_serializing_if = "Option::is_none")]
    pub date_time_original: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl AssetUpdate {
    pub fn for_asset(asset_id: &str) -> Self {
        AssetUpdate {
            ids: vec![asset_id.to_string()],
            ..Default::default()
        }
    }

    /// True when no correction field has been set.
    pub fn is_empty(&self) -> bool {
        self.date_time_original.is_none() && self.latitude.is_none() && self.longitude.is_none()
    }
}

/// One album as listed by `GET /api/albums` or created by `POST /api/albums`.
#[derive(Debug, Clone, Deserialize)]
pub struct Album {
    pub id: String,
    #[serde(rename = "albumName")]
    pub album_name: String,
}

/// Everything the upload endpoint needs for one asset.
///
/// Sent as a multipart form (file stream + text fields) rather than JSON,
/// so this is a plain struct instead of a serde model.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file_path: PathBuf,
    pub filename: String,
    pub device_asset_id: String,
    pub device_id: String,
    /// Hex-encoded SHA-1 of the file content, sent as `x-immich-checksum`
    pub checksum_hex: String,
    pub file_created_at: Option<String>,
    pub file_modified_at: Option<String>,
}
