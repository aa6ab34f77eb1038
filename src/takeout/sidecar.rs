//! Sidecar metadata parsing.
//!
//! Takeout writes one JSON sidecar per media file. Only two records matter
//! for migration: the capture timestamp and the EXIF geolocation. Everything
//! else in the sidecar is ignored.

use chrono::{SecondsFormat, TimeZone, Utc};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SidecarError {
    #[error("Failed to read sidecar: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid sidecar JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Raw sidecar shape; only the fields the migration consumes.
#[derive(Debug, Deserialize)]
struct SidecarFile {
    #[serde(rename = "photoTakenTime")]
    photo_taken_time: Option<TakenTime>,
    #[serde(rename = "geoDataExif")]
    geo_data_exif: Option<GeoData>,
}

/// Takeout writes epoch seconds as a decimal string.
#[derive(Debug, Deserialize)]
struct TakenTime {
    timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeoData {
    #[serde(default)]
    latitude: f64,
    #[serde(default)]
    longitude: f64,
    #[serde(default)]
    altitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

/// Metadata derived once per unit of work from its sidecar.
///
/// `file_modified_at` mirrors `file_created_at`: Takeout only records the
/// capture time, and the server expects both fields on upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedMetadata {
    /// Capture time as ISO-8601 UTC with millisecond precision
    pub file_created_at: Option<String>,
    pub file_modified_at: Option<String>,
    /// Absent when the sidecar has no location or records the (0,0) marker
    pub geo: Option<GeoPoint>,
}

/// Load and interpret a sidecar file.
pub fn load_sidecar(path: &Path) -> Result<ExtractedMetadata, SidecarError> {
    let raw = std::fs::read_to_string(path)?;
    let sidecar: SidecarFile = serde_json::from_str(&raw)?;

    let mut metadata = ExtractedMetadata::default();

    if let Some(taken) = sidecar.photo_taken_time {
        if let Some(epoch) = taken.timestamp.and_then(|t| t.parse::<i64>().ok()) {
            if let Some(datetime) = Utc.timestamp_opt(epoch, 0).single() {
                let iso = datetime.to_rfc3339_opts(SecondsFormat::Millis, true);
                metadata.file_created_at = Some(iso.clone());
                metadata.file_modified_at = Some(iso);
            }
        }
    }

    if let Some(geo) = sidecar.geo_data_exif {
        // (0,0) is the sidecar convention for "no location recorded"
        if geo.latitude != 0.0 && geo.longitude != 0.0 {
            metadata.geo = Some(GeoPoint {
                latitude: geo.latitude,
                longitude: geo.longitude,
                altitude: geo.altitude,
            });
        }
    }

    Ok(metadata)
}
