//! Post-upload metadata repair.
//!
//! The server infers timestamps and geodata from file-embedded EXIF, which
//! for Takeout exports is frequently wrong or missing; the sidecar is the
//! authority. After every upload (fresh or duplicate) the reconciler fetches
//! the server's record and issues a single merged correction when it
//! diverges from the sidecar-derived values. Repair is best-effort: any
//! fetch or update failure downgrades to "no update performed" and never
//! fails the unit.

use crate::immich::{AssetUpdate, ImmichApi};
use crate::takeout::ExtractedMetadata;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Coordinate divergence below this is treated as "same place".
const GEO_TOLERANCE_DEGREES: f64 = 0.0001;

pub struct MetadataReconciler {
    api: Arc<dyn ImmichApi>,
}

impl MetadataReconciler {
    pub fn new(api: Arc<dyn ImmichApi>) -> Self {
        MetadataReconciler { api }
    }

    /// Compare the server's record for `asset_id` against the expected
    /// values and correct it if needed. Returns true when a correction was
    /// actually applied.
    pub async fn reconcile(&self, asset_id: &str, expected: &ExtractedMetadata) -> bool {
        let asset = match self.api.get_asset(asset_id).await {
            Ok(asset) => asset,
            Err(err) => {
                warn!(
                    "Could not retrieve asset {} for reconciliation: {}",
                    asset_id, err
                );
                return false;
            }
        };

        let mut update = AssetUpdate::for_asset(asset_id);

        if let Some(expected_created) = &expected.file_created_at {
            let exif_date = asset.exif_info.date_time_original.as_deref();
            let file_created = asset.file_created_at.as_deref();

            // One dateTimeOriginal correction covers both discrepancies; the
            // server re-derives fileCreatedAt from it.
            if exif_date != Some(expected_created.as_str())
                || file_created != Some(expected_created.as_str())
            {
                debug!(
                    "Asset {}: timestamp differs (expected {}, exif {:?}, file {:?})",
                    asset_id, expected_created, exif_date, file_created
                );
                update.date_time_original = Some(expected_created.clone());
            }
        }

        if let Some(geo) = &expected.geo {
            if geo_differs(
                asset.exif_info.latitude,
                asset.exif_info.longitude,
                geo.latitude,
                geo.longitude,
            ) {
                debug!(
                    "Asset {}: geodata differs or missing (expected {}, {})",
                    asset_id, geo.latitude, geo.longitude
                );
                update.latitude = Some(geo.latitude);
                update.longitude = Some(geo.longitude);
            }
        }

        if update.is_empty() {
            debug!("Asset {}: metadata is already correct", asset_id);
            return false;
        }

        match self.api.update_assets(&update).await {
            Ok(()) => {
                info!("Asset {}: metadata corrected", asset_id);
                true
            }
            Err(err) => {
                warn!("Asset {}: metadata update failed: {}", asset_id, err);
                false
            }
        }
    }
}

fn geo_differs(
    current_lat: Option<f64>,
    current_lon: Option<f64>,
    expected_lat: f64,
    expected_lon: f64,
) -> bool {
    match (current_lat, current_lon) {
        (Some(lat), Some(lon)) => {
            (lat - expected_lat).abs() > GEO_TOLERANCE_DEGREES
                || (lon - expected_lon).abs() > GEO_TOLERANCE_DEGREES
        }
        _ => true,
    }
}
