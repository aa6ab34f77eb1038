//! Idempotent create-or-detect-duplicate upload for one unit of work.

use crate::engine::albums::AlbumRegistry;
use crate::engine::audit::AuditLog;
use crate::engine::reconcile::MetadataReconciler;
use crate::engine::stats::MigrationStats;
use crate::immich::{ImmichApi, ImmichError, UploadRequest, DEVICE_ASSET_ID, DEVICE_ID};
use crate::takeout::ExtractedMetadata;
use sha1::{Digest, Sha1};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

/// Read buffer for the streaming hash; bounds memory on multi-gigabyte
/// video files.
const HASH_CHUNK_SIZE: usize = 8192;

/// Why a unit of work failed. Per-unit failures are counted, never fatal.
#[derive(Error, Debug)]
pub enum UnitError {
    #[error("Unreadable sidecar {path}: {reason}")]
    Sidecar { path: PathBuf, reason: String },
    #[error("Failed to hash {path}: {source}")]
    Hashing {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Upload rejected with status {status}")]
    Rejected { status: u16 },
    #[error("Transport error: {0}")]
    Transport(ImmichError),
}

impl From<ImmichError> for UnitError {
    fn from(err: ImmichError) -> Self {
        match err {
            ImmichError::Status { status, .. } => UnitError::Rejected { status },
            other => UnitError::Transport(other),
        }
    }
}

/// Terminal classification of one successfully processed unit.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadOutcome {
    pub asset_id: String,
    pub duplicate: bool,
    pub metadata_updated: bool,
}

/// Uploads one file: hash, create-or-detect-duplicate, reconcile metadata,
/// assign to its album. The remote store is the sole arbiter of duplicate
/// detection; this side only computes the checksum it judges by.
pub struct AssetUploader {
    api: Arc<dyn ImmichApi>,
    reconciler: MetadataReconciler,
    albums: Arc<AlbumRegistry>,
    stats: Arc<MigrationStats>,
    audit: Arc<AuditLog>,
    dry_run: bool,
}

impl AssetUploader {
    pub fn new(
        api: Arc<dyn ImmichApi>,
        albums: Arc<AlbumRegistry>,
        stats: Arc<MigrationStats>,
        audit: Arc<AuditLog>,
        dry_run: bool,
    ) -> Self {
        AssetUploader {
            reconciler: MetadataReconciler::new(Arc::clone(&api)),
            api,
            albums,
            stats,
            audit,
            dry_run,
        }
    }

    pub async fn upload(
        &self,
        file_path: &Path,
        metadata: &ExtractedMetadata,
        album_title: Option<&str>,
    ) -> Result<UploadOutcome, UnitError> {
        if self.dry_run {
            let asset_id = dry_run_asset_id(file_path);
            info!("[dry run] Would upload: {} -> {}", file_path.display(), asset_id);
            return Ok(UploadOutcome {
                asset_id,
                duplicate: false,
                metadata_updated: false,
            });
        }

        let checksum_hex = hash_file(file_path).await.map_err(|source| UnitError::Hashing {
            path: file_path.to_path_buf(),
            source,
        })?;

        let filename = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("asset")
            .to_string();

        debug!("Uploading {} (checksum {})", filename, checksum_hex);

        let request = UploadRequest {
            file_path: file_path.to_path_buf(),
            filename,
            device_asset_id: DEVICE_ASSET_ID.to_string(),
            device_id: DEVICE_ID.to_string(),
            checksum_hex,
            file_created_at: metadata.file_created_at.clone(),
            file_modified_at: metadata.file_modified_at.clone(),
        };

        let uploaded = self.api.upload_asset(&request).await?;

        if uploaded.duplicate {
            info!(
                "Asset already exists (duplicate): {} -> {}",
                file_path.display(),
                uploaded.id
            );
        } else {
            info!(
                "Asset successfully uploaded: {} -> {}",
                file_path.display(),
                uploaded.id
            );
        }

        // Fresh uploads can carry wrong EXIF-derived values just like
        // duplicates, so both paths go through the same reconciliation step.
        let metadata_updated = self.reconciler.reconcile(&uploaded.id, metadata).await;
        self.stats.record_metadata(metadata_updated);

        if let Some(title) = album_title {
            self.assign_to_album(&uploaded.id, title).await;
        }

        Ok(UploadOutcome {
            asset_id: uploaded.id,
            duplicate: uploaded.duplicate,
            metadata_updated,
        })
    }

    /// Album membership is best-effort: a failed resolution or assignment is
    /// logged and audited, and the unit still counts as uploaded.
    async fn assign_to_album(&self, asset_id: &str, title: &str) {
        let Some(album_id) = self.albums.resolve(title).await else {
            warn!(
                "Skipping album assignment for {}: album '{}' unavailable",
                asset_id, title
            );
            return;
        };

        match self
            .api
            .add_to_album(&album_id, &[asset_id.to_string()])
            .await
        {
            Ok(()) => {
                info!("Asset {} added to album '{}'", asset_id, title);
                self.audit.asset_assigned(asset_id, title);
            }
            Err(err) => {
                warn!(
                    "Asset {} could not be added to album '{}': {}",
                    asset_id, title, err
                );
                self.audit
                    .asset_assignment_failed(asset_id, title, &err.to_string());
            }
        }
    }
}

/// Streaming SHA-1 of a file, hex-encoded. The server compares this
/// checksum against its store for duplicate detection.
pub async fn hash_file(path: &Path) -> std::io::Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Sha1::new();
    let mut buffer = [0u8; HASH_CHUNK_SIZE];

    loop {
        let read = file.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Deterministic fake asset id for dry runs, derived from the path alone so
/// repeated runs over the same tree produce identical ids.
fn dry_run_asset_id(path: &Path) -> String {
    let mut hasher = Sha1::new();
    hasher.update(path.to_string_lossy().as_bytes());
    format!("dry-run-{}", hex::encode(hasher.finalize()))
}
