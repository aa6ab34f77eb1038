//! Batch dispatcher.
//!
//! Consumes the discovered unit-of-work sequence in fixed-size batches.
//! Units within a batch run concurrently across a bounded pool of tasks;
//! the next batch starts only after every unit of the current one has
//! produced an outcome. The barrier keeps memory bounded and makes progress
//! reporting and cancellation points predictable.

use crate::config::MigrationConfig;
use crate::engine::albums::AlbumRegistry;
use crate::engine::audit::AuditLog;
use crate::engine::stats::{MigrationStats, StatsSnapshot};
use crate::engine::uploader::{AssetUploader, UnitError, UploadOutcome};
use crate::immich::ImmichApi;
use crate::takeout::{self, MediaUnit};
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct MigrationEngine {
    uploader: Arc<AssetUploader>,
    albums: Arc<AlbumRegistry>,
    stats: Arc<MigrationStats>,
    batch_size: usize,
    max_workers: usize,
    dry_run: bool,
    shutdown: Arc<AtomicBool>,
}

/// Final aggregate produced after the last batch joins.
#[derive(Debug, Clone)]
pub struct MigrationReport {
    pub stats: StatsSnapshot,
    pub created_albums: Vec<(String, String)>,
    pub existing_albums: Vec<(String, String)>,
}

impl MigrationEngine {
    pub fn new(
        api: Arc<dyn ImmichApi>,
        config: &MigrationConfig,
        audit: Arc<AuditLog>,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        let stats = Arc::new(MigrationStats::new());
        let albums = Arc::new(AlbumRegistry::new(
            Arc::clone(&api),
            Arc::clone(&stats),
            Arc::clone(&audit),
        ));
        let uploader = Arc::new(AssetUploader::new(
            api,
            Arc::clone(&albums),
            Arc::clone(&stats),
            audit,
            config.dry_run,
        ));

        MigrationEngine {
            uploader,
            albums,
            stats,
            batch_size: config.batch_size,
            max_workers: config.max_workers,
            dry_run: config.dry_run,
            shutdown,
        }
    }

    /// Process every unit to a terminal outcome and report.
    pub async fn run(&self, units: Vec<MediaUnit>) -> MigrationReport {
        self.stats.add_total(units.len() as u64);

        if units.is_empty() {
            warn!("No media files found, nothing to migrate");
            return self.report();
        }

        if !self.dry_run {
            self.albums.load_existing().await;
        }

        let total_batches = units.len().div_ceil(self.batch_size);
        for (index, batch) in units.chunks(self.batch_size).enumerate() {
            if self.shutdown.load(Ordering::SeqCst) {
                warn!(
                    "Shutdown requested, stopping after {}/{} batches",
                    index, total_batches
                );
                break;
            }

            info!(
                "Processing batch {}/{} ({} file(s))",
                index + 1,
                total_batches,
                batch.len()
            );
            self.run_batch(batch).await;
        }

        self.report()
    }

    /// Run one batch with at most `max_workers` units in flight, blocking
    /// until every unit has an outcome.
    async fn run_batch(&self, batch: &[MediaUnit]) {
        let mut pending = batch.iter().cloned();
        let mut in_flight = FuturesUnordered::new();

        loop {
            if in_flight.len() < self.max_workers {
                if let Some(unit) = pending.next() {
                    let uploader = Arc::clone(&self.uploader);
                    in_flight.push(tokio::spawn(async move {
                        process_unit(&uploader, unit).await
                    }));
                    continue;
                }
                if in_flight.is_empty() {
                    break;
                }
            }

            match in_flight.next().await {
                Some(Ok(result)) => self.count(result),
                Some(Err(join_err)) => {
                    // A panicking unit is just another failed unit.
                    error!("Upload task panicked: {}", join_err);
                    self.stats.record_failure();
                }
                None => break,
            }
        }
    }

    fn count(&self, result: Result<UploadOutcome, UnitError>) {
        match result {
            Ok(outcome) => self.stats.record_success(outcome.duplicate),
            Err(_) => self.stats.record_failure(),
        }
    }

    fn report(&self) -> MigrationReport {
        MigrationReport {
            stats: self.stats.snapshot(),
            created_albums: self.albums.created_albums(),
            existing_albums: self.albums.existing_albums(),
        }
    }
}

/// Run one unit through its whole pipeline. Failures are classified, logged
/// here once, and surface only as counts.
async fn process_unit(uploader: &AssetUploader, unit: MediaUnit) -> Result<UploadOutcome, UnitError> {
    let metadata = takeout::load_sidecar(&unit.sidecar_path).map_err(|err| {
        warn!(
            "Could not load metadata from {}: {}",
            unit.sidecar_path.display(),
            err
        );
        UnitError::Sidecar {
            path: unit.sidecar_path.clone(),
            reason: err.to_string(),
        }
    })?;

    let result = uploader
        .upload(&unit.file_path, &metadata, unit.album_title.as_deref())
        .await;

    if let Err(err) = &result {
        error!("Error processing {}: {}", unit.file_path.display(), err);
    }

    result
}

impl MigrationReport {
    /// Emit the final human-readable summary to the main log.
    pub fn log_summary(&self) {
        let stats = &self.stats;
        let elapsed = stats.elapsed.as_secs_f64();

        info!("======================================================================");
        info!("MIGRATION COMPLETED");
        info!("======================================================================");
        info!("Total time: {:.2} seconds ({:.1} minutes)", elapsed, elapsed / 60.0);
        if stats.total_files > 0 {
            info!(
                "Average time per file: {:.2} seconds",
                elapsed / stats.total_files as f64
            );
        }
        info!(
            "Files: total={} processed={} failed={} (success rate {:.1}%)",
            stats.total_files,
            stats.processed_files,
            stats.failed_files,
            stats.success_rate()
        );
        info!(
            "Uploads: new={} duplicates={}",
            stats.new_uploads, stats.duplicates_found
        );
        info!(
            "Albums: created={} existing={} total={}",
            stats.albums_created,
            stats.albums_existing,
            stats.albums_created + stats.albums_existing
        );
        info!(
            "Metadata: updated={} already correct={}",
            stats.metadata_updates, stats.metadata_already_correct
        );

        if self.created_albums.is_empty() {
            info!("No new albums created");
        } else {
            info!("New albums created:");
            for (index, (name, id)) in self.created_albums.iter().enumerate() {
                info!("  {:2}. {} (ID: {})", index + 1, name, id);
            }
        }
        info!("======================================================================");
    }
}
