use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Process-wide migration counters.
///
/// Shared across workers behind an `Arc`. Every field is incremented
/// atomically; aggregation only reads after the final batch has joined, so
/// snapshots never race with pending increments.
#[derive(Debug)]
pub struct MigrationStats {
    total_files: AtomicU64,
    processed_files: AtomicU64,
    failed_files: AtomicU64,
    new_uploads: AtomicU64,
    duplicates_found: AtomicU64,
    albums_created: AtomicU64,
    albums_existing: AtomicU64,
    metadata_updates: AtomicU64,
    metadata_already_correct: AtomicU64,
    started: Instant,
}

impl MigrationStats {
    pub fn new() -> Self {
        MigrationStats {
            total_files: AtomicU64::new(0),
            processed_files: AtomicU64::new(0),
            failed_files: AtomicU64::new(0),
            new_uploads: AtomicU64::new(0),
            duplicates_found: AtomicU64::new(0),
            albums_created: AtomicU64::new(0),
            albums_existing: AtomicU64::new(0),
            metadata_updates: AtomicU64::new(0),
            metadata_already_correct: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    pub fn add_total(&self, count: u64) {
        self.total_files.fetch_add(count, Ordering::SeqCst);
    }

    /// One unit completed its pipeline.
    pub fn record_success(&self, duplicate: bool) {
        self.processed_files.fetch_add(1, Ordering::SeqCst);
        if duplicate {
            self.duplicates_found.fetch_add(1, Ordering::SeqCst);
        } else {
            self.new_uploads.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// One unit failed at some pipeline step.
    pub fn record_failure(&self) {
        self.failed_files.fetch_add(1, Ordering::SeqCst);
    }

    /// Outcome of the post-upload reconciliation step.
    pub fn record_metadata(&self, updated: bool) {
        if updated {
            self.metadata_updates.fetch_add(1, Ordering::SeqCst);
        } else {
            self.metadata_already_correct.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// First resolution of a distinct album name.
    pub fn record_album(&self, created: bool) {
        if created {
            self.albums_created.fetch_add(1, Ordering::SeqCst);
        } else {
            self.albums_existing.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_files: self.total_files.load(Ordering::SeqCst),
            processed_files: self.processed_files.load(Ordering::SeqCst),
            failed_files: self.failed_files.load(Ordering::SeqCst),
            new_uploads: self.new_uploads.load(Ordering::SeqCst),
            duplicates_found: self.duplicates_found.load(Ordering::SeqCst),
            albums_created: self.albums_created.load(Ordering::SeqCst),
            albums_existing: self.albums_existing.load(Ordering::SeqCst),
            metadata_updates: self.metadata_updates.load(Ordering::SeqCst),
            metadata_already_correct: self.metadata_already_correct.load(Ordering::SeqCst),
            elapsed: self.elapsed(),
        }
    }
}

impl Default for MigrationStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of the counters for reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsSnapshot {
    pub total_files: u64,
    pub processed_files: u64,
    pub failed_files: u64,
    pub new_uploads: u64,
    pub duplicates_found: u64,
    pub albums_created: u64,
    pub albums_existing: u64,
    pub metadata_updates: u64,
    pub metadata_already_correct: u64,
    pub elapsed: Duration,
}

impl StatsSnapshot {
    pub fn success_rate(&self) -> f64 {
        if self.total_files == 0 {
            return 100.0;
        }
        self.processed_files as f64 / self.total_files as f64 * 100.0
    }
}
