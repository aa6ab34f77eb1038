// # Engine Module
//
// The concurrent upload/reconciliation engine:
//
// - **MigrationEngine**: batch dispatcher with a bounded worker pool
// - **AssetUploader**: hashing create-or-detect-duplicate upload per unit
// - **MetadataReconciler**: fetch-compare-correct for timestamps/geodata
// - **AlbumRegistry**: race-free album name -> id resolution
// - **MigrationStats**: atomic counters shared across workers
// - **AuditLog**: dedicated trails for album operations

mod albums;
mod audit;
mod dispatcher;
mod reconcile;
mod stats;
mod uploader;

pub use albums::AlbumRegistry;
pub use audit::AuditLog;
pub use dispatcher::{MigrationEngine, MigrationReport};
pub use reconcile::MetadataReconciler;
pub use stats::{MigrationStats, StatsSnapshot};
pub use uploader::{AssetUploader, UnitError, UploadOutcome};
