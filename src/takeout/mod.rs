// # Takeout Module
//
// Discovery over a Google Photos Takeout export:
//
// - **scanner**: walks the tree and pairs media files with sidecars/albums
// - **sidecar**: parses sidecar JSON into the metadata the engine reconciles

mod scanner;
mod sidecar;

pub use scanner::{is_media_file, scan_takeout, MediaUnit, ScanError};
pub use sidecar::{load_sidecar, ExtractedMetadata, GeoPoint, SidecarError};
