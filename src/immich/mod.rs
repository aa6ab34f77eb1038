// # Immich Module
//
// Typed access to the Immich ingestion API:
//
// - **ImmichApi**: trait over the endpoints the engine consumes (mockable)
// - **ImmichClient**: production reqwest implementation with retry/backoff
// - **models**: serde wire types for assets and albums

mod client;
mod models;

pub use client::{ImmichApi, ImmichClient, ImmichError, DEVICE_ASSET_ID, DEVICE_ID};
pub use models::{Album, AssetInfo, AssetUpdate, AssetUploadResponse, ExifInfo, UploadRequest, UploadedAsset};
