use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use takeout_migrate::immich::{
    Album, AssetInfo, AssetUpdate, ExifInfo, ImmichApi, ImmichError, UploadRequest, UploadedAsset,
};
use uuid::Uuid;

/// In-memory Immich double.
///
/// Behaves like the real server where the engine can observe it: uploads
/// deduplicate by checksum, albums are created by name, and asset records
/// reflect what the upload envelope carried. Also tracks call counts and the
/// peak number of concurrent uploads so tests can assert on the engine's
/// concurrency discipline.
#[derive(Default)]
pub struct MockImmichApi {
    assets_by_checksum: Mutex<HashMap<String, String>>,
    asset_info: Mutex<HashMap<String, AssetInfo>>,
    albums: Mutex<HashMap<String, String>>,
    pub album_members: Mutex<HashMap<String, Vec<String>>>,
    pub upload_calls: AtomicUsize,
    pub create_album_calls: AtomicUsize,
    pub list_album_calls: AtomicUsize,
    pub update_calls: Mutex<Vec<AssetUpdate>>,
    in_flight: AtomicUsize,
    pub peak_in_flight: AtomicUsize,
}

impl MockImmichApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an album as pre-existing on the server.
    pub fn preload_album(&self, name: &str, id: &str) {
        self.albums
            .lock()
            .unwrap()
            .insert(name.to_string(), id.to_string());
    }

    pub fn total_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
            + self.create_album_calls.load(Ordering::SeqCst)
            + self.list_album_calls.load(Ordering::SeqCst)
            + self.update_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ImmichApi for MockImmichApi {
    async fn upload_asset(&self, request: &UploadRequest) -> Result<UploadedAsset, ImmichError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);

        // Hold the slot briefly so concurrent workers actually overlap and
        // the peak measurement means something.
        tokio::time::sleep(Duration::from_millis(5)).await;

        let result = {
            let mut by_checksum = self.assets_by_checksum.lock().unwrap();
            if let Some(existing) = by_checksum.get(&request.checksum_hex) {
                UploadedAsset {
                    id: existing.clone(),
                    duplicate: true,
                }
            } else {
                let id = Uuid::new_v4().to_string();
                by_checksum.insert(request.checksum_hex.clone(), id.clone());
                // Record the asset as if the server inferred the same
                // metadata the client sent, so reconciliation is a no-op
                // unless a test says otherwise.
                self.asset_info.lock().unwrap().insert(
                    id.clone(),
                    AssetInfo {
                        id: id.clone(),
                        checksum: Some(request.checksum_hex.clone()),
                        file_created_at: request.file_created_at.clone(),
                        exif_info: ExifInfo {
                            date_time_original: request.file_created_at.clone(),
                            latitude: None,
                            longitude: None,
                        },
                    },
                );
                UploadedAsset {
                    id,
                    duplicate: false,
                }
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(result)
    }

    async fn get_asset(&self, asset_id: &str) -> Result<AssetInfo, ImmichError> {
        self.asset_info
            .lock()
            .unwrap()
            .get(asset_id)
            .cloned()
            .ok_or(ImmichError::Status {
                status: 404,
                body: String::new(),
            })
    }

    async fn update_assets(&self, update: &AssetUpdate) -> Result<(), ImmichError> {
        self.update_calls.lock().unwrap().push(update.clone());

        let mut assets = self.asset_info.lock().unwrap();
        for id in &update.ids {
            if let Some(asset) = assets.get_mut(id) {
                if let Some(date) = &update.date_time_original {
                    asset.exif_info.date_time_original = Some(date.clone());
                    asset.file_created_at = Some(date.clone());
                }
                if update.latitude.is_some() {
                    asset.exif_info.latitude = update.latitude;
                    asset.exif_info.longitude = update.longitude;
                }
            }
        }
        Ok(())
    }

    async fn list_albums(&self) -> Result<Vec<Album>, ImmichError> {
        self.list_album_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .albums
            .lock()
            .unwrap()
            .iter()
            .map(|(name, id)| Album {
                id: id.clone(),
                album_name: name.clone(),
            })
            .collect())
    }

    async fn create_album(&self, name: &str) -> Result<Album, ImmichError> {
        self.create_album_calls.fetch_add(1, Ordering::SeqCst);
        let id = Uuid::new_v4().to_string();
        self.albums
            .lock()
            .unwrap()
            .insert(name.to_string(), id.clone());
        Ok(Album {
            id,
            album_name: name.to_string(),
        })
    }

    async fn add_to_album(&self, album_id: &str, asset_ids: &[String]) -> Result<(), ImmichError> {
        let known = self
            .albums
            .lock()
            .unwrap()
            .values()
            .any(|id| id == album_id);
        if !known {
            return Err(ImmichError::Status {
                status: 400,
                body: format!("unknown album {}", album_id),
            });
        }

        self.album_members
            .lock()
            .unwrap()
            .entry(album_id.to_string())
            .or_default()
            .extend(asset_ids.iter().cloned());
        Ok(())
    }
}
