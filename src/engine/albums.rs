//! Race-free album resolution.
//!
//! Workers discover album names concurrently, but the server must see at
//! most one creation request per distinct name. The registry keeps a
//! read-mostly name -> id map and serializes the creation path behind a
//! dedicated lock, re-checking the map inside it (double-checked locking);
//! the winner publishes the new id into the map before releasing.

use crate::engine::audit::AuditLog;
use crate::engine::stats::MigrationStats;
use crate::immich::ImmichApi;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};
use tracing::{info, warn};

pub struct AlbumRegistry {
    api: Arc<dyn ImmichApi>,
    stats: Arc<MigrationStats>,
    audit: Arc<AuditLog>,
    cache: RwLock<HashMap<String, String>>,
    /// Serializes remote creation; held across the creation await.
    creation_lock: tokio::sync::Mutex<()>,
    /// Names whose created/existing statistic has already been recorded.
    tracked: Mutex<HashSet<String>>,
    created: Mutex<Vec<(String, String)>>,
    existing: Mutex<Vec<(String, String)>>,
}

impl AlbumRegistry {
    pub fn new(api: Arc<dyn ImmichApi>, stats: Arc<MigrationStats>, audit: Arc<AuditLog>) -> Self {
        AlbumRegistry {
            api,
            stats,
            audit,
            cache: RwLock::new(HashMap::new()),
            creation_lock: tokio::sync::Mutex::new(()),
            tracked: Mutex::new(HashSet::new()),
            created: Mutex::new(Vec::new()),
            existing: Mutex::new(Vec::new()),
        }
    }

    /// One-time bulk load of pre-existing albums before any uploads begin.
    /// A failed load is not fatal; the registry starts empty and albums get
    /// created on demand (possibly re-creating ones the server already has,
    /// which the operator can merge manually).
    pub async fn load_existing(&self) {
        match self.api.list_albums().await {
            Ok(albums) => {
                let mut cache = self.cache.write().unwrap();
                for album in &albums {
                    cache.insert(album.album_name.clone(), album.id.clone());
                }
                info!("Loaded {} existing album(s)", albums.len());
            }
            Err(err) => {
                warn!("Could not load existing albums: {}", err);
            }
        }
    }

    /// Resolve an album name to its remote id, creating the album at most
    /// once per process. Returns `None` when creation failed; the caller
    /// skips album assignment but the upload itself still counts.
    pub async fn resolve(&self, name: &str) -> Option<String> {
        if let Some(id) = self.lookup(name) {
            self.audit.album_exists(name, &id);
            self.track(name, &id, false);
            return Some(id);
        }

        let _guard = self.creation_lock.lock().await;

        // Re-check under the lock: another worker may have created the album
        // while we waited.
        if let Some(id) = self.lookup(name) {
            self.audit.album_exists(name, &id);
            return Some(id);
        }

        match self.api.create_album(name).await {
            Ok(album) => {
                self.cache
                    .write()
                    .unwrap()
                    .insert(name.to_string(), album.id.clone());
                info!("New album created: {} ({})", name, album.id);
                self.audit.album_created(name, &album.id);
                self.track(name, &album.id, true);
                Some(album.id)
            }
            Err(err) => {
                warn!("Album creation failed for '{}': {}", name, err);
                self.audit.album_creation_failed(name, &err.to_string());
                None
            }
        }
    }

    /// Newly created albums, for the final report.
    pub fn created_albums(&self) -> Vec<(String, String)> {
        self.created.lock().unwrap().clone()
    }

    /// Pre-existing albums that were resolved during this run.
    pub fn existing_albums(&self) -> Vec<(String, String)> {
        self.existing.lock().unwrap().clone()
    }

    fn lookup(&self, name: &str) -> Option<String> {
        self.cache.read().unwrap().get(name).cloned()
    }

    /// Record the created/existing statistic and report entry exactly once
    /// per distinct name, no matter how many units resolve it.
    fn track(&self, name: &str, id: &str, created: bool) {
        let mut tracked = self.tracked.lock().unwrap();
        if !tracked.insert(name.to_string()) {
            return;
        }
        drop(tracked);

        self.stats.record_album(created);
        let list = if created { &self.created } else { &self.existing };
        list.lock()
            .unwrap()
            .push((name.to_string(), id.to_string()));
    }
}
