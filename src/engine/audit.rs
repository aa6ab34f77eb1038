//! Dedicated audit trails for album operations.
//!
//! Album creation and asset->album assignment each get their own append-only
//! log file, separate from the main progress log, so the album history of a
//! long migration can be reviewed on its own.

use chrono::Utc;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use tracing::warn;

const ALBUM_CREATION_LOG: &str = "album_creation.log";
const ASSET_ASSIGNMENT_LOG: &str = "asset_album_assignment.log";

pub struct AuditLog {
    album_creation: Option<Mutex<File>>,
    asset_assignment: Option<Mutex<File>>,
}

impl AuditLog {
    /// Open (append) both audit files inside `dir`.
    pub fn open(dir: &Path) -> std::io::Result<Self> {
        Ok(AuditLog {
            album_creation: Some(Mutex::new(Self::open_file(dir, ALBUM_CREATION_LOG)?)),
            asset_assignment: Some(Mutex::new(Self::open_file(dir, ASSET_ASSIGNMENT_LOG)?)),
        })
    }

    /// Sink that records nothing, for dry runs and tests.
    pub fn disabled() -> Self {
        AuditLog {
            album_creation: None,
            asset_assignment: None,
        }
    }

    fn open_file(dir: &Path, name: &str) -> std::io::Result<File> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(name))
    }

    pub fn album_created(&self, name: &str, id: &str) {
        Self::write_line(
            &self.album_creation,
            &format!("Album created: '{}' (ID: {})", name, id),
        );
    }

    pub fn album_exists(&self, name: &str, id: &str) {
        Self::write_line(
            &self.album_creation,
            &format!("Album already exists: '{}' (ID: {})", name, id),
        );
    }

    pub fn album_creation_failed(&self, name: &str, reason: &str) {
        Self::write_line(
            &self.album_creation,
            &format!("ERROR: Album creation failed: '{}': {}", name, reason),
        );
    }

    pub fn asset_assigned(&self, asset_id: &str, album: &str) {
        Self::write_line(
            &self.asset_assignment,
            &format!("Asset added to album: Asset {} -> Album '{}'", asset_id, album),
        );
    }

    pub fn asset_assignment_failed(&self, asset_id: &str, album: &str, reason: &str) {
        Self::write_line(
            &self.asset_assignment,
            &format!(
                "ERROR: Asset {} could not be added to album '{}': {}",
                asset_id, album, reason
            ),
        );
    }

    fn write_line(target: &Option<Mutex<File>>, message: &str) {
        let Some(file) = target else {
            return;
        };

        let line = format!("{} - {}\n", Utc::now().format("%Y-%m-%d %H:%M:%S"), message);
        let mut file = match file.lock() {
            Ok(file) => file,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(err) = file.write_all(line.as_bytes()) {
            warn!("Failed to write audit line: {}", err);
        }
    }
}
