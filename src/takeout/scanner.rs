//! Recursive Takeout tree scanner.
//!
//! Pairs every supported media file with its sidecar and, when the
//! containing directory carries an album descriptor, with an album title.
//! Album titles apply to the directory's direct children only; subfolders
//! carry their own descriptors or none at all.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

const MAX_RECURSION_DEPTH: usize = 10;

/// Media formats the server accepts from a Takeout export.
const MEDIA_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "tiff", "tif", "heic", "heif", "mp4", "mov", "avi", "mkv",
    "webm",
];

/// Album descriptor file names, probed in order. Takeout localizes the name;
/// German exports write `Metadaten.json`.
const ALBUM_DESCRIPTOR_NAMES: &[&str] = &["Metadaten.json", "metadata.json"];

/// Sidecar naming conventions, probed in order next to the media file.
const SIDECAR_SUFFIXES: &[&str] = &[
    ".supplemental-metadata.json",
    ".supplemental-metadata copy.json",
];

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Takeout directory does not exist: {0}")]
    MissingRoot(PathBuf),
}

/// One unit of work: a media file, its sidecar, and an optional album.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaUnit {
    pub file_path: PathBuf,
    pub sidecar_path: PathBuf,
    pub album_title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AlbumDescriptor {
    title: Option<String>,
}

/// Check if a file is a supported media file based on extension.
pub fn is_media_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| MEDIA_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Locate the sidecar for a media file by trying the known naming
/// conventions in order.
fn find_sidecar(media_path: &Path) -> Option<PathBuf> {
    let name = media_path.file_name()?.to_str()?;
    let parent = media_path.parent()?;

    for suffix in SIDECAR_SUFFIXES {
        let candidate = parent.join(format!("{}{}", name, suffix));
        if candidate.exists() {
            return Some(candidate);
        }
    }

    None
}

/// Read the album title for a directory, if it carries a descriptor.
fn read_album_title(dir: &Path) -> Option<String> {
    for descriptor in ALBUM_DESCRIPTOR_NAMES {
        let path = dir.join(descriptor);
        if !path.exists() {
            continue;
        }

        match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<AlbumDescriptor>(&raw) {
                Ok(album) => {
                    let title = album.title.filter(|t| !t.is_empty());
                    if let Some(title) = &title {
                        info!("Found album: {}", title);
                    }
                    return title;
                }
                Err(err) => {
                    warn!("Could not parse album descriptor {}: {}", path.display(), err);
                    return None;
                }
            },
            Err(err) => {
                warn!("Could not read album descriptor {}: {}", path.display(), err);
                return None;
            }
        }
    }

    None
}

/// Walk the export tree and produce the unit-of-work sequence.
///
/// Media files without a sidecar under any naming convention are skipped and
/// logged, never uploaded blind. Traversal order is filesystem order and not
/// guaranteed to be stable across runs.
pub fn scan_takeout(root: &Path) -> Result<Vec<MediaUnit>, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::MissingRoot(root.to_path_buf()));
    }

    info!("Scanning takeout tree: {}", root.display());

    let mut units = Vec::new();
    scan_recursive(root, 0, &mut units);

    info!("Found {} media file(s) with sidecars", units.len());
    Ok(units)
}

fn scan_recursive(dir: &Path, depth: usize, units: &mut Vec<MediaUnit>) {
    if depth > MAX_RECURSION_DEPTH {
        warn!(
            "Max recursion depth {} reached at {}, stopping",
            MAX_RECURSION_DEPTH,
            dir.display()
        );
        return;
    }

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!("Failed to read directory {}: {}", dir.display(), err);
            return;
        }
    };

    let album_title = read_album_title(dir);
    if let Some(title) = &album_title {
        debug!("Directory {} belongs to album '{}'", dir.display(), title);
    }

    for entry in entries.flatten() {
        let path = entry.path();

        if path.is_dir() {
            scan_recursive(&path, depth + 1, units);
        } else if path.is_file() && is_media_file(&path) {
            match find_sidecar(&path) {
                Some(sidecar_path) => units.push(MediaUnit {
                    file_path: path,
                    sidecar_path,
                    album_title: album_title.clone(),
                }),
                None => warn!("No metadata found for: {}", path.display()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn write_media_with_sidecar(dir: &Path, name: &str) -> PathBuf {
        let path = write_file(dir, name, "media-bytes");
        write_file(
            dir,
            &format!("{}.supplemental-metadata.json", name),
            r#"{"photoTakenTime": {"timestamp": "1594816496"}}"#,
        );
        path
    }

    #[test]
    fn test_is_media_file() {
        assert!(is_media_file(Path::new("IMG_1234.jpg")));
        assert!(is_media_file(Path::new("IMG_1234.JPG")));
        assert!(is_media_file(Path::new("clip.mp4")));
        assert!(is_media_file(Path::new("scan.heic")));
        assert!(!is_media_file(Path::new("notes.txt")));
        assert!(!is_media_file(Path::new("IMG_1234.jpg.supplemental-metadata.json")));
    }

    #[test]
    fn test_media_with_sidecar_is_discovered() {
        let root = TempDir::new().unwrap();
        let media = write_media_with_sidecar(root.path(), "IMG_0001.jpg");

        let units = scan_takeout(root.path()).unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].file_path, media);
        assert!(units[0].album_title.is_none());
    }

    #[test]
    fn test_media_without_sidecar_is_skipped() {
        let root = TempDir::new().unwrap();
        write_file(root.path(), "IMG_0001.jpg", "media-bytes");

        let units = scan_takeout(root.path()).unwrap();
        assert!(units.is_empty());
    }

    #[test]
    fn test_copy_variant_sidecar_is_found() {
        let root = TempDir::new().unwrap();
        let media = write_file(root.path(), "IMG_0001.jpg", "media-bytes");
        let sidecar = write_file(
            root.path(),
            "IMG_0001.jpg.supplemental-metadata copy.json",
            "{}",
        );

        let units = scan_takeout(root.path()).unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].file_path, media);
        assert_eq!(units[0].sidecar_path, sidecar);
    }

    #[test]
    fn test_album_title_applies_to_direct_children_only() {
        let root = TempDir::new().unwrap();
        let album_dir = root.path().join("Summer 2020");
        fs::create_dir(&album_dir).unwrap();
        write_file(&album_dir, "Metadaten.json", r#"{"title": "Summer 2020"}"#);
        write_media_with_sidecar(&album_dir, "IMG_0001.jpg");

        let nested = album_dir.join("nested");
        fs::create_dir(&nested).unwrap();
        write_media_with_sidecar(&nested, "IMG_0002.jpg");

        let mut units = scan_takeout(root.path()).unwrap();
        units.sort_by(|a, b| a.file_path.cmp(&b.file_path));
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].album_title.as_deref(), Some("Summer 2020"));
        assert!(units[1].album_title.is_none());
    }

    #[test]
    fn test_english_descriptor_name_is_accepted() {
        let root = TempDir::new().unwrap();
        write_file(root.path(), "metadata.json", r#"{"title": "Holiday"}"#);
        write_media_with_sidecar(root.path(), "IMG_0001.jpg");

        let units = scan_takeout(root.path()).unwrap();
        assert_eq!(units[0].album_title.as_deref(), Some("Holiday"));
    }

    #[test]
    fn test_unparseable_descriptor_omits_album() {
        let root = TempDir::new().unwrap();
        write_file(root.path(), "Metadaten.json", "{ not json");
        write_media_with_sidecar(root.path(), "IMG_0001.jpg");

        let units = scan_takeout(root.path()).unwrap();
        assert_eq!(units.len(), 1);
        assert!(units[0].album_title.is_none());
    }

    #[test]
    fn test_missing_root_is_an_error() {
        assert!(scan_takeout(Path::new("/no/such/takeout")).is_err());
    }
}
