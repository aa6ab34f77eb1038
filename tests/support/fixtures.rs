use std::fs;
use std::path::{Path, PathBuf};

/// Write one media file plus its sidecar next to it; returns the media path.
pub fn write_media_with_sidecar(
    dir: &Path,
    name: &str,
    content: &[u8],
    taken_epoch: i64,
) -> PathBuf {
    let media = dir.join(name);
    fs::write(&media, content).expect("Failed to write media file");

    let sidecar = dir.join(format!("{}.supplemental-metadata.json", name));
    fs::write(
        &sidecar,
        format!(
            r#"{{"title": "{}", "photoTakenTime": {{"timestamp": "{}"}}}}"#,
            name, taken_epoch
        ),
    )
    .expect("Failed to write sidecar");

    media
}

/// Mark a directory as an album.
pub fn write_album_descriptor(dir: &Path, title: &str) {
    fs::write(
        dir.join("Metadaten.json"),
        format!(r#"{{"title": "{}"}}"#, title),
    )
    .expect("Failed to write album descriptor");
}
