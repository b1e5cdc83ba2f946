//! Finds and loads the channel export the ring is built from.

use spindle::{CardDescriptor, IngestError, MediaRef};
use std::path::{Path, PathBuf};
use thiserror::Error;

const MANIFEST_FILE: &str = "channel.json";

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("No manifest configured and none found in the data directories")]
    NotFound,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Ingest(#[from] IngestError),
}

/// The configured manifest, else `channel.json` from the XDG data dirs.
pub fn locate(configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = configured {
        return Some(path.to_path_buf());
    }
    xdg::BaseDirectories::with_prefix("rondo").find_data_file(MANIFEST_FILE)
}

pub fn load(path: &Path) -> Result<Vec<CardDescriptor>, ManifestError> {
    let text = fs_err::read_to_string(path)?;
    let mut cards = spindle::card::parse_export(&text)?;
    if let Some(dir) = path.parent() {
        for card in &mut cards {
            card.media = resolve(dir, &card.media);
            card.poster = card.poster.as_ref().map(|p| resolve(dir, p));
        }
    }
    Ok(cards)
}

/// Relative file references are relative to the manifest. URLs and
/// absolute paths pass through.
fn resolve(dir: &Path, media: &MediaRef) -> MediaRef {
    let raw = media.as_str();
    if raw.contains("://") || Path::new(raw).is_absolute() {
        return media.clone();
    }
    MediaRef::new(dir.join(raw).to_string_lossy())
}

/// Local filesystem path for a media reference, if it has one.
pub fn local_path(media: &MediaRef) -> Option<PathBuf> {
    let raw = media.as_str();
    match raw.strip_prefix("file://") {
        Some(path) => Some(PathBuf::from(path)),
        None if raw.contains("://") => None,
        None => Some(PathBuf::from(raw)),
    }
}
