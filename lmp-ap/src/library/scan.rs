//! Music folder scanning and search
//!
//! Tracks are built from file names only; no tags are read.

use crate::error::{Error, Result};
use lmp_common::Track;
use std::path::Path;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// Extensions picked up by the scanner (lowercase)
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "wav", "ogg", "m4a", "aac"];

/// Names skipped during traversal
const IGNORE_PATTERNS: &[&str] = &[".DS_Store", "Thumbs.db", ".git", ".svn"];

/// True when the extension is a known audio format
pub fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .map(|ext| AUDIO_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

fn should_process_entry(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    !IGNORE_PATTERNS.iter().any(|pattern| name.contains(pattern))
}

/// Walk `root` and return a track for every audio file, sorted by path
pub fn scan_folder(root: &Path) -> Result<Vec<Track>> {
    if !root.exists() {
        return Err(Error::NotFound(format!("Music folder {}", root.display())));
    }
    if !root.is_dir() {
        return Err(Error::BadRequest(format!(
            "Music folder is not a directory: {}",
            root.display()
        )));
    }

    let mut paths = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(should_process_entry);

    for entry in walker {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() && is_audio_file(entry.path()) {
                    paths.push(entry.into_path());
                }
            }
            Err(e) => warn!("Error accessing entry: {}", e),
        }
    }

    paths.sort();
    debug!("Found {} audio files under {}", paths.len(), root.display());

    Ok(paths.iter().map(|p| Track::from_path(p)).collect())
}

/// Case-insensitive title/artist search; an empty query returns everything
pub fn search<'a>(tracks: &'a [Track], query: &str) -> Vec<&'a Track> {
    tracks.iter().filter(|t| t.matches(query)).collect()
}

/// In-memory track library
#[derive(Debug, Default)]
pub struct Library {
    tracks: RwLock<Vec<Track>>,
}

impl Library {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self {
            tracks: RwLock::new(tracks),
        }
    }

    /// Scan `root` on the blocking pool and build a library from it
    pub async fn scan(root: &Path) -> Result<Self> {
        let root = root.to_path_buf();
        let tracks = tokio::task::spawn_blocking(move || scan_folder(&root))
            .await
            .map_err(|e| Error::Internal(format!("Scan task failed: {}", e)))??;

        info!("Library loaded: {} tracks", tracks.len());
        Ok(Self::new(tracks))
    }

    pub async fn search(&self, query: &str) -> Vec<Track> {
        let tracks = self.tracks.read().await;
        search(&tracks, query).into_iter().cloned().collect()
    }

    pub async fn get(&self, id: &str) -> Option<Track> {
        self.tracks.read().await.iter().find(|t| t.id == id).cloned()
    }
}
