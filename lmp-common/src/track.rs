//! Track, playlist and loop-mode value types
//!
//! Shared between the player engine, the persistence layer and the HTTP API.
//! A [`Track`] is identified by its `id` alone: title, artist, thumbnail and
//! URI are display metadata and never take part in equality.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::str::FromStr;

use crate::Error;

/// Artist shown for tracks whose artist cannot be derived from the filename
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// A playable track
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    /// Unique identifier
    pub id: String,
    /// Display title
    pub title: String,
    /// Display artist
    pub artist: String,
    /// Thumbnail reference (URI or path), if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Source URI handed to the audio output on load
    pub uri: String,
}

impl Track {
    /// Create a track from explicit metadata
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
        uri: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            thumbnail: None,
            uri: uri.into(),
        }
    }

    /// Build a track from an audio file path using filename heuristics only
    ///
    /// - `title`: file stem (`"Artist - Title"` stems are split on the first `" - "`)
    /// - `artist`: from the stem when split, otherwise [`UNKNOWN_ARTIST`]
    /// - `id`: the path as given, so ids survive rescans of the same folder
    /// - `uri`: `file://` URI of the path
    pub fn from_path(path: &Path) -> Self {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().trim().to_string())
            .unwrap_or_default();

        let (artist, title) = match stem.split_once(" - ") {
            Some((artist, title)) if !artist.trim().is_empty() && !title.trim().is_empty() => {
                (artist.trim().to_string(), title.trim().to_string())
            }
            _ => (UNKNOWN_ARTIST.to_string(), stem.clone()),
        };

        let path_str = path.to_string_lossy().to_string();

        Self {
            id: path_str.clone(),
            title,
            artist,
            thumbnail: None,
            uri: format!("file://{}", path_str),
        }
    }

    /// Case-insensitive match of `query` against title or artist
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&query) || self.artist.to_lowercase().contains(&query)
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Track {}

impl Hash for Track {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Global repeat policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopMode {
    /// Advance through the queue (restarting from the top after the last track)
    #[default]
    None,
    /// Repeat the current track
    One,
    /// Repeat the whole queue
    All,
}

impl LoopMode {
    /// Next mode in the toggle cycle: none -> one -> all -> none
    pub fn cycle(self) -> Self {
        match self {
            LoopMode::None => LoopMode::One,
            LoopMode::One => LoopMode::All,
            LoopMode::All => LoopMode::None,
        }
    }

    /// Lowercase name used for persistence and the HTTP API
    pub fn as_str(&self) -> &'static str {
        match self {
            LoopMode::None => "none",
            LoopMode::One => "one",
            LoopMode::All => "all",
        }
    }
}

impl fmt::Display for LoopMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoopMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(LoopMode::None),
            "one" => Ok(LoopMode::One),
            "all" => Ok(LoopMode::All),
            other => Err(Error::InvalidInput(format!("Unknown loop mode: {}", other))),
        }
    }
}

/// A named, ordered collection of tracks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tracks: Vec<Track>,
    pub created_at: DateTime<Utc>,
}

impl Playlist {
    pub fn new(id: impl Into<String>, name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            tracks: Vec::new(),
            created_at,
        }
    }

    /// True if a track with `track_id` is in the playlist
    pub fn contains(&self, track_id: &str) -> bool {
        self.tracks.iter().any(|t| t.id == track_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::path::PathBuf;

    #[test]
    fn test_track_identity_is_id_only() {
        let a = Track::new("t1", "Title", "Artist", "file:///a.mp3");
        let mut b = a.clone();
        b.title = "Other".to_string();
        b.uri = "file:///b.mp3".to_string();
        assert_eq!(a, b);

        let c = Track::new("t2", "Title", "Artist", "file:///a.mp3");
        assert_ne!(a, c);

        let set: HashSet<Track> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_from_path_plain_stem() {
        let track = Track::from_path(&PathBuf::from("/music/Morning Song.mp3"));
        assert_eq!(track.title, "Morning Song");
        assert_eq!(track.artist, UNKNOWN_ARTIST);
        assert_eq!(track.id, "/music/Morning Song.mp3");
        assert_eq!(track.uri, "file:///music/Morning Song.mp3");
    }

    #[test]
    fn test_from_path_artist_title_stem() {
        let track = Track::from_path(&PathBuf::from("/music/Nina Simone - Sinnerman.flac"));
        assert_eq!(track.artist, "Nina Simone");
        assert_eq!(track.title, "Sinnerman");
    }

    #[test]
    fn test_matches_is_case_insensitive() {
        let track = Track::new("t1", "Blue Monday", "New Order", "file:///x.mp3");
        assert!(track.matches("blue"));
        assert!(track.matches("ORDER"));
        assert!(track.matches(""));
        assert!(!track.matches("joy division"));
    }

    #[test]
    fn test_loop_mode_cycle() {
        assert_eq!(LoopMode::default(), LoopMode::None);
        assert_eq!(LoopMode::None.cycle(), LoopMode::One);
        assert_eq!(LoopMode::One.cycle(), LoopMode::All);
        assert_eq!(LoopMode::All.cycle(), LoopMode::None);
    }

    #[test]
    fn test_loop_mode_parse() {
        assert_eq!("none".parse::<LoopMode>().unwrap(), LoopMode::None);
        assert_eq!(" ALL ".parse::<LoopMode>().unwrap(), LoopMode::All);
        assert!("shuffle".parse::<LoopMode>().is_err());

        let json = serde_json::to_string(&LoopMode::One).unwrap();
        assert_eq!(json, "\"one\"");
    }
}
