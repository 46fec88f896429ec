//! Play queue
//!
//! Ordered tracks plus a current-position pointer. The queue is replaced
//! wholesale whenever a new play context is established; only the pointer
//! moves during playback.

use crate::error::{Error, Result};
use lmp_common::Track;

/// Ordered sequence of tracks with an optional current index
///
/// Invariant: `current` is `None` or `Some(i)` with `i < tracks.len()`.
#[derive(Debug, Clone, Default)]
pub struct Queue {
    tracks: Vec<Track>,
    current: Option<usize>,
}

impl Queue {
    /// Create an empty queue with no selection
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the tracks and pointer in one step
    ///
    /// An empty `tracks` clears the queue and the selection. For a non-empty
    /// list, `start_index` must be in `[0, len)`; the queue is left untouched
    /// otherwise.
    pub fn load(&mut self, tracks: Vec<Track>, start_index: usize) -> Result<()> {
        if tracks.is_empty() {
            self.tracks.clear();
            self.current = None;
            return Ok(());
        }

        if start_index >= tracks.len() {
            return Err(Error::InvalidIndex {
                index: start_index,
                len: tracks.len(),
            });
        }

        self.tracks = tracks;
        self.current = Some(start_index);
        Ok(())
    }

    /// Track at the current index
    pub fn current_track(&self) -> Option<&Track> {
        self.current.and_then(|i| self.tracks.get(i))
    }

    /// Current index, None when nothing is selected
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Move the pointer
    ///
    /// Bounds are checked here but callers outside the playback module go
    /// through the controller, which only passes indexes from the loop policy.
    pub(crate) fn advance_to(&mut self, index: usize) -> Result<()> {
        if index >= self.tracks.len() {
            return Err(Error::InvalidIndex {
                index,
                len: self.tracks.len(),
            });
        }
        self.current = Some(index);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Position of the track with `track_id`
    pub fn index_of(&self, track_id: &str) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == track_id)
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }
}
