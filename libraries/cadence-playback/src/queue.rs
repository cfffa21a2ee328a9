//! Queue store
//!
//! Owns the ordered entries, the cursor, and the repeat/shuffle modes.
//! Pure data and invariant enforcement: no I/O, no engine calls.
//!
//! Invariants:
//! - `cursor` is `Some(i)` with `i < entries.len()` iff `entries` is non-empty
//! - track ids are unique within one `load`; only `append` may add duplicates

use crate::error::{PlaybackError, Result};
use crate::shuffle::{restore_original_order, shuffle_around};
use crate::types::{QueueEntry, QueueSnapshot, RepeatMode, Step};
use cadence_core::TrackId;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;

/// Playback queue with a cursor
#[derive(Debug, Clone)]
pub struct QueueStore {
    entries: Vec<QueueEntry>,
    cursor: Option<usize>,
    repeat_mode: RepeatMode,
    shuffled: bool,
    next_position: usize,
    rng: StdRng,
}

impl Default for QueueStore {
    fn default() -> Self {
        Self::new()
    }
}

impl QueueStore {
    /// Create an empty queue with an entropy-seeded shuffle source
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Create an empty queue whose shuffles are reproducible
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            entries: Vec::new(),
            cursor: None,
            repeat_mode: RepeatMode::Off,
            shuffled: false,
            next_position: 0,
            rng,
        }
    }

    // ===== Loading =====

    /// Replace the queue and place the cursor at `start_index`
    ///
    /// Rejects empty input, an out-of-range start, and duplicate ids without
    /// touching the current queue. When shuffle is on, the new entries are
    /// shuffled around the start entry.
    pub fn load(&mut self, track_ids: Vec<TrackId>, start_index: usize) -> Result<QueueSnapshot> {
        if track_ids.is_empty() {
            return Err(PlaybackError::invalid("cannot load an empty track list"));
        }
        if start_index >= track_ids.len() {
            return Err(PlaybackError::invalid(format!(
                "start index {} out of range for {} tracks",
                start_index,
                track_ids.len()
            )));
        }

        let mut seen = HashSet::with_capacity(track_ids.len());
        if let Some(duplicate) = track_ids.iter().find(|id| !seen.insert(*id)) {
            return Err(PlaybackError::invalid(format!(
                "track {} appears more than once",
                duplicate
            )));
        }

        self.next_position = track_ids.len();
        self.entries = track_ids
            .into_iter()
            .enumerate()
            .map(|(original_position, track_id)| QueueEntry {
                track_id,
                original_position,
            })
            .collect();
        self.cursor = Some(start_index);

        if self.shuffled {
            self.cursor = shuffle_around(&mut self.entries, start_index, &mut self.rng);
        }

        Ok(self.snapshot())
    }

    /// Explicitly re-add tracks at the end of the queue
    ///
    /// Duplicates are allowed here. Appended entries get fresh original
    /// positions after every existing one, so un-shuffling keeps them last.
    pub fn append(&mut self, track_ids: Vec<TrackId>) -> QueueSnapshot {
        for track_id in track_ids {
            self.entries.push(QueueEntry {
                track_id,
                original_position: self.next_position,
            });
            self.next_position += 1;
        }

        if self.cursor.is_none() && !self.entries.is_empty() {
            self.cursor = Some(0);
        }

        self.snapshot()
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
        self.next_position = 0;
    }

    // ===== Navigation =====

    /// Advance according to repeat mode
    ///
    /// `RepeatMode::Track` returns the current track without moving. At the
    /// last entry, `RepeatMode::Queue` wraps to 0 and `Off` yields
    /// [`Step::EndOfQueue`] with the cursor unchanged.
    pub fn next(&mut self) -> Result<Step> {
        let cursor = self.cursor.ok_or(PlaybackError::EmptyQueue)?;
        let last = self.entries.len() - 1;

        let target = match self.repeat_mode {
            RepeatMode::Track => cursor,
            _ if cursor < last => cursor + 1,
            RepeatMode::Queue => 0,
            RepeatMode::Off => return Ok(Step::EndOfQueue),
        };

        Ok(self.move_to(target))
    }

    /// Move backward according to repeat mode
    ///
    /// Mirror of [`next`](Self::next): wraps to the last entry only under
    /// `RepeatMode::Queue`, otherwise yields [`Step::StartOfQueue`] at index 0.
    pub fn previous(&mut self) -> Result<Step> {
        let cursor = self.cursor.ok_or(PlaybackError::EmptyQueue)?;
        let last = self.entries.len() - 1;

        let target = match self.repeat_mode {
            RepeatMode::Track => cursor,
            _ if cursor > 0 => cursor - 1,
            RepeatMode::Queue => last,
            RepeatMode::Off => return Ok(Step::StartOfQueue),
        };

        Ok(self.move_to(target))
    }

    /// Move the cursor to an arbitrary entry
    pub fn jump_to(&mut self, index: usize) -> Result<TrackId> {
        if self.entries.is_empty() {
            return Err(PlaybackError::EmptyQueue);
        }
        if index >= self.entries.len() {
            return Err(PlaybackError::invalid(format!(
                "queue index {} out of range for {} entries",
                index,
                self.entries.len()
            )));
        }

        self.cursor = Some(index);
        Ok(self.entries[index].track_id.clone())
    }

    fn move_to(&mut self, index: usize) -> Step {
        self.cursor = Some(index);
        Step::Track(self.entries[index].track_id.clone())
    }

    // ===== Modes =====

    /// Set repeat mode
    pub fn set_repeat_mode(&mut self, mode: RepeatMode) {
        self.repeat_mode = mode;
    }

    /// Get repeat mode
    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat_mode
    }

    /// Enable or disable shuffle
    ///
    /// Enabling keeps the current entry current (it moves to the front) and
    /// permutes everything else. Disabling sorts back by original position and
    /// follows the current entry. Setting the mode it already has is a no-op.
    pub fn set_shuffle(&mut self, enabled: bool) {
        if self.shuffled == enabled {
            return;
        }
        self.shuffled = enabled;

        self.cursor = if enabled {
            let keep = self.cursor.unwrap_or(0);
            shuffle_around(&mut self.entries, keep, &mut self.rng)
        } else {
            restore_original_order(&mut self.entries, self.cursor)
        };
    }

    /// Flip shuffle, returning the new flag
    pub fn toggle_shuffle(&mut self) -> bool {
        self.set_shuffle(!self.shuffled);
        self.shuffled
    }

    /// Whether entries are currently shuffled
    pub fn is_shuffled(&self) -> bool {
        self.shuffled
    }

    // ===== Queries =====

    /// Track under the cursor
    pub fn current_track_id(&self) -> Option<&TrackId> {
        self.cursor.map(|index| &self.entries[index].track_id)
    }

    /// Cursor position
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Entries in play order
    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read-only projection for the UI
    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            entries: self.entries.clone(),
            cursor: self.cursor,
            repeat_mode: self.repeat_mode,
            shuffled: self.shuffled,
        }
    }
}
