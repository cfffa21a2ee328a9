//! Reversible shuffle over queue entries
//!
//! Shuffling is a permutation of the entries themselves; each entry keeps its
//! `original_position`, so restoring order is a stable sort on that field.

use crate::types::QueueEntry;
use rand::seq::SliceRandom;
use rand::Rng;

/// Shuffle every entry except `keep`, which becomes the first element
///
/// Returns the new index of the kept entry (always 0 for a non-empty slice).
/// The remaining entries are permuted uniformly (Fisher-Yates via
/// `SliceRandom::shuffle`).
pub fn shuffle_around<R: Rng + ?Sized>(
    entries: &mut [QueueEntry],
    keep: usize,
    rng: &mut R,
) -> Option<usize> {
    if entries.is_empty() {
        return None;
    }

    let keep = keep.min(entries.len() - 1);
    entries.swap(0, keep);
    entries[1..].shuffle(rng);
    Some(0)
}

/// Restore load order and return the new index of the entry that was at `cursor`
pub fn restore_original_order(entries: &mut [QueueEntry], cursor: Option<usize>) -> Option<usize> {
    let active = cursor
        .and_then(|index| entries.get(index))
        .map(|entry| entry.original_position);

    entries.sort_by_key(|entry| entry.original_position);

    active.and_then(|position| {
        entries
            .iter()
            .position(|entry| entry.original_position == position)
    })
}
