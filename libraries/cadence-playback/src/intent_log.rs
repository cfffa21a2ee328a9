//! Intent log
//!
//! Bounded record of every command issued to the engine, most recent last.
//! The newest entry defines which ack is current; anything older is stale.

use crate::engine::EngineCommand;
use crate::types::{Sequence, SessionState};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A command as it was issued
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedCommand {
    /// Sequence assigned at issue time
    pub sequence: Sequence,

    /// The command itself
    pub command: EngineCommand,

    /// Session state to enter once the engine acknowledges this command
    pub target: SessionState,
}

/// Bounded intent log with a monotonically increasing sequence counter
///
/// Implemented as a ring buffer that discards the oldest entries; the
/// counter keeps increasing regardless of capacity.
#[derive(Debug, Clone)]
pub struct IntentLog {
    entries: VecDeque<IssuedCommand>,
    max_size: usize,
    last: Option<Sequence>,
}

impl IntentLog {
    /// Create a log keeping at most `max_size` entries (at least one)
    pub fn new(max_size: usize) -> Self {
        let max_size = max_size.max(1);
        Self {
            entries: VecDeque::with_capacity(max_size),
            max_size,
            last: None,
        }
    }

    /// Record a command, assigning it the next sequence
    pub fn record(&mut self, command: EngineCommand, target: SessionState) -> IssuedCommand {
        let sequence = self.last.map_or(Sequence::new(1), Sequence::next);
        self.last = Some(sequence);

        let issued = IssuedCommand {
            sequence,
            command,
            target,
        };

        if self.entries.len() >= self.max_size {
            self.entries.pop_front();
        }
        self.entries.push_back(issued.clone());
        issued
    }

    /// Sequence of the most recently issued command
    pub fn latest_sequence(&self) -> Option<Sequence> {
        self.last
    }

    /// Most recently issued command
    pub fn latest(&self) -> Option<&IssuedCommand> {
        self.entries.back()
    }

    /// Whether `sequence` is the newest command (its ack is current)
    pub fn is_current(&self, sequence: Sequence) -> bool {
        self.last == Some(sequence)
    }

    /// Look up a retained command
    pub fn get(&self, sequence: Sequence) -> Option<&IssuedCommand> {
        self.entries.iter().rev().find(|entry| entry.sequence == sequence)
    }

    /// All retained commands (oldest first)
    pub fn entries(&self) -> impl Iterator<Item = &IssuedCommand> {
        self.entries.iter()
    }

    /// Number of retained commands
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been issued (or everything was evicted)
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequences_start_at_one_and_increase() {
        let mut log = IntentLog::new(8);
        let first = log.record(EngineCommand::Pause, SessionState::Paused);
        let second = log.record(EngineCommand::Resume, SessionState::Playing);

        assert_eq!(first.sequence, Sequence::new(1));
        assert_eq!(second.sequence, Sequence::new(2));
        assert!(log.is_current(second.sequence));
        assert!(!log.is_current(first.sequence));
    }

    #[test]
    fn oldest_entries_are_evicted() {
        let mut log = IntentLog::new(3);
        for _ in 0..5 {
            log.record(EngineCommand::Stop, SessionState::Idle);
        }

        assert_eq!(log.len(), 3);
        assert!(log.get(Sequence::new(1)).is_none());
        assert!(log.get(Sequence::new(3)).is_some());
        assert_eq!(log.latest_sequence(), Some(Sequence::new(5)));
    }

    #[test]
    fn zero_capacity_still_tracks_latest() {
        let mut log = IntentLog::new(0);
        log.record(EngineCommand::Pause, SessionState::Paused);
        log.record(EngineCommand::Resume, SessionState::Playing);

        assert_eq!(log.len(), 1);
        assert_eq!(log.latest().unwrap().command, EngineCommand::Resume);
    }

    #[test]
    fn empty_log_has_no_current_sequence() {
        let log = IntentLog::new(4);
        assert!(log.is_empty());
        assert!(!log.is_current(Sequence::new(1)));
    }
}
