//! Transition history - bounded, newest first

use std::collections::VecDeque;

use neura_core::{EmotionLabel, Timestamp};
use serde::Serialize;

/// Number of transitions retained
pub const HISTORY_CAPACITY: usize = 10;

/// One accepted transition. Immutable once recorded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub emotion: EmotionLabel,
    pub confidence: u8,
    pub timestamp: Timestamp,
}

impl HistoryEntry {
    pub fn new(emotion: EmotionLabel, confidence: u8, timestamp: Timestamp) -> Self {
        HistoryEntry {
            emotion,
            confidence,
            timestamp,
        }
    }

    /// Points this entry earned
    pub fn points(&self) -> u32 {
        self.emotion.points()
    }
}

/// Most-recent-first log of transitions
#[derive(Debug, Clone)]
pub struct HistoryLog {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        HistoryLog {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Prepend, evicting the oldest entries beyond capacity
    ///
    /// No deduplication: an emotion that returns after a detour is recorded again.
    pub fn record(&mut self, entry: HistoryEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    /// Newest entry
    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.front()
    }

    /// Entries, newest first
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<HistoryEntry> {
        self.entries.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(emotion: EmotionLabel, at: u64) -> HistoryEntry {
        HistoryEntry::new(emotion, 70, Timestamp::from_millis(at))
    }

    #[test]
    fn test_newest_first() {
        let mut log = HistoryLog::new();
        log.record(entry(EmotionLabel::Happy, 1));
        log.record(entry(EmotionLabel::Sad, 2));

        let order: Vec<_> = log.iter().map(|e| e.emotion).collect();
        assert_eq!(order, vec![EmotionLabel::Sad, EmotionLabel::Happy]);
        assert_eq!(log.latest().map(|e| e.timestamp.as_millis()), Some(2));
    }

    #[test]
    fn test_evicts_oldest_beyond_capacity() {
        let mut log = HistoryLog::new();
        for i in 0..25u64 {
            let emotion = EmotionLabel::ALL[(i % 7) as usize];
            log.record(entry(emotion, i));
        }

        assert_eq!(log.len(), HISTORY_CAPACITY);
        let stamps: Vec<u64> = log.iter().map(|e| e.timestamp.as_millis()).collect();
        assert_eq!(stamps, (15..25).rev().collect::<Vec<_>>());
    }

    #[test]
    fn test_repeats_after_detour_are_kept() {
        let mut log = HistoryLog::new();
        log.record(entry(EmotionLabel::Happy, 1));
        log.record(entry(EmotionLabel::Sad, 2));
        log.record(entry(EmotionLabel::Happy, 3));
        assert_eq!(log.len(), 3);
        assert_eq!(log.to_vec()[0].emotion, EmotionLabel::Happy);
        assert_eq!(log.to_vec()[2].emotion, EmotionLabel::Happy);
    }
}
