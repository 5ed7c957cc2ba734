//! Progression state - points, streak, level and the set of emotions seen

use std::collections::BTreeSet;

use neura_core::EmotionLabel;
use serde::Serialize;

/// Session progression, mutated only by the gamification engine
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProgressionState {
    total_points: u32,
    streak: u32,
    level: u32,
    emotions_detected: BTreeSet<EmotionLabel>,
}

impl ProgressionState {
    pub fn new() -> Self {
        ProgressionState {
            total_points: 0,
            streak: 0,
            level: 1,
            emotions_detected: BTreeSet::new(),
        }
    }

    #[inline]
    pub fn total_points(&self) -> u32 {
        self.total_points
    }

    /// Cumulative count of transitions since the last explicit reset
    #[inline]
    pub fn streak(&self) -> u32 {
        self.streak
    }

    #[inline]
    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn emotions_detected(&self) -> &BTreeSet<EmotionLabel> {
        &self.emotions_detected
    }

    /// Number of distinct emotions seen
    #[inline]
    pub fn unique_emotions(&self) -> u32 {
        self.emotions_detected.len() as u32
    }

    pub fn has_seen(&self, emotion: EmotionLabel) -> bool {
        self.emotions_detected.contains(&emotion)
    }

    pub(crate) fn award(&mut self, emotion: EmotionLabel) -> u32 {
        let points = emotion.points();
        self.total_points = self.total_points.saturating_add(points);
        self.streak = self.streak.saturating_add(1);
        self.emotions_detected.insert(emotion);
        points
    }

    pub(crate) fn set_level(&mut self, level: u32) {
        self.level = self.level.max(level);
    }

    pub(crate) fn reset_streak(&mut self) {
        self.streak = 0;
    }
}

impl Default for ProgressionState {
    fn default() -> Self {
        Self::new()
    }
}
