//! Event definitions
//!
//! Events are the only thing the session hands to its listeners. Each
//! processed frame produces an ordered list of them: the stabilizer outcome
//! first, then (for a transition) points, level-ups and unlocks in the order
//! the gamification engine produced them.

use serde::Serialize;

use crate::{Achievement, EmotionLabel, Timestamp};

/// An accepted change of the stabilized emotion
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TransitionEvent {
    pub previous: EmotionLabel,
    pub emotion: EmotionLabel,
    /// `round(probability * 100)`
    pub confidence: u8,
    pub timestamp: Timestamp,
}

/// A single level increment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct LevelUpEvent {
    pub level: u32,
    pub total_points: u32,
}

/// Session event
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// No face in the frame; state untouched
    NoFace,
    /// Dominant score below threshold; state untouched
    Rejected {
        emotion: EmotionLabel,
        probability: f32,
        threshold: f32,
    },
    /// Same emotion held; only the confidence readout changed
    Refreshed { emotion: EmotionLabel, confidence: u8 },
    Transition(TransitionEvent),
    PointsAwarded {
        emotion: EmotionLabel,
        points: u32,
        total_points: u32,
    },
    LevelUp(LevelUpEvent),
    AchievementUnlocked(Achievement),
}

impl SessionEvent {
    /// Short name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            SessionEvent::NoFace => "no_face",
            SessionEvent::Rejected { .. } => "rejected",
            SessionEvent::Refreshed { .. } => "refreshed",
            SessionEvent::Transition(_) => "transition",
            SessionEvent::PointsAwarded { .. } => "points_awarded",
            SessionEvent::LevelUp(_) => "level_up",
            SessionEvent::AchievementUnlocked(_) => "achievement_unlocked",
        }
    }

    /// Does this event mutate progression (as opposed to a readout-only outcome)?
    pub fn is_progression(&self) -> bool {
        matches!(
            self,
            SessionEvent::PointsAwarded { .. }
                | SessionEvent::LevelUp(_)
                | SessionEvent::AchievementUnlocked(_)
        )
    }

    /// Does this event call for a celebration?
    pub fn is_celebration(&self) -> bool {
        matches!(
            self,
            SessionEvent::LevelUp(_) | SessionEvent::AchievementUnlocked(_)
        )
    }
}
