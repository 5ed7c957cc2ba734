//! Gamification engine
//!
//! Per transition, in order:
//! 1. Award points, bump streak
//! 2. Record the emotion as seen
//! 3. Re-evaluate every locked achievement against live state
//! 4. Level check (each level reached re-evaluates Rising Star)
//! 5. Report what was unlocked

use neura_core::{Achievement, AchievementId, EmotionLabel, LevelUpEvent};
use tracing::{debug, info};

use crate::{LevelController, ProgressionState};

/// What one transition produced
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransitionOutcome {
    pub points_awarded: u32,
    pub total_points: u32,
    /// Achievements unlocked by this transition, in evaluation order
    pub unlocks: Vec<Achievement>,
    /// Level increments, in order
    pub level_ups: Vec<LevelUpEvent>,
}

impl TransitionOutcome {
    pub fn is_quiet(&self) -> bool {
        self.unlocks.is_empty() && self.level_ups.is_empty()
    }
}

/// Owns `ProgressionState`, the level controller and the achievement set
#[derive(Clone, Debug)]
pub struct GamificationEngine {
    progression: ProgressionState,
    levels: LevelController,
    achievements: Vec<Achievement>,
}

impl GamificationEngine {
    pub fn new() -> Self {
        GamificationEngine {
            progression: ProgressionState::new(),
            levels: LevelController::new(),
            achievements: Achievement::definitions(),
        }
    }

    pub fn progression(&self) -> &ProgressionState {
        &self.progression
    }

    pub fn levels(&self) -> &LevelController {
        &self.levels
    }

    pub fn achievements(&self) -> &[Achievement] {
        &self.achievements
    }

    pub fn achievement(&self, id: AchievementId) -> Option<&Achievement> {
        self.achievements.iter().find(|a| a.id == id)
    }

    pub fn unlocked_count(&self) -> usize {
        self.achievements.iter().filter(|a| a.is_unlocked()).count()
    }

    /// Display-only fraction of the current level completed
    pub fn level_progress(&self) -> f32 {
        self.levels.progress(self.progression.total_points())
    }

    /// Apply one accepted emotion transition
    pub fn on_emotion_transition(&mut self, emotion: EmotionLabel) -> TransitionOutcome {
        let points_awarded = self.progression.award(emotion);
        let total_points = self.progression.total_points();
        debug!(
            %emotion,
            points = points_awarded,
            total = total_points,
            streak = self.progression.streak(),
            "points awarded"
        );

        let mut unlocks = self.evaluate_achievements(emotion);

        let mut level_ups = Vec::new();
        for level in self.levels.update(total_points) {
            self.progression.set_level(level);
            info!(level, total = total_points, "level up");
            level_ups.push(LevelUpEvent {
                level,
                total_points,
            });
            unlocks.extend(self.on_level_up(level));
        }

        TransitionOutcome {
            points_awarded,
            total_points,
            unlocks,
            level_ups,
        }
    }

    /// Re-evaluate only Rising Star against a new level
    pub fn on_level_up(&mut self, new_level: u32) -> Option<Achievement> {
        let achievement = self
            .achievements
            .iter_mut()
            .find(|a| a.id == AchievementId::RisingStar && !a.is_unlocked())?;

        if new_level >= achievement.target && achievement.unlock(new_level) {
            info!(achievement = %achievement.id, "achievement unlocked");
            return Some(achievement.clone());
        }
        achievement.track(new_level);
        None
    }

    /// Explicit external streak reset; nothing else ever lowers the streak
    pub fn reset_streak(&mut self) {
        debug!(streak = self.progression.streak(), "streak reset");
        self.progression.reset_streak();
    }

    fn evaluate_achievements(&mut self, emotion: EmotionLabel) -> Vec<Achievement> {
        let unique = self.progression.unique_emotions();
        let streak = self.progression.streak();
        let total = self.progression.total_points();

        let mut unlocked = Vec::new();
        for achievement in self.achievements.iter_mut().filter(|a| !a.is_unlocked()) {
            let (progress, reached) = match achievement.id {
                AchievementId::FirstSmile => {
                    if emotion == EmotionLabel::Happy {
                        (1, true)
                    } else {
                        (0, false)
                    }
                }
                AchievementId::EmotionExplorer => (unique, unique >= achievement.target),
                AchievementId::StreakMaster => (streak, streak >= achievement.target),
                AchievementId::EmotionMaster => (unique, unique >= achievement.target),
                AchievementId::PointCollector => (total, total >= achievement.target),
                // Level changes only
                AchievementId::RisingStar => continue,
            };

            if reached && achievement.unlock(progress) {
                info!(achievement = %achievement.id, progress, "achievement unlocked");
                unlocked.push(achievement.clone());
            } else {
                achievement.track(progress);
            }
        }
        unlocked
    }
}

impl Default for GamificationEngine {
    fn default() -> Self {
        Self::new()
    }
}
