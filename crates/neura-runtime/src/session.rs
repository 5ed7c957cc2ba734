//! NEURA Session - the per-user context object
//!
//! Owns every piece of mutable state (emotion, history, progression,
//! achievements). No globals: two sessions never share anything.

use std::collections::BTreeSet;

use neura_core::{
    Achievement, AchievementId, EmotionLabel, ExpressionScores, SessionEvent, Timestamp,
    TransitionEvent,
};
use neura_state::{
    EmotionStabilizer, EmotionState, GamificationEngine, HistoryEntry, HistoryLog,
    ProgressionState, Sensitivity, Stabilization,
};
use serde::Serialize;
use tracing::info;

use crate::SessionConfig;

/// Frame counters
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub frames: u64,
    pub no_face: u64,
    pub rejected: u64,
    pub refreshed: u64,
    pub transitions: u64,
}

/// Per-achievement view for presentation
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AchievementView {
    pub id: AchievementId,
    pub name: &'static str,
    pub description: &'static str,
    pub unlocked: bool,
    pub progress: u32,
    pub target: u32,
}

impl From<&Achievement> for AchievementView {
    fn from(a: &Achievement) -> Self {
        AchievementView {
            id: a.id,
            name: a.name,
            description: a.description,
            unlocked: a.is_unlocked(),
            progress: a.progress(),
            target: a.target,
        }
    }
}

/// Everything a presentation layer reads
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub emotion: EmotionLabel,
    pub confidence: u8,
    /// Newest first
    pub history: Vec<HistoryEntry>,
    pub total_points: u32,
    pub streak: u32,
    pub level: u32,
    pub level_progress: f32,
    pub achievements: Vec<AchievementView>,
    pub emotions_detected: BTreeSet<EmotionLabel>,
    pub stats: SessionStats,
}

/// One user's session
#[derive(Debug, Clone)]
pub struct Session {
    stabilizer: EmotionStabilizer,
    history: HistoryLog,
    gamification: GamificationEngine,
    stats: SessionStats,
}

impl Session {
    pub fn new() -> Self {
        Self::with_config(&SessionConfig::default())
    }

    pub fn with_config(config: &SessionConfig) -> Self {
        Session {
            stabilizer: EmotionStabilizer::new(config.settings.sensitivity()),
            history: HistoryLog::with_capacity(config.history_capacity),
            gamification: GamificationEngine::new(),
            stats: SessionStats::default(),
        }
    }

    /// Process one classification result
    ///
    /// Returns the events it produced, in order. Events after the first are
    /// only ever produced by a transition.
    pub fn process(
        &mut self,
        result: Option<&ExpressionScores>,
        now: Timestamp,
    ) -> Vec<SessionEvent> {
        self.stats.frames += 1;

        // Stage 1: Stabilize
        let (previous, emotion, confidence) = match self.stabilizer.apply(result, now) {
            Stabilization::NoFace => {
                self.stats.no_face += 1;
                return vec![SessionEvent::NoFace];
            }
            Stabilization::Rejected {
                emotion,
                probability,
            } => {
                self.stats.rejected += 1;
                return vec![SessionEvent::Rejected {
                    emotion,
                    probability,
                    threshold: self.stabilizer.threshold(),
                }];
            }
            Stabilization::Refresh {
                emotion,
                confidence,
            } => {
                self.stats.refreshed += 1;
                return vec![SessionEvent::Refreshed {
                    emotion,
                    confidence,
                }];
            }
            Stabilization::Transition {
                previous,
                emotion,
                confidence,
            } => (previous, emotion, confidence),
        };
        self.stats.transitions += 1;
        info!(%previous, %emotion, confidence, "emotion transition");

        // Stage 2: History
        self.history
            .record(HistoryEntry::new(emotion, confidence, now));

        // Stage 3: Gamify
        let outcome = self.gamification.on_emotion_transition(emotion);

        let mut events = vec![
            SessionEvent::Transition(TransitionEvent {
                previous,
                emotion,
                confidence,
                timestamp: now,
            }),
            SessionEvent::PointsAwarded {
                emotion,
                points: outcome.points_awarded,
                total_points: outcome.total_points,
            },
        ];

        let (rising, regular): (Vec<_>, Vec<_>) = outcome
            .unlocks
            .into_iter()
            .partition(|a| a.id == AchievementId::RisingStar);
        events.extend(regular.into_iter().map(SessionEvent::AchievementUnlocked));

        for level_up in outcome.level_ups {
            events.push(SessionEvent::LevelUp(level_up));
            if let Some(star) = rising.iter().find(|a| a.progress() == level_up.level) {
                events.push(SessionEvent::AchievementUnlocked(star.clone()));
            }
        }

        events
    }

    /// Takes effect on the next frame
    pub fn set_sensitivity(&mut self, sensitivity: Sensitivity) {
        self.stabilizer.set_sensitivity(sensitivity);
    }

    pub fn reset_streak(&mut self) {
        self.gamification.reset_streak();
    }

    pub fn state(&self) -> &EmotionState {
        self.stabilizer.state()
    }

    pub fn current_emotion(&self) -> EmotionLabel {
        self.stabilizer.current()
    }

    pub fn threshold(&self) -> f32 {
        self.stabilizer.threshold()
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn progression(&self) -> &ProgressionState {
        self.gamification.progression()
    }

    pub fn achievements(&self) -> &[Achievement] {
        self.gamification.achievements()
    }

    pub fn gamification(&self) -> &GamificationEngine {
        &self.gamification
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.stabilizer.state();
        let progression = self.gamification.progression();

        SessionSnapshot {
            emotion: state.emotion,
            confidence: state.confidence,
            history: self.history.to_vec(),
            total_points: progression.total_points(),
            streak: progression.streak(),
            level: progression.level(),
            level_progress: self.gamification.level_progress(),
            achievements: self.achievements().iter().map(AchievementView::from).collect(),
            emotions_detected: progression.emotions_detected().clone(),
            stats: self.stats.clone(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
