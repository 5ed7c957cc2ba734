//! Emotion stabilization
//!
//! Pipeline per sampled frame:
//! 1. No face → no-op
//! 2. Pick the dominant label (ties → canonical order)
//! 3. Below threshold → reject, confidence untouched
//! 4. Same label as current → confidence refresh only
//! 5. Different label → transition

use neura_core::{EmotionLabel, ExpressionScores, Timestamp};
use serde::Serialize;
use tracing::{debug, trace};

/// Default sensitivity (percent)
pub const DEFAULT_SENSITIVITY: u8 = 50;

/// Sensitivity slider value, always within 1..=100
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Sensitivity(u8);

impl Sensitivity {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 100;

    /// Clamp any integer into 1..=100
    pub fn new(percent: i64) -> Self {
        Sensitivity(percent.clamp(Self::MIN as i64, Self::MAX as i64) as u8)
    }

    #[inline]
    pub fn percent(self) -> u8 {
        self.0
    }

    /// Threshold in 0.01..=1.0
    #[inline]
    pub fn threshold(self) -> f32 {
        self.0 as f32 / 100.0
    }
}

impl Default for Sensitivity {
    fn default() -> Self {
        Sensitivity(DEFAULT_SENSITIVITY)
    }
}

/// `round(probability * 100)` as a 0-100 integer
#[inline]
pub fn confidence_percent(probability: f32) -> u8 {
    (probability * 100.0).round().clamp(0.0, 100.0) as u8
}

/// The current accepted emotion
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct EmotionState {
    pub emotion: EmotionLabel,
    /// 0-100
    pub confidence: u8,
    /// Last time a frame was accepted (transition or refresh)
    pub accepted_at: Option<Timestamp>,
}

/// Outcome of stabilizing one frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Stabilization {
    NoFace,
    Rejected {
        emotion: EmotionLabel,
        probability: f32,
    },
    Refresh {
        emotion: EmotionLabel,
        confidence: u8,
    },
    Transition {
        previous: EmotionLabel,
        emotion: EmotionLabel,
        confidence: u8,
    },
}

impl Stabilization {
    /// Only transitions are accepted as events
    #[inline]
    pub fn is_transition(&self) -> bool {
        matches!(self, Stabilization::Transition { .. })
    }

    /// Emotion and confidence carried by an accepted frame
    pub fn accepted(&self) -> Option<(EmotionLabel, u8)> {
        match *self {
            Stabilization::Refresh {
                emotion,
                confidence,
            }
            | Stabilization::Transition {
                emotion,
                confidence,
                ..
            } => Some((emotion, confidence)),
            _ => None,
        }
    }
}

/// Stateless stabilization decision
///
/// `threshold` is inclusive: a dominant score equal to it is accepted.
pub fn stabilize(
    result: Option<&ExpressionScores>,
    threshold: f32,
    previous: EmotionLabel,
) -> Stabilization {
    let Some(scores) = result else {
        return Stabilization::NoFace;
    };

    let (emotion, probability) = scores.dominant();
    if probability < threshold {
        return Stabilization::Rejected {
            emotion,
            probability,
        };
    }

    let confidence = confidence_percent(probability);
    if emotion == previous {
        Stabilization::Refresh {
            emotion,
            confidence,
        }
    } else {
        Stabilization::Transition {
            previous,
            emotion,
            confidence,
        }
    }
}

/// Owns the single `EmotionState` and the live threshold
#[derive(Debug, Clone)]
pub struct EmotionStabilizer {
    state: EmotionState,
    threshold: f32,
}

impl EmotionStabilizer {
    pub fn new(sensitivity: Sensitivity) -> Self {
        EmotionStabilizer {
            state: EmotionState::default(),
            threshold: sensitivity.threshold(),
        }
    }

    pub fn state(&self) -> &EmotionState {
        &self.state
    }

    #[inline]
    pub fn current(&self) -> EmotionLabel {
        self.state.emotion
    }

    #[inline]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Takes effect on the next frame
    pub fn set_sensitivity(&mut self, sensitivity: Sensitivity) {
        if self.threshold != sensitivity.threshold() {
            debug!(
                sensitivity = sensitivity.percent(),
                "stabilizer threshold updated"
            );
        }
        self.threshold = sensitivity.threshold();
    }

    /// Stabilize a frame and apply the outcome to `EmotionState`
    pub fn apply(&mut self, result: Option<&ExpressionScores>, now: Timestamp) -> Stabilization {
        let outcome = stabilize(result, self.threshold, self.state.emotion);

        match outcome {
            Stabilization::NoFace => trace!("no face in frame"),
            Stabilization::Rejected {
                emotion,
                probability,
            } => {
                trace!(%emotion, probability, threshold = self.threshold, "frame below threshold");
            }
            Stabilization::Refresh { confidence, .. } => {
                self.state.confidence = confidence;
                self.state.accepted_at = Some(now);
            }
            Stabilization::Transition {
                emotion,
                confidence,
                ..
            } => {
                self.state = EmotionState {
                    emotion,
                    confidence,
                    accepted_at: Some(now),
                };
            }
        }

        outcome
    }
}

impl Default for EmotionStabilizer {
    fn default() -> Self {
        Self::new(Sensitivity::default())
    }
}
