//! Expression scores - the per-frame output of the inference model
//!
//! This is NOT the inference model. The model is an external capability;
//! these types carry what it hands back for a single sampled frame.

use serde::{Deserialize, Serialize};

use crate::{EmotionLabel, NeuraResult};

/// Independent per-label probabilities for one face
///
/// Scores are clamped into [0, 1] on the way in and need not sum to 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpressionScores {
    scores: [f32; EmotionLabel::COUNT],
}

impl ExpressionScores {
    /// All-zero scores
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(label, probability)` pairs; later pairs overwrite earlier ones
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (EmotionLabel, f32)>,
    {
        let mut scores = Self::new();
        for (label, probability) in pairs {
            scores.set(label, probability);
        }
        scores
    }

    /// Build from model-style named scores (`"happy" => 0.6`)
    pub fn from_named<'a, I>(pairs: I) -> NeuraResult<Self>
    where
        I: IntoIterator<Item = (&'a str, f32)>,
    {
        let mut scores = Self::new();
        for (name, probability) in pairs {
            scores.set(name.parse()?, probability);
        }
        Ok(scores)
    }

    /// Single-label scores, everything else zero
    pub fn single(label: EmotionLabel, probability: f32) -> Self {
        Self::new().with(label, probability)
    }

    pub fn with(mut self, label: EmotionLabel, probability: f32) -> Self {
        self.set(label, probability);
        self
    }

    /// Set a score, clamping into [0, 1] (NaN counts as 0)
    pub fn set(&mut self, label: EmotionLabel, probability: f32) {
        let p = if probability.is_nan() {
            0.0
        } else {
            probability.clamp(0.0, 1.0)
        };
        self.scores[label.index()] = p;
    }

    #[inline]
    pub fn get(&self, label: EmotionLabel) -> f32 {
        self.scores[label.index()]
    }

    /// Iterate scores in canonical label order
    pub fn iter(&self) -> impl Iterator<Item = (EmotionLabel, f32)> + '_ {
        EmotionLabel::ALL
            .iter()
            .map(move |label| (*label, self.scores[label.index()]))
    }

    /// Dominant label and its probability
    ///
    /// Walks labels in canonical order and only replaces the running maximum
    /// on a strictly greater score, so ties go to the earliest label.
    /// All-zero scores report `(Neutral, 0.0)`.
    pub fn dominant(&self) -> (EmotionLabel, f32) {
        let mut best = (EmotionLabel::ALL[0], self.scores[0]);
        for (label, probability) in self.iter().skip(1) {
            if probability > best.1 {
                best = (label, probability);
            }
        }
        best
    }
}

/// Face bounding box in source-frame pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }
}

/// One detected face
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bounding_box: BoundingBox,
    pub expressions: ExpressionScores,
}

impl Detection {
    pub fn new(bounding_box: BoundingBox, expressions: ExpressionScores) -> Self {
        Self {
            bounding_box,
            expressions,
        }
    }
}

/// Reduce a frame's detections to the classification the stabilizer consumes
///
/// Only the first face is classified. An empty list means no face, which is
/// a normal outcome and yields `None`.
pub fn classify(detections: &[Detection]) -> Option<ExpressionScores> {
    detections.first().map(|d| d.expressions)
}
