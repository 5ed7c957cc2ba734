//! Emotion labels and their static profiles
//!
//! The label set is closed: seven expressions, each with an immutable profile
//! (display name, reward points, ambient tone, narration and a short fact).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::NeuraError;

/// Emotion label reported by the expression model
///
/// Discriminants follow the canonical iteration order, which is the order the
/// expression network reports its scores in. Ties between equal scores are
/// broken in favour of the label that comes first in this order.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum EmotionLabel {
    #[default]
    Neutral = 0,
    Happy = 1,
    Sad = 2,
    Angry = 3,
    Fearful = 4,
    Disgusted = 5,
    Surprised = 6,
}

impl EmotionLabel {
    /// Number of labels
    pub const COUNT: usize = 7;

    /// All labels in canonical iteration order
    pub const ALL: [EmotionLabel; EmotionLabel::COUNT] = [
        EmotionLabel::Neutral,
        EmotionLabel::Happy,
        EmotionLabel::Sad,
        EmotionLabel::Angry,
        EmotionLabel::Fearful,
        EmotionLabel::Disgusted,
        EmotionLabel::Surprised,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Lowercase name as reported by the model
    pub fn as_str(self) -> &'static str {
        match self {
            EmotionLabel::Neutral => "neutral",
            EmotionLabel::Happy => "happy",
            EmotionLabel::Sad => "sad",
            EmotionLabel::Angry => "angry",
            EmotionLabel::Fearful => "fearful",
            EmotionLabel::Disgusted => "disgusted",
            EmotionLabel::Surprised => "surprised",
        }
    }

    /// Static profile for this label
    #[inline]
    pub fn profile(self) -> &'static EmotionProfile {
        &EMOTION_PROFILES[self.index()]
    }

    /// Reward points for a transition into this label
    #[inline]
    pub fn points(self) -> u32 {
        self.profile().points
    }

    /// Ambient tone frequency in Hz
    #[inline]
    pub fn tone_hz(self) -> f32 {
        self.profile().tone_hz
    }

    #[inline]
    pub fn narration(self) -> &'static str {
        self.profile().narration
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmotionLabel {
    type Err = NeuraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        EmotionLabel::ALL
            .iter()
            .copied()
            .find(|label| label.as_str() == lowered)
            .ok_or_else(|| NeuraError::UnknownEmotion(s.to_string()))
    }
}

/// Static per-label configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmotionProfile {
    pub label: EmotionLabel,
    /// Display name
    pub name: &'static str,
    /// Points awarded per transition into this label (5-20)
    pub points: u32,
    /// Base ambient tone frequency in Hz
    pub tone_hz: f32,
    /// Spoken narration
    pub narration: &'static str,
    /// Educational fact shown occasionally on transition
    pub fact: &'static str,
}

/// Profiles indexed by `EmotionLabel::index`
pub static EMOTION_PROFILES: [EmotionProfile; EmotionLabel::COUNT] = [
    EmotionProfile {
        label: EmotionLabel::Neutral,
        name: "Neutral",
        points: 5,
        tone_hz: 280.0,
        narration: "Welcome to NeuraWeb. I'm reading your emotions.",
        fact: "Neutral is a calm, balanced state. It's great for learning and focusing!",
    },
    EmotionProfile {
        label: EmotionLabel::Happy,
        name: "Happy",
        points: 10,
        tone_hz: 440.0,
        narration: "You look joyful! Your happiness lights up the screen!",
        fact: "Smiling can make you feel happier! Your brain releases feel-good chemicals when you smile.",
    },
    EmotionProfile {
        label: EmotionLabel::Sad,
        name: "Sad",
        points: 15,
        tone_hz: 220.0,
        narration: "I sense some heaviness. Take a deep breath and breathe slow.",
        fact: "It's okay to feel sad sometimes. Talking about your feelings helps you feel better!",
    },
    EmotionProfile {
        label: EmotionLabel::Angry,
        name: "Angry",
        points: 15,
        tone_hz: 120.0,
        narration: "Let's cool down the interface. Take it easy.",
        fact: "Taking deep breaths and counting to 10 can help calm angry feelings!",
    },
    EmotionProfile {
        label: EmotionLabel::Fearful,
        name: "Fearful",
        points: 20,
        tone_hz: 320.0,
        narration: "Everything is okay. You're in a safe space.",
        fact: "Being brave doesn't mean not being scared - it means facing your fears!",
    },
    EmotionProfile {
        label: EmotionLabel::Disgusted,
        name: "Disgusted",
        points: 15,
        tone_hz: 160.0,
        narration: "Let's refresh the environment for you.",
        fact: "Feeling disgusted helps protect us from things that might be harmful!",
    },
    EmotionProfile {
        label: EmotionLabel::Surprised,
        name: "Surprised",
        points: 10,
        tone_hz: 520.0,
        narration: "Something caught your attention! How exciting!",
        fact: "Surprise helps us pay attention to new and important things in our environment!",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiles_are_indexed_by_label() {
        for label in EmotionLabel::ALL {
            assert_eq!(label.profile().label, label);
            assert!((5..=20).contains(&label.points()));
        }
    }

    #[test]
    fn test_point_table() {
        assert_eq!(EmotionLabel::Happy.points(), 10);
        assert_eq!(EmotionLabel::Fearful.points(), 20);
        assert_eq!(EmotionLabel::Neutral.points(), 5);
        assert_eq!(EmotionLabel::Happy.tone_hz(), 440.0);
    }

    #[test]
    fn test_parse_label() {
        assert_eq!("happy".parse::<EmotionLabel>(), Ok(EmotionLabel::Happy));
        assert_eq!(" Surprised ".parse::<EmotionLabel>(), Ok(EmotionLabel::Surprised));
        assert_eq!(
            "contempt".parse::<EmotionLabel>(),
            Err(NeuraError::UnknownEmotion("contempt".to_string()))
        );
    }

    #[test]
    fn test_canonical_order() {
        for (i, label) in EmotionLabel::ALL.iter().enumerate() {
            assert_eq!(label.index(), i);
            assert_eq!(EmotionLabel::from_index(i), Some(*label));
        }
        assert_eq!(EmotionLabel::from_index(7), None);
        assert_eq!(EmotionLabel::default(), EmotionLabel::Neutral);
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&EmotionLabel::Disgusted).unwrap();
        assert_eq!(json, "\"disgusted\"");
        let back: EmotionLabel = serde_json::from_str("\"fearful\"").unwrap();
        assert_eq!(back, EmotionLabel::Fearful);
    }
}
