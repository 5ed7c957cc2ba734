//! Achievement definitions
//!
//! Six fixed, one-way unlockable progression flags. Each carries a numeric
//! target and a progress readout; once unlocked both are frozen.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::NeuraError;

/// Achievement key
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementId {
    FirstSmile,
    EmotionExplorer,
    StreakMaster,
    EmotionMaster,
    PointCollector,
    /// "Rising Star", keyed `level_up`
    #[serde(rename = "level_up")]
    RisingStar,
}

impl AchievementId {
    /// All ids in evaluation order
    pub const ALL: [AchievementId; 6] = [
        AchievementId::FirstSmile,
        AchievementId::EmotionExplorer,
        AchievementId::StreakMaster,
        AchievementId::EmotionMaster,
        AchievementId::PointCollector,
        AchievementId::RisingStar,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AchievementId::FirstSmile => "first_smile",
            AchievementId::EmotionExplorer => "emotion_explorer",
            AchievementId::StreakMaster => "streak_master",
            AchievementId::EmotionMaster => "emotion_master",
            AchievementId::PointCollector => "point_collector",
            AchievementId::RisingStar => "level_up",
        }
    }

    /// Numeric threshold for the unlock
    pub fn target(self) -> u32 {
        match self {
            AchievementId::FirstSmile => 1,
            AchievementId::EmotionExplorer => 5,
            AchievementId::StreakMaster => 10,
            AchievementId::EmotionMaster => 7,
            AchievementId::PointCollector => 100,
            AchievementId::RisingStar => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AchievementId::FirstSmile => "First Smile",
            AchievementId::EmotionExplorer => "Emotion Explorer",
            AchievementId::StreakMaster => "Streak Master",
            AchievementId::EmotionMaster => "Emotion Master",
            AchievementId::PointCollector => "Point Collector",
            AchievementId::RisingStar => "Rising Star",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            AchievementId::FirstSmile => "Detect your first happy emotion",
            AchievementId::EmotionExplorer => "Detect 5 different emotions",
            AchievementId::StreakMaster => "Reach a 10 emotion streak",
            AchievementId::EmotionMaster => "Detect all 7 emotions",
            AchievementId::PointCollector => "Earn 100 points",
            AchievementId::RisingStar => "Reach level 5",
        }
    }
}

impl fmt::Display for AchievementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AchievementId {
    type Err = NeuraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AchievementId::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| NeuraError::UnknownAchievement(s.to_string()))
    }
}

/// Achievement instance with its progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Achievement {
    pub id: AchievementId,
    pub name: &'static str,
    pub description: &'static str,
    pub target: u32,
    progress: u32,
    unlocked: bool,
}

impl Achievement {
    /// Fresh, locked instance
    pub fn new(id: AchievementId) -> Self {
        Achievement {
            id,
            name: id.name(),
            description: id.description(),
            target: id.target(),
            progress: 0,
            unlocked: false,
        }
    }

    /// The six definitions, locked, in evaluation order
    pub fn definitions() -> Vec<Achievement> {
        AchievementId::ALL.iter().map(|id| Achievement::new(*id)).collect()
    }

    #[inline]
    pub fn progress(&self) -> u32 {
        self.progress
    }

    #[inline]
    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    /// Progress as a fraction of the target, capped at 1
    pub fn fraction(&self) -> f32 {
        if self.target == 0 {
            return 1.0;
        }
        (self.progress as f32 / self.target as f32).min(1.0)
    }

    /// Update the progress readout. Never lowers progress; no-op once unlocked.
    pub fn track(&mut self, progress: u32) {
        if self.unlocked {
            return;
        }
        self.progress = self.progress.max(progress);
    }

    /// Unlock with a final progress value
    ///
    /// Returns `true` only for the locked→unlocked transition; a second call
    /// changes nothing and returns `false`.
    pub fn unlock(&mut self, progress: u32) -> bool {
        if self.unlocked {
            return false;
        }
        self.track(progress);
        self.unlocked = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definitions() {
        let defs = Achievement::definitions();
        assert_eq!(defs.len(), 6);
        assert!(defs.iter().all(|a| !a.is_unlocked() && a.progress() == 0));
        assert_eq!(defs[5].id.as_str(), "level_up");
        assert_eq!(defs[5].name, "Rising Star");
        assert_eq!(defs[4].target, 100);
    }

    #[test]
    fn test_unlock_is_one_way_and_freezes() {
        let mut a = Achievement::new(AchievementId::StreakMaster);
        a.track(4);
        a.track(2);
        assert_eq!(a.progress(), 4);

        assert!(a.unlock(10));
        assert!(!a.unlock(12));
        a.track(50);
        assert_eq!(a.progress(), 10);
        assert!(a.is_unlocked());
    }

    #[test]
    fn test_id_roundtrip_names() {
        for id in AchievementId::ALL {
            assert_eq!(id.as_str().parse::<AchievementId>(), Ok(id));
        }
        assert!("nope".parse::<AchievementId>().is_err());
    }
}
