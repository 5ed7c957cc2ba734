//! Level controller
//!
//! A level asks for `level * 50` points earned while at that level, so the
//! total needed to *reach* level L is cumulative: 50, 150, 300, 500, ...
//! Crossings are inclusive and a single large award may cross several.

use serde::Serialize;

/// Points per level step
pub const POINTS_PER_LEVEL: u32 = 50;

/// Tracks the level and the total at which it was reached
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct LevelController {
    level: u32,
    /// Total points at which the current level was reached
    level_floor: u64,
}

impl LevelController {
    pub fn new() -> Self {
        LevelController {
            level: 1,
            level_floor: 0,
        }
    }

    #[inline]
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Points required within the current level
    #[inline]
    pub fn points_for_next_level(&self) -> u32 {
        self.level.saturating_mul(POINTS_PER_LEVEL)
    }

    /// Total points at which the next level is reached
    #[inline]
    pub fn next_level_at(&self) -> u64 {
        self.level_floor + self.points_for_next_level() as u64
    }

    /// Re-check after a point update
    ///
    /// Returns every level reached, in order; empty when no threshold was crossed.
    pub fn update(&mut self, total_points: u32) -> Vec<u32> {
        let total = total_points as u64;
        let mut reached = Vec::new();

        while total >= self.next_level_at() {
            self.level_floor = self.next_level_at();
            self.level += 1;
            reached.push(self.level);
        }

        reached
    }

    /// Display-only progress through the current level, in [0, 1)
    pub fn progress(&self, total_points: u32) -> f32 {
        let into_level = (total_points as u64).saturating_sub(self.level_floor);
        let needed = self.points_for_next_level().max(1) as u64;
        (into_level.min(needed - 1) as f64 / needed as f64) as f32
    }

    /// Points earned since reaching the current level
    pub fn points_into_level(&self, total_points: u32) -> u32 {
        (total_points as u64).saturating_sub(self.level_floor) as u32
    }

    /// Level a fresh controller ends up at for `total_points`
    pub fn level_for_points(total_points: u32) -> u32 {
        let mut controller = LevelController::new();
        controller.update(total_points);
        controller.level
    }
}

impl Default for LevelController {
    fn default() -> Self {
        Self::new()
    }
}
