//! NEURA State Engine - from noisy expression scores to a stable emotion and progression
//!
//! This crate implements the synchronous half of the pipeline:
//! - Emotion stabilization (threshold + same-label hysteresis)
//! - Bounded, newest-first transition history
//! - Level controller with cumulative thresholds
//! - Gamification engine (points, streak, unique emotions, achievements)
//!
//! Everything here runs to completion without suspending, so a session owns
//! these values directly and needs no locking.

pub mod stabilizer;
pub mod history;
pub mod level;
pub mod progression;
pub mod gamification;

pub use stabilizer::*;
pub use history::*;
pub use level::*;
pub use progression::*;
pub use gamification::*;
