//! End-to-end scenario harness
//!
//! Drives a full [`Pipeline`] over a script with a recording sink, checking
//! the session invariants after every tick:
//! - total points equal the sum of points over transitions
//! - level never decreases and matches the cumulative thresholds
//! - history stays within capacity, newest first
//! - every achievement unlocks at most once, progress frozen after
//! - emotion master is unlocked iff all seven labels were seen
//! - every unlock and level-up gets exactly one celebration

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use neura_core::{AchievementId, SessionEvent};
use neura_effects::{EffectCall, RecordingSink};
use neura_runtime::{Pipeline, SessionConfig, SessionSnapshot, Tick};
use neura_state::LevelController;

use crate::{ChaosConfig, ChaosDetector, ChaosFrames, EmotionScript, ScriptedDetector, ScriptedFrames};

// ============================================================================
// SCENARIO HARNESS
// ============================================================================

/// Scenario configuration
#[derive(Clone, Debug)]
pub struct ScenarioConfig {
    pub session: SessionConfig,
    /// Enable chaos
    pub chaos: Option<ChaosConfig>,
    pub seed: u64,
    /// How long to let pending effect timers fire after the last frame
    pub settle: Duration,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        ScenarioConfig {
            session: SessionConfig::headless(),
            chaos: None,
            seed: 7,
            settle: Duration::from_secs(1),
        }
    }
}

impl ScenarioConfig {
    /// Real effect timings, narration and ambient on
    pub fn with_effects() -> Self {
        let mut session = SessionConfig {
            seed: Some(7),
            refresh_interval: Duration::from_millis(1),
            ..Default::default()
        };
        session.settings.narration_enabled = true;
        session.settings.ambient_enabled = true;

        ScenarioConfig {
            session,
            settle: Duration::from_secs(60),
            ..Default::default()
        }
    }

    pub fn with_chaos(mut self, chaos: ChaosConfig) -> Self {
        self.chaos = Some(chaos);
        self
    }
}

/// Result of a scenario run
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    pub ticks: u64,
    pub events: Vec<SessionEvent>,
    pub snapshot: SessionSnapshot,
    pub effects: Vec<EffectCall>,
    /// Specific invariant violations
    pub invariant_violations: Vec<String>,
}

impl ScenarioResult {
    pub fn passed(&self) -> bool {
        self.invariant_violations.is_empty()
    }

    pub fn count(&self, kind: &str) -> usize {
        self.events.iter().filter(|e| e.kind() == kind).count()
    }

    pub fn unlocked(&self) -> Vec<AchievementId> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SessionEvent::AchievementUnlocked(a) => Some(a.id),
                _ => None,
            })
            .collect()
    }

    pub fn effect_count(&self, predicate: impl Fn(&EffectCall) -> bool) -> usize {
        self.effects.iter().filter(|c| predicate(c)).count()
    }
}

/// Runs one scenario
pub struct ScenarioHarness {
    config: ScenarioConfig,
    sink: Arc<RecordingSink>,
}

impl ScenarioHarness {
    pub fn new(config: ScenarioConfig) -> Self {
        ScenarioHarness {
            config,
            sink: Arc::new(RecordingSink::new()),
        }
    }

    pub async fn run(&mut self, script: &EmotionScript) -> ScenarioResult {
        let frames = ScriptedFrames::new(script);
        let detector = ScriptedDetector::new();

        match self.config.chaos.clone() {
            Some(chaos) => {
                let frames = ChaosFrames::new(frames, &chaos, self.config.seed);
                let detector = ChaosDetector::new(detector, chaos, self.config.seed ^ 0x5eed);
                self.drive(frames, detector).await
            }
            None => self.drive(frames, detector).await,
        }
    }

    async fn drive<S, D>(&mut self, frames: S, detector: D) -> ScenarioResult
    where
        S: neura_runtime::FrameSource,
        D: neura_runtime::Detector<S::Frame>,
    {
        let mut violations = Vec::new();
        let mut pipeline = match Pipeline::new(
            self.config.session.clone(),
            frames,
            detector,
            self.sink.clone(),
        ) {
            Ok(pipeline) => pipeline,
            Err(e) => {
                return ScenarioResult {
                    ticks: 0,
                    events: Vec::new(),
                    snapshot: neura_runtime::Session::new().snapshot(),
                    effects: Vec::new(),
                    invariant_violations: vec![format!("pipeline rejected config: {}", e)],
                }
            }
        };

        let mut checker = InvariantChecker {
            history_capacity: self.config.session.history_capacity,
            ..Default::default()
        };
        let mut events = Vec::new();
        let mut ticks = 0;

        loop {
            ticks += 1;
            match pipeline.step().await {
                Tick::Ended => break,
                Tick::Processed(tick_events) => {
                    checker.observe(&tick_events, &pipeline.snapshot(), &mut violations);
                    events.extend(tick_events);
                }
                Tick::Deferred | Tick::Skipped => {}
            }
        }

        tokio::time::sleep(self.config.settle).await;

        let effects = self.sink.take();
        let celebrations = effects
            .iter()
            .filter(|c| matches!(c, EffectCall::Celebration { .. }))
            .count();
        let expected = events.iter().filter(|e| e.is_celebration()).count();
        if celebrations != expected {
            violations.push(format!(
                "{} celebrations for {} unlocks and level-ups",
                celebrations, expected
            ));
        }

        ScenarioResult {
            ticks,
            events,
            snapshot: pipeline.snapshot(),
            effects,
            invariant_violations: violations,
        }
    }
}

/// Cross-tick invariant tracking
#[derive(Default)]
struct InvariantChecker {
    history_capacity: usize,
    expected_points: u32,
    last_level: u32,
    unlocked: BTreeMap<AchievementId, u32>,
}

impl InvariantChecker {
    fn observe(
        &mut self,
        events: &[SessionEvent],
        snapshot: &SessionSnapshot,
        violations: &mut Vec<String>,
    ) {
        for event in events {
            match event {
                SessionEvent::Transition(t) => self.expected_points += t.emotion.points(),
                SessionEvent::AchievementUnlocked(a) => {
                    if self.unlocked.insert(a.id, a.progress()).is_some() {
                        violations.push(format!("{} unlocked twice", a.id));
                    }
                }
                _ => {}
            }
        }

        if snapshot.total_points != self.expected_points {
            violations.push(format!(
                "total points {} != {} from transitions",
                snapshot.total_points, self.expected_points
            ));
        }

        if snapshot.level < self.last_level {
            violations.push(format!(
                "level went down: {} -> {}",
                self.last_level, snapshot.level
            ));
        }
        self.last_level = snapshot.level;

        let expected_level = LevelController::level_for_points(snapshot.total_points);
        if snapshot.level != expected_level {
            violations.push(format!(
                "level {} at {} points, expected {}",
                snapshot.level, snapshot.total_points, expected_level
            ));
        }

        if snapshot.history.len() > self.history_capacity {
            violations.push(format!("history holds {} entries", snapshot.history.len()));
        }
        if snapshot
            .history
            .windows(2)
            .any(|w| w[0].timestamp < w[1].timestamp)
        {
            violations.push("history not newest first".to_string());
        }

        for view in &snapshot.achievements {
            if let Some(frozen) = self.unlocked.get(&view.id) {
                if !view.unlocked || view.progress != *frozen {
                    violations.push(format!("{} changed after unlock", view.id));
                }
            }
        }

        let all_seen = snapshot.emotions_detected.len() == 7;
        let master = snapshot
            .achievements
            .iter()
            .any(|a| a.id == AchievementId::EmotionMaster && a.unlocked);
        if all_seen != master {
            violations.push(format!(
                "emotion master unlocked={} with {} labels seen",
                master,
                snapshot.emotions_detected.len()
            ));
        }
    }
}

// ============================================================================
// STANDARD SCENARIOS
// ============================================================================

/// One smile at the default threshold
pub async fn scenario_first_smile() -> ScenarioResult {
    let script = EmotionScript::new().hold(neura_core::EmotionLabel::Happy, 0.6, 5);
    ScenarioHarness::new(ScenarioConfig::default()).run(&script).await
}

/// Every label once, then back and forth
pub async fn scenario_full_tour() -> ScenarioResult {
    let script = EmotionScript::new().tour(0.9, 3).tour(0.9, 3);
    ScenarioHarness::new(ScenarioConfig::default()).run(&script).await
}

/// Noisy tours under a poor backend
pub async fn scenario_under_chaos(chaos: ChaosConfig, seed: u64) -> ScenarioResult {
    let mut rng = crate::script_rng(seed);
    let mut script = EmotionScript::new();
    for _ in 0..4 {
        for label in neura_core::EmotionLabel::ALL {
            script = script.noisy(label, 0.8, 6, &mut rng).no_face(2);
        }
    }
    let config = ScenarioConfig {
        seed,
        ..Default::default()
    }
    .with_chaos(chaos);
    ScenarioHarness::new(config).run(&script).await
}
