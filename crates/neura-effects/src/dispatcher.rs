//! Effect dispatcher
//!
//! Turns session events into sink calls:
//! - Transition: narration (cancel then speak), ambient tone swap, maybe a fact
//! - Level-up: celebration right away
//! - Unlock: celebration after `celebration_delay`, then the unlock popup through a FIFO
//!
//! Sink errors are logged and dropped; nothing here can fail the session.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use neura_core::{Achievement, EmotionLabel, SessionEvent, TransitionEvent};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::sink::report;
use crate::{
    AmbientTone, CelebrationBurst, EffectSink, Scheduler, TaskKey, ToneState, ToneTiming,
    DEFAULT_PARTICLE_COUNT,
};

/// Effect timings and odds
#[derive(Clone, Debug, PartialEq)]
pub struct EffectConfig {
    pub tone: ToneTiming,
    /// Pause between an unlock and its celebration
    pub celebration_delay: Duration,
    /// How long an unlock popup stays up
    pub popup_duration: Duration,
    pub fact_duration: Duration,
    /// Chance of showing the new emotion's fact on a transition
    pub fact_probability: f64,
    pub particle_count: usize,
}

impl Default for EffectConfig {
    fn default() -> Self {
        EffectConfig {
            tone: ToneTiming::default(),
            celebration_delay: Duration::from_millis(500),
            popup_duration: Duration::from_secs(4),
            fact_duration: Duration::from_secs(5),
            fact_probability: 0.3,
            particle_count: DEFAULT_PARTICLE_COUNT,
        }
    }
}

impl EffectConfig {
    /// No delays and no facts, for headless runs
    pub fn immediate() -> Self {
        EffectConfig {
            tone: ToneTiming {
                fade_in: Duration::ZERO,
                fade_out: Duration::ZERO,
                stop_delay: Duration::ZERO,
            },
            celebration_delay: Duration::ZERO,
            popup_duration: Duration::ZERO,
            fact_duration: Duration::ZERO,
            fact_probability: 0.0,
            ..Default::default()
        }
    }
}

struct QueuedPopup {
    burst: u64,
    achievement: Achievement,
    /// Its celebration has fired
    ready: bool,
}

#[derive(Default)]
struct PopupQueue {
    visible: Option<Achievement>,
    waiting: VecDeque<QueuedPopup>,
}

/// One popup at a time, in unlock order
///
/// A slot is reserved when the unlock is dispatched and becomes showable
/// once its celebration fires.
#[derive(Clone)]
struct PopupBoard {
    queue: Arc<Mutex<PopupQueue>>,
    sink: Arc<dyn EffectSink>,
    scheduler: Scheduler,
    duration: Duration,
}

impl PopupBoard {
    fn reserve(&self, burst: u64, achievement: Achievement) {
        self.queue.lock().waiting.push_back(QueuedPopup {
            burst,
            achievement,
            ready: false,
        });
    }

    fn mark_ready(&self, burst: u64) {
        let mut queue = self.queue.lock();
        if let Some(popup) = queue.waiting.iter_mut().find(|p| p.burst == burst) {
            popup.ready = true;
        }
        if queue.visible.is_none() {
            self.show_next(&mut queue);
        }
    }

    fn show_next(&self, queue: &mut PopupQueue) {
        if !queue.waiting.front().is_some_and(|p| p.ready) {
            return;
        }
        let Some(popup) = queue.waiting.pop_front() else {
            return;
        };

        info!(achievement = %popup.achievement.id, "showing unlock");
        report("show_unlock", self.sink.show_unlock(&popup.achievement));
        queue.visible = Some(popup.achievement);

        let board = self.clone();
        self.scheduler
            .schedule(TaskKey::UnlockPopup, self.duration, move || board.advance());
    }

    fn advance(&self) {
        let mut queue = self.queue.lock();
        queue.visible = None;
        report("hide_unlock", self.sink.hide_unlock());
        self.show_next(&mut queue);
    }

    fn clear(&self) {
        let mut queue = self.queue.lock();
        queue.waiting.clear();
        if queue.visible.take().is_some() {
            report("hide_unlock", self.sink.hide_unlock());
        }
    }
}

/// Applies session events to an [`EffectSink`]
pub struct EffectDispatcher {
    sink: Arc<dyn EffectSink>,
    scheduler: Scheduler,
    config: EffectConfig,
    ambient: AmbientTone,
    popups: PopupBoard,
    rng: Arc<Mutex<StdRng>>,
    next_burst: u64,
    narration_enabled: bool,
    ambient_enabled: bool,
    current: EmotionLabel,
}

impl EffectDispatcher {
    pub fn new(sink: Arc<dyn EffectSink>, config: EffectConfig) -> Self {
        Self::with_rng(sink, config, StdRng::from_entropy())
    }

    /// Deterministic particles and facts
    pub fn with_seed(sink: Arc<dyn EffectSink>, config: EffectConfig, seed: u64) -> Self {
        Self::with_rng(sink, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(sink: Arc<dyn EffectSink>, config: EffectConfig, rng: StdRng) -> Self {
        let scheduler = Scheduler::new();
        let popups = PopupBoard {
            queue: Arc::new(Mutex::new(PopupQueue::default())),
            sink: sink.clone(),
            scheduler: scheduler.clone(),
            duration: config.popup_duration,
        };

        EffectDispatcher {
            ambient: AmbientTone::new(config.tone),
            sink,
            scheduler,
            config,
            popups,
            rng: Arc::new(Mutex::new(rng)),
            next_burst: 0,
            narration_enabled: false,
            ambient_enabled: false,
            current: EmotionLabel::Neutral,
        }
    }

    pub fn config(&self) -> &EffectConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn ambient_state(&self) -> ToneState {
        self.ambient.state()
    }

    pub fn narration_enabled(&self) -> bool {
        self.narration_enabled
    }

    pub fn ambient_enabled(&self) -> bool {
        self.ambient_enabled
    }

    /// Unlock popups still waiting behind the visible one
    pub fn queued_popups(&self) -> usize {
        self.popups.queue.lock().waiting.len()
    }

    pub fn visible_popup(&self) -> Option<Achievement> {
        self.popups.queue.lock().visible.clone()
    }

    pub fn set_narration(&mut self, enabled: bool) {
        if self.narration_enabled && !enabled {
            report("cancel_speech", self.sink.cancel_speech());
        }
        self.narration_enabled = enabled;
    }

    /// Enabling starts the current emotion's tone; disabling fades it out
    pub fn set_ambient(&mut self, enabled: bool) {
        if enabled == self.ambient_enabled {
            return;
        }
        self.ambient_enabled = enabled;
        if enabled {
            self.ambient
                .start(self.sink.as_ref(), &self.scheduler, self.current);
        } else {
            self.ambient.stop(self.sink.as_ref(), &self.scheduler);
        }
    }

    pub fn dispatch_all(&mut self, events: &[SessionEvent]) {
        for event in events {
            self.dispatch(event);
        }
    }

    pub fn dispatch(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::Transition(transition) => self.on_transition(transition),
            SessionEvent::LevelUp(level_up) => {
                debug!(level = level_up.level, "celebrating level-up");
                self.celebrate(None);
            }
            SessionEvent::AchievementUnlocked(achievement) => {
                debug!(achievement = %achievement.id, "celebrating unlock");
                self.celebrate(Some(achievement.clone()));
            }
            _ => {}
        }
    }

    fn on_transition(&mut self, transition: &TransitionEvent) {
        let emotion = transition.emotion;
        self.current = emotion;

        if self.narration_enabled {
            report("cancel_speech", self.sink.cancel_speech());
            report("speak", self.sink.speak(emotion.narration()));
        }

        if self.ambient_enabled {
            self.ambient
                .start(self.sink.as_ref(), &self.scheduler, emotion);
        }

        if self.roll_fact() {
            report("show_fact", self.sink.show_fact(emotion.profile().fact));
            let sink = self.sink.clone();
            self.scheduler
                .schedule(TaskKey::Fact, self.config.fact_duration, move || {
                    report("hide_fact", sink.hide_fact());
                });
        }
    }

    fn roll_fact(&self) -> bool {
        let p = self.config.fact_probability;
        let p = if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.0 };
        self.rng.lock().gen_bool(p)
    }

    /// Level-ups fire now; unlocks fire after `celebration_delay`
    fn celebrate(&mut self, unlock: Option<Achievement>) {
        let id = self.next_burst;
        self.next_burst += 1;

        let has_popup = unlock.is_some();
        if let Some(achievement) = unlock {
            self.popups.reserve(id, achievement);
        }

        let sink = self.sink.clone();
        let rng = self.rng.clone();
        let popups = self.popups.clone();
        let count = self.config.particle_count;

        let fire = move || {
            let burst = CelebrationBurst::generate(id, count, &mut *rng.lock());
            report("spawn_celebration", sink.spawn_celebration(&burst));
            report("play_success_chime", sink.play_success_chime());
            if has_popup {
                popups.mark_ready(id);
            }
        };

        if has_popup {
            self.scheduler
                .schedule(TaskKey::Celebration(id), self.config.celebration_delay, fire);
        } else {
            fire();
        }
    }

    /// Cancel every timer and silence everything
    pub fn shutdown(&mut self) {
        self.scheduler.cancel_all();
        self.ambient.halt(self.sink.as_ref(), &self.scheduler);
        self.popups.clear();
        if self.narration_enabled {
            report("cancel_speech", self.sink.cancel_speech());
        }
    }
}

impl std::fmt::Debug for EffectDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectDispatcher")
            .field("narration_enabled", &self.narration_enabled)
            .field("ambient_enabled", &self.ambient_enabled)
            .field("current", &self.current)
            .field("scheduler", &self.scheduler)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EffectCall, RecordingSink};
    use neura_core::{AchievementId, LevelUpEvent, Timestamp};

    fn transition(previous: EmotionLabel, emotion: EmotionLabel) -> SessionEvent {
        SessionEvent::Transition(TransitionEvent {
            previous,
            emotion,
            confidence: 80,
            timestamp: Timestamp::from_millis(0),
        })
    }

    fn unlock(id: AchievementId) -> SessionEvent {
        SessionEvent::AchievementUnlocked(Achievement::new(id))
    }

    fn quiet_config() -> EffectConfig {
        EffectConfig {
            fact_probability: 0.0,
            ..Default::default()
        }
    }

    fn dispatcher(sink: &Arc<RecordingSink>, config: EffectConfig) -> EffectDispatcher {
        let mut effects = EffectDispatcher::with_seed(sink.clone(), config, 11);
        effects.set_narration(true);
        effects
    }

    #[tokio::test(start_paused = true)]
    async fn test_transition_narrates() {
        let sink = Arc::new(RecordingSink::new());
        let mut effects = dispatcher(&sink, quiet_config());

        effects.dispatch(&transition(EmotionLabel::Neutral, EmotionLabel::Happy));
        assert_eq!(
            sink.take(),
            vec![
                EffectCall::CancelSpeech,
                EffectCall::Speak(EmotionLabel::Happy.narration().to_string()),
            ]
        );

        effects.set_narration(false);
        sink.take();
        effects.dispatch(&transition(EmotionLabel::Happy, EmotionLabel::Sad));
        assert!(sink.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_transition_events_are_silent() {
        let sink = Arc::new(RecordingSink::new());
        let mut effects = dispatcher(&sink, quiet_config());

        effects.dispatch_all(&[
            SessionEvent::NoFace,
            SessionEvent::Refreshed {
                emotion: EmotionLabel::Neutral,
                confidence: 70,
            },
            SessionEvent::PointsAwarded {
                emotion: EmotionLabel::Happy,
                points: 10,
                total_points: 10,
            },
        ]);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(sink.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_enabling_ambient_plays_current_emotion() {
        let sink = Arc::new(RecordingSink::new());
        let mut effects = dispatcher(&sink, quiet_config());
        effects.set_narration(false);

        effects.dispatch(&transition(EmotionLabel::Neutral, EmotionLabel::Surprised));
        assert!(sink.calls().is_empty());

        effects.set_ambient(true);
        effects.set_ambient(true);
        assert_eq!(
            sink.take(),
            vec![EffectCall::PlayTone {
                frequency_hz: EmotionLabel::Surprised.tone_hz(),
                gain: crate::AMBIENT_GAIN,
                fade_in: Duration::from_millis(500)
            }]
        );

        effects.dispatch(&transition(EmotionLabel::Surprised, EmotionLabel::Angry));
        assert_eq!(sink.count(|c| matches!(c, EffectCall::StopTone { .. })), 1);
        assert_eq!(effects.ambient_state().emotion(), Some(EmotionLabel::Angry));

        effects.set_ambient(false);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(effects.ambient_state(), ToneState::Silent);
    }

    #[tokio::test(start_paused = true)]
    async fn test_celebration_is_delayed() {
        let sink = Arc::new(RecordingSink::new());
        let mut effects = dispatcher(&sink, quiet_config());

        effects.dispatch(&unlock(AchievementId::FirstSmile));
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(sink.calls().is_empty());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(
            sink.take(),
            vec![
                EffectCall::Celebration { particles: 50 },
                EffectCall::SuccessChime,
                EffectCall::ShowUnlock(AchievementId::FirstSmile),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_level_up_celebrates_without_popup() {
        let sink = Arc::new(RecordingSink::new());
        let mut effects = dispatcher(&sink, quiet_config());

        effects.dispatch(&SessionEvent::LevelUp(LevelUpEvent {
            level: 2,
            total_points: 50,
        }));
        assert_eq!(
            sink.take(),
            vec![EffectCall::Celebration { particles: 50 }, EffectCall::SuccessChime]
        );

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(sink.calls().is_empty());
        assert!(effects.visible_popup().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_frame_level_up_and_unlock_play_in_sequence() {
        let sink = Arc::new(RecordingSink::new());
        let mut effects = dispatcher(&sink, quiet_config());
        let bursts = || sink.count(|c| matches!(c, EffectCall::Celebration { .. }));

        effects.dispatch_all(&[
            unlock(AchievementId::PointCollector),
            SessionEvent::LevelUp(LevelUpEvent {
                level: 2,
                total_points: 100,
            }),
        ]);

        // Level-up burst goes off with the frame
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(bursts(), 1);
        assert!(effects.visible_popup().is_none());

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(bursts(), 1);

        // Unlock burst and its popup half a second later
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(bursts(), 2);
        assert_eq!(
            effects.visible_popup().map(|a| a.id),
            Some(AchievementId::PointCollector)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_popups_queue_fifo() {
        let sink = Arc::new(RecordingSink::new());
        let mut effects = dispatcher(&sink, quiet_config());

        effects.dispatch_all(&[
            unlock(AchievementId::EmotionExplorer),
            unlock(AchievementId::PointCollector),
            SessionEvent::LevelUp(LevelUpEvent {
                level: 3,
                total_points: 150,
            }),
        ]);

        assert_eq!(sink.count(|c| *c == EffectCall::SuccessChime), 1);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(sink.count(|c| *c == EffectCall::SuccessChime), 3);
        assert_eq!(
            effects.visible_popup().map(|a| a.id),
            Some(AchievementId::EmotionExplorer)
        );
        assert_eq!(effects.queued_popups(), 1);

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(
            effects.visible_popup().map(|a| a.id),
            Some(AchievementId::PointCollector)
        );

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(effects.visible_popup().is_none());

        let popups: Vec<_> = sink
            .calls()
            .into_iter()
            .filter(|c| matches!(c, EffectCall::ShowUnlock(_) | EffectCall::HideUnlock))
            .collect();
        assert_eq!(
            popups,
            vec![
                EffectCall::ShowUnlock(AchievementId::EmotionExplorer),
                EffectCall::HideUnlock,
                EffectCall::ShowUnlock(AchievementId::PointCollector),
                EffectCall::HideUnlock,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_facts_show_and_hide() {
        let sink = Arc::new(RecordingSink::new());
        let config = EffectConfig {
            fact_probability: 1.0,
            ..Default::default()
        };
        let mut effects = dispatcher(&sink, config);
        effects.set_narration(false);

        effects.dispatch(&transition(EmotionLabel::Neutral, EmotionLabel::Fearful));
        assert_eq!(
            sink.take(),
            vec![EffectCall::ShowFact(
                EmotionLabel::Fearful.profile().fact.to_string()
            )]
        );

        tokio::time::sleep(Duration::from_millis(5_100)).await;
        assert_eq!(sink.take(), vec![EffectCall::HideFact]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_sink_is_tolerated() {
        let sink = Arc::new(RecordingSink::failing());
        let mut effects = dispatcher(&sink, EffectConfig::default());
        effects.set_ambient(true);

        effects.dispatch_all(&[
            transition(EmotionLabel::Neutral, EmotionLabel::Happy),
            unlock(AchievementId::FirstSmile),
        ]);
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(sink.count(|c| *c == EffectCall::SuccessChime), 1);
        assert_eq!(sink.count(|c| *c == EffectCall::HideUnlock), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_pending() {
        let sink = Arc::new(RecordingSink::new());
        let mut effects = dispatcher(&sink, quiet_config());
        effects.set_ambient(true);
        effects.dispatch(&unlock(AchievementId::FirstSmile));

        effects.shutdown();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(sink.count(|c| *c == EffectCall::SuccessChime), 0);
        assert_eq!(effects.ambient_state(), ToneState::Silent);
        assert_eq!(effects.scheduler().pending(), 0);
    }
}
