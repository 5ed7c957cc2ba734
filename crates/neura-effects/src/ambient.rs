//! Ambient tone lifecycle
//!
//! One continuous tone at a time, its frequency taken from the current
//! emotion. Fade completion and stop both live under [`TaskKey::AmbientTone`],
//! so any new start or stop replaces the pending one.

use std::sync::Arc;
use std::time::Duration;

use neura_core::EmotionLabel;
use parking_lot::Mutex;
use tracing::debug;

use crate::sink::report;
use crate::{EffectSink, Scheduler, TaskKey};

/// Target gain of the ambient tone after fade-in
pub const AMBIENT_GAIN: f32 = 0.1;

/// Where the ambient tone is in its lifecycle
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ToneState {
    Silent,
    FadingIn { emotion: EmotionLabel, frequency_hz: f32 },
    Playing { emotion: EmotionLabel, frequency_hz: f32 },
    FadingOut { emotion: EmotionLabel, frequency_hz: f32 },
}

impl ToneState {
    /// True while the tone is audible or ramping up
    pub fn is_sounding(&self) -> bool {
        matches!(self, ToneState::FadingIn { .. } | ToneState::Playing { .. })
    }

    pub fn emotion(&self) -> Option<EmotionLabel> {
        match *self {
            ToneState::Silent => None,
            ToneState::FadingIn { emotion, .. }
            | ToneState::Playing { emotion, .. }
            | ToneState::FadingOut { emotion, .. } => Some(emotion),
        }
    }
}

/// Fade timings
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ToneTiming {
    pub fade_in: Duration,
    pub fade_out: Duration,
    /// Delay before a fading tone counts as stopped; kept apart from `fade_out`
    pub stop_delay: Duration,
}

impl Default for ToneTiming {
    fn default() -> Self {
        ToneTiming {
            fade_in: Duration::from_millis(500),
            fade_out: Duration::from_millis(500),
            stop_delay: Duration::from_millis(500),
        }
    }
}

/// Ambient tone controller
#[derive(Clone)]
pub struct AmbientTone {
    state: Arc<Mutex<ToneState>>,
    timing: ToneTiming,
}

impl AmbientTone {
    pub fn new(timing: ToneTiming) -> Self {
        AmbientTone {
            state: Arc::new(Mutex::new(ToneState::Silent)),
            timing,
        }
    }

    pub fn state(&self) -> ToneState {
        *self.state.lock()
    }

    pub fn timing(&self) -> ToneTiming {
        self.timing
    }

    /// Cut whatever is playing and start `emotion`'s tone with a fade-in
    pub fn start(&self, sink: &dyn EffectSink, scheduler: &Scheduler, emotion: EmotionLabel) {
        let frequency_hz = emotion.tone_hz();
        let mut state = self.state.lock();

        if *state != ToneState::Silent {
            report("stop_tone", sink.stop_tone(Duration::ZERO));
        }
        report(
            "play_tone",
            sink.play_tone(frequency_hz, AMBIENT_GAIN, self.timing.fade_in),
        );
        *state = ToneState::FadingIn {
            emotion,
            frequency_hz,
        };
        debug!(%emotion, frequency_hz, "ambient tone started");

        let shared = self.state.clone();
        scheduler.schedule(TaskKey::AmbientTone, self.timing.fade_in, move || {
            let mut state = shared.lock();
            if let ToneState::FadingIn {
                emotion,
                frequency_hz,
            } = *state
            {
                *state = ToneState::Playing {
                    emotion,
                    frequency_hz,
                };
            }
        });
    }

    /// Fade out and stop; no-op when already silent or fading out
    pub fn stop(&self, sink: &dyn EffectSink, scheduler: &Scheduler) {
        let mut state = self.state.lock();
        let (emotion, frequency_hz) = match *state {
            ToneState::Silent | ToneState::FadingOut { .. } => return,
            ToneState::FadingIn {
                emotion,
                frequency_hz,
            }
            | ToneState::Playing {
                emotion,
                frequency_hz,
            } => (emotion, frequency_hz),
        };

        report("stop_tone", sink.stop_tone(self.timing.fade_out));
        *state = ToneState::FadingOut {
            emotion,
            frequency_hz,
        };
        debug!(%emotion, "ambient tone fading out");

        let shared = self.state.clone();
        scheduler.schedule(TaskKey::AmbientTone, self.timing.stop_delay, move || {
            let mut state = shared.lock();
            if matches!(*state, ToneState::FadingOut { .. }) {
                *state = ToneState::Silent;
            }
        });
    }

    /// Hard stop without a fade
    pub fn halt(&self, sink: &dyn EffectSink, scheduler: &Scheduler) {
        scheduler.cancel(TaskKey::AmbientTone);
        let mut state = self.state.lock();
        if *state != ToneState::Silent {
            report("stop_tone", sink.stop_tone(Duration::ZERO));
            *state = ToneState::Silent;
        }
    }
}

impl Default for AmbientTone {
    fn default() -> Self {
        Self::new(ToneTiming::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EffectCall, RecordingSink};

    #[tokio::test(start_paused = true)]
    async fn test_fade_in_then_playing() {
        let sink = RecordingSink::new();
        let scheduler = Scheduler::new();
        let tone = AmbientTone::default();

        tone.start(&sink, &scheduler, EmotionLabel::Happy);
        assert!(matches!(tone.state(), ToneState::FadingIn { .. }));
        assert_eq!(
            sink.calls(),
            vec![EffectCall::PlayTone {
                frequency_hz: 440.0,
                gain: AMBIENT_GAIN,
                fade_in: Duration::from_millis(500)
            }]
        );

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(
            tone.state(),
            ToneState::Playing {
                emotion: EmotionLabel::Happy,
                frequency_hz: 440.0
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_transition_cuts_previous_tone() {
        let sink = RecordingSink::new();
        let scheduler = Scheduler::new();
        let tone = AmbientTone::default();

        tone.start(&sink, &scheduler, EmotionLabel::Happy);
        tokio::time::sleep(Duration::from_secs(1)).await;
        sink.take();

        tone.start(&sink, &scheduler, EmotionLabel::Sad);
        assert_eq!(
            sink.take(),
            vec![
                EffectCall::StopTone {
                    fade_out: Duration::ZERO
                },
                EffectCall::PlayTone {
                    frequency_hz: 220.0,
                    gain: AMBIENT_GAIN,
                    fade_in: Duration::from_millis(500)
                },
            ]
        );
        assert_eq!(tone.state().emotion(), Some(EmotionLabel::Sad));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_fades_then_silent() {
        let sink = RecordingSink::new();
        let scheduler = Scheduler::new();
        let tone = AmbientTone::default();

        tone.start(&sink, &scheduler, EmotionLabel::Neutral);
        tokio::time::sleep(Duration::from_secs(1)).await;
        sink.take();

        tone.stop(&sink, &scheduler);
        tone.stop(&sink, &scheduler);
        assert_eq!(
            sink.take(),
            vec![EffectCall::StopTone {
                fade_out: Duration::from_millis(500)
            }]
        );
        assert!(matches!(tone.state(), ToneState::FadingOut { .. }));

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(tone.state(), ToneState::Silent);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_toggle_keeps_fades() {
        let sink = RecordingSink::new();
        let scheduler = Scheduler::new();
        let tone = AmbientTone::default();

        // Stop during fade-in, restart during fade-out
        tone.start(&sink, &scheduler, EmotionLabel::Angry);
        tokio::time::sleep(Duration::from_millis(100)).await;
        tone.stop(&sink, &scheduler);
        tokio::time::sleep(Duration::from_millis(100)).await;
        tone.start(&sink, &scheduler, EmotionLabel::Angry);

        tokio::time::sleep(Duration::from_secs(2)).await;
        // The pending stop was replaced, the restarted tone keeps playing
        assert!(matches!(tone.state(), ToneState::Playing { .. }));
        assert_eq!(
            sink.count(|c| matches!(c, EffectCall::StopTone { fade_out } if *fade_out == Duration::from_millis(500))),
            1
        );
        assert_eq!(sink.count(|c| matches!(c, EffectCall::PlayTone { .. })), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_halt_is_immediate() {
        let sink = RecordingSink::new();
        let scheduler = Scheduler::new();
        let tone = AmbientTone::default();

        tone.start(&sink, &scheduler, EmotionLabel::Fearful);
        tone.halt(&sink, &scheduler);
        assert_eq!(tone.state(), ToneState::Silent);
        assert!(!scheduler.is_pending(TaskKey::AmbientTone));
    }
}
