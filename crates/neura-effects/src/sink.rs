//! Effect sink - the outbound capabilities
//!
//! Implementations wrap whatever actually speaks, plays tones or draws
//! particles. All calls are fire-and-forget; errors are reported back only
//! so the dispatcher can log them.

use std::time::Duration;

use neura_core::{Achievement, AchievementId};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info};

use crate::CelebrationBurst;

/// Effect failure
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EffectError {
    #[error("Capability unsupported: {0}")]
    Unsupported(&'static str),

    #[error("Effect failed: {0}")]
    Failed(String),
}

pub type EffectResult = Result<(), EffectError>;

/// Outbound audio/narration/celebration capabilities
pub trait EffectSink: Send + Sync {
    /// Speak narration text
    fn speak(&self, text: &str) -> EffectResult;

    /// Cancel any in-flight narration
    fn cancel_speech(&self) -> EffectResult;

    /// Start a continuous tone, ramping linearly from silence to `gain`
    fn play_tone(&self, frequency_hz: f32, gain: f32, fade_in: Duration) -> EffectResult;

    /// Fade the current tone out and stop it
    fn stop_tone(&self, fade_out: Duration) -> EffectResult;

    /// Short ascending three-note success tone
    fn play_success_chime(&self) -> EffectResult;

    /// Show a batch of ephemeral particles
    fn spawn_celebration(&self, burst: &CelebrationBurst) -> EffectResult;

    /// Popups and facts are optional; sinks without a screen keep the defaults
    fn show_unlock(&self, _achievement: &Achievement) -> EffectResult {
        Err(EffectError::Unsupported("popup"))
    }

    fn hide_unlock(&self) -> EffectResult {
        Err(EffectError::Unsupported("popup"))
    }

    fn show_fact(&self, _text: &str) -> EffectResult {
        Err(EffectError::Unsupported("fact"))
    }

    fn hide_fact(&self) -> EffectResult {
        Err(EffectError::Unsupported("fact"))
    }
}

/// Sink that does nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EffectSink for NullSink {
    fn speak(&self, _text: &str) -> EffectResult {
        Ok(())
    }

    fn cancel_speech(&self) -> EffectResult {
        Ok(())
    }

    fn play_tone(&self, _frequency_hz: f32, _gain: f32, _fade_in: Duration) -> EffectResult {
        Ok(())
    }

    fn stop_tone(&self, _fade_out: Duration) -> EffectResult {
        Ok(())
    }

    fn play_success_chime(&self) -> EffectResult {
        Ok(())
    }

    fn spawn_celebration(&self, _burst: &CelebrationBurst) -> EffectResult {
        Ok(())
    }

    fn show_unlock(&self, _achievement: &Achievement) -> EffectResult {
        Ok(())
    }

    fn hide_unlock(&self) -> EffectResult {
        Ok(())
    }

    fn show_fact(&self, _text: &str) -> EffectResult {
        Ok(())
    }

    fn hide_fact(&self) -> EffectResult {
        Ok(())
    }
}

/// Sink that reports every effect through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EffectSink for LogSink {
    fn speak(&self, text: &str) -> EffectResult {
        info!(text, "speak");
        Ok(())
    }

    fn cancel_speech(&self) -> EffectResult {
        debug!("cancel speech");
        Ok(())
    }

    fn play_tone(&self, frequency_hz: f32, gain: f32, fade_in: Duration) -> EffectResult {
        info!(frequency_hz, gain, fade_in_ms = fade_in.as_millis() as u64, "play tone");
        Ok(())
    }

    fn stop_tone(&self, fade_out: Duration) -> EffectResult {
        info!(fade_out_ms = fade_out.as_millis() as u64, "stop tone");
        Ok(())
    }

    fn play_success_chime(&self) -> EffectResult {
        info!("success chime");
        Ok(())
    }

    fn spawn_celebration(&self, burst: &CelebrationBurst) -> EffectResult {
        info!(burst = burst.id, particles = burst.particles.len(), "celebration");
        Ok(())
    }

    fn show_unlock(&self, achievement: &Achievement) -> EffectResult {
        info!(achievement = %achievement.id, name = achievement.name, "show unlock");
        Ok(())
    }

    fn hide_unlock(&self) -> EffectResult {
        debug!("hide unlock");
        Ok(())
    }

    fn show_fact(&self, text: &str) -> EffectResult {
        info!(text, "show fact");
        Ok(())
    }

    fn hide_fact(&self) -> EffectResult {
        debug!("hide fact");
        Ok(())
    }
}

/// A recorded sink call
#[derive(Debug, Clone, PartialEq)]
pub enum EffectCall {
    Speak(String),
    CancelSpeech,
    PlayTone {
        frequency_hz: f32,
        gain: f32,
        fade_in: Duration,
    },
    StopTone { fade_out: Duration },
    SuccessChime,
    Celebration { particles: usize },
    ShowUnlock(AchievementId),
    HideUnlock,
    ShowFact(String),
    HideFact,
}

/// Sink that records calls in order, optionally failing every one of them
#[derive(Debug, Default)]
pub struct RecordingSink {
    calls: Mutex<Vec<EffectCall>>,
    failing: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records calls but reports every one as failed
    pub fn failing() -> Self {
        RecordingSink {
            calls: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    pub fn calls(&self) -> Vec<EffectCall> {
        self.calls.lock().clone()
    }

    pub fn take(&self) -> Vec<EffectCall> {
        std::mem::take(&mut *self.calls.lock())
    }

    pub fn count(&self, predicate: impl Fn(&EffectCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| predicate(c)).count()
    }

    fn record(&self, call: EffectCall, capability: &'static str) -> EffectResult {
        self.calls.lock().push(call);
        if self.failing {
            Err(EffectError::Failed(format!("{} device unavailable", capability)))
        } else {
            Ok(())
        }
    }
}

impl EffectSink for RecordingSink {
    fn speak(&self, text: &str) -> EffectResult {
        self.record(EffectCall::Speak(text.to_string()), "speech")
    }

    fn cancel_speech(&self) -> EffectResult {
        self.record(EffectCall::CancelSpeech, "speech")
    }

    fn play_tone(&self, frequency_hz: f32, gain: f32, fade_in: Duration) -> EffectResult {
        self.record(
            EffectCall::PlayTone {
                frequency_hz,
                gain,
                fade_in,
            },
            "tone",
        )
    }

    fn stop_tone(&self, fade_out: Duration) -> EffectResult {
        self.record(EffectCall::StopTone { fade_out }, "tone")
    }

    fn play_success_chime(&self) -> EffectResult {
        self.record(EffectCall::SuccessChime, "chime")
    }

    fn spawn_celebration(&self, burst: &CelebrationBurst) -> EffectResult {
        self.record(
            EffectCall::Celebration {
                particles: burst.particles.len(),
            },
            "celebration",
        )
    }

    fn show_unlock(&self, achievement: &Achievement) -> EffectResult {
        self.record(EffectCall::ShowUnlock(achievement.id), "popup")
    }

    fn hide_unlock(&self) -> EffectResult {
        self.record(EffectCall::HideUnlock, "popup")
    }

    fn show_fact(&self, text: &str) -> EffectResult {
        self.record(EffectCall::ShowFact(text.to_string()), "fact")
    }

    fn hide_fact(&self) -> EffectResult {
        self.record(EffectCall::HideFact, "fact")
    }
}

/// Log a failed effect and carry on
pub(crate) fn report(effect: &'static str, result: EffectResult) {
    if let Err(e) = result {
        debug!(effect, error = %e, "effect failed, continuing");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_records_in_order() {
        let sink = RecordingSink::new();
        sink.cancel_speech().unwrap();
        sink.speak("hello").unwrap();
        sink.play_tone(440.0, 0.1, Duration::from_millis(500)).unwrap();

        assert_eq!(
            sink.take(),
            vec![
                EffectCall::CancelSpeech,
                EffectCall::Speak("hello".to_string()),
                EffectCall::PlayTone {
                    frequency_hz: 440.0,
                    gain: 0.1,
                    fade_in: Duration::from_millis(500)
                },
            ]
        );
        assert!(sink.calls().is_empty());
    }

    #[test]
    fn test_failing_sink_still_records() {
        let sink = RecordingSink::failing();
        assert_eq!(
            sink.speak("x"),
            Err(EffectError::Failed("speech device unavailable".to_string()))
        );
        assert_eq!(sink.count(|c| matches!(c, EffectCall::Speak(_))), 1);
    }

    /// Audio only, no screen
    struct SpeakerSink;

    impl EffectSink for SpeakerSink {
        fn speak(&self, _text: &str) -> EffectResult {
            Ok(())
        }

        fn cancel_speech(&self) -> EffectResult {
            Ok(())
        }

        fn play_tone(&self, _frequency_hz: f32, _gain: f32, _fade_in: Duration) -> EffectResult {
            Ok(())
        }

        fn stop_tone(&self, _fade_out: Duration) -> EffectResult {
            Ok(())
        }

        fn play_success_chime(&self) -> EffectResult {
            Ok(())
        }

        fn spawn_celebration(&self, _burst: &CelebrationBurst) -> EffectResult {
            Ok(())
        }
    }

    #[test]
    fn test_screen_capabilities_default_to_unsupported() {
        let sink = SpeakerSink;
        assert_eq!(sink.show_fact("fact"), Err(EffectError::Unsupported("fact")));
        assert_eq!(sink.hide_unlock(), Err(EffectError::Unsupported("popup")));
        assert_eq!(
            sink.show_unlock(&Achievement::new(AchievementId::FirstSmile)),
            Err(EffectError::Unsupported("popup"))
        );
    }

    #[test]
    fn test_null_sink_accepts_everything() {
        let sink = NullSink;
        assert!(sink.show_fact("fact").is_ok());
        assert!(sink.hide_unlock().is_ok());
        assert!(sink.play_tone(220.0, 0.1, Duration::ZERO).is_ok());
    }
}
