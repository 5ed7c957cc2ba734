//! Session configuration and live settings
//!
//! [`SessionConfig`] is fixed for the life of a session and can be loaded
//! from JSON, with durations written the human way ("16ms", "4s").
//! [`Settings`] are the user-facing toggles; they are published on a
//! `tokio::sync::watch` channel and re-read on every tick.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use neura_core::{NeuraError, NeuraResult};
use neura_effects::{EffectConfig, ToneTiming, DEFAULT_PARTICLE_COUNT};
use neura_state::{Sensitivity, DEFAULT_SENSITIVITY, HISTORY_CAPACITY};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::TelemetryConfig;

/// User-facing toggles, changeable at any time
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// 1-100; out-of-range values are clamped when applied
    pub sensitivity: i64,
    pub narration_enabled: bool,
    pub ambient_enabled: bool,
}

impl Settings {
    pub fn sensitivity(&self) -> Sensitivity {
        Sensitivity::new(self.sensitivity)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            sensitivity: DEFAULT_SENSITIVITY as i64,
            narration_enabled: false,
            ambient_enabled: false,
        }
    }
}

/// Session configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Sampling cadence (one display refresh)
    #[serde(with = "human_duration")]
    pub refresh_interval: Duration,
    /// Settings in force when the session starts
    pub settings: Settings,
    pub history_capacity: usize,
    #[serde(with = "human_duration")]
    pub fade_in: Duration,
    #[serde(with = "human_duration")]
    pub fade_out: Duration,
    /// Delay before a fading tone is stopped
    #[serde(with = "human_duration")]
    pub stop_delay: Duration,
    #[serde(with = "human_duration")]
    pub celebration_delay: Duration,
    #[serde(with = "human_duration")]
    pub popup_duration: Duration,
    #[serde(with = "human_duration")]
    pub fact_duration: Duration,
    pub fact_probability: f64,
    pub particle_count: usize,
    /// Seed for particles and facts; random when absent
    pub seed: Option<u64>,
    pub telemetry: TelemetryConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let effects = EffectConfig::default();
        SessionConfig {
            refresh_interval: Duration::from_millis(16),
            settings: Settings::default(),
            history_capacity: HISTORY_CAPACITY,
            fade_in: effects.tone.fade_in,
            fade_out: effects.tone.fade_out,
            stop_delay: effects.tone.stop_delay,
            celebration_delay: effects.celebration_delay,
            popup_duration: effects.popup_duration,
            fact_duration: effects.fact_duration,
            fact_probability: effects.fact_probability,
            particle_count: DEFAULT_PARTICLE_COUNT,
            seed: None,
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Fast ticks, no effect delays, no facts, fixed seed
    pub fn headless() -> Self {
        let effects = EffectConfig::immediate();
        SessionConfig {
            refresh_interval: Duration::from_millis(1),
            fade_in: effects.tone.fade_in,
            fade_out: effects.tone.fade_out,
            stop_delay: effects.tone.stop_delay,
            celebration_delay: effects.celebration_delay,
            popup_duration: effects.popup_duration,
            fact_duration: effects.fact_duration,
            fact_probability: effects.fact_probability,
            seed: Some(0),
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> NeuraResult<Self> {
        let config: SessionConfig =
            serde_json::from_str(json).map_err(|e| NeuraError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> NeuraResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            NeuraError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> NeuraResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| NeuraError::InvalidConfig(e.to_string()))
    }

    /// Reject values that cannot be clamped into meaning
    ///
    /// Sensitivity is deliberately not checked here; it is clamped on use.
    pub fn validate(&self) -> NeuraResult<()> {
        if self.refresh_interval.is_zero() {
            return Err(NeuraError::InvalidConfig(
                "refresh_interval must be non-zero".into(),
            ));
        }
        if self.history_capacity == 0 {
            return Err(NeuraError::InvalidConfig(
                "history_capacity must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.fact_probability) {
            return Err(NeuraError::InvalidConfig(format!(
                "fact_probability {} outside [0, 1]",
                self.fact_probability
            )));
        }
        Ok(())
    }

    pub fn effect_config(&self) -> EffectConfig {
        EffectConfig {
            tone: ToneTiming {
                fade_in: self.fade_in,
                fade_out: self.fade_out,
                stop_delay: self.stop_delay,
            },
            celebration_delay: self.celebration_delay,
            popup_duration: self.popup_duration,
            fact_duration: self.fact_duration,
            fact_probability: self.fact_probability,
            particle_count: self.particle_count,
        }
    }
}

/// Publisher side of the live settings
#[derive(Clone, Debug)]
pub struct SettingsHandle {
    tx: Arc<watch::Sender<Settings>>,
}

impl SettingsHandle {
    pub fn new(initial: Settings) -> (Self, watch::Receiver<Settings>) {
        let (tx, rx) = watch::channel(initial);
        (SettingsHandle { tx: Arc::new(tx) }, rx)
    }

    pub fn current(&self) -> Settings {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Settings> {
        self.tx.subscribe()
    }

    pub fn update(&self, f: impl FnOnce(&mut Settings)) {
        self.tx.send_modify(f);
    }

    pub fn set_sensitivity(&self, sensitivity: i64) {
        self.update(|s| s.sensitivity = sensitivity);
    }

    pub fn set_narration(&self, enabled: bool) {
        self.update(|s| s.narration_enabled = enabled);
    }

    pub fn set_ambient(&self, enabled: bool) {
        self.update(|s| s.ambient_enabled = enabled);
    }
}

/// `Duration` as a humantime string
mod human_duration {
    use std::time::Duration;

    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(D::Error::custom)
    }
}
