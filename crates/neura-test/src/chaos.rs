//! Chaos testing for the detection pipeline
//!
//! Simulates a hostile camera and inference backend:
//! - Inference failures
//! - Dropped faces
//! - Score noise
//! - Variable inference latency
//! - Source stalls (not-ready ticks)
//!
//! Everything is driven by a seeded `StdRng`, so a failing run replays exactly.

use std::time::Duration;

use neura_core::{Detection, EmotionLabel, NeuraError, NeuraResult};
use neura_runtime::{Detector, FramePoll, FrameSource};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Chaos configuration
#[derive(Clone, Debug, PartialEq)]
pub struct ChaosConfig {
    /// Probability an inference call errors (0.0 - 1.0)
    pub failure_rate: f64,
    /// Probability a face is reported missing
    pub drop_face_rate: f64,
    /// Max absolute noise added to every score
    pub score_noise: f32,
    pub base_latency: Duration,
    /// Uniform extra latency, up to this much
    pub latency_jitter: Duration,
    /// Probability the source is not ready on a tick
    pub stall_rate: f64,
}

impl Default for ChaosConfig {
    fn default() -> Self {
        ChaosConfig {
            failure_rate: 0.05,
            drop_face_rate: 0.05,
            score_noise: 0.05,
            base_latency: Duration::from_millis(5),
            latency_jitter: Duration::from_millis(10),
            stall_rate: 0.05,
        }
    }
}

impl ChaosConfig {
    /// No chaos at all
    pub fn none() -> Self {
        ChaosConfig {
            failure_rate: 0.0,
            drop_face_rate: 0.0,
            score_noise: 0.0,
            base_latency: Duration::ZERO,
            latency_jitter: Duration::ZERO,
            stall_rate: 0.0,
        }
    }

    /// Good lighting, fast backend
    pub fn good() -> Self {
        ChaosConfig {
            failure_rate: 0.001,
            drop_face_rate: 0.01,
            score_noise: 0.02,
            base_latency: Duration::from_millis(2),
            latency_jitter: Duration::from_millis(3),
            stall_rate: 0.01,
        }
    }

    /// Poor lighting, overloaded backend
    pub fn poor() -> Self {
        ChaosConfig {
            failure_rate: 0.1,
            drop_face_rate: 0.2,
            score_noise: 0.15,
            base_latency: Duration::from_millis(20),
            latency_jitter: Duration::from_millis(40),
            stall_rate: 0.1,
        }
    }

    /// Everything goes wrong, often
    pub fn hostile() -> Self {
        ChaosConfig {
            failure_rate: 0.4,
            drop_face_rate: 0.3,
            score_noise: 0.3,
            base_latency: Duration::from_millis(50),
            latency_jitter: Duration::from_millis(100),
            stall_rate: 0.3,
        }
    }
}

/// Chaos statistics
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChaosStats {
    pub calls: u64,
    pub failures: u64,
    pub faces_dropped: u64,
    pub stalls: u64,
}

impl ChaosStats {
    pub fn failure_rate(&self) -> f64 {
        if self.calls == 0 {
            0.0
        } else {
            self.failures as f64 / self.calls as f64
        }
    }
}

/// Wraps a detector and corrupts its output
pub struct ChaosDetector<D> {
    inner: D,
    config: ChaosConfig,
    rng: StdRng,
    stats: ChaosStats,
}

impl<D> ChaosDetector<D> {
    pub fn new(inner: D, config: ChaosConfig, seed: u64) -> Self {
        ChaosDetector {
            inner,
            config,
            rng: StdRng::seed_from_u64(seed),
            stats: ChaosStats::default(),
        }
    }

    pub fn stats(&self) -> &ChaosStats {
        &self.stats
    }

    fn latency(&mut self) -> Duration {
        let jitter = self.config.latency_jitter.as_micros() as u64;
        let extra = if jitter == 0 {
            0
        } else {
            self.rng.gen_range(0..=jitter)
        };
        self.config.base_latency + Duration::from_micros(extra)
    }

    fn corrupt(&mut self, mut detections: Vec<Detection>) -> Vec<Detection> {
        if !detections.is_empty() && self.rng.gen_bool(self.config.drop_face_rate) {
            self.stats.faces_dropped += 1;
            return Vec::new();
        }

        let noise = self.config.score_noise;
        if noise > 0.0 {
            for detection in &mut detections {
                for label in EmotionLabel::ALL {
                    let p = detection.expressions.get(label);
                    let delta = self.rng.gen_range(-noise..=noise);
                    detection.expressions.set(label, p + delta);
                }
            }
        }
        detections
    }
}

impl<F, D> Detector<F> for ChaosDetector<D>
where
    F: Sync,
    D: Detector<F>,
{
    async fn detect(&mut self, frame: &F) -> NeuraResult<Vec<Detection>> {
        self.stats.calls += 1;

        let latency = self.latency();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if self.rng.gen_bool(self.config.failure_rate) {
            self.stats.failures += 1;
            return Err(NeuraError::InferenceFailed(format!(
                "chaos: injected failure on call {}",
                self.stats.calls
            )));
        }

        let detections = self.inner.detect(frame).await?;
        Ok(self.corrupt(detections))
    }
}

/// Wraps a frame source and stalls it at random
pub struct ChaosFrames<S> {
    inner: S,
    stall_rate: f64,
    rng: StdRng,
    stalls: u64,
}

impl<S> ChaosFrames<S> {
    pub fn new(inner: S, config: &ChaosConfig, seed: u64) -> Self {
        ChaosFrames {
            inner,
            stall_rate: config.stall_rate,
            rng: StdRng::seed_from_u64(seed),
            stalls: 0,
        }
    }

    pub fn stalls(&self) -> u64 {
        self.stalls
    }
}

impl<S: FrameSource> FrameSource for ChaosFrames<S> {
    type Frame = S::Frame;

    fn poll_frame(&mut self) -> FramePoll<S::Frame> {
        if self.rng.gen_bool(self.stall_rate) {
            self.stalls += 1;
            return FramePoll::NotReady;
        }
        self.inner.poll_frame()
    }
}
