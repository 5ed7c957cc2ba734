//! Pipeline driver - the cooperative detection loop
//!
//! Ticks on a `tokio::time::interval` (missed ticks are skipped, never
//! bursted). A stop signal wins over both the next tick and an in-flight
//! inference; a result that arrives after stop is dropped unprocessed.

use std::sync::Arc;
use std::time::{Duration, Instant};

use neura_core::{NeuraResult, SessionEvent, Timestamp};
use neura_effects::{EffectDispatcher, EffectSink};
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::{
    Detector, FrameSampler, FrameSource, Sample, SamplerStats, Session, SessionConfig,
    SessionSnapshot, SessionStats, Settings, SettingsHandle,
};

/// Outcome of one tick
#[derive(Debug, Clone, PartialEq)]
pub enum Tick {
    /// A frame was classified and run through the session
    Processed(Vec<SessionEvent>),
    /// Source not ready
    Deferred,
    /// Inference failed
    Skipped,
    Ended,
}

/// Requests a running loop to stop
#[derive(Clone, Debug)]
pub struct StopHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Listener side of [`StopHandle`]
#[derive(Clone, Debug)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

impl StopSignal {
    /// Resolves once stop was requested. Never resolves if every handle is dropped.
    pub async fn stopped(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

pub fn stop_channel() -> (StopHandle, StopSignal) {
    let (tx, rx) = watch::channel(false);
    (StopHandle { tx: Arc::new(tx) }, StopSignal { rx })
}

/// Totals for a finished run
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunSummary {
    pub ticks: u64,
    pub session: SessionStats,
    pub sampler: SamplerStats,
    #[serde(skip)]
    pub last_tick_duration: Duration,
}

/// Owns one session and drives it from a frame source
pub struct Pipeline<S, D> {
    session: Session,
    sampler: FrameSampler<S, D>,
    effects: EffectDispatcher,
    settings: watch::Receiver<Settings>,
    handle: SettingsHandle,
    config: SessionConfig,
    ticks: u64,
    last_tick_duration: Duration,
}

impl<S, D> Pipeline<S, D>
where
    S: FrameSource,
    D: Detector<S::Frame>,
{
    pub fn new(
        config: SessionConfig,
        source: S,
        detector: D,
        sink: Arc<dyn EffectSink>,
    ) -> NeuraResult<Self> {
        config.validate()?;

        let (handle, settings) = SettingsHandle::new(config.settings);
        let effects = match config.seed {
            Some(seed) => EffectDispatcher::with_seed(sink, config.effect_config(), seed),
            None => EffectDispatcher::new(sink, config.effect_config()),
        };

        Ok(Pipeline {
            session: Session::with_config(&config),
            sampler: FrameSampler::new(source, detector),
            effects,
            settings,
            handle,
            config,
            ticks: 0,
            last_tick_duration: Duration::ZERO,
        })
    }

    /// Handle for changing settings while the loop runs
    pub fn settings_handle(&self) -> SettingsHandle {
        self.handle.clone()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn effects(&self) -> &EffectDispatcher {
        &self.effects
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    pub fn reset_streak(&mut self) {
        self.session.reset_streak();
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            ticks: self.ticks,
            session: self.session.stats().clone(),
            sampler: self.sampler.stats().clone(),
            last_tick_duration: self.last_tick_duration,
        }
    }

    /// Run a single tick without waiting for the interval
    pub async fn step(&mut self) -> Tick {
        self.begin_tick();
        let sample = self.sampler.sample().await;
        self.finish_tick(sample)
    }

    /// Tick until the source ends or `stop` fires, then silence all effects
    pub async fn run(&mut self, mut stop: StopSignal) -> RunSummary {
        let mut ticker = tokio::time::interval(self.config.refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(
            refresh_ms = self.config.refresh_interval.as_millis() as u64,
            "detection loop started"
        );

        loop {
            tokio::select! {
                biased;
                _ = stop.stopped() => break,
                _ = ticker.tick() => {}
            }

            self.begin_tick();
            let sample = tokio::select! {
                biased;
                _ = stop.stopped() => {
                    debug!("stopped during inference, result discarded");
                    break;
                }
                sample = self.sampler.sample() => sample,
            };

            if self.finish_tick(sample) == Tick::Ended {
                info!("frame source ended");
                break;
            }
        }

        self.effects.shutdown();
        let summary = self.summary();
        info!(
            ticks = summary.ticks,
            transitions = summary.session.transitions,
            "detection loop stopped"
        );
        summary
    }

    fn begin_tick(&mut self) {
        self.ticks += 1;

        // Stage 1: Apply live settings
        let settings = *self.settings.borrow_and_update();
        self.session.set_sensitivity(settings.sensitivity());
        self.effects.set_narration(settings.narration_enabled);
        self.effects.set_ambient(settings.ambient_enabled);
    }

    fn finish_tick(&mut self, sample: Sample) -> Tick {
        let start = Instant::now();

        let tick = match sample {
            Sample::NotReady => Tick::Deferred,
            Sample::Failed(_) => Tick::Skipped,
            Sample::Ended => Tick::Ended,
            Sample::Classified(result) => {
                // Stages 4-6: stabilize, record, gamify
                let events = self.session.process(result.as_ref(), Timestamp::now());
                // Stage 7: dispatch effects
                self.effects.dispatch_all(&events);
                Tick::Processed(events)
            }
        };

        self.last_tick_duration = start.elapsed();
        tick
    }
}
