//! Scripted sessions
//!
//! An [`EmotionScript`] is a list of frames built up from segments ("hold
//! happy at 0.8 for 30 frames, then lose the face for 5"). It can be played
//! through the async pipeline via [`ScriptedFrames`] + [`ScriptedDetector`],
//! or straight into a [`Session`] with [`SessionSimulator`].

use std::collections::VecDeque;
use std::time::Duration;

use neura_core::{
    BoundingBox, Detection, EmotionLabel, ExpressionScores, NeuraResult, SessionEvent, Timestamp,
};
use neura_runtime::{Detector, FramePoll, FrameSource, Session, SessionConfig, SessionSnapshot};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A simulated video frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimFrame {
    pub seq: u64,
    /// What the detector will report; `None` is an empty frame
    pub scores: Option<ExpressionScores>,
}

/// Frame-by-frame script
#[derive(Clone, Debug, Default)]
pub struct EmotionScript {
    polls: Vec<FramePoll<Option<ExpressionScores>>>,
}

impl EmotionScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// `frames` identical frames with a single dominant label
    pub fn hold(mut self, label: EmotionLabel, probability: f32, frames: usize) -> Self {
        let scores = ExpressionScores::single(label, probability);
        self.polls
            .extend(std::iter::repeat(FramePoll::Ready(Some(scores))).take(frames));
        self
    }

    /// Frames with explicit scores
    pub fn frame(mut self, scores: ExpressionScores) -> Self {
        self.polls.push(FramePoll::Ready(Some(scores)));
        self
    }

    pub fn no_face(mut self, frames: usize) -> Self {
        self.polls
            .extend(std::iter::repeat(FramePoll::Ready(None)).take(frames));
        self
    }

    /// Ticks where the source has no data yet
    pub fn not_ready(mut self, ticks: usize) -> Self {
        self.polls
            .extend(std::iter::repeat(FramePoll::NotReady).take(ticks));
        self
    }

    /// Dominant label plus low background scores on the others
    pub fn noisy(
        mut self,
        label: EmotionLabel,
        probability: f32,
        frames: usize,
        rng: &mut StdRng,
    ) -> Self {
        for _ in 0..frames {
            let mut scores = ExpressionScores::new();
            for other in EmotionLabel::ALL {
                scores.set(other, rng.gen_range(0.0..0.2));
            }
            scores.set(label, (probability + rng.gen_range(-0.05..0.05)).clamp(0.0, 1.0));
            self.polls.push(FramePoll::Ready(Some(scores)));
        }
        self
    }

    /// One transition through every label, starting at happy
    pub fn tour(self, probability: f32, frames_each: usize) -> Self {
        EmotionLabel::ALL
            .iter()
            .cycle()
            .skip(1)
            .take(EmotionLabel::COUNT)
            .fold(self, |script, label| script.hold(*label, probability, frames_each))
    }

    pub fn len(&self) -> usize {
        self.polls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polls.is_empty()
    }

    pub fn polls(&self) -> &[FramePoll<Option<ExpressionScores>>] {
        &self.polls
    }

    /// Classification results the stabilizer would see; not-ready ticks are dropped
    pub fn classifications(&self) -> impl Iterator<Item = Option<ExpressionScores>> + '_ {
        self.polls.iter().filter_map(|poll| match poll {
            FramePoll::Ready(scores) => Some(*scores),
            _ => None,
        })
    }
}

/// Frame source playing an [`EmotionScript`]
#[derive(Debug)]
pub struct ScriptedFrames {
    polls: VecDeque<FramePoll<Option<ExpressionScores>>>,
    next_seq: u64,
}

impl ScriptedFrames {
    pub fn new(script: &EmotionScript) -> Self {
        ScriptedFrames {
            polls: script.polls.iter().cloned().collect(),
            next_seq: 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.polls.len()
    }
}

impl FrameSource for ScriptedFrames {
    type Frame = SimFrame;

    fn poll_frame(&mut self) -> FramePoll<SimFrame> {
        match self.polls.pop_front() {
            Some(FramePoll::Ready(scores)) => {
                let seq = self.next_seq;
                self.next_seq += 1;
                FramePoll::Ready(SimFrame { seq, scores })
            }
            Some(FramePoll::NotReady) => FramePoll::NotReady,
            Some(FramePoll::Ended) | None => FramePoll::Ended,
        }
    }
}

/// Detector reporting exactly what the frame carries
#[derive(Debug, Clone, Default)]
pub struct ScriptedDetector {
    latency: Duration,
    /// Extra faces appended after the scripted one
    extra_faces: usize,
}

impl ScriptedDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Add background faces that must be ignored
    pub fn with_extra_faces(mut self, count: usize) -> Self {
        self.extra_faces = count;
        self
    }
}

impl Detector<SimFrame> for ScriptedDetector {
    async fn detect(&mut self, frame: &SimFrame) -> NeuraResult<Vec<Detection>> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let Some(scores) = frame.scores else {
            return Ok(Vec::new());
        };

        let mut detections = vec![Detection::new(
            BoundingBox::new(100.0, 80.0, 120.0, 120.0),
            scores,
        )];
        detections.extend((0..self.extra_faces).map(|i| {
            Detection::new(
                BoundingBox::new(300.0 + 130.0 * i as f32, 80.0, 60.0, 60.0),
                ExpressionScores::single(EmotionLabel::Surprised, 1.0),
            )
        }));
        Ok(detections)
    }
}

/// Plays a script straight into a [`Session`], no runtime needed
pub struct SessionSimulator {
    session: Session,
    clock: Timestamp,
    frame_interval: Duration,
    events: Vec<SessionEvent>,
}

impl SessionSimulator {
    pub fn new(config: &SessionConfig) -> Self {
        SessionSimulator {
            session: Session::with_config(config),
            clock: Timestamp::ZERO,
            frame_interval: config.refresh_interval,
            events: Vec::new(),
        }
    }

    pub fn run(&mut self, script: &EmotionScript) -> &[SessionEvent] {
        let start = self.events.len();
        for scores in script.classifications() {
            self.clock = self.clock + self.frame_interval;
            let events = self.session.process(scores.as_ref(), self.clock);
            self.events.extend(events);
        }
        &self.events[start..]
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    /// Every event so far
    pub fn events(&self) -> &[SessionEvent] {
        &self.events
    }

    pub fn count(&self, kind: &str) -> usize {
        self.events.iter().filter(|e| e.kind() == kind).count()
    }

    pub fn clock(&self) -> Timestamp {
        self.clock
    }
}

/// Seeded rng for scripts
pub fn script_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_script_builder() {
        let script = EmotionScript::new()
            .not_ready(2)
            .hold(EmotionLabel::Happy, 0.8, 3)
            .no_face(1);
        assert_eq!(script.len(), 6);
        assert_eq!(script.classifications().count(), 4);
    }

    #[test]
    fn test_tour_covers_every_label() {
        let script = EmotionScript::new().tour(0.9, 1);
        let labels: Vec<_> = script
            .classifications()
            .map(|s| s.unwrap().dominant().0)
            .collect();
        assert_eq!(labels.len(), 7);
        assert_eq!(labels[0], EmotionLabel::Happy);
        assert_eq!(*labels.last().unwrap(), EmotionLabel::Neutral);
    }

    #[test]
    fn test_simulator_clock_and_events() {
        let mut sim = SessionSimulator::new(&SessionConfig::default());
        sim.run(&EmotionScript::new().hold(EmotionLabel::Happy, 0.6, 5));

        assert_eq!(sim.count("transition"), 1);
        assert_eq!(sim.count("refreshed"), 4);
        assert_eq!(sim.clock(), Timestamp::from_millis(80));
        assert_eq!(sim.snapshot().history[0].timestamp, Timestamp::from_millis(16));
    }

    #[test]
    fn test_noisy_frames_keep_their_label() {
        let mut rng = script_rng(3);
        let script = EmotionScript::new().noisy(EmotionLabel::Angry, 0.7, 20, &mut rng);
        assert!(script
            .classifications()
            .all(|s| s.unwrap().dominant().0 == EmotionLabel::Angry));
    }

    #[tokio::test]
    async fn test_scripted_frames_and_detector() {
        let script = EmotionScript::new()
            .not_ready(1)
            .hold(EmotionLabel::Sad, 0.9, 1)
            .no_face(1);
        let mut frames = ScriptedFrames::new(&script);
        let mut detector = ScriptedDetector::new().with_extra_faces(2);

        assert_eq!(frames.poll_frame(), FramePoll::NotReady);

        let FramePoll::Ready(frame) = frames.poll_frame() else {
            panic!("expected a frame");
        };
        assert_eq!(frame.seq, 0);
        let detections = detector.detect(&frame).await.unwrap();
        assert_eq!(detections.len(), 3);
        assert_eq!(detections[0].expressions.dominant().0, EmotionLabel::Sad);

        let FramePoll::Ready(empty) = frames.poll_frame() else {
            panic!("expected a frame");
        };
        assert!(detector.detect(&empty).await.unwrap().is_empty());
        assert_eq!(frames.poll_frame(), FramePoll::Ended);
    }

    fn segment_strategy() -> impl Strategy<Value = (Option<usize>, f32, usize)> {
        (
            proptest::option::weighted(0.85, 0..EmotionLabel::COUNT),
            0.0f32..=1.0,
            1usize..6,
        )
    }

    proptest! {
        #[test]
        fn prop_random_scripts_keep_session_consistent(
            segments in proptest::collection::vec(segment_strategy(), 0..40),
            sensitivity in 1i64..=100,
        ) {
            let mut script = EmotionScript::new();
            for (label, p, frames) in &segments {
                script = match label {
                    Some(i) => script.hold(EmotionLabel::ALL[*i], *p, *frames),
                    None => script.no_face(*frames),
                };
            }

            let mut sim = SessionSimulator::new(&SessionConfig::default());
            sim.session_mut().set_sensitivity(neura_state::Sensitivity::new(sensitivity));
            sim.run(&script);
            let snapshot = sim.snapshot();

            let awarded: u32 = sim
                .events()
                .iter()
                .filter_map(|e| match e {
                    SessionEvent::Transition(t) => Some(t.emotion.points()),
                    _ => None,
                })
                .sum();
            prop_assert_eq!(snapshot.total_points, awarded);
            prop_assert_eq!(snapshot.streak as usize, sim.count("transition"));
            prop_assert_eq!(
                snapshot.history.len(),
                sim.count("transition").min(10)
            );
            prop_assert_eq!(
                snapshot.level,
                neura_state::LevelController::level_for_points(snapshot.total_points)
            );

            let stats = &snapshot.stats;
            prop_assert_eq!(stats.frames as usize, script.classifications().count());
            prop_assert_eq!(
                stats.no_face + stats.rejected + stats.refreshed + stats.transitions,
                stats.frames
            );
        }
    }
}
