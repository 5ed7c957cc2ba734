//! Frame sampler - bridges a video source and an inference capability
//!
//! One sample per tick. A source that is not ready defers the tick; an
//! inference error is logged and the frame skipped. The sampler awaits the
//! detector inline, so there is never more than one inference in flight.

use std::future::Future;

use neura_core::{classify, Detection, ExpressionScores, NeuraError, NeuraResult};
use serde::Serialize;
use tracing::{trace, warn};

/// What a frame source has for this tick
#[derive(Debug, Clone, PartialEq)]
pub enum FramePoll<F> {
    Ready(F),
    /// Not enough data yet; try again next tick
    NotReady,
    /// The source is gone; the loop should stop
    Ended,
}

/// Video source
pub trait FrameSource: Send {
    type Frame: Send + Sync;

    fn poll_frame(&mut self) -> FramePoll<Self::Frame>;
}

/// Face detection plus expression inference
pub trait Detector<F>: Send {
    /// Every face found, possibly none
    fn detect(&mut self, frame: &F) -> impl Future<Output = NeuraResult<Vec<Detection>>> + Send;
}

/// Result of one sampling attempt
#[derive(Debug, Clone, PartialEq)]
pub enum Sample {
    /// Inference ran; `None` means no face
    Classified(Option<ExpressionScores>),
    NotReady,
    /// Inference failed; the frame is skipped
    Failed(NeuraError),
    Ended,
}

/// Sampling counters
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SamplerStats {
    pub polls: u64,
    pub deferred: u64,
    pub inferences: u64,
    pub failures: u64,
}

/// Pulls frames and runs inference
pub struct FrameSampler<S, D> {
    source: S,
    detector: D,
    stats: SamplerStats,
}

impl<S, D> FrameSampler<S, D>
where
    S: FrameSource,
    D: Detector<S::Frame>,
{
    pub fn new(source: S, detector: D) -> Self {
        FrameSampler {
            source,
            detector,
            stats: SamplerStats::default(),
        }
    }

    pub async fn sample(&mut self) -> Sample {
        self.stats.polls += 1;

        let frame = match self.source.poll_frame() {
            FramePoll::Ready(frame) => frame,
            FramePoll::NotReady => {
                self.stats.deferred += 1;
                trace!("frame source not ready");
                return Sample::NotReady;
            }
            FramePoll::Ended => return Sample::Ended,
        };

        self.stats.inferences += 1;
        match self.detector.detect(&frame).await {
            Ok(detections) => Sample::Classified(classify(&detections)),
            Err(e) => {
                self.stats.failures += 1;
                warn!(error = %e, "inference failed, skipping frame");
                Sample::Failed(e)
            }
        }
    }

    pub fn stats(&self) -> &SamplerStats {
        &self.stats
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neura_core::{BoundingBox, EmotionLabel};
    use std::collections::VecDeque;

    struct Polls(VecDeque<FramePoll<u32>>);

    impl FrameSource for Polls {
        type Frame = u32;

        fn poll_frame(&mut self) -> FramePoll<u32> {
            self.0.pop_front().unwrap_or(FramePoll::Ended)
        }
    }

    /// Frame n: 0 fails, 1 no face, otherwise two faces, happy first
    struct ByFrame;

    impl Detector<u32> for ByFrame {
        async fn detect(&mut self, frame: &u32) -> NeuraResult<Vec<Detection>> {
            match *frame {
                0 => Err(NeuraError::InferenceFailed("model not loaded".into())),
                1 => Ok(Vec::new()),
                _ => Ok(vec![
                    Detection::new(
                        BoundingBox::new(0.0, 0.0, 10.0, 10.0),
                        ExpressionScores::single(EmotionLabel::Happy, 0.8),
                    ),
                    Detection::new(
                        BoundingBox::new(20.0, 0.0, 10.0, 10.0),
                        ExpressionScores::single(EmotionLabel::Sad, 0.99),
                    ),
                ]),
            }
        }
    }

    #[tokio::test]
    async fn test_sample_outcomes() {
        let polls = Polls(VecDeque::from(vec![
            FramePoll::NotReady,
            FramePoll::Ready(0),
            FramePoll::Ready(1),
            FramePoll::Ready(2),
        ]));
        let mut sampler = FrameSampler::new(polls, ByFrame);

        assert_eq!(sampler.sample().await, Sample::NotReady);
        assert!(matches!(sampler.sample().await, Sample::Failed(NeuraError::InferenceFailed(_))));
        assert_eq!(sampler.sample().await, Sample::Classified(None));

        // First detection only
        let Sample::Classified(Some(scores)) = sampler.sample().await else {
            panic!("expected a classification");
        };
        assert_eq!(scores.dominant(), (EmotionLabel::Happy, 0.8));

        assert_eq!(sampler.sample().await, Sample::Ended);
        assert_eq!(
            sampler.stats(),
            &SamplerStats {
                polls: 5,
                deferred: 1,
                inferences: 3,
                failures: 1,
            }
        );
    }
}
