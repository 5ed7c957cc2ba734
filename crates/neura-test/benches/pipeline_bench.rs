//! Benchmarks for the per-frame hot path

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use neura_core::{EmotionLabel, ExpressionScores, Timestamp};
use neura_runtime::{Session, SessionConfig};
use neura_state::{stabilize, GamificationEngine};
use neura_test::{script_rng, EmotionScript};

fn bench_dominant(c: &mut Criterion) {
    let mut scores = ExpressionScores::new();
    for (i, label) in EmotionLabel::ALL.into_iter().enumerate() {
        scores.set(label, 0.1 * i as f32);
    }

    c.bench_function("expression_dominant", |b| {
        b.iter(|| black_box(&scores).dominant())
    });
}

fn bench_stabilize(c: &mut Criterion) {
    let accepted = ExpressionScores::single(EmotionLabel::Happy, 0.9);
    let rejected = ExpressionScores::single(EmotionLabel::Sad, 0.2);

    let mut group = c.benchmark_group("stabilize");
    group.bench_function("transition", |b| {
        b.iter(|| stabilize(black_box(Some(&accepted)), 0.5, EmotionLabel::Neutral))
    });
    group.bench_function("refresh", |b| {
        b.iter(|| stabilize(black_box(Some(&accepted)), 0.5, EmotionLabel::Happy))
    });
    group.bench_function("rejected", |b| {
        b.iter(|| stabilize(black_box(Some(&rejected)), 0.5, EmotionLabel::Neutral))
    });
    group.finish();
}

fn bench_session_process(c: &mut Criterion) {
    let mut rng = script_rng(42);
    let mut script = EmotionScript::new();
    for _ in 0..10 {
        for label in EmotionLabel::ALL {
            script = script.noisy(label, 0.8, 30, &mut rng).no_face(5);
        }
    }
    let frames: Vec<_> = script.classifications().collect();

    let mut group = c.benchmark_group("session_process");
    group.throughput(Throughput::Elements(frames.len() as u64));
    group.bench_function("noisy_script", |b| {
        b.iter(|| {
            let mut session = Session::with_config(&SessionConfig::headless());
            for (i, scores) in frames.iter().enumerate() {
                let events = session.process(scores.as_ref(), Timestamp::from_millis(i as u64 * 16));
                black_box(events);
            }
            session.progression().total_points()
        })
    });
    group.finish();
}

fn bench_gamification(c: &mut Criterion) {
    let mut group = c.benchmark_group("gamification_transitions");

    for count in [10, 100, 1000] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let mut engine = GamificationEngine::new();
                for label in EmotionLabel::ALL.into_iter().cycle().take(count) {
                    black_box(engine.on_emotion_transition(label));
                }
                engine.progression().total_points()
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_dominant,
    bench_stabilize,
    bench_session_process,
    bench_gamification,
);
criterion_main!(benches);
