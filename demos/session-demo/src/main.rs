//! NEURA Session Demo
//!
//! Runs a full detection session against a scripted camera:
//! - A few noisy tours through every emotion, with the face lost in between
//! - An optional chaos backend (`--chaos good|poor|hostile`)
//! - Effects logged through `tracing` instead of speakers and screens
//! - Narration and ambient audio switched on halfway through
//!
//! Usage: `session-demo [config.json] [--chaos <preset>] [--tours <n>] [--verbose]`

use std::sync::Arc;
use std::time::Duration;

use neura_core::EmotionLabel;
use neura_effects::LogSink;
use neura_runtime::{init_telemetry, stop_channel, Pipeline, SessionConfig, TelemetryConfig};
use neura_test::{script_rng, ChaosConfig, ChaosDetector, ChaosFrames, EmotionScript, ScriptedDetector, ScriptedFrames};
use tracing::{info, warn};

struct Args {
    config: Option<String>,
    chaos: ChaosConfig,
    tours: usize,
    verbose: bool,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        config: None,
        chaos: ChaosConfig::none(),
        tours: 3,
        verbose: false,
    };

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--chaos" => {
                args.chaos = match iter.next().as_deref() {
                    Some("none") => ChaosConfig::none(),
                    Some("good") => ChaosConfig::good(),
                    Some("poor") => ChaosConfig::poor(),
                    Some("hostile") => ChaosConfig::hostile(),
                    other => return Err(format!("unknown chaos preset: {:?}", other)),
                }
            }
            "--tours" => {
                args.tours = iter
                    .next()
                    .and_then(|n| n.parse().ok())
                    .ok_or("--tours needs a number")?;
            }
            "--verbose" => args.verbose = true,
            path => args.config = Some(path.to_string()),
        }
    }
    Ok(args)
}

fn build_script(tours: usize, seed: u64) -> EmotionScript {
    let mut rng = script_rng(seed);
    let mut script = EmotionScript::new().not_ready(10);
    for _ in 0..tours {
        for label in EmotionLabel::ALL.into_iter().skip(1) {
            script = script
                .noisy(label, 0.85, 40, &mut rng)
                .no_face(10)
                .noisy(label, 0.3, 10, &mut rng);
        }
        script = script.hold(EmotionLabel::Neutral, 0.9, 40);
    }
    script
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = parse_args()?;

    let mut config = match &args.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    if args.verbose {
        config.telemetry = TelemetryConfig {
            format: config.telemetry.format,
            ..TelemetryConfig::verbose()
        };
    }
    init_telemetry(&config.telemetry);

    let seed = *config.seed.get_or_insert(2024);
    let script = build_script(args.tours, seed);
    info!(frames = script.len(), tours = args.tours, "script ready");

    let frames = ChaosFrames::new(ScriptedFrames::new(&script), &args.chaos, seed);
    let detector = ChaosDetector::new(
        ScriptedDetector::new().with_latency(Duration::from_millis(4)),
        args.chaos.clone(),
        seed,
    );

    let mut pipeline = Pipeline::new(config.clone(), frames, detector, Arc::new(LogSink))?;

    // Switch the audio on partway through, like a user finding the toggles
    let settings = pipeline.settings_handle();
    let halfway = config.refresh_interval * (script.len() as u32 / 2);
    let toggles = tokio::spawn(async move {
        tokio::time::sleep(halfway).await;
        info!("enabling narration and ambient audio");
        settings.set_narration(true);
        settings.set_ambient(true);
    });

    // Hard stop in case the source never ends
    let (stop, signal) = stop_channel();
    let limit = config.refresh_interval * (script.len() as u32 * 4) + Duration::from_secs(5);
    let watchdog = tokio::spawn(async move {
        tokio::time::sleep(limit).await;
        warn!(?limit, "session ran too long, stopping");
        stop.stop();
    });

    let summary = pipeline.run(signal).await;
    toggles.abort();
    watchdog.abort();

    println!("{}", serde_json::to_string_pretty(&summary)?);
    println!("{}", serde_json::to_string_pretty(&pipeline.snapshot())?);
    Ok(())
}
