use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use colored::*;
use tracing::{info, warn};

use gesture_cmd::classifier::GestureClassifier;
use gesture_cmd::command::CommandMachine;
use gesture_cmd::config::AppConfig;
use gesture_cmd::detector::SubprocessDetector;
use gesture_cmd::dispatch::{Dispatcher, HttpExecutor};
use gesture_cmd::error::GestureError;
use gesture_cmd::pipeline::{GestureEngine, Recognizer};
use gesture_cmd::templates::TemplateLibrary;
use gesture_cmd::transport::{HttpStream, ReplaySource};

mod args;

use args::Args;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gesture_cmd=info".into()),
        )
        .init();

    info!("gesture_cmd v{} starting", env!("CARGO_PKG_VERSION"));

    // 0. Load Config
    let mut config = AppConfig::load(&args.config)?;
    if let Some(url) = &args.url {
        config.stream.url = url.clone();
    }
    if let Some(dir) = &args.templates_dir {
        config.templates.data_path = dir.join("gesture_data.csv");
        config.templates.names_path = dir.join("gesture_names.csv");
    }
    if let Some(tolerance) = args.tolerance {
        config.classifier.tolerance = tolerance;
    }
    config.validate()?;

    // 1. Load templates. Nothing runs without them.
    let templates = TemplateLibrary::load(
        &config.templates.data_path,
        &config.templates.names_path,
        config.classifier.landmark_count,
    )
    .context("Failed to load gesture templates")?;

    if args.list {
        println!("Trained Gestures:");
        println!("{:<5} | {:<20}", "Index", "Name");
        println!("{}", "-".repeat(30));
        for (i, t) in templates.iter().enumerate() {
            println!("{:<5} | {:<20}", i, t.name);
        }
        return Ok(());
    }

    let classifier = GestureClassifier::from_config(&config.classifier);
    if args.verify {
        let mismatches = templates.verify(&classifier);
        if mismatches.is_empty() {
            println!("{}", format!("All {} templates recognize themselves.", templates.len()).green());
            return Ok(());
        }
        for m in &mismatches {
            println!("{}", format!("#{} {:?} classified as {}", m.index, m.expected, m.got).red());
        }
        bail!("{} of {} templates failed verification", mismatches.len(), templates.len());
    }

    if templates.is_empty() {
        warn!("No gesture templates loaded; every gesture will be Unknown");
    }

    // 2. Setup Detector
    let detector = SubprocessDetector::spawn(&config.detector)?;

    // 3. Setup Dispatch
    let executor = HttpExecutor::new(config.dispatch.endpoints.clone(), config.dispatch.http_timeout())?;

    let recognizer = Recognizer::new(detector, Arc::new(templates), &config);
    let mut engine = GestureEngine::new(
        recognizer,
        CommandMachine::from_config(&config.session),
        Dispatcher::new(executor),
    );

    println!("{}", "Show a mode gesture (One, Two, Three), then an action. Show Stop to start over.".cyan());

    // 4. Loop
    let end = match &args.replay {
        Some(path) => {
            let mut source = ReplaySource::open(path)?;
            engine.run_session(&mut source, &config.stream)
        }
        None => engine.run_with_reconnect(&config.stream, || HttpStream::connect(&config.stream)),
    };

    let stats = engine.stats();
    info!(
        "Processed {} frames ({} classified, {} without a hand), issued {} commands",
        stats.frames,
        stats.classified,
        stats.no_hand,
        stats.commands.len()
    );

    match end {
        GestureError::StreamClosed if args.replay.is_some() => Ok(()),
        e => Err(e).context("Gesture session ended"),
    }
}
