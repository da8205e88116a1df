// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanwerk: document boundary detection driver.
//
// Entry point. Initialises logging and config, replays image files through a
// detection session, and prints one JSON line per detection.

mod cli;
mod services;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use scanwerk_bridge::FrameSource;
use scanwerk_core::human_errors::{classify_error, humanize_error};
use scanwerk_core::{ErrorClass, ScanwerkError};
use scanwerk_document::{CropCoordinates, Detection, DetectionSession, FrameAnalyzer, HoughVision, SessionStats};
use clap::Parser;
use serde::Serialize;
use tokio::sync::mpsc;

use services::app_services::AppServices;
use services::file_source::ImageFileSource;

/// One line of output per analysed image.
#[derive(Debug, Serialize)]
struct DetectionReport<'a> {
    file: &'a str,
    sequence: u64,
    corners: Option<CropCoordinates>,
    width: f64,
    height: f64,
    elapsed_ms: f64,
}

#[derive(Debug, Serialize)]
struct StatsReport {
    stats: SessionStats,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = cli::CliArgs::parse();

    tracing::info!("Scanwerk starting");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let human = humanize_error(&e);
            tracing::error!(error = %e, "scanwerk failed");
            eprintln!("{}\n{}", human.message, human.suggestion);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: cli::CliArgs) -> Result<(), ScanwerkError> {
    let mut services = AppServices::init();
    let config = services.config();
    config.validate()?;
    if args.save_config {
        services.save_config(&config)?;
    }
    if args.images.is_empty() {
        return Ok(());
    }

    let names: Vec<String> = args.images.iter().map(|p| p.display().to_string()).collect();
    let mut source = ImageFileSource::new(args.images.clone(), config.sensor_rotation);

    let analyzer = FrameAnalyzer::new(Arc::new(HoughVision::from_config(&config)), &config);
    let (tx, mut rx) = mpsc::unbounded_channel::<Detection>();
    let mut session = DetectionSession::start(analyzer, &config, args.space, move |d: Detection| {
        // The receiver outlives the session; a failed send only happens
        // during shutdown.
        let _ = tx.send(d);
    })?;

    loop {
        let frame = match source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(e) => {
                if classify_error(&e) == ErrorClass::Fatal {
                    session.stop().await?;
                    return Err(e);
                }
                tracing::warn!(error = %e, "skipping unreadable image");
                continue;
            }
        };

        tracing::debug!(sequence = frame.sequence, remaining = source.remaining(), "submitting frame");

        // Replay at detection speed: every file gets the worker to itself.
        let before = settled(&session.stats());
        session.submit(frame);
        while settled(&session.stats()) == before && session.is_running() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        if !session.is_running() {
            break;
        }

        while let Ok(detection) = rx.try_recv() {
            print_detection(&names, &detection)?;
        }
    }

    session.stop().await?;
    while let Ok(detection) = rx.try_recv() {
        print_detection(&names, &detection)?;
    }

    let stats = session.stats();
    tracing::info!(?stats, "session finished");
    println!("{}", serde_json::to_string(&StatsReport { stats })?);

    match session.take_fatal() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Frames that have left the worker one way or another.
fn settled(stats: &SessionStats) -> u64 {
    stats.processed + stats.failed + stats.timed_out + stats.stale + stats.dropped
}

fn print_detection(names: &[String], detection: &Detection) -> Result<(), ScanwerkError> {
    let file = usize::try_from(detection.sequence)
        .ok()
        .and_then(|i| names.get(i))
        .map(String::as_str)
        .unwrap_or("?");
    let report = DetectionReport {
        file,
        sequence: detection.sequence,
        corners: detection.corners,
        width: detection.output_space.width,
        height: detection.output_space.height,
        elapsed_ms: detection.elapsed.as_secs_f64() * 1000.0,
    };
    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}
