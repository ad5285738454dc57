//! GazeLab command line
//!
//! - `calibrate`: walk the calibration/validation markers in the terminal,
//!   using predictions from the UDP gaze feed
//! - `record`: run one timed usability task from the UDP feed and save the results
//! - `report`: summarise a saved results file

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gazelab::analysis::ResultsReport;
use gazelab::calibration::{CalibrationMetrics, MarkerStyle, OperatorSignal, PointDisplay, PointRequest, RunOutcome};
use gazelab::export::{save_session_files, TestResults};
use gazelab::feed::SharedGaze;
use gazelab::recorder::RecordOutcome;
use gazelab::session::TickOutcome;
use gazelab::{GazeLab, LabConfig};
use log::LevelFilter;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "gazelab")]
#[command(about = "GazeLab - gaze calibration and usability test recording", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calibrate and validate the gaze model
    ///
    /// Press Enter while fixating each calibration marker; type `q` and Enter
    /// to cancel. Validation markers only need to be looked at.
    Calibrate {
        /// Write the resulting metrics as JSON
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Record one usability task from the gaze feed
    ///
    /// Press Ctrl+C when the participant reaches the target; otherwise the
    /// task times out after the configured duration.
    Record {
        /// Where to write the test results
        #[arg(long, value_name = "FILE", default_value = "test-results.json")]
        out: PathBuf,

        /// Also write the raw recording export
        #[arg(long, value_name = "FILE")]
        recording_out: Option<PathBuf>,

        /// Label stored with a completed task
        #[arg(long, default_value = "target reached")]
        target: String,
    },

    /// Summarise a saved test results file
    Report {
        /// Test results JSON
        results: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Save a written analysis into the results file
        #[arg(long, value_name = "TEXT")]
        analysis: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Info)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => LabConfig::load(path)?,
        None => {
            let mut config = LabConfig::default();
            config.apply_env();
            config
        }
    };
    let lab = GazeLab::new(config)?;

    match cli.command {
        Commands::Calibrate { out } => calibrate(&lab, out.as_deref()).await,
        Commands::Record {
            out,
            recording_out,
            target,
        } => record(&lab, &out, recording_out.as_deref(), &target).await,
        Commands::Report {
            results,
            json,
            analysis,
        } => report(&lab, &results, json, analysis.as_deref()),
    }
}

/// Prints marker positions for the operator to place on the test screen.
struct TerminalDisplay;

impl PointDisplay for TerminalDisplay {
    fn show_point(&mut self, request: &PointRequest) {
        let kind = match request.style {
            MarkerStyle::Calibration => "Calibration",
            MarkerStyle::Validation => "Validation",
        };
        println!(
            "{kind} {}/{} at ({:.0}, {:.0})",
            request.index + 1,
            request.total,
            request.position.x,
            request.position.y
        );
    }

    fn show_metrics(&mut self, metrics: &CalibrationMetrics) {
        println!("Calibration complete: {metrics}");
    }
}

async fn calibrate(lab: &GazeLab, out: Option<&Path>) -> Result<()> {
    let gaze = SharedGaze::new();
    lab.spawn_gaze_feed(gaze.clone(), None)
        .await
        .context("validation needs gaze predictions; set feed.udp_addr or GAZELAB_GAZE_UDP_ADDR")?;

    let (tx, mut rx) = mpsc::channel::<OperatorSignal>(8);
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let signal = match line {
                Ok(l) if l.trim().eq_ignore_ascii_case("q") => OperatorSignal::Cancel,
                Ok(_) => OperatorSignal::Acknowledge,
                Err(_) => OperatorSignal::Cancel,
            };
            if tx.blocking_send(signal).is_err() || signal == OperatorSignal::Cancel {
                break;
            }
        }
    });

    let mut runner = lab.calibration_runner(TerminalDisplay, gaze, lab.viewport());
    runner.set_on_cancel(|| log::info!("Calibration cancelled by operator"));

    println!("Fixate each marker and press Enter; `q` cancels.");
    match runner.run(&mut rx).await {
        RunOutcome::Completed(metrics) => {
            if let Some(path) = out {
                std::fs::write(path, serde_json::to_string_pretty(&metrics)?)
                    .with_context(|| format!("write metrics to {}", path.display()))?;
                log::info!("Metrics written to {}", path.display());
            }
        }
        RunOutcome::Cancelled => println!("Calibration cancelled."),
        RunOutcome::Rejected(reason) => log::warn!("Calibration not started: {reason:?}"),
    }
    Ok(())
}

async fn record(lab: &GazeLab, out: &Path, recording_out: Option<&Path>, target: &str) -> Result<()> {
    let (sample_tx, mut sample_rx) = mpsc::unbounded_channel();
    lab.spawn_gaze_feed(SharedGaze::new(), Some(sample_tx))
        .await
        .context("recording needs a sample feed; set feed.udp_addr or GAZELAB_GAZE_UDP_ADDR")?;

    let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);
    ctrlc::set_handler(move || {
        log::info!("Target reached signal received");
        let _ = stop_tx.blocking_send(());
    })?;

    let mut session = lab.test_session();
    session.start();
    log::info!("Recording for {}s. Press Ctrl+C when the target is reached.", session.seconds_left());

    let mut ticker = tokio::time::interval(std::time::Duration::from_secs(1));
    ticker.tick().await;

    let results = loop {
        tokio::select! {
            Some(point) = sample_rx.recv() => {
                if let RecordOutcome::AutoStopped(samples) = session.record_pointer(point.x, point.y) {
                    log::info!("Recording window closed with {} samples", samples.len());
                }
            }
            _ = ticker.tick() => {
                match session.tick() {
                    TickOutcome::Ended(results) => break results,
                    TickOutcome::Running { seconds_left } if seconds_left <= 10 => {
                        log::info!("{seconds_left}s left");
                    }
                    _ => {}
                }
            }
            Some(()) = stop_rx.recv() => {
                if let Some(results) = session.complete_task(target) {
                    break results;
                }
            }
        }
    };

    save_session_files(&results, session.recorder(), out, recording_out)
        .with_context(|| format!("write session files next to {}", out.display()))?;

    println!("{}", lab.report(&results));
    Ok(())
}

fn report(lab: &GazeLab, path: &Path, json: bool, analysis: Option<&str>) -> Result<()> {
    let mut results = TestResults::load(path).with_context(|| format!("load results from {}", path.display()))?;

    if let Some(text) = analysis {
        results.save_analysis(text)?;
        results.save(path)?;
        log::info!("Analysis saved to {}", path.display());
    }

    let report: ResultsReport = lab.report(&results);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{report}");
        if let Some(text) = &results.manual_analysis {
            println!("Notes:\n  {text}");
        }
    }
    Ok(())
}
