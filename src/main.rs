//! Simulated assessment runner for the motion & trial engine.

use anyhow::Result;
use clap::Parser;
use log::info;
use nalgebra::Vector3;
use saccade_assessment::config::Config;
use saccade_assessment::results;
use saccade_assessment::session::AssessmentSession;
use saccade_assessment::simulate::{spawn_pose_feed, spawn_subject, SimulatorConfig};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Trials per phase (overrides the config file)
    #[arg(short, long)]
    trials: Option<usize>,

    /// RNG seed for the cue order and the simulated subject
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Simulated mean reaction latency in milliseconds
    #[arg(long, default_value = "250.0")]
    reaction_ms: f64,

    /// Probability the simulated subject selects the cued target
    #[arg(long, default_value = "0.9")]
    accuracy: f64,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    info!("Saccade Assessment Engine - simulated session");

    // Load configuration if provided
    let mut config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path);
        match Config::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("Failed to load config file: {}. Using defaults.", e);
                Config::default()
            }
        }
    } else {
        Config::default()
    };
    if let Some(trials) = args.trials {
        config.trial.trials_per_phase = trials;
    }
    config.validate()?;

    let scoring = config.scoring.clone();
    let simulator = SimulatorConfig {
        reaction_mean_ms: args.reaction_ms,
        accuracy: args.accuracy,
        seed: args.seed,
        ..SimulatorConfig::default()
    };

    let mut session = AssessmentSession::new(config);
    let feed = spawn_pose_feed(session.input(), simulator.clone());

    // Let the filters settle, then calibrate the standing origin
    tokio::time::sleep(std::time::Duration::from_millis(500)).await;
    session.calibrate_origin(Vector3::zeros()).await?;
    session.capture_baseline().await?;

    let events = session
        .start_test(args.seed)
        .ok_or_else(|| anyhow::anyhow!("a test is already running"))?;
    let interactions = session
        .interaction_sender()
        .ok_or_else(|| anyhow::anyhow!("test failed to start"))?;
    let subject = spawn_subject(events, interactions, simulator);

    let report = session.wait_for_report().await?;
    subject.abort();
    feed.abort();

    let result = results::aggregate(&report.trials, report.completed, &scoring);

    println!("\n=== Assessment Summary ===");
    println!("Trials:            {}", result.total_trials);
    println!(
        "Outcomes:          {} correct, {} wrong, {} timeout, {} invalidated, {} anticipation",
        result.correct_count,
        result.wrong_target_count,
        result.timeout_count,
        result.invalidated_count,
        result.anticipation_count
    );
    println!(
        "Latency:           mean {:.0} ms, median {:.0} ms, sd {:.0} ms",
        result.mean_latency_ms, result.median_latency_ms, result.std_dev_latency_ms
    );
    println!(
        "Head motion:       max {:.1}°, mean {:.1}°",
        result.max_head_motion_deg, result.average_head_motion_deg
    );
    println!("Clinical score:    {:.1} / 100", result.clinical_score);
    println!(
        "Indicator:         {}",
        if result.concussion_indicated {
            "POSITIVE - clinical follow-up recommended"
        } else {
            "negative"
        }
    );
    if !result.completed {
        println!("Note: session ended before completing both phases");
    }

    Ok(())
}
