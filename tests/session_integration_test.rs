//! End-to-end session tests driving the engine with the synthetic pose
//! source and scripted subject.

use nalgebra::{UnitQuaternion, Vector3};
use saccade_assessment::config::Config;
use saccade_assessment::results;
use saccade_assessment::session::AssessmentSession;
use saccade_assessment::simulate::{spawn_pose_feed, spawn_subject, SimulatorConfig};
use saccade_assessment::types::{AutoPauseReason, Direction, PoseSample, TrialOutcome};
use tokio::sync::watch;
use tokio::time::{sleep, timeout, Duration};

fn fast_config() -> Config {
    let mut config = Config::default();
    config.trial.trials_per_phase = 2;
    config
}

fn level_sample(position: Vector3<f64>, t: f64) -> PoseSample {
    PoseSample::new(UnitQuaternion::identity(), position, t)
}

async fn wait_for_pause(
    rx: &mut watch::Receiver<Option<AutoPauseReason>>,
    expected: Option<AutoPauseReason>,
) {
    loop {
        if *rx.borrow() == expected {
            return;
        }
        rx.changed().await.expect("session writer is gone");
    }
}

#[tokio::test(start_paused = true)]
async fn test_full_simulated_session() {
    let config = fast_config();
    let scoring = config.scoring.clone();
    let mut session = AssessmentSession::new(config);

    let simulator = SimulatorConfig {
        accuracy: 1.0,
        reaction_mean_ms: 250.0,
        reaction_jitter_ms: 0.0,
        seed: 9,
        ..SimulatorConfig::default()
    };
    let _feed = spawn_pose_feed(session.input(), simulator.clone());

    // Let the filters settle, then calibrate
    sleep(Duration::from_millis(500)).await;
    session.calibrate_origin(Vector3::zeros()).await.unwrap();
    session.capture_baseline().await.unwrap();

    let events = session.start_test(9).expect("no test running yet");
    // Starting again while a test is active is a no-op
    assert!(session.start_test(10).is_none());

    let interactions = session.interaction_sender().unwrap();
    let _subject = spawn_subject(events, interactions, simulator);

    let report = session.wait_for_report().await.unwrap();
    assert!(report.completed);
    assert_eq!(report.trials.len(), 4);
    assert!(report
        .trials
        .iter()
        .all(|t| t.outcome == TrialOutcome::Correct));

    let result = results::aggregate(&report.trials, report.completed, &scoring);
    assert_eq!(result.total_trials, 4);
    assert!((result.mean_latency_ms - 250.0).abs() < 1.0);
    assert!(result.clinical_score > 80.0);
    assert!(!result.concussion_indicated);
    assert!(result.completed);
}

#[tokio::test(start_paused = true)]
async fn test_snapshots_published() {
    let session = AssessmentSession::new(Config::default());
    let motion_rx = session.motion();
    let sway_rx = session.sway();

    session.calibrate_origin(Vector3::zeros()).await.unwrap();
    for i in 0..10 {
        let t = f64::from(i) * 0.1;
        // Steady 5°/s yaw sweep, 1 cm off-origin stance
        let rotation =
            UnitQuaternion::from_axis_angle(&Vector3::y_axis(), (5.0 * t).to_radians());
        session
            .submit_sample(PoseSample::new(rotation, Vector3::new(0.01, 0.0, 0.0), t))
            .await
            .unwrap();
    }
    sleep(Duration::from_millis(50)).await;

    let motion = *motion_rx.borrow();
    assert_eq!(motion.sample_count, 10);
    assert!(motion.yaw_rate_deg_s > 0.0);

    let sway = *sway_rx.borrow();
    assert_eq!(sway.window_len, 10);
    assert!(sway.displacement_cm > 0.0);
    assert!(sway.path_length_cm > 0.0);
}

#[tokio::test(start_paused = true)]
async fn test_auto_pause_signal_lifecycle() {
    let session = AssessmentSession::new(Config::default());
    let mut pause_rx = session.auto_pause();

    // Before calibration nothing fires, even far from the eventual origin
    session
        .submit_sample(level_sample(Vector3::new(0.5, 0.0, 0.0), 0.0))
        .await
        .unwrap();
    sleep(Duration::from_millis(20)).await;
    assert_eq!(*pause_rx.borrow(), None);

    session.calibrate_origin(Vector3::zeros()).await.unwrap();

    // 30 cm displacement breaches the 25 cm limit
    session
        .submit_sample(level_sample(Vector3::new(0.3, 0.0, 0.0), 1.0))
        .await
        .unwrap();
    timeout(
        Duration::from_secs(1),
        wait_for_pause(&mut pause_rx, Some(AutoPauseReason::SwayLimit)),
    )
    .await
    .unwrap();

    // Stepping back inside the limit clears the signal
    session
        .submit_sample(level_sample(Vector3::zeros(), 2.0))
        .await
        .unwrap();
    timeout(Duration::from_secs(1), wait_for_pause(&mut pause_rx, None))
        .await
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_stop_yields_incomplete_report() {
    let mut session = AssessmentSession::new(fast_config());
    let _feed = spawn_pose_feed(session.input(), SimulatorConfig::default());

    sleep(Duration::from_millis(200)).await;
    session.calibrate_origin(Vector3::zeros()).await.unwrap();

    let _events = session.start_test(1).unwrap();
    // Stop during the first trial's fixation: nothing was finalized
    sleep(Duration::from_millis(100)).await;
    session.stop_test();

    let report = session.wait_for_report().await.unwrap();
    assert!(!report.completed);
    assert!(report.trials.is_empty());

    // After collecting the report a new test may start
    assert!(session.start_test(2).is_some());
    session.stop_test();
    let report = session.wait_for_report().await.unwrap();
    assert!(!report.completed);
}

#[tokio::test]
async fn test_interact_without_test_is_dropped() {
    let session = AssessmentSession::new(Config::default());
    assert!(!session.test_running());
    // Dropped silently, not an error
    session.interact(Direction::Left).await;
}
