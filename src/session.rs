//! Session engine: wires the pose feed, signal processors, safety monitor and
//! trial sequencer together.
//!
//! All sensor-derived state has a single writer: one spawned task consumes
//! [`SessionInput`]s in arrival order and publishes copy-out snapshots over
//! `watch` channels. The sequencer, the safety consumer and any UI reader
//! observe those snapshots without locks and without tearing.

use log::{debug, warn};
use nalgebra::Vector3;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::motion::{MotionProcessor, MotionState};
use crate::safety::{SafetyLimits, SafetyMonitor};
use crate::sequencer::{SessionReport, TrialSequencer};
use crate::sway::{SwaySnapshot, SwayTracker};
use crate::types::{AutoPauseReason, Direction, Interaction, PoseSample, SequencerEvent};
use crate::{Error, Result};

/// Input accepted by the session engine's single-writer task.
///
/// Samples and calibration commands travel on one channel, so their relative
/// order is exactly the order the caller issued them in.
#[derive(Debug, Clone)]
pub enum SessionInput {
    /// A pose sample from the external pose source
    Sample(PoseSample),
    /// Calibrate the sway origin at the given position (meters)
    SetOrigin(Vector3<f64>),
    /// Snapshot the current sway RMS values as the comparison baseline
    CaptureBaseline,
}

const INPUT_QUEUE_DEPTH: usize = 64;
const INTERACTION_QUEUE_DEPTH: usize = 16;

struct RunningTest {
    stop_tx: watch::Sender<bool>,
    interaction_tx: mpsc::Sender<Interaction>,
    handle: JoinHandle<SessionReport>,
}

/// One assessment session: owns the signal-processing task and at most one
/// running test at a time.
pub struct AssessmentSession {
    config: Config,
    input_tx: mpsc::Sender<SessionInput>,
    motion_rx: watch::Receiver<MotionState>,
    sway_rx: watch::Receiver<SwaySnapshot>,
    pause_rx: watch::Receiver<Option<AutoPauseReason>>,
    writer: JoinHandle<()>,
    test: Option<RunningTest>,
}

impl AssessmentSession {
    /// Create a session and spawn its signal-processing task
    #[must_use]
    pub fn new(config: Config) -> Self {
        let (input_tx, input_rx) = mpsc::channel(INPUT_QUEUE_DEPTH);
        let (motion_tx, motion_rx) = watch::channel(MotionState::default());
        let (sway_tx, sway_rx) = watch::channel(SwaySnapshot::default());
        let (pause_tx, pause_rx) = watch::channel(None);

        let writer = tokio::spawn(run_writer(
            input_rx,
            config.clone(),
            motion_tx,
            sway_tx,
            pause_tx,
        ));

        Self {
            config,
            input_tx,
            motion_rx,
            sway_rx,
            pause_rx,
            writer,
            test: None,
        }
    }

    /// The session configuration
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// A sender the external pose source can feed
    #[must_use]
    pub fn input(&self) -> mpsc::Sender<SessionInput> {
        self.input_tx.clone()
    }

    /// Submit one pose sample
    pub async fn submit_sample(&self, sample: PoseSample) -> Result<()> {
        self.send_input(SessionInput::Sample(sample)).await
    }

    /// Establish the sway origin for this run (explicit calibration trigger)
    pub async fn calibrate_origin(&self, position: Vector3<f64>) -> Result<()> {
        self.send_input(SessionInput::SetOrigin(position)).await
    }

    /// Snapshot the current sway RMS values as the comparison baseline
    pub async fn capture_baseline(&self) -> Result<()> {
        self.send_input(SessionInput::CaptureBaseline).await
    }

    async fn send_input(&self, input: SessionInput) -> Result<()> {
        self.input_tx
            .send(input)
            .await
            .map_err(|_| Error::SessionError("signal-processing task is gone".to_string()))
    }

    /// Live head-motion snapshots
    #[must_use]
    pub fn motion(&self) -> watch::Receiver<MotionState> {
        self.motion_rx.clone()
    }

    /// Live sway snapshots
    #[must_use]
    pub fn sway(&self) -> watch::Receiver<SwaySnapshot> {
        self.sway_rx.clone()
    }

    /// Live auto-pause signal for the UI layer
    #[must_use]
    pub fn auto_pause(&self) -> watch::Receiver<Option<AutoPauseReason>> {
        self.pause_rx.clone()
    }

    /// True while a test run is active and uncollected
    #[must_use]
    pub fn test_running(&self) -> bool {
        self.test.is_some()
    }

    /// Start a test run; the cue order is determined by `seed`.
    ///
    /// Returns the sequencer's progress events, or `None` when a test is
    /// already active (starting is not reentrant; the previous run must be
    /// collected with [`Self::wait_for_report`] first).
    pub fn start_test(&mut self, seed: u64) -> Option<mpsc::UnboundedReceiver<SequencerEvent>> {
        if self.test.is_some() {
            warn!("start_test ignored: a test is already running");
            return None;
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let (interaction_tx, interaction_rx) = mpsc::channel(INTERACTION_QUEUE_DEPTH);
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let sequencer = TrialSequencer::new(
            self.config.trial.clone(),
            self.motion_rx.clone(),
            interaction_rx,
            event_tx,
            stop_rx,
            seed,
        );
        let handle = tokio::spawn(sequencer.run());

        self.test = Some(RunningTest {
            stop_tx,
            interaction_tx,
            handle,
        });
        Some(event_rx)
    }

    /// Sender for the running test's interaction channel, if any
    #[must_use]
    pub fn interaction_sender(&self) -> Option<mpsc::Sender<Interaction>> {
        self.test.as_ref().map(|t| t.interaction_tx.clone())
    }

    /// Forward a target selection from the interaction source.
    ///
    /// Outside a test run the selection is dropped; that is not an error.
    pub async fn interact(&self, direction: Direction) {
        if let Some(test) = &self.test {
            if test.interaction_tx.send(Interaction::now(direction)).await.is_err() {
                debug!("selection dropped: sequencer already finished");
            }
        } else {
            debug!("selection dropped: no test running");
        }
    }

    /// Request the running test to stop.
    ///
    /// The sequencer halts at its next suspension point, discards the
    /// in-flight trial and reports the run as incomplete.
    pub fn stop_test(&self) {
        if let Some(test) = &self.test {
            let _ = test.stop_tx.send(true);
        }
    }

    /// Await the running test and return its report.
    pub async fn wait_for_report(&mut self) -> Result<SessionReport> {
        let test = self
            .test
            .take()
            .ok_or_else(|| Error::SessionError("no test running".to_string()))?;
        test.handle
            .await
            .map_err(|e| Error::SessionError(format!("sequencer task failed: {}", e)))
    }

    /// Abort the session's signal-processing task. Only needed when tearing
    /// the session down early; dropping the session has the same effect once
    /// all input senders are gone.
    pub fn shutdown(&mut self) {
        self.stop_test();
        self.writer.abort();
    }
}

async fn run_writer(
    mut input_rx: mpsc::Receiver<SessionInput>,
    config: Config,
    motion_tx: watch::Sender<MotionState>,
    sway_tx: watch::Sender<SwaySnapshot>,
    pause_tx: watch::Sender<Option<AutoPauseReason>>,
) {
    let mut motion = MotionProcessor::new(config.motion.filter_alpha)
        .with_crossing_capacity(config.motion.crossing_window);
    let mut sway = SwayTracker::new(config.sway.filter_alpha, config.sway.history_window);
    let safety = SafetyMonitor::new(SafetyLimits {
        sway_limit_cm: config.safety.sway_limit_cm,
        yaw_rate_limit_deg_s: config.safety.yaw_rate_limit_deg_s,
    });

    while let Some(input) = input_rx.recv().await {
        match input {
            SessionInput::Sample(sample) => {
                let state = motion.update(&sample.rotation, sample.timestamp);
                motion_tx.send_replace(state);

                if let Some(snapshot) = sway.update(&sample.position, sample.timestamp) {
                    sway_tx.send_replace(snapshot);
                }

                let pause = safety.check(&sample.position, sway.origin(), state.yaw_rate_deg_s);
                pause_tx.send_replace(pause);
            }
            SessionInput::SetOrigin(position) => {
                debug!("sway origin calibrated at ({:.3}, {:.3}, {:.3}) m", position.x, position.y, position.z);
                sway.set_origin(position);
            }
            SessionInput::CaptureBaseline => {
                debug!("sway baseline captured");
                sway.capture_baseline();
            }
        }
    }
    debug!("pose input channel closed; session writer exiting");
}
