//! Trial sequencing state machine for the saccadic eye-movement test.
//!
//! The sequencer runs as a single cooperative task: trials execute strictly
//! one at a time, and the task suspends only at the documented waits
//! (fixation hold, response-window poll, inter-trial interval, inter-phase
//! pause). Live head motion is read from a `watch` snapshot published by the
//! session's single writer, so every per-tick check sees a consistent
//! [`MotionState`], never a torn read.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, Duration, Instant};

use crate::config::TrialConfig;
use crate::motion::{wrap_degrees, MotionState};
use crate::types::{
    Direction, Interaction, SequencerEvent, SessionPhase, TestAxis, Trial, TrialOutcome,
};

/// Outcome of a test run: the finalized trial list plus a completeness flag.
///
/// A stopped or aborted run keeps the trials finalized before the stop and is
/// marked `completed: false`; the in-flight trial is discarded, never
/// recorded.
#[derive(Debug, Clone)]
pub struct SessionReport {
    /// Trials finalized during the run, in presentation order
    pub trials: Vec<Trial>,
    /// True only when both phases ran to the end
    pub completed: bool,
}

/// Runs the scripted cue/response protocol over two test phases.
pub struct TrialSequencer {
    config: TrialConfig,
    motion_rx: watch::Receiver<MotionState>,
    interaction_rx: mpsc::Receiver<Interaction>,
    event_tx: mpsc::UnboundedSender<SequencerEvent>,
    stop_rx: watch::Receiver<bool>,
    rng: StdRng,
    phase: SessionPhase,
    trials: Vec<Trial>,
    baseline_yaw_deg: f64,
    baseline_pitch_deg: f64,
    started_at: Instant,
}

impl TrialSequencer {
    /// Create a sequencer wired to its collaborators.
    ///
    /// `motion_rx` supplies live head-motion snapshots, `interaction_rx`
    /// carries target selections from the interaction source, `event_tx`
    /// surfaces progress to the UI layer and `stop_rx` cancels the run. The
    /// cue order is fully determined by `seed`.
    #[must_use]
    pub fn new(
        config: TrialConfig,
        motion_rx: watch::Receiver<MotionState>,
        interaction_rx: mpsc::Receiver<Interaction>,
        event_tx: mpsc::UnboundedSender<SequencerEvent>,
        stop_rx: watch::Receiver<bool>,
        seed: u64,
    ) -> Self {
        Self {
            config,
            motion_rx,
            interaction_rx,
            event_tx,
            stop_rx,
            rng: StdRng::seed_from_u64(seed),
            phase: SessionPhase::WaitingToStart,
            trials: Vec::new(),
            baseline_yaw_deg: 0.0,
            baseline_pitch_deg: 0.0,
            started_at: Instant::now(),
        }
    }

    /// Current phase marker
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Run the horizontal phase, then the vertical phase, to completion or
    /// until stopped. Consumes the sequencer; a run is never re-entered.
    pub async fn run(mut self) -> SessionReport {
        self.started_at = Instant::now();

        for (ordinal, axis) in [TestAxis::Horizontal, TestAxis::Vertical]
            .into_iter()
            .enumerate()
        {
            if ordinal > 0 && !self.pause(self.config.inter_phase_pause()).await {
                return self.stopped();
            }
            if !self.run_phase(axis).await {
                return self.stopped();
            }
        }

        self.phase = SessionPhase::Completed;
        self.emit(SequencerEvent::Completed);
        info!("test completed with {} trials", self.trials.len());
        SessionReport {
            trials: self.trials,
            completed: true,
        }
    }

    fn stopped(self) -> SessionReport {
        debug!(
            "test stopped in {:?} after {} finalized trials; in-flight trial discarded",
            self.phase,
            self.trials.len()
        );
        SessionReport {
            trials: self.trials,
            completed: false,
        }
    }

    async fn run_phase(&mut self, axis: TestAxis) -> bool {
        self.phase = match axis {
            TestAxis::Horizontal => SessionPhase::Horizontal,
            TestAxis::Vertical => SessionPhase::Vertical,
        };

        // Baseline is re-captured at each phase start, never carried over.
        let baseline = *self.motion_rx.borrow();
        self.baseline_yaw_deg = baseline.yaw_deg;
        self.baseline_pitch_deg = baseline.pitch_deg;
        info!(
            "{:?} phase started; baseline yaw {:.1}°, pitch {:.1}°",
            axis, self.baseline_yaw_deg, self.baseline_pitch_deg
        );
        self.emit(SequencerEvent::PhaseStarted(axis));

        let cues = build_cue_sequence(axis, self.config.trials_per_phase, &mut self.rng);
        for (position, direction) in cues.into_iter().enumerate() {
            if position > 0 && !self.pause(self.config.inter_trial_interval()).await {
                return false;
            }
            if !self.run_trial(direction, axis).await {
                return false;
            }
        }
        true
    }

    /// Run one trial to a terminal outcome. Returns false when the run was
    /// stopped; the in-flight trial is then dropped without a record.
    async fn run_trial(&mut self, direction: Direction, axis: TestAxis) -> bool {
        let index = self.trials.len();

        self.emit(SequencerEvent::FixationStarted { trial_index: index });
        if !self.pause(self.config.fixation_hold()).await {
            return false;
        }

        // Selections made before the cue belong to no trial.
        while self.interaction_rx.try_recv().is_ok() {}

        self.emit(SequencerEvent::CuePresented {
            trial_index: index,
            direction,
        });
        let cue_at = Instant::now();
        let cue_offset_ms = cue_at.saturating_duration_since(self.started_at).as_secs_f64() * 1000.0;

        loop {
            if !self.pause(self.config.poll_interval()).await {
                return false;
            }

            let motion = *self.motion_rx.borrow();
            let yaw_dev = wrap_degrees(motion.yaw_deg - self.baseline_yaw_deg);
            let pitch_dev = wrap_degrees(motion.pitch_deg - self.baseline_pitch_deg);

            // Per-tick precedence: head-motion violation, then interaction,
            // then timeout. A violation ends the trial even when a correct
            // selection arrived in the same tick.
            if yaw_dev.abs() > self.config.head_motion_limit_deg
                || pitch_dev.abs() > self.config.head_motion_limit_deg
            {
                self.finalize(
                    index,
                    direction,
                    axis,
                    cue_offset_ms,
                    None,
                    TrialOutcome::Invalidated,
                    yaw_dev,
                    pitch_dev,
                );
                // Hold so the UI can surface the invalidation feedback.
                return self.pause(self.config.invalidation_pause()).await;
            }

            if let Some(interaction) = self.next_interaction() {
                let latency = interaction.at.saturating_duration_since(cue_at);
                let outcome = if latency < self.config.anticipation_threshold() {
                    // Too fast for a genuine reaction; the selected
                    // direction is irrelevant.
                    TrialOutcome::Anticipation
                } else if interaction.direction == direction {
                    TrialOutcome::Correct
                } else {
                    TrialOutcome::WrongTarget
                };
                self.finalize(
                    index,
                    direction,
                    axis,
                    cue_offset_ms,
                    Some(latency.as_secs_f64() * 1000.0),
                    outcome,
                    yaw_dev,
                    pitch_dev,
                );
                return true;
            }

            if cue_at.elapsed() >= self.config.response_timeout() {
                self.finalize(
                    index,
                    direction,
                    axis,
                    cue_offset_ms,
                    None,
                    TrialOutcome::Timeout,
                    yaw_dev,
                    pitch_dev,
                );
                return true;
            }
        }
    }

    /// First selection since the last drain; extra selections queued behind
    /// it in the same tick are discarded.
    fn next_interaction(&mut self) -> Option<Interaction> {
        let first = self.interaction_rx.try_recv().ok()?;
        while self.interaction_rx.try_recv().is_ok() {}
        Some(first)
    }

    #[allow(clippy::too_many_arguments)]
    fn finalize(
        &mut self,
        index: usize,
        cue_direction: Direction,
        test_axis: TestAxis,
        cue_offset_ms: f64,
        latency_ms: Option<f64>,
        outcome: TrialOutcome,
        head_yaw_deg: f64,
        head_pitch_deg: f64,
    ) {
        let trial = Trial {
            index,
            cue_direction,
            test_axis,
            cue_offset_ms,
            latency_ms,
            outcome,
            head_yaw_deg,
            head_pitch_deg,
        };
        info!(
            "trial {} finalized: {:?} {:?}, latency {:?} ms",
            index, cue_direction, outcome, latency_ms
        );
        self.trials.push(trial.clone());
        self.emit(SequencerEvent::TrialFinalized(trial));
    }

    fn emit(&self, event: SequencerEvent) {
        // The UI layer may be gone; losing progress events must not stop the test.
        let _ = self.event_tx.send(event);
    }

    /// Sleep for `duration`, waking early on stop. Returns false when stopped.
    async fn pause(&mut self, duration: Duration) -> bool {
        if *self.stop_rx.borrow() {
            return false;
        }
        tokio::select! {
            _ = time::sleep(duration) => true,
            _ = wait_for_stop(&mut self.stop_rx) => false,
        }
    }
}

async fn wait_for_stop(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow() {
            return;
        }
        if rx.changed().await.is_err() {
            // Controller dropped; treat as a stop request.
            return;
        }
    }
}

/// Build a balanced, shuffled cue sequence for one phase: equal counts per
/// direction, order randomized, capped to the requested trial count.
fn build_cue_sequence(axis: TestAxis, count: usize, rng: &mut StdRng) -> Vec<Direction> {
    let per_direction = (count + 1) / 2;
    let mut cues = Vec::with_capacity(per_direction * 2);
    for direction in axis.directions() {
        cues.extend(std::iter::repeat(direction).take(per_direction));
    }
    cues.shuffle(rng);
    cues.truncate(count);
    cues
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cue_sequence_balanced_even() {
        let mut rng = StdRng::seed_from_u64(7);
        let cues = build_cue_sequence(TestAxis::Horizontal, 8, &mut rng);
        assert_eq!(cues.len(), 8);
        let lefts = cues.iter().filter(|d| **d == Direction::Left).count();
        assert_eq!(lefts, 4);
        assert!(cues.iter().all(|d| d.axis() == TestAxis::Horizontal));
    }

    #[test]
    fn test_cue_sequence_odd_count_capped() {
        let mut rng = StdRng::seed_from_u64(7);
        let cues = build_cue_sequence(TestAxis::Vertical, 5, &mut rng);
        assert_eq!(cues.len(), 5);
        let ups = cues.iter().filter(|d| **d == Direction::Up).count();
        let downs = cues.len() - ups;
        assert!(ups.abs_diff(downs) <= 1);
        assert!(cues.iter().all(|d| d.axis() == TestAxis::Vertical));
    }

    #[test]
    fn test_cue_sequence_seed_determinism() {
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        assert_eq!(
            build_cue_sequence(TestAxis::Horizontal, 8, &mut a),
            build_cue_sequence(TestAxis::Horizontal, 8, &mut b)
        );
    }
}
