//! Synthetic pose source and scripted subject.
//!
//! Drives a session end-to-end without headset hardware: the pose feed
//! produces a gentle yaw oscillation with positional jitter, and the subject
//! answers cues after a sampled reaction delay. Used by the demo binary and
//! the integration tests.

use log::debug;
use nalgebra::{UnitQuaternion, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, Instant};

use crate::session::SessionInput;
use crate::types::{Interaction, PoseSample, SequencerEvent};

/// Parameters for the synthetic pose stream and subject behavior.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Pose sample rate (Hz)
    pub sample_rate_hz: f64,
    /// Amplitude of the natural head-yaw oscillation (degrees)
    pub yaw_amplitude_deg: f64,
    /// Frequency of the yaw oscillation (Hz)
    pub yaw_frequency_hz: f64,
    /// Uniform positional jitter half-range (meters)
    pub position_jitter_m: f64,
    /// Mean simulated reaction latency (milliseconds)
    pub reaction_mean_ms: f64,
    /// Uniform reaction jitter half-range (milliseconds)
    pub reaction_jitter_ms: f64,
    /// Probability of selecting the cued target
    pub accuracy: f64,
    /// RNG seed
    pub seed: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 60.0,
            yaw_amplitude_deg: 1.5,
            yaw_frequency_hz: 0.4,
            position_jitter_m: 0.002,
            reaction_mean_ms: 250.0,
            reaction_jitter_ms: 60.0,
            accuracy: 0.9,
            seed: 42,
        }
    }
}

/// Feed synthetic pose samples into the session until the session is gone.
pub fn spawn_pose_feed(
    input: mpsc::Sender<SessionInput>,
    config: SimulatorConfig,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut ticker = time::interval(Duration::from_secs_f64(1.0 / config.sample_rate_hz));
        let started = Instant::now();

        loop {
            ticker.tick().await;
            let t = started.elapsed().as_secs_f64();

            let yaw_deg = config.yaw_amplitude_deg
                * (std::f64::consts::TAU * config.yaw_frequency_hz * t).sin();
            let rotation =
                UnitQuaternion::from_axis_angle(&Vector3::y_axis(), yaw_deg.to_radians());
            let position = Vector3::new(
                jitter(&mut rng, config.position_jitter_m),
                jitter(&mut rng, config.position_jitter_m),
                jitter(&mut rng, config.position_jitter_m),
            );

            let sample = PoseSample::new(rotation, position, t);
            if input.send(SessionInput::Sample(sample)).await.is_err() {
                debug!("session gone; pose feed exiting");
                break;
            }
        }
    })
}

/// Scripted subject: answers each cue after a sampled reaction delay,
/// selecting the cued target with the configured accuracy.
pub fn spawn_subject(
    mut events: mpsc::UnboundedReceiver<SequencerEvent>,
    interactions: mpsc::Sender<Interaction>,
    config: SimulatorConfig,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(1));

        while let Some(event) = events.recv().await {
            match event {
                SequencerEvent::CuePresented {
                    trial_index,
                    direction,
                } => {
                    let delay_ms = (config.reaction_mean_ms
                        + jitter(&mut rng, config.reaction_jitter_ms))
                    .max(0.0);
                    time::sleep(Duration::from_secs_f64(delay_ms / 1000.0)).await;

                    let chosen = if rng.gen::<f64>() < config.accuracy {
                        direction
                    } else {
                        direction.opposite()
                    };
                    debug!(
                        "subject answers trial {} with {:?} after {:.0} ms",
                        trial_index, chosen, delay_ms
                    );
                    if interactions.send(Interaction::now(chosen)).await.is_err() {
                        break;
                    }
                }
                SequencerEvent::Completed => break,
                _ => {}
            }
        }
    })
}

fn jitter(rng: &mut StdRng, half_range: f64) -> f64 {
    (rng.gen::<f64>() - 0.5) * 2.0 * half_range
}
