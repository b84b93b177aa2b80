//! Motion & trial assessment engine for head-mounted concussion screening.
//!
//! This library is the real-time core of a clinical assessment suite. It
//! converts a continuous stream of head-pose samples into clinically
//! meaningful motion signals and drives a timing-critical stimulus/response
//! trial protocol (the saccadic eye-movement test) whose validity is gated by
//! those signals.
//!
//! The processing pipeline consists of:
//! 1. Pose signal processing: filtered yaw/pitch, yaw rate and an
//!    oscillation-frequency estimate
//! 2. Postural sway metrics relative to a calibrated origin
//! 3. A safety monitor raising an auto-pause signal on threshold breaches
//! 4. The trial sequencer running cue/response trials with motion-gated
//!    validity
//! 5. Result aggregation into summary statistics and a clinical score
//!
//! Sensor-derived state is owned by a single writer; readers observe copy-out
//! snapshots over `watch` channels, so the sequencer's per-tick checks never
//! see a torn read.
//!
//! # Examples
//!
//! ## Processing pose samples
//!
//! ```
//! use nalgebra::{UnitQuaternion, Vector3};
//! use saccade_assessment::motion::MotionProcessor;
//!
//! let mut processor = MotionProcessor::default();
//! let rotation = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 0.2);
//!
//! processor.update(&rotation, 0.000);
//! let state = processor.update(&rotation, 0.016);
//! println!("yaw {:.1}°, rate {:.1}°/s", state.yaw_deg, state.yaw_rate_deg_s);
//! ```
//!
//! ## Tracking postural sway
//!
//! ```
//! use nalgebra::Vector3;
//! use saccade_assessment::sway::SwayTracker;
//!
//! let mut tracker = SwayTracker::default();
//! tracker.set_origin(Vector3::zeros());
//!
//! let snapshot = tracker.update(&Vector3::new(0.01, 0.0, 0.02), 0.1).unwrap();
//! println!("path {:.2} cm, AP RMS {:.2} cm", snapshot.path_length_cm, snapshot.ap_rms_cm);
//! ```
//!
//! ## Running a full assessment session
//!
//! ```no_run
//! use nalgebra::Vector3;
//! use saccade_assessment::config::Config;
//! use saccade_assessment::results;
//! use saccade_assessment::session::AssessmentSession;
//!
//! #[tokio::main]
//! async fn main() -> saccade_assessment::Result<()> {
//!     let config = Config::default();
//!     let scoring = config.scoring.clone();
//!     let mut session = AssessmentSession::new(config);
//!
//!     // The pose source feeds samples through session.input().
//!     session.calibrate_origin(Vector3::zeros()).await?;
//!
//!     let _events = session.start_test(7);
//!     // The interaction source forwards selections via session.interact(..).
//!
//!     let report = session.wait_for_report().await?;
//!     let result = results::aggregate(&report.trials, report.completed, &scoring);
//!     println!("clinical score: {:.0} / 100", result.clinical_score);
//!     Ok(())
//! }
//! ```

/// Pose signal processing: yaw, pitch, yaw rate and oscillation frequency
pub mod motion;

/// Postural sway metrics relative to a calibrated origin
pub mod sway;

/// Auto-pause safety rules over the live motion signals
pub mod safety;

/// Trial sequencing state machine for the saccadic test
pub mod sequencer;

/// Result aggregation and clinical scoring
pub mod results;

/// Session engine wiring the components together
pub mod session;

/// Synthetic pose source and scripted subject for simulated sessions
pub mod simulate;

/// Core data contracts shared across the engine
pub mod types;

/// Error types and result handling
pub mod error;

/// Constants used throughout the engine
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};
