//! Pose signal processing: filtered yaw/pitch, yaw rate and oscillation frequency.
//!
//! The processor is the single writer of its [`MotionState`]; readers (the
//! trial sequencer, the safety monitor) receive copy-out snapshots, never a
//! reference into mutable state.

use std::collections::VecDeque;

use nalgebra::UnitQuaternion;

use crate::constants::{CROSSING_WINDOW_CAPACITY, DEFAULT_FILTER_ALPHA};

/// Filtered motion signals derived from the pose stream.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MotionState {
    /// Heading about the vertical axis, degrees, wrapped to (-180, 180]
    pub yaw_deg: f64,
    /// Elevation angle, degrees
    pub pitch_deg: f64,
    /// Low-pass filtered yaw rate (deg/s). Zero until two samples with dt > 0 arrived
    pub yaw_rate_deg_s: f64,
    /// Zero-crossing oscillation frequency estimate (Hz). Zero until two crossing intervals exist
    pub frequency_hz: f64,
    /// Timestamp of the last accepted sample (seconds)
    pub last_timestamp: f64,
    /// Number of accepted samples
    pub sample_count: u64,
}

/// Wrap an angle difference across the ±180° seam.
///
/// A real rotation crossing the seam otherwise reads as a spurious ~360° jump.
#[must_use]
pub fn wrap_degrees(delta: f64) -> f64 {
    if delta > 180.0 {
        delta - 360.0
    } else if delta < -180.0 {
        delta + 360.0
    } else {
        delta
    }
}

/// Extract yaw and pitch (degrees) from a head orientation.
///
/// Yaw is the rotation about the vertical axis via `atan2(r13, r33)`, pitch
/// comes from `asin(-r23)`; the same convention the rest of the suite uses.
#[must_use]
pub fn yaw_pitch_degrees(rotation: &UnitQuaternion<f64>) -> (f64, f64) {
    let rot = rotation.to_rotation_matrix();
    let m = rot.matrix();
    let yaw = m[(0, 2)].atan2(m[(2, 2)]);
    let pitch = (-m[(1, 2)]).clamp(-1.0, 1.0).asin();
    (yaw.to_degrees(), pitch.to_degrees())
}

/// Converts raw orientation samples into filtered motion signals.
pub struct MotionProcessor {
    alpha: f64,
    state: MotionState,
    last_yaw_deg: Option<f64>,
    last_timestamp: Option<f64>,
    rate_initialized: bool,
    crossing_intervals: VecDeque<f64>,
    crossing_capacity: usize,
    last_crossing_at: Option<f64>,
}

impl MotionProcessor {
    /// Create a processor with the given low-pass smoothing constant.
    ///
    /// # Panics
    ///
    /// Panics if alpha is not in the range (0, 1]
    #[must_use]
    pub fn new(alpha: f64) -> Self {
        assert!(alpha > 0.0 && alpha <= 1.0, "Alpha must be in (0, 1]");
        Self {
            alpha,
            state: MotionState::default(),
            last_yaw_deg: None,
            last_timestamp: None,
            rate_initialized: false,
            crossing_intervals: VecDeque::with_capacity(CROSSING_WINDOW_CAPACITY),
            crossing_capacity: CROSSING_WINDOW_CAPACITY,
            last_crossing_at: None,
        }
    }

    /// Override the zero-crossing interval window capacity
    #[must_use]
    pub fn with_crossing_capacity(mut self, capacity: usize) -> Self {
        assert!(capacity >= 2, "Crossing window must hold at least 2 intervals");
        self.crossing_capacity = capacity;
        self
    }

    /// Current state snapshot
    #[must_use]
    pub fn state(&self) -> MotionState {
        self.state
    }

    /// Update with a new orientation sample and return the resulting snapshot.
    ///
    /// A stale sample (`dt <= 0` against the last accepted one) leaves the
    /// state untouched; that is a no-op, not an error.
    pub fn update(&mut self, rotation: &UnitQuaternion<f64>, timestamp: f64) -> MotionState {
        let (yaw_deg, pitch_deg) = yaw_pitch_degrees(rotation);

        let (last_yaw, last_t) = match (self.last_yaw_deg, self.last_timestamp) {
            (Some(yaw), Some(t)) => (yaw, t),
            _ => {
                // First sample only seeds the state; no rate is valid yet.
                self.state.yaw_deg = yaw_deg;
                self.state.pitch_deg = pitch_deg;
                self.state.last_timestamp = timestamp;
                self.state.sample_count = 1;
                self.last_yaw_deg = Some(yaw_deg);
                self.last_timestamp = Some(timestamp);
                return self.state;
            }
        };

        let dt = timestamp - last_t;
        if dt <= 0.0 {
            return self.state;
        }

        let delta_yaw = wrap_degrees(yaw_deg - last_yaw);
        let rate = delta_yaw / dt;
        self.state.yaw_rate_deg_s = if self.rate_initialized {
            self.alpha * rate + (1.0 - self.alpha) * self.state.yaw_rate_deg_s
        } else {
            self.rate_initialized = true;
            rate
        };

        self.track_zero_crossing(last_yaw, yaw_deg, timestamp);

        self.state.yaw_deg = yaw_deg;
        self.state.pitch_deg = pitch_deg;
        self.state.last_timestamp = timestamp;
        self.state.sample_count += 1;
        self.last_yaw_deg = Some(yaw_deg);
        self.last_timestamp = Some(timestamp);

        self.state
    }

    /// Reset all filter and frequency state
    pub fn reset(&mut self) {
        self.state = MotionState::default();
        self.last_yaw_deg = None;
        self.last_timestamp = None;
        self.rate_initialized = false;
        self.crossing_intervals.clear();
        self.last_crossing_at = None;
    }

    /// Detect a sign change of yaw about the neutral heading and refresh the
    /// frequency estimate. A sample landing exactly on zero counts as the
    /// crossing itself, so the following pair does not count it again.
    fn track_zero_crossing(&mut self, last_yaw: f64, yaw: f64, timestamp: f64) {
        let crossed = (last_yaw < 0.0 && yaw >= 0.0) || (last_yaw > 0.0 && yaw <= 0.0);
        if !crossed {
            return;
        }

        if let Some(previous) = self.last_crossing_at {
            if self.crossing_intervals.len() >= self.crossing_capacity {
                self.crossing_intervals.pop_front();
            }
            self.crossing_intervals.push_back(timestamp - previous);

            if self.crossing_intervals.len() >= 2 {
                let mean = self.crossing_intervals.iter().sum::<f64>()
                    / self.crossing_intervals.len() as f64;
                // Two crossings per full oscillation cycle.
                self.state.frequency_hz = 1.0 / (2.0 * mean);
            }
        }
        self.last_crossing_at = Some(timestamp);
    }
}

impl Default for MotionProcessor {
    fn default() -> Self {
        Self::new(DEFAULT_FILTER_ALPHA)
    }
}
