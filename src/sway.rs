//! Postural sway metrics over a stream of 3D head positions.
//!
//! All positions are expressed relative to a calibrated origin and scaled to
//! centimeters. With Y vertical, Z is the anterior-posterior axis and X the
//! medial-lateral axis. Updates before calibration are silent no-ops.

use std::collections::VecDeque;

use nalgebra::Vector3;

use crate::constants::{DEFAULT_FILTER_ALPHA, DEFAULT_SWAY_WINDOW, METERS_TO_CM};

/// Sway statistics snapshot for readers.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SwaySnapshot {
    /// Accumulated path length of the filtered position (cm); never decreases
    pub path_length_cm: f64,
    /// Distance of the filtered position from the origin (cm)
    pub displacement_cm: f64,
    /// RMS deviation on the anterior-posterior axis over the retained window (cm)
    pub ap_rms_cm: f64,
    /// RMS deviation on the medial-lateral axis over the retained window (cm)
    pub ml_rms_cm: f64,
    /// Number of samples currently retained in the window
    pub window_len: usize,
}

/// Converts a stream of head positions into postural-sway statistics.
pub struct SwayTracker {
    alpha: f64,
    window: usize,
    origin: Option<Vector3<f64>>,
    filtered_cm: Option<Vector3<f64>>,
    last_timestamp: Option<f64>,
    path_length_cm: f64,
    history: VecDeque<Vector3<f64>>,
    baseline: Option<(f64, f64)>,
    snapshot: SwaySnapshot,
}

impl SwayTracker {
    /// Create a tracker with the given smoothing constant and history window.
    ///
    /// # Panics
    ///
    /// Panics if alpha is not in (0, 1] or the window is empty
    #[must_use]
    pub fn new(alpha: f64, window: usize) -> Self {
        assert!(alpha > 0.0 && alpha <= 1.0, "Alpha must be in (0, 1]");
        assert!(window > 0, "History window must be non-empty");
        Self {
            alpha,
            window,
            origin: None,
            filtered_cm: None,
            last_timestamp: None,
            path_length_cm: 0.0,
            history: VecDeque::with_capacity(window),
            baseline: None,
            snapshot: SwaySnapshot::default(),
        }
    }

    /// The calibrated origin, if one has been set
    #[must_use]
    pub fn origin(&self) -> Option<&Vector3<f64>> {
        self.origin.as_ref()
    }

    /// Current statistics snapshot
    #[must_use]
    pub fn snapshot(&self) -> SwaySnapshot {
        self.snapshot
    }

    /// Establish the measurement origin for this run.
    ///
    /// Resets history, path length and any captured baseline; subsequent
    /// positions are expressed relative to this point.
    pub fn set_origin(&mut self, position: Vector3<f64>) {
        self.origin = Some(position);
        self.filtered_cm = None;
        self.last_timestamp = None;
        self.path_length_cm = 0.0;
        self.history.clear();
        self.baseline = None;
        self.snapshot = SwaySnapshot::default();
    }

    /// Snapshot the current RMS values for later percent-delta comparison
    pub fn capture_baseline(&mut self) {
        self.baseline = Some((self.snapshot.ap_rms_cm, self.snapshot.ml_rms_cm));
    }

    /// Percent change of the AP and ML RMS against the captured baseline.
    ///
    /// Reported as zero when no baseline exists or a baseline value is zero.
    #[must_use]
    pub fn baseline_delta_percent(&self) -> (f64, f64) {
        match self.baseline {
            Some((ap, ml)) => (
                percent_delta(self.snapshot.ap_rms_cm, ap),
                percent_delta(self.snapshot.ml_rms_cm, ml),
            ),
            None => (0.0, 0.0),
        }
    }

    /// Update with a new position sample and return the resulting snapshot.
    ///
    /// Returns `None` until an origin is calibrated. Stale samples
    /// (`dt <= 0`) leave the state untouched.
    pub fn update(&mut self, position: &Vector3<f64>, timestamp: f64) -> Option<SwaySnapshot> {
        let origin = self.origin?;

        if let Some(last) = self.last_timestamp {
            if timestamp <= last {
                return Some(self.snapshot);
            }
        }
        self.last_timestamp = Some(timestamp);

        let relative_cm = (position - origin) * METERS_TO_CM;
        let filtered = match self.filtered_cm {
            Some(previous) => {
                let filtered = previous + (relative_cm - previous) * self.alpha;
                self.path_length_cm += (filtered - previous).norm();
                filtered
            }
            None => relative_cm,
        };
        self.filtered_cm = Some(filtered);

        if self.history.len() >= self.window {
            self.history.pop_front();
        }
        self.history.push_back(filtered);

        self.snapshot = SwaySnapshot {
            path_length_cm: self.path_length_cm,
            displacement_cm: filtered.norm(),
            ap_rms_cm: self.axis_rms(2),
            ml_rms_cm: self.axis_rms(0),
            window_len: self.history.len(),
        };
        Some(self.snapshot)
    }

    /// RMS deviation from the window mean on one axis.
    ///
    /// Recomputed from the retained window on each update; a running
    /// population statistic over the window, not a whole-session RMS.
    fn axis_rms(&self, axis: usize) -> f64 {
        let n = self.history.len();
        if n == 0 {
            return 0.0;
        }
        let mean = self.history.iter().map(|p| p[axis]).sum::<f64>() / n as f64;
        let variance = self
            .history
            .iter()
            .map(|p| (p[axis] - mean).powi(2))
            .sum::<f64>()
            / n as f64;
        variance.sqrt()
    }
}

impl Default for SwayTracker {
    fn default() -> Self {
        Self::new(DEFAULT_FILTER_ALPHA, DEFAULT_SWAY_WINDOW)
    }
}

fn percent_delta(current: f64, baseline: f64) -> f64 {
    if baseline == 0.0 {
        0.0
    } else {
        (current - baseline) / baseline * 100.0
    }
}
