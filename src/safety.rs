//! Auto-pause safety predicate over the live motion signals.
//!
//! The monitor is a pure, stateless check: it neither debounces nor requires
//! a sustained violation, and it reports at most one reason per evaluation.
//! The UI layer owns the decision to actually halt the test.

use nalgebra::Vector3;

use crate::constants::{METERS_TO_CM, SWAY_LIMIT_CM, YAW_RATE_LIMIT_DEG_S};
use crate::types::AutoPauseReason;

/// Thresholds for the auto-pause rules.
#[derive(Debug, Clone, Copy)]
pub struct SafetyLimits {
    /// Maximum displacement from the calibrated origin (cm)
    pub sway_limit_cm: f64,
    /// Maximum filtered yaw rate magnitude (deg/s)
    pub yaw_rate_limit_deg_s: f64,
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self {
            sway_limit_cm: SWAY_LIMIT_CM,
            yaw_rate_limit_deg_s: YAW_RATE_LIMIT_DEG_S,
        }
    }
}

/// Stateless evaluator of the auto-pause rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct SafetyMonitor {
    limits: SafetyLimits,
}

impl SafetyMonitor {
    /// Create a monitor with the given limits
    #[must_use]
    pub fn new(limits: SafetyLimits) -> Self {
        Self { limits }
    }

    /// Evaluate the rules against the current values.
    ///
    /// Rules are checked in order (displacement, then yaw rate); the first
    /// match wins. Without a calibrated origin the whole check short-circuits
    /// to `None`.
    #[must_use]
    pub fn check(
        &self,
        position: &Vector3<f64>,
        origin: Option<&Vector3<f64>>,
        yaw_rate_deg_s: f64,
    ) -> Option<AutoPauseReason> {
        let origin = origin?;

        let displacement_cm = (position - origin).norm() * METERS_TO_CM;
        if displacement_cm > self.limits.sway_limit_cm {
            return Some(AutoPauseReason::SwayLimit);
        }
        if yaw_rate_deg_s.abs() > self.limits.yaw_rate_limit_deg_s {
            return Some(AutoPauseReason::ExcessYawRate);
        }
        None
    }
}
