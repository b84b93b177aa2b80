//! Configuration management for the assessment engine

use crate::constants::{
    ANTICIPATION_THRESHOLD_SECS, CROSSING_WINDOW_CAPACITY, DEFAULT_FILTER_ALPHA,
    DEFAULT_SWAY_WINDOW, DEFAULT_TRIALS_PER_PHASE, FIXATION_HOLD_SECS, HEAD_MOTION_LIMIT_DEG,
    HEAD_MOTION_PENALTY_CAP, HEAD_MOTION_PENALTY_SCALE, INDICATOR_ERROR_RATE,
    INDICATOR_HEAD_MOTION_DEG, INDICATOR_LATENCY_MS, INTER_PHASE_PAUSE_SECS,
    INTER_TRIAL_INTERVAL_SECS, INVALIDATED_TRIAL_PENALTY, INVALIDATION_PAUSE_SECS,
    LATENCY_BENCHMARK_MS, LATENCY_PENALTY_PER_MS, MAX_SWAY_WINDOW, MIN_SWAY_WINDOW,
    POLL_INTERVAL_SECS, RESPONSE_TIMEOUT_SECS, SWAY_LIMIT_CM, YAW_RATE_LIMIT_DEG_S,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Pose signal processing configuration
    pub motion: MotionConfig,

    /// Postural sway configuration
    pub sway: SwayConfig,

    /// Auto-pause safety thresholds
    pub safety: SafetyConfig,

    /// Trial protocol timing and thresholds
    pub trial: TrialConfig,

    /// Clinical scoring constants
    pub scoring: ScoringConfig,
}

/// Pose signal processing parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Low-pass smoothing constant for the yaw rate (0, 1]
    pub filter_alpha: f64,

    /// Zero-crossing intervals retained for frequency estimation
    pub crossing_window: usize,
}

/// Postural sway parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SwayConfig {
    /// Per-axis position smoothing constant (0, 1]
    pub filter_alpha: f64,

    /// Samples retained for the RMS window
    pub history_window: usize,
}

/// Auto-pause safety thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    /// Displacement from the calibrated origin that triggers auto-pause (cm)
    pub sway_limit_cm: f64,

    /// Filtered yaw rate magnitude that triggers auto-pause (deg/s)
    pub yaw_rate_limit_deg_s: f64,
}

/// Trial protocol timing and thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrialConfig {
    /// Trials per test phase
    pub trials_per_phase: usize,

    /// Neutral fixation hold before each cue (seconds)
    pub fixation_hold_secs: f64,

    /// Response window measured from cue presentation (seconds)
    pub response_timeout_secs: f64,

    /// Response-window polling cadence (seconds)
    pub poll_interval_secs: f64,

    /// Responses faster than this are anticipation (seconds)
    pub anticipation_threshold_secs: f64,

    /// Head rotation from the phase baseline that invalidates a trial (degrees)
    pub head_motion_limit_deg: f64,

    /// Feedback pause after an invalidated trial (seconds)
    pub invalidation_pause_secs: f64,

    /// Minimum rest between trials (seconds)
    pub inter_trial_interval_secs: f64,

    /// Minimum rest between phases (seconds)
    pub inter_phase_pause_secs: f64,
}

/// Clinical scoring constants.
///
/// The penalty magnitudes are established protocol values; they are
/// configurable, not derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Latency benchmark (milliseconds)
    pub latency_benchmark_ms: f64,

    /// Points lost per millisecond of mean latency above the benchmark
    pub latency_penalty_per_ms: f64,

    /// Points lost per invalidated trial
    pub invalidated_trial_penalty: f64,

    /// Head-motion penalty scale (points per degree)
    pub head_motion_penalty_scale: f64,

    /// Cap on the head-motion penalty (points)
    pub head_motion_penalty_cap: f64,

    /// Mean latency contributing to the concussion indicator (milliseconds)
    pub indicator_latency_ms: f64,

    /// Error rate contributing to the concussion indicator
    pub indicator_error_rate: f64,

    /// Head motion contributing to the concussion indicator (degrees)
    pub indicator_head_motion_deg: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            filter_alpha: DEFAULT_FILTER_ALPHA,
            crossing_window: CROSSING_WINDOW_CAPACITY,
        }
    }
}

impl Default for SwayConfig {
    fn default() -> Self {
        Self {
            filter_alpha: DEFAULT_FILTER_ALPHA,
            history_window: DEFAULT_SWAY_WINDOW,
        }
    }
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            sway_limit_cm: SWAY_LIMIT_CM,
            yaw_rate_limit_deg_s: YAW_RATE_LIMIT_DEG_S,
        }
    }
}

impl Default for TrialConfig {
    fn default() -> Self {
        Self {
            trials_per_phase: DEFAULT_TRIALS_PER_PHASE,
            fixation_hold_secs: FIXATION_HOLD_SECS,
            response_timeout_secs: RESPONSE_TIMEOUT_SECS,
            poll_interval_secs: POLL_INTERVAL_SECS,
            anticipation_threshold_secs: ANTICIPATION_THRESHOLD_SECS,
            head_motion_limit_deg: HEAD_MOTION_LIMIT_DEG,
            invalidation_pause_secs: INVALIDATION_PAUSE_SECS,
            inter_trial_interval_secs: INTER_TRIAL_INTERVAL_SECS,
            inter_phase_pause_secs: INTER_PHASE_PAUSE_SECS,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            latency_benchmark_ms: LATENCY_BENCHMARK_MS,
            latency_penalty_per_ms: LATENCY_PENALTY_PER_MS,
            invalidated_trial_penalty: INVALIDATED_TRIAL_PENALTY,
            head_motion_penalty_scale: HEAD_MOTION_PENALTY_SCALE,
            head_motion_penalty_cap: HEAD_MOTION_PENALTY_CAP,
            indicator_latency_ms: INDICATOR_LATENCY_MS,
            indicator_error_rate: INDICATOR_ERROR_RATE,
            indicator_head_motion_deg: INDICATOR_HEAD_MOTION_DEG,
        }
    }
}

impl TrialConfig {
    /// Fixation hold as a duration
    #[must_use]
    pub fn fixation_hold(&self) -> Duration {
        Duration::from_secs_f64(self.fixation_hold_secs)
    }

    /// Response timeout as a duration
    #[must_use]
    pub fn response_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.response_timeout_secs)
    }

    /// Poll interval as a duration
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs_f64(self.poll_interval_secs)
    }

    /// Anticipation threshold as a duration
    #[must_use]
    pub fn anticipation_threshold(&self) -> Duration {
        Duration::from_secs_f64(self.anticipation_threshold_secs)
    }

    /// Invalidation feedback pause as a duration
    #[must_use]
    pub fn invalidation_pause(&self) -> Duration {
        Duration::from_secs_f64(self.invalidation_pause_secs)
    }

    /// Inter-trial interval as a duration
    #[must_use]
    pub fn inter_trial_interval(&self) -> Duration {
        Duration::from_secs_f64(self.inter_trial_interval_secs)
    }

    /// Inter-phase pause as a duration
    #[must_use]
    pub fn inter_phase_pause(&self) -> Duration {
        Duration::from_secs_f64(self.inter_phase_pause_secs)
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        serde_yaml::from_str(&content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.motion.filter_alpha) || self.motion.filter_alpha == 0.0 {
            return Err(Error::ConfigError(
                "Motion filter alpha must be in (0, 1]".to_string(),
            ));
        }
        if self.motion.crossing_window < 2 {
            return Err(Error::ConfigError(
                "Crossing window must hold at least 2 intervals".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.sway.filter_alpha) || self.sway.filter_alpha == 0.0 {
            return Err(Error::ConfigError(
                "Sway filter alpha must be in (0, 1]".to_string(),
            ));
        }
        if !(MIN_SWAY_WINDOW..=MAX_SWAY_WINDOW).contains(&self.sway.history_window) {
            return Err(Error::ConfigError(format!(
                "Sway history window must be between {} and {}",
                MIN_SWAY_WINDOW, MAX_SWAY_WINDOW
            )));
        }

        if self.safety.sway_limit_cm <= 0.0 {
            return Err(Error::ConfigError(
                "Sway limit must be greater than 0".to_string(),
            ));
        }
        if self.safety.yaw_rate_limit_deg_s <= 0.0 {
            return Err(Error::ConfigError(
                "Yaw rate limit must be greater than 0".to_string(),
            ));
        }

        if self.trial.trials_per_phase == 0 {
            return Err(Error::ConfigError(
                "Trials per phase must be greater than 0".to_string(),
            ));
        }
        if self.trial.poll_interval_secs <= 0.0 {
            return Err(Error::ConfigError(
                "Poll interval must be greater than 0".to_string(),
            ));
        }
        if self.trial.poll_interval_secs >= self.trial.response_timeout_secs {
            return Err(Error::ConfigError(
                "Poll interval must be shorter than the response timeout".to_string(),
            ));
        }
        if self.trial.anticipation_threshold_secs >= self.trial.response_timeout_secs {
            return Err(Error::ConfigError(
                "Anticipation threshold must be shorter than the response timeout".to_string(),
            ));
        }
        if self.trial.head_motion_limit_deg <= 0.0 {
            return Err(Error::ConfigError(
                "Head motion limit must be greater than 0".to_string(),
            ));
        }

        if self.scoring.latency_penalty_per_ms < 0.0
            || self.scoring.invalidated_trial_penalty < 0.0
            || self.scoring.head_motion_penalty_scale < 0.0
            || self.scoring.head_motion_penalty_cap < 0.0
        {
            return Err(Error::ConfigError(
                "Scoring penalties must not be negative".to_string(),
            ));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Assessment Engine Configuration

# Pose signal processing
motion:
  filter_alpha: 0.1
  crossing_window: 10

# Postural sway
sway:
  filter_alpha: 0.1
  history_window: 1000

# Auto-pause safety thresholds
safety:
  sway_limit_cm: 25.0
  yaw_rate_limit_deg_s: 400.0

# Trial protocol
trial:
  trials_per_phase: 8
  fixation_hold_secs: 0.8
  response_timeout_secs: 3.0
  poll_interval_secs: 0.05
  anticipation_threshold_secs: 0.120
  head_motion_limit_deg: 6.0
  invalidation_pause_secs: 1.0
  inter_trial_interval_secs: 1.2
  inter_phase_pause_secs: 2.0

# Clinical scoring
scoring:
  latency_benchmark_ms: 200.0
  latency_penalty_per_ms: 0.3
  invalidated_trial_penalty: 5.0
  head_motion_penalty_scale: 2.0
  head_motion_penalty_cap: 30.0
  indicator_latency_ms: 300.0
  indicator_error_rate: 0.15
  indicator_head_motion_deg: 10.0
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.trial.trials_per_phase, 8);
        assert_eq!(config.safety.sway_limit_cm, 25.0);
    }

    #[test]
    fn test_example_config_parses() {
        let config: Config = serde_yaml::from_str(EXAMPLE_CONFIG).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.sway.history_window, 1000);
        assert!((config.trial.anticipation_threshold_secs - 0.120).abs() < 1e-12);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = serde_yaml::from_str("trial:\n  trials_per_phase: 4\n").unwrap();
        assert_eq!(config.trial.trials_per_phase, 4);
        assert_eq!(config.trial.response_timeout_secs, 3.0);
        assert_eq!(config.motion.filter_alpha, 0.1);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.motion.filter_alpha = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.sway.history_window = 10;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.trial.poll_interval_secs = 5.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.scoring.latency_penalty_per_ms = -1.0;
        assert!(config.validate().is_err());
    }
}
