//! Clinical and signal-processing constants used throughout the engine.

/// Smoothing constant for the single-pole low-pass filters (yaw rate, sway position)
pub const DEFAULT_FILTER_ALPHA: f64 = 0.1;

/// Capacity of the zero-crossing interval window for frequency estimation
pub const CROSSING_WINDOW_CAPACITY: usize = 10;

/// Default number of retained sway samples for RMS computation
pub const DEFAULT_SWAY_WINDOW: usize = 1000;

/// Smallest permitted sway history window
pub const MIN_SWAY_WINDOW: usize = 100;

/// Largest permitted sway history window
pub const MAX_SWAY_WINDOW: usize = 1000;

/// Meters to centimeters conversion factor
pub const METERS_TO_CM: f64 = 100.0;

/// Displacement from the calibrated origin that triggers auto-pause (cm)
pub const SWAY_LIMIT_CM: f64 = 25.0;

/// Filtered yaw rate magnitude that triggers auto-pause (degrees per second)
pub const YAW_RATE_LIMIT_DEG_S: f64 = 400.0;

/// Default number of trials per test phase
pub const DEFAULT_TRIALS_PER_PHASE: usize = 8;

/// Fixation hold before each cue (seconds)
pub const FIXATION_HOLD_SECS: f64 = 0.8;

/// Response window measured from cue presentation (seconds)
pub const RESPONSE_TIMEOUT_SECS: f64 = 3.0;

/// Response-window polling cadence (seconds); bounds the worst-case timing error
pub const POLL_INTERVAL_SECS: f64 = 0.05;

/// Responses faster than this are classified as anticipation (seconds)
pub const ANTICIPATION_THRESHOLD_SECS: f64 = 0.120;

/// Head rotation from the phase baseline that invalidates a trial (degrees)
pub const HEAD_MOTION_LIMIT_DEG: f64 = 6.0;

/// Feedback pause after an invalidated trial (seconds)
pub const INVALIDATION_PAUSE_SECS: f64 = 1.0;

/// Minimum rest between trials (seconds)
pub const INTER_TRIAL_INTERVAL_SECS: f64 = 1.2;

/// Minimum rest between phases (seconds)
pub const INTER_PHASE_PAUSE_SECS: f64 = 2.0;

/// Latency benchmark for the clinical score (milliseconds)
pub const LATENCY_BENCHMARK_MS: f64 = 200.0;

/// Score points lost per millisecond of mean latency above the benchmark
pub const LATENCY_PENALTY_PER_MS: f64 = 0.3;

/// Score points lost per invalidated trial
pub const INVALIDATED_TRIAL_PENALTY: f64 = 5.0;

/// Head-motion score penalty scale (points per degree)
pub const HEAD_MOTION_PENALTY_SCALE: f64 = 2.0;

/// Cap on the head-motion score penalty (points)
pub const HEAD_MOTION_PENALTY_CAP: f64 = 30.0;

/// Mean latency above this contributes to the concussion indicator (milliseconds)
pub const INDICATOR_LATENCY_MS: f64 = 300.0;

/// Error rate above this contributes to the concussion indicator
pub const INDICATOR_ERROR_RATE: f64 = 0.15;

/// Head motion above this contributes to the concussion indicator (degrees)
pub const INDICATOR_HEAD_MOTION_DEG: f64 = 10.0;
