//! Core data contracts shared across the engine.
//!
//! These types form the boundary with the excluded collaborators: the pose
//! source produces [`PoseSample`]s, the interaction source produces
//! [`Interaction`]s, and the UI layer consumes [`SequencerEvent`]s and the
//! auto-pause signal. None of them carry rendering or storage handles.

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// A single orientation + position sample from the external pose source.
#[derive(Debug, Clone)]
pub struct PoseSample {
    /// Head orientation in the world frame
    pub rotation: UnitQuaternion<f64>,
    /// Head position in meters, world frame
    pub position: Vector3<f64>,
    /// Monotonic timestamp in seconds
    pub timestamp: f64,
}

impl PoseSample {
    /// Create a new pose sample
    #[must_use]
    pub fn new(rotation: UnitQuaternion<f64>, position: Vector3<f64>, timestamp: f64) -> Self {
        Self {
            rotation,
            position,
            timestamp,
        }
    }
}

/// Cue / target direction for a saccade trial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Leftward target
    Left,
    /// Rightward target
    Right,
    /// Upward target
    Up,
    /// Downward target
    Down,
}

impl Direction {
    /// The test axis this direction belongs to
    #[must_use]
    pub fn axis(&self) -> TestAxis {
        match self {
            Direction::Left | Direction::Right => TestAxis::Horizontal,
            Direction::Up | Direction::Down => TestAxis::Vertical,
        }
    }

    /// The other direction on the same axis
    #[must_use]
    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }
}

/// Which saccade axis a test phase exercises
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestAxis {
    /// Left/right saccades
    Horizontal,
    /// Up/down saccades
    Vertical,
}

impl TestAxis {
    /// The two cue directions used on this axis
    #[must_use]
    pub fn directions(&self) -> [Direction; 2] {
        match self {
            TestAxis::Horizontal => [Direction::Left, Direction::Right],
            TestAxis::Vertical => [Direction::Up, Direction::Down],
        }
    }
}

/// Terminal outcome of a trial. Every finalized trial has exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrialOutcome {
    /// The cued target was selected within the response window
    Correct,
    /// A non-cued target was selected
    WrongTarget,
    /// No selection arrived before the response window closed
    Timeout,
    /// Head motion exceeded the stability threshold during the window
    Invalidated,
    /// The selection arrived too fast to be a genuine reaction
    Anticipation,
}

impl TrialOutcome {
    /// True when the subject produced a selection (correct or not)
    #[must_use]
    pub fn is_response(&self) -> bool {
        matches!(
            self,
            TrialOutcome::Correct | TrialOutcome::WrongTarget | TrialOutcome::Anticipation
        )
    }
}

/// A single cue/response trial record.
///
/// Created at cue presentation and appended immutably to the session's trial
/// list when a terminal outcome is reached; never re-opened afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trial {
    /// Position of this trial in the session (0-based)
    pub index: usize,
    /// Direction that was cued
    pub cue_direction: Direction,
    /// Axis of the phase this trial belongs to
    pub test_axis: TestAxis,
    /// Cue presentation time as an offset from test start (milliseconds)
    pub cue_offset_ms: f64,
    /// Reaction latency, present only when the subject responded
    pub latency_ms: Option<f64>,
    /// Terminal outcome
    pub outcome: TrialOutcome,
    /// Yaw deviation from the phase baseline when the trial ended (degrees)
    pub head_yaw_deg: f64,
    /// Pitch deviation from the phase baseline when the trial ended (degrees)
    pub head_pitch_deg: f64,
}

/// Phase marker for a test run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// No test running yet
    WaitingToStart,
    /// Left/right trials in progress
    Horizontal,
    /// Up/down trials in progress
    Vertical,
    /// All trials finalized
    Completed,
}

/// Target selection reported by the external interaction source.
///
/// The engine does not know how the target was selected (gaze, pointer,
/// touch); the selection is opaque input.
#[derive(Debug, Clone, Copy)]
pub struct Interaction {
    /// Direction of the selected target
    pub direction: Direction,
    /// When the selection was made
    pub at: Instant,
}

impl Interaction {
    /// An interaction stamped with the current time
    #[must_use]
    pub fn now(direction: Direction) -> Self {
        Self {
            direction,
            at: Instant::now(),
        }
    }
}

/// Reason the safety monitor requests an auto-pause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutoPauseReason {
    /// Displacement from the calibrated origin exceeded the sway limit
    SwayLimit,
    /// Filtered yaw rate exceeded the angular-velocity limit
    ExcessYawRate,
}

impl AutoPauseReason {
    /// Returns a human-readable description of the pause reason
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            AutoPauseReason::SwayLimit => "Postural sway exceeded the safe displacement limit",
            AutoPauseReason::ExcessYawRate => "Head rotation rate exceeded the safe limit",
        }
    }
}

/// Progress events emitted by the trial sequencer for the UI layer
#[derive(Debug, Clone)]
pub enum SequencerEvent {
    /// A test phase started and its head-motion baseline was captured
    PhaseStarted(TestAxis),
    /// The neutral fixation cue is being held before a trial
    FixationStarted {
        /// Index of the upcoming trial
        trial_index: usize,
    },
    /// A directional cue was presented; the response window is open
    CuePresented {
        /// Index of the running trial
        trial_index: usize,
        /// Cued direction
        direction: Direction,
    },
    /// A trial reached its terminal outcome
    TrialFinalized(Trial),
    /// Both phases finished; the trial list is complete
    Completed,
}
