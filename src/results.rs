//! Summary statistics and clinical scoring over a finalized trial list.
//!
//! Aggregation is a pure function: the same trial list always yields the same
//! result, and nothing here mutates the trials.

use serde::{Deserialize, Serialize};

use crate::config::ScoringConfig;
use crate::types::{Trial, TrialOutcome};

/// Read-only aggregate over a finished (or aborted) test run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    /// Total finalized trials, all outcomes included
    pub total_trials: usize,
    /// Trials with outcome `Correct`
    pub correct_count: usize,
    /// Trials with outcome `WrongTarget`
    pub wrong_target_count: usize,
    /// Trials with outcome `Timeout`
    pub timeout_count: usize,
    /// Trials with outcome `Invalidated`
    pub invalidated_count: usize,
    /// Trials with outcome `Anticipation`
    pub anticipation_count: usize,
    /// Mean reaction latency over correct trials (ms); zero when none
    pub mean_latency_ms: f64,
    /// Median reaction latency over correct trials (ms); zero when none
    pub median_latency_ms: f64,
    /// Population standard deviation of correct-trial latencies (ms)
    pub std_dev_latency_ms: f64,
    /// Wrong-target selections over total trials
    pub error_rate: f64,
    /// Timeouts over total trials
    pub timeout_rate: f64,
    /// Anticipations over total trials
    pub anticipation_rate: f64,
    /// Largest per-trial head deviation, max(|yaw|, |pitch|), degrees
    pub max_head_motion_deg: f64,
    /// Mean per-trial head deviation, degrees
    pub average_head_motion_deg: f64,
    /// Clinical score in [0, 100]
    pub clinical_score: f64,
    /// True when any independent clinical threshold was exceeded
    pub concussion_indicated: bool,
    /// False when the session was stopped before finishing both phases
    pub completed: bool,
}

/// Compute the summary statistics and clinical score for a trial list.
///
/// `completed` marks whether the session ran to the end of the vertical
/// phase; an aborted session is aggregated the same way but flagged so the
/// consumer never mistakes a partial run for a full one.
#[must_use]
pub fn aggregate(trials: &[Trial], completed: bool, scoring: &ScoringConfig) -> AssessmentResult {
    let total = trials.len();
    let count_of = |outcome: TrialOutcome| trials.iter().filter(|t| t.outcome == outcome).count();

    let correct_count = count_of(TrialOutcome::Correct);
    let wrong_target_count = count_of(TrialOutcome::WrongTarget);
    let timeout_count = count_of(TrialOutcome::Timeout);
    let invalidated_count = count_of(TrialOutcome::Invalidated);
    let anticipation_count = count_of(TrialOutcome::Anticipation);

    // Latency statistics use correct trials only; rates use the full trial
    // count, invalidated and timed-out trials included.
    let mut latencies: Vec<f64> = trials
        .iter()
        .filter(|t| t.outcome == TrialOutcome::Correct)
        .filter_map(|t| t.latency_ms)
        .collect();
    latencies.sort_by(f64::total_cmp);

    let mean_latency_ms = mean(&latencies);
    let median_latency_ms = median(&latencies);
    let std_dev_latency_ms = std_dev(&latencies, mean_latency_ms);

    let rate = |count: usize| {
        if total == 0 {
            0.0
        } else {
            count as f64 / total as f64
        }
    };

    let head_motions: Vec<f64> = trials
        .iter()
        .map(|t| t.head_yaw_deg.abs().max(t.head_pitch_deg.abs()))
        .collect();
    let max_head_motion_deg = head_motions.iter().copied().fold(0.0, f64::max);
    let average_head_motion_deg = mean(&head_motions);

    let error_rate = rate(wrong_target_count);

    let clinical_score = score(
        mean_latency_ms,
        error_rate,
        max_head_motion_deg,
        invalidated_count,
        scoring,
    );

    let concussion_indicated = mean_latency_ms > scoring.indicator_latency_ms
        || error_rate > scoring.indicator_error_rate
        || max_head_motion_deg > scoring.indicator_head_motion_deg;

    AssessmentResult {
        total_trials: total,
        correct_count,
        wrong_target_count,
        timeout_count,
        invalidated_count,
        anticipation_count,
        mean_latency_ms,
        median_latency_ms,
        std_dev_latency_ms,
        error_rate,
        timeout_rate: rate(timeout_count),
        anticipation_rate: rate(anticipation_count),
        max_head_motion_deg,
        average_head_motion_deg,
        clinical_score,
        concussion_indicated,
        completed,
    }
}

fn score(
    mean_latency_ms: f64,
    error_rate: f64,
    max_head_motion_deg: f64,
    invalidated_count: usize,
    scoring: &ScoringConfig,
) -> f64 {
    let base = (200.0
        - (mean_latency_ms - scoring.latency_benchmark_ms) * scoring.latency_penalty_per_ms)
        .clamp(0.0, 100.0);

    let head_penalty = (max_head_motion_deg * scoring.head_motion_penalty_scale)
        .min(scoring.head_motion_penalty_cap);

    (base
        - error_rate * 100.0
        - head_penalty
        - invalidated_count as f64 * scoring.invalidated_trial_penalty)
        .max(0.0)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median with standard even/odd-count averaging; input must be sorted
fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

fn std_dev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Direction, TestAxis};

    fn trial(index: usize, outcome: TrialOutcome, latency_ms: Option<f64>, head_deg: f64) -> Trial {
        Trial {
            index,
            cue_direction: Direction::Left,
            test_axis: TestAxis::Horizontal,
            cue_offset_ms: index as f64 * 5000.0,
            latency_ms,
            outcome,
            head_yaw_deg: head_deg,
            head_pitch_deg: head_deg / 2.0,
        }
    }

    #[test]
    fn test_empty_trial_list() {
        let result = aggregate(&[], false, &ScoringConfig::default());
        assert_eq!(result.total_trials, 0);
        assert_eq!(result.mean_latency_ms, 0.0);
        assert_eq!(result.error_rate, 0.0);
        assert!(!result.completed);
    }

    #[test]
    fn test_outcome_counts_are_exhaustive() {
        let trials = vec![
            trial(0, TrialOutcome::Correct, Some(250.0), 1.0),
            trial(1, TrialOutcome::WrongTarget, Some(300.0), 2.0),
            trial(2, TrialOutcome::Timeout, None, 0.5),
            trial(3, TrialOutcome::Invalidated, None, 7.0),
            trial(4, TrialOutcome::Anticipation, Some(60.0), 1.5),
        ];
        let result = aggregate(&trials, true, &ScoringConfig::default());
        let summed = result.correct_count
            + result.wrong_target_count
            + result.timeout_count
            + result.invalidated_count
            + result.anticipation_count;
        assert_eq!(summed, result.total_trials);
    }

    #[test]
    fn test_latency_stats_use_correct_trials_only() {
        let trials = vec![
            trial(0, TrialOutcome::Correct, Some(200.0), 0.0),
            trial(1, TrialOutcome::Correct, Some(300.0), 0.0),
            trial(2, TrialOutcome::Correct, Some(400.0), 0.0),
            trial(3, TrialOutcome::WrongTarget, Some(1000.0), 0.0),
            trial(4, TrialOutcome::Anticipation, Some(50.0), 0.0),
        ];
        let result = aggregate(&trials, true, &ScoringConfig::default());
        assert!((result.mean_latency_ms - 300.0).abs() < 1e-9);
        assert!((result.median_latency_ms - 300.0).abs() < 1e-9);
        // Population std dev of [200, 300, 400]
        assert!((result.std_dev_latency_ms - (20000.0_f64).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_median_even_count() {
        let trials = vec![
            trial(0, TrialOutcome::Correct, Some(200.0), 0.0),
            trial(1, TrialOutcome::Correct, Some(260.0), 0.0),
            trial(2, TrialOutcome::Correct, Some(240.0), 0.0),
            trial(3, TrialOutcome::Correct, Some(400.0), 0.0),
        ];
        let result = aggregate(&trials, true, &ScoringConfig::default());
        assert!((result.median_latency_ms - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_rates_use_total_denominator() {
        // 8-trial phase: one timeout, one invalidated, one wrong target
        let trials = vec![
            trial(0, TrialOutcome::Correct, Some(250.0), 1.0),
            trial(1, TrialOutcome::Correct, Some(250.0), 1.0),
            trial(2, TrialOutcome::Timeout, None, 1.0),
            trial(3, TrialOutcome::Correct, Some(250.0), 1.0),
            trial(4, TrialOutcome::Invalidated, None, 6.5),
            trial(5, TrialOutcome::Correct, Some(250.0), 1.0),
            trial(6, TrialOutcome::WrongTarget, Some(280.0), 1.0),
            trial(7, TrialOutcome::Correct, Some(250.0), 1.0),
        ];
        let result = aggregate(&trials, true, &ScoringConfig::default());
        assert!((result.timeout_rate - 1.0 / 8.0).abs() < 1e-9);
        assert!((result.error_rate - 1.0 / 8.0).abs() < 1e-9);
        assert_eq!(result.invalidated_count, 1);
        assert_eq!(result.total_trials, 8);
    }

    #[test]
    fn test_clinical_score_benchmark_latency() {
        // Mean latency exactly at the benchmark: base clamps to 100, no
        // penalties apply.
        let trials = vec![trial(0, TrialOutcome::Correct, Some(200.0), 0.0)];
        let result = aggregate(&trials, true, &ScoringConfig::default());
        assert!((result.clinical_score - 100.0).abs() < 1e-9);
        assert!(!result.concussion_indicated);
    }

    #[test]
    fn test_clinical_score_penalties() {
        // Two correct at 600 ms, one wrong target, one invalidated with 20°
        // head motion. Base = clamp(200 - 400*0.3) = 80; error rate 1/4
        // subtracts 25; head penalty caps... 20*2 = 40 → capped at 30;
        // invalidated subtracts 5. Score = 80 - 25 - 30 - 5 = 20.
        let trials = vec![
            trial(0, TrialOutcome::Correct, Some(600.0), 0.0),
            trial(1, TrialOutcome::Correct, Some(600.0), 0.0),
            trial(2, TrialOutcome::WrongTarget, Some(500.0), 0.0),
            trial(3, TrialOutcome::Invalidated, None, 20.0),
        ];
        let result = aggregate(&trials, true, &ScoringConfig::default());
        assert!((result.clinical_score - 20.0).abs() < 1e-9);
        assert!(result.concussion_indicated);
    }

    #[test]
    fn test_clinical_score_floors_at_zero() {
        let trials: Vec<Trial> = (0..20)
            .map(|i| trial(i, TrialOutcome::Invalidated, None, 30.0))
            .collect();
        let result = aggregate(&trials, true, &ScoringConfig::default());
        assert_eq!(result.clinical_score, 0.0);
    }

    #[test]
    fn test_indicator_thresholds_are_independent() {
        let scoring = ScoringConfig::default();

        // Latency alone
        let trials = vec![trial(0, TrialOutcome::Correct, Some(350.0), 0.0)];
        assert!(aggregate(&trials, true, &scoring).concussion_indicated);

        // Head motion alone
        let trials = vec![trial(0, TrialOutcome::Correct, Some(200.0), 12.0)];
        assert!(aggregate(&trials, true, &scoring).concussion_indicated);

        // Error rate alone
        let trials = vec![
            trial(0, TrialOutcome::Correct, Some(200.0), 0.0),
            trial(1, TrialOutcome::WrongTarget, Some(210.0), 0.0),
        ];
        assert!(aggregate(&trials, true, &scoring).concussion_indicated);
    }

    #[test]
    fn test_aggregation_is_pure() {
        let trials = vec![
            trial(0, TrialOutcome::Correct, Some(230.0), 2.0),
            trial(1, TrialOutcome::Timeout, None, 3.0),
            trial(2, TrialOutcome::WrongTarget, Some(310.0), 4.0),
        ];
        let scoring = ScoringConfig::default();
        let first = aggregate(&trials, true, &scoring);
        let second = aggregate(&trials, true, &scoring);
        assert_eq!(first, second);
    }

    #[test]
    fn test_head_motion_uses_max_of_yaw_pitch() {
        let mut t = trial(0, TrialOutcome::Correct, Some(200.0), 0.0);
        t.head_yaw_deg = -3.0;
        t.head_pitch_deg = 5.0;
        let result = aggregate(&[t], true, &ScoringConfig::default());
        assert!((result.max_head_motion_deg - 5.0).abs() < 1e-9);
    }
}
