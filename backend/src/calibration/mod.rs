//! Calibration - scale factors on the mean expiry that hit kept/lost targets.
//!
//! A calibration pass runs two searches over the same baseline parameters:
//!
//! 1. **min kept**: smallest factor with `kept >= target.min_kept`
//! 2. **target**: smallest factor with `lost <= target.exact_lost`, i.e.
//!    `kept >= N - exact_lost`. Without a lost target the goal falls back to
//!    four times the baseline kept count.
//!
//! Both are the same primitive, [`find_min_factor`]. The lost target is only
//! translated into a kept goal first, so the result leaves *at most* `L` items
//! lost rather than exactly `L`.
//!
//! The pass then projects the capacity at the min-kept factor and derives the
//! weighted flow duration.

pub mod metrics;
pub mod search;

pub use metrics::{flow_duration_metric, projected_capacity, EDGE_DISCOUNT};
pub use search::find_min_factor;

use crate::models::{
    CalibrationResult, CalibrationTarget, EventLog, FlowParameters, FlowResult, SearchBracket,
    SearchKind,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Fallback target multiplier when no lost target is given
pub const FALLBACK_KEPT_MULTIPLIER: usize = 4;

/// Search and metric settings for a calibration pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    pub bracket: SearchBracket,

    /// Share of the flow duration attributed to the edges, in [0, 1]
    pub edge_share: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            bracket: SearchBracket::default(),
            edge_share: 0.20,
        }
    }
}

/// Run a calibration pass against `baseline`, the run of `base` itself
///
/// Every simulation issued is appended to `log`.
pub fn calibrate(
    base: &FlowParameters,
    baseline: &FlowResult,
    target: &CalibrationTarget,
    config: &CalibrationConfig,
    log: &mut EventLog,
) -> CalibrationResult {
    let min_kept_search = find_min_factor(
        base,
        target.min_kept,
        &config.bracket,
        SearchKind::MinKept,
        log,
    );

    let target_search = match target.lost_goal_as_kept(baseline.total_items) {
        Some(goal) => find_min_factor(base, goal, &config.bracket, SearchKind::LostTarget, log),
        None => {
            let goal = (baseline.kept_count * FALLBACK_KEPT_MULTIPLIER).max(1);
            find_min_factor(base, goal, &config.bracket, SearchKind::KeptFallback, log)
        }
    };

    let factor_for_min_kept = min_kept_search.factor;
    let projected_capacity = projected_capacity(base, factor_for_min_kept);
    let flow_duration_metric = flow_duration_metric(
        base.expiry_mean,
        baseline.mean_finish_time_of_kept,
        factor_for_min_kept,
        config.edge_share,
    );

    info!(
        factor_for_min_kept,
        factor_for_target = target_search.factor,
        projected_capacity,
        flow_duration_metric,
        "calibration complete"
    );

    CalibrationResult {
        factor_for_min_kept,
        factor_for_target: target_search.factor,
        projected_capacity,
        flow_duration_metric,
        kept_percentage: baseline.kept_percentage(),
        min_kept_search,
        target_search,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::simulate;

    fn base() -> FlowParameters {
        FlowParameters {
            total_items: 100,
            service_rate_coefficient: 0.05,
            passage_reduction: 1.0,
            expiry_mean: 10.0,
            expiry_jitter: 0.2,
            sample_max: 0,
            rng_seed: 42,
        }
    }

    #[test]
    fn test_lost_target_leaves_at_most_that_many_lost() {
        let params = base();
        let baseline = simulate(&params);
        let target = CalibrationTarget {
            min_kept: 50,
            exact_lost: Some(10),
        };
        let mut log = EventLog::new();
        let result = calibrate(
            &params,
            &baseline,
            &target,
            &CalibrationConfig::default(),
            &mut log,
        );

        assert_eq!(result.target_search.goal, 90);
        let run = simulate(&params.scaled(result.factor_for_target));
        assert!(run.lost_count <= 10);
        assert!(result.projected_capacity >= 50);
        assert!(log.probes_for(SearchKind::LostTarget) > 0);
    }

    #[test]
    fn test_fallback_goal_is_four_times_baseline_kept() {
        let params = FlowParameters {
            total_items: 1000,
            ..base()
        };
        let baseline = simulate(&params);
        let target = CalibrationTarget {
            min_kept: 1,
            exact_lost: None,
        };
        let mut log = EventLog::new();
        let result = calibrate(
            &params,
            &baseline,
            &target,
            &CalibrationConfig::default(),
            &mut log,
        );
        assert_eq!(result.target_search.goal, (baseline.kept_count * 4).max(1));
        assert!(log.probes_for(SearchKind::KeptFallback) > 0);
    }

    #[test]
    fn test_kept_percentage_comes_from_baseline() {
        let params = base();
        let baseline = simulate(&params);
        let mut log = EventLog::new();
        let result = calibrate(
            &params,
            &baseline,
            &CalibrationTarget::default(),
            &CalibrationConfig::default(),
            &mut log,
        );
        assert_eq!(result.kept_percentage, baseline.kept_percentage());
        // min_kept = 0 is trivially met
        assert_eq!(result.factor_for_min_kept, 1.0);
    }
}
