//! Calibration targets, search brackets and results

use serde::{Deserialize, Serialize};

/// What the calibration search should reach
///
/// `min_kept` drives the "minimum kept" factor. When `exact_lost` is set the
/// target factor is the smallest one leaving at most that many items lost.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationTarget {
    pub min_kept: usize,
    pub exact_lost: Option<usize>,
}

impl CalibrationTarget {
    /// Kept-count goal equivalent to `exact_lost` for a run of `total_items`
    ///
    /// `None` when no lost target is set. Losing at most `L` items is the same
    /// as keeping at least `N - L`.
    pub fn lost_goal_as_kept(&self, total_items: usize) -> Option<usize> {
        self.exact_lost
            .map(|lost| total_items.max(1).saturating_sub(lost))
    }
}

/// Search interval and iteration budgets for one calibration search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchBracket {
    /// Initial lower bound on the scale factor
    pub low: f64,

    /// Initial upper bound on the scale factor
    pub high: f64,

    /// Bisection steps after the bracket is established
    pub max_iterations: usize,

    /// Halving/doubling attempts allowed in each expansion direction
    pub expand_retries: usize,

    /// The lower bound is never halved below this
    pub floor: f64,

    /// The upper bound is never doubled beyond this
    pub ceiling: f64,
}

impl Default for SearchBracket {
    fn default() -> Self {
        Self {
            low: 0.10,
            high: 10.0,
            max_iterations: 40,
            expand_retries: 20,
            floor: 1e-6,
            ceiling: 1e12,
        }
    }
}

impl SearchBracket {
    /// Reason this bracket cannot be searched, if any
    pub fn validate(&self) -> Result<(), String> {
        if !self.low.is_finite() || !self.high.is_finite() {
            return Err(format!(
                "bracket bounds must be finite (low={}, high={})",
                self.low, self.high
            ));
        }
        if self.low <= 0.0 {
            return Err(format!("bracket low must be positive, got {}", self.low));
        }
        if self.high <= self.low {
            return Err(format!(
                "bracket high ({}) must exceed low ({})",
                self.high, self.low
            ));
        }
        if self.max_iterations == 0 {
            return Err("bracket max_iterations must be positive".to_string());
        }
        if !(self.floor > 0.0) || !(self.ceiling > self.floor) {
            return Err(format!(
                "bracket floor/ceiling invalid (floor={}, ceiling={})",
                self.floor, self.ceiling
            ));
        }
        Ok(())
    }

    /// Upper bound on flow simulations issued by one search
    pub fn max_evaluations(&self) -> usize {
        2 + 2 * self.expand_retries + self.max_iterations
    }
}

/// Result of a single "smallest factor reaching `goal`" search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Kept-count goal the search was asked to reach
    pub goal: usize,

    /// Smallest factor known to reach the goal (upper bound of the final bracket)
    pub factor: f64,

    /// Number of flow simulations run
    pub evaluations: usize,

    /// The goal was not reached even at the expanded upper bound
    ///
    /// `factor` is then the bound reached, not a threshold.
    pub reached_ceiling: bool,
}

impl SearchOutcome {
    /// Outcome of a search whose goal is trivially met
    pub fn trivial(goal: usize) -> Self {
        Self {
            goal,
            factor: 1.0,
            evaluations: 0,
            reached_ceiling: false,
        }
    }
}

/// Everything the calibration pass computes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationResult {
    /// Smallest factor reaching `min_kept`
    pub factor_for_min_kept: f64,

    /// Smallest factor reaching the lost (or fallback) target
    pub factor_for_target: f64,

    /// Kept count of a run at `factor_for_min_kept`
    pub projected_capacity: usize,

    /// Center/edge weighted flow duration
    pub flow_duration_metric: f64,

    /// Kept percentage of the baseline run
    pub kept_percentage: f64,

    pub min_kept_search: SearchOutcome,
    pub target_search: SearchOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lost_goal_as_kept() {
        let target = CalibrationTarget {
            min_kept: 0,
            exact_lost: Some(30),
        };
        assert_eq!(target.lost_goal_as_kept(100), Some(70));
        assert_eq!(target.lost_goal_as_kept(10), Some(0));

        let no_lost = CalibrationTarget::default();
        assert_eq!(no_lost.lost_goal_as_kept(100), None);
    }

    #[test]
    fn test_default_bracket_is_valid() {
        assert!(SearchBracket::default().validate().is_ok());
        assert_eq!(SearchBracket::default().max_evaluations(), 82);
    }

    #[test]
    fn test_bracket_validation_rejects_inverted_bounds() {
        let bracket = SearchBracket {
            low: 5.0,
            high: 1.0,
            ..SearchBracket::default()
        };
        assert!(bracket.validate().is_err());

        let zero_low = SearchBracket {
            low: 0.0,
            ..SearchBracket::default()
        };
        assert!(zero_low.validate().is_err());

        let no_iterations = SearchBracket {
            max_iterations: 0,
            ..SearchBracket::default()
        };
        assert!(no_iterations.validate().is_err());
    }
}
