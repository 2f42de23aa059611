//! Monotone root finding over re-run flow simulations
//!
//! The kept count as a function of the scale factor is a step function over
//! the per-item jitter draws, so there is no closed form to invert. Instead the
//! search treats [`simulate_with_factor`] as a black box that is monotone in the
//! factor (same seed, same draws) and narrows a bracket around the smallest
//! factor reaching the goal.
//!
//! # Algorithm
//!
//! ```text
//! 1. Evaluate both bounds.
//! 2. While low already meets the goal: high = low, low /= 2   (≤ expand_retries, stops below floor)
//! 3. While high misses the goal:       low = high, high *= 2  (≤ expand_retries, capped at ceiling)
//! 4. If high still misses: return high, flagged reached_ceiling
//! 5. Bisect max_iterations times; return the final high
//! ```
//!
//! The returned factor is an over-approximation of the threshold whose error
//! is bounded by the final bracket width. This is the search tolerance.

use crate::flow::simulate_with_factor;
use crate::models::{
    CalibrationEvent, EventLog, FlowParameters, SearchBracket, SearchKind, SearchOutcome,
    SearchPhase,
};
use tracing::{debug, trace};

/// Issues simulations for one search and records them
struct Prober<'a> {
    base: &'a FlowParameters,
    goal: usize,
    search: SearchKind,
    log: &'a mut EventLog,
    evaluations: usize,
}

impl Prober<'_> {
    fn meets_goal(&mut self, factor: f64, phase: SearchPhase) -> bool {
        self.evaluations += 1;
        let kept = simulate_with_factor(self.base, factor).kept_count;
        let meets_goal = kept >= self.goal;

        trace!(search = ?self.search, ?phase, factor, kept, meets_goal, "probe");
        self.log.log(CalibrationEvent::Probe {
            search: self.search,
            phase,
            factor,
            kept,
            meets_goal,
        });
        meets_goal
    }
}

/// Smallest scale factor on `expiry_mean` whose run keeps at least `goal` items
///
/// A goal of zero is always met and returns `1.0` without simulating.
/// A malformed bracket is repaired rather than rejected: a non-positive or
/// non-finite `low` becomes `floor`, and `high` is raised above `low`.
pub fn find_min_factor(
    base: &FlowParameters,
    goal: usize,
    bracket: &SearchBracket,
    search: SearchKind,
    log: &mut EventLog,
) -> SearchOutcome {
    if goal == 0 {
        log.log(CalibrationEvent::SearchSkipped { search, goal });
        return SearchOutcome::trivial(goal);
    }

    let floor = if bracket.floor > 0.0 { bracket.floor } else { 1e-6 };
    let ceiling = if bracket.ceiling > floor {
        bracket.ceiling
    } else {
        floor * 2.0
    };
    let mut low = if bracket.low.is_finite() && bracket.low > 0.0 {
        bracket.low
    } else {
        floor
    };
    let mut high = if bracket.high.is_finite() && bracket.high > low {
        bracket.high.min(ceiling.max(low * 2.0))
    } else {
        low * 2.0
    };

    log.log(CalibrationEvent::SearchStarted {
        search,
        goal,
        low,
        high,
    });

    let mut prober = Prober {
        base,
        goal,
        search,
        log: &mut *log,
        evaluations: 0,
    };

    let mut low_meets = prober.meets_goal(low, SearchPhase::Initial);
    let mut high_meets = prober.meets_goal(high, SearchPhase::Initial);

    // A generous low bound would hide a smaller sufficient factor
    let mut retries = 0;
    while low_meets && low > floor && retries < bracket.expand_retries {
        retries += 1;
        high = low;
        high_meets = true;
        low *= 0.5;
        if low < floor {
            break;
        }
        low_meets = prober.meets_goal(low, SearchPhase::LowerExpansion);
    }

    retries = 0;
    while !high_meets && high < ceiling && retries < bracket.expand_retries {
        retries += 1;
        low = high;
        high = (high * 2.0).min(ceiling);
        high_meets = prober.meets_goal(high, SearchPhase::UpperExpansion);
    }

    if !high_meets {
        let evaluations = prober.evaluations;
        debug!(
            ?search,
            goal,
            factor = high,
            evaluations,
            "goal unreachable within bracket budget"
        );
        log.log(CalibrationEvent::SearchFinished {
            search,
            factor: high,
            evaluations,
            reached_ceiling: true,
        });
        return SearchOutcome {
            goal,
            factor: high,
            evaluations,
            reached_ceiling: true,
        };
    }

    for _ in 0..bracket.max_iterations {
        let mid = 0.5 * (low + high);
        if prober.meets_goal(mid, SearchPhase::Bisection) {
            high = mid;
        } else {
            low = mid;
        }
    }

    let evaluations = prober.evaluations;
    debug!(?search, goal, factor = high, evaluations, "search converged");
    log.log(CalibrationEvent::SearchFinished {
        search,
        factor: high,
        evaluations,
        reached_ceiling: false,
    });

    SearchOutcome {
        goal,
        factor: high,
        evaluations,
        reached_ceiling: false,
    }
}
