//! Event logging for calibration replay and auditing.
//!
//! Every flow simulation issued by a calibration search is recorded as a
//! [`CalibrationEvent`]. Events enable:
//! - Debugging (see exactly which factors were probed, and in which phase)
//! - Auditing (verify the bracket was narrowed correctly)
//! - Cost accounting (number of simulations per search)
//!
//! # Example
//!
//! ```rust
//! use flow_calibration_core_rs::models::{CalibrationEvent, EventLog, SearchKind, SearchPhase};
//!
//! let mut log = EventLog::new();
//! log.log(CalibrationEvent::Probe {
//!     search: SearchKind::MinKept,
//!     phase: SearchPhase::Bisection,
//!     factor: 1.5,
//!     kept: 42,
//!     meets_goal: true,
//! });
//! assert_eq!(log.probes_for(SearchKind::MinKept), 1);
//! ```

use serde::{Deserialize, Serialize};

/// Which search of the calibration pass emitted an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchKind {
    /// Smallest factor reaching the minimum kept count
    MinKept,
    /// Smallest factor leaving at most the requested number lost
    LostTarget,
    /// Smallest factor reaching four times the baseline kept count
    KeptFallback,
}

/// Phase of a search in which a probe was issued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchPhase {
    /// Initial evaluation of both bracket bounds
    Initial,
    /// Halving the lower bound
    LowerExpansion,
    /// Doubling the upper bound
    UpperExpansion,
    Bisection,
}

/// Calibration event capturing one step of a search.
///
/// Events are logged in the order they occur.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CalibrationEvent {
    /// Search began with the given goal and bracket
    SearchStarted {
        search: SearchKind,
        goal: usize,
        low: f64,
        high: f64,
    },

    /// Goal was trivially met, no simulation was run
    SearchSkipped { search: SearchKind, goal: usize },

    /// One flow simulation at `factor`
    Probe {
        search: SearchKind,
        phase: SearchPhase,
        factor: f64,
        kept: usize,
        meets_goal: bool,
    },

    /// Search returned
    SearchFinished {
        search: SearchKind,
        factor: f64,
        evaluations: usize,
        reached_ceiling: bool,
    },
}

impl CalibrationEvent {
    /// Search that emitted this event
    pub fn search(&self) -> SearchKind {
        match self {
            CalibrationEvent::SearchStarted { search, .. } => *search,
            CalibrationEvent::SearchSkipped { search, .. } => *search,
            CalibrationEvent::Probe { search, .. } => *search,
            CalibrationEvent::SearchFinished { search, .. } => *search,
        }
    }

    /// Event type name (for filtering)
    pub fn event_type(&self) -> &'static str {
        match self {
            CalibrationEvent::SearchStarted { .. } => "SearchStarted",
            CalibrationEvent::SearchSkipped { .. } => "SearchSkipped",
            CalibrationEvent::Probe { .. } => "Probe",
            CalibrationEvent::SearchFinished { .. } => "SearchFinished",
        }
    }
}

/// Event log for a calibration pass
///
/// This is a simple wrapper around Vec<CalibrationEvent> with convenience methods.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<CalibrationEvent>,
}

impl EventLog {
    /// Create empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Log an event
    pub fn log(&mut self, event: CalibrationEvent) {
        self.events.push(event);
    }

    /// Get number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if log is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Get all events
    pub fn events(&self) -> &[CalibrationEvent] {
        &self.events
    }

    /// Get events of specific type
    pub fn events_of_type(&self, event_type: &str) -> Vec<&CalibrationEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Get all events emitted by one search
    pub fn events_for_search(&self, search: SearchKind) -> Vec<&CalibrationEvent> {
        self.events.iter().filter(|e| e.search() == search).collect()
    }

    /// Number of simulations one search ran
    pub fn probes_for(&self, search: SearchKind) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, CalibrationEvent::Probe { search: s, .. } if *s == search))
            .count()
    }

    /// Clear all events
    pub fn clear(&mut self) {
        self.events.clear();
    }
}
