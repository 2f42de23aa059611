//! Timestamped event generator for a shape.
//!
//! Produces a timeline in three windows:
//!
//! - **Trace** (t ≥ 0): one event per segment, spread over `[0, trace_span)`
//!   in draw order.
//! - **Pulse** (after trace): `k` distinct vertices are drawn without
//!   replacement, each fires once at a jittered time inside the window and may
//!   fire a near-simultaneous replica. Fires closer than τ apart share a
//!   cluster; τ is a percentile of the gaps between fires, at least 1.
//! - **Heal** (t < 0): segments are re-traced in reverse draw order over
//!   `[-heal_span, 0)`.
//!
//! The engine only consumes the effective replica count `k` (always `< N`), as
//! a reporting ratio `N / k`.

use crate::rng::RngManager;
use crate::shape::Shape;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Generator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineParams {
    pub trace_span: u32,

    /// Requested replicas; `None` derives `min(max(1, N/20), max(1, N-1))`
    pub replicas: Option<usize>,

    pub pulse_span: u32,
    /// Fire times move by up to ± this amount
    pub pulse_jitter: f64,
    /// Probability that a fire is followed by a replica
    pub replica_rate: f64,

    pub heal_span: u32,

    /// Percentile of fire gaps used as the clustering threshold τ
    pub cluster_percentile: f64,

    pub seed: u64,
}

impl Default for TimelineParams {
    fn default() -> Self {
        Self {
            trace_span: 32,
            replicas: None,
            pulse_span: 24,
            pulse_jitter: 0.8,
            replica_rate: 0.6,
            heal_span: 60,
            cluster_percentile: 0.25,
            seed: 0xC0FFEE,
        }
    }
}

impl TimelineParams {
    /// Replica count used for a shape with `total_vertices` vertices
    pub fn replicas_for(&self, total_vertices: usize) -> usize {
        let requested = self
            .replicas
            .unwrap_or_else(|| (total_vertices / 20).max(1).min(total_vertices.saturating_sub(1).max(1)));
        requested.min(total_vertices.saturating_sub(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Start of a window
    PhaseMark,
    Trace,
    Fire,
    Replica,
    Heal,
}

impl EventKind {
    /// Tie-break order for events at the same time
    fn rank(self) -> u8 {
        match self {
            EventKind::PhaseMark => 0,
            EventKind::Trace => 1,
            EventKind::Fire => 2,
            EventKind::Replica => 3,
            EventKind::Heal => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub time: f64,
    pub kind: EventKind,
    pub vertex: Option<usize>,
    pub edge: Option<usize>,
    pub cluster: Option<usize>,
}

impl TimelineEvent {
    fn mark(time: f64) -> Self {
        Self {
            time,
            kind: EventKind::PhaseMark,
            vertex: None,
            edge: None,
            cluster: None,
        }
    }
}

/// Generated timeline and its statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    /// Sorted by time, then kind
    pub events: Vec<TimelineEvent>,
    pub trace_end: f64,
    pub pulse_end: f64,
    pub heal_start: f64,

    /// Smallest gap between two fires (0 with fewer than two fires)
    pub min_gap: f64,
    /// Clustering threshold
    pub tau: f64,
    /// Replicas actually drawn, always below the vertex count
    pub effective_replicas: usize,
}

/// Index of percentile `p` in a sorted list of `n` values
fn percentile_index(n: usize, p: f64) -> usize {
    if n == 0 {
        return 0;
    }
    let p = if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) };
    ((p * (n - 1) as f64).floor() as usize).min(n - 1)
}

/// Generate the timeline of `shape`
///
/// An empty shape yields an empty timeline.
pub fn generate_timeline(shape: &Shape, params: &TimelineParams) -> Timeline {
    let mut out = Timeline {
        tau: 1.0,
        ..Timeline::default()
    };

    let vertex_count = shape.vertices.len();
    let edge_count = shape.edges.len();
    if vertex_count == 0 || edge_count == 0 {
        return out;
    }

    let mut order: Vec<usize> = if shape.draw_order.is_empty() {
        (0..edge_count).collect()
    } else {
        shape.draw_order.clone()
    };

    // Trace
    out.events.push(TimelineEvent::mark(0.0));
    let steps = order.len().max(1);
    for (i, &edge) in order.iter().enumerate() {
        let time = (i as f64 / steps as f64) * params.trace_span as f64;
        out.events.push(TimelineEvent {
            time,
            kind: EventKind::Trace,
            vertex: None,
            edge: Some(edge),
            cluster: None,
        });
        out.trace_end = out.trace_end.max(time);
    }

    // Pulse
    let pulse_start = out.trace_end + 1.0;
    let pulse_end = pulse_start + params.pulse_span.max(1) as f64;
    // strictly inside the window
    let latest = pulse_end - f64::EPSILON * pulse_end.abs().max(1.0);
    out.events.push(TimelineEvent::mark(pulse_start));

    let mut rng = RngManager::new(params.seed);
    let replicas = params.replicas_for(vertex_count);
    out.effective_replicas = replicas;

    let mut pool: Vec<usize> = (0..vertex_count).collect();
    let mut chosen = Vec::with_capacity(replicas);
    for _ in 0..replicas {
        if pool.is_empty() {
            break;
        }
        let j = ((rng.uniform() * pool.len() as f64).floor() as usize).min(pool.len() - 1);
        chosen.push(pool.remove(j));
    }

    let mut fire_times = Vec::with_capacity(chosen.len());
    for _ in 0..chosen.len() {
        let base = pulse_start + rng.uniform() * params.pulse_span.max(1) as f64;
        let jitter = (rng.uniform() * 2.0 - 1.0) * params.pulse_jitter;
        fire_times.push((base + jitter).clamp(pulse_start, latest));
    }
    fire_times.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let mut gaps: Vec<f64> = fire_times.windows(2).map(|w| w[1] - w[0]).collect();
    if !gaps.is_empty() {
        gaps.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        out.tau = gaps[percentile_index(gaps.len(), params.cluster_percentile)].max(1.0);
        out.min_gap = gaps[0];
    }

    let mut cluster = 0usize;
    for (i, (&time, &vertex)) in fire_times.iter().zip(chosen.iter()).enumerate() {
        if i > 0 && time - fire_times[i - 1] > out.tau {
            cluster += 1;
        }
        out.events.push(TimelineEvent {
            time,
            kind: EventKind::Fire,
            vertex: Some(vertex),
            edge: None,
            cluster: Some(cluster),
        });

        if rng.uniform() < params.replica_rate {
            let offset = if rng.uniform() < 0.5 {
                0.0
            } else {
                (0.01 * out.tau).max(1e-6)
            };
            out.events.push(TimelineEvent {
                time: (time + offset).clamp(pulse_start, latest),
                kind: EventKind::Replica,
                vertex: Some(vertex),
                edge: None,
                cluster: Some(cluster),
            });
        }
    }
    out.pulse_end = pulse_end;

    // Heal
    order.reverse();
    out.heal_start = -(params.heal_span as f64);
    out.events.push(TimelineEvent::mark(out.heal_start));
    let heal_steps = order.len();
    for (k, &edge) in order.iter().enumerate() {
        let time = out.heal_start
            + ((k + 1) as f64 / heal_steps as f64) * params.heal_span as f64;
        out.events.push(TimelineEvent {
            time: time.min(-f64::EPSILON),
            kind: EventKind::Heal,
            vertex: None,
            edge: Some(edge),
            cluster: None,
        });
    }

    out.events.sort_by(|a, b| {
        a.time
            .partial_cmp(&b.time)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.kind.rank().cmp(&b.kind.rank()))
    });

    out
}
