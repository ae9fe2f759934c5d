//! Grouping of simulation traces by rounded daily energy.

use itertools::Itertools;
use serde::Serialize;

use crate::priority::PriorityOrder;
use crate::sim::types::SimulationTrace;

/// Traces whose daily energy rounds to the same whole kWh.
///
/// Priority orders that differ only in units that never ran end up here
/// together.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedGroup {
    /// Rounded daily energy shared by every trace (kWh).
    pub total_energy: i64,
    /// Member traces, lowest exact energy first, then enumeration order.
    pub traces: Vec<SimulationTrace>,
}

impl RankedGroup {
    /// The group's lowest-energy trace.
    pub fn best(&self) -> Option<&SimulationTrace> {
        self.traces.first()
    }

    pub fn len(&self) -> usize {
        self.traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }
}

/// Rounds a daily energy to its group key.
pub fn energy_key(total_energy: f64) -> i64 {
    total_energy.round() as i64
}

/// Ranks rankable traces ascending by energy and keeps the first `top_n` groups.
///
/// Traces with non-finite or non-positive energy are dropped. The input order
/// only breaks ties between traces of exactly equal energy, so callers that
/// pass traces in enumeration order get a fully deterministic ranking.
pub fn rank(traces: Vec<SimulationTrace>, top_n: usize) -> Vec<RankedGroup> {
    let traces = traces
        .into_iter()
        .filter(SimulationTrace::is_rankable)
        .collect();

    top_groups(traces, |trace| trace.total_energy, top_n)
        .into_iter()
        .map(|(total_energy, traces)| RankedGroup {
            total_energy,
            traces,
        })
        .collect()
}

/// A simulated priority order reduced to what ranking needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub order: PriorityOrder,
    pub total_energy: f64,
}

/// Drops candidates whose group key falls outside the `top_n` smallest keys.
///
/// Applied after every batch, this bounds the retained set by the members of
/// `top_n` groups while leaving the final ranking unchanged: a key beaten by
/// `top_n` smaller keys stays beaten. Relative order is preserved.
pub fn retain_top(candidates: &mut Vec<Candidate>, top_n: usize) {
    if top_n == 0 {
        candidates.clear();
        return;
    }
    let cutoff = candidates
        .iter()
        .map(|c| energy_key(c.total_energy))
        .sorted_unstable()
        .dedup()
        .nth(top_n - 1);
    if let Some(cutoff) = cutoff {
        candidates.retain(|c| energy_key(c.total_energy) <= cutoff);
    }
}

/// Sorts stably by exact energy and splits into the first `top_n` runs of
/// equal rounded energy.
pub(crate) fn top_groups<T>(
    mut items: Vec<T>,
    energy: impl Fn(&T) -> f64,
    top_n: usize,
) -> Vec<(i64, Vec<T>)> {
    items.sort_by(|a, b| energy(a).total_cmp(&energy(b)));

    items
        .into_iter()
        .chunk_by(|item| energy_key(energy(item)))
        .into_iter()
        .take(top_n)
        .map(|(key, group)| (key, group.collect()))
        .collect()
}
