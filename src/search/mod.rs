//! Exhaustive search over every priority order of a fleet.

pub mod ranking;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::fleet::Fleet;
use crate::performance::PerformanceTable;
use crate::priority::PriorityOrder;
use crate::profile::LoadProfile;
use crate::sim::engine::Engine;
use crate::sim::types::SimulationTrace;

pub use ranking::{Candidate, RankedGroup, energy_key, rank, retain_top};

/// Largest fleet the exhaustive search accepts (10! = 3 628 800 orders).
pub const MAX_UNITS: usize = 10;

/// Tuning knobs for [`search`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchOptions {
    /// Permutations evaluated between progress reports and cancellation checks.
    pub batch_size: usize,
    /// Number of ranked groups to keep.
    pub top_n: usize,
    /// Evaluate each batch on the rayon pool (requires the `parallel` feature).
    pub parallel: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            batch_size: 50,
            top_n: 20,
            parallel: false,
        }
    }
}

/// Progress snapshot reported after every batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// Priority orders evaluated so far.
    pub completed: usize,
    /// Total number of priority orders.
    pub total: usize,
    /// `completed / total` in percent.
    pub percentage: f64,
}

impl Progress {
    fn new(completed: usize, total: usize) -> Self {
        let percentage = if total == 0 {
            100.0
        } else {
            100.0 * completed as f64 / total as f64
        };
        Self {
            completed,
            total,
            percentage,
        }
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} ({:.1}%)",
            self.completed, self.total, self.percentage
        )
    }
}

/// Result of a search run.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    /// Best groups, lowest energy first.
    pub groups: Vec<RankedGroup>,
    /// Priority orders simulated.
    pub evaluated: usize,
    /// Simulated orders dropped for non-finite or non-positive energy.
    pub discarded: usize,
    /// Whether the run stopped early on request.
    pub cancelled: bool,
}

/// Number of priority orders of an `n`-unit fleet.
pub fn permutation_count(n: usize) -> usize {
    (1..=n).product()
}

/// Simulates every priority order of `fleet` and ranks the results.
///
/// Orders are enumerated lexicographically over the fleet's declaration
/// order, in batches of `options.batch_size`. `on_progress` is called after
/// each batch. When `cancel` is set, the search stops before the next batch
/// and ranks what it has evaluated so far; a batch is never cut short.
///
/// Only the order and energy of each simulation are kept, pruned after every
/// batch to the current best `options.top_n` groups. Members of the final
/// groups are simulated again to produce their traces.
///
/// # Errors
///
/// Returns [`Error::EmptyFleet`], [`Error::EmptyLoadProfile`] or
/// [`Error::FleetTooLarge`] before any simulation work starts.
pub fn search(
    fleet: &Fleet,
    table: &PerformanceTable,
    profile: &LoadProfile,
    options: &SearchOptions,
    cancel: Option<Arc<AtomicBool>>,
    mut on_progress: impl FnMut(Progress),
) -> Result<SearchOutcome> {
    if fleet.is_empty() {
        return Err(Error::EmptyFleet);
    }
    if profile.is_empty() {
        return Err(Error::EmptyLoadProfile);
    }
    let n = fleet.len();
    if n > MAX_UNITS {
        return Err(Error::FleetTooLarge {
            units: n,
            max: MAX_UNITS,
        });
    }
    if options.parallel && !cfg!(feature = "parallel") {
        warn!("parallel search requested but the `parallel` feature is disabled; running sequentially");
    }

    let total = permutation_count(n);
    let batch_size = options.batch_size.max(1);
    info!(units = n, permutations = total, batch_size, "starting priority order search");

    let engine = Engine::new(fleet, table);
    let ids: Vec<String> = fleet.ids().map(str::to_string).collect();
    let batches = ids.into_iter().permutations(n).chunks(batch_size);

    let mut kept = Vec::new();
    let mut evaluated = 0_usize;
    let mut discarded = 0_usize;
    let mut cancelled = false;

    for batch in &batches {
        if cancel.as_ref().is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            cancelled = true;
            break;
        }

        let orders: Vec<PriorityOrder> = batch.map(PriorityOrder::from_distinct).collect();
        let traces = evaluate_batch(&engine, &orders, profile, options.parallel);
        evaluated += orders.len();
        for (order, trace) in orders.into_iter().zip(traces) {
            if trace.is_rankable() {
                kept.push(Candidate {
                    order,
                    total_energy: trace.total_energy,
                });
            } else {
                discarded += 1;
            }
        }
        retain_top(&mut kept, options.top_n);
        on_progress(Progress::new(evaluated, total));
    }

    let groups: Vec<RankedGroup> = ranking::top_groups(kept, |c| c.total_energy, options.top_n)
        .into_iter()
        .map(|(total_energy, members)| RankedGroup {
            total_energy,
            traces: members
                .iter()
                .map(|c| engine.run_unchecked(&c.order, profile))
                .collect(),
        })
        .collect();
    if cancelled {
        warn!(evaluated, total, "search cancelled; ranking is partial");
    }
    info!(
        evaluated,
        discarded,
        groups = groups.len(),
        best_kwh = groups.first().map(|g| g.total_energy),
        "search finished"
    );

    Ok(SearchOutcome {
        groups,
        evaluated,
        discarded,
        cancelled,
    })
}

#[cfg(feature = "parallel")]
fn evaluate_batch(
    engine: &Engine<'_>,
    orders: &[PriorityOrder],
    profile: &LoadProfile,
    parallel: bool,
) -> Vec<SimulationTrace> {
    use rayon::prelude::*;

    if parallel {
        // Indexed collect keeps enumeration order.
        orders
            .par_iter()
            .map(|order| engine.run_unchecked(order, profile))
            .collect()
    } else {
        orders
            .iter()
            .map(|order| engine.run_unchecked(order, profile))
            .collect()
    }
}

#[cfg(not(feature = "parallel"))]
fn evaluate_batch(
    engine: &Engine<'_>,
    orders: &[PriorityOrder],
    profile: &LoadProfile,
    _parallel: bool,
) -> Vec<SimulationTrace> {
    orders
        .iter()
        .map(|order| engine.run_unchecked(order, profile))
        .collect()
}
