//! Error type shared by the library modules.

use std::io;

/// Failures that prevent a simulation or a search from starting.
///
/// Missing COP samples, capacity shortfalls and degenerate search results are
/// *not* errors: they are carried as values in the produced traces.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("the fleet has no units")]
    EmptyFleet,

    #[error("the load profile has no samples")]
    EmptyLoadProfile,

    #[error("exhaustive search over {units} units is not supported (max {max})")]
    FleetTooLarge { units: usize, max: usize },

    #[error("unit `{0}` is declared more than once")]
    DuplicateUnit(String),

    #[error("invalid unit id `{0}`: must be non-empty and must not contain `+`")]
    InvalidUnitId(String),

    #[error("unit `{0}` is not part of the fleet")]
    UnknownUnit(String),

    #[error("invalid priority order: {0}")]
    InvalidPriorityOrder(String),

    #[error("invalid load profile: {0}")]
    InvalidLoadProfile(String),

    #[error("invalid performance table: {0}")]
    InvalidPerformanceTable(String),

    #[error("invalid unit capacity for `{id}`: {capacity}")]
    InvalidCapacity { id: String, capacity: f64 },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
