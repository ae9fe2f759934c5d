//! Chiller fleet staging simulator and exhaustive priority order search.

/// TOML scenario configuration and presets.
pub mod config;
pub mod error;
pub mod fleet;
/// CSV and JSON import and export.
pub mod io;
/// COP lookup tables and synthetic curves.
pub mod performance;
pub mod priority;
pub mod profile;
pub mod report;
/// Permutation search and energy ranking.
pub mod search;
/// Staging rule, simulation engine, trace types, and KPIs.
pub mod sim;

pub use error::{Error, Result};
