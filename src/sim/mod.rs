/// Hourly staging rule.
pub mod decision;
pub mod engine;
pub mod kpi;
pub mod types;

pub use decision::{Decision, Reason, Stager, StagingState};
pub use engine::Engine;
pub use kpi::TraceKpi;
pub use types::{HourlyRecord, SimulationTrace, StagingAction, StagingEvent};
