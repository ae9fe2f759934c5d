/// Trace, event and ranking writers.
pub mod export;
/// Readers for plant data files.
pub mod import;
