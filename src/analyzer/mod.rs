// Analyzer module: indicators, alert rule and per-symbol snapshots.

pub mod alert;
pub mod indicators;
pub mod snapshot;

// Re-export the main Analyzer implementation for ease of use.
pub use snapshot::{Analyzer, AnalyzerImpl, MarketSnapshot};
