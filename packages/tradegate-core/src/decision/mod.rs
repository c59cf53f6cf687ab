//! Decision aggregator and analysis run lifecycle.

mod aggregator;
mod run;

pub use aggregator::{aggregate, decide, decide_with};
pub use run::{AnalysisPhase, AnalysisRun};
