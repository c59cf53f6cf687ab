//! Capabilities the pipeline consumes from the outside world.
//!
//! Concrete network-backed implementations live in `tradegate-client`;
//! this module carries the traits plus the in-process implementations
//! used by the CLI and tests.

use std::collections::HashMap;

use crate::types::{
    AnalysisRecord, IndicatorSnapshot, PriceSeries, TradeProposal, Verdict, VerdictOutcome,
};
use crate::{Error, Result};

/// Source of price history for a symbol and timeframe.
pub trait MarketDataSource {
    /// Fetch chronological prices. Failures map to
    /// [`Error::ExternalUnavailable`].
    fn price_series(&self, symbol: &str, timeframe: &str) -> Result<PriceSeries>;
}

/// External opinion on a proposal.
pub trait VerdictProvider {
    /// Never fails: an unreachable provider answers
    /// [`VerdictOutcome::Unavailable`] and the rule path takes over.
    fn verdict(&self, proposal: &TradeProposal, snapshot: &IndicatorSnapshot) -> VerdictOutcome;
}

/// Persistence for finished analyses.
pub trait AnalysisStore {
    fn create(&mut self, record: AnalysisRecord) -> Result<()>;

    /// Up to `limit` records, newest first.
    fn latest(&self, limit: usize) -> Result<Vec<AnalysisRecord>>;
}

/// Provider that never has an opinion.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVerdict;

impl VerdictProvider for NoVerdict {
    fn verdict(&self, _proposal: &TradeProposal, _snapshot: &IndicatorSnapshot) -> VerdictOutcome {
        VerdictOutcome::unavailable("no verdict provider configured")
    }
}

/// A verdict supplied up front, e.g. read from a file.
impl VerdictProvider for Verdict {
    fn verdict(&self, _proposal: &TradeProposal, _snapshot: &IndicatorSnapshot) -> VerdictOutcome {
        VerdictOutcome::Available(self.clone())
    }
}

/// In-memory price history keyed by symbol.
#[derive(Debug, Clone, Default)]
pub struct StaticSeries {
    series: HashMap<String, PriceSeries>,
}

impl StaticSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register history for a symbol (case-insensitive).
    pub fn with_series(mut self, symbol: &str, series: PriceSeries) -> Self {
        self.series.insert(symbol.trim().to_uppercase(), series);
        self
    }
}

impl MarketDataSource for StaticSeries {
    fn price_series(&self, symbol: &str, _timeframe: &str) -> Result<PriceSeries> {
        self.series
            .get(&symbol.trim().to_uppercase())
            .cloned()
            .ok_or_else(|| Error::ExternalUnavailable(format!("no price history for {}", symbol)))
    }
}
