//! Synchronous analysis pipeline.
//!
//! Sizing runs first, then market data is fetched and indicators are
//! computed, and finally the decision aggregator combines everything.
//! Each step advances an [`AnalysisRun`].

use crate::config::EngineConfig;
use crate::decision::{aggregate, AnalysisPhase, AnalysisRun};
use crate::indicators::compute_indicators;
use crate::providers::{AnalysisStore, MarketDataSource, NoVerdict, VerdictProvider};
use crate::sizing::compute_sizing_with;
use crate::strategy::{evaluate_strategy_with, StrategyEvaluation};
use crate::types::{
    AnalysisRecord, IndicatorSnapshot, SizingResult, TradeProposal, VerdictOutcome,
};
use crate::{Error, Result};

/// Everything produced by a successful run.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub record: AnalysisRecord,
    pub sizing: SizingResult,
    pub evaluation: StrategyEvaluation,
    pub verdict: VerdictOutcome,
    pub run: AnalysisRun,
}

/// Runs proposals through sizing, indicators and the decision aggregator.
#[derive(Debug)]
pub struct Analyzer<M, V = NoVerdict> {
    source: M,
    verdicts: V,
    config: EngineConfig,
}

impl<M: MarketDataSource> Analyzer<M, NoVerdict> {
    /// Analyzer with no external verdict provider.
    pub fn new(source: M) -> Self {
        Self {
            source,
            verdicts: NoVerdict,
            config: EngineConfig::default(),
        }
    }
}

impl<M: MarketDataSource, V: VerdictProvider> Analyzer<M, V> {
    /// Swap in a verdict provider.
    pub fn with_verdicts<W: VerdictProvider>(self, verdicts: W) -> Analyzer<M, W> {
        Analyzer {
            source: self.source,
            verdicts,
            config: self.config,
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Analyze one proposal.
    ///
    /// # Errors
    ///
    /// Market data failures fail the run and surface as
    /// [`Error::ExternalUnavailable`]. Everything after the fetch is
    /// infallible.
    pub fn analyze(&self, proposal: &TradeProposal) -> Result<AnalysisOutcome> {
        let mut run = AnalysisRun::new();
        let sizing = compute_sizing_with(proposal, &self.config.sizing);

        run.advance(AnalysisPhase::FetchingMarket)?;
        let series = match self.source.price_series(&proposal.symbol, &proposal.timeframe) {
            Ok(series) => series,
            Err(err) => {
                run.fail(err.to_string())?;
                return Err(match err {
                    Error::ExternalUnavailable(_) => err,
                    other => Error::ExternalUnavailable(other.to_string()),
                });
            }
        };

        run.advance(AnalysisPhase::ComputingIndicators)?;
        let snapshot = compute_indicators(&proposal.symbol, &series, &self.config.indicators);

        self.evaluate(run, proposal, snapshot, sizing)
    }

    /// Analyze and persist the record.
    pub fn analyze_and_store<S: AnalysisStore>(
        &self,
        proposal: &TradeProposal,
        store: &mut S,
    ) -> Result<AnalysisOutcome> {
        let outcome = self.analyze(proposal)?;
        store.create(outcome.record.clone())?;
        Ok(outcome)
    }

    fn evaluate(
        &self,
        mut run: AnalysisRun,
        proposal: &TradeProposal,
        snapshot: IndicatorSnapshot,
        sizing: SizingResult,
    ) -> Result<AnalysisOutcome> {
        run.advance(AnalysisPhase::Evaluating)?;

        let evaluation = evaluate_strategy_with(
            &proposal.strategy_id,
            proposal.side,
            &snapshot,
            &self.config.rules,
        );

        let verdict = if sizing.is_safe {
            self.verdicts.verdict(proposal, &snapshot)
        } else {
            VerdictOutcome::unavailable("not consulted: sizing is unsafe")
        };
        if let VerdictOutcome::Unavailable { reason } = &verdict {
            tracing::debug!(reason = %reason, "Deciding on rules alone");
        }

        let result = aggregate(
            proposal,
            &sizing,
            &evaluation,
            verdict.verdict(),
            &self.config.sizing,
        );
        run.complete(result.clone())?;

        tracing::info!(
            symbol = %proposal.symbol,
            side = %proposal.side,
            recommendation = %result.recommendation,
            confidence = result.confidence_score,
            "Analysis complete"
        );

        Ok(AnalysisOutcome {
            record: AnalysisRecord::new(proposal.clone(), snapshot, result),
            sizing,
            evaluation,
            verdict,
            run,
        })
    }
}
