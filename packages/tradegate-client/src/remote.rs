//! Async analysis orchestration against a backend.
//!
//! Mirrors [`tradegate_core::Analyzer`] but takes a pre-computed snapshot
//! from the backend and bounds every remote call with a timeout. A failed
//! market fetch fails the run; a failed verdict only drops the run onto
//! the rule-based path.

use std::time::Duration;

use tokio::time::timeout;

use tradegate_core::config::EngineConfig;
use tradegate_core::decision::aggregate;
use tradegate_core::{
    compute_sizing_with, evaluate_strategy_with, AnalysisOutcome, AnalysisPhase, AnalysisRecord,
    AnalysisRun, Error, Result, TradeProposal, VerdictOutcome,
};

use crate::client::AnalysisBackend;
use crate::config::DEFAULT_TIMEOUT_SECS;
use crate::wire::format_symbol;

/// Drives proposals through a remote backend.
#[derive(Debug, Clone)]
pub struct RemoteAnalyzer<B> {
    backend: B,
    config: EngineConfig,
    timeout: Duration,
}

impl<B: AnalysisBackend> RemoteAnalyzer<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            config: EngineConfig::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Per-call deadline for backend requests.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Analyze one proposal.
    ///
    /// # Errors
    ///
    /// [`Error::ExternalUnavailable`] when market data cannot be fetched in
    /// time; the returned error carries the reason the run failed.
    pub async fn analyze(&self, proposal: &TradeProposal) -> Result<AnalysisOutcome> {
        let mut run = AnalysisRun::new();
        let sizing = compute_sizing_with(proposal, &self.config.sizing);

        run.advance(AnalysisPhase::FetchingMarket)?;
        let symbol = format_symbol(&proposal.symbol);
        let fetched = timeout(
            self.timeout,
            self.backend.market_state(&symbol, &proposal.timeframe),
        )
        .await;

        let snapshot = match fetched {
            Ok(Ok(snapshot)) => snapshot,
            Ok(Err(e)) => {
                return Err(fail(
                    &mut run,
                    format!("market data for {}: {:#}", symbol, e),
                ))
            }
            Err(_) => {
                return Err(fail(
                    &mut run,
                    format!("market data for {} timed out after {:?}", symbol, self.timeout),
                ))
            }
        };

        // The backend already computed the indicators; this phase only
        // accepts the normalized snapshot.
        run.advance(AnalysisPhase::ComputingIndicators)?;
        run.advance(AnalysisPhase::Evaluating)?;

        let evaluation = evaluate_strategy_with(
            &proposal.strategy_id,
            proposal.side,
            &snapshot,
            &self.config.rules,
        );

        let verdict = if sizing.is_safe {
            match timeout(self.timeout, self.backend.verdict(proposal, &snapshot)).await {
                Ok(Ok(verdict)) => VerdictOutcome::Available(verdict),
                Ok(Err(e)) => VerdictOutcome::unavailable(format!("{:#}", e)),
                Err(_) => VerdictOutcome::unavailable(format!(
                    "verdict timed out after {:?}",
                    self.timeout
                )),
            }
        } else {
            VerdictOutcome::unavailable("not consulted: sizing is unsafe")
        };
        if let VerdictOutcome::Unavailable { reason } = &verdict {
            tracing::warn!(reason = %reason, "Verdict unavailable, using strategy rules");
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
            symbol = %symbol,
            recommendation = %result.recommendation,
            "Remote analysis complete"
        );

        Ok(AnalysisOutcome {
            record: AnalysisRecord::new(proposal.clone(), snapshot, result),
            sizing,
            evaluation,
            verdict,
            run,
        })
    }

    /// Latest analyses stored by the backend.
    pub async fn history(&self, limit: usize) -> Result<Vec<AnalysisRecord>> {
        match timeout(self.timeout, self.backend.latest_records(limit)).await {
            Ok(Ok(records)) => Ok(records),
            Ok(Err(e)) => Err(Error::ExternalUnavailable(format!("history: {:#}", e))),
            Err(_) => Err(Error::ExternalUnavailable(format!(
                "history timed out after {:?}",
                self.timeout
            ))),
        }
    }
}

fn fail(run: &mut AnalysisRun, reason: String) -> Error {
    if let Err(e) = run.fail(reason.clone()) {
        tracing::warn!(error = %e, "Run was already terminal");
    }
    Error::ExternalUnavailable(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tradegate_core::{
        CrossStatus, IndicatorSnapshot, MacdState, Recommendation, TradeSide, Verdict,
    };

    #[derive(Default)]
    struct FakeBackend {
        snapshot: Option<IndicatorSnapshot>,
        verdict: Option<Verdict>,
        delay: Duration,
        verdict_calls: AtomicUsize,
        requested_symbols: Mutex<Vec<String>>,
    }

    impl AnalysisBackend for FakeBackend {
        fn market_state(
            &self,
            symbol: &str,
            _timeframe: &str,
        ) -> impl Future<Output = anyhow::Result<IndicatorSnapshot>> + Send {
            if let Ok(mut symbols) = self.requested_symbols.lock() {
                symbols.push(symbol.to_string());
            }
            async move {
                tokio::time::sleep(self.delay).await;
                self.snapshot.clone().ok_or_else(|| anyhow!("connection refused"))
            }
        }

        fn verdict(
            &self,
            _proposal: &TradeProposal,
            _snapshot: &IndicatorSnapshot,
        ) -> impl Future<Output = anyhow::Result<Verdict>> + Send {
            self.verdict_calls.fetch_add(1, Ordering::SeqCst);
            async move { self.verdict.clone().ok_or_else(|| anyhow!("model overloaded")) }
        }

        fn latest_records(
            &self,
            _limit: usize,
        ) -> impl Future<Output = anyhow::Result<Vec<AnalysisRecord>>> + Send {
            async move { Err(anyhow!("not stored")) }
        }
    }

    fn bullish_snapshot() -> IndicatorSnapshot {
        IndicatorSnapshot {
            symbol: "BTC/USDT".to_string(),
            current_price: 100.0,
            rsi: 25.0,
            ma50: 98.0,
            ma200: 95.0,
            ema12: 99.0,
            ema200: 90.0,
            macd: MacdState {
                line: 0.5,
                signal: 0.2,
                histogram: 0.3,
                cross_status: CrossStatus::Up,
            },
            volatility: 1.0,
        }
    }

    fn wait_verdict() -> Verdict {
        Verdict {
            recommendation: Recommendation::Wait,
            confidence_score: 60.0,
            reasoning: "Funding is stretched.".to_string(),
            risk_assessment: "Elevated.".to_string(),
            suggested_adjustments: None,
        }
    }

    fn safe_proposal() -> TradeProposal {
        TradeProposal::new("btc", TradeSide::Long, 100.0, 98.0, 106.0)
            .with_account(1000.0, 1.0, 10.0)
    }

    #[tokio::test]
    async fn test_market_failure_fails_run() {
        let analyzer = RemoteAnalyzer::new(FakeBackend::default());

        let err = analyzer.analyze(&safe_proposal()).await.unwrap_err();
        assert!(matches!(
            err,
            Error::ExternalUnavailable(ref msg) if msg.contains("connection refused")
        ));
    }

    #[tokio::test]
    async fn test_market_timeout_fails_run() {
        let backend = FakeBackend {
            snapshot: Some(bullish_snapshot()),
            delay: Duration::from_millis(200),
            ..Default::default()
        };
        let analyzer = RemoteAnalyzer::new(backend).with_timeout(Duration::from_millis(20));

        let err = analyzer.analyze(&safe_proposal()).await.unwrap_err();
        assert!(matches!(err, Error::ExternalUnavailable(ref msg) if msg.contains("timed out")));
    }

    #[tokio::test]
    async fn test_symbol_is_formatted() {
        let backend = FakeBackend {
            snapshot: Some(bullish_snapshot()),
            ..Default::default()
        };
        let analyzer = RemoteAnalyzer::new(backend);

        analyzer.analyze(&safe_proposal()).await.unwrap();
        let symbols = analyzer.backend().requested_symbols.lock().unwrap().clone();
        assert_eq!(symbols, vec!["BTC/USDT".to_string()]);
    }

    #[tokio::test]
    async fn test_verdict_failure_falls_back_to_rules() {
        let backend = FakeBackend {
            snapshot: Some(bullish_snapshot()),
            ..Default::default()
        };
        let analyzer = RemoteAnalyzer::new(backend);

        let outcome = analyzer.analyze(&safe_proposal()).await.unwrap();

        assert_eq!(outcome.run.phase(), AnalysisPhase::Done);
        assert!(outcome.verdict.verdict().is_none());
        assert_eq!(outcome.record.analysis.recommendation, Recommendation::Execute);
    }

    #[tokio::test]
    async fn test_conservative_verdict_is_kept() {
        let backend = FakeBackend {
            snapshot: Some(bullish_snapshot()),
            verdict: Some(wait_verdict()),
            ..Default::default()
        };
        let analyzer = RemoteAnalyzer::new(backend);

        let outcome = analyzer.analyze(&safe_proposal()).await.unwrap();
        assert_eq!(outcome.record.analysis.recommendation, Recommendation::Wait);
        assert!(outcome.record.analysis.reasoning.starts_with("Funding is stretched."));
    }

    #[tokio::test]
    async fn test_unsafe_sizing_skips_verdict() {
        let backend = FakeBackend {
            snapshot: Some(bullish_snapshot()),
            verdict: Some(wait_verdict()),
            ..Default::default()
        };
        let analyzer = RemoteAnalyzer::new(backend);
        let proposal = TradeProposal::new("BTC", TradeSide::Long, 100.0, 99.9, 106.0)
            .with_account(1000.0, 2.0, 1.0);

        let outcome = analyzer.analyze(&proposal).await.unwrap();

        assert_eq!(outcome.record.analysis.recommendation, Recommendation::Cancel);
        assert_eq!(analyzer.backend().verdict_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_history_failure_is_external() {
        let analyzer = RemoteAnalyzer::new(FakeBackend::default());
        let err = analyzer.history(5).await.unwrap_err();
        assert!(matches!(err, Error::ExternalUnavailable(_)));
    }
}
