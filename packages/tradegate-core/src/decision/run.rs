//! Per-run analysis state machine.
//!
//! ```text
//! PENDING -> FETCHING_MARKET -> COMPUTING_INDICATORS -> EVALUATING -> DONE
//!     \____________\___________________\____________________\-----> FAILED
//! ```
//!
//! Runs are not persisted; only a finished run's result becomes an
//! [`AnalysisRecord`](crate::AnalysisRecord).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::AnalysisResult;
use crate::{Error, Result};

/// Phase of one analysis run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisPhase {
    Pending,
    FetchingMarket,
    ComputingIndicators,
    Evaluating,
    Done,
    Failed,
}

impl AnalysisPhase {
    /// Whether the run can no longer change.
    pub fn is_terminal(self) -> bool {
        matches!(self, AnalysisPhase::Done | AnalysisPhase::Failed)
    }

    /// Whether `next` is a legal successor of this phase.
    pub fn can_transition_to(self, next: AnalysisPhase) -> bool {
        use AnalysisPhase::*;

        match (self, next) {
            (Pending, FetchingMarket)
            | (FetchingMarket, ComputingIndicators)
            | (ComputingIndicators, Evaluating)
            | (Evaluating, Done) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for AnalysisPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnalysisPhase::Pending => "PENDING",
            AnalysisPhase::FetchingMarket => "FETCHING_MARKET",
            AnalysisPhase::ComputingIndicators => "COMPUTING_INDICATORS",
            AnalysisPhase::Evaluating => "EVALUATING",
            AnalysisPhase::Done => "DONE",
            AnalysisPhase::Failed => "FAILED",
        };
        write!(f, "{}", name)
    }
}

/// One analysis run moving through [`AnalysisPhase`]s.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisRun {
    phase: AnalysisPhase,
    history: Vec<AnalysisPhase>,
    result: Option<AnalysisResult>,
    failure: Option<String>,
}

impl Default for AnalysisRun {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisRun {
    /// Start a run in `PENDING`.
    pub fn new() -> Self {
        Self {
            phase: AnalysisPhase::Pending,
            history: vec![AnalysisPhase::Pending],
            result: None,
            failure: None,
        }
    }

    pub fn phase(&self) -> AnalysisPhase {
        self.phase
    }

    /// Every phase entered so far, in order.
    pub fn history(&self) -> &[AnalysisPhase] {
        &self.history
    }

    /// Result of a `DONE` run.
    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    /// Reason a `FAILED` run stopped.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Move to an intermediate phase.
    ///
    /// `DONE` and `FAILED` are only reachable through [`complete`](Self::complete)
    /// and [`fail`](Self::fail).
    pub fn advance(&mut self, next: AnalysisPhase) -> Result<()> {
        if next.is_terminal() {
            return Err(self.invalid(next));
        }
        self.enter(next)
    }

    /// Finish the run with a result. Only legal from `EVALUATING`.
    pub fn complete(&mut self, result: AnalysisResult) -> Result<()> {
        self.enter(AnalysisPhase::Done)?;
        self.result = Some(result);
        Ok(())
    }

    /// Abort the run. No result is kept.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<()> {
        self.enter(AnalysisPhase::Failed)?;
        let reason = reason.into();
        tracing::warn!(reason = %reason, "Analysis run failed");
        self.failure = Some(reason);
        self.result = None;
        Ok(())
    }

    fn enter(&mut self, next: AnalysisPhase) -> Result<()> {
        if !self.phase.can_transition_to(next) {
            return Err(self.invalid(next));
        }
        tracing::info!(from = %self.phase, to = %next, "Analysis phase");
        self.phase = next;
        self.history.push(next);
        Ok(())
    }

    fn invalid(&self, to: AnalysisPhase) -> Error {
        Error::InvalidTransition {
            from: self.phase,
            to,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Recommendation;

    fn result() -> AnalysisResult {
        AnalysisResult {
            recommendation: Recommendation::Wait,
            confidence_score: 50.0,
            reasoning: "test".to_string(),
            risk_assessment: "test".to_string(),
            suggested_adjustments: None,
            strategy_score: None,
            rule_passed: None,
        }
    }

    fn evaluating_run() -> AnalysisRun {
        let mut run = AnalysisRun::new();
        run.advance(AnalysisPhase::FetchingMarket).unwrap();
        run.advance(AnalysisPhase::ComputingIndicators).unwrap();
        run.advance(AnalysisPhase::Evaluating).unwrap();
        run
    }

    #[test]
    fn test_happy_path() {
        let mut run = evaluating_run();
        run.complete(result()).unwrap();

        assert_eq!(run.phase(), AnalysisPhase::Done);
        assert!(run.is_terminal());
        assert!(run.result().is_some());
        assert_eq!(
            run.history(),
            &[
                AnalysisPhase::Pending,
                AnalysisPhase::FetchingMarket,
                AnalysisPhase::ComputingIndicators,
                AnalysisPhase::Evaluating,
                AnalysisPhase::Done,
            ]
        );
    }

    #[test]
    fn test_cannot_skip_phases() {
        let mut run = AnalysisRun::new();
        let err = run.advance(AnalysisPhase::Evaluating).unwrap_err();

        assert!(matches!(
            err,
            Error::InvalidTransition {
                from: AnalysisPhase::Pending,
                to: AnalysisPhase::Evaluating
            }
        ));
        assert_eq!(run.phase(), AnalysisPhase::Pending);
    }

    #[test]
    fn test_complete_requires_evaluating() {
        let mut run = AnalysisRun::new();
        run.advance(AnalysisPhase::FetchingMarket).unwrap();

        assert!(run.complete(result()).is_err());
        assert!(run.result().is_none());
    }

    #[test]
    fn test_advance_rejects_terminal_phases() {
        let mut run = evaluating_run();
        assert!(run.advance(AnalysisPhase::Done).is_err());
        assert!(run.advance(AnalysisPhase::Failed).is_err());
    }

    #[test]
    fn test_fail_from_any_open_phase() {
        let mut run = AnalysisRun::new();
        run.advance(AnalysisPhase::FetchingMarket).unwrap();
        run.fail("timeout").unwrap();

        assert_eq!(run.phase(), AnalysisPhase::Failed);
        assert_eq!(run.failure(), Some("timeout"));
        assert!(run.result().is_none());
    }

    #[test]
    fn test_terminal_runs_are_frozen() {
        let mut run = evaluating_run();
        run.complete(result()).unwrap();

        assert!(run.fail("late error").is_err());
        assert!(run.result().is_some());

        let mut failed = AnalysisRun::new();
        failed.fail("boom").unwrap();
        assert!(failed.fail("again").is_err());
        assert_eq!(failed.failure(), Some("boom"));
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(AnalysisPhase::FetchingMarket.to_string(), "FETCHING_MARKET");
        assert_eq!(
            serde_json::to_string(&AnalysisPhase::ComputingIndicators).unwrap(),
            "\"COMPUTING_INDICATORS\""
        );
    }
}
