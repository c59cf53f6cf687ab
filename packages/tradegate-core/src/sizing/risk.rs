//! Risk-based position sizing.
//!
//! Quantity is derived backward from the amount the trader is willing to
//! lose divided by the stop distance, then checked against the account:
//! a tight stop at a fixed risk percentage can imply a margin larger than
//! the whole balance, and that proposal must be blocked.

use serde::{Deserialize, Serialize};

use super::checks::check_proposal;
use crate::config::SizingConfig;
use crate::types::{SizingResult, TradeProposal};

/// Calculate sizing with default fee and margin thresholds.
///
/// # Example
///
/// ```rust
/// use tradegate_core::{compute_sizing, TradeProposal, TradeSide};
///
/// let proposal = TradeProposal::new("BTC", TradeSide::Long, 100.0, 99.0, 102.0)
///     .with_account(1000.0, 1.0, 1.0);
/// let sizing = compute_sizing(&proposal);
///
/// assert_eq!(sizing.estimated_risk_amount, 10.0);
/// assert_eq!(sizing.margin_usage_percent, 100.0);
/// assert!(sizing.is_safe); // the limit itself is allowed
/// ```
pub fn compute_sizing(proposal: &TradeProposal) -> SizingResult {
    compute_sizing_with(proposal, &SizingConfig::default())
}

/// Calculate sizing fields for a proposal.
///
/// Never fails: degenerate proposals (see
/// [`check_proposal`](super::check_proposal)) produce an all-zero result
/// with `is_safe = false`.
pub fn compute_sizing_with(proposal: &TradeProposal, config: &SizingConfig) -> SizingResult {
    if let Some(defect) = check_proposal(proposal) {
        tracing::debug!(symbol = %proposal.symbol, %defect, "Proposal cannot be sized");
        return SizingResult::zeroed();
    }

    let estimated_risk_amount = proposal.account_balance * (proposal.risk_percentage / 100.0);
    let price_distance = (proposal.entry_price - proposal.stop_loss).abs();

    let quantity = estimated_risk_amount / price_distance;
    let notional = quantity * proposal.entry_price;
    let margin = notional / proposal.leverage;
    let margin_usage_percent = (margin / proposal.account_balance) * 100.0;
    let estimated_fee = notional * config.fee_rate;

    let is_safe = margin_usage_percent.is_finite()
        && margin_usage_percent <= config.margin_limit_percent;

    if !is_safe {
        tracing::warn!(
            symbol = %proposal.symbol,
            margin_usage_percent,
            "Implied margin exceeds the account limit"
        );
    }

    SizingResult {
        quantity,
        notional,
        margin,
        estimated_risk_amount,
        estimated_fee,
        margin_usage_percent,
        is_safe,
    }
}

/// Margin usage classification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MarginBand {
    /// At or below the warning threshold
    Comfortable,
    /// Above the warning threshold but within the limit (advisory)
    Elevated,
    /// Above the limit, or unsizable (blocking)
    Excessive,
}

impl MarginBand {
    /// Classify a sizing result against the configured thresholds.
    pub fn classify(sizing: &SizingResult, config: &SizingConfig) -> Self {
        if !sizing.is_safe {
            MarginBand::Excessive
        } else if sizing.margin_usage_percent > config.margin_warning_percent {
            MarginBand::Elevated
        } else {
            MarginBand::Comfortable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TradeSide;
    use approx::assert_relative_eq;

    fn proposal(entry: f64, stop: f64, balance: f64, risk: f64, leverage: f64) -> TradeProposal {
        TradeProposal::new("BTC", TradeSide::Long, entry, stop, entry * 1.1)
            .with_account(balance, risk, leverage)
    }

    #[test]
    fn test_boundary_margin_is_safe() {
        let sizing = compute_sizing(&proposal(100.0, 99.0, 1000.0, 1.0, 1.0));

        assert_relative_eq!(sizing.estimated_risk_amount, 10.0);
        assert_relative_eq!(sizing.quantity, 10.0);
        assert_relative_eq!(sizing.notional, 1000.0);
        assert_relative_eq!(sizing.margin, 1000.0);
        assert_relative_eq!(sizing.margin_usage_percent, 100.0);
        assert_relative_eq!(sizing.estimated_fee, 0.7, epsilon = 1e-9);
        assert!(sizing.is_safe);
    }

    #[test]
    fn test_leverage_reduces_margin() {
        let sizing = compute_sizing(&proposal(100.0, 99.0, 1000.0, 1.0, 10.0));

        assert_relative_eq!(sizing.notional, 1000.0);
        assert_relative_eq!(sizing.margin, 100.0);
        assert_relative_eq!(sizing.margin_usage_percent, 10.0);
        assert!(sizing.is_safe);
    }

    #[test]
    fn test_tight_stop_is_blocked() {
        // 0.1% stop distance at 2% risk implies 20x the balance in notional
        let sizing = compute_sizing(&proposal(100.0, 99.9, 1000.0, 2.0, 1.0));

        assert_relative_eq!(sizing.quantity, 200.0, epsilon = 1e-6);
        assert_relative_eq!(sizing.margin_usage_percent, 2000.0, epsilon = 1e-6);
        assert!(!sizing.is_safe);
    }

    #[test]
    fn test_short_uses_absolute_distance() {
        let short = TradeProposal::new("ETH", TradeSide::Short, 100.0, 104.0, 90.0)
            .with_account(2000.0, 2.0, 5.0);
        let sizing = compute_sizing(&short);

        // 40 risk / 4 distance
        assert_relative_eq!(sizing.quantity, 10.0);
        assert_relative_eq!(sizing.margin, 200.0);
    }

    #[test]
    fn test_equal_entry_and_stop_is_zeroed() {
        let sizing = compute_sizing(&proposal(100.0, 100.0, 1000.0, 1.0, 1.0));
        assert_eq!(sizing, SizingResult::zeroed());
        assert!(!sizing.is_safe);
    }

    #[test]
    fn test_invalid_leverage_is_rejected() {
        let sizing = compute_sizing(&proposal(100.0, 99.0, 1000.0, 1.0, 0.0));
        assert_eq!(sizing, SizingResult::zeroed());
    }

    #[test]
    fn test_custom_fee_rate() {
        let config = SizingConfig {
            fee_rate: 0.001,
            ..Default::default()
        };
        let sizing = compute_sizing_with(&proposal(100.0, 99.0, 1000.0, 1.0, 1.0), &config);
        assert_relative_eq!(sizing.estimated_fee, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_margin_band() {
        let config = SizingConfig::default();

        let comfortable = compute_sizing(&proposal(100.0, 99.0, 1000.0, 1.0, 10.0));
        assert_eq!(MarginBand::classify(&comfortable, &config), MarginBand::Comfortable);

        let elevated = compute_sizing(&proposal(100.0, 99.0, 1000.0, 1.0, 2.0));
        assert_eq!(MarginBand::classify(&elevated, &config), MarginBand::Elevated);

        let excessive = compute_sizing(&proposal(100.0, 99.9, 1000.0, 2.0, 1.0));
        assert_eq!(MarginBand::classify(&excessive, &config), MarginBand::Excessive);
    }
}
