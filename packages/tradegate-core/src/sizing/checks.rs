//! Proposal validation and orientation advisories.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{TradeProposal, TradeSide};

/// Why a proposal cannot be sized.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProposalDefect {
    NonPositiveEntry,
    NonPositiveStop,
    ZeroStopDistance,
    NonPositiveBalance,
    RiskOutOfRange,
    InvalidLeverage,
}

impl fmt::Display for ProposalDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ProposalDefect::NonPositiveEntry => "entry price must be positive",
            ProposalDefect::NonPositiveStop => "stop loss must be positive",
            ProposalDefect::ZeroStopDistance => {
                "entry price equals stop loss, so the risk distance is zero"
            }
            ProposalDefect::NonPositiveBalance => "account balance must be positive",
            ProposalDefect::RiskOutOfRange => "risk percentage must be within (0, 100]",
            ProposalDefect::InvalidLeverage => "leverage must be at least 1x",
        };
        f.write_str(text)
    }
}

/// First defect that makes the proposal unsizable, if any.
pub fn check_proposal(proposal: &TradeProposal) -> Option<ProposalDefect> {
    let positive = |v: f64| v.is_finite() && v > 0.0;

    if !positive(proposal.entry_price) {
        return Some(ProposalDefect::NonPositiveEntry);
    }
    if !positive(proposal.stop_loss) {
        return Some(ProposalDefect::NonPositiveStop);
    }
    if proposal.entry_price == proposal.stop_loss {
        return Some(ProposalDefect::ZeroStopDistance);
    }
    if !positive(proposal.account_balance) {
        return Some(ProposalDefect::NonPositiveBalance);
    }
    if !positive(proposal.risk_percentage) || proposal.risk_percentage > 100.0 {
        return Some(ProposalDefect::RiskOutOfRange);
    }
    if !proposal.leverage.is_finite() || proposal.leverage < 1.0 {
        return Some(ProposalDefect::InvalidLeverage);
    }

    None
}

/// Reward distance over risk distance.
///
/// `None` for unsizable proposals or a non-positive take-profit.
pub fn risk_reward_ratio(proposal: &TradeProposal) -> Option<f64> {
    if check_proposal(proposal).is_some()
        || !proposal.take_profit.is_finite()
        || proposal.take_profit <= 0.0
    {
        return None;
    }

    let risk = (proposal.entry_price - proposal.stop_loss).abs();
    let reward = (proposal.take_profit - proposal.entry_price).abs();
    Some(reward / risk)
}

/// Non-blocking notes about stop and target placement.
pub fn orientation_advisories(proposal: &TradeProposal) -> Vec<String> {
    let mut notes = Vec::new();
    let entry = proposal.entry_price;

    match proposal.side {
        TradeSide::Long => {
            if proposal.stop_loss > entry {
                notes.push(format!(
                    "Stop loss {} sits above the LONG entry {}; move it below entry.",
                    proposal.stop_loss, entry
                ));
            }
            if proposal.take_profit > 0.0 && proposal.take_profit <= entry {
                notes.push(format!(
                    "Take profit {} is not above the LONG entry {}.",
                    proposal.take_profit, entry
                ));
            }
        }
        TradeSide::Short => {
            if proposal.stop_loss < entry {
                notes.push(format!(
                    "Stop loss {} sits below the SHORT entry {}; move it above entry.",
                    proposal.stop_loss, entry
                ));
            }
            if proposal.take_profit > 0.0 && proposal.take_profit >= entry {
                notes.push(format!(
                    "Take profit {} is not below the SHORT entry {}.",
                    proposal.take_profit, entry
                ));
            }
        }
    }

    notes
}
