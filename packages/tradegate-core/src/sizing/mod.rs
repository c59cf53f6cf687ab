//! Position and risk calculator.
//!
//! Provides risk-based sizing, margin-usage gating, and proposal checks.

mod checks;
mod risk;

pub use checks::{check_proposal, orientation_advisories, risk_reward_ratio, ProposalDefect};
pub use risk::{compute_sizing, compute_sizing_with, MarginBand};
