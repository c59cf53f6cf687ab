//! Final recommendation from sizing, strategy rules and an optional verdict.
//!
//! Precedence, strongest first:
//!
//! 1. Risk gate: unsafe sizing is always `CANCEL`.
//! 2. Rule gate: a failed strategy evaluation is at most `WAIT`.
//! 3. External verdict, when present.
//! 4. Local synthesis from the rule evaluation.

use crate::config::{EngineConfig, SizingConfig};
use crate::sizing::{check_proposal, orientation_advisories, risk_reward_ratio, MarginBand};
use crate::strategy::{evaluate_strategy_with, StrategyEvaluation};
use crate::types::{
    AnalysisResult, IndicatorSnapshot, Recommendation, SizingResult, TradeProposal, Verdict,
};

/// Decide on a proposal with the default configuration.
///
/// # Arguments
///
/// * `proposal` - The trade being considered
/// * `snapshot` - Indicators for the proposal's symbol
/// * `sizing` - Output of [`compute_sizing`](crate::compute_sizing) for the proposal
/// * `verdict` - Optional external opinion
///
/// # Example
///
/// ```rust
/// use tradegate_core::{compute_sizing, decide, IndicatorSnapshot, Recommendation};
/// use tradegate_core::{TradeProposal, TradeSide};
///
/// // 0.1% stop at 2% risk needs 20x the balance as margin
/// let proposal = TradeProposal::new("BTC", TradeSide::Long, 100.0, 99.9, 105.0)
///     .with_account(1000.0, 2.0, 1.0);
/// let sizing = compute_sizing(&proposal);
///
/// let result = decide(&proposal, &IndicatorSnapshot::default(), &sizing, None);
/// assert_eq!(result.recommendation, Recommendation::Cancel);
/// ```
pub fn decide(
    proposal: &TradeProposal,
    snapshot: &IndicatorSnapshot,
    sizing: &SizingResult,
    verdict: Option<&Verdict>,
) -> AnalysisResult {
    decide_with(proposal, snapshot, sizing, verdict, &EngineConfig::default())
}

/// Decide on a proposal using configured rule and sizing thresholds.
pub fn decide_with(
    proposal: &TradeProposal,
    snapshot: &IndicatorSnapshot,
    sizing: &SizingResult,
    verdict: Option<&Verdict>,
    config: &EngineConfig,
) -> AnalysisResult {
    let evaluation =
        evaluate_strategy_with(&proposal.strategy_id, proposal.side, snapshot, &config.rules);
    aggregate(proposal, sizing, &evaluation, verdict, &config.sizing)
}

/// Combine an already computed strategy evaluation with sizing and verdict.
pub fn aggregate(
    proposal: &TradeProposal,
    sizing: &SizingResult,
    evaluation: &StrategyEvaluation,
    verdict: Option<&Verdict>,
    config: &SizingConfig,
) -> AnalysisResult {
    let score = evaluation.score();
    let mut adjustments = orientation_advisories(proposal);

    if !sizing.is_safe {
        adjustments.extend(margin_adjustments(proposal));
        return AnalysisResult {
            recommendation: Recommendation::Cancel,
            confidence_score: 100.0,
            reasoning: cancel_reasoning(proposal, sizing, config),
            risk_assessment: format!(
                "Blocked. Implied margin {:.2} against a balance of {:.2}.",
                sizing.margin, proposal.account_balance
            ),
            suggested_adjustments: join_lines(adjustments),
            strategy_score: Some(score),
            rule_passed: Some(evaluation.passed),
        };
    }

    let sizing_summary = sizing_summary(proposal, sizing, config);
    let rule_summary = rule_summary(evaluation);

    if !evaluation.passed {
        return rule_gate(sizing_summary, rule_summary, score, adjustments, verdict);
    }

    match verdict {
        Some(v) => {
            if let Some(extra) = &v.suggested_adjustments {
                adjustments.push(extra.clone());
            }
            AnalysisResult {
                recommendation: v.recommendation,
                confidence_score: clamp_confidence(v.confidence_score),
                reasoning: format!("{}\n\nRule check: {}", v.reasoning.trim(), rule_summary),
                risk_assessment: format!("{}\n{}", v.risk_assessment.trim(), sizing_summary),
                suggested_adjustments: join_lines(adjustments),
                strategy_score: Some(score),
                rule_passed: Some(true),
            }
        }
        None => AnalysisResult {
            recommendation: Recommendation::Execute,
            confidence_score: score,
            reasoning: rule_summary,
            risk_assessment: sizing_summary,
            suggested_adjustments: join_lines(adjustments),
            strategy_score: Some(score),
            rule_passed: Some(true),
        },
    }
}

/// Failed rules cap the outcome at `WAIT`. A verdict can only make it more
/// conservative, so an external `CANCEL` stands.
fn rule_gate(
    sizing_summary: String,
    rule_summary: String,
    score: f64,
    mut adjustments: Vec<String>,
    verdict: Option<&Verdict>,
) -> AnalysisResult {
    let mut result = AnalysisResult {
        recommendation: Recommendation::Wait,
        confidence_score: 100.0 - score,
        reasoning: rule_summary,
        risk_assessment: sizing_summary,
        suggested_adjustments: None,
        strategy_score: Some(score),
        rule_passed: Some(false),
    };

    if let Some(v) = verdict {
        if v.recommendation == Recommendation::Execute {
            result.reasoning.push_str(
                "\nExternal verdict EXECUTE was overridden: \
                 not enough strategy conditions hold.",
            );
        } else {
            if v.recommendation == Recommendation::Cancel {
                result.recommendation = Recommendation::Cancel;
                result.confidence_score = clamp_confidence(v.confidence_score);
            }
            result.reasoning =
                format!("{}\n\nRule check: {}", v.reasoning.trim(), result.reasoning);
            result.risk_assessment =
                format!("{}\n{}", v.risk_assessment.trim(), result.risk_assessment);
        }
        if let Some(extra) = &v.suggested_adjustments {
            adjustments.push(extra.clone());
        }
    }

    result.suggested_adjustments = join_lines(adjustments);
    result
}

fn cancel_reasoning(
    proposal: &TradeProposal,
    sizing: &SizingResult,
    config: &SizingConfig,
) -> String {
    match check_proposal(proposal) {
        Some(defect) => format!("Proposal cannot be sized: {}.", defect),
        None => format!(
            "Margin usage {:.2}% exceeds the {}% account limit. A stop {:.4} away from entry \
             at {}% risk implies a position the account cannot carry.",
            sizing.margin_usage_percent,
            config.margin_limit_percent,
            (proposal.entry_price - proposal.stop_loss).abs(),
            proposal.risk_percentage
        ),
    }
}

fn margin_adjustments(proposal: &TradeProposal) -> Vec<String> {
    if check_proposal(proposal).is_some() {
        return Vec::new();
    }
    vec![
        "• Widen the stop loss".to_string(),
        "• Lower the risk percentage".to_string(),
        "• Increase leverage".to_string(),
    ]
}

fn sizing_summary(
    proposal: &TradeProposal,
    sizing: &SizingResult,
    config: &SizingConfig,
) -> String {
    let mut summary = format!(
        "Risking {:.2} on {:.6} units ({:.2} notional, {:.2} margin). \
         Margin usage {:.2}%, estimated fee {:.4}.",
        sizing.estimated_risk_amount,
        sizing.quantity,
        sizing.notional,
        sizing.margin,
        sizing.margin_usage_percent,
        sizing.estimated_fee
    );

    if MarginBand::classify(sizing, config) == MarginBand::Elevated {
        summary.push_str(&format!(
            " Margin usage is above the {}% warning level.",
            config.margin_warning_percent
        ));
    }
    if let Some(ratio) = risk_reward_ratio(proposal) {
        summary.push_str(&format!(" Risk:reward 1:{:.2}.", ratio));
    }

    summary
}

fn rule_summary(evaluation: &StrategyEvaluation) -> String {
    let mut summary = format!(
        "{} {}: {}/{} conditions met ({} required).",
        evaluation.strategy_id,
        evaluation.side,
        evaluation.conditions_met,
        evaluation.conditions.len(),
        evaluation.conditions_required
    );

    let met = evaluation.met_labels();
    if !met.is_empty() {
        summary.push_str(&format!("\nMet: {}.", met.join("; ")));
    }
    let unmet = evaluation.unmet_labels();
    if !unmet.is_empty() {
        summary.push_str(&format!("\nNot met: {}.", unmet.join("; ")));
    }

    summary
}

fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_finite() {
        confidence.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

fn join_lines(lines: Vec<String>) -> Option<String> {
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}
