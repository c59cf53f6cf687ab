//! Side-specific strategy rule counting.

use serde::{Deserialize, Serialize};

use super::registry::{get_strategy, RuleSet};
use crate::config::RuleConfig;
use crate::indicators::RsiZone;
use crate::types::{CrossStatus, IndicatorSnapshot, TradeSide};

/// One evaluated rule condition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConditionCheck {
    pub label: String,
    pub passed: bool,
}

impl ConditionCheck {
    fn new(label: impl Into<String>, passed: bool) -> Self {
        Self {
            label: label.into(),
            passed,
        }
    }
}

/// Outcome of counting a strategy's conditions for one side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StrategyEvaluation {
    /// Resolved strategy id (general rules for unknown ids)
    pub strategy_id: String,
    pub side: TradeSide,
    pub conditions: Vec<ConditionCheck>,
    pub conditions_met: usize,
    pub conditions_required: usize,
    pub passed: bool,
}

impl StrategyEvaluation {
    fn from_conditions(
        strategy_id: &str,
        side: TradeSide,
        conditions: Vec<ConditionCheck>,
        conditions_required: usize,
    ) -> Self {
        let conditions_met = conditions.iter().filter(|c| c.passed).count();
        Self {
            strategy_id: strategy_id.to_string(),
            side,
            conditions,
            conditions_met,
            conditions_required,
            passed: conditions_met >= conditions_required,
        }
    }

    /// Percentage of conditions that held.
    pub fn score(&self) -> f64 {
        if self.conditions.is_empty() {
            return 0.0;
        }
        (self.conditions_met as f64 / self.conditions.len() as f64) * 100.0
    }

    /// Labels of conditions that held.
    pub fn met_labels(&self) -> Vec<&str> {
        self.conditions
            .iter()
            .filter(|c| c.passed)
            .map(|c| c.label.as_str())
            .collect()
    }

    /// Labels of conditions that failed.
    pub fn unmet_labels(&self) -> Vec<&str> {
        self.conditions
            .iter()
            .filter(|c| !c.passed)
            .map(|c| c.label.as_str())
            .collect()
    }
}

/// Evaluate a strategy with default RSI thresholds.
pub fn evaluate_strategy(
    strategy_id: &str,
    side: TradeSide,
    snapshot: &IndicatorSnapshot,
) -> StrategyEvaluation {
    evaluate_strategy_with(strategy_id, side, snapshot, &RuleConfig::default())
}

/// Count the side's conditions for a strategy.
///
/// Unknown strategy ids fall back to the trend-following rules.
/// Conditions that compare against a moving average still at its
/// insufficient-history sentinel (0) count as not met.
pub fn evaluate_strategy_with(
    strategy_id: &str,
    side: TradeSide,
    snapshot: &IndicatorSnapshot,
    config: &RuleConfig,
) -> StrategyEvaluation {
    let (resolved_id, rules) = match get_strategy(strategy_id) {
        Some(strategy) => (strategy.id, strategy.rules),
        None => {
            tracing::warn!(
                strategy = strategy_id,
                "Unknown strategy, evaluating general trend rules"
            );
            ("trend_following".to_string(), RuleSet::TrendFollowing)
        }
    };

    let evaluation = match rules {
        RuleSet::MacdRsiComposite => composite(&resolved_id, side, snapshot, config),
        RuleSet::TrendFollowing => trend_following(&resolved_id, side, snapshot, config),
    };

    tracing::debug!(
        strategy = %evaluation.strategy_id,
        side = %side,
        met = evaluation.conditions_met,
        required = evaluation.conditions_required,
        "Evaluated strategy rules"
    );

    evaluation
}

fn composite(
    id: &str,
    side: TradeSide,
    s: &IndicatorSnapshot,
    config: &RuleConfig,
) -> StrategyEvaluation {
    let price = s.current_price;
    let zone = RsiZone::classify(s.rsi, config.rsi_oversold, config.rsi_overbought);
    let macd = format!("line {:.4}, signal {:.4}", s.macd.line, s.macd.signal);

    match side {
        TradeSide::Long => StrategyEvaluation::from_conditions(
            id,
            side,
            vec![
                ConditionCheck::new(
                    format!("MACD crossed above signal ({})", macd),
                    s.macd.cross_status == CrossStatus::Up,
                ),
                ConditionCheck::new(
                    format!("RSI {:.2} below {} (oversold)", s.rsi, config.rsi_oversold),
                    zone == RsiZone::Oversold,
                ),
                ConditionCheck::new(
                    format!("Price {} above EMA200 {} (uptrend)", price, s.ema200),
                    s.ema200 > 0.0 && price > s.ema200,
                ),
            ],
            2,
        ),
        TradeSide::Short => StrategyEvaluation::from_conditions(
            id,
            side,
            vec![
                ConditionCheck::new(
                    format!("MACD crossed below signal ({})", macd),
                    s.macd.cross_status == CrossStatus::Down,
                ),
                ConditionCheck::new(
                    format!("RSI {:.2} above {} (overbought)", s.rsi, config.rsi_overbought),
                    zone == RsiZone::Overbought,
                ),
                ConditionCheck::new(
                    format!("EMA12 {} above price {} (short-term weakness)", s.ema12, price),
                    s.ema12 > 0.0 && s.ema12 > price,
                ),
                ConditionCheck::new(
                    format!("EMA200 {} below price {} (reversal in uptrend)", s.ema200, price),
                    s.ema200 > 0.0 && s.ema200 < price,
                ),
            ],
            2,
        ),
    }
}

fn trend_following(
    id: &str,
    side: TradeSide,
    s: &IndicatorSnapshot,
    config: &RuleConfig,
) -> StrategyEvaluation {
    let price = s.current_price;
    let averages_ready = s.ma50 > 0.0 && s.ma200 > 0.0;

    match side {
        TradeSide::Long => StrategyEvaluation::from_conditions(
            id,
            side,
            vec![
                ConditionCheck::new(
                    format!("Price {} above MA50 {}", price, s.ma50),
                    s.ma50 > 0.0 && price > s.ma50,
                ),
                ConditionCheck::new(
                    format!("MA50 {} above MA200 {}", s.ma50, s.ma200),
                    averages_ready && s.ma50 > s.ma200,
                ),
                ConditionCheck::new(
                    format!("RSI {:.2} not overbought (< {})", s.rsi, config.rsi_overbought),
                    s.rsi < config.rsi_overbought,
                ),
            ],
            2,
        ),
        TradeSide::Short => StrategyEvaluation::from_conditions(
            id,
            side,
            vec![
                ConditionCheck::new(
                    format!("Price {} below MA50 {}", price, s.ma50),
                    s.ma50 > 0.0 && price < s.ma50,
                ),
                ConditionCheck::new(
                    format!("MA50 {} below MA200 {}", s.ma50, s.ma200),
                    averages_ready && s.ma50 < s.ma200,
                ),
                ConditionCheck::new(
                    format!("RSI {:.2} not oversold (> {})", s.rsi, config.rsi_oversold),
                    s.rsi > config.rsi_oversold,
                ),
            ],
            2,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MacdState;

    fn snapshot(
        price: f64,
        rsi: f64,
        ema12: f64,
        ema200: f64,
        cross: CrossStatus,
    ) -> IndicatorSnapshot {
        IndicatorSnapshot {
            symbol: "BTC/USDT".to_string(),
            current_price: price,
            rsi,
            ma50: 0.0,
            ma200: 0.0,
            ema12,
            ema200,
            macd: MacdState {
                line: 1.0,
                signal: 0.5,
                histogram: 0.5,
                cross_status: cross,
            },
            volatility: 1.0,
        }
    }

    #[test]
    fn test_composite_long_two_of_three() {
        let s = snapshot(100.0, 25.0, 101.0, 90.0, CrossStatus::Flat);
        let eval = evaluate_strategy("macd_rsi_composite", TradeSide::Long, &s);

        assert_eq!(eval.conditions.len(), 3);
        assert_eq!(eval.conditions_met, 2);
        assert_eq!(eval.conditions_required, 2);
        assert!(eval.passed);
    }

    #[test]
    fn test_composite_long_one_of_three_fails() {
        let s = snapshot(100.0, 55.0, 101.0, 90.0, CrossStatus::Flat);
        let eval = evaluate_strategy("macd_rsi_composite", TradeSide::Long, &s);

        assert_eq!(eval.conditions_met, 1);
        assert!(!eval.passed);
        assert_eq!(eval.unmet_labels().len(), 2);
    }

    #[test]
    fn test_composite_short_two_of_four() {
        // Bearish cross + EMA12 above price
        let s = snapshot(100.0, 50.0, 102.0, 110.0, CrossStatus::Down);
        let eval = evaluate_strategy("macd_rsi_composite", TradeSide::Short, &s);

        assert_eq!(eval.conditions.len(), 4);
        assert_eq!(eval.conditions_met, 2);
        assert!(eval.passed);
        assert!((eval.score() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_composite_sentinel_ema200_not_met() {
        // EMA200 still at its sentinel: uptrend context is unknown
        let s = snapshot(100.0, 25.0, 101.0, 0.0, CrossStatus::Flat);
        let eval = evaluate_strategy("macd_rsi_composite", TradeSide::Long, &s);

        assert_eq!(eval.conditions_met, 1);
        assert!(!eval.passed);
    }

    #[test]
    fn test_trend_following_long() {
        let mut s = snapshot(120.0, 60.0, 119.0, 100.0, CrossStatus::Flat);
        s.ma50 = 110.0;
        s.ma200 = 100.0;

        let eval = evaluate_strategy("trend_following", TradeSide::Long, &s);
        assert_eq!(eval.conditions_met, 3);
        assert!(eval.passed);

        let short = evaluate_strategy("trend_following", TradeSide::Short, &s);
        assert_eq!(short.conditions_met, 1); // only RSI > 30
        assert!(!short.passed);
    }

    #[test]
    fn test_unknown_strategy_uses_general_rules() {
        let mut s = snapshot(120.0, 60.0, 119.0, 100.0, CrossStatus::Flat);
        s.ma50 = 110.0;
        s.ma200 = 100.0;

        let eval = evaluate_strategy("breakout_v2", TradeSide::Long, &s);
        assert_eq!(eval.strategy_id, "trend_following");
        assert!(eval.passed);
    }

    #[test]
    fn test_custom_thresholds() {
        let s = snapshot(100.0, 35.0, 101.0, 90.0, CrossStatus::Flat);
        let config = RuleConfig {
            rsi_oversold: 40.0,
            ..Default::default()
        };

        let eval = evaluate_strategy_with("macd_rsi_composite", TradeSide::Long, &s, &config);
        assert_eq!(eval.conditions_met, 2);
    }
}
