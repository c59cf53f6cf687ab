//! Built-in strategies a proposal can be validated against.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Strategy used when a proposal does not name one.
pub const DEFAULT_STRATEGY: &str = "macd_rsi_composite";

/// Which rule set a strategy evaluates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RuleSet {
    /// MACD cross, RSI extremes and EMA trend context
    MacdRsiComposite,
    /// Moving-average alignment with an RSI filter
    TrendFollowing,
}

/// Trading strategy definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Strategy {
    /// Strategy identifier
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Description of the entry conditions
    pub description: String,
    /// Rule set evaluated for this strategy
    pub rules: RuleSet,
}

/// Built-in trading strategies.
pub static BUILTIN_STRATEGIES: LazyLock<HashMap<String, Strategy>> = LazyLock::new(|| {
    let mut strategies = HashMap::new();

    strategies.insert(
        "macd_rsi_composite".to_string(),
        Strategy {
            id: "macd_rsi_composite".to_string(),
            name: "MACD-RSI Composite".to_string(),
            description: "LONG needs 2 of 3: MACD bullish cross, RSI < 30, price > EMA200. \
                          SHORT needs 2 of 4: MACD bearish cross, RSI > 70, EMA12 > price, \
                          EMA200 < price."
                .to_string(),
            rules: RuleSet::MacdRsiComposite,
        },
    );

    strategies.insert(
        "trend_following".to_string(),
        Strategy {
            id: "trend_following".to_string(),
            name: "Trend Following".to_string(),
            description: "Trade with the moving averages: price vs MA50, MA50 vs MA200, \
                          and RSI not stretched against the trade. Needs 2 of 3."
                .to_string(),
            rules: RuleSet::TrendFollowing,
        },
    );

    strategies
});

/// List all available strategies, sorted by id.
pub fn list_strategies() -> Vec<Strategy> {
    let mut strategies: Vec<Strategy> = BUILTIN_STRATEGIES.values().cloned().collect();
    strategies.sort_by(|a, b| a.id.cmp(&b.id));
    strategies
}

/// Get a strategy by id or display name, case-insensitively.
pub fn get_strategy(id: &str) -> Option<Strategy> {
    let key = id.trim().to_lowercase();

    BUILTIN_STRATEGIES.get(&key).cloned().or_else(|| {
        BUILTIN_STRATEGIES
            .values()
            .find(|s| s.name.to_lowercase() == key)
            .cloned()
    })
}

/// Validate that a strategy exists.
pub fn is_valid_strategy(id: &str) -> bool {
    get_strategy(id).is_some()
}
