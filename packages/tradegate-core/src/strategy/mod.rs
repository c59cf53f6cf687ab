//! Strategy registry and rule evaluation.

mod registry;
mod rules;

pub use registry::{
    get_strategy, is_valid_strategy, list_strategies, RuleSet, Strategy, BUILTIN_STRATEGIES,
    DEFAULT_STRATEGY,
};
pub use rules::{evaluate_strategy, evaluate_strategy_with, ConditionCheck, StrategyEvaluation};
