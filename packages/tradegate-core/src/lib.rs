//! Tradegate Core - Trade proposal sizing and decision engine.
//!
//! This crate turns a proposed leveraged trade into a disciplined
//! EXECUTE / WAIT / CANCEL recommendation:
//!
//! - **Indicators**: SMA, EMA, RSI, MACD, volatility over a price series
//! - **Sizing**: Risk-based quantity, notional, margin and margin-usage gating
//! - **Strategy rules**: Side-specific condition counting per strategy
//! - **Decision**: Risk gate, rule gate, optional external verdict
//! - **Pipeline**: Per-run state machine and record persistence
//!
//! # Example
//!
//! ```rust
//! use tradegate_core::{compute_sizing, TradeProposal, TradeSide};
//!
//! let proposal = TradeProposal::new("BTC", TradeSide::Long, 100.0, 99.0, 103.0)
//!     .with_account(1000.0, 1.0, 1.0);
//!
//! let sizing = compute_sizing(&proposal);
//! assert!((sizing.quantity - 10.0).abs() < 1e-9);
//! assert!(sizing.is_safe);
//! ```

pub mod config;
pub mod decision;
pub mod indicators;
pub mod pipeline;
pub mod providers;
pub mod sizing;
pub mod store;
pub mod strategy;
pub mod types;

// Re-export commonly used types
pub use types::{
    AnalysisRecord, AnalysisResult, ApiResponse, CrossStatus, IndicatorSnapshot, MacdState,
    PriceSeries, Recommendation, SizingResult, TradeProposal, TradeSide, Verdict,
    VerdictOutcome,
};

// Re-export main functionality
pub use config::EngineConfig;
pub use decision::{decide, decide_with, AnalysisPhase, AnalysisRun};
pub use indicators::{compute_indicators, ema_value, macd_state, rsi, sma_value, volatility};
pub use pipeline::{AnalysisOutcome, Analyzer};
pub use providers::{AnalysisStore, MarketDataSource, NoVerdict, StaticSeries, VerdictProvider};
pub use sizing::{
    compute_sizing, compute_sizing_with, risk_reward_ratio, MarginBand, ProposalDefect,
};
pub use store::JsonFileStore;
pub use strategy::{
    evaluate_strategy, evaluate_strategy_with, get_strategy, list_strategies, StrategyEvaluation,
};

/// Error types for tradegate-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid price series: {0}")]
    InvalidSeries(String),

    #[error("Invalid analysis transition: {from} -> {to}")]
    InvalidTransition {
        from: AnalysisPhase,
        to: AnalysisPhase,
    },

    #[error("External collaborator unavailable: {0}")]
    ExternalUnavailable(String),

    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),
}

/// Result type for tradegate-core operations.
pub type Result<T> = std::result::Result<T, Error>;
