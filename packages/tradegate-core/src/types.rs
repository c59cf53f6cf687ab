//! Core data types for the Tradegate decision engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Error, Result};

/// Chronological price history (oldest first).
///
/// Construction guarantees at least one price and that every price is a
/// positive finite number, so indicator functions never see NaN input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct PriceSeries(Vec<f64>);

impl PriceSeries {
    /// Validate and wrap a price vector.
    pub fn new(prices: Vec<f64>) -> Result<Self> {
        if prices.is_empty() {
            return Err(Error::InvalidSeries("series is empty".to_string()));
        }

        if let Some((idx, price)) = prices
            .iter()
            .enumerate()
            .find(|(_, p)| !p.is_finite() || **p <= 0.0)
        {
            return Err(Error::InvalidSeries(format!(
                "price at index {} is not a positive number: {}",
                idx, price
            )));
        }

        Ok(Self(prices))
    }

    /// Most recent price.
    pub fn latest(&self) -> f64 {
        // Non-empty by construction
        self.0[self.0.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

impl TryFrom<Vec<f64>> for PriceSeries {
    type Error = Error;

    fn try_from(prices: Vec<f64>) -> Result<Self> {
        Self::new(prices)
    }
}

impl From<PriceSeries> for Vec<f64> {
    fn from(series: PriceSeries) -> Self {
        series.0
    }
}

/// Position direction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    Long,
    Short,
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSide::Long => write!(f, "LONG"),
            TradeSide::Short => write!(f, "SHORT"),
        }
    }
}

/// MACD crossover state on the latest bar.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum CrossStatus {
    /// MACD line crossed above the signal line
    #[serde(rename = "UP")]
    Up,
    /// MACD line crossed below the signal line
    #[serde(rename = "DOWN")]
    Down,
    /// No crossover on the latest bar
    #[default]
    #[serde(rename = "NONE")]
    Flat,
}

/// MACD values at the latest point.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MacdState {
    /// Fast EMA minus slow EMA
    pub line: f64,
    /// EMA of the MACD line
    pub signal: f64,
    /// Line minus signal
    pub histogram: f64,
    /// Derived from the histogram sign change between the last two bars
    pub cross_status: CrossStatus,
}

/// Market indicators computed once per analysis request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorSnapshot {
    pub symbol: String,
    pub current_price: f64,
    /// RSI (0-100), 50 when history is too short
    pub rsi: f64,
    pub ma50: f64,
    pub ma200: f64,
    pub ema12: f64,
    pub ema200: f64,
    pub macd: MacdState,
    /// Population standard deviation of recent prices
    pub volatility: f64,
}

/// A user-proposed leveraged trade.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TradeProposal {
    pub symbol: String,
    pub side: TradeSide,
    pub timeframe: String,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub account_balance: f64,
    /// Percentage of the balance at risk, in (0, 100]
    pub risk_percentage: f64,
    /// Leverage multiplier, at least 1
    pub leverage: f64,
    /// Strategy id or display name
    #[serde(rename = "strategy", alias = "strategyId")]
    pub strategy_id: String,
}

impl TradeProposal {
    /// Create a proposal with a 10,000 balance, 1% risk, 1x leverage on the 15m timeframe.
    pub fn new(
        symbol: &str,
        side: TradeSide,
        entry_price: f64,
        stop_loss: f64,
        take_profit: f64,
    ) -> Self {
        Self {
            symbol: symbol.trim().to_uppercase(),
            side,
            timeframe: "15m".to_string(),
            entry_price,
            stop_loss,
            take_profit,
            account_balance: 10_000.0,
            risk_percentage: 1.0,
            leverage: 1.0,
            strategy_id: crate::strategy::DEFAULT_STRATEGY.to_string(),
        }
    }

    /// Set balance, risk percentage and leverage.
    pub fn with_account(
        mut self,
        account_balance: f64,
        risk_percentage: f64,
        leverage: f64,
    ) -> Self {
        self.account_balance = account_balance;
        self.risk_percentage = risk_percentage;
        self.leverage = leverage;
        self
    }

    pub fn with_strategy(mut self, strategy_id: &str) -> Self {
        self.strategy_id = strategy_id.to_string();
        self
    }

    pub fn with_timeframe(mut self, timeframe: &str) -> Self {
        self.timeframe = timeframe.to_string();
        self
    }
}

/// Sizing fields derived from a proposal. Never stored independently.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SizingResult {
    /// Units to open
    pub quantity: f64,
    /// quantity * entry price
    pub notional: f64,
    /// notional / leverage
    pub margin: f64,
    /// balance * risk%
    pub estimated_risk_amount: f64,
    /// Round-trip fee estimate
    pub estimated_fee: f64,
    /// margin / balance * 100
    pub margin_usage_percent: f64,
    /// False when the proposal is degenerate or the margin exceeds the balance
    pub is_safe: bool,
}

impl SizingResult {
    /// All-zero result flagged unsafe.
    pub fn zeroed() -> Self {
        Self::default()
    }
}

/// Final call on a proposal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recommendation {
    Execute,
    Wait,
    Cancel,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recommendation::Execute => write!(f, "EXECUTE"),
            Recommendation::Wait => write!(f, "WAIT"),
            Recommendation::Cancel => write!(f, "CANCEL"),
        }
    }
}

/// Output of one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub recommendation: Recommendation,
    /// 0-100
    pub confidence_score: f64,
    pub reasoning: String,
    pub risk_assessment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_adjustments: Option<String>,
    /// Percentage of the side's strategy conditions that held
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy_score: Option<f64>,
    /// Whether the strategy rule gate passed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_passed: Option<bool>,
}

/// Opinion returned by an external verdict provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub recommendation: Recommendation,
    pub confidence_score: f64,
    pub reasoning: String,
    pub risk_assessment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_adjustments: Option<String>,
}

/// Result of asking a verdict provider.
#[derive(Debug, Clone, PartialEq)]
pub enum VerdictOutcome {
    Available(Verdict),
    Unavailable { reason: String },
}

impl VerdictOutcome {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// The verdict, if one was produced.
    pub fn verdict(&self) -> Option<&Verdict> {
        match self {
            VerdictOutcome::Available(verdict) => Some(verdict),
            VerdictOutcome::Unavailable { .. } => None,
        }
    }
}

/// Persisted unit: proposal, snapshot and result of one run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub config: TradeProposal,
    pub market: IndicatorSnapshot,
    pub analysis: AnalysisResult,
}

impl AnalysisRecord {
    /// Wrap a finished run into a record with a fresh id.
    pub fn new(config: TradeProposal, market: IndicatorSnapshot, analysis: AnalysisResult) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            config,
            market,
            analysis,
        }
    }
}

/// API response wrapper used by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}
