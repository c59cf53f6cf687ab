//! Backend payload shapes and their normalization.
//!
//! The backend mixes camelCase and snake_case and leaves fields out or
//! null. Everything is funneled through the `Raw*` types here so the
//! engine only ever sees canonical [`IndicatorSnapshot`]s and
//! [`Verdict`]s.

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use tradegate_core::{
    AnalysisRecord, AnalysisResult, CrossStatus, IndicatorSnapshot, MacdState, Recommendation,
    TradeProposal, Verdict,
};

/// Backend success code.
pub const CODE_OK: i64 = 200;

/// Response wrapper used by every backend endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Unwrap `data`, failing on a non-200 code. Null data is `None`.
    pub fn into_optional(self) -> Result<Option<T>> {
        if self.code != CODE_OK {
            bail!(
                "API error {}: {}",
                self.code,
                self.message.as_deref().unwrap_or("Unknown API Error")
            );
        }
        Ok(self.data)
    }

    /// Unwrap `data`, failing on a non-200 code or missing payload.
    pub fn into_data(self) -> Result<T> {
        self.into_optional()?
            .ok_or_else(|| anyhow!("API response has no data"))
    }
}

/// Uppercase a symbol and default the quote currency to USDT.
///
/// ```rust
/// use tradegate_client::wire::format_symbol;
///
/// assert_eq!(format_symbol(" btc "), "BTC/USDT");
/// assert_eq!(format_symbol("eth-usd"), "ETH-USD");
/// ```
pub fn format_symbol(symbol: &str) -> String {
    let formatted = symbol.trim().to_uppercase();
    if formatted.contains('/') || formatted.contains('-') {
        formatted
    } else {
        format!("{}/USDT", formatted)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMacd {
    #[serde(default)]
    pub line: Option<f64>,
    #[serde(default)]
    pub signal: Option<f64>,
    #[serde(default)]
    pub histogram: Option<f64>,
    #[serde(default, alias = "cross_status")]
    pub cross_status: Option<String>,
}

/// Market state as the backend sends it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMarketState {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default, alias = "current_price")]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub rsi: Option<f64>,
    #[serde(default, alias = "ma_50")]
    pub ma50: Option<f64>,
    #[serde(default, alias = "ma_200")]
    pub ma200: Option<f64>,
    #[serde(default, alias = "ema_12")]
    pub ema12: Option<f64>,
    #[serde(default, alias = "ema_200")]
    pub ema200: Option<f64>,
    #[serde(default)]
    pub macd: Option<RawMacd>,
    #[serde(default)]
    pub volatility: Option<f64>,
}

impl RawMarketState {
    /// Canonical snapshot; absent numbers become 0 and an absent cross is `NONE`.
    pub fn into_snapshot(self) -> IndicatorSnapshot {
        let macd = self.macd.unwrap_or_default();

        IndicatorSnapshot {
            symbol: self.symbol.unwrap_or_default(),
            current_price: self.current_price.unwrap_or(0.0),
            rsi: self.rsi.unwrap_or(0.0),
            ma50: self.ma50.unwrap_or(0.0),
            ma200: self.ma200.unwrap_or(0.0),
            ema12: self.ema12.unwrap_or(0.0),
            ema200: self.ema200.unwrap_or(0.0),
            macd: MacdState {
                line: macd.line.unwrap_or(0.0),
                signal: macd.signal.unwrap_or(0.0),
                histogram: macd.histogram.unwrap_or(0.0),
                cross_status: parse_cross_status(macd.cross_status.as_deref()),
            },
            volatility: self.volatility.unwrap_or(0.0),
        }
    }
}

/// Normalize a possibly-null market payload.
pub fn normalize_market_state(raw: Option<RawMarketState>) -> Result<IndicatorSnapshot> {
    raw.map(RawMarketState::into_snapshot)
        .ok_or_else(|| anyhow!("Market data is empty"))
}

fn parse_cross_status(value: Option<&str>) -> CrossStatus {
    match value.map(|v| v.trim().to_uppercase()).as_deref() {
        Some("UP") => CrossStatus::Up,
        Some("DOWN") => CrossStatus::Down,
        _ => CrossStatus::Flat,
    }
}

fn parse_recommendation(value: &str) -> Option<Recommendation> {
    match value.trim().to_uppercase().as_str() {
        "EXECUTE" => Some(Recommendation::Execute),
        "WAIT" => Some(Recommendation::Wait),
        "CANCEL" => Some(Recommendation::Cancel),
        _ => None,
    }
}

/// Adjustments arrive either as text or as a field -> advice object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawAdjustments {
    Text(String),
    Fields(serde_json::Map<String, Value>),
}

impl RawAdjustments {
    /// Render as text; objects become `• KEY: value` lines.
    pub fn into_text(self) -> Option<String> {
        match self {
            RawAdjustments::Text(text) if text.trim().is_empty() => None,
            RawAdjustments::Text(text) => Some(text),
            RawAdjustments::Fields(fields) if fields.is_empty() => None,
            RawAdjustments::Fields(fields) => Some(
                fields
                    .into_iter()
                    .map(|(key, value)| {
                        let value = match value {
                            Value::String(s) => s,
                            other => other.to_string(),
                        };
                        format!("• {}: {}", key.to_uppercase(), value)
                    })
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
        }
    }
}

/// Analysis result as the backend sends it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAnalysis {
    #[serde(default)]
    pub recommendation: Option<String>,
    #[serde(default, alias = "confidence_score")]
    pub confidence_score: Option<f64>,
    #[serde(default, alias = "reasoning_text")]
    pub reasoning: Option<String>,
    #[serde(default, alias = "risk_assessment")]
    pub risk_assessment: Option<String>,
    #[serde(default, alias = "suggested_adjustments")]
    pub suggested_adjustments: Option<RawAdjustments>,
}

impl RawAnalysis {
    /// Verdict from an evaluate response. The recommendation must be recognizable.
    pub fn into_verdict(self) -> Result<Verdict> {
        let recommendation = self
            .recommendation
            .as_deref()
            .and_then(parse_recommendation)
            .ok_or_else(|| anyhow!("verdict has no usable recommendation"))?;

        Ok(Verdict {
            recommendation,
            confidence_score: self.confidence_score.unwrap_or(0.0),
            reasoning: self
                .reasoning
                .unwrap_or_else(|| "No reasoning provided.".to_string()),
            risk_assessment: self
                .risk_assessment
                .unwrap_or_else(|| "No risk assessment provided.".to_string()),
            suggested_adjustments: self.suggested_adjustments.and_then(RawAdjustments::into_text),
        })
    }
}

/// Body of `POST /analysis/evaluate`.
#[derive(Debug, Serialize)]
pub struct EvaluateRequest<'a> {
    pub config: &'a TradeProposal,
    pub market_state: &'a IndicatorSnapshot,
}

/// Stored analysis as the backend lists it.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendRecord {
    pub id: Value,
    #[serde(default)]
    pub final_score: Option<f64>,
    #[serde(default)]
    pub recommendation: Option<String>,
    pub trade_config: TradeProposal,
    #[serde(default)]
    pub market_state: Option<RawMarketState>,
    #[serde(default)]
    pub analysis_result: Option<RawAnalysis>,
    pub created_at: String,
}

impl BackendRecord {
    /// Map to an [`AnalysisRecord`].
    ///
    /// Recommendation falls back from the nested result to the record root
    /// and then to `WAIT`; confidence falls back to `final_score`.
    pub fn into_record(self) -> Result<AnalysisRecord> {
        let analysis = self.analysis_result.unwrap_or_default();

        let recommendation = analysis
            .recommendation
            .as_deref()
            .and_then(parse_recommendation)
            .or_else(|| self.recommendation.as_deref().and_then(parse_recommendation))
            .unwrap_or(Recommendation::Wait);

        let id = match self.id {
            Value::String(s) => s,
            other => other.to_string(),
        };

        Ok(AnalysisRecord {
            id,
            timestamp: parse_timestamp(&self.created_at)?,
            config: self.trade_config,
            market: normalize_market_state(self.market_state)?,
            analysis: AnalysisResult {
                recommendation,
                confidence_score: analysis.confidence_score.or(self.final_score).unwrap_or(0.0),
                reasoning: analysis
                    .reasoning
                    .unwrap_or_else(|| "No reasoning provided.".to_string()),
                risk_assessment: analysis
                    .risk_assessment
                    .unwrap_or_else(|| "No risk assessment provided.".to_string()),
                suggested_adjustments: analysis
                    .suggested_adjustments
                    .and_then(RawAdjustments::into_text),
                strategy_score: None,
                rule_passed: None,
            },
        })
    }
}

/// Backend timestamps may omit the offset; those are taken as UTC.
fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .map_err(|e| anyhow!("invalid created_at '{}': {}", value, e))
}

/// Strategy entry from `GET /strategy/list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteStrategy {
    pub id: Value,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub strategy_type: String,
    #[serde(default)]
    pub config: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StrategyList {
    #[serde(default)]
    pub total: Option<usize>,
    #[serde(default)]
    pub strategies: Vec<RemoteStrategy>,
}

/// Tradable pair from `GET /symbol/popular` and `GET /symbol/search`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub id: Value,
    pub symbol: String,
    #[serde(default)]
    pub base_currency: String,
    #[serde(default)]
    pub quote_currency: String,
}
