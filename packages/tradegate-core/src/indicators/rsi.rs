//! Relative Strength Index (RSI) indicator.

use serde::{Deserialize, Serialize};

use super::round_to;

/// Calculate RSI value from average gain and average loss.
/// No losses saturates at 100, even when there were no gains either.
#[inline]
fn calculate_rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss <= 0.0 {
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

/// Calculate Relative Strength Index over the trailing `period` price changes.
///
/// Formula:
/// 1. Take the last `period` price changes
/// 2. Sum gains and absolute losses separately
/// 3. Average both over `period`
/// 4. RS = average_gain / average_loss
/// 5. RSI = 100 - (100 / (1 + RS))
///
/// # Arguments
///
/// * `prices` - Price series (typically closing prices)
/// * `period` - Lookback period (typically 14)
///
/// # Returns
///
/// RSI rounded to 2 decimals (0-100). Returns the neutral 50 when the
/// series has fewer than `period + 1` prices.
///
/// # Example
///
/// ```rust
/// use tradegate_core::indicators::rsi;
///
/// let prices = vec![44.0, 44.25, 44.5, 43.75, 44.5, 44.25, 44.5, 44.0, 43.5, 44.0,
///                   44.25, 44.0, 43.5, 44.0, 44.5, 44.25, 44.0];
/// let value = rsi(&prices, 14);
///
/// assert!(value >= 0.0 && value <= 100.0);
/// assert_eq!(rsi(&prices[..5], 14), 50.0);
/// ```
pub fn rsi(prices: &[f64], period: usize) -> f64 {
    let n = prices.len();

    if period == 0 || n < period + 1 {
        return 50.0;
    }

    let mut gains = 0.0;
    let mut losses = 0.0;

    for i in (n - period)..n {
        let change = prices[i] - prices[i - 1];
        if change > 0.0 {
            gains += change;
        } else {
            losses += -change;
        }
    }

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;

    round_to(calculate_rsi_value(avg_gain, avg_loss), 2)
}

/// Momentum zone of an RSI reading.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RsiZone {
    Oversold,
    Neutral,
    Overbought,
}

impl RsiZone {
    /// Classify an RSI value. Thresholds themselves are neutral.
    pub fn classify(rsi: f64, oversold: f64, overbought: f64) -> Self {
        if rsi < oversold {
            RsiZone::Oversold
        } else if rsi > overbought {
            RsiZone::Overbought
        } else {
            RsiZone::Neutral
        }
    }
}
