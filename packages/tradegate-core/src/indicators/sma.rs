//! Simple Moving Average (SMA) and Exponential Moving Average (EMA) indicators.

use super::round_to;

/// Calculate the Simple Moving Average of the last `period` prices.
///
/// Returns 0.0 when the series is shorter than `period`. The result is
/// rounded to 2 decimals; the sum itself is kept at full precision.
///
/// # Example
///
/// ```rust
/// use tradegate_core::indicators::sma_value;
///
/// let prices = vec![10.0, 11.0, 12.0, 11.0, 10.0];
///
/// // (12 + 11 + 10) / 3 = 11.0
/// assert_eq!(sma_value(&prices, 3), 11.0);
/// assert_eq!(sma_value(&prices, 10), 0.0);
/// ```
pub fn sma_value(data: &[f64], period: usize) -> f64 {
    let n = data.len();
    if period == 0 || n < period {
        return 0.0;
    }

    let sum: f64 = data[n - period..].iter().sum();
    round_to(sum / period as f64, 2)
}

/// Calculate Exponential Moving Average.
///
/// Uses the formula: EMA[i] = alpha * price[i] + (1 - alpha) * EMA[i-1]
/// where alpha = 2 / (period + 1), seeded with the first price.
///
/// The whole history feeds every value, so two series that differ only in
/// an older prefix produce different EMAs. Always recompute over the full
/// series rather than updating a stored value.
///
/// # Arguments
///
/// * `data` - Price series
/// * `period` - Lookback period (used to calculate smoothing factor)
///
/// # Returns
///
/// Vector of EMA values, one per input point.
pub fn ema(data: &[f64], period: usize) -> Vec<f64> {
    let n = data.len();
    let mut result = vec![0.0; n];

    if period == 0 || n == 0 {
        return result;
    }

    let alpha = 2.0 / (period as f64 + 1.0);

    // Initialize with first value
    result[0] = data[0];

    for i in 1..n {
        result[i] = alpha * data[i] + (1.0 - alpha) * result[i - 1];
    }

    result
}

/// EMA at the latest point, rounded to 2 decimals.
///
/// Returns 0.0 when the series is shorter than `period`.
///
/// # Example
///
/// ```rust
/// use tradegate_core::indicators::ema_value;
///
/// let flat = vec![50.0; 20];
/// assert_eq!(ema_value(&flat, 12), 50.0);
/// assert_eq!(ema_value(&flat, 200), 0.0);
/// ```
pub fn ema_value(data: &[f64], period: usize) -> f64 {
    if period == 0 || data.len() < period {
        return 0.0;
    }

    ema(data, period)
        .last()
        .map(|&value| round_to(value, 2))
        .unwrap_or(0.0)
}
