//! Technical indicators for trade analysis.
//!
//! Pure functions over a chronological price slice:
//!
//! - **SMA / EMA**: Simple and exponential moving averages
//! - **RSI**: Relative Strength Index
//! - **MACD**: Moving Average Convergence Divergence with crossover state
//! - **Volatility**: Population standard deviation of recent prices
//!
//! Short histories never fail. Each function returns a documented sentinel
//! instead (0 for averages, MACD and volatility, 50 for RSI).

mod rsi;
mod sma;

pub use rsi::{rsi, RsiZone};
pub use sma::{ema, ema_value, sma_value};

use crate::config::IndicatorConfig;
use crate::types::{CrossStatus, IndicatorSnapshot, MacdState, PriceSeries};

/// Round to a fixed number of decimals for display.
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Calculate population standard deviation of the last `period` prices.
///
/// Returns 0.0 when the series is shorter than `period`.
pub fn volatility(data: &[f64], period: usize) -> f64 {
    let n = data.len();
    if period == 0 || n < period {
        return 0.0;
    }

    let window = &data[n - period..];
    let mean: f64 = window.iter().sum::<f64>() / period as f64;
    let variance: f64 = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / period as f64;

    round_to(variance.sqrt(), 2)
}

/// Trailing MACD window.
#[derive(Debug, Clone, Default)]
pub struct Macd {
    /// MACD line (fast EMA - slow EMA) over the lookback window
    pub macd_line: Vec<f64>,
    /// Signal line (EMA of the windowed MACD line)
    pub signal_line: Vec<f64>,
    /// Histogram (MACD - Signal), rounded to 4 decimals
    pub histogram: Vec<f64>,
}

/// Calculate the MACD window.
///
/// Each of the last `lookback` points is the difference of the displayed
/// (2 decimal) fast and slow EMAs at that point. A point earlier than an
/// EMA's period uses the raw price in place of that EMA. The signal line is
/// a 2 decimal EMA seeded at the start of the window, and the histogram is
/// kept at 4 decimals so crossovers read off the same values that are
/// reported. Returns an empty window when the series is shorter than
/// `slow_period`.
///
/// # Arguments
///
/// * `data` - Price series
/// * `fast_period` - Fast EMA period (typically 12)
/// * `slow_period` - Slow EMA period (typically 26)
/// * `signal_period` - Signal line EMA period (typically 9)
/// * `lookback` - Trailing MACD points kept for the signal (typically 50)
pub fn macd(
    data: &[f64],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
    lookback: usize,
) -> Macd {
    let n = data.len();
    if slow_period == 0 || n < slow_period {
        return Macd::default();
    }

    let fast_ema = ema(data, fast_period);
    let slow_ema = ema(data, slow_period);
    let display_or_price = |emas: &Vec<f64>, i: usize, period: usize| {
        if i < period {
            data[i]
        } else {
            round_to(emas[i], 2)
        }
    };

    let start = n.saturating_sub(lookback.max(1));
    let macd_line: Vec<f64> = (start..n)
        .map(|i| {
            display_or_price(&fast_ema, i, fast_period)
                - display_or_price(&slow_ema, i, slow_period)
        })
        .collect();

    let signal_line: Vec<f64> = if macd_line.len() < signal_period {
        vec![0.0; macd_line.len()]
    } else {
        ema(&macd_line, signal_period)
            .into_iter()
            .map(|value| round_to(value, 2))
            .collect()
    };

    let histogram = macd_line
        .iter()
        .zip(&signal_line)
        .map(|(line, signal)| round_to(line - signal, 4))
        .collect();

    Macd {
        macd_line,
        signal_line,
        histogram,
    }
}

/// Latest MACD values with crossover state.
///
/// The crossover compares the previous bar's histogram with the current
/// one, so `Up`/`Down` mean the cross happened on the last bar and the
/// reported histogram always carries the matching sign.
pub fn macd_state(data: &[f64], config: &IndicatorConfig) -> MacdState {
    let window = macd(
        data,
        config.macd_fast,
        config.macd_slow,
        config.macd_signal,
        config.macd_lookback,
    );

    let (Some(&line), Some(&signal), Some(&histogram)) = (
        window.macd_line.last(),
        window.signal_line.last(),
        window.histogram.last(),
    ) else {
        return MacdState::default();
    };

    let zero = vec![0.0; window.histogram.len()];
    let cross_status = match crossover_signals(&window.histogram, &zero).last() {
        Some(s) if *s > 0.0 => CrossStatus::Up,
        Some(s) if *s < 0.0 => CrossStatus::Down,
        _ => CrossStatus::Flat,
    };

    MacdState {
        line: round_to(line, 4),
        signal: round_to(signal, 4),
        histogram,
        cross_status,
    }
}

/// Generate trading signals based on indicator crossovers.
///
/// Returns 1.0 for a bullish cross, -1.0 for a bearish cross, 0.0 otherwise.
pub fn crossover_signals(fast: &[f64], slow: &[f64]) -> Vec<f64> {
    let n = fast.len().min(slow.len());
    let mut signals = vec![0.0; n];

    for i in 1..n {
        let prev_diff = fast[i - 1] - slow[i - 1];
        let curr_diff = fast[i] - slow[i];

        if prev_diff <= 0.0 && curr_diff > 0.0 {
            signals[i] = 1.0;
        } else if prev_diff >= 0.0 && curr_diff < 0.0 {
            signals[i] = -1.0;
        }
    }

    signals
}

/// Compute the full indicator snapshot for one analysis request.
///
/// # Example
///
/// ```rust
/// use tradegate_core::config::IndicatorConfig;
/// use tradegate_core::indicators::compute_indicators;
/// use tradegate_core::PriceSeries;
///
/// let series = PriceSeries::new((0..60).map(|i| 100.0 + i as f64).collect()).unwrap();
/// let snapshot = compute_indicators("BTC/USDT", &series, &IndicatorConfig::default());
///
/// assert_eq!(snapshot.current_price, 159.0);
/// assert!(snapshot.macd.line > 0.0);
/// assert_eq!(snapshot.ma200, 0.0); // not enough history
/// ```
pub fn compute_indicators(
    symbol: &str,
    series: &PriceSeries,
    config: &IndicatorConfig,
) -> IndicatorSnapshot {
    let data = series.as_slice();

    let snapshot = IndicatorSnapshot {
        symbol: symbol.to_string(),
        current_price: series.latest(),
        rsi: rsi(data, config.rsi_period),
        ma50: sma_value(data, config.ma_short),
        ma200: sma_value(data, config.ma_long),
        ema12: ema_value(data, config.ema_fast),
        ema200: ema_value(data, config.ema_trend),
        macd: macd_state(data, config),
        volatility: volatility(data, config.volatility_period),
    };

    tracing::debug!(
        symbol = %snapshot.symbol,
        points = data.len(),
        rsi = snapshot.rsi,
        macd_line = snapshot.macd.line,
        "Computed indicator snapshot"
    );

    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uptrend(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64 * 0.5).collect()
    }

    #[test]
    fn test_volatility() {
        // Window [2, 4, 4, 4, 5, 5, 7, 9]: mean 5, population std 2
        let data = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(volatility(&data, 8), 2.0);
    }

    #[test]
    fn test_volatility_insufficient_data() {
        assert_eq!(volatility(&[1.0, 2.0], 14), 0.0);
        assert_eq!(volatility(&[1.0, 2.0], 0), 0.0);
    }

    #[test]
    fn test_volatility_flat() {
        assert_eq!(volatility(&[100.0; 20], 14), 0.0);
    }

    #[test]
    fn test_macd_short_series_is_empty() {
        let data = uptrend(25);
        let window = macd(&data, 12, 26, 9, 50);
        assert!(window.macd_line.is_empty());

        let state = macd_state(&data, &IndicatorConfig::default());
        assert_eq!(state, MacdState::default());
        assert_eq!(state.cross_status, CrossStatus::Flat);
    }

    #[test]
    fn test_macd_window_is_bounded() {
        let data = uptrend(120);
        let window = macd(&data, 12, 26, 9, 50);

        assert_eq!(window.macd_line.len(), 50);
        assert_eq!(window.signal_line.len(), 50);
        assert_eq!(window.histogram.len(), 50);
    }

    #[test]
    fn test_macd_line_matches_ema_difference() {
        let data = uptrend(40);
        let window = macd(&data, 12, 26, 9, 50);
        let fast = ema(&data, 12);
        let slow = ema(&data, 26);

        let last = window.macd_line[window.macd_line.len() - 1];
        let expected = round_to(fast[39], 2) - round_to(slow[39], 2);
        assert!((last - expected).abs() < 1e-12);
    }

    #[test]
    fn test_macd_early_points_use_raw_price() {
        let data = uptrend(40);
        let window = macd(&data, 12, 26, 9, 50);
        let fast = ema(&data, 12);

        // Both EMAs fall back to the price before their period
        assert_eq!(window.macd_line[0], 0.0);
        // Only the slow EMA falls back
        let expected = round_to(fast[20], 2) - data[20];
        assert!((window.macd_line[20] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_macd_histogram_matches_reported_values() {
        let data = uptrend(60);
        let window = macd(&data, 12, 26, 9, 50);

        for ((line, signal), hist) in window
            .macd_line
            .iter()
            .zip(&window.signal_line)
            .zip(&window.histogram)
        {
            assert_eq!(*hist, round_to(line - signal, 4));
        }
    }

    #[test]
    fn test_macd_cross_agrees_with_histogram_sign_on_small_prices() {
        // Sub-unit oscillation where line and signal sit within a cent
        let data: Vec<f64> = (0..120)
            .map(|i| 0.8 + 0.03 * (i as f64 / 4.0).sin())
            .collect();
        let config = IndicatorConfig::default();

        let mut crosses = 0;
        for end in 26..=data.len() {
            let state = macd_state(&data[..end], &config);
            match state.cross_status {
                CrossStatus::Up => assert!(state.histogram > 0.0, "{:?}", state),
                CrossStatus::Down => assert!(state.histogram < 0.0, "{:?}", state),
                CrossStatus::Flat => continue,
            }
            crosses += 1;
        }
        assert!(crosses > 0);
    }

    #[test]
    fn test_macd_uptrend_positive() {
        let state = macd_state(&uptrend(60), &IndicatorConfig::default());
        assert!(state.line > 0.0);
        assert!((state.histogram - (state.line - state.signal)).abs() < 1e-3);
    }

    #[test]
    fn test_macd_bullish_cross_on_last_bar() {
        // Long decline, then a sharp jump on the final bar
        let mut data: Vec<f64> = (0..40).map(|i| 200.0 - i as f64).collect();
        data.push(260.0);

        let state = macd_state(&data, &IndicatorConfig::default());
        assert_eq!(state.cross_status, CrossStatus::Up);
        assert!(state.histogram > 0.0);
    }

    #[test]
    fn test_macd_bearish_cross_on_last_bar() {
        let mut data: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        data.push(40.0);

        let state = macd_state(&data, &IndicatorConfig::default());
        assert_eq!(state.cross_status, CrossStatus::Down);
        assert!(state.histogram < 0.0);
    }

    #[test]
    fn test_macd_no_cross_in_steady_trend() {
        let data: Vec<f64> = (0..80).map(|i| 100.0 + i as f64).collect();
        let state = macd_state(&data, &IndicatorConfig::default());
        assert_eq!(state.cross_status, CrossStatus::Flat);
    }

    #[test]
    fn test_crossover_signals() {
        let fast = vec![10.0, 11.0, 12.0, 11.0, 10.0];
        let slow = vec![11.0, 11.0, 11.0, 11.0, 11.0];

        let signals = crossover_signals(&fast, &slow);

        // fast[1]=11 == slow[1]=11, fast[2]=12 > slow[2]=11
        assert_eq!(signals[2], 1.0);

        // fast[3]=11 == slow[3]=11, fast[4]=10 < slow[4]=11
        assert_eq!(signals[4], -1.0);
    }

    #[test]
    fn test_compute_indicators_short_series() {
        let series = PriceSeries::new(vec![100.0, 101.0, 102.0]).unwrap();
        let snapshot = compute_indicators("ETH/USDT", &series, &IndicatorConfig::default());

        assert_eq!(snapshot.current_price, 102.0);
        assert_eq!(snapshot.rsi, 50.0);
        assert_eq!(snapshot.ma50, 0.0);
        assert_eq!(snapshot.ema12, 0.0);
        assert_eq!(snapshot.macd, MacdState::default());
        assert_eq!(snapshot.volatility, 0.0);
    }

    #[test]
    fn test_compute_indicators_is_deterministic() {
        let series = PriceSeries::new(uptrend(250)).unwrap();
        let config = IndicatorConfig::default();

        let first = compute_indicators("BTC/USDT", &series, &config);
        let second = compute_indicators("BTC/USDT", &series, &config);
        assert_eq!(first, second);
        assert!(first.ma200 > 0.0);
        assert!(first.ema200 > 0.0);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(1.23456, 4), 1.2346);
    }
}
