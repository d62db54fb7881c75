//! Technical indicators.
//!
//! Pure functions over a price series, each returning one
//! [`IndicatorFrame`]. Rolling statistics gate on a full window (leading
//! rows are NaN); exponential averages weight partial windows from row 0.

use std::collections::HashMap;

use super::frame::IndicatorFrame;
use crate::data::PriceSeries;
use crate::error::{Result, StrategyError};

/// Golden/Death Cross: two simple moving averages whose crossing encodes
/// the signal. Both SMA columns are returned.
pub fn golden_death_cross(
    prices: &PriceSeries,
    lookback_1: usize,
    lookback_2: usize,
) -> IndicatorFrame {
    let sma_1 = rolling_mean(prices.values(), lookback_1, lookback_1);
    let sma_2 = rolling_mean(prices.values(), lookback_2, lookback_2);
    IndicatorFrame::new(
        prices.dates().to_vec(),
        vec![
            format!("{lookback_1}-day SMA"),
            format!("{lookback_2}-day SMA"),
        ],
        vec![sma_1, sma_2],
    )
}

/// Bollinger %B: price position between bands at mean +/- 2 sample
/// standard deviations. Unbounded outside [0,1] when price pierces a
/// band; NaN where the band width is zero.
pub fn bollinger_band_pct(prices: &PriceSeries, lookback: usize) -> IndicatorFrame {
    let sma = rolling_mean(prices.values(), lookback, lookback);
    let std = rolling_std(prices.values(), lookback, lookback);

    let bbp: Vec<f64> = prices
        .values()
        .iter()
        .zip(sma.iter().zip(std.iter()))
        .map(|(&p, (&m, &s))| {
            let upper = m + 2.0 * s;
            let lower = m - 2.0 * s;
            (p - lower) / (upper - lower)
        })
        .collect();

    IndicatorFrame::from_column(prices.dates().to_vec(), "%B", bbp)
}

/// Rate of Change over `lookback` rows, in percent. Leading rows with
/// insufficient history are dropped from the frame, not filled.
pub fn rate_of_change(prices: &PriceSeries, lookback: usize) -> IndicatorFrame {
    let shift = lookback.saturating_sub(1);
    let values = prices.values();

    let mut dates = Vec::new();
    let mut roc = Vec::new();
    for i in shift..values.len() {
        dates.push(prices.date(i));
        roc.push((values[i] / values[i - shift] - 1.0) * 100.0);
    }

    IndicatorFrame::from_column(dates, "ROC", roc)
}

/// MACD line: EMA(short) - EMA(long), exponentially weighted with no
/// minimum-period gating. The signal line is not part of the output.
pub fn macd(prices: &PriceSeries, short_period: usize, long_period: usize) -> IndicatorFrame {
    let ema_short = ewm_mean(prices.values(), short_period);
    let ema_long = ewm_mean(prices.values(), long_period);

    let line: Vec<f64> = ema_short
        .iter()
        .zip(ema_long.iter())
        .map(|(s, l)| s - l)
        .collect();

    IndicatorFrame::from_column(prices.dates().to_vec(), "MACD", line)
}

/// Wilder-style RSI over rolling mean gains/losses. Clamped to 100 when
/// the rolling loss average is zero.
pub fn rsi(prices: &PriceSeries, lookback: usize) -> IndicatorFrame {
    let values = prices.values();
    let n = values.len();

    let mut gains = vec![f64::NAN; n];
    let mut losses = vec![f64::NAN; n];
    for i in 1..n {
        let diff = values[i] - values[i - 1];
        gains[i] = diff.max(0.0);
        losses[i] = (-diff).max(0.0);
    }

    let gain_avg = rolling_mean(&gains, lookback, lookback);
    let loss_avg = rolling_mean(&losses, lookback, lookback);

    let rsi: Vec<f64> = gain_avg
        .iter()
        .zip(loss_avg.iter())
        .map(|(&g, &l)| {
            let rs = g / l;
            if rs.is_infinite() {
                100.0
            } else {
                100.0 - 100.0 / (1.0 + rs)
            }
        })
        .collect();

    IndicatorFrame::from_column(prices.dates().to_vec(), "RSI", rsi)
}

/// Compute a named indicator with its parameter map. Unknown names are a
/// configuration error; parameters are truncated to whole periods.
pub fn compute(
    name: &str,
    params: &HashMap<String, f64>,
    prices: &PriceSeries,
) -> Result<IndicatorFrame> {
    let period = |key: &str, default: usize| -> usize {
        params.get(key).map(|&v| v as usize).unwrap_or(default)
    };

    match name {
        "gold cross" => Ok(golden_death_cross(
            prices,
            period("lookback_1", 20),
            period("lookback_2", 50),
        )),
        "bbp" => Ok(bollinger_band_pct(prices, period("lookback", 20))),
        "roc" => Ok(rate_of_change(prices, period("lookback", 10))),
        "macd" => Ok(macd(
            prices,
            period("short_period", 12),
            period("long_period", 26),
        )),
        "rsi" => Ok(rsi(prices, period("lookback", 14))),
        _ => Err(StrategyError::UnknownIndicator(name.to_string())),
    }
}

/// Whether `name` is a known indicator.
pub fn is_supported(name: &str) -> bool {
    matches!(name, "gold cross" | "bbp" | "roc" | "macd" | "rsi")
}

/// Rolling mean over the trailing `window` rows, NaN until `min_periods`
/// non-NaN observations are present in the window.
fn rolling_mean(values: &[f64], window: usize, min_periods: usize) -> Vec<f64> {
    rolling(values, window, min_periods, |obs| {
        obs.iter().sum::<f64>() / obs.len() as f64
    })
}

/// Rolling sample standard deviation (ddof = 1).
fn rolling_std(values: &[f64], window: usize, min_periods: usize) -> Vec<f64> {
    rolling(values, window, min_periods, |obs| {
        if obs.len() < 2 {
            return f64::NAN;
        }
        let mean = obs.iter().sum::<f64>() / obs.len() as f64;
        let ss: f64 = obs.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (obs.len() - 1) as f64).sqrt()
    })
}

fn rolling(
    values: &[f64],
    window: usize,
    min_periods: usize,
    stat: impl Fn(&[f64]) -> f64,
) -> Vec<f64> {
    let window = window.max(1);
    let min_periods = min_periods.max(1);
    let mut out = vec![f64::NAN; values.len()];
    let mut obs = Vec::with_capacity(window);

    for i in 0..values.len() {
        let lo = (i + 1).saturating_sub(window);
        obs.clear();
        obs.extend(values[lo..=i].iter().copied().filter(|v| !v.is_nan()));
        if obs.len() >= min_periods {
            out[i] = stat(&obs);
        }
    }
    out
}

/// Exponentially weighted mean with `span` semantics and adjusted
/// weights: every row is a weighted average of all history so far, so
/// the head of the series uses partial windows instead of NaN.
fn ewm_mean(values: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let decay = 1.0 - alpha;

    let mut out = Vec::with_capacity(values.len());
    let mut num = 0.0;
    let mut den = 0.0;
    for &v in values {
        num = v + decay * num;
        den = 1.0 + decay * den;
        out.push(num / den);
    }
    out
}
