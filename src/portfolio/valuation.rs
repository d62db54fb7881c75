//! Trade schedules and portfolio valuation.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::data::{DateRange, PriceSource};
use crate::error::Result;

/// Signed share quantities per trading day for one symbol.
///
/// Legal magnitudes are 0, +/-1000 (establish or flatten a position) and
/// +/-2000 (flip sides); the implied running holding stays in
/// {-1000, 0, +1000}.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeSchedule {
    symbol: String,
    dates: Vec<NaiveDate>,
    shares: Vec<f64>,
}

impl TradeSchedule {
    /// All-zero schedule over the given trading days.
    pub fn zeros(symbol: impl Into<String>, dates: Vec<NaiveDate>) -> Self {
        let shares = vec![0.0; dates.len()];
        Self {
            symbol: symbol.into(),
            dates,
            shares,
        }
    }

    /// Buy-and-hold benchmark: 1000 shares on the first day, nothing
    /// after.
    pub fn benchmark(symbol: impl Into<String>, dates: Vec<NaiveDate>) -> Self {
        let mut schedule = Self::zeros(symbol, dates);
        if !schedule.is_empty() {
            schedule.shares[0] = 1000.0;
        }
        schedule
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn shares(&self) -> &[f64] {
        &self.shares
    }

    pub fn date(&self, i: usize) -> NaiveDate {
        self.dates[i]
    }

    pub fn quantity(&self, i: usize) -> f64 {
        self.shares[i]
    }

    pub fn set(&mut self, i: usize, quantity: f64) {
        self.shares[i] = quantity;
    }

    /// Running share position implied by the schedule.
    pub fn holdings(&self) -> Vec<f64> {
        self.shares
            .iter()
            .scan(0.0, |acc, &q| {
                *acc += q;
                Some(*acc)
            })
            .collect()
    }

    /// Date span covered by the schedule.
    pub fn span(&self) -> Option<DateRange> {
        match (self.dates.first(), self.dates.last()) {
            (Some(&start), Some(&end)) => Some(DateRange::new(start, end)),
            _ => None,
        }
    }
}

/// Daily portfolio value series produced by [`compute_portvals`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioValues {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl PortfolioValues {
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> Self {
        assert_eq!(dates.len(), values.len());
        Self { dates, values }
    }

    pub fn empty() -> Self {
        Self {
            dates: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Final value over first value, minus one. Zero for a series with
    /// fewer than two points.
    pub fn cumulative_return(&self) -> f64 {
        match (self.values.first(), self.values.last()) {
            (Some(&first), Some(&last)) if self.len() > 1 && first != 0.0 => last / first - 1.0,
            _ => 0.0,
        }
    }
}

/// Convert a trade schedule into daily portfolio values.
///
/// Prices for the schedule's span are fetched from `source` (filled, on
/// the trading calendar) and a constant-1.0 cash asset is added. A day
/// with a nonzero trade debits cash by `price*qty + commission +
/// price*impact*|qty|`; commission and impact are a cost regardless of
/// trade direction. Holdings are the expanding sum of quantities seeded
/// with `start_val` cash on day 0; daily value is holdings times prices
/// summed across both assets.
///
/// Deterministic and side-effect-free: called per episode inside RL
/// training and once for final reporting.
pub fn compute_portvals(
    source: &dyn PriceSource,
    trades: &TradeSchedule,
    start_val: f64,
    commission: f64,
    impact: f64,
) -> Result<PortfolioValues> {
    let Some(span) = trades.span() else {
        return Ok(PortfolioValues::empty());
    };

    let prices = source.get_prices(trades.symbol(), span)?;
    let quantities: HashMap<NaiveDate, f64> = trades
        .dates()
        .iter()
        .copied()
        .zip(trades.shares().iter().copied())
        .collect();

    let mut share_holding = 0.0;
    let mut cash_holding = start_val;
    let mut values = Vec::with_capacity(prices.len());

    for i in 0..prices.len() {
        let price = prices.value(i);
        let qty = quantities.get(&prices.date(i)).copied().unwrap_or(0.0);

        if qty != 0.0 {
            share_holding += qty;
            cash_holding -= price * qty + commission + price * impact * qty.abs();
        }

        values.push(share_holding * price + cash_holding);
    }

    Ok(PortfolioValues::new(prices.dates().to_vec(), values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MemoryPriceSource;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn source_with(prices: &[f64]) -> (MemoryPriceSource, Vec<NaiveDate>) {
        let mut source = MemoryPriceSource::new();
        source.insert_daily("JPM", d("2008-01-01"), prices);
        let dates = (0..prices.len())
            .map(|i| d("2008-01-01") + chrono::Duration::days(i as i64))
            .collect();
        (source, dates)
    }

    #[test]
    fn test_zero_trades_hold_start_val() {
        let (source, dates) = source_with(&[100.0, 101.0, 99.0, 105.0]);
        let trades = TradeSchedule::zeros("JPM", dates);

        let portvals = compute_portvals(&source, &trades, 100_000.0, 0.0, 0.0).unwrap();
        assert!(portvals.values().iter().all(|&v| v == 100_000.0));
        assert_eq!(portvals.cumulative_return(), 0.0);
    }

    #[test]
    fn test_buy_then_sell_scenario() {
        let (source, dates) = source_with(&[100.0, 101.0, 99.0, 105.0]);
        let mut trades = TradeSchedule::zeros("JPM", dates);
        trades.set(0, 1000.0);
        trades.set(3, -1000.0);

        let portvals = compute_portvals(&source, &trades, 100_000.0, 0.0, 0.0).unwrap();
        // buying at zero cost leaves day 0 value at start_val
        assert_eq!(portvals.values()[0], 100_000.0);
        // mark-to-market while holding
        assert_eq!(portvals.values()[1], 101_000.0);
        // realized 1000 * (105 - 100)
        assert_eq!(portvals.values()[3], 105_000.0);
    }

    #[test]
    fn test_commission_and_impact_always_cost() {
        let (source, dates) = source_with(&[100.0, 100.0]);
        let mut trades = TradeSchedule::zeros("JPM", dates.clone());
        trades.set(0, -1000.0); // short sale still pays both costs

        let portvals = compute_portvals(&source, &trades, 100_000.0, 9.95, 0.005).unwrap();
        let expected = 100_000.0 - 9.95 - 100.0 * 0.005 * 1000.0;
        assert!((portvals.values()[0] - expected).abs() < 1e-9);
    }

    #[test]
    fn test_single_row_schedule() {
        let (source, dates) = source_with(&[100.0]);
        let mut trades = TradeSchedule::zeros("JPM", dates);
        trades.set(0, 1000.0);

        let portvals = compute_portvals(&source, &trades, 100_000.0, 0.0, 0.0).unwrap();
        assert_eq!(portvals.len(), 1);
        assert_eq!(portvals.values()[0], 100_000.0);
    }

    #[test]
    fn test_empty_schedule() {
        let (source, _) = source_with(&[100.0]);
        let trades = TradeSchedule::zeros("JPM", Vec::new());

        let portvals = compute_portvals(&source, &trades, 100_000.0, 0.0, 0.0).unwrap();
        assert!(portvals.is_empty());
    }

    #[test]
    fn test_holdings_running_sum() {
        let (_, dates) = source_with(&[1.0, 1.0, 1.0, 1.0]);
        let mut trades = TradeSchedule::zeros("JPM", dates);
        trades.set(0, 1000.0);
        trades.set(1, -2000.0);
        trades.set(3, 1000.0);

        assert_eq!(trades.holdings(), vec![1000.0, -1000.0, -1000.0, 0.0]);
    }
}
