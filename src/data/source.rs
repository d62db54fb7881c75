//! Price sources.
//!
//! The core treats price retrieval as an opaque synchronous dependency:
//! given a symbol and a date range, a source returns a gap-filled series
//! on that symbol's trading calendar. The calendar itself is established
//! by a reference index symbol (days on which the index traded).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use super::prices::{fill_forward_backward, DateRange, PriceSeries};
use crate::error::{Result, StrategyError};

/// Default reference index used to define valid trading days.
pub const REFERENCE_SYMBOL: &str = "SPY";

/// Synchronous price retrieval contract.
pub trait PriceSource {
    /// Return the filled price series for `symbol` over `range`,
    /// restricted to the reference calendar's trading days.
    fn get_prices(&self, symbol: &str, range: DateRange) -> Result<PriceSeries>;
}

/// CSV-backed source reading `<dir>/<SYMBOL>.csv` files with `Date` and
/// `Adj Close` columns.
pub struct CsvPriceSource {
    data_dir: PathBuf,
    reference: String,
}

impl CsvPriceSource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            reference: REFERENCE_SYMBOL.to_string(),
        }
    }

    /// Use a different reference index symbol for the trading calendar.
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = reference.into();
        self
    }

    fn symbol_path(&self, symbol: &str) -> PathBuf {
        self.data_dir.join(format!("{symbol}.csv"))
    }

    fn load_symbol(&self, symbol: &str) -> Result<HashMap<NaiveDate, f64>> {
        let path = self.symbol_path(symbol);
        if !path.exists() {
            return Err(StrategyError::NoPriceData {
                symbol: symbol.to_string(),
                reason: format!("missing file {}", path.display()),
            });
        }
        read_price_csv(&path)
    }
}

impl PriceSource for CsvPriceSource {
    fn get_prices(&self, symbol: &str, range: DateRange) -> Result<PriceSeries> {
        let reference = self.load_symbol(&self.reference)?;
        let mut calendar: Vec<NaiveDate> = reference
            .keys()
            .copied()
            .filter(|d| range.contains(*d))
            .collect();
        calendar.sort_unstable();

        if calendar.is_empty() {
            return Err(StrategyError::NoPriceData {
                symbol: symbol.to_string(),
                reason: format!("no trading days between {} and {}", range.start, range.end),
            });
        }

        let quotes = if symbol == self.reference {
            reference
        } else {
            self.load_symbol(symbol)?
        };

        let mut values: Vec<f64> = calendar
            .iter()
            .map(|d| quotes.get(d).copied().unwrap_or(f64::NAN))
            .collect();
        fill_forward_backward(&mut values);

        if values.iter().all(|v| v.is_nan()) {
            return Err(StrategyError::NoPriceData {
                symbol: symbol.to_string(),
                reason: "no quotes inside the requested range".to_string(),
            });
        }

        Ok(PriceSeries::new(symbol, calendar, values))
    }
}

fn read_price_csv(path: &Path) -> Result<HashMap<NaiveDate, f64>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();

    let date_idx = headers
        .iter()
        .position(|h| h == "Date")
        .ok_or_else(|| StrategyError::PriceData(format!("{}: missing Date column", path.display())))?;
    let close_idx = headers
        .iter()
        .position(|h| h == "Adj Close")
        .ok_or_else(|| {
            StrategyError::PriceData(format!("{}: missing Adj Close column", path.display()))
        })?;

    let mut quotes = HashMap::new();
    for record in reader.records() {
        let record = record?;
        let date: NaiveDate = record
            .get(date_idx)
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| StrategyError::PriceData(format!("{}: bad date", path.display())))?;
        // "nan" cells are treated as absent and filled later
        let value = record
            .get(close_idx)
            .and_then(|s| s.parse::<f64>().ok())
            .unwrap_or(f64::NAN);
        if !value.is_nan() {
            quotes.insert(date, value);
        }
    }
    Ok(quotes)
}

/// In-memory source, keyed by symbol. Every stored date counts as a
/// trading day; ranges are sliced and filled the same way as the CSV
/// source. Useful for tests and embedded callers.
#[derive(Debug, Clone, Default)]
pub struct MemoryPriceSource {
    series: HashMap<String, Vec<(NaiveDate, f64)>>,
}

impl MemoryPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: impl Into<String>, mut quotes: Vec<(NaiveDate, f64)>) {
        quotes.sort_unstable_by_key(|(d, _)| *d);
        self.series.insert(symbol.into(), quotes);
    }

    /// Insert consecutive weekday-agnostic daily quotes starting at `start`.
    pub fn insert_daily(&mut self, symbol: impl Into<String>, start: NaiveDate, prices: &[f64]) {
        let quotes = prices
            .iter()
            .enumerate()
            .map(|(i, &p)| (start + chrono::Duration::days(i as i64), p))
            .collect();
        self.insert(symbol, quotes);
    }
}

impl PriceSource for MemoryPriceSource {
    fn get_prices(&self, symbol: &str, range: DateRange) -> Result<PriceSeries> {
        let quotes = self
            .series
            .get(symbol)
            .ok_or_else(|| StrategyError::NoPriceData {
                symbol: symbol.to_string(),
                reason: "symbol not loaded".to_string(),
            })?;

        let mut dates = Vec::new();
        let mut values = Vec::new();
        for &(d, v) in quotes.iter().filter(|(d, _)| range.contains(*d)) {
            dates.push(d);
            values.push(v);
        }

        if dates.is_empty() {
            return Err(StrategyError::NoPriceData {
                symbol: symbol.to_string(),
                reason: format!("no quotes between {} and {}", range.start, range.end),
            });
        }

        fill_forward_backward(&mut values);
        Ok(PriceSeries::new(symbol, dates, values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_memory_source_slices_range() {
        let mut source = MemoryPriceSource::new();
        source.insert_daily("JPM", d("2008-01-01"), &[100.0, 101.0, 99.0, 105.0]);

        let range = DateRange::new(d("2008-01-02"), d("2008-01-03"));
        let series = source.get_prices("JPM", range).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.values(), &[101.0, 99.0]);
    }

    #[test]
    fn test_memory_source_unknown_symbol() {
        let source = MemoryPriceSource::new();
        let range = DateRange::new(d("2008-01-01"), d("2008-02-01"));
        assert!(matches!(
            source.get_prices("JPM", range),
            Err(StrategyError::NoPriceData { .. })
        ));
    }

    #[test]
    fn test_csv_parsing() {
        let data = "Date,Open,Adj Close\n2008-01-02,10.0,100.5\n2008-01-03,10.0,nan\n2008-01-04,10.0,101.5\n";
        let dir = std::env::temp_dir().join("strategy_ml_csv_test");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("TEST.csv"), data).unwrap();

        let source = CsvPriceSource::new(&dir).with_reference("TEST");
        let range = DateRange::new(d("2008-01-01"), d("2008-02-01"));
        let series = source.get_prices("TEST", range).unwrap();
        // the nan row is dropped from the calendar source entirely
        assert_eq!(series.len(), 2);
        assert_eq!(series.values(), &[100.5, 101.5]);
    }
}
