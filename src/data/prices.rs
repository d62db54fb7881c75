//! Date-indexed price series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Inclusive date range for a training or testing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// A single symbol's adjusted closing prices on its trading calendar.
///
/// Dates are strictly increasing. A series handed out by a
/// [`PriceSource`](super::PriceSource) has been forward- then
/// backward-filled, so it contains no NaN inside the requested range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, dates: Vec<NaiveDate>, values: Vec<f64>) -> Self {
        assert_eq!(dates.len(), values.len(), "dates and values must align");
        debug_assert!(dates.windows(2).all(|w| w[0] < w[1]));
        Self {
            symbol: symbol.into(),
            dates,
            values,
        }
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

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn date(&self, i: usize) -> NaiveDate {
        self.dates[i]
    }

    pub fn value(&self, i: usize) -> f64 {
        self.values[i]
    }

    /// Forward-fill then backward-fill NaN gaps in place.
    pub fn fill(&mut self) {
        fill_forward_backward(&mut self.values);
    }
}

/// Forward-fill then backward-fill NaN entries of a column.
pub(crate) fn fill_forward_backward(values: &mut [f64]) {
    let mut last = f64::NAN;
    for v in values.iter_mut() {
        if v.is_nan() {
            *v = last;
        } else {
            last = *v;
        }
    }
    let mut next = f64::NAN;
    for v in values.iter_mut().rev() {
        if v.is_nan() {
            *v = next;
        } else {
            next = *v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_fill_forward_backward() {
        let mut vals = vec![f64::NAN, 2.0, f64::NAN, f64::NAN, 5.0];
        fill_forward_backward(&mut vals);
        assert_eq!(vals, vec![2.0, 2.0, 2.0, 2.0, 5.0]);
    }

    #[test]
    fn test_fill_all_nan_stays_nan() {
        let mut vals = vec![f64::NAN, f64::NAN];
        fill_forward_backward(&mut vals);
        assert!(vals.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_range_contains() {
        let range = DateRange::new(d("2008-01-01"), d("2009-01-01"));
        assert!(range.contains(d("2008-06-15")));
        assert!(!range.contains(d("2009-01-02")));
    }
}
