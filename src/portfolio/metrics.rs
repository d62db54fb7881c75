//! Portfolio performance statistics.

use serde::{Deserialize, Serialize};

use super::valuation::PortfolioValues;

/// Summary statistics over a portfolio value series.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Final over initial value, minus one.
    pub cumulative_return: f64,
    /// Mean of daily returns.
    pub mean_daily_return: f64,
    /// Standard deviation of daily returns.
    pub std_daily_return: f64,
    /// Annualized Sharpe ratio at zero risk-free rate.
    pub sharpe_ratio: f64,
}

impl PerformanceMetrics {
    /// Compute statistics assuming `periods_per_year` trading days.
    pub fn from_portvals(portvals: &PortfolioValues, periods_per_year: f64) -> Self {
        let returns = daily_returns(portvals.values());
        if returns.is_empty() {
            return Self::default();
        }

        let mean = returns.iter().sum::<f64>() / returns.len() as f64;
        let variance =
            returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / returns.len() as f64;
        let std = variance.sqrt();

        let sharpe = if std > 0.0 {
            (mean * periods_per_year) / (std * periods_per_year.sqrt())
        } else {
            0.0
        };

        Self {
            cumulative_return: portvals.cumulative_return(),
            mean_daily_return: mean,
            std_daily_return: std,
            sharpe_ratio: sharpe,
        }
    }

    /// Daily-data convenience wrapper (252 trading days).
    pub fn daily(portvals: &PortfolioValues) -> Self {
        Self::from_portvals(portvals, 252.0)
    }
}

/// Simple returns between consecutive values.
pub fn daily_returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .map(|w| if w[0] != 0.0 { w[1] / w[0] - 1.0 } else { 0.0 })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn portvals(values: &[f64]) -> PortfolioValues {
        let start: NaiveDate = "2008-01-01".parse().unwrap();
        let dates = (0..values.len())
            .map(|i| start + chrono::Duration::days(i as i64))
            .collect();
        PortfolioValues::new(dates, values.to_vec())
    }

    #[test]
    fn test_daily_returns() {
        let returns = daily_returns(&[100.0, 110.0, 99.0]);
        assert!((returns[0] - 0.1).abs() < 1e-12);
        assert!((returns[1] + 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_constant_series_metrics() {
        let metrics = PerformanceMetrics::daily(&portvals(&[100.0, 100.0, 100.0]));
        assert_eq!(metrics.cumulative_return, 0.0);
        assert_eq!(metrics.mean_daily_return, 0.0);
        assert_eq!(metrics.sharpe_ratio, 0.0);
    }

    #[test]
    fn test_cumulative_return() {
        let metrics = PerformanceMetrics::daily(&portvals(&[100.0, 105.0, 110.0]));
        assert!((metrics.cumulative_return - 0.1).abs() < 1e-12);
        assert!(metrics.std_daily_return > 0.0);
    }
}
