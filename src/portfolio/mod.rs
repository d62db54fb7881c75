//! Portfolio valuation and performance metrics.

mod metrics;
mod valuation;

pub use metrics::{daily_returns, PerformanceMetrics};
pub use valuation::{compute_portvals, PortfolioValues, TradeSchedule};
