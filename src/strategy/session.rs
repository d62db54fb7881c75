//! Backtest session orchestration.
//!
//! A session is an explicit handle owning one built strategy and its
//! price source; callers hold the session instead of looking models up
//! in a process-wide registry.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{ModelConfig, Strategy};
use crate::config::IndicatorSet;
use crate::data::{DateRange, PriceSource};
use crate::error::Result;
use crate::portfolio::{compute_portvals, PerformanceMetrics, PortfolioValues, TradeSchedule};

/// Everything needed to run one train/test backtest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Symbol to trade.
    pub symbol: String,
    /// Starting portfolio cash.
    pub start_val: f64,
    /// In-sample training window.
    pub train: DateRange,
    /// Out-of-sample testing window.
    pub test: DateRange,
    /// Tagged model selection and hyperparameters.
    pub model: ModelConfig,
    /// Indicator selection shared by training and testing.
    #[serde(default)]
    pub indicators: IndicatorSet,
}

impl SessionConfig {
    /// Load a session configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save the configuration to a JSON file.
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Out-of-sample results: the trade schedule, its valuation, and the
/// buy-and-hold benchmark over the same trading days.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    pub trades: TradeSchedule,
    pub portfolio_values: PortfolioValues,
    pub metrics: PerformanceMetrics,
    pub benchmark_values: PortfolioValues,
    pub benchmark_metrics: PerformanceMetrics,
}

/// One trained-model lifecycle: build by tag, train, test, evaluate.
pub struct BacktestSession<S: PriceSource> {
    source: S,
    config: SessionConfig,
    strategy: Box<dyn Strategy>,
}

impl<S: PriceSource> BacktestSession<S> {
    pub fn new(source: S, config: SessionConfig) -> Self {
        let strategy = config.model.build();
        Self {
            source,
            config,
            strategy,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Train the strategy over the configured in-sample window.
    pub fn train(&mut self) -> Result<()> {
        info!(
            symbol = %self.config.symbol,
            kind = ?self.config.model.kind(),
            "training strategy"
        );
        self.strategy.train_model(
            &self.source,
            &self.config.symbol,
            self.config.train,
            self.config.start_val,
            &self.config.indicators,
        )
    }

    /// Produce a trade schedule for an arbitrary window with the trained
    /// strategy.
    pub fn test(&mut self, range: DateRange) -> Result<TradeSchedule> {
        self.strategy
            .test_model(&self.source, &self.config.symbol, range)
    }

    /// Train in-sample, test out-of-sample, and value both the strategy
    /// and the buy-and-hold benchmark.
    pub fn run(&mut self) -> Result<BacktestReport> {
        self.train()?;
        let trades = self.test(self.config.test)?;

        let commission = self.config.model.commission();
        let impact = self.config.model.impact();

        let portfolio_values = compute_portvals(
            &self.source,
            &trades,
            self.config.start_val,
            commission,
            impact,
        )?;
        let metrics = PerformanceMetrics::daily(&portfolio_values);

        let benchmark = TradeSchedule::benchmark(&self.config.symbol, trades.dates().to_vec());
        let benchmark_values = compute_portvals(
            &self.source,
            &benchmark,
            self.config.start_val,
            commission,
            impact,
        )?;
        let benchmark_metrics = PerformanceMetrics::daily(&benchmark_values);

        info!(
            cumulative_return = metrics.cumulative_return,
            benchmark_return = benchmark_metrics.cumulative_return,
            "backtest complete"
        );

        Ok(BacktestReport {
            trades,
            portfolio_values,
            metrics,
            benchmark_values,
            benchmark_metrics,
        })
    }
}
