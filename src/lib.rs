//! # Strategy ML - Machine Learning Trading Strategies
//!
//! Backtests automated trading strategies on historical daily prices.
//! Two learning paradigms share one train/test contract and one
//! portfolio valuation engine: a tabular Q-learning agent over
//! discretized technical-indicator states, and a bagged ensemble of
//! randomized decision trees classifying forward returns.
//!
//! ## Modules
//!
//! - `data` - price series and price sources
//! - `features` - technical indicators and min-max normalization
//! - `models` - random trees and bagging
//! - `rl` - tabular Q-learning with optional Dyna planning
//! - `portfolio` - trade schedules, valuation, performance metrics
//! - `strategy` - strategy wrappers and backtest sessions
//! - `config` - indicator configuration and validation

pub mod config;
pub mod data;
pub mod error;
pub mod features;
pub mod models;
pub mod portfolio;
pub mod rl;
pub mod strategy;

pub use config::{IndicatorSet, IndicatorSpec};
pub use data::{CsvPriceSource, DateRange, MemoryPriceSource, PriceSeries, PriceSource};
pub use error::{Result, StrategyError};
pub use portfolio::{compute_portvals, PortfolioValues, TradeSchedule};
pub use strategy::{BacktestSession, ModelConfig, ModelKind, Strategy};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{IndicatorSet, IndicatorSpec};
    pub use crate::data::{CsvPriceSource, DateRange, MemoryPriceSource, PriceSeries, PriceSource};
    pub use crate::error::{Result, StrategyError};
    pub use crate::features::{IndicatorFrame, MinMaxScaler, ScalerMap};
    pub use crate::models::{BagEnsemble, Learner, RandomTree};
    pub use crate::portfolio::{
        compute_portvals, PerformanceMetrics, PortfolioValues, TradeSchedule,
    };
    pub use crate::rl::{QLearner, QLearnerConfig};
    pub use crate::strategy::{
        Action, BacktestReport, BacktestSession, ModelConfig, ModelKind, QStrategy,
        QStrategyConfig, SessionConfig, Strategy, TreeStrategy, TreeStrategyConfig,
    };
}
