//! Error types for the strategy library.

use thiserror::Error;

/// Errors surfaced by the strategy, data, and valuation layers.
#[derive(Debug, Error)]
pub enum StrategyError {
    /// An indicator name not present in the pipeline registry.
    #[error("indicator '{0}' is not supported")]
    UnknownIndicator(String),

    /// Indicator configuration rejected before any computation.
    #[error("invalid indicator configuration: {0}")]
    InvalidConfig(String),

    /// `test_model` called on a strategy that has not been trained.
    #[error("model has not been trained; call train_model first")]
    NotTrained,

    /// Too little usable history for the requested computation.
    #[error("not enough price history: {0}")]
    InsufficientData(String),

    /// No price file or rows available for the requested symbol.
    #[error("no price data for symbol '{symbol}': {reason}")]
    NoPriceData { symbol: String, reason: String },

    /// Malformed price file.
    #[error("failed to read price data: {0}")]
    PriceData(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, StrategyError>;
