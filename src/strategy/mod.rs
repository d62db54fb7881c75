//! Trading strategy wrappers.
//!
//! Both learning paradigms share one contract: train over a date range,
//! then produce an out-of-sample trade schedule. The orchestration layer
//! selects a paradigm by explicit tag, never by runtime type inspection.

mod q_strategy;
mod session;
mod tree_strategy;

pub use q_strategy::{QStrategy, QStrategyConfig};
pub use session::{BacktestReport, BacktestSession, SessionConfig};
pub use tree_strategy::{TreeStrategy, TreeStrategyConfig};

use serde::{Deserialize, Serialize};

use crate::config::IndicatorSet;
use crate::data::{DateRange, PriceSource};
use crate::error::Result;
use crate::portfolio::TradeSchedule;

/// Shared train/test contract for trading strategies.
pub trait Strategy {
    /// Train on `symbol` over `range`, fitting indicator scalers and the
    /// underlying learner. Overwrites any previous training.
    fn train_model(
        &mut self,
        source: &dyn PriceSource,
        symbol: &str,
        range: DateRange,
        start_val: f64,
        indicators: &IndicatorSet,
    ) -> Result<()>;

    /// Produce a trade schedule for `range` using the trained model and
    /// training-time scaling. Fails with
    /// [`StrategyError::NotTrained`](crate::error::StrategyError::NotTrained)
    /// before training.
    fn test_model(
        &mut self,
        source: &dyn PriceSource,
        symbol: &str,
        range: DateRange,
    ) -> Result<TradeSchedule>;
}

/// Trading actions shared by both paradigms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Long,
    Short,
    Cash,
}

impl Action {
    /// Action for a Q-table column index.
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Action::Long),
            1 => Some(Action::Short),
            2 => Some(Action::Cash),
            _ => None,
        }
    }

    /// Action for a tree-ensemble class label (+1 long, -1 short, 0 cash).
    pub fn from_class(class: f64) -> Self {
        if class == 1.0 {
            Action::Long
        } else if class == -1.0 {
            Action::Short
        } else {
            Action::Cash
        }
    }

    /// Net share position this action targets.
    pub fn target_holding(&self) -> f64 {
        match self {
            Action::Long => 1000.0,
            Action::Short => -1000.0,
            Action::Cash => 0.0,
        }
    }
}

/// Trade quantity moving `holding` to the action's target, and the new
/// holding after the trade.
pub(crate) fn transition(holding: f64, action: Action) -> (f64, f64) {
    let target = action.target_holding();
    (target - holding, target)
}

/// Paradigm tag used for explicit model selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelKind {
    QLearning,
    TreeEnsemble,
}

/// Tagged model configuration; builds the matching strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ModelConfig {
    QLearning(QStrategyConfig),
    TreeEnsemble(TreeStrategyConfig),
}

impl ModelConfig {
    pub fn kind(&self) -> ModelKind {
        match self {
            ModelConfig::QLearning(_) => ModelKind::QLearning,
            ModelConfig::TreeEnsemble(_) => ModelKind::TreeEnsemble,
        }
    }

    pub fn impact(&self) -> f64 {
        match self {
            ModelConfig::QLearning(c) => c.impact,
            ModelConfig::TreeEnsemble(c) => c.impact,
        }
    }

    pub fn commission(&self) -> f64 {
        match self {
            ModelConfig::QLearning(c) => c.commission,
            ModelConfig::TreeEnsemble(c) => c.commission,
        }
    }

    /// Build the strategy this configuration describes.
    pub fn build(&self) -> Box<dyn Strategy> {
        match self {
            ModelConfig::QLearning(c) => Box::new(QStrategy::new(c.clone())),
            ModelConfig::TreeEnsemble(c) => Box::new(TreeStrategy::new(c.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_to_trade_table() {
        // flat -> long
        assert_eq!(transition(0.0, Action::Long), (1000.0, 1000.0));
        // long -> short flips with a double-size trade
        assert_eq!(transition(1000.0, Action::Short), (-2000.0, -1000.0));
        // short -> cash flattens
        assert_eq!(transition(-1000.0, Action::Cash), (1000.0, 0.0));
        // no-op when already at target
        assert_eq!(transition(1000.0, Action::Long), (0.0, 1000.0));
    }

    #[test]
    fn test_action_index_round_trip() {
        assert_eq!(Action::from_index(0), Some(Action::Long));
        assert_eq!(Action::from_index(1), Some(Action::Short));
        assert_eq!(Action::from_index(2), Some(Action::Cash));
        assert_eq!(Action::from_index(3), None);
    }

    #[test]
    fn test_class_mapping() {
        assert_eq!(Action::from_class(1.0), Action::Long);
        assert_eq!(Action::from_class(-1.0), Action::Short);
        assert_eq!(Action::from_class(0.0), Action::Cash);
    }

    #[test]
    fn test_model_config_tag() {
        let config = ModelConfig::QLearning(QStrategyConfig::default());
        assert_eq!(config.kind(), ModelKind::QLearning);
        let config = ModelConfig::TreeEnsemble(TreeStrategyConfig::default());
        assert_eq!(config.kind(), ModelKind::TreeEnsemble);
    }
}
