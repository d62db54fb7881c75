//! Tree-ensemble trading strategy.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{transition, Action, Strategy};
use crate::config::IndicatorSet;
use crate::data::{DateRange, PriceSeries, PriceSource};
use crate::error::{Result, StrategyError};
use crate::features::{indicators, IndicatorFrame, MinMaxScaler, ScalerMap};
use crate::models::{BagEnsemble, Learner, RandomTree};
use crate::portfolio::TradeSchedule;

/// Tree-ensemble strategy hyperparameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeStrategyConfig {
    /// Market impact per transaction; widens both signal thresholds so a
    /// prediction needs an edge beyond trading cost.
    pub impact: f64,
    /// Commission per transaction (used by valuation, not labeling).
    pub commission: f64,
    /// Forward-return horizon in trading days.
    pub n_day_return: usize,
    /// Long threshold on the forward return.
    pub y_buy: f64,
    /// Short threshold on the forward return.
    pub y_sell: f64,
    /// Maximum rows aggregated at a tree leaf.
    pub leaf_size: usize,
    /// Ensemble size.
    pub bags: usize,
    /// RNG seed.
    pub seed: u64,
}

impl Default for TreeStrategyConfig {
    fn default() -> Self {
        Self {
            impact: 0.0,
            commission: 0.0,
            n_day_return: 5,
            y_buy: 0.008,
            y_sell: -0.008,
            leaf_size: 6,
            bags: 10,
            seed: 42,
        }
    }
}

/// Scaling, indicator selection, and ensemble captured by training.
struct Trained {
    indicators: IndicatorSet,
    scalers: ScalerMap,
    ensemble: BagEnsemble<RandomTree>,
}

/// Bagged random-tree classifier over normalized indicator features,
/// labeling forward N-day returns as long/short/cash.
pub struct TreeStrategy {
    config: TreeStrategyConfig,
    trained: Option<Trained>,
}

impl TreeStrategy {
    pub fn new(config: TreeStrategyConfig) -> Self {
        Self {
            config,
            trained: None,
        }
    }

    pub fn config(&self) -> &TreeStrategyConfig {
        &self.config
    }
}

/// Compute, normalize, and join the configured indicators into one
/// feature frame aligned to the price calendar, filled so every row is
/// usable.
fn indicator_features(
    prices: &PriceSeries,
    set: &IndicatorSet,
    scalers: Option<&ScalerMap>,
) -> Result<(IndicatorFrame, ScalerMap)> {
    let mut fitted = ScalerMap::new();
    let mut joined = IndicatorFrame::new(prices.dates().to_vec(), Vec::new(), Vec::new());

    for spec in set.specs() {
        let frame = indicators::compute(&spec.name, &spec.params, prices)?;
        let scaler = match scalers {
            Some(map) => map
                .get(&spec.name)
                .cloned()
                .ok_or(StrategyError::NotTrained)?,
            None => MinMaxScaler::fit(&frame),
        };
        let scaled = scaler.apply(&frame);
        fitted.insert(spec.name.clone(), scaler);
        joined = joined.join(&scaled);
    }

    joined.fill();

    for c in 0..joined.n_cols() {
        if joined.column(c).iter().any(|v| !v.is_finite()) {
            return Err(StrategyError::InsufficientData(format!(
                "indicator column '{}' has no usable values",
                joined.column_names()[c]
            )));
        }
    }

    Ok((joined, fitted))
}

impl Strategy for TreeStrategy {
    fn train_model(
        &mut self,
        source: &dyn PriceSource,
        symbol: &str,
        range: DateRange,
        _start_val: f64,
        indicators: &IndicatorSet,
    ) -> Result<()> {
        indicators.validate_for_features()?;

        let prices = source.get_prices(symbol, range)?;
        let (features, scalers) = indicator_features(&prices, indicators, None)?;

        // forward N-day return, measured from the first tradable day
        let horizon = self.config.n_day_return + 1;
        if prices.len() <= horizon {
            return Err(StrategyError::InsufficientData(format!(
                "need more than {} rows to label {}-day forward returns",
                horizon, self.config.n_day_return
            )));
        }

        let y_buy = self.config.y_buy + self.config.impact;
        let y_sell = self.config.y_sell - self.config.impact;

        let mut data_x = Vec::new();
        let mut data_y = Vec::new();
        for t in 0..prices.len() - horizon {
            let forward = prices.value(t + horizon) / prices.value(t + 1) - 1.0;
            let class = if forward > y_buy {
                1.0
            } else if forward < y_sell {
                -1.0
            } else {
                0.0
            };
            data_x.push(features.row(t));
            data_y.push(class);
        }

        let seed = self.config.seed;
        let leaf_size = self.config.leaf_size;
        let mut ensemble = BagEnsemble::with_seed(self.config.bags, seed, |i| {
            RandomTree::with_seed(leaf_size, seed.wrapping_add(i as u64))
        });
        ensemble.add_evidence(&data_x, &data_y);

        info!(
            symbol,
            rows = data_y.len(),
            bags = ensemble.bags(),
            "tree ensemble trained"
        );

        self.trained = Some(Trained {
            indicators: indicators.clone(),
            scalers,
            ensemble,
        });
        Ok(())
    }

    fn test_model(
        &mut self,
        source: &dyn PriceSource,
        symbol: &str,
        range: DateRange,
    ) -> Result<TradeSchedule> {
        let trained = self.trained.as_ref().ok_or(StrategyError::NotTrained)?;

        let prices = source.get_prices(symbol, range)?;
        let (features, _) =
            indicator_features(&prices, &trained.indicators, Some(&trained.scalers))?;

        let predictions = trained.ensemble.query(&features.to_rows());

        // signals execute one day late to avoid look-ahead
        let mut trades = TradeSchedule::zeros(symbol, prices.dates().to_vec());
        let mut holding = 0.0;
        for (i, &pred) in predictions
            .iter()
            .enumerate()
            .take(predictions.len().saturating_sub(1))
        {
            let (quantity, new_holding) = transition(holding, Action::from_class(pred));
            trades.set(i + 1, quantity);
            holding = new_holding;
        }

        Ok(trades)
    }
}
