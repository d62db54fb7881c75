//! Q-learning trading strategy.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{transition, Action, Strategy};
use crate::config::IndicatorSet;
use crate::data::{DateRange, PriceSeries, PriceSource};
use crate::error::{Result, StrategyError};
use crate::features::{indicators, MinMaxScaler, ScalerMap};
use crate::portfolio::{compute_portvals, TradeSchedule};
use crate::rl::{QLearner, QLearnerConfig};

/// Q-learning strategy hyperparameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QStrategyConfig {
    /// Market impact per transaction, subtracted from step rewards and
    /// charged by the valuation engine.
    pub impact: f64,
    /// Commission per transaction.
    pub commission: f64,
    /// Bins per discretized indicator.
    pub bins: usize,
    /// Learning rate.
    pub alpha: f64,
    /// Discount factor.
    pub gamma: f64,
    /// Initial random-action rate.
    pub rar: f64,
    /// Random-action decay rate.
    pub radr: f64,
    /// Dyna planning updates per step.
    pub dyna: usize,
    /// Absolute cumulative-return change below which training stops.
    pub convergence_threshold: f64,
    /// Safety cap on training passes; the convergence loop is otherwise
    /// unbounded.
    pub max_epochs: usize,
    /// RNG seed.
    pub seed: u64,
}

impl Default for QStrategyConfig {
    fn default() -> Self {
        Self {
            impact: 0.0,
            commission: 0.0,
            bins: 10,
            alpha: 0.2,
            gamma: 0.9,
            rar: 0.98,
            radr: 0.999,
            dyna: 0,
            convergence_threshold: 0.001,
            max_epochs: 200,
            seed: 42,
        }
    }
}

/// Upper bound (exclusive) on packed composite states for a bin count.
pub fn num_states(bins: usize) -> usize {
    (bins - 1) * 111 + 1
}

/// Discretize three indicator frames into one packed state per trading
/// day.
///
/// Each indicator's first column is normalized (fitting scalers when
/// none are given), equal-width binned in [0,1], and packed with fixed
/// radix: `state = b1*100 + b2*10 + b3`. Rows where any indicator is
/// still warming up are forward- then backward-filled after packing.
fn indicator_states(
    bins: usize,
    prices: &PriceSeries,
    set: &IndicatorSet,
    scalers: Option<&ScalerMap>,
) -> Result<(Vec<usize>, ScalerMap)> {
    let mut fitted = ScalerMap::new();
    // per-indicator bin digit aligned to the price calendar
    let mut digits: Vec<Vec<Option<usize>>> = Vec::with_capacity(set.len());

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

        let column: Vec<Option<usize>> = prices
            .dates()
            .iter()
            .map(|d| match scaled.dates().binary_search(d) {
                Ok(row) => {
                    let v = scaled.value(row, 0);
                    if v.is_nan() {
                        None
                    } else {
                        Some(((v * bins as f64).floor() as isize).clamp(0, bins as isize - 1)
                            as usize)
                    }
                }
                Err(_) => None,
            })
            .collect();
        digits.push(column);
    }

    // pack first, fill the packed series after
    let mut packed: Vec<f64> = (0..prices.len())
        .map(|row| {
            match (digits[0][row], digits[1][row], digits[2][row]) {
                (Some(a), Some(b), Some(c)) => (a * 100 + b * 10 + c) as f64,
                _ => f64::NAN,
            }
        })
        .collect();
    crate::data::fill_forward_backward(&mut packed);

    if packed.iter().any(|v| v.is_nan()) {
        return Err(StrategyError::InsufficientData(
            "indicators produced no usable rows".to_string(),
        ));
    }

    Ok((packed.into_iter().map(|v| v as usize).collect(), fitted))
}

/// Scaling and indicator selection captured by training.
struct Trained {
    indicators: IndicatorSet,
    scalers: ScalerMap,
    learner: QLearner,
}

/// Tabular Q-learning over discretized composite indicator states.
pub struct QStrategy {
    config: QStrategyConfig,
    trained: Option<Trained>,
}

impl QStrategy {
    pub fn new(config: QStrategyConfig) -> Self {
        Self {
            config,
            trained: None,
        }
    }

    pub fn config(&self) -> &QStrategyConfig {
        &self.config
    }

    /// Reward, trade quantity, and new holding for taking `action` on
    /// `day` with the current holding.
    fn step_reward(
        &self,
        day: usize,
        action: Action,
        holding: f64,
        prices: &PriceSeries,
    ) -> (f64, f64, f64) {
        let ratio = prices.value(day + 1) / prices.value(day) - 1.0;
        let mut reward = match action {
            Action::Long => ratio,
            Action::Short => -ratio,
            Action::Cash => 0.0,
        };

        let (quantity, new_holding) = transition(holding, action);
        if quantity != 0.0 {
            reward -= self.config.impact;
        }
        (reward, quantity, new_holding)
    }
}

impl Strategy for QStrategy {
    fn train_model(
        &mut self,
        source: &dyn PriceSource,
        symbol: &str,
        range: DateRange,
        start_val: f64,
        indicators: &IndicatorSet,
    ) -> Result<()> {
        indicators.validate_for_states()?;
        if self.config.bins < 2 {
            return Err(StrategyError::InvalidConfig(format!(
                "discretization needs at least 2 bins, got {}",
                self.config.bins
            )));
        }

        let prices = source.get_prices(symbol, range)?;
        let (states, scalers) = indicator_states(self.config.bins, &prices, indicators, None)?;

        let mut learner = QLearner::new(QLearnerConfig {
            num_states: num_states(self.config.bins),
            num_actions: 3,
            alpha: self.config.alpha,
            gamma: self.config.gamma,
            rar: self.config.rar,
            radr: self.config.radr,
            dyna: self.config.dyna,
            seed: self.config.seed,
        });

        let mut trades = TradeSchedule::zeros(symbol, prices.dates().to_vec());
        let mut last_cum_ret: f64 = -100.0;
        let mut cum_ret: f64 = 0.0;
        let mut epochs = 0;

        while (cum_ret - last_cum_ret).abs() > self.config.convergence_threshold {
            if epochs >= self.config.max_epochs {
                warn!(
                    epochs,
                    cum_ret, "training stopped at the epoch cap without converging"
                );
                break;
            }
            last_cum_ret = cum_ret;

            let mut action = Action::from_index(learner.querysetstate(states[0]))
                .unwrap_or(Action::Cash);
            let mut holding = 0.0;

            for day in 0..prices.len().saturating_sub(1) {
                let (reward, quantity, new_holding) =
                    self.step_reward(day, action, holding, &prices);
                action = Action::from_index(learner.query(states[day + 1], reward))
                    .unwrap_or(Action::Cash);
                trades.set(day, quantity);
                holding = new_holding;
            }

            let portvals = compute_portvals(
                source,
                &trades,
                start_val,
                self.config.commission,
                self.config.impact,
            )?;
            cum_ret = portvals.cumulative_return();
            epochs += 1;
            debug!(epochs, cum_ret, "training pass complete");
        }

        info!(symbol, epochs, cum_ret, "q-learning training finished");

        self.trained = Some(Trained {
            indicators: indicators.clone(),
            scalers,
            learner,
        });
        Ok(())
    }

    fn test_model(
        &mut self,
        source: &dyn PriceSource,
        symbol: &str,
        range: DateRange,
    ) -> Result<TradeSchedule> {
        let prices = source.get_prices(symbol, range)?;
        let trained = self.trained.as_ref().ok_or(StrategyError::NotTrained)?;

        let (states, _) = indicator_states(
            self.config.bins,
            &prices,
            &trained.indicators,
            Some(&trained.scalers),
        )?;
        let trained = self.trained.as_mut().ok_or(StrategyError::NotTrained)?;

        let mut trades = TradeSchedule::zeros(symbol, prices.dates().to_vec());
        let mut holding = 0.0;

        for day in 0..prices.len().saturating_sub(1) {
            let action = Action::from_index(trained.learner.querysetstate(states[day]))
                .unwrap_or(Action::Cash);
            let (quantity, new_holding) = transition(holding, action);
            trades.set(day, quantity);
            holding = new_holding;
        }

        Ok(trades)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MemoryPriceSource;
    use chrono::NaiveDate;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn wave_prices(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + 10.0 * (i as f64 * 0.3).sin() + 0.05 * i as f64)
            .collect()
    }

    fn wave_source(n: usize) -> (MemoryPriceSource, DateRange) {
        let mut source = MemoryPriceSource::new();
        source.insert_daily("JPM", d("2008-01-01"), &wave_prices(n));
        let range = DateRange::new(d("2008-01-01"), d("2008-01-01") + chrono::Duration::days(n as i64));
        (source, range)
    }

    #[test]
    fn test_num_states_bound() {
        assert_eq!(num_states(10), 1000);
        assert_eq!(num_states(2), 112);
    }

    #[test]
    fn test_states_respect_packing_bound() {
        let (source, range) = wave_source(120);
        let prices = source.get_prices("JPM", range).unwrap();

        let bins = 10;
        let (states, scalers) =
            indicator_states(bins, &prices, &IndicatorSet::default_selection(), None).unwrap();

        assert_eq!(states.len(), prices.len());
        assert_eq!(scalers.len(), 3);
        for &s in &states {
            assert!(s < num_states(bins));
            // decoding recovers digits inside [0, bins-1]
            assert!(s / 100 < bins);
            assert!((s / 10) % 10 < bins);
            assert!(s % 10 < bins);
        }
    }

    #[test]
    fn test_apply_mode_requires_fitted_scalers() {
        let (source, range) = wave_source(60);
        let prices = source.get_prices("JPM", range).unwrap();

        let empty = ScalerMap::new();
        let result = indicator_states(
            10,
            &prices,
            &IndicatorSet::default_selection(),
            Some(&empty),
        );
        assert!(matches!(result, Err(StrategyError::NotTrained)));
    }

    #[test]
    fn test_test_before_train_fails() {
        let (source, range) = wave_source(60);
        let mut strategy = QStrategy::new(QStrategyConfig::default());
        assert!(matches!(
            strategy.test_model(&source, "JPM", range),
            Err(StrategyError::NotTrained)
        ));
    }

    #[test]
    fn test_requires_exactly_three_indicators() {
        let (source, range) = wave_source(60);
        let mut strategy = QStrategy::new(QStrategyConfig::default());

        let two = IndicatorSet::new(vec![
            crate::config::IndicatorSpec::new("bbp").with_param("lookback", 10.0),
            crate::config::IndicatorSpec::new("rsi").with_param("lookback", 10.0),
        ]);
        assert!(matches!(
            strategy.train_model(&source, "JPM", range, 100_000.0, &two),
            Err(StrategyError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_train_then_test_produces_legal_trades() {
        let (source, range) = wave_source(120);
        let config = QStrategyConfig {
            max_epochs: 30,
            ..Default::default()
        };
        let mut strategy = QStrategy::new(config);
        strategy
            .train_model(&source, "JPM", range, 100_000.0, &IndicatorSet::default_selection())
            .unwrap();

        let trades = strategy.test_model(&source, "JPM", range).unwrap();
        assert_eq!(trades.len(), 120);

        for &q in trades.shares() {
            assert!(matches!(q as i64, -2000 | -1000 | 0 | 1000 | 2000));
        }
        for h in trades.holdings() {
            assert!(matches!(h as i64, -1000 | 0 | 1000));
        }
        // the last day never trades
        assert_eq!(*trades.shares().last().unwrap(), 0.0);
    }

    #[test]
    fn test_step_reward_signs_and_impact() {
        let strategy = QStrategy::new(QStrategyConfig {
            impact: 0.01,
            ..Default::default()
        });
        let mut source = MemoryPriceSource::new();
        source.insert_daily("JPM", d("2008-01-01"), &[100.0, 110.0]);
        let prices = source
            .get_prices("JPM", DateRange::new(d("2008-01-01"), d("2008-01-02")))
            .unwrap();

        // long captures the next-day return minus impact for the entry trade
        let (reward, qty, holding) = strategy.step_reward(0, Action::Long, 0.0, &prices);
        assert!((reward - (0.1 - 0.01)).abs() < 1e-12);
        assert_eq!((qty, holding), (1000.0, 1000.0));

        // short flips the sign; already-short means no trade, no impact
        let (reward, qty, holding) = strategy.step_reward(0, Action::Short, -1000.0, &prices);
        assert!((reward + 0.1).abs() < 1e-12);
        assert_eq!((qty, holding), (0.0, -1000.0));

        // cash is rewardless but pays impact when flattening
        let (reward, qty, holding) = strategy.step_reward(0, Action::Cash, 1000.0, &prices);
        assert!((reward + 0.01).abs() < 1e-12);
        assert_eq!((qty, holding), (-1000.0, 0.0));
    }
}
