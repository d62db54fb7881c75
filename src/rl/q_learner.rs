//! Tabular Q-learning with optional Dyna planning.

use ndarray::Array2;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Q-learner hyperparameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QLearnerConfig {
    /// Number of rows in the Q-table (one per discretized state).
    pub num_states: usize,
    /// Number of actions.
    pub num_actions: usize,
    /// Learning rate.
    pub alpha: f64,
    /// Discount factor.
    pub gamma: f64,
    /// Initial random-action rate.
    pub rar: f64,
    /// Multiplicative random-action decay, applied after each real step.
    pub radr: f64,
    /// Synthetic planning updates per real step (0 disables Dyna).
    pub dyna: usize,
    /// RNG seed for table init, exploration, and Dyna sampling.
    pub seed: u64,
}

impl Default for QLearnerConfig {
    fn default() -> Self {
        Self {
            num_states: 1000,
            num_actions: 3,
            alpha: 0.2,
            gamma: 0.9,
            rar: 0.98,
            radr: 0.999,
            dyna: 0,
            seed: 42,
        }
    }
}

/// Tabular Q-learning agent.
///
/// The agent owns its dense `num_states x num_actions` table exclusively
/// and mutates it only in [`QLearner::query`]. It has no terminal state;
/// the owning strategy decides when training has converged.
pub struct QLearner {
    config: QLearnerConfig,
    q: Array2<f64>,
    rar: f64,
    state: usize,
    action: usize,
    /// Observed (s, a, s', r) tuples replayed by Dyna planning.
    experiences: Vec<(usize, usize, usize, f64)>,
    rng: ChaCha8Rng,
}

impl QLearner {
    pub fn new(config: QLearnerConfig) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        // random init breaks early argmax ties without favoring action 0
        let q = Array2::from_shape_fn((config.num_states, config.num_actions), |_| {
            rng.gen_range(-1.0..1.0)
        });

        let rar = config.rar;
        Self {
            config,
            q,
            rar,
            state: 0,
            action: 0,
            experiences: Vec::new(),
            rng,
        }
    }

    /// Current random-action rate.
    pub fn rar(&self) -> f64 {
        self.rar
    }

    pub fn q_table(&self) -> &Array2<f64> {
        &self.q
    }

    /// Seed an episode: remember `state` and pick an action without
    /// updating the table or decaying exploration.
    pub fn querysetstate(&mut self, state: usize) -> usize {
        let action = self.choose_action(state);
        self.state = state;
        self.action = action;
        action
    }

    /// One learning step: update the remembered (s, a) toward `reward`
    /// plus the discounted best value of `new_state`, run Dyna planning,
    /// decay exploration, and pick the next action from `new_state`.
    pub fn query(&mut self, new_state: usize, reward: f64) -> usize {
        self.update(self.state, self.action, new_state, reward);

        if self.config.dyna > 0 {
            self.experiences
                .push((self.state, self.action, new_state, reward));
            for _ in 0..self.config.dyna {
                let sampled = self.experiences.choose(&mut self.rng).copied();
                if let Some((s, a, s_prime, r)) = sampled {
                    self.update(s, a, s_prime, r);
                }
            }
        }

        self.rar *= self.config.radr;

        let action = self.choose_action(new_state);
        self.state = new_state;
        self.action = action;
        action
    }

    fn update(&mut self, state: usize, action: usize, new_state: usize, reward: f64) {
        let max_next = self
            .q
            .row(new_state)
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);

        let cell = &mut self.q[[state, action]];
        *cell += self.config.alpha * (reward + self.config.gamma * max_next - *cell);
    }

    fn choose_action(&mut self, state: usize) -> usize {
        if self.rng.gen::<f64>() < self.rar {
            self.rng.gen_range(0..self.config.num_actions)
        } else {
            self.best_action(state)
        }
    }

    fn best_action(&self, state: usize) -> usize {
        self.q
            .row(state)
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i)
            .unwrap_or(0)
    }
}
