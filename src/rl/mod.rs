//! Reinforcement learning engine.

mod q_learner;

pub use q_learner::{QLearner, QLearnerConfig};
