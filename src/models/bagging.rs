//! Bootstrap-aggregated ensemble.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use super::{mode, Learner};

const DEFAULT_SEED: u64 = 42;

/// Bagging over any [`Learner`]. Each member trains on an independent
/// same-size bootstrap resample; prediction is the per-row mode across
/// members (lowest value wins ties).
pub struct BagEnsemble<L: Learner> {
    members: Vec<L>,
    seed: u64,
}

impl<L: Learner> BagEnsemble<L> {
    /// Build `bags` members with the supplied constructor. The member
    /// index is passed in so implementations can derive distinct seeds.
    pub fn new(bags: usize, build: impl FnMut(usize) -> L) -> Self {
        Self::with_seed(bags, DEFAULT_SEED, build)
    }

    pub fn with_seed(bags: usize, seed: u64, build: impl FnMut(usize) -> L) -> Self {
        Self {
            members: (0..bags.max(1)).map(build).collect(),
            seed,
        }
    }

    pub fn bags(&self) -> usize {
        self.members.len()
    }

    pub fn members(&self) -> &[L] {
        &self.members
    }
}

impl<L: Learner + Sync> Learner for BagEnsemble<L> {
    fn add_evidence(&mut self, data_x: &[Vec<f64>], data_y: &[f64]) {
        if data_x.is_empty() {
            return;
        }

        let n = data_x.len();
        let seed = self.seed;

        // members are independent given their own sample and RNG stream,
        // so they can train in parallel
        self.members
            .par_iter_mut()
            .enumerate()
            .for_each(|(i, member)| {
                let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(i as u64));
                let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();

                let bag_x: Vec<Vec<f64>> = sample.iter().map(|&r| data_x[r].clone()).collect();
                let bag_y: Vec<f64> = sample.iter().map(|&r| data_y[r]).collect();
                member.add_evidence(&bag_x, &bag_y);
            });
    }

    fn query(&self, points: &[Vec<f64>]) -> Vec<f64> {
        let votes: Vec<Vec<f64>> = self.members.iter().map(|m| m.query(points)).collect();

        (0..points.len())
            .map(|row| {
                let row_votes: Vec<f64> = votes.iter().map(|v| v[row]).collect();
                mode(&row_votes)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RandomTree;

    fn step_data() -> (Vec<Vec<f64>>, Vec<f64>) {
        let x: Vec<Vec<f64>> = (0..60).map(|i| vec![i as f64]).collect();
        let y: Vec<f64> = (0..60).map(|i| if i < 30 { -1.0 } else { 1.0 }).collect();
        (x, y)
    }

    #[test]
    fn test_single_bag_matches_bootstrap_trained_tree() {
        let (x, y) = step_data();

        let mut ensemble = BagEnsemble::with_seed(1, 17, |i| RandomTree::with_seed(1, i as u64));
        ensemble.add_evidence(&x, &y);

        // train a lone tree on the identical bootstrap sample
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let sample: Vec<usize> = (0..x.len()).map(|_| rng.gen_range(0..x.len())).collect();
        let bag_x: Vec<Vec<f64>> = sample.iter().map(|&r| x[r].clone()).collect();
        let bag_y: Vec<f64> = sample.iter().map(|&r| y[r]).collect();
        let mut lone = RandomTree::with_seed(1, 0);
        lone.add_evidence(&bag_x, &bag_y);

        assert_eq!(ensemble.query(&x), lone.query(&x));
    }

    #[test]
    fn test_majority_vote_recovers_step_function() {
        let (x, y) = step_data();

        let mut ensemble = BagEnsemble::with_seed(15, 5, |i| RandomTree::with_seed(1, i as u64));
        ensemble.add_evidence(&x, &y);

        let preds = ensemble.query(&[vec![5.0], vec![55.0]]);
        assert_eq!(preds, vec![-1.0, 1.0]);
    }

    #[test]
    fn test_members_differ_across_bags() {
        let (x, y) = step_data();

        let mut ensemble = BagEnsemble::with_seed(5, 11, |i| RandomTree::with_seed(1, i as u64));
        ensemble.add_evidence(&x, &y);

        // distinct bootstrap resamples build structurally different trees
        assert_ne!(ensemble.members()[0].nodes(), ensemble.members()[1].nodes());
    }
}
