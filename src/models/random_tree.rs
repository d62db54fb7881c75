//! Randomized decision tree.
//!
//! Splits on a uniformly random feature at its median, trading split
//! optimality for speed and diversity across ensemble members. The tree
//! is a flat node arena: a split's left child is the next array slot and
//! its right child is addressed by a forward offset, so traversal is a
//! cursor walk over contiguous memory.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::{mode, Learner};

const DEFAULT_SEED: u64 = 42;

/// One arena slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    /// Internal split: rows with `point[feature] <= threshold` go to the
    /// next slot, the rest jump ahead by `right_offset`.
    Split {
        feature: usize,
        threshold: f64,
        right_offset: usize,
    },
    /// Terminal prediction.
    Leaf { value: f64 },
}

/// Random-split regression/classification tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomTree {
    leaf_size: usize,
    seed: u64,
    nodes: Vec<TreeNode>,
}

impl RandomTree {
    /// Aggregate partitions of up to `leaf_size` rows into leaves.
    pub fn new(leaf_size: usize) -> Self {
        Self::with_seed(leaf_size, DEFAULT_SEED)
    }

    pub fn with_seed(leaf_size: usize, seed: u64) -> Self {
        Self {
            leaf_size: leaf_size.max(1),
            seed,
            nodes: Vec::new(),
        }
    }

    /// Number of nodes in the built tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    fn build(
        &mut self,
        data_x: &[Vec<f64>],
        data_y: &[f64],
        rows: &[usize],
        rng: &mut ChaCha8Rng,
    ) {
        let ys: Vec<f64> = rows.iter().map(|&r| data_y[r]).collect();

        if rows.len() <= self.leaf_size || all_same(&ys) {
            self.nodes.push(TreeNode::Leaf { value: mode(&ys) });
            return;
        }

        let feature = rng.gen_range(0..data_x[rows[0]].len());
        let threshold = median(rows.iter().map(|&r| data_x[r][feature]));

        let (left, right): (Vec<usize>, Vec<usize>) = rows
            .iter()
            .partition(|&&r| data_x[r][feature] <= threshold);

        // a degenerate feature distribution cannot be split further
        if left.is_empty() || right.is_empty() {
            self.nodes.push(TreeNode::Leaf { value: mode(&ys) });
            return;
        }

        let root = self.nodes.len();
        self.nodes.push(TreeNode::Split {
            feature,
            threshold,
            right_offset: 0,
        });
        self.build(data_x, data_y, &left, rng);
        let right_offset = self.nodes.len() - root;
        self.nodes[root] = TreeNode::Split {
            feature,
            threshold,
            right_offset,
        };
        self.build(data_x, data_y, &right, rng);
    }

    fn predict_one(&self, point: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                TreeNode::Leaf { value } => return value,
                TreeNode::Split {
                    feature,
                    threshold,
                    right_offset,
                } => {
                    idx += if point[feature] <= threshold {
                        1
                    } else {
                        right_offset
                    };
                }
            }
        }
    }
}

impl Learner for RandomTree {
    fn add_evidence(&mut self, data_x: &[Vec<f64>], data_y: &[f64]) {
        self.nodes.clear();
        if data_x.is_empty() {
            return;
        }

        let rows: Vec<usize> = (0..data_x.len()).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        self.build(data_x, data_y, &rows, &mut rng);
    }

    fn query(&self, points: &[Vec<f64>]) -> Vec<f64> {
        if self.nodes.is_empty() {
            return vec![0.0; points.len()];
        }
        points.iter().map(|p| self.predict_one(p)).collect()
    }
}

fn all_same(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

fn median(values: impl Iterator<Item = f64>) -> f64 {
    let mut sorted: Vec<f64> = values.collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}
