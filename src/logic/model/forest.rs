//! Random Forest
//!
//! Bagged Gini decision trees. Each split examines `sqrt(n_features)`
//! non-constant candidate features. Trees are grown with an explicit work
//! stack so deep trees never touch the call stack.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::SamplerResult;
use super::classifier::{check_fit_input, check_predict_input, Classifier};

pub const N_ESTIMATORS: usize = 15;
pub const MAX_DEPTH: usize = 4000;
pub const MIN_SAMPLES_SPLIT: usize = 3;

// ============================================================================
// TREE
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "lowercase")]
enum Node {
    Leaf { class: usize },
    Split { feature: usize, threshold: f32, left: usize, right: usize },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

struct SplitChoice {
    feature: usize,
    threshold: f32,
    impurity: f64,
}

/// Pending node: slot in `nodes`, its samples, its depth
struct Pending {
    slot: usize,
    samples: Vec<usize>,
    depth: usize,
}

fn class_counts(y: &Array1<usize>, samples: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0; n_classes];
    for &i in samples {
        counts[y[i]] += 1;
    }
    counts
}

/// Most frequent class; ties go to the lowest id
fn majority(counts: &[usize]) -> usize {
    let mut best = 0;
    for (class, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = class;
        }
    }
    best
}

/// Sum of n * gini over both halves, from class counts
fn weighted_gini(left: &[usize], n_left: usize, right: &[usize], n_right: usize) -> f64 {
    let part = |counts: &[usize], n: usize| -> f64 {
        if n == 0 {
            return 0.0;
        }
        let sq: f64 = counts.iter().map(|&c| (c as f64) * (c as f64)).sum();
        n as f64 - sq / n as f64
    };
    part(left, n_left) + part(right, n_right)
}

/// Best threshold on `feature`, or None when it is constant over `samples`
fn best_threshold(
    x: &Array2<f32>,
    y: &Array1<usize>,
    samples: &[usize],
    feature: usize,
    n_classes: usize,
) -> Option<SplitChoice> {
    let mut pairs: Vec<(f32, usize)> = samples.iter().map(|&i| (x[[i, feature]], y[i])).collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

    let first = pairs.first()?.0;
    let last = pairs.last()?.0;
    if first == last {
        return None;
    }

    let mut left = vec![0usize; n_classes];
    let mut right = vec![0usize; n_classes];
    for &(_, c) in &pairs {
        right[c] += 1;
    }

    let n = pairs.len();
    let mut best: Option<SplitChoice> = None;
    for k in 0..n - 1 {
        let (value, class) = pairs[k];
        left[class] += 1;
        right[class] -= 1;
        let next = pairs[k + 1].0;
        if value == next {
            continue;
        }
        let impurity = weighted_gini(&left, k + 1, &right, n - k - 1);
        if best.as_ref().map_or(true, |b| impurity < b.impurity) {
            best = Some(SplitChoice { feature, threshold: value + (next - value) / 2.0, impurity });
        }
    }
    best
}

impl DecisionTree {
    fn grow(
        x: &Array2<f32>,
        y: &Array1<usize>,
        samples: Vec<usize>,
        n_classes: usize,
        rng: &mut StdRng,
    ) -> Self {
        let n_features = x.ncols();
        let mtry = ((n_features as f64).sqrt() as usize).max(1);
        let mut features: Vec<usize> = (0..n_features).collect();

        let mut nodes = vec![Node::Leaf { class: 0 }];
        let mut stack = vec![Pending { slot: 0, samples, depth: 0 }];

        while let Some(Pending { slot, samples, depth }) = stack.pop() {
            let counts = class_counts(y, &samples, n_classes);
            let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;

            if pure || depth >= MAX_DEPTH || samples.len() < MIN_SAMPLES_SPLIT {
                nodes[slot] = Node::Leaf { class: majority(&counts) };
                continue;
            }

            // Keep drawing until mtry non-constant features have been tried
            features.shuffle(rng);
            let mut tried = 0;
            let mut best: Option<SplitChoice> = None;
            for &feature in &features {
                if tried >= mtry {
                    break;
                }
                if let Some(choice) = best_threshold(x, y, &samples, feature, n_classes) {
                    tried += 1;
                    if best.as_ref().map_or(true, |b| choice.impurity < b.impurity) {
                        best = Some(choice);
                    }
                }
            }

            let Some(choice) = best else {
                nodes[slot] = Node::Leaf { class: majority(&counts) };
                continue;
            };

            let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = samples
                .iter()
                .partition(|&&i| x[[i, choice.feature]] <= choice.threshold);

            let left = nodes.len();
            nodes.push(Node::Leaf { class: 0 });
            let right = nodes.len();
            nodes.push(Node::Leaf { class: 0 });

            nodes[slot] = Node::Split {
                feature: choice.feature,
                threshold: choice.threshold,
                left,
                right,
            };
            stack.push(Pending { slot: right, samples: right_samples, depth: depth + 1 });
            stack.push(Pending { slot: left, samples: left_samples, depth: depth + 1 });
        }

        Self { nodes }
    }

    fn predict_row(&self, row: ArrayView1<f32>) -> usize {
        let mut at = 0;
        loop {
            match self.nodes.get(at) {
                Some(Node::Leaf { class }) => return *class,
                Some(Node::Split { feature, threshold, left, right }) => {
                    at = if row[*feature] <= *threshold { *left } else { *right };
                }
                None => return 0,
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

// ============================================================================
// FOREST
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_features: usize,
    n_classes: usize,
    #[serde(default)]
    seed: Option<u64>,
}

impl RandomForest {
    pub fn new(seed: Option<u64>) -> Self {
        Self { trees: Vec::new(), n_features: 0, n_classes: 0, seed }
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }
}

impl Classifier for RandomForest {
    fn fit(&mut self, x: &Array2<f32>, y: &Array1<usize>, n_classes: usize) -> SamplerResult<()> {
        check_fit_input(x, y, n_classes)?;
        let n = x.nrows();

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let tree_seeds: Vec<u64> = (0..N_ESTIMATORS).map(|_| rng.next_u64()).collect();

        self.trees = tree_seeds
            .into_par_iter()
            .map(|seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                DecisionTree::grow(x, y, bootstrap, n_classes, &mut rng)
            })
            .collect();
        self.n_features = x.ncols();
        self.n_classes = n_classes;

        log::debug!(
            "Grew {} trees ({} nodes total)",
            self.trees.len(),
            self.trees.iter().map(DecisionTree::node_count).sum::<usize>()
        );
        Ok(())
    }

    fn predict(&self, x: ArrayView2<f32>) -> SamplerResult<Vec<usize>> {
        check_predict_input(&x, self.n_features)?;
        Ok(x
            .rows()
            .into_iter()
            .map(|row| {
                let mut votes = vec![0usize; self.n_classes.max(1)];
                for tree in &self.trees {
                    let class = tree.predict_row(row);
                    if class < votes.len() {
                        votes[class] += 1;
                    }
                }
                majority(&votes)
            })
            .collect())
    }
}
