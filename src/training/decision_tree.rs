//! CART classification tree

use crate::error::{LoanError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::index::sample;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf holding the class frequencies of its training samples
    Leaf {
        distribution: Vec<f64>,
        n_samples: usize,
    },
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
        impurity: f64,
    },
}

/// Gini impurity of a class histogram
fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let n = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| (c as f64 / n).powi(2))
        .sum::<f64>()
}

/// Classification tree over class indices `0..n_classes`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    pub max_depth: Option<usize>,
    /// Features sampled at each split; all features when `None`
    pub max_features: Option<usize>,
    n_features: usize,
    n_classes: usize,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            max_features: None,
            n_features: 0,
            n_classes: 0,
        }
    }

    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    /// Fit with a fixed seed for the per-split feature sampling
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<usize>, n_classes: usize, seed: u64) -> Result<&mut Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.fit_with_rng(x, y, n_classes, &mut rng)
    }

    pub fn fit_with_rng(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<usize>,
        n_classes: usize,
        rng: &mut ChaCha8Rng,
    ) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(LoanError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 || n_features == 0 {
            return Err(LoanError::TrainingError("Cannot fit a tree on empty data".to_string()));
        }
        if let Some(&bad) = y.iter().find(|&&c| c >= n_classes) {
            return Err(LoanError::ValidationError(format!(
                "Class index {} out of range for {} classes",
                bad, n_classes
            )));
        }

        self.n_features = n_features;
        self.n_classes = n_classes;

        let indices: Vec<usize> = (0..n_samples).collect();
        self.root = Some(self.build_tree(x, y, &indices, 0, rng));

        Ok(self)
    }

    fn class_counts(&self, y: &Array1<usize>, indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &i in indices {
            counts[y[i]] += 1;
        }
        counts
    }

    fn leaf(&self, counts: &[usize], n_samples: usize) -> TreeNode {
        let n = n_samples.max(1) as f64;
        TreeNode::Leaf {
            distribution: counts.iter().map(|&c| c as f64 / n).collect(),
            n_samples,
        }
    }

    fn build_tree(
        &self,
        x: &Array2<f64>,
        y: &Array1<usize>,
        indices: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let n_samples = indices.len();
        let counts = self.class_counts(y, indices);
        let is_pure = counts.iter().filter(|&&c| c > 0).count() <= 1;

        let should_stop = n_samples < 2
            || self.max_depth.map_or(false, |d| depth >= d)
            || is_pure;
        if should_stop {
            return self.leaf(&counts, n_samples);
        }

        let parent_impurity = gini(&counts, n_samples);
        let features = self.sample_features(rng);

        let Some((feature_idx, threshold)) =
            self.find_best_split(x, y, indices, &counts, parent_impurity, &features)
        else {
            return self.leaf(&counts, n_samples);
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, feature_idx]] <= threshold);

        let left = Box::new(self.build_tree(x, y, &left_indices, depth + 1, rng));
        let right = Box::new(self.build_tree(x, y, &right_indices, depth + 1, rng));

        TreeNode::Split {
            feature_idx,
            threshold,
            left,
            right,
            n_samples,
            impurity: parent_impurity,
        }
    }

    fn sample_features(&self, rng: &mut ChaCha8Rng) -> Vec<usize> {
        match self.max_features {
            Some(k) if k < self.n_features => {
                let mut features = sample(rng, self.n_features, k.max(1)).into_vec();
                features.sort_unstable();
                features
            }
            _ => (0..self.n_features).collect(),
        }
    }

    /// Best (feature, threshold) over the candidate features, found with
    /// one sorted sweep per feature
    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<usize>,
        indices: &[usize],
        parent_counts: &[usize],
        parent_impurity: f64,
        features: &[usize],
    ) -> Option<(usize, f64)> {
        let n = indices.len();
        let mut best: Option<(usize, f64, f64)> = None;

        for &feature_idx in features {
            let mut column: Vec<(f64, usize)> = indices
                .iter()
                .map(|&i| (x[[i, feature_idx]], y[i]))
                .collect();
            column.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

            let mut left = vec![0usize; self.n_classes];
            let mut right = parent_counts.to_vec();

            for pos in 0..n - 1 {
                let (value, class) = column[pos];
                left[class] += 1;
                right[class] -= 1;

                let next = column[pos + 1].0;
                if next <= value {
                    continue;
                }
                let n_left = pos + 1;
                let n_right = n - n_left;

                let weighted = (n_left as f64 * gini(&left, n_left)
                    + n_right as f64 * gini(&right, n_right))
                    / n as f64;
                let gain = parent_impurity - weighted;
                if gain > 1e-12 && best.map_or(true, |(_, _, g)| gain > g) {
                    best = Some((feature_idx, split_point(value, next), gain));
                }
            }
        }

        best.map(|(feature_idx, threshold, _)| (feature_idx, threshold))
    }

    /// Class probability rows, one per sample
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let root = self.root.as_ref().ok_or(LoanError::ModelNotFitted)?;
        self.check_features(x)?;

        let mut proba = Array2::zeros((x.nrows(), self.n_classes));
        for (i, sample) in x.rows().into_iter().enumerate() {
            let distribution = Self::leaf_distribution(root, &sample);
            for (k, &p) in distribution.iter().enumerate() {
                proba[[i, k]] = p;
            }
        }
        Ok(proba)
    }

    /// Most frequent class index per sample, lowest index on ties
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<usize>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.rows().into_iter().map(|row| argmax(&row)).collect())
    }

    fn leaf_distribution<'a>(node: &'a TreeNode, sample: &ArrayView1<f64>) -> &'a [f64] {
        match node {
            TreeNode::Leaf { distribution, .. } => distribution,
            TreeNode::Split {
                feature_idx,
                threshold,
                left,
                right,
                ..
            } => {
                if sample[*feature_idx] <= *threshold {
                    Self::leaf_distribution(left, sample)
                } else {
                    Self::leaf_distribution(right, sample)
                }
            }
        }
    }

    fn check_features(&self, x: &Array2<f64>) -> Result<()> {
        if x.ncols() != self.n_features {
            return Err(LoanError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(())
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn get_depth(&self) -> usize {
        fn depth(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => 1 + depth(left).max(depth(right)),
            }
        }
        self.root.as_ref().map_or(0, depth)
    }

    pub fn get_n_leaves(&self) -> usize {
        fn leaves(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => leaves(left) + leaves(right),
            }
        }
        self.root.as_ref().map_or(0, leaves)
    }
}

/// Threshold strictly below `next`, so `<= threshold` keeps `value` left
/// and sends `next` right even for adjacent floats
fn split_point(value: f64, next: f64) -> f64 {
    let mid = value + (next - value) / 2.0;
    if mid >= next {
        value
    } else {
        mid
    }
}

/// Index of the largest value, the first one winning ties
pub(crate) fn argmax(values: &ArrayView1<f64>) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}
