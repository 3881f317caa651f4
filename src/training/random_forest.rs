//! Random Forest classifier

use super::decision_tree::{argmax, DecisionTree};
use crate::error::{LoanError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Strategy for features considered per split
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MaxFeatures {
    Sqrt,
    All,
}

/// Bagged ensemble of classification trees
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub max_features: MaxFeatures,
    pub bootstrap: bool,
    pub random_state: Option<u64>,
    /// Sorted distinct labels seen during fit
    classes: Vec<f64>,
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new(100)
    }
}

impl RandomForest {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            random_state: None,
            classes: Vec::new(),
        }
    }

    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    fn compute_max_features(&self, n_features: usize) -> usize {
        match self.max_features {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().floor() as usize,
            MaxFeatures::All => n_features,
        }
        .max(1)
    }

    /// Fit the forest. Each tree gets its own seed derived from the base
    /// seed and its index, so results do not depend on thread scheduling.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(LoanError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(LoanError::TrainingError("Cannot fit a forest on empty data".to_string()));
        }
        if self.n_estimators == 0 {
            return Err(LoanError::ConfigError("n_estimators must be positive".to_string()));
        }

        let mut classes: Vec<f64> = y.iter().copied().collect();
        classes.sort_by(|a, b| a.total_cmp(b));
        classes.dedup();
        let y_idx: Array1<usize> = y
            .iter()
            .map(|v| classes.iter().position(|c| c == v).unwrap_or(0))
            .collect();
        let n_classes = classes.len();

        let max_features = self.compute_max_features(n_features);
        let base_seed = self.random_state.unwrap_or(42);

        let trees: Vec<DecisionTree> = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let seed = base_seed.wrapping_add(tree_idx as u64);
                let mut rng = ChaCha8Rng::seed_from_u64(seed);

                let sample_indices: Vec<usize> = if self.bootstrap {
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };
                let x_boot = x.select(Axis(0), &sample_indices);
                let y_boot: Array1<usize> = sample_indices.iter().map(|&i| y_idx[i]).collect();

                let mut tree = DecisionTree::new()
                    .with_max_depth(self.max_depth)
                    .with_max_features(Some(max_features));
                tree.fit_with_rng(&x_boot, &y_boot, n_classes, &mut rng)?;
                Ok(tree)
            })
            .collect::<Result<Vec<_>>>()?;

        self.trees = trees;
        self.classes = classes;

        Ok(self)
    }

    /// Mean of the per-tree leaf class frequencies, columns in `classes()` order
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if self.trees.is_empty() {
            return Err(LoanError::ModelNotFitted);
        }

        let per_tree: Vec<Array2<f64>> = self
            .trees
            .par_iter()
            .map(|tree| tree.predict_proba(x))
            .collect::<Result<Vec<_>>>()?;

        let mut proba = Array2::zeros((x.nrows(), self.classes.len()));
        for p in &per_tree {
            proba += p;
        }
        proba /= self.trees.len() as f64;
        Ok(proba)
    }

    /// Predicted labels; the lower class wins an exact tie
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba
            .rows()
            .into_iter()
            .map(|row| self.classes[argmax(&row)])
            .collect())
    }

    pub fn classes(&self) -> &[f64] {
        &self.classes
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn blobs() -> (Array2<f64>, Array1<f64>) {
        let x = array![
            [1.0, 2.0, 0.1],
            [1.5, 1.8, 0.3],
            [1.2, 2.2, 0.2],
            [0.9, 1.9, 0.5],
            [5.0, 8.0, 0.4],
            [6.0, 9.0, 0.2],
            [5.5, 8.5, 0.1],
            [6.2, 7.9, 0.3],
        ];
        let y = array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        (x, y)
    }

    #[test]
    fn test_forest_classifier() {
        let (x, y) = blobs();
        let mut rf = RandomForest::new(15).with_random_state(7);
        rf.fit(&x, &y).unwrap();

        assert_eq!(rf.n_trees(), 15);
        assert_eq!(rf.classes(), [0.0, 1.0]);
        let predictions = rf.predict(&array![[1.1, 2.0, 0.2], [5.8, 8.4, 0.3]]).unwrap();
        assert_eq!(predictions, array![0.0, 1.0]);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let (x, y) = blobs();
        let mut rf = RandomForest::new(10).with_random_state(3);
        rf.fit(&x, &y).unwrap();

        let proba = rf.predict_proba(&x).unwrap();
        for row in proba.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
            assert!(row.iter().all(|&p| (0.0..=1.0).contains(&p)));
        }
    }

    #[test]
    fn test_same_seed_same_forest() {
        let (x, y) = blobs();
        let query = array![[3.0, 5.0, 0.3]];

        let mut a = RandomForest::new(20).with_random_state(11);
        a.fit(&x, &y).unwrap();
        let mut b = RandomForest::new(20).with_random_state(11);
        b.fit(&x, &y).unwrap();

        assert_eq!(a.predict_proba(&query).unwrap(), b.predict_proba(&query).unwrap());
    }

    #[test]
    fn test_without_bootstrap() {
        let (x, y) = blobs();
        let mut rf = RandomForest::new(5)
            .with_bootstrap(false)
            .with_max_features(MaxFeatures::All);
        rf.fit(&x, &y).unwrap();
        assert_eq!(rf.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_max_features_count() {
        let rf = RandomForest::new(1);
        assert_eq!(rf.compute_max_features(11), 3);
        assert_eq!(rf.compute_max_features(1), 1);
        let rf = RandomForest::new(1).with_max_features(MaxFeatures::All);
        assert_eq!(rf.compute_max_features(11), 11);
    }

    #[test]
    fn test_unfitted() {
        let rf = RandomForest::new(3);
        assert!(matches!(rf.predict(&array![[1.0]]), Err(LoanError::ModelNotFitted)));
    }
}
