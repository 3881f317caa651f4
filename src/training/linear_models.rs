//! Linear classification models

use crate::error::{LoanError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Binary logistic regression fit by batch gradient descent with L2 penalty.
/// Labels must be 0 or 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub coefficients: Option<Array1<f64>>,
    pub intercept: Option<f64>,
    pub fit_intercept: bool,
    /// L2 regularization strength
    pub alpha: f64,
    pub max_iter: usize,
    /// Stop once the gradient norm drops below this
    pub tol: f64,
    pub learning_rate: f64,
    /// Iterations run by the last fit
    pub n_iter: usize,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LogisticRegression {
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: None,
            fit_intercept: true,
            alpha: 0.0001,
            max_iter: 1000,
            tol: 1e-6,
            learning_rate: 0.1,
            n_iter: 0,
        }
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    fn sigmoid(z: &Array1<f64>) -> Array1<f64> {
        z.mapv(|v| 1.0 / (1.0 + (-v).exp()))
    }

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
            return Err(LoanError::TrainingError("Cannot fit on empty data".to_string()));
        }
        if y.iter().any(|&v| v != 0.0 && v != 1.0) {
            return Err(LoanError::ValidationError(
                "Logistic regression labels must be 0 or 1".to_string(),
            ));
        }

        let mut weights = Array1::zeros(n_features);
        let mut bias = 0.0;
        let lr = self.learning_rate;
        let alpha = self.alpha;
        self.n_iter = 0;

        for _ in 0..self.max_iter {
            let linear = x.dot(&weights) + bias;
            let predictions = Self::sigmoid(&linear);

            let errors = &predictions - y;
            let dw = (x.t().dot(&errors) / n_samples as f64) + (alpha * &weights);
            let db = if self.fit_intercept {
                errors.mean().unwrap_or(0.0)
            } else {
                0.0
            };

            self.n_iter += 1;
            let grad_norm = (dw.mapv(|v| v * v).sum() + db * db).sqrt();
            if grad_norm < self.tol {
                break;
            }

            weights = weights - lr * dw;
            bias -= lr * db;
        }

        self.coefficients = Some(weights);
        self.intercept = Some(bias);
        Ok(self)
    }

    /// Probability of the positive class per sample
    pub fn decision_probability(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self.coefficients.as_ref().ok_or(LoanError::ModelNotFitted)?;
        if x.ncols() != coefficients.len() {
            return Err(LoanError::ShapeError {
                expected: format!("{} features", coefficients.len()),
                actual: format!("{} features", x.ncols()),
            });
        }
        let intercept = self.intercept.unwrap_or(0.0);
        Ok(Self::sigmoid(&(x.dot(coefficients) + intercept)))
    }

    /// Two-column probabilities `(1 - p, p)`
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let p = self.decision_probability(x)?.insert_axis(Axis(1));
        let q = p.mapv(|v| 1.0 - v);
        Ok(ndarray::concatenate(Axis(1), &[q.view(), p.view()])?)
    }

    /// Positive class when p > 0.5; an exact 0.5 goes to class 0
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.decision_probability(x)?;
        Ok(proba.mapv(|p| if p > 0.5 { 1.0 } else { 0.0 }))
    }

    pub fn is_fitted(&self) -> bool {
        self.coefficients.is_some()
    }
}
