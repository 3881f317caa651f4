//! Standard scaling of feature matrices

use crate::error::{LoanError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Fitted centering and scaling per column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub center: Array1<f64>,
    pub scale: Array1<f64>,
}

/// Z-score scaler: (x - mean) / std, population std, zero std replaced by 1
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    params: Option<ScalerParams>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fit(&mut self, x: &Array2<f64>) -> Result<&mut Self> {
        let center = x
            .mean_axis(Axis(0))
            .ok_or_else(|| LoanError::PreprocessingError("Cannot fit scaler on empty data".to_string()))?;
        let scale = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s == 0.0 || !s.is_finite() { 1.0 } else { s });

        self.params = Some(ScalerParams { center, scale });
        Ok(self)
    }

    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let params = self.params.as_ref().ok_or(LoanError::ModelNotFitted)?;
        if x.ncols() != params.center.len() {
            return Err(LoanError::ShapeError {
                expected: format!("{} columns", params.center.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }
        Ok((x - &params.center) / &params.scale)
    }

    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }

    pub fn params(&self) -> Option<&ScalerParams> {
        self.params.as_ref()
    }

    pub fn is_fitted(&self) -> bool {
        self.params.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_standard_scaler_population_std() {
        let x = array![[1.0, 5.0], [3.0, 5.0]];
        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&x).unwrap();

        assert_eq!(scaled, array![[-1.0, 0.0], [1.0, 0.0]]);
        let params = scaler.params().unwrap();
        assert_eq!(params.scale[1], 1.0);
    }

    #[test]
    fn test_transform_uses_training_statistics() {
        let mut scaler = StandardScaler::new();
        scaler.fit(&array![[0.0], [2.0]]).unwrap();
        let scaled = scaler.transform(&array![[4.0]]).unwrap();
        assert!((scaled[[0, 0]] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_errors() {
        let scaler = StandardScaler::new();
        assert!(matches!(scaler.transform(&array![[1.0]]), Err(LoanError::ModelNotFitted)));

        let mut scaler = StandardScaler::new();
        assert!(scaler.fit(&Array2::zeros((0, 2))).is_err());

        scaler.fit(&array![[1.0, 2.0]]).unwrap();
        assert!(matches!(
            scaler.transform(&array![[1.0]]),
            Err(LoanError::ShapeError { .. })
        ));
    }
}
