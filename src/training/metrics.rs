//! Validation metrics for regression forecasts

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Accuracy of one horizon's predictions on the validation slice
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Coefficient of determination; NaN when the actuals have no variance
    pub r2: f64,
    pub n_samples: usize,
}

impl RegressionMetrics {
    /// Compute MAE, RMSE and R² (1 - SS_res / SS_tot around the actuals' mean)
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Self {
        let n = y_true.len();
        if n == 0 {
            return Self { mae: f64::NAN, rmse: f64::NAN, r2: f64::NAN, n_samples: 0 };
        }

        let errors: Vec<f64> = y_pred.iter().zip(y_true.iter()).map(|(p, t)| p - t).collect();
        let nf = n as f64;

        let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / nf;
        let ss_res: f64 = errors.iter().map(|e| e * e).sum();
        let rmse = (ss_res / nf).sqrt();

        let y_mean = y_true.sum() / nf;
        let ss_tot: f64 = y_true.iter().map(|y| (y - y_mean).powi(2)).sum();
        let r2 = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { f64::NAN };

        Self { mae, rmse, r2, n_samples: n }
    }
}
