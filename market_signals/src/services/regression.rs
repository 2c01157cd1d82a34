//! Least-squares helpers shared by the forecast models and the sentiment fit.

use crate::errors::{AnalysisError, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub intercept: f64,
    pub slope: f64,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let avg = mean(values)?;
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Ordinary least squares of `y` on a single regressor `x`.
pub fn simple_ols(x: &[f64], y: &[f64]) -> Result<LinearFit> {
    if x.len() != y.len() {
        return Err(AnalysisError::ModelFit(format!(
            "regressor has {} values, response has {}",
            x.len(),
            y.len()
        )));
    }
    if x.len() < 2 {
        return Err(AnalysisError::ModelFit(
            "at least two observations are required".to_string(),
        ));
    }

    let x_mean = mean(x).unwrap_or(0.0);
    let y_mean = mean(y).unwrap_or(0.0);
    let sxx: f64 = x.iter().map(|v| (v - x_mean).powi(2)).sum();
    let sxy: f64 = x
        .iter()
        .zip(y)
        .map(|(xv, yv)| (xv - x_mean) * (yv - y_mean))
        .sum();

    if sxx == 0.0 {
        return Err(AnalysisError::ModelFit(
            "regressor has zero variance".to_string(),
        ));
    }

    let slope = sxy / sxx;
    let fit = LinearFit {
        intercept: y_mean - slope * x_mean,
        slope,
    };
    if !fit.intercept.is_finite() || !fit.slope.is_finite() {
        return Err(AnalysisError::ModelFit("non-finite coefficients".to_string()));
    }
    Ok(fit)
}

/// Pearson correlation coefficient; `None` when either side is constant.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let x_mean = mean(x)?;
    let y_mean = mean(y)?;
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (xv, yv) in x.iter().zip(y) {
        let dx = xv - x_mean;
        let dy = yv - y_mean;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    let r = sxy / (sxx.sqrt() * syy.sqrt());
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

/// Solves `min ||X b - y||` through the normal equations.
///
/// `design` holds one row per observation. Gaussian elimination with partial
/// pivoting; a (near-)singular system is reported as a fit failure.
pub fn least_squares(design: &[Vec<f64>], y: &[f64]) -> Result<Vec<f64>> {
    let n = design.len();
    if n == 0 || n != y.len() {
        return Err(AnalysisError::ModelFit(
            "design matrix and response differ in length".to_string(),
        ));
    }
    let k = design[0].len();
    if k == 0 || design.iter().any(|row| row.len() != k) {
        return Err(AnalysisError::ModelFit("ragged design matrix".to_string()));
    }
    if n < k {
        return Err(AnalysisError::ModelFit(format!(
            "{} observations cannot identify {} coefficients",
            n, k
        )));
    }

    // augmented [X'X | X'y]
    let mut a = vec![vec![0.0; k + 1]; k];
    for (row, target) in design.iter().zip(y) {
        for i in 0..k {
            for j in 0..k {
                a[i][j] += row[i] * row[j];
            }
            a[i][k] += row[i] * target;
        }
    }

    let scale = a
        .iter()
        .enumerate()
        .map(|(i, r)| r[i].abs())
        .fold(0.0_f64, f64::max)
        .max(1.0);

    for col in 0..k {
        let pivot = (col..k)
            .max_by(|&p, &q| a[p][col].abs().total_cmp(&a[q][col].abs()))
            .unwrap_or(col);
        if a[pivot][col].abs() <= 1e-12 * scale {
            return Err(AnalysisError::ModelFit(
                "normal equations are singular".to_string(),
            ));
        }
        a.swap(col, pivot);

        for r in (col + 1)..k {
            let factor = a[r][col] / a[col][col];
            if factor != 0.0 {
                for c in col..=k {
                    a[r][c] -= factor * a[col][c];
                }
            }
        }
    }

    let mut coefficients = vec![0.0; k];
    for i in (0..k).rev() {
        let tail: f64 = ((i + 1)..k).map(|j| a[i][j] * coefficients[j]).sum();
        coefficients[i] = (a[i][k] - tail) / a[i][i];
    }

    if coefficients.iter().any(|c| !c.is_finite()) {
        return Err(AnalysisError::ModelFit("non-finite coefficients".to_string()));
    }
    Ok(coefficients)
}
