//! Penalised least squares regression
//!
//! Models accumulate observations into [`NormalEquations`] one row at a time
//! and solve once all rows are in. The ridge penalty per coefficient keeps the
//! system solvable when feature columns are collinear (for example a weekly
//! Fourier term sampled once per week is constant and duplicates the
//! intercept).

use crate::{MathError, Result};

/// Pivots smaller than this are treated as a singular system
const PIVOT_EPSILON: f64 = 1e-12;

/// Running `XᵀX` / `Xᵀy` accumulator for a fixed number of features
#[derive(Debug, Clone)]
pub struct NormalEquations {
    features: usize,
    xtx: Vec<Vec<f64>>,
    xty: Vec<f64>,
    rows: usize,
}

impl NormalEquations {
    /// Create an empty accumulator for `features` columns
    pub fn new(features: usize) -> Result<Self> {
        if features == 0 {
            return Err(MathError::InvalidInput(
                "Regression needs at least one feature column".to_string(),
            ));
        }

        Ok(Self {
            features,
            xtx: vec![vec![0.0; features]; features],
            xty: vec![0.0; features],
            rows: 0,
        })
    }

    /// Add one observation
    pub fn accumulate(&mut self, row: &[f64], target: f64) -> Result<()> {
        if row.len() != self.features {
            return Err(MathError::InvalidInput(format!(
                "Row has {} features, expected {}",
                row.len(),
                self.features
            )));
        }
        if !target.is_finite() || row.iter().any(|v| !v.is_finite()) {
            return Err(MathError::InvalidInput(
                "Regression inputs must be finite".to_string(),
            ));
        }

        for i in 0..self.features {
            self.xty[i] += row[i] * target;
            for j in i..self.features {
                self.xtx[i][j] += row[i] * row[j];
            }
        }
        self.rows += 1;

        Ok(())
    }

    /// Number of observations accumulated so far
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Solve `(XᵀX + diag(penalties)) β = Xᵀy`
    pub fn solve(&self, penalties: &[f64]) -> Result<LeastSquares> {
        if penalties.len() != self.features {
            return Err(MathError::InvalidInput(format!(
                "Got {} penalties for {} features",
                penalties.len(),
                self.features
            )));
        }
        if penalties.iter().any(|p| *p < 0.0 || !p.is_finite()) {
            return Err(MathError::InvalidInput(
                "Penalties must be finite and non-negative".to_string(),
            ));
        }
        if self.rows == 0 {
            return Err(MathError::InsufficientData(
                "No observations accumulated".to_string(),
            ));
        }

        // Only the upper triangle was accumulated
        let mut matrix = vec![vec![0.0; self.features]; self.features];
        for i in 0..self.features {
            for j in i..self.features {
                matrix[i][j] = self.xtx[i][j];
                matrix[j][i] = self.xtx[i][j];
            }
            matrix[i][i] += penalties[i];
        }

        let coefficients = solve_linear_system(matrix, self.xty.clone())?;
        Ok(LeastSquares { coefficients })
    }
}

/// Fitted linear model
#[derive(Debug, Clone, PartialEq)]
pub struct LeastSquares {
    coefficients: Vec<f64>,
}

impl LeastSquares {
    /// Fit a penalised least squares model in one go
    pub fn fit(design: &[Vec<f64>], targets: &[f64], penalties: &[f64]) -> Result<Self> {
        if design.len() != targets.len() {
            return Err(MathError::InvalidInput(format!(
                "Design has {} rows but {} targets were given",
                design.len(),
                targets.len()
            )));
        }
        let features = design.first().map(Vec::len).ok_or_else(|| {
            MathError::InsufficientData("Design matrix is empty".to_string())
        })?;

        let mut equations = NormalEquations::new(features)?;
        for (row, &target) in design.iter().zip(targets) {
            equations.accumulate(row, target)?;
        }
        equations.solve(penalties)
    }

    /// Fitted coefficients, in feature order
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Evaluate the model for one feature row
    pub fn predict(&self, row: &[f64]) -> Result<f64> {
        if row.len() != self.coefficients.len() {
            return Err(MathError::InvalidInput(format!(
                "Row has {} features, model has {} coefficients",
                row.len(),
                self.coefficients.len()
            )));
        }

        Ok(row
            .iter()
            .zip(&self.coefficients)
            .map(|(x, beta)| x * beta)
            .sum())
    }
}

/// Gaussian elimination with partial pivoting
pub fn solve_linear_system(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();
    if a.len() != n || a.iter().any(|row| row.len() != n) {
        return Err(MathError::InvalidInput(
            "Linear system must be square and match the right-hand side".to_string(),
        ));
    }

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);

        if a[pivot_row][col].abs() < PIVOT_EPSILON {
            return Err(MathError::CalculationError(format!(
                "Singular system: no usable pivot in column {}",
                col
            )));
        }

        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }

    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solve_linear_system() {
        // 2x + y = 5, x - y = 1
        let x = solve_linear_system(vec![vec![2.0, 1.0], vec![1.0, -1.0]], vec![5.0, 1.0]).unwrap();
        assert!((x[0] - 2.0).abs() < 1e-9);
        assert!((x[1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_singular_system() {
        let result = solve_linear_system(vec![vec![1.0, 2.0], vec![2.0, 4.0]], vec![1.0, 2.0]);
        assert!(matches!(result, Err(MathError::CalculationError(_))));
    }

    #[test]
    fn test_perfect_line() {
        let design: Vec<Vec<f64>> = (0..5).map(|i| vec![1.0, i as f64]).collect();
        let targets: Vec<f64> = (0..5).map(|i| 10.0 + 2.0 * i as f64).collect();

        let model = LeastSquares::fit(&design, &targets, &[0.0, 0.0]).unwrap();
        assert!((model.coefficients()[0] - 10.0).abs() < 1e-9);
        assert!((model.coefficients()[1] - 2.0).abs() < 1e-9);
        assert!((model.predict(&[1.0, 5.0]).unwrap() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_penalty_resolves_duplicate_column() {
        // Second column duplicates the intercept; without a penalty this is singular
        let design: Vec<Vec<f64>> = (0..4).map(|_| vec![1.0, 1.0]).collect();
        let targets = vec![3.0; 4];

        assert!(LeastSquares::fit(&design, &targets, &[0.0, 0.0]).is_err());

        let model = LeastSquares::fit(&design, &targets, &[0.0, 0.01]).unwrap();
        assert!(model.coefficients()[1].abs() < 1e-6);
        assert!((model.predict(&[1.0, 1.0]).unwrap() - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_non_finite_rows() {
        let mut equations = NormalEquations::new(2).unwrap();
        assert!(equations.accumulate(&[1.0, f64::NAN], 1.0).is_err());
        assert!(equations.accumulate(&[1.0], 1.0).is_err());
        assert_eq!(equations.rows(), 0);
    }
}
