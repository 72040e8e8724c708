//! Ordinary least squares with an intercept.
//!
//! The design is centred and the Gram matrix `XcᵀXc` is diagonalised with
//! nalgebra's `SymmetricEigen`; the coefficients come from its
//! pseudo-inverse. Rank-deficient designs (constant columns, identical rows,
//! collinear features) therefore get the minimum-norm least-squares solution
//! instead of failing.

use nalgebra::{DMatrix, DVector, SymmetricEigen};

use crate::utils::constants::RANK_TOLERANCE;

#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LinearModel {
    /// Fit `targets ≈ intercept + features · coefficients`.
    ///
    /// Returns `None` for an empty design (no rows or no columns), ragged
    /// rows, a length mismatch, or any non-finite input or coefficient.
    pub fn fit(features: &[Vec<f64>], targets: &[f64]) -> Option<Self> {
        let n = features.len();
        if n == 0 || targets.len() != n {
            return None;
        }

        let p = features[0].len();
        if p == 0 || features.iter().any(|row| row.len() != p) {
            return None;
        }
        if features.iter().flatten().chain(targets).any(|v| !v.is_finite()) {
            return None;
        }

        let design = DMatrix::from_fn(n, p, |i, j| features[i][j]);
        let y = DVector::from_column_slice(targets);

        let x_mean = design.row_mean();
        let y_mean = y.mean();
        let centred = DMatrix::from_fn(n, p, |i, j| design[(i, j)] - x_mean[j]);
        let yc = y.add_scalar(-y_mean);

        let gram = centred.transpose() * &centred;
        let rhs = centred.transpose() * yc;

        // Eigenvalues below this fraction of the raw feature energy are zero
        let cutoff = RANK_TOLERANCE * design.norm_squared();
        let eigen = SymmetricEigen::new(gram);

        let mut beta = DVector::<f64>::zeros(p);
        for (k, &lambda) in eigen.eigenvalues.iter().enumerate() {
            if lambda <= cutoff {
                continue;
            }
            let direction = eigen.eigenvectors.column(k);
            beta += direction * (direction.dot(&rhs) / lambda);
        }

        let intercept = y_mean - beta.dot(&x_mean.transpose());
        if !intercept.is_finite() || beta.iter().any(|b| !b.is_finite()) {
            return None;
        }

        Some(Self {
            intercept,
            coefficients: beta.iter().copied().collect(),
        })
    }

    /// Panics if `features` does not have one value per coefficient
    pub fn predict(&self, features: &[f64]) -> f64 {
        assert_eq!(
            features.len(),
            self.coefficients.len(),
            "feature vector length does not match the model"
        );
        let coefficients = DVector::from_column_slice(&self.coefficients);
        self.intercept + coefficients.dot(&DVector::from_column_slice(features))
    }
}

pub fn column_means(rows: &[Vec<f64>]) -> Vec<f64> {
    let Some(first) = rows.first() else {
        return Vec::new();
    };
    let mut sums = vec![0.0; first.len()];
    for row in rows {
        for (sum, value) in sums.iter_mut().zip(row) {
            *sum += value;
        }
    }
    sums.iter().map(|s| s / rows.len() as f64).collect()
}
