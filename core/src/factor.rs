//! Correlated latent-factor engine.
//!
//! Turns independent standard-normal draws into samples with a prescribed
//! correlation structure:
//!
//!   Σ = D·R·D     with D = diag(σ)
//!   L·Lᵗ = Σ      (Cholesky, L lower-triangular)
//!   X = Z·Lᵗ + μ  with Z ~ N(0, I)
//!
//! Every latent profile in the population comes through here, once per
//! cohort, with a shared R and σ and a cohort-specific μ. Both the
//! assessment scores and the betting behaviour are functions of those
//! profiles, which is the only coupling between the two tables.

use crate::{error::ConfigError, rng::StageRng};
use serde::{Deserialize, Serialize};

const SYMMETRY_TOLERANCE: f64 = 1e-9;

/// Dense row-major square matrix. Small (k ≤ ~10), so no BLAS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    n: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, ConfigError> {
        let n = rows.len();
        let mut data = Vec::with_capacity(n * n);
        for (row, values) in rows.iter().enumerate() {
            if values.len() != n {
                return Err(ConfigError::NotSquare {
                    rows: n,
                    row,
                    len: values.len(),
                });
            }
            data.extend_from_slice(values);
        }
        Ok(Self { n, data })
    }

    pub fn diagonal(values: &[f64]) -> Self {
        let n = values.len();
        let mut data = vec![0.0; n * n];
        for (i, v) in values.iter().enumerate() {
            data[i * n + i] = *v;
        }
        Self { n, data }
    }

    pub fn dim(&self) -> usize {
        self.n
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.n + col]
    }

    fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.n + col] = value;
    }

    pub fn mul(&self, other: &Matrix) -> Matrix {
        let n = self.n;
        let mut out = vec![0.0; n * n];
        for i in 0..n {
            for k in 0..n {
                let a = self.get(i, k);
                if a == 0.0 {
                    continue;
                }
                for j in 0..n {
                    out[i * n + j] += a * other.get(k, j);
                }
            }
        }
        Matrix { n, data: out }
    }

    pub fn transpose(&self) -> Matrix {
        let n = self.n;
        let mut out = Matrix {
            n,
            data: vec![0.0; n * n],
        };
        for i in 0..n {
            for j in 0..n {
                out.set(j, i, self.get(i, j));
            }
        }
        out
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.data.chunks(self.n.max(1)).map(|r| r.to_vec()).collect()
    }
}

/// A checked correlation matrix: square, symmetric, unit diagonal.
/// Positive-definiteness is checked when it is combined with σ.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix(Matrix);

impl CorrelationMatrix {
    pub fn new(rows: &[Vec<f64>]) -> Result<Self, ConfigError> {
        let m = Matrix::from_rows(rows)?;
        for i in 0..m.dim() {
            let d = m.get(i, i);
            if (d - 1.0).abs() > SYMMETRY_TOLERANCE {
                return Err(ConfigError::NonUnitDiagonal { index: i, value: d });
            }
            for j in (i + 1)..m.dim() {
                if (m.get(i, j) - m.get(j, i)).abs() > SYMMETRY_TOLERANCE {
                    return Err(ConfigError::NotSymmetric { row: i, col: j });
                }
            }
        }
        Ok(Self(m))
    }

    pub fn dim(&self) -> usize {
        self.0.dim()
    }

    pub fn matrix(&self) -> &Matrix {
        &self.0
    }

    /// Σ = D·R·D.
    pub fn covariance(&self, std_devs: &[f64]) -> Result<Matrix, ConfigError> {
        if std_devs.len() != self.dim() {
            return Err(ConfigError::DimensionMismatch {
                what: "latent standard deviations",
                expected: self.dim(),
                actual: std_devs.len(),
            });
        }
        let d = Matrix::diagonal(std_devs);
        Ok(d.mul(&self.0).mul(&d))
    }
}

/// Cholesky–Banachiewicz factorisation. Returns lower-triangular L with
/// L·Lᵗ = a, or `NotPositiveDefinite` naming the failing pivot.
pub fn cholesky(a: &Matrix) -> Result<Matrix, ConfigError> {
    let n = a.dim();
    let mut l = Matrix {
        n,
        data: vec![0.0; n * n],
    };
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a.get(i, j);
            for k in 0..j {
                sum -= l.get(i, k) * l.get(j, k);
            }
            if i == j {
                if sum <= 0.0 || !sum.is_finite() {
                    return Err(ConfigError::NotPositiveDefinite { pivot: i });
                }
                l.set(i, i, sum.sqrt());
            } else {
                l.set(i, j, sum / l.get(j, j));
            }
        }
    }
    Ok(l)
}

/// Multivariate normal sampler with a fixed Cholesky factor.
/// Build once per (R, σ); reuse with different means.
#[derive(Debug, Clone)]
pub struct CorrelatedSampler {
    lower: Matrix,
}

impl CorrelatedSampler {
    pub fn new(correlation: &CorrelationMatrix, std_devs: &[f64]) -> Result<Self, ConfigError> {
        let covariance = correlation.covariance(std_devs)?;
        let lower = cholesky(&covariance)?;
        Ok(Self { lower })
    }

    pub fn dim(&self) -> usize {
        self.lower.dim()
    }

    /// Draw one k-vector: x = L·z + μ.
    pub fn sample_one(&self, means: &[f64], rng: &mut StageRng) -> Vec<f64> {
        let k = self.dim();
        debug_assert_eq!(means.len(), k);
        let z: Vec<f64> = (0..k).map(|_| rng.standard_normal()).collect();
        (0..k)
            .map(|i| {
                let mut x = means[i];
                for (j, zj) in z.iter().enumerate().take(i + 1) {
                    x += self.lower.get(i, j) * zj;
                }
                x
            })
            .collect()
    }

    /// Draw an n×k sample.
    pub fn sample(
        &self,
        n: usize,
        means: &[f64],
        rng: &mut StageRng,
    ) -> Result<Vec<Vec<f64>>, ConfigError> {
        if means.len() != self.dim() {
            return Err(ConfigError::DimensionMismatch {
                what: "latent means",
                expected: self.dim(),
                actual: means.len(),
            });
        }
        Ok((0..n).map(|_| self.sample_one(means, rng)).collect())
    }
}

/// One-shot form of the engine: n samples with correlation R, means μ and
/// standard deviations σ.
pub fn generate_correlated(
    n: usize,
    correlation: &CorrelationMatrix,
    means: &[f64],
    std_devs: &[f64],
    rng: &mut StageRng,
) -> Result<Vec<Vec<f64>>, ConfigError> {
    CorrelatedSampler::new(correlation, std_devs)?.sample(n, means, rng)
}
