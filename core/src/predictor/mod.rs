//! Latent Factor Predictor.
//!
//! 1. Mean-center each customer row.
//! 2. Factorize the centered matrix with a rank-n truncated SVD.
//! 3. Reconstruct and add each row mean back.
//!
//! Scores are unconstrained: they may be negative or exceed any
//! observed amount.

mod svd;

pub use svd::{frobenius_distance, symmetric_eigen, truncated_svd, TruncatedSvd};

use crate::{
    config::{FactorOverflow, RecommendationConfig},
    error::{InsightError, InsightResult},
    matrix::PurchaseMatrix,
    types::{CustomerId, ProductId},
};
use ndarray::{Array1, Array2, Axis};

#[derive(Debug, Clone)]
pub struct PredictedAffinityMatrix {
    customers:   Vec<CustomerId>,
    products:    Vec<ProductId>,
    scores:      Array2<f64>,
    row_means:   Array1<f64>,
    singular_values: Array1<f64>,
}

impl PredictedAffinityMatrix {
    pub fn scores(&self) -> &Array2<f64> {
        &self.scores
    }

    pub fn score(&self, row: usize, col: usize) -> f64 {
        self.scores[[row, col]]
    }

    pub fn row_means(&self) -> &Array1<f64> {
        &self.row_means
    }

    pub fn singular_values(&self) -> &Array1<f64> {
        &self.singular_values
    }

    /// Number of latent factors actually used.
    pub fn rank(&self) -> usize {
        self.singular_values.len()
    }

    pub fn customers(&self) -> &[CustomerId] {
        &self.customers
    }

    pub fn products(&self) -> &[ProductId] {
        &self.products
    }
}

/// Largest factor count the matrix admits: min(customers, products) − 1.
pub fn max_factor_count(matrix: &PurchaseMatrix) -> usize {
    let (m, n) = matrix.shape();
    m.min(n).saturating_sub(1)
}

/// Resolve the rank to use, applying the overflow policy.
pub fn resolve_factor_count(
    matrix: &PurchaseMatrix,
    requested: usize,
    overflow: FactorOverflow,
) -> InsightResult<usize> {
    let max = max_factor_count(matrix);
    if requested == 0 {
        return Err(InsightError::InvalidParameter {
            name:   "factor_count",
            reason: "must be at least 1".into(),
        });
    }
    if requested <= max {
        return Ok(requested);
    }
    match overflow {
        FactorOverflow::Clamp if max > 0 => {
            log::warn!("factor count {requested} exceeds matrix limit, clamping to {max}");
            Ok(max)
        }
        _ => Err(InsightError::InvalidFactorCount { requested, max }),
    }
}

/// Fit with a strict factor count: `n_factors` must be below
/// min(customers, products).
pub fn fit_predictor(
    matrix: &PurchaseMatrix,
    n_factors: usize,
) -> InsightResult<PredictedAffinityMatrix> {
    let rank = resolve_factor_count(matrix, n_factors, FactorOverflow::Fail)?;
    Ok(fit_rank(matrix, rank))
}

pub fn fit_predictor_with(
    matrix: &PurchaseMatrix,
    config: &RecommendationConfig,
) -> InsightResult<PredictedAffinityMatrix> {
    let rank = resolve_factor_count(matrix, config.factor_count, config.factor_overflow)?;
    Ok(fit_rank(matrix, rank))
}

fn fit_rank(matrix: &PurchaseMatrix, rank: usize) -> PredictedAffinityMatrix {
    let values = matrix.values();
    let row_means = values
        .mean_axis(Axis(1))
        .unwrap_or_else(|| Array1::zeros(values.nrows()));
    let mean_column = row_means.view().insert_axis(Axis(1));
    let centered = values - &mean_column;

    let svd = truncated_svd(&centered, rank);
    let scores = svd.reconstruct() + &mean_column;

    log::info!(
        "latent factors: rank {rank} on {}×{} matrix, residual {:.4}",
        values.nrows(),
        values.ncols(),
        frobenius_distance(&centered, &(&scores - &mean_column)),
    );

    PredictedAffinityMatrix {
        customers: matrix.customers().to_vec(),
        products: matrix.products().to_vec(),
        scores,
        row_means,
        singular_values: svd.sigma,
    }
}
