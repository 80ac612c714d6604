//! Cluster Engine: standardize feature columns, then partition with k-means.
//!
//! The cluster id is descriptive only: the segment labeler never reads it.

mod kmeans;

pub use kmeans::{KMeans, KMeansFit};

use crate::{
    config::SegmentationConfig,
    error::InsightResult,
    features::FeatureSet,
    rng::{RngBank, StageSlot},
    types::{ClusterId, CustomerId},
};
use ndarray::{Array1, Array2, Axis};
use std::collections::BTreeMap;

/// Column-standardized data plus the parameters used to produce it.
#[derive(Debug, Clone)]
pub struct Standardized {
    pub data:  Array2<f64>,
    pub means: Array1<f64>,
    /// Population standard deviation per column; 1.0 for constant columns.
    pub scales: Array1<f64>,
}

/// Rescale every column to zero mean and unit variance.
/// Constant columns become all zeros rather than NaN.
pub fn standardize(data: &Array2<f64>) -> Standardized {
    let n = data.nrows().max(1) as f64;
    let means = data
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(data.ncols()));
    let mut scales = Array1::<f64>::ones(data.ncols());
    let mut constant = 0usize;
    for (j, col) in data.columns().into_iter().enumerate() {
        let var = col.iter().map(|x| (x - means[j]).powi(2)).sum::<f64>() / n;
        if var > 0.0 {
            scales[j] = var.sqrt();
        } else {
            constant += 1;
        }
    }
    if constant > 0 {
        log::warn!("standardize: {constant} constant feature columns carry no signal");
    }

    let data = (data - &means) / &scales;
    Standardized { data, means, scales }
}

/// Cluster assignment for one segmentation run.
#[derive(Debug, Clone)]
pub struct ClusterOutcome {
    pub assignments: BTreeMap<CustomerId, ClusterId>,
    pub inertia:     f64,
    pub iterations:  usize,
}

/// Partition customers into `k` clusters over standardized features.
/// The same features, `k` and `seed` always produce the same partition.
pub fn cluster(
    features: &FeatureSet,
    k: usize,
    seed: u64,
) -> InsightResult<BTreeMap<CustomerId, ClusterId>> {
    let config = SegmentationConfig {
        cluster_count: k,
        seed,
        ..SegmentationConfig::default()
    };
    Ok(cluster_with(features, &config)?.assignments)
}

pub fn cluster_with(
    features: &FeatureSet,
    config: &SegmentationConfig,
) -> InsightResult<ClusterOutcome> {
    let scaled = standardize(&features.to_matrix());
    let mut rng = RngBank::new(config.seed).for_stage(StageSlot::Clustering);

    let fit = KMeans::new(config.cluster_count)
        .with_max_iter(config.max_iterations)
        .with_tol(config.tolerance)
        .with_restarts(config.restarts)
        .fit(&scaled.data, &mut rng)?;

    log::info!(
        "clustering: {} customers into {} clusters (inertia={:.3}, iterations={})",
        features.len(),
        config.cluster_count,
        fit.inertia,
        fit.iterations
    );

    let assignments = features
        .vectors()
        .keys()
        .cloned()
        .zip(fit.labels.iter().copied())
        .collect();
    Ok(ClusterOutcome {
        assignments,
        inertia: fit.inertia,
        iterations: fit.iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn standardized_columns_have_zero_mean_unit_variance() {
        let data = array![[1.0, 100.0], [2.0, 300.0], [3.0, 500.0]];
        let s = standardize(&data);
        for col in s.data.columns() {
            let m = col.sum() / 3.0;
            let v = col.iter().map(|x| (x - m).powi(2)).sum::<f64>() / 3.0;
            assert!(m.abs() < 1e-12);
            assert!((v - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn constant_column_becomes_zero() {
        let data = array![[5.0, 1.0], [5.0, 2.0]];
        let s = standardize(&data);
        assert!(s.data.column(0).iter().all(|x| *x == 0.0));
    }
}
