//! K-means (Lloyd) with k-means++ seeding.
//!
//! Several seeded restarts run back to back from one RNG stream;
//! the fit with the lowest within-cluster sum of squares wins.

use crate::{
    error::{InsightError, InsightResult},
    rng::StageRng,
};
use ndarray::{Array2, ArrayView1};

#[derive(Debug, Clone)]
pub struct KMeans {
    k:        usize,
    max_iter: usize,
    tol:      f64,
    restarts: usize,
}

#[derive(Debug, Clone)]
pub struct KMeansFit {
    /// Cluster per row, renumbered by first appearance (row 0 is cluster 0).
    pub labels:     Vec<usize>,
    pub centroids:  Array2<f64>,
    /// Within-cluster sum of squared distances.
    pub inertia:    f64,
    pub iterations: usize,
}

impl KMeans {
    pub fn new(k: usize) -> Self {
        Self { k, max_iter: 300, tol: 1e-4, restarts: 10 }
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter.max(1);
        self
    }

    /// Convergence tolerance, relative to the mean column variance.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    pub fn with_restarts(mut self, restarts: usize) -> Self {
        self.restarts = restarts.max(1);
        self
    }

    pub fn fit(&self, data: &Array2<f64>, rng: &mut StageRng) -> InsightResult<KMeansFit> {
        let n = data.nrows();
        if self.k == 0 || self.k > n {
            return Err(InsightError::InvalidClusterCount {
                requested: self.k,
                customers: n,
            });
        }
        let tol = self.tol * mean_column_variance(data);

        let mut best: Option<KMeansFit> = None;
        for restart in 0..self.restarts {
            let fit = self.fit_once(data, tol, rng);
            log::debug!(
                "kmeans restart {restart}: inertia={:.4} after {} iterations",
                fit.inertia,
                fit.iterations
            );
            if best.as_ref().map_or(true, |b| fit.inertia < b.inertia) {
                best = Some(fit);
            }
        }
        let mut best = best.ok_or_else(|| anyhow::anyhow!("k-means produced no fit"))?;
        renumber_by_first_appearance(&mut best);
        Ok(best)
    }

    fn fit_once(&self, data: &Array2<f64>, tol: f64, rng: &mut StageRng) -> KMeansFit {
        let mut centroids = self.init_centroids(data, rng);
        let mut iterations = 0;

        for iter in 1..=self.max_iter {
            iterations = iter;
            let labels = assign(data, &centroids).0;
            let updated = self.update_centroids(data, &labels, &centroids);
            let shift: f64 = centroids
                .iter()
                .zip(updated.iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum();
            centroids = updated;
            if shift <= tol {
                break;
            }
        }

        let (labels, inertia) = assign(data, &centroids);
        KMeansFit { labels, centroids, inertia, iterations }
    }

    /// k-means++: first centroid uniform, the rest proportional to D(x)².
    fn init_centroids(&self, data: &Array2<f64>, rng: &mut StageRng) -> Array2<f64> {
        let n = data.nrows();
        let mut centroids = Array2::zeros((self.k, data.ncols()));
        let first = rng.next_index(n);
        centroids.row_mut(0).assign(&data.row(first));

        let mut nearest: Vec<f64> = (0..n)
            .map(|j| squared_distance(&data.row(j), &centroids.row(0)))
            .collect();

        for c in 1..self.k {
            let pick = rng.weighted_index(&nearest);
            centroids.row_mut(c).assign(&data.row(pick));
            for (j, d) in nearest.iter_mut().enumerate() {
                *d = d.min(squared_distance(&data.row(j), &centroids.row(c)));
            }
        }
        centroids
    }

    fn update_centroids(
        &self,
        data: &Array2<f64>,
        labels: &[usize],
        previous: &Array2<f64>,
    ) -> Array2<f64> {
        let mut sums = Array2::<f64>::zeros(previous.raw_dim());
        let mut counts = vec![0usize; self.k];
        for (i, &label) in labels.iter().enumerate() {
            let mut row = sums.row_mut(label);
            row += &data.row(i);
            counts[label] += 1;
        }

        for k in 0..self.k {
            if counts[k] > 0 {
                sums.row_mut(k).mapv_inplace(|x| x / counts[k] as f64);
            } else {
                // Empty cluster: move it onto the point worst served by its centroid.
                let far = (0..data.nrows())
                    .map(|i| (i, squared_distance(&data.row(i), &previous.row(labels[i]))))
                    .max_by(|a, b| a.1.total_cmp(&b.1))
                    .map(|(i, _)| i)
                    .unwrap_or(0);
                log::warn!("kmeans: cluster {k} emptied, reseeding at row {far}");
                sums.row_mut(k).assign(&data.row(far));
            }
        }
        sums
    }
}

fn squared_distance(a: &ArrayView1<'_, f64>, b: &ArrayView1<'_, f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Nearest centroid per row (lowest index on ties) and total inertia.
fn assign(data: &Array2<f64>, centroids: &Array2<f64>) -> (Vec<usize>, f64) {
    let mut inertia = 0.0;
    let labels = data
        .rows()
        .into_iter()
        .map(|point| {
            let mut best = (0, f64::INFINITY);
            for (k, centroid) in centroids.rows().into_iter().enumerate() {
                let d = squared_distance(&point, &centroid);
                if d < best.1 {
                    best = (k, d);
                }
            }
            inertia += best.1;
            best.0
        })
        .collect();
    (labels, inertia)
}

fn mean_column_variance(data: &Array2<f64>) -> f64 {
    if data.ncols() == 0 {
        return 0.0;
    }
    let vars: f64 = data
        .columns()
        .into_iter()
        .map(|col| {
            let m = col.sum() / col.len() as f64;
            col.iter().map(|x| (x - m).powi(2)).sum::<f64>() / col.len() as f64
        })
        .sum();
    vars / data.ncols() as f64
}

fn renumber_by_first_appearance(fit: &mut KMeansFit) {
    let k = fit.centroids.nrows();
    let mut mapping = vec![usize::MAX; k];
    let mut next = 0;
    for &label in &fit.labels {
        if mapping[label] == usize::MAX {
            mapping[label] = next;
            next += 1;
        }
    }
    for m in mapping.iter_mut().filter(|m| **m == usize::MAX) {
        *m = next;
        next += 1;
    }
    let mut centroids = Array2::zeros(fit.centroids.raw_dim());
    for (old, &new) in mapping.iter().enumerate() {
        centroids.row_mut(new).assign(&fit.centroids.row(old));
    }
    fit.centroids = centroids;
    for label in fit.labels.iter_mut() {
        *label = mapping[*label];
    }
}
