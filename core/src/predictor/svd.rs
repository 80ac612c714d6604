//! Truncated SVD through the eigendecomposition of the smaller Gram matrix.
//!
//! For A (m × n) with n ≤ m, AᵀA = V Σ² Vᵀ and U = A V Σ⁻¹; otherwise the
//! roles swap through AAᵀ. The symmetric eigenproblem is solved with cyclic
//! Jacobi rotations, which is deterministic and needs no random start.

use ndarray::{Array1, Array2};

const MAX_SWEEPS: usize = 100;
const RANK_EPS: f64 = 1e-10;

#[derive(Debug, Clone)]
pub struct TruncatedSvd {
    /// m × r left singular vectors.
    pub u:     Array2<f64>,
    /// r singular values, descending.
    pub sigma: Array1<f64>,
    /// r × n right singular vectors (transposed).
    pub vt:    Array2<f64>,
}

impl TruncatedSvd {
    /// U · diag(σ) · Vᵀ.
    pub fn reconstruct(&self) -> Array2<f64> {
        let scaled = &self.u * &self.sigma;
        scaled.dot(&self.vt)
    }
}

/// Top-`rank` singular triplets of `a`. `rank` is capped at min(m, n).
pub fn truncated_svd(a: &Array2<f64>, rank: usize) -> TruncatedSvd {
    let (m, n) = a.dim();
    let rank = rank.min(m).min(n);
    let transpose = n > m;
    let gram = if transpose { a.dot(&a.t()) } else { a.t().dot(a) };

    let (values, vectors) = symmetric_eigen(gram);
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&i, &j| values[j].total_cmp(&values[i]).then(i.cmp(&j)));
    let top = &order[..rank];

    let sigma = Array1::from_iter(top.iter().map(|&i| values[i].max(0.0).sqrt()));
    let basis = Array2::from_shape_fn((vectors.nrows(), rank), |(r, c)| vectors[[r, top[c]]]);

    // Project the other side through A and normalize by σ.
    let other = if transpose { a.t().dot(&basis) } else { a.dot(&basis) };
    // Directions with σ ≈ 0 carry nothing; zero them instead of dividing.
    let cutoff = RANK_EPS * sigma.get(0).copied().unwrap_or(0.0).max(1.0);
    let inverse = sigma.mapv(|s| if s > cutoff { 1.0 / s } else { 0.0 });
    let other = other * &inverse;

    if transpose {
        TruncatedSvd { u: basis, sigma, vt: other.reversed_axes() }
    } else {
        TruncatedSvd { u: other, sigma, vt: basis.reversed_axes() }
    }
}

/// Eigenvalues (unsorted) and column eigenvectors of a symmetric matrix.
pub fn symmetric_eigen(mut a: Array2<f64>) -> (Array1<f64>, Array2<f64>) {
    let n = a.nrows();
    let mut v = Array2::<f64>::eye(n);
    let total: f64 = a.iter().map(|x| x * x).sum();

    for sweep in 0..MAX_SWEEPS {
        let off: f64 = (0..n)
            .flat_map(|p| (0..n).filter(move |&q| q != p).map(move |q| (p, q)))
            .map(|(p, q)| a[[p, q]].powi(2))
            .sum();
        if off <= f64::EPSILON.powi(2) * total || off == 0.0 {
            log::debug!("jacobi: converged after {sweep} sweeps");
            break;
        }
        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[[p, q]];
                if apq == 0.0 {
                    continue;
                }
                let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;
                rotate_columns(&mut a, p, q, c, s);
                rotate_rows(&mut a, p, q, c, s);
                rotate_columns(&mut v, p, q, c, s);
            }
        }
    }

    let values = a.diag().to_owned();
    (values, v)
}

fn rotate_columns(m: &mut Array2<f64>, p: usize, q: usize, c: f64, s: f64) {
    for k in 0..m.nrows() {
        let (mp, mq) = (m[[k, p]], m[[k, q]]);
        m[[k, p]] = c * mp - s * mq;
        m[[k, q]] = s * mp + c * mq;
    }
}

fn rotate_rows(m: &mut Array2<f64>, p: usize, q: usize, c: f64, s: f64) {
    for k in 0..m.ncols() {
        let (mp, mq) = (m[[p, k]], m[[q, k]]);
        m[[p, k]] = c * mp - s * mq;
        m[[q, k]] = s * mp + c * mq;
    }
}

/// Frobenius norm of the difference, for tests and diagnostics.
pub fn frobenius_distance(a: &Array2<f64>, b: &Array2<f64>) -> f64 {
    (a - b).iter().map(|x| x * x).sum::<f64>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn eigen_of_diagonal_is_identity() {
        let (vals, vecs) = symmetric_eigen(array![[3.0, 0.0], [0.0, 1.0]]);
        assert_eq!(vals, array![3.0, 1.0]);
        assert_eq!(vecs, Array2::<f64>::eye(2));
    }

    #[test]
    fn eigen_reconstructs_symmetric_matrix() {
        let a = array![[4.0, 1.0, 2.0], [1.0, 3.0, 0.5], [2.0, 0.5, 5.0]];
        let (vals, vecs) = symmetric_eigen(a.clone());
        let rebuilt = (&vecs * &vals).dot(&vecs.t());
        assert!(frobenius_distance(&a, &rebuilt) < 1e-9);
    }

    #[test]
    fn full_rank_svd_is_exact_tall_and_wide() {
        let tall = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.5]];
        let svd = truncated_svd(&tall, 2);
        assert!(frobenius_distance(&tall, &svd.reconstruct()) < 1e-8);

        let wide = tall.t().to_owned();
        let svd = truncated_svd(&wide, 2);
        assert!(frobenius_distance(&wide, &svd.reconstruct()) < 1e-8);
    }

    #[test]
    fn singular_values_descend() {
        let a = array![[2.0, 0.0, 0.0], [0.0, 5.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0, 0.0]];
        let svd = truncated_svd(&a, 3);
        let sv: Vec<f64> = svd.sigma.to_vec();
        assert!((sv[0] - 5.0).abs() < 1e-12 && (sv[1] - 2.0).abs() < 1e-12 && (sv[2] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn rank_one_truncation_keeps_dominant_direction() {
        let a = array![[50.0, -50.0], [0.0, 0.0], [-100.0, 100.0]];
        let svd = truncated_svd(&a, 1);
        assert!(frobenius_distance(&a, &svd.reconstruct()) < 1e-9);
        assert_eq!(svd.u.dim(), (3, 1));
        assert_eq!(svd.vt.dim(), (1, 2));
    }
}
