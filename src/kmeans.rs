//! K-means clustering of the embedded points.

use log::{debug, info};
use ndarray::{Array2, ArrayView1};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};

/// Allowed range for the number of groups.
pub const MIN_CLUSTERS: usize = 2;
pub const MAX_CLUSTERS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KmeansParams {
    /// Number of k-means++ restarts; the lowest inertia wins.
    pub n_init: usize,
    pub max_iter: usize,
    /// Stop once the total centroid movement drops below this.
    pub tol: f64,
    pub seed: u64,
}

impl Default for KmeansParams {
    fn default() -> Self {
        Self {
            n_init: 10,
            max_iter: 300,
            tol: 1e-4,
            seed: 42,
        }
    }
}

impl KmeansParams {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Result of a k-means fit.
#[derive(Debug, Clone, PartialEq)]
pub struct KmeansFit {
    /// Cluster id in `0..k` for every point, in point order.
    pub assignments: Vec<usize>,
    /// k × dims centroid coordinates.
    pub centroids: Array2<f64>,
    /// Within-cluster sum of squared distances. Saturates to infinity when
    /// coordinates are beyond about 1e154; assignments are unaffected.
    pub inertia: f64,
    pub iterations: usize,
}

impl KmeansFit {
    pub fn n_clusters(&self) -> usize {
        self.centroids.nrows()
    }

    /// Number of points in each cluster, indexed by cluster id.
    pub fn cluster_sizes(&self) -> Vec<usize> {
        cluster_sizes(&self.assignments, self.n_clusters())
    }
}

/// Count members per cluster id; ids outside `0..k` are ignored.
pub fn cluster_sizes(assignments: &[usize], k: usize) -> Vec<usize> {
    let mut sizes = vec![0; k];
    for &c in assignments {
        if c < k {
            sizes[c] += 1;
        }
    }
    sizes
}

/// Squared Euclidean distance between two points
#[inline]
fn sq_dist(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Nearest centroid for every point; ties go to the lowest centroid index.
fn assign(data: &Array2<f64>, centroids: &Array2<f64>) -> (Vec<usize>, f64) {
    let mut inertia = 0.0;
    let assignments = data
        .outer_iter()
        .map(|point| {
            let mut best_cluster = 0;
            let mut best_dist = f64::INFINITY;
            for (ci, c) in centroids.outer_iter().enumerate() {
                let d = sq_dist(point, c);
                if d < best_dist {
                    best_dist = d;
                    best_cluster = ci;
                }
            }
            inertia += best_dist;
            best_cluster
        })
        .collect();
    (assignments, inertia)
}

/// k-means++ seeding: each new centroid is drawn with probability
/// proportional to its squared distance from the closest chosen one.
fn init_plus_plus(data: &Array2<f64>, k: usize, rng: &mut StdRng) -> Array2<f64> {
    let n = data.nrows();
    let mut centroids = Array2::<f64>::zeros((k, data.ncols()));
    let first = rng.gen_range(0..n);
    centroids.row_mut(0).assign(&data.row(first));

    let mut closest: Vec<f64> = data
        .outer_iter()
        .map(|p| sq_dist(p, centroids.row(0)))
        .collect();

    for ci in 1..k {
        let idx = match WeightedIndex::new(&closest) {
            Ok(dist) => dist.sample(rng),
            // All remaining weight is zero: every point sits on a centroid.
            Err(_) => rng.gen_range(0..n),
        };
        centroids.row_mut(ci).assign(&data.row(idx));
        for (i, p) in data.outer_iter().enumerate() {
            let d = sq_dist(p, centroids.row(ci));
            if d < closest[i] {
                closest[i] = d;
            }
        }
    }
    centroids
}

/// Lloyd iterations from the given centroids.
///
/// `data` has been divided by `scale`; the centroid shift is measured back in
/// input units before it is compared with `tol`.
fn lloyd(
    data: &Array2<f64>,
    mut centroids: Array2<f64>,
    params: &KmeansParams,
    scale: f64,
    rng: &mut StdRng,
) -> KmeansFit {
    let n = data.nrows();
    let k = centroids.nrows();
    let (mut assignments, mut inertia) = assign(data, &centroids);
    let mut iterations = 0;

    for _ in 0..params.max_iter {
        iterations += 1;

        // update centroids as mean of assigned points
        let mut new_centroids = Array2::<f64>::zeros(centroids.raw_dim());
        let mut counts = vec![0usize; k];
        for (i, row) in data.outer_iter().enumerate() {
            let c = assignments[i];
            let mut target = new_centroids.row_mut(c);
            target += &row;
            counts[c] += 1;
        }
        for ci in 0..k {
            if counts[ci] > 0 {
                let count = counts[ci] as f64;
                new_centroids.row_mut(ci).mapv_inplace(|x| x / count);
            } else {
                // reinitialize empty cluster from a random point
                let idx = rng.gen_range(0..n);
                new_centroids.row_mut(ci).assign(&data.row(idx));
            }
        }

        let shift: f64 = (&centroids - &new_centroids).mapv(f64::abs).sum();
        centroids = new_centroids;

        let (new_assignments, new_inertia) = assign(data, &centroids);
        let stable = new_assignments == assignments;
        assignments = new_assignments;
        inertia = new_inertia;
        if stable || shift * scale < params.tol {
            break;
        }
    }

    KmeansFit {
        assignments,
        centroids,
        inertia,
        iterations,
    }
}

/// Partition the rows of `data` into `k` clusters.
///
/// `k` must lie in `2..=10` and must not exceed the number of points.
/// Deterministic for a given input and seed.
pub fn fit(data: &Array2<f64>, k: usize, params: &KmeansParams) -> Result<KmeansFit> {
    let n = data.nrows();
    if !(MIN_CLUSTERS..=MAX_CLUSTERS).contains(&k) {
        return Err(Error::InvalidParameter {
            name: "k",
            message: format!(
                "number of groups must be between {} and {}, got {}",
                MIN_CLUSTERS, MAX_CLUSTERS, k
            ),
        });
    }
    if k > n {
        return Err(Error::ClusterCount {
            requested: k,
            available: n,
        });
    }
    if params.n_init == 0 {
        return Err(Error::InvalidParameter {
            name: "n_init",
            message: "must be at least 1".to_string(),
        });
    }

    if data.iter().any(|v| !v.is_finite()) {
        return Err(Error::InvalidParameter {
            name: "data",
            message: "points must have finite coordinates".to_string(),
        });
    }

    // cluster on coordinates divided by their largest magnitude so squared
    // distances cannot overflow
    let scale = data.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
    let scale = if scale > 0.0 { scale } else { 1.0 };
    let scaled = data / scale;

    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut best: Option<KmeansFit> = None;

    for run in 0..params.n_init {
        let centroids = init_plus_plus(&scaled, k, &mut rng);
        let fit = lloyd(&scaled, centroids, params, scale, &mut rng);
        debug!(
            "kmeans run {}: inertia {:.6} after {} iterations",
            run, fit.inertia, fit.iterations
        );
        if best.as_ref().map_or(true, |b| fit.inertia < b.inertia) {
            best = Some(fit);
        }
    }

    let mut best = best.ok_or_else(|| Error::InvalidParameter {
        name: "n_init",
        message: "no clustering run completed".to_string(),
    })?;
    best.centroids.mapv_inplace(|v| v * scale);
    best.inertia *= scale * scale;
    info!("clustered {} brands into {} groups, inertia {:.6}", n, k, best.inertia);
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_sq_dist() {
        let a = array![0.0, 3.0];
        let b = array![4.0, 0.0];
        assert_eq!(sq_dist(a.view(), b.view()), 25.0);
    }

    #[test]
    fn test_kmeans_basic() {
        // Make some fake clusters
        let data = array![[0.0, 0.0], [0.1, 0.0], [9.0, 9.0], [9.1, 9.1]];
        let fit = fit(&data, 2, &KmeansParams::default()).unwrap();
        assert_eq!(fit.assignments.len(), 4);
        assert_eq!(fit.assignments[0], fit.assignments[1]);
        assert_eq!(fit.assignments[2], fit.assignments[3]);
        assert_ne!(fit.assignments[0], fit.assignments[2]);
        assert_eq!(fit.cluster_sizes(), vec![2, 2]);
        assert_eq!(fit.centroids.shape(), &[2, 2]);
    }

    #[test]
    fn test_ties_go_to_lowest_index() {
        let data = array![[1.0, 0.0]];
        let centroids = array![[0.0, 0.0], [2.0, 0.0]];
        let (a, inertia) = assign(&data, &centroids);
        assert_eq!(a, vec![0]);
        assert_eq!(inertia, 1.0);
    }

    #[test]
    fn test_deterministic_for_seed() {
        let data = array![
            [0.0, 0.0],
            [1.0, 0.5],
            [5.0, 5.0],
            [5.5, 4.0],
            [9.0, 0.0],
            [8.0, 1.0],
            [4.0, 2.0],
        ];
        let params = KmeansParams::default().with_seed(3);
        assert_eq!(fit(&data, 3, &params).unwrap(), fit(&data, 3, &params).unwrap());
    }

    #[test]
    fn test_duplicate_points() {
        let data = array![[1.0, 1.0], [1.0, 1.0], [1.0, 1.0]];
        let fit = fit(&data, 2, &KmeansParams::default()).unwrap();
        assert_eq!(fit.assignments.len(), 3);
        assert!(fit.assignments.iter().all(|&c| c < 2));
    }

    #[test]
    fn test_cluster_count_errors() {
        let data = array![[0.0, 0.0], [1.0, 1.0]];
        assert_eq!(
            fit(&data, 3, &KmeansParams::default()).unwrap_err(),
            Error::ClusterCount { requested: 3, available: 2 }
        );
        assert!(matches!(
            fit(&data, 1, &KmeansParams::default()),
            Err(Error::InvalidParameter { name: "k", .. })
        ));
        assert!(matches!(
            fit(&data, 11, &KmeansParams::default()),
            Err(Error::InvalidParameter { name: "k", .. })
        ));
    }

    #[test]
    fn test_huge_coordinates() {
        let data = array![[1e200, 0.0], [1.1e200, 0.0], [-3e200, 1e199], [-3.1e200, 1e199]];
        let fit = fit(&data, 2, &KmeansParams::default()).unwrap();
        assert_eq!(fit.assignments[0], fit.assignments[1]);
        assert_eq!(fit.assignments[2], fit.assignments[3]);
        assert_ne!(fit.assignments[0], fit.assignments[2]);
        assert!(fit.centroids.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_non_finite_points_rejected() {
        let data = array![[0.0, f64::NAN], [1.0, 1.0]];
        assert!(matches!(
            fit(&data, 2, &KmeansParams::default()),
            Err(Error::InvalidParameter { name: "data", .. })
        ));
    }

    #[test]
    fn test_cluster_sizes_helper() {
        assert_eq!(cluster_sizes(&[0, 2, 2, 1, 2], 4), vec![1, 1, 3, 0]);
    }
}
