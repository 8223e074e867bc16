//! Metric multidimensional scaling by stress majorization (SMACOF).
//!
//! Target dissimilarities are the Euclidean distances between feature rows.
//! Each run starts from a uniform random layout in the unit square and
//! applies Guttman transforms until the normalized stress stops improving by
//! more than `eps`. The best of `n_init` runs is kept.

use log::{debug, info};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};

/// Output dimensionality of the perception map.
pub const N_COMPONENTS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MdsParams {
    /// Number of independent starts.
    pub n_init: usize,
    /// Iteration cap for one start.
    pub max_iter: usize,
    /// Convergence threshold on the normalized stress decrease.
    pub eps: f64,
    pub seed: u64,
}

impl Default for MdsParams {
    fn default() -> Self {
        Self {
            n_init: 4,
            max_iter: 300,
            eps: 1e-3,
            seed: 42,
        }
    }
}

impl MdsParams {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// N×2 layout, row i placing observation i.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub coords: Array2<f64>,
    /// Kruskal stress-1: root of the squared distance errors over the
    /// squared feature distances. 0 is a perfect fit.
    pub stress: f64,
    /// Iterations used by the winning start.
    pub iterations: usize,
}

impl Embedding {
    pub fn nrows(&self) -> usize {
        self.coords.nrows()
    }
}

/// Euclidean distance between every pair of rows.
pub fn pairwise_distances(data: &Array2<f64>) -> Array2<f64> {
    let n = data.nrows();
    let mut out = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in (i + 1)..n {
            let d = data
                .row(i)
                .iter()
                .zip(data.row(j).iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum::<f64>()
                .sqrt();
            out[[i, j]] = d;
            out[[j, i]] = d;
        }
    }
    out
}

/// Raw stress of a layout with pairwise distances `dist` against the target
/// dissimilarities.
fn raw_stress(dist: &Array2<f64>, dissimilarities: &Array2<f64>) -> f64 {
    let n = dist.nrows();
    let mut stress = 0.0;
    for i in 0..n {
        for j in (i + 1)..n {
            stress += (dist[[i, j]] - dissimilarities[[i, j]]).powi(2);
        }
    }
    stress
}

/// Stress normalized by the total squared dissimilarity (Kruskal's stress-1).
/// Independent of the scale of the ratings; zero when all points coincide.
fn normalized_stress(x: &Array2<f64>, dissimilarities: &Array2<f64>) -> f64 {
    let raw = raw_stress(&pairwise_distances(x), dissimilarities);
    let total: f64 = dissimilarities.iter().map(|d| d * d).sum::<f64>() / 2.0;
    if total == 0.0 {
        0.0
    } else {
        (raw / total).sqrt()
    }
}

/// One SMACOF run from `x`; returns the final layout and its iteration count.
///
/// `eps` is compared against the normalized stress decrease multiplied by
/// `scale`, so convergence does not depend on how the input was rescaled.
fn smacof_single(
    dissimilarities: &Array2<f64>,
    mut x: Array2<f64>,
    max_iter: usize,
    eps: f64,
    scale: f64,
) -> (Array2<f64>, usize) {
    let n = x.nrows();
    let mut old_stress: Option<f64> = None;
    let mut iterations = 0;

    for _ in 0..max_iter {
        iterations += 1;
        let dist = pairwise_distances(&x);
        let stress = raw_stress(&dist, dissimilarities);

        // Guttman transform: x <- B(x) x / n
        let mut b = Array2::<f64>::zeros((n, n));
        for i in 0..n {
            let mut diag = 0.0;
            for j in 0..n {
                if i != j && dist[[i, j]] > 0.0 {
                    let v = -dissimilarities[[i, j]] / dist[[i, j]];
                    b[[i, j]] = v;
                    diag -= v;
                }
            }
            b[[i, i]] = diag;
        }
        x = b.dot(&x) / n as f64;

        let norm: f64 = x
            .outer_iter()
            .map(|row| row.iter().map(|v| v * v).sum::<f64>().sqrt())
            .sum();
        if norm == 0.0 {
            break;
        }
        let normalized = stress / norm;
        if let Some(old) = old_stress {
            if (old - normalized) * scale < eps {
                break;
            }
        }
        old_stress = Some(normalized);
    }

    (x, iterations)
}

/// Largest absolute rating, or 1 when every rating is zero.
fn max_abs(features: &Array2<f64>) -> f64 {
    let m = features.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
    if m > 0.0 {
        m
    } else {
        1.0
    }
}

/// Embed the rows of `features` in two dimensions.
///
/// Needs at least two rows and only finite values. The solver works on the
/// ratings divided by their largest absolute value and scales the layout
/// back, so large but finite ratings do not overflow. The same input and
/// seed always give the same layout.
pub fn fit(features: &Array2<f64>, params: &MdsParams) -> Result<Embedding> {
    let n = features.nrows();
    if n < 2 {
        return Err(Error::Embedding {
            reason: format!("need at least 2 brands to embed, got {}", n),
        });
    }
    if features.ncols() == 0 {
        return Err(Error::Embedding {
            reason: "feature matrix has no columns".to_string(),
        });
    }
    if let Some(((i, j), _)) = features.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(Error::Embedding {
            reason: format!("non-finite rating at row {}, column {}", i, j),
        });
    }
    if params.n_init == 0 {
        return Err(Error::InvalidParameter {
            name: "n_init",
            message: "must be at least 1".to_string(),
        });
    }
    if params.max_iter == 0 {
        return Err(Error::InvalidParameter {
            name: "max_iter",
            message: "must be at least 1".to_string(),
        });
    }

    let scale = max_abs(features);
    let dissimilarities = pairwise_distances(&(features / scale));
    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut best: Option<Embedding> = None;

    for run in 0..params.n_init {
        let init = Array2::from_shape_fn((n, N_COMPONENTS), |_| rng.gen::<f64>());
        let (coords, iterations) =
            smacof_single(&dissimilarities, init, params.max_iter, params.eps, scale);
        let stress = normalized_stress(&coords, &dissimilarities);
        debug!("mds run {}: stress {:.6} after {} iterations", run, stress, iterations);

        if best.as_ref().map_or(true, |b| stress < b.stress) {
            best = Some(Embedding { coords, stress, iterations });
        }
    }

    let mut best = best.ok_or_else(|| Error::Embedding {
        reason: "no embedding run completed".to_string(),
    })?;
    best.coords.mapv_inplace(|v| v * scale);

    if !best.stress.is_finite() || best.coords.iter().any(|v| !v.is_finite()) {
        return Err(Error::Embedding {
            reason: "layout did not converge to finite coordinates".to_string(),
        });
    }
    info!("embedded {} brands in 2D, stress {:.6}", n, best.stress);
    Ok(best)
}
