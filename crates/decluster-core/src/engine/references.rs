use crate::core::geometry::exact_distance;
use crate::core::models::DecoySet;
use crate::engine::error::EngineError;
use tracing::debug;

/// Number of reference decoys backing the triangle-inequality bounds.
/// Smaller sets use every decoy as a reference.
pub const REFERENCE_SIZE: usize = 6;

/// Minimum decoy count a clustering run accepts.
pub const MIN_DECOYS: usize = 2;

/// A small fixed set of reference decoys with the exact distance from every
/// decoy to every reference precomputed.
///
/// Because RMSD obeys the triangle inequality, the cache brackets any
/// pairwise distance from both sides without computing it:
///
/// ```text
/// maxᵣ |d(i,r) − d(j,r)|  ≤  d(i,j)  ≤  minᵣ (d(i,r) + d(j,r))
/// ```
///
/// Read-only after construction; rebuilt from scratch for a refined re-run.
#[derive(Debug)]
pub struct ReferenceSet {
    indices: Vec<usize>,
    /// Row-major `[decoy][reference]` distances.
    dists: Vec<f64>,
}

impl ReferenceSet {
    /// Picks references evenly spread over the set (deterministic) and
    /// caches every decoy-to-reference distance.
    pub fn build(set: &DecoySet) -> Result<Self, EngineError> {
        let n = set.len();
        if n < MIN_DECOYS {
            return Err(EngineError::TooFewDecoys {
                found: n,
                required: MIN_DECOYS,
            });
        }

        let width = n.min(REFERENCE_SIZE);
        let indices: Vec<usize> = (0..width).map(|k| k * n / width).collect();

        let mut dists = vec![0.0; n * width];
        for i in 0..n {
            for (k, &r) in indices.iter().enumerate() {
                dists[i * width + k] = exact_distance(set.decoy(i), set.decoy(r));
            }
        }

        debug!(references = ?indices, decoys = n, "Reference distance cache built");
        Ok(Self { indices, dists })
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Distance from `decoy` to the `k`-th reference.
    #[inline]
    pub fn distance(&self, decoy: usize, k: usize) -> f64 {
        self.dists[decoy * self.indices.len() + k]
    }

    /// Lower and upper bound on the exact distance between `i` and `j`.
    pub fn bounds(&self, i: usize, j: usize) -> (f64, f64) {
        let width = self.indices.len();
        let row_i = &self.dists[i * width..(i + 1) * width];
        let row_j = &self.dists[j * width..(j + 1) * width];

        let mut lower = 0.0f64;
        let mut upper = f64::INFINITY;
        for (di, dj) in row_i.iter().zip(row_j) {
            lower = lower.max((di - dj).abs());
            upper = upper.min(di + dj);
        }
        (lower, upper)
    }
}
