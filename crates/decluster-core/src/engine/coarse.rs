use crate::core::geometry::exact_distance;
use crate::core::models::DecoySet;
use tracing::info;

/// Loose geometric grouping of the decoy set at a coarse radius.
///
/// A greedy leader pass assigns every decoy to the first existing center
/// within the radius, or promotes it to a new center. During fine-grained
/// graph construction a pair is attempted only when the triangle inequality
/// over their centers leaves it possible for them to be neighbors, which
/// bounds the number of exact comparisons on very large sets at the price of
/// possibly missing borderline neighbors.
#[derive(Debug)]
pub struct CoarseClusters {
    centers: Vec<usize>,
    /// Decoy index → position of its center within `centers`.
    assignment: Vec<usize>,
    /// Decoy index → exact distance to its assigned center.
    dist_to_center: Vec<f64>,
    /// Dense center-to-center distance matrix, row-major.
    center_dists: Vec<f64>,
}

impl CoarseClusters {
    pub fn build(set: &DecoySet, radius: f64) -> Self {
        let n = set.len();
        let mut centers: Vec<usize> = Vec::new();
        let mut assignment = vec![0usize; n];
        let mut dist_to_center = vec![0.0f64; n];

        for i in 0..n {
            let mut assigned = false;
            for (c, &center) in centers.iter().enumerate() {
                let d = exact_distance(set.decoy(i), set.decoy(center));
                if d <= radius {
                    assignment[i] = c;
                    dist_to_center[i] = d;
                    assigned = true;
                    break;
                }
            }
            if !assigned {
                assignment[i] = centers.len();
                dist_to_center[i] = 0.0;
                centers.push(i);
            }
        }

        let k = centers.len();
        let mut center_dists = vec![0.0f64; k * k];
        for a in 0..k {
            for b in (a + 1)..k {
                let d = exact_distance(set.decoy(centers[a]), set.decoy(centers[b]));
                center_dists[a * k + b] = d;
                center_dists[b * k + a] = d;
            }
        }

        info!(decoys = n, centers = k, radius, "Coarse grouping complete");
        Self {
            centers,
            assignment,
            dist_to_center,
            center_dists,
        }
    }

    pub fn center_count(&self) -> usize {
        self.centers.len()
    }

    /// Whether the pair `(i, j)` can still be within `threshold` given their
    /// center geometry. `false` certifies the pair is not a neighbor.
    pub fn may_neighbor(&self, i: usize, j: usize, threshold: f64) -> bool {
        let (ci, cj) = (self.assignment[i], self.assignment[j]);
        if ci == cj {
            return true;
        }
        let center_dist = self.center_dists[ci * self.centers.len() + cj];
        // d(i,j) ≥ d(cᵢ,cⱼ) − d(i,cᵢ) − d(j,cⱼ)
        center_dist - self.dist_to_center[i] - self.dist_to_center[j] <= threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::Decoy;
    use nalgebra::Point3;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn jittered(base: &[Point3<f64>], rng: &mut StdRng, spread: f64) -> Vec<Point3<f64>> {
        base.iter()
            .map(|p| {
                Point3::new(
                    p.x + rng.gen_range(-spread..spread),
                    p.y + rng.gen_range(-spread..spread),
                    p.z + rng.gen_range(-spread..spread),
                )
            })
            .collect()
    }

    fn two_clump_set() -> DecoySet {
        let mut rng = StdRng::seed_from_u64(9);
        let helix: Vec<Point3<f64>> = (0..12)
            .map(|i| Point3::new(i as f64 * 3.8, (i as f64).sin(), (i as f64).cos()))
            .collect();
        let sheet: Vec<Point3<f64>> = (0..12)
            .map(|i| Point3::new(0.0, i as f64 * 3.4, (i % 2) as f64 * 20.0))
            .collect();
        let mut decoys = Vec::new();
        for i in 0..10 {
            decoys.push(Decoy::new(format!("h{i}"), jittered(&helix, &mut rng, 0.2)));
        }
        for i in 0..10 {
            decoys.push(Decoy::new(format!("s{i}"), jittered(&sheet, &mut rng, 0.2)));
        }
        DecoySet::new(decoys).unwrap()
    }

    #[test]
    fn tight_clumps_collapse_to_few_centers() {
        let set = two_clump_set();
        let coarse = CoarseClusters::build(&set, 2.0);
        assert_eq!(coarse.center_count(), 2);
    }

    #[test]
    fn same_bucket_pairs_are_never_pruned() {
        let set = two_clump_set();
        let coarse = CoarseClusters::build(&set, 2.0);
        assert!(coarse.may_neighbor(0, 5, 0.1));
    }

    #[test]
    fn pruning_never_discards_a_true_neighbor() {
        let set = two_clump_set();
        let coarse = CoarseClusters::build(&set, 1.0);
        let threshold = 1.5;
        for i in 0..set.len() {
            for j in (i + 1)..set.len() {
                let exact = exact_distance(set.decoy(i), set.decoy(j));
                if exact <= threshold {
                    assert!(
                        coarse.may_neighbor(i, j, threshold),
                        "neighbor pair ({i},{j}) at distance {exact} was pruned"
                    );
                }
            }
        }
    }

    #[test]
    fn distant_buckets_are_pruned_at_small_thresholds() {
        let set = two_clump_set();
        let coarse = CoarseClusters::build(&set, 1.0);
        // Helix and sheet clumps are far apart relative to a 0.5 threshold.
        assert!(!coarse.may_neighbor(0, 15, 0.5));
    }
}
