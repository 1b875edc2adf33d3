use crate::core::geometry::exact_distance;
use crate::core::models::DecoySet;
use rand::Rng;
use rand::seq::index::sample;
use tracing::info;

/// Size of the random sample outliers are measured against.
const FILTER_SAMPLE_SIZE: usize = 101;

/// A decoy is an outlier when its nearest sampled decoy is further than the
/// sample's own mean nearest-neighbor distance by this many standard
/// deviations.
const CUTOFF_SIGMAS: f64 = 2.0;

/// Removes decoys whose distances to a random sample are all unusually
/// large, before threshold estimation and graph construction.
///
/// Returns the indices of the decoys to keep, in their original order. The
/// pass is conservative: when the sample statistics are degenerate (tiny
/// sets, zero variance) everything is kept.
pub fn filter_outliers(set: &DecoySet, rng: &mut impl Rng) -> Vec<usize> {
    let n = set.len();
    if n <= FILTER_SAMPLE_SIZE {
        return (0..n).collect();
    }

    let sampled = sample(rng, n, FILTER_SAMPLE_SIZE).into_vec();

    // Nearest-neighbor distance of each sampled decoy within the sample
    // establishes what "close to the crowd" means for this set.
    let mut nearest_in_sample = Vec::with_capacity(sampled.len());
    for (a, &i) in sampled.iter().enumerate() {
        let mut nearest = f64::INFINITY;
        for (b, &j) in sampled.iter().enumerate() {
            if a == b {
                continue;
            }
            nearest = nearest.min(exact_distance(set.decoy(i), set.decoy(j)));
        }
        nearest_in_sample.push(nearest);
    }

    let mean = nearest_in_sample.iter().sum::<f64>() / nearest_in_sample.len() as f64;
    let variance = nearest_in_sample
        .iter()
        .map(|d| (d - mean) * (d - mean))
        .sum::<f64>()
        / nearest_in_sample.len() as f64;
    let cutoff = mean + CUTOFF_SIGMAS * variance.sqrt();
    if !cutoff.is_finite() {
        return (0..n).collect();
    }

    let mut kept = Vec::with_capacity(n);
    for i in 0..n {
        if sampled.contains(&i) {
            kept.push(i);
            continue;
        }
        let mut nearest = f64::INFINITY;
        for &j in &sampled {
            nearest = nearest.min(exact_distance(set.decoy(i), set.decoy(j)));
            if nearest <= cutoff {
                break;
            }
        }
        if nearest <= cutoff {
            kept.push(i);
        }
    }

    info!(
        total = n,
        kept = kept.len(),
        dropped = n - kept.len(),
        cutoff,
        "Outlier filtering pass complete"
    );
    kept
}
