use crate::core::geometry::exact_distance;
use crate::core::models::DecoySet;
use crate::engine::config::{ClusterConfig, ThresholdStrategy};
use crate::engine::error::EngineError;
use rand::Rng;
use rand::seq::index::sample;
use tracing::{debug, info};

/// Decoys sampled per estimation trial.
const SAMPLE_SIZE: usize = 101;

/// Number of sampling trials; derived values are averaged across them.
const NUM_TRIALS: usize = 16;

/// Percentile clamp for the auto-adjusted percentile strategy.
const MIN_PERCENTILE: f64 = 3.0;
const MAX_PERCENTILE: f64 = 50.0;

/// Histogram resolution for the most-frequent-distance strategy.
const HISTOGRAM_BINS: usize = 50;

/// Population cap for the full-set reference heuristic; larger sets are
/// thinned to evenly spaced decoys.
const ROSETTA_POPULATION_CAP: usize = 1_000;

/// Bisection steps when searching for the heuristic threshold.
const BISECTION_STEPS: usize = 40;

/// Default scaling factor for the most-frequent and min-average strategies.
const DEFAULT_FACTOR: f64 = 2.0 / 3.0;

/// A derived similarity threshold together with the strategy that produced
/// it.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdEstimate {
    pub value: f64,
    pub strategy: ThresholdStrategy,
}

/// Percentile used when the caller does not supply one: 100/⁴√n percent,
/// clamped so huge sets still keep a few edges and small sets are not
/// swamped by them.
pub fn auto_percentile(decoy_count: usize) -> f64 {
    (100.0 / (decoy_count as f64).powf(0.25)).clamp(MIN_PERCENTILE, MAX_PERCENTILE)
}

/// Derives the clustering threshold according to the configured strategy.
///
/// All sampling strategies work on bounded random subsets (at most
/// [`SAMPLE_SIZE`] decoys per trial, [`NUM_TRIALS`] trials averaged) so
/// estimation stays cheap relative to graph construction.
pub fn estimate(
    set: &DecoySet,
    config: &ClusterConfig,
    rng: &mut impl Rng,
) -> Result<ThresholdEstimate, EngineError> {
    let strategy = config.strategy;
    let value = match strategy {
        ThresholdStrategy::Fixed(t) => t,
        ThresholdStrategy::Percentile => {
            let x = config
                .strategy_parameter
                .unwrap_or_else(|| auto_percentile(set.len()));
            average_over_trials(set, rng, |trial| trial.percentile(x))
        }
        ThresholdStrategy::MostFrequent => {
            let x = config.strategy_parameter.unwrap_or(DEFAULT_FACTOR);
            average_over_trials(set, rng, |trial| {
                trial.min + x * (trial.most_frequent() - trial.min)
            })
        }
        ThresholdStrategy::MinAvgDist => {
            let x = config.strategy_parameter.unwrap_or(DEFAULT_FACTOR);
            average_over_trials(set, rng, |trial| x * trial.min_avg)
        }
        ThresholdStrategy::Rosetta => {
            let population = thinned_population(set.len());
            neighborhood_bisection(set, &population)
        }
        ThresholdStrategy::SampledRosetta => {
            let mut total = 0.0;
            for _ in 0..NUM_TRIALS {
                let k = SAMPLE_SIZE.min(set.len());
                let population = sample(rng, set.len(), k).into_vec();
                total += neighborhood_bisection(set, &population);
            }
            total / NUM_TRIALS as f64
        }
    };

    if !value.is_finite() || value <= 0.0 {
        return Err(EngineError::InvalidThreshold(value));
    }
    info!(threshold = value, strategy = ?strategy, "Clustering threshold derived");
    Ok(ThresholdEstimate { value, strategy })
}

/// Pairwise exact distances among one trial's sampled decoys, with the
/// statistics the strategies read off them.
struct TrialDistances {
    sorted: Vec<f64>,
    min: f64,
    max: f64,
    /// Minimum over sampled decoys of the mean distance to the others.
    min_avg: f64,
}

impl TrialDistances {
    fn gather(set: &DecoySet, indices: &[usize]) -> Self {
        let k = indices.len();
        let mut sorted = Vec::with_capacity(k * (k - 1) / 2);
        let mut row_sums = vec![0.0f64; k];
        for a in 0..k {
            for b in (a + 1)..k {
                let d = exact_distance(set.decoy(indices[a]), set.decoy(indices[b]));
                sorted.push(d);
                row_sums[a] += d;
                row_sums[b] += d;
            }
        }
        sorted.sort_by(|x, y| x.partial_cmp(y).unwrap_or(std::cmp::Ordering::Equal));

        let min = sorted.first().copied().unwrap_or(0.0);
        let max = sorted.last().copied().unwrap_or(0.0);
        let min_avg = row_sums
            .iter()
            .map(|s| s / (k - 1) as f64)
            .fold(f64::INFINITY, f64::min);

        Self {
            sorted,
            min,
            max,
            min_avg,
        }
    }

    fn percentile(&self, x: f64) -> f64 {
        if self.sorted.is_empty() {
            return 0.0;
        }
        let rank = (x / 100.0 * self.sorted.len() as f64).floor() as usize;
        self.sorted[rank.min(self.sorted.len() - 1)]
    }

    fn most_frequent(&self) -> f64 {
        if self.max <= self.min {
            return self.min;
        }
        let width = (self.max - self.min) / HISTOGRAM_BINS as f64;
        let mut counts = [0usize; HISTOGRAM_BINS];
        for &d in &self.sorted {
            let bin = (((d - self.min) / width) as usize).min(HISTOGRAM_BINS - 1);
            counts[bin] += 1;
        }
        let best = counts
            .iter()
            .enumerate()
            .max_by_key(|&(_, c)| *c)
            .map(|(b, _)| b)
            .unwrap_or(0);
        self.min + (best as f64 + 0.5) * width
    }
}

fn average_over_trials(
    set: &DecoySet,
    rng: &mut impl Rng,
    derive: impl Fn(&TrialDistances) -> f64,
) -> f64 {
    let k = SAMPLE_SIZE.min(set.len());
    let mut total = 0.0;
    for trial in 0..NUM_TRIALS {
        let indices = sample(rng, set.len(), k).into_vec();
        let distances = TrialDistances::gather(set, &indices);
        let value = derive(&distances);
        debug!(trial, value, "Threshold estimation trial");
        total += value;
    }
    total / NUM_TRIALS as f64
}

fn thinned_population(n: usize) -> Vec<usize> {
    if n <= ROSETTA_POPULATION_CAP {
        (0..n).collect()
    } else {
        (0..ROSETTA_POPULATION_CAP)
            .map(|k| k * n / ROSETTA_POPULATION_CAP)
            .collect()
    }
}

/// The reference external-tool-compatible heuristic: the smallest threshold
/// at which the densest neighborhood in the population reaches an
/// auto-detected target count.
///
/// The neighbor count at a threshold is monotone in the threshold, so the
/// smallest such value is found by bisection over the observed distance
/// range. The target fraction shrinks with set size; treat the exact rule
/// as a tunable default rather than guaranteed behavior.
fn neighborhood_bisection(set: &DecoySet, population: &[usize]) -> f64 {
    let k = population.len();
    let mut rows: Vec<Vec<f64>> = vec![Vec::with_capacity(k - 1); k];
    for a in 0..k {
        for b in (a + 1)..k {
            let d = exact_distance(set.decoy(population[a]), set.decoy(population[b]));
            rows[a].push(d);
            rows[b].push(d);
        }
    }
    for row in &mut rows {
        row.sort_by(|x, y| x.partial_cmp(y).unwrap_or(std::cmp::Ordering::Equal));
    }

    let lo = rows
        .iter()
        .filter_map(|r| r.first().copied())
        .fold(f64::INFINITY, f64::min);
    let hi = rows
        .iter()
        .filter_map(|r| r.last().copied())
        .fold(0.0f64, f64::max);

    let target_fraction = (set.len() as f64).powf(-0.25).min(0.5);
    let target = ((k as f64 * target_fraction).ceil() as usize).max(2);

    let densest_count = |t: f64| -> usize {
        rows.iter()
            .map(|row| row.partition_point(|&d| d <= t))
            .max()
            .unwrap_or(0)
    };

    let mut lo = lo;
    let mut hi = hi.max(lo);
    for _ in 0..BISECTION_STEPS {
        let mid = 0.5 * (lo + hi);
        if densest_count(mid) >= target {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    hi
}
