use crate::core::models::DecoySet;
use crate::engine::coarse::CoarseClusters;
use crate::engine::config::{ClusterConfig, OutputMode, ThresholdStrategy};
use crate::engine::error::EngineError;
use crate::engine::extract::extract_clusters;
use crate::engine::filter::filter_outliers;
use crate::engine::graph::{DENSE_MODE_LIMIT, NeighborGraph};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::references::{MIN_DECOYS, ReferenceSet};
use crate::engine::threshold;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use std::borrow::Cow;
use tracing::{info, warn};

/// One cluster of the final result, with decoy indices resolved to names.
///
/// `member_indices` refer to the decoy set the workflow was started with,
/// even after a refined re-run on a subset.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterSummary {
    pub center: String,
    pub center_index: usize,
    pub members: Vec<String>,
    pub member_indices: Vec<usize>,
}

impl ClusterSummary {
    pub fn size(&self) -> usize {
        self.member_indices.len()
    }
}

/// One of the two largest clusters of an ambiguous result.
#[derive(Debug, Clone, Serialize)]
pub struct Contender {
    pub center: String,
    pub size: usize,
    pub member_indices: Vec<usize>,
}

/// Raised when the two largest clusters are too close in size for the
/// largest to be trusted as the consensus. Carries everything a refined
/// re-run needs.
#[derive(Debug, Clone, Serialize)]
pub struct AmbiguityReport {
    /// Relative size gap `(s₁ − s₂) / s₁` between the two largest clusters.
    pub margin: f64,
    pub largest: Contender,
    pub runner_up: Contender,
}

/// Result of one clustering run.
#[derive(Debug, Serialize)]
pub struct ClusterOutcome {
    /// The similarity threshold the graph was built with.
    pub threshold: f64,
    pub decoys_total: usize,
    /// Decoys surviving the outlier filter and entering the graph.
    pub decoys_clustered: usize,
    /// Total clusters extracted, before any output truncation.
    pub cluster_count: usize,
    /// Clusters in extraction order, truncated per the output mode.
    pub clusters: Vec<ClusterSummary>,
    /// Present when the top-two size gap is below the configured margin.
    pub ambiguity: Option<AmbiguityReport>,
}

/// Runs the full clustering pipeline on `set`.
///
/// Phases, each bracketed by progress events: outlier filtering (optional),
/// threshold estimation, reference-cache and graph construction (with a
/// coarse pre-grouping pass on sets too large for dense storage), and
/// greedy extraction. The outcome orders clusters largest-first and flags
/// ambiguity; it never re-runs on its own.
pub fn run(
    set: &DecoySet,
    config: &ClusterConfig,
    reporter: &ProgressReporter,
) -> Result<ClusterOutcome, EngineError> {
    let identity: Vec<usize> = (0..set.len()).collect();
    run_mapped(set, &identity, config, reporter)
}

/// Percentile used when the refined re-run replaces a fixed threshold.
const REFINE_PERCENTILE: f64 = 50.0;

/// Re-runs the pipeline on the members of an ambiguous result's two
/// contending clusters, with a freshly estimated threshold.
///
/// Restricting the set to the contenders sharpens the sampled distance
/// statistics around the structures that actually compete, which usually
/// separates them decisively. The threshold is always re-estimated: a
/// fixed strategy is swapped for the median of the sampled distances,
/// since re-running at the very threshold that produced the ambiguity
/// would reproduce it. Outlier filtering is skipped; the members already
/// survived it. Reported indices still refer to the original set.
pub fn refine(
    set: &DecoySet,
    config: &ClusterConfig,
    reporter: &ProgressReporter,
    ambiguity: &AmbiguityReport,
) -> Result<ClusterOutcome, EngineError> {
    let mut indices: Vec<usize> = ambiguity
        .largest
        .member_indices
        .iter()
        .chain(&ambiguity.runner_up.member_indices)
        .copied()
        .collect();
    indices.sort_unstable();
    indices.dedup();

    info!(
        contenders = indices.len(),
        margin = ambiguity.margin,
        "Refining ambiguous result on contending clusters"
    );
    let subset = set.subset(&indices)?;
    let mut config = config.clone();
    config.filter_outliers = false;
    if let ThresholdStrategy::Fixed(_) = config.strategy {
        config.strategy = ThresholdStrategy::Percentile;
        config.strategy_parameter = Some(REFINE_PERCENTILE);
    }
    run_mapped(&subset, &indices, &config, reporter)
}

/// Pipeline body shared by [`run`] and [`refine`]. `to_original` maps an
/// index in `set` back to the caller's original decoy set.
fn run_mapped(
    set: &DecoySet,
    to_original: &[usize],
    config: &ClusterConfig,
    reporter: &ProgressReporter,
) -> Result<ClusterOutcome, EngineError> {
    let total = set.len();
    if total < MIN_DECOYS {
        return Err(EngineError::TooFewDecoys {
            found: total,
            required: MIN_DECOYS,
        });
    }

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    // Outlier filtering, mapping subsequent indices through `kept`.
    let (working, kept): (Cow<'_, DecoySet>, Vec<usize>) = if config.filter_outliers {
        reporter.report(Progress::PhaseStart {
            name: "outlier filtering",
        });
        let kept = filter_outliers(set, &mut rng);
        let result = if kept.len() < MIN_DECOYS {
            warn!(
                kept = kept.len(),
                "Outlier filter left too few decoys; keeping all"
            );
            (Cow::Borrowed(set), (0..total).collect())
        } else if kept.len() == total {
            (Cow::Borrowed(set), kept)
        } else {
            (Cow::Owned(set.subset(&kept)?), kept)
        };
        reporter.report(Progress::PhaseFinish);
        result
    } else {
        (Cow::Borrowed(set), (0..total).collect())
    };

    reporter.report(Progress::PhaseStart {
        name: "threshold estimation",
    });
    let estimate = threshold::estimate(&working, config, &mut rng)?;
    reporter.report(Progress::StatusUpdate {
        text: format!("threshold {:.4}", estimate.value),
    });
    reporter.report(Progress::PhaseFinish);

    reporter.report(Progress::PhaseStart {
        name: "graph construction",
    });
    let refs = ReferenceSet::build(&working)?;
    let coarse = (working.len() > DENSE_MODE_LIMIT)
        .then(|| CoarseClusters::build(&working, estimate.value / 2.0));
    let mut graph = NeighborGraph::build(&working, estimate.value, &refs, coarse.as_ref(), reporter);
    reporter.report(Progress::PhaseFinish);

    reporter.report(Progress::PhaseStart {
        name: "cluster extraction",
    });
    let clusters = extract_clusters(&mut graph, reporter);
    reporter.report(Progress::PhaseFinish);

    // Resolve working-set indices back to the caller's decoy set.
    let summaries: Vec<ClusterSummary> = clusters
        .iter()
        .map(|c| ClusterSummary {
            center: working.decoy(c.center).name().to_string(),
            center_index: to_original[kept[c.center]],
            members: c
                .members
                .iter()
                .map(|&m| working.decoy(m).name().to_string())
                .collect(),
            member_indices: c.members.iter().map(|&m| to_original[kept[m]]).collect(),
        })
        .collect();

    let ambiguity = ambiguity_of(&summaries, config.ambiguity_margin);
    if let Some(report) = &ambiguity {
        warn!(
            margin = report.margin,
            largest = report.largest.size,
            runner_up = report.runner_up.size,
            "Top-two cluster sizes are within the ambiguity margin"
        );
    }

    let cluster_count = summaries.len();
    let clusters = match config.output {
        OutputMode::All => summaries,
        OutputMode::Top(n) => summaries.into_iter().take(n).collect(),
    };

    info!(
        decoys = total,
        clustered = working.len(),
        clusters = cluster_count,
        threshold = estimate.value,
        "Clustering run complete"
    );
    Ok(ClusterOutcome {
        threshold: estimate.value,
        decoys_total: total,
        decoys_clustered: working.len(),
        cluster_count,
        clusters,
        ambiguity,
    })
}

fn ambiguity_of(summaries: &[ClusterSummary], margin: f64) -> Option<AmbiguityReport> {
    let [first, second, ..] = summaries else {
        return None;
    };
    let gap = (first.size() - second.size()) as f64 / first.size() as f64;
    if gap >= margin {
        return None;
    }
    let contender = |s: &ClusterSummary| Contender {
        center: s.center.clone(),
        size: s.size(),
        member_indices: s.member_indices.clone(),
    };
    Some(AmbiguityReport {
        margin: gap,
        largest: contender(first),
        runner_up: contender(second),
    })
}
