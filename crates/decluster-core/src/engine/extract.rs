use crate::engine::graph::NeighborGraph;
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::info;

/// One extracted cluster: the center decoy and every decoy that was within
/// the threshold of it when the cluster was formed.
///
/// Indices refer to the decoy set the graph was built over. `members`
/// includes the center and is sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    pub center: usize,
    pub members: Vec<usize>,
}

impl Cluster {
    pub fn size(&self) -> usize {
        self.members.len()
    }
}

/// Greedy largest-first cluster extraction.
///
/// Repeatedly picks the surviving node with the highest remaining degree
/// (ties broken toward the lowest index, so runs are deterministic), emits
/// it and its current neighbors as a cluster, and deletes all of them from
/// the graph. Degrees of the survivors shrink as their edges into the
/// removed cluster disappear, so later clusters reflect the *remaining*
/// neighborhoods, not the original ones.
///
/// Consumes the graph; on return every node has been removed and the
/// clusters partition the original index range.
pub fn extract_clusters(graph: &mut NeighborGraph, reporter: &ProgressReporter) -> Vec<Cluster> {
    let n = graph.node_count();
    let mut clusters = Vec::new();

    loop {
        let mut best: Option<(usize, usize)> = None;
        for i in 0..n {
            if !graph.contains(i) {
                continue;
            }
            let degree = graph.degree_of(i);
            if best.is_none_or(|(best_degree, _)| degree > best_degree) {
                best = Some((degree, i));
            }
        }
        let Some((_, center)) = best else {
            break;
        };

        let neighbors = graph.remove_node(center).unwrap_or_default();
        let mut members = Vec::with_capacity(neighbors.len() + 1);
        members.push(center);
        for &v in &neighbors {
            let v = v as usize;
            members.push(v);
            for &u in &graph.remove_node(v).unwrap_or_default() {
                let u = u as usize;
                if graph.contains(u) {
                    graph.remove_edge_to(u, v);
                }
            }
        }
        members.sort_unstable();
        clusters.push(Cluster { center, members });
    }

    info!(
        clusters = clusters.len(),
        largest = clusters.first().map_or(0, Cluster::size),
        "Cluster extraction complete"
    );
    reporter.report(Progress::StatusUpdate {
        text: format!("extracted {} clusters from {} decoys", clusters.len(), n),
    });
    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{Decoy, DecoySet};
    use crate::engine::references::ReferenceSet;
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

    /// Two well-separated clumps of the given sizes.
    fn clumped_set(first: usize, second: usize) -> DecoySet {
        let mut rng = StdRng::seed_from_u64(31);
        let helix: Vec<Point3<f64>> = (0..12)
            .map(|i| Point3::new(i as f64 * 3.8, (i as f64).sin(), (i as f64).cos()))
            .collect();
        let sheet: Vec<Point3<f64>> = (0..12)
            .map(|i| Point3::new(0.0, i as f64 * 3.4, (i % 2) as f64 * 20.0))
            .collect();
        let mut decoys = Vec::new();
        for i in 0..first {
            decoys.push(Decoy::new(format!("h{i}"), jittered(&helix, &mut rng, 0.15)));
        }
        for i in 0..second {
            decoys.push(Decoy::new(format!("s{i}"), jittered(&sheet, &mut rng, 0.15)));
        }
        DecoySet::new(decoys).unwrap()
    }

    fn build_graph(set: &DecoySet, threshold: f64) -> NeighborGraph {
        let refs = ReferenceSet::build(set).unwrap();
        NeighborGraph::build(set, threshold, &refs, None, &ProgressReporter::new())
    }

    #[test]
    fn clusters_partition_the_whole_set() {
        let set = clumped_set(12, 8);
        let mut graph = build_graph(&set, 2.0);
        let clusters = extract_clusters(&mut graph, &ProgressReporter::new());

        let mut seen: Vec<usize> = clusters.iter().flat_map(|c| c.members.clone()).collect();
        seen.sort_unstable();
        let expected: Vec<usize> = (0..set.len()).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn two_separated_clumps_produce_two_clusters_largest_first() {
        let set = clumped_set(12, 8);
        let mut graph = build_graph(&set, 2.0);
        let clusters = extract_clusters(&mut graph, &ProgressReporter::new());

        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].size(), 12);
        assert_eq!(clusters[1].size(), 8);
        // The larger clump occupies the lower indices.
        assert!(clusters[0].members.iter().all(|&m| m < 12));
        assert!(clusters[1].members.iter().all(|&m| m >= 12));
    }

    #[test]
    fn cluster_sizes_never_increase_along_extraction_order() {
        let set = clumped_set(15, 9);
        let mut graph = build_graph(&set, 2.0);
        let clusters = extract_clusters(&mut graph, &ProgressReporter::new());
        for pair in clusters.windows(2) {
            assert!(pair[0].size() >= pair[1].size());
        }
    }

    #[test]
    fn degree_ties_resolve_to_the_lowest_index() {
        // Every decoy in each clump has the same degree within it; the
        // first extracted center must be the lowest-index member of the
        // first equally-sized clump.
        let set = clumped_set(8, 8);
        let mut graph = build_graph(&set, 2.0);
        let clusters = extract_clusters(&mut graph, &ProgressReporter::new());
        assert_eq!(clusters[0].center, 0);
    }

    #[test]
    fn isolated_decoys_become_singleton_clusters() {
        let set = clumped_set(6, 1);
        let mut graph = build_graph(&set, 2.0);
        let clusters = extract_clusters(&mut graph, &ProgressReporter::new());
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[1].members, vec![6]);
        assert_eq!(clusters[1].center, 6);
    }

    #[test]
    fn extraction_empties_the_graph() {
        let set = clumped_set(10, 5);
        let mut graph = build_graph(&set, 2.0);
        extract_clusters(&mut graph, &ProgressReporter::new());
        for i in 0..set.len() {
            assert!(!graph.contains(i));
        }
    }
}
