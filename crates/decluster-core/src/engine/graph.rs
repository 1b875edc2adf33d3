use crate::core::geometry::{estimated_distance, exact_distance};
use crate::core::models::DecoySet;
use crate::engine::coarse::CoarseClusters;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::references::ReferenceSet;
use tracing::info;

/// Largest decoy count for which the dense full-matrix storage is used.
/// Above it, per-node distance rows would dominate memory.
pub const DENSE_MODE_LIMIT: usize = 13_000;

/// Largest decoy count for which per-neighbor distances are stored. Above
/// it, the compact mode keeps only the neighbor indices.
pub const SPARSE_MODE_LIMIT: usize = 65_535;

/// Internal adjacency representation, selected by decoy-set size so peak
/// memory stays proportional to edge count on large sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    /// Full per-node distance row; O(1) distance lookups.
    Dense,
    /// Adjacency lists with parallel per-neighbor distances.
    Sparse,
    /// Adjacency lists only; minimal footprint, no stored distances.
    Compact,
}

impl StorageMode {
    pub fn for_decoy_count(n: usize) -> Self {
        if n <= DENSE_MODE_LIMIT {
            StorageMode::Dense
        } else if n <= SPARSE_MODE_LIMIT {
            StorageMode::Sparse
        } else {
            StorageMode::Compact
        }
    }
}

#[derive(Debug)]
struct Node {
    /// Neighbor indices in insertion order.
    neighbors: Vec<u32>,
    /// Parallel distances; empty in compact mode.
    dists: Vec<f32>,
    /// Full distance row; allocated in dense mode only.
    row: Vec<f32>,
}

impl Node {
    fn new(mode: StorageMode, n: usize) -> Self {
        Self {
            neighbors: Vec::new(),
            dists: Vec::new(),
            row: match mode {
                StorageMode::Dense => vec![f32::INFINITY; n],
                _ => Vec::new(),
            },
        }
    }
}

/// Counters describing how the bound pruning fared during construction.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildStats {
    pub pairs_total: u64,
    pub pruned_coarse: u64,
    pub pruned_lower_bound: u64,
    pub accepted_upper_bound: u64,
    pub pruned_signature: u64,
    pub exact_evaluations: u64,
}

/// Threshold-based adjacency over a decoy set.
///
/// An edge `(i, j)` exists iff the exact superposition distance is within
/// the construction threshold. Node removal is the only mutation after
/// construction; the extractor destructively consumes the graph as clusters
/// are formed.
#[derive(Debug)]
pub struct NeighborGraph {
    mode: StorageMode,
    threshold: f64,
    nodes: Vec<Option<Node>>,
    stats: BuildStats,
}

impl NeighborGraph {
    /// Builds the graph for a fixed threshold, minimizing exact distance
    /// evaluations.
    ///
    /// For every pair the reference bounds are consulted first: a lower
    /// bound above the threshold certifies a non-neighbor, an upper bound
    /// within it certifies a neighbor (recorded with the bound midpoint as
    /// its distance). Only pairs whose bounds straddle the threshold fall
    /// through to the signature pre-filter and, if still undecided, to the
    /// exact computation. An optional coarse grouping vetoes pairs whose
    /// buckets are provably too far apart.
    pub fn build(
        set: &DecoySet,
        threshold: f64,
        refs: &ReferenceSet,
        coarse: Option<&CoarseClusters>,
        reporter: &ProgressReporter,
    ) -> Self {
        let n = set.len();
        let mode = StorageMode::for_decoy_count(n);
        let mut graph = Self {
            mode,
            threshold,
            nodes: (0..n).map(|_| Some(Node::new(mode, n))).collect(),
            stats: BuildStats::default(),
        };

        for i in 0..n {
            for j in (i + 1)..n {
                graph.stats.pairs_total += 1;

                if let Some(coarse) = coarse {
                    if !coarse.may_neighbor(i, j, threshold) {
                        graph.stats.pruned_coarse += 1;
                        continue;
                    }
                }

                let (lower, upper) = refs.bounds(i, j);
                if lower > threshold {
                    graph.stats.pruned_lower_bound += 1;
                    continue;
                }
                if upper <= threshold {
                    graph.stats.accepted_upper_bound += 1;
                    graph.add_edge(i, j, 0.5 * (lower + upper));
                    continue;
                }

                if estimated_distance(set.decoy(i), set.decoy(j)) > threshold {
                    graph.stats.pruned_signature += 1;
                    continue;
                }

                graph.stats.exact_evaluations += 1;
                let d = exact_distance(set.decoy(i), set.decoy(j));
                if d <= threshold {
                    graph.add_edge(i, j, d);
                }
            }
        }

        let stats = graph.stats;
        info!(
            decoys = n,
            mode = ?mode,
            threshold,
            pairs = stats.pairs_total,
            exact = stats.exact_evaluations,
            lower_pruned = stats.pruned_lower_bound,
            upper_accepted = stats.accepted_upper_bound,
            signature_pruned = stats.pruned_signature,
            coarse_pruned = stats.pruned_coarse,
            "Neighbor graph built"
        );
        reporter.report(Progress::StatusUpdate {
            text: format!(
                "graph: {} decoys, {} exact evaluations of {} pairs",
                n, stats.exact_evaluations, stats.pairs_total
            ),
        });
        graph
    }

    pub fn mode(&self) -> StorageMode {
        self.mode
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether `i` still owns a node (not yet removed by extraction).
    pub fn contains(&self, i: usize) -> bool {
        self.nodes.get(i).is_some_and(|n| n.is_some())
    }

    /// Current degree of `i`; zero once removed.
    pub fn degree_of(&self, i: usize) -> usize {
        self.nodes[i].as_ref().map_or(0, |n| n.neighbors.len())
    }

    /// Neighbor indices of `i` in insertion order.
    pub fn neighbors_of(&self, i: usize) -> &[u32] {
        self.nodes[i].as_ref().map_or(&[], |n| &n.neighbors)
    }

    /// Recorded distance between neighbors `i` and `j`; `None` when the
    /// pair is not an edge or the storage mode keeps no distances.
    pub fn distance(&self, i: usize, j: usize) -> Option<f64> {
        let node = self.nodes[i].as_ref()?;
        match self.mode {
            StorageMode::Dense => {
                let d = node.row[j];
                d.is_finite().then_some(d as f64)
            }
            StorageMode::Sparse => {
                let pos = node.neighbors.iter().position(|&x| x as usize == j)?;
                Some(node.dists[pos] as f64)
            }
            StorageMode::Compact => None,
        }
    }

    fn add_edge(&mut self, i: usize, j: usize, d: f64) {
        self.add_half_edge(i, j, d);
        self.add_half_edge(j, i, d);
    }

    fn add_half_edge(&mut self, from: usize, to: usize, d: f64) {
        // Nodes are only removed after construction, so this always holds.
        let Some(node) = self.nodes[from].as_mut() else {
            return;
        };
        node.neighbors.push(to as u32);
        match self.mode {
            StorageMode::Dense => node.row[to] = d as f32,
            StorageMode::Sparse => node.dists.push(d as f32),
            StorageMode::Compact => {}
        }
    }

    /// Discards the node for `i` and returns its final neighbor list.
    ///
    /// The edges pointing back at `i` from surviving nodes are *not*
    /// touched here; the extractor removes them explicitly so degree
    /// bookkeeping stays in one place.
    pub fn remove_node(&mut self, i: usize) -> Option<Vec<u32>> {
        self.nodes[i].take().map(|n| n.neighbors)
    }

    /// Removes the half-edge `from → to`, keeping degree and distances in
    /// sync. No-op when the edge does not exist.
    pub fn remove_edge_to(&mut self, from: usize, to: usize) {
        let mode = self.mode;
        if let Some(node) = self.nodes[from].as_mut() {
            if let Some(pos) = node.neighbors.iter().position(|&x| x as usize == to) {
                node.neighbors.swap_remove(pos);
                match mode {
                    StorageMode::Dense => node.row[to] = f32::INFINITY,
                    StorageMode::Sparse => {
                        node.dists.swap_remove(pos);
                    }
                    StorageMode::Compact => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::Decoy;
    use nalgebra::Point3;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_set(n: usize, residues: usize, seed: u64) -> DecoySet {
        let mut rng = StdRng::seed_from_u64(seed);
        let base: Vec<Point3<f64>> = (0..residues)
            .map(|i| Point3::new(i as f64 * 3.8, 0.0, 0.0))
            .collect();
        let decoys = (0..n)
            .map(|i| {
                // Varied jitter so distances spread across the threshold.
                let spread = 0.2 + 4.0 * (i % 7) as f64 / 7.0;
                let coords = base
                    .iter()
                    .map(|p| {
                        Point3::new(
                            p.x + rng.gen_range(-spread..spread),
                            p.y + rng.gen_range(-spread..spread),
                            p.z + rng.gen_range(-spread..spread),
                        )
                    })
                    .collect();
                Decoy::new(format!("d{i}"), coords)
            })
            .collect();
        DecoySet::new(decoys).unwrap()
    }

    fn brute_force_edges(set: &DecoySet, threshold: f64) -> Vec<(usize, usize)> {
        let mut edges = Vec::new();
        for i in 0..set.len() {
            for j in (i + 1)..set.len() {
                if exact_distance(set.decoy(i), set.decoy(j)) <= threshold {
                    edges.push((i, j));
                }
            }
        }
        edges
    }

    #[test]
    fn storage_mode_follows_decoy_count() {
        assert_eq!(StorageMode::for_decoy_count(50), StorageMode::Dense);
        assert_eq!(
            StorageMode::for_decoy_count(DENSE_MODE_LIMIT + 1),
            StorageMode::Sparse
        );
        assert_eq!(
            StorageMode::for_decoy_count(SPARSE_MODE_LIMIT + 1),
            StorageMode::Compact
        );
    }

    #[test]
    fn pruned_graph_matches_brute_force_on_synthetic_set() {
        let set = random_set(50, 12, 21);
        let threshold = 2.5;
        let refs = ReferenceSet::build(&set).unwrap();
        let graph = NeighborGraph::build(&set, threshold, &refs, None, &ProgressReporter::new());

        for (i, j) in brute_force_edges(&set, threshold) {
            assert!(
                graph.neighbors_of(i).contains(&(j as u32)),
                "edge ({i},{j}) missing from pruned graph"
            );
            assert!(
                graph.neighbors_of(j).contains(&(i as u32)),
                "edge ({j},{i}) missing from pruned graph"
            );
        }
        for i in 0..set.len() {
            for &j in graph.neighbors_of(i) {
                let exact = exact_distance(set.decoy(i), set.decoy(j as usize));
                assert!(
                    exact <= threshold + 1e-6,
                    "non-neighbor pair ({i},{j}) at {exact} recorded as edge"
                );
            }
        }
    }

    #[test]
    fn bound_pruning_avoids_some_exact_evaluations() {
        let set = random_set(60, 12, 22);
        let refs = ReferenceSet::build(&set).unwrap();
        let graph = NeighborGraph::build(&set, 1.0, &refs, None, &ProgressReporter::new());
        let stats = graph.stats();
        assert!(stats.exact_evaluations < stats.pairs_total);
    }

    #[test]
    fn degrees_track_neighbor_lists() {
        let set = random_set(30, 10, 23);
        let refs = ReferenceSet::build(&set).unwrap();
        let graph = NeighborGraph::build(&set, 3.0, &refs, None, &ProgressReporter::new());
        for i in 0..set.len() {
            assert_eq!(graph.degree_of(i), graph.neighbors_of(i).len());
        }
    }

    #[test]
    fn recorded_distances_are_symmetric_in_dense_mode() {
        let set = random_set(30, 10, 24);
        let refs = ReferenceSet::build(&set).unwrap();
        let graph = NeighborGraph::build(&set, 3.0, &refs, None, &ProgressReporter::new());
        assert_eq!(graph.mode(), StorageMode::Dense);
        for i in 0..set.len() {
            for &j in graph.neighbors_of(i) {
                let a = graph.distance(i, j as usize).unwrap();
                let b = graph.distance(j as usize, i).unwrap();
                assert_eq!(a, b);
            }
        }
    }

    #[test]
    fn removing_a_node_and_its_back_edges_updates_degrees() {
        let set = random_set(30, 10, 25);
        let refs = ReferenceSet::build(&set).unwrap();
        let mut graph = NeighborGraph::build(&set, 3.0, &refs, None, &ProgressReporter::new());

        let target = (0..set.len())
            .max_by_key(|&i| graph.degree_of(i))
            .unwrap();
        let neighbors = graph.remove_node(target).unwrap();
        assert!(!neighbors.is_empty());
        assert!(!graph.contains(target));
        assert_eq!(graph.degree_of(target), 0);

        for &u in &neighbors {
            let before = graph.degree_of(u as usize);
            graph.remove_edge_to(u as usize, target);
            assert_eq!(graph.degree_of(u as usize), before - 1);
            assert!(!graph.neighbors_of(u as usize).contains(&(target as u32)));
        }
    }
}
