//! # Decluster Core Library
//!
//! A clustering engine for protein decoy sets, grouping thousands of
//! alternative conformations of the same molecule into clusters of mutually
//! similar structures. Similarity is the minimum RMSD achievable after
//! optimal rigid superposition, and the most representative (consensus)
//! structure is the center of the largest cluster.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict three-layer architecture to ensure a
//! clear separation of concerns, making it modular, testable, and extensible.
//!
//! - **[`core`]: The Foundation.** Contains stateless data models
//!   ([`Decoy`](core::models::Decoy), [`DecoySet`](core::models::DecoySet)),
//!   the superposition geometry (cross-covariance, symmetric 3×3
//!   eigen-solvers, optimal RMSD), and the C-alpha-trace PDB reader.
//!
//! - **[`engine`]: The Logic Core.** This stateful layer holds the clustering
//!   machinery: the reference-distance cache used for triangle-inequality
//!   bound pruning, the adaptive neighbor graph (dense, sparse, or compact
//!   storage chosen by set size), the threshold estimation strategies, and
//!   the greedy largest-cluster extractor.
//!
//! - **[`workflows`]: The Public API.** The highest-level, user-facing layer.
//!   [`workflows::cluster::run`] executes the complete pipeline (outlier
//!   filtering, threshold estimation, graph construction, extraction) and
//!   [`workflows::cluster::refine`] re-runs it on the two contending clusters
//!   when a result is flagged ambiguous.

pub mod core;
pub mod engine;
pub mod workflows;
