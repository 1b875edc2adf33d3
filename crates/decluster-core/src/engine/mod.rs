//! # Engine Module
//!
//! The run-scoped clustering machinery. Everything here is built once per
//! clustering run against a fixed [`DecoySet`](crate::core::models::DecoySet)
//! and a fixed threshold; a re-run with a refined decoy subset rebuilds these
//! structures rather than mutating them in place.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Threshold strategy, filtering flags,
//!   ambiguity margin, sampling seed
//! - **Reference Cache** ([`references`]) - Precomputed decoy-to-reference
//!   distances backing triangle-inequality bound pruning
//! - **Outlier Filter** ([`filter`]) - Optional removal of decoys far from a
//!   random sample
//! - **Coarse Grouping** ([`coarse`]) - Optional leader clustering that
//!   bounds the pairs the graph builder attempts on very large sets
//! - **Neighbor Graph** ([`graph`]) - Threshold-based adjacency with dense,
//!   sparse, or compact storage chosen by set size
//! - **Threshold Estimation** ([`threshold`]) - Sampled-distance strategies
//!   deriving the similarity threshold
//! - **Cluster Extraction** ([`extract`]) - Greedy largest-neighborhood
//!   extraction over the remaining working set
//! - **Progress** ([`progress`]) and **Errors** ([`error`])

pub mod coarse;
pub mod config;
pub mod error;
pub mod extract;
pub mod filter;
pub mod graph;
pub mod progress;
pub mod references;
pub mod threshold;
