//! # Workflows Module
//!
//! The public, user-facing entry points. A workflow strings the engine
//! phases together into one call: validate the input, optionally drop
//! outliers, derive the threshold, build the pruned neighbor graph, and
//! extract clusters largest-first. Callers hold a [`ClusterOutcome`]
//! afterwards and decide themselves whether an ambiguous result warrants
//! the refined re-run.

pub mod cluster;

pub use cluster::{AmbiguityReport, ClusterOutcome, ClusterSummary, Contender, refine, run};
