//! # Core Module
//!
//! Fundamental building blocks for decoy clustering: the decoy data model,
//! the optimal-superposition geometry, and structure input.
//!
//! ## Architecture
//!
//! - **Decoy Representation** ([`models`]) - Centered coordinate arrays with
//!   derived signatures, and the validated decoy collection
//! - **Superposition Geometry** ([`geometry`]) - Cross-covariance, symmetric
//!   3×3 eigen-solvers, and the optimal-RMSD distance functions
//! - **File I/O** ([`io`]) - C-alpha-trace PDB reading and decoy-list loading
//!
//! Everything in this layer is stateless with respect to a clustering run;
//! the run-scoped machinery lives in [`crate::engine`].

pub mod geometry;
pub mod io;
pub mod models;
