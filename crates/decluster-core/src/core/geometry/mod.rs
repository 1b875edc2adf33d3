//! Optimal rigid superposition geometry.
//!
//! [`superpose`] computes the minimum RMSD between two equal-length decoys
//! over all rotations and translations, via the eigenvalues of the 3×3
//! correlation matrix. [`eigen`] provides the two interchangeable symmetric
//! 3×3 eigen-solvers the computation rests on: a closed-form trigonometric
//! cubic solver (fast, no fallback for degenerate spectra) and an iterative
//! cyclic-Jacobi solver (always succeeds, bounded sweeps).

pub mod eigen;
pub mod superpose;

pub use eigen::{CubicEigen, JacobiEigen, SymmetricEigen3};
pub use superpose::{estimated_distance, exact_distance};
