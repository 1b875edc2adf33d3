//! Data structures representing decoys and decoy collections.
//!
//! A [`Decoy`] is one candidate 3D model of the molecule (one point per
//! residue, centered at its centroid on construction). A [`DecoySet`] is the
//! ordered, length-validated collection a clustering run operates on.

pub mod decoy;
pub mod set;

pub use decoy::Decoy;
pub use set::{DecoySet, ModelError};
