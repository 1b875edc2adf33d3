//! Structure input.
//!
//! Decoys arrive as C-alpha traces read from PDB files; a decoy list file
//! names one PDB path per line. Parsing is deliberately minimal, covering
//! only the records the clustering engine needs, with line-numbered errors.

pub mod pdb;

pub use pdb::{
    PdbError, PdbParseErrorKind, PdbReadOptions, load_decoy, load_decoy_list, read_ca_trace,
};
