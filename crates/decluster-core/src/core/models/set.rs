use super::decoy::Decoy;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Decoy set is empty")]
    EmptySet,

    #[error(
        "Residue count mismatch for decoy '{name}': expected {expected} residues, found {found}"
    )]
    ResidueCountMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("Decoy '{name}' has no residues")]
    NoResidues { name: String },
}

/// An ordered collection of decoys sharing one residue count.
///
/// Construction validates the length invariant; a mismatch is a fatal input
/// error surfaced before any clustering work begins. The set is read-only
/// for the lifetime of a run.
#[derive(Debug, Clone)]
pub struct DecoySet {
    decoys: Vec<Decoy>,
    residue_count: usize,
}

impl DecoySet {
    pub fn new(decoys: Vec<Decoy>) -> Result<Self, ModelError> {
        let first = decoys.first().ok_or(ModelError::EmptySet)?;
        let residue_count = first.residue_count();
        if residue_count == 0 {
            return Err(ModelError::NoResidues {
                name: first.name().to_string(),
            });
        }

        for decoy in &decoys {
            if decoy.residue_count() != residue_count {
                return Err(ModelError::ResidueCountMismatch {
                    name: decoy.name().to_string(),
                    expected: residue_count,
                    found: decoy.residue_count(),
                });
            }
        }

        Ok(Self {
            decoys,
            residue_count,
        })
    }

    pub fn len(&self) -> usize {
        self.decoys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoys.is_empty()
    }

    /// Residue count shared by every decoy in the set.
    pub fn residue_count(&self) -> usize {
        self.residue_count
    }

    pub fn decoy(&self, index: usize) -> &Decoy {
        &self.decoys[index]
    }

    pub fn decoys(&self) -> &[Decoy] {
        &self.decoys
    }

    pub fn iter(&self) -> impl Iterator<Item = &Decoy> {
        self.decoys.iter()
    }

    /// Builds a new set containing the decoys at `indices`, in order.
    ///
    /// Used by the refined re-run, which operates on the members of the two
    /// contending clusters with a freshly estimated threshold.
    pub fn subset(&self, indices: &[usize]) -> Result<Self, ModelError> {
        Self::new(indices.iter().map(|&i| self.decoys[i].clone()).collect())
    }
}
