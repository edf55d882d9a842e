use super::ids::ResidueId;

/// Composition of a chain, decided once its residues are known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChainType {
    /// At least one residue is a standard or modified amino acid.
    Protein,
    /// Only non-polymer hetero groups.
    Ligand,
    /// Only solvent.
    Water,
    #[default]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    /// The one-character PDB chain identifier.
    pub id: char,
    pub chain_type: ChainType,
    pub(crate) residues: Vec<ResidueId>, // file order
}

impl Chain {
    pub(crate) fn new(id: char, chain_type: ChainType) -> Self {
        Self {
            id,
            chain_type,
            residues: Vec::new(),
        }
    }

    pub fn residues(&self) -> &[ResidueId] {
        &self.residues
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }
}
