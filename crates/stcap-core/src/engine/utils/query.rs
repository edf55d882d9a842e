use crate::core::models::ids::{AtomId, ChainId, ResidueId};
use crate::core::models::system::MolecularSystem;
use crate::core::protonation::PEPTIDE_BOND_CUTOFF;
use crate::core::utils::geometry::distance;
use std::collections::{BTreeMap, HashMap};

/// The numeric residues of one chain, sorted by residue number.
///
/// Residues with an insertion code or a negative number are left out. When a number
/// occurs twice the first residue read keeps it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainIndex {
    numbers: Vec<isize>,
    residues: Vec<ResidueId>,
    position: HashMap<isize, usize>,
}

impl ChainIndex {
    pub fn build(system: &MolecularSystem, chain_id: ChainId) -> Self {
        let mut sorted: BTreeMap<isize, ResidueId> = BTreeMap::new();
        if let Some(chain) = system.chain(chain_id) {
            for &rid in chain.residues() {
                if let Some(residue) = system.residue(rid) {
                    if residue.has_numeric_index() {
                        sorted.entry(residue.residue_number).or_insert(rid);
                    }
                }
            }
        }

        let (numbers, residues): (Vec<isize>, Vec<ResidueId>) = sorted.into_iter().unzip();
        let position = numbers.iter().enumerate().map(|(i, &n)| (n, i)).collect();
        Self {
            numbers,
            residues,
            position,
        }
    }

    pub fn numbers(&self) -> &[isize] {
        &self.numbers
    }

    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    pub fn get(&self, residue_number: isize) -> Option<ResidueId> {
        self.position
            .get(&residue_number)
            .map(|&i| self.residues[i])
    }

    pub fn last_number(&self) -> Option<isize> {
        self.numbers.last().copied()
    }
}

fn peptide_bonded(system: &MolecularSystem, c_owner: ResidueId, n_owner: ResidueId) -> bool {
    match (
        system.find_atom_in_residue(c_owner, "C"),
        system.find_atom_in_residue(n_owner, "N"),
    ) {
        (Some(c), Some(n)) => distance(&c.position, &n.position) <= PEPTIDE_BOND_CUTOFF,
        _ => false,
    }
}

/// Whether the residue at `position` in `residues` carries a full backbone and is
/// peptide-bonded to the residue before or after it.
fn is_linked_in_chain(system: &MolecularSystem, residues: &[ResidueId], position: usize) -> bool {
    let rid = residues[position];
    let has_backbone = ["N", "CA", "C"]
        .iter()
        .all(|name| system.find_atom_in_residue(rid, name).is_some());
    if !has_backbone {
        return false;
    }
    let after_prev = position
        .checked_sub(1)
        .is_some_and(|p| peptide_bonded(system, residues[p], rid));
    let before_next = residues
        .get(position + 1)
        .is_some_and(|&next| peptide_bonded(system, rid, next));
    after_prev || before_next
}

/// Polymer residues of a chain, in file order.
///
/// Standard amino acids and nucleotides always count. Any other residue counts when
/// it is peptide-bonded into the chain, which keeps modified residues such as SEP or
/// TPO that files record as HETATM.
pub fn polymer_residue_ids(system: &MolecularSystem, chain_id: ChainId) -> Vec<ResidueId> {
    let Some(chain) = system.chain(chain_id) else {
        return Vec::new();
    };
    let residues = chain.residues();
    residues
        .iter()
        .enumerate()
        .filter(|&(position, &rid)| {
            system.residue(rid).is_some_and(|residue| {
                residue.is_amino_acid()
                    || residue.is_nucleotide()
                    || is_linked_in_chain(system, residues, position)
            })
        })
        .map(|(_, &rid)| rid)
        .collect()
}

/// Atoms of the polymer residues of a chain, in file order.
pub fn polymer_atom_ids(system: &MolecularSystem, chain_id: ChainId) -> Vec<AtomId> {
    polymer_residue_ids(system, chain_id)
        .into_iter()
        .filter_map(|rid| system.residue(rid))
        .flat_map(|residue| residue.atoms().iter().copied())
        .collect()
}

/// Mean number of atoms per numeric residue of a chain, or `None` for a chain
/// without numeric residues.
pub fn mean_atoms_per_residue(system: &MolecularSystem, chain_id: ChainId) -> Option<f64> {
    let index = ChainIndex::build(system, chain_id);
    if index.is_empty() {
        return None;
    }
    let chain = system.chain(chain_id)?;
    let atoms: usize = chain
        .residues()
        .iter()
        .filter_map(|&rid| system.residue(rid))
        .filter(|residue| residue.has_numeric_index())
        .map(|residue| residue.atoms().len())
        .sum();
    Some(atoms as f64 / index.len() as f64)
}
