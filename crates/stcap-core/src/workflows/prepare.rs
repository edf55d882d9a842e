use crate::core::models::ids::{ChainId, ResidueId};
use crate::core::models::residue::is_water_name;
use crate::core::models::system::MolecularSystem;
use crate::core::protonation::add_amide_hydrogens;
use crate::engine::config::ChainFilter;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::utils::query::{ChainIndex, mean_atoms_per_residue, polymer_residue_ids};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info, instrument};

/// Why a target chain is not searched.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    ChainNotFound(char),
    SparseChain { chain_id: char, mean_atoms: f64 },
    InsufficientChainLength { chain_id: char, residues: usize },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::ChainNotFound(id) => write!(f, "chain '{}' not found", id),
            SkipReason::SparseChain {
                chain_id,
                mean_atoms,
            } => write!(
                f,
                "chain '{}' has {:.2} atoms per residue",
                chain_id, mean_atoms
            ),
            SkipReason::InsufficientChainLength { chain_id, residues } => {
                write!(f, "chain '{}' has only {} residues", chain_id, residues)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct PreparedStructure {
    pub system: MolecularSystem,
    pub target: ChainId,
    pub removed_residues: usize,
    pub hydrogens_added: usize,
}

fn solvent_and_ligand_residues(system: &MolecularSystem) -> Vec<ResidueId> {
    let polymer: HashSet<ResidueId> = system
        .chains_iter()
        .flat_map(|(chain_id, _)| polymer_residue_ids(system, chain_id))
        .collect();
    system
        .residues_iter()
        .filter(|(id, residue)| {
            is_water_name(&residue.name) || (residue.is_hetero && !polymer.contains(id))
        })
        .map(|(id, _)| id)
        .collect()
}

/// Copies `system` without waters and non-polymer hetero residues. Modified
/// residues bonded into a chain stay. Chains left without residues are dropped.
///
/// # Return
///
/// The filtered copy and the number of residues removed.
pub fn strip_solvent_and_ligands(system: &MolecularSystem) -> (MolecularSystem, usize) {
    let mut stripped = system.clone();
    let doomed = solvent_and_ligand_residues(&stripped);
    let removed = doomed.len();
    for residue_id in doomed {
        stripped.remove_residue(residue_id);
    }

    let empty: Vec<ChainId> = stripped
        .chains_iter()
        .filter(|(_, chain)| chain.is_empty())
        .map(|(id, _)| id)
        .collect();
    for chain_id in empty {
        stripped.remove_chain(chain_id);
    }
    (stripped, removed)
}

fn select_target(
    system: &MolecularSystem,
    chain_id: char,
    filter: &ChainFilter,
) -> Result<ChainId, SkipReason> {
    let target = system
        .find_chain_by_id(chain_id)
        .ok_or(SkipReason::ChainNotFound(chain_id))?;

    let mean_atoms = mean_atoms_per_residue(system, target).unwrap_or(0.0);
    if mean_atoms < filter.min_atoms_per_residue {
        return Err(SkipReason::SparseChain {
            chain_id,
            mean_atoms,
        });
    }

    let residues = ChainIndex::build(system, target).len();
    if residues < filter.min_residues {
        return Err(SkipReason::InsufficientChainLength { chain_id, residues });
    }
    Ok(target)
}

/// Produces the working copy of a structure for a search on `chain_id`.
///
/// Solvent and ligands are removed, the target chain is checked against `filter`
/// (density first, then length), and amide hydrogens are added. The input system is
/// never modified.
///
/// # Errors
///
/// Returns a [`SkipReason`] when the target chain is absent after stripping or fails
/// one of the filters.
#[instrument(skip_all, name = "prepare_workflow", fields(chain = %chain_id))]
pub fn run(
    system: &MolecularSystem,
    chain_id: char,
    filter: &ChainFilter,
    reporter: &ProgressReporter,
) -> Result<PreparedStructure, SkipReason> {
    reporter.report(Progress::PhaseStart {
        name: "Preparation",
    });

    let (mut working, removed_residues) = strip_solvent_and_ligands(system);
    debug!(removed_residues, "Solvent and ligands removed");

    let outcome = select_target(&working, chain_id, filter);

    let result = outcome.map(|target| {
        let hydrogens_added = add_amide_hydrogens(&mut working);
        info!(hydrogens_added, "Structure prepared.");
        PreparedStructure {
            system: working,
            target,
            removed_residues,
            hydrogens_added,
        }
    });

    reporter.report(Progress::PhaseFinish);
    result
}
