use crate::core::models::atom::{Atom, AtomRole, Element};
use crate::core::models::ids::{ChainId, ResidueId};
use crate::core::models::residue::ResidueType;
use crate::core::models::system::MolecularSystem;
use crate::core::utils::geometry::{calculate_hn_position, distance};
use nalgebra::Point3;
use tracing::{debug, trace};

pub const AMIDE_H_BOND_LENGTH: f64 = 1.01;
pub const AMIDE_H_NAME: &str = "H";
/// Largest C(i-1)-N(i) distance still treated as a peptide bond.
pub const PEPTIDE_BOND_CUTOFF: f64 = 2.0;
/// Hydrogens this close to N count as an existing amide hydrogen.
pub const N_H_SEARCH_RADIUS: f64 = 2.0;

fn has_hydrogen_near(system: &MolecularSystem, residue_id: ResidueId, n_pos: &Point3<f64>) -> bool {
    system.residue(residue_id).is_some_and(|residue| {
        residue.atoms().iter().any(|&id| {
            system
                .atom(id)
                .is_some_and(|a| a.is_hydrogen() && distance(&a.position, n_pos) <= N_H_SEARCH_RADIUS)
        })
    })
}

fn amide_h_position(
    system: &MolecularSystem,
    prev_id: ResidueId,
    residue_id: ResidueId,
) -> Option<Point3<f64>> {
    // Modified residues without a known type still get one when they are peptide-bonded.
    let residue = system.residue(residue_id)?;
    if residue.residue_type == Some(ResidueType::Proline) {
        return None;
    }
    let n = system.find_atom_in_residue(residue_id, "N")?.position;
    let ca = system.find_atom_in_residue(residue_id, "CA")?.position;
    let c_prev = system.find_atom_in_residue(prev_id, "C")?.position;

    if distance(&c_prev, &n) > PEPTIDE_BOND_CUTOFF || has_hydrogen_near(system, residue_id, &n) {
        return None;
    }
    calculate_hn_position(&n, &ca, &c_prev, AMIDE_H_BOND_LENGTH)
}

/// Adds missing backbone amide hydrogens to one chain.
///
/// # Return
///
/// The number of hydrogens added.
pub fn add_amide_hydrogens_to_chain(system: &mut MolecularSystem, chain_id: ChainId) -> usize {
    let residues = match system.chain(chain_id) {
        Some(chain) => chain.residues().to_vec(),
        None => return 0,
    };

    let placements: Vec<(ResidueId, Point3<f64>)> = residues
        .windows(2)
        .filter_map(|pair| amide_h_position(system, pair[0], pair[1]).map(|pos| (pair[1], pos)))
        .collect();

    let mut added = 0;
    for (residue_id, position) in placements {
        let mut atom = Atom::new(AMIDE_H_NAME, residue_id, position);
        atom.element = Element::H;
        atom.role = AtomRole::Backbone;
        if system.add_atom_to_residue(residue_id, atom).is_some() {
            trace!(?residue_id, "Placed amide hydrogen");
            added += 1;
        }
    }
    added
}

/// Adds missing backbone amide hydrogens to every chain of the system.
///
/// Chain-initial residues and prolines are skipped, as are residues whose N already
/// carries a hydrogen. Running it twice adds nothing the second time.
pub fn add_amide_hydrogens(system: &mut MolecularSystem) -> usize {
    let chain_ids: Vec<ChainId> = system.chains_iter().map(|(id, _)| id).collect();
    let added = chain_ids
        .into_iter()
        .map(|chain_id| add_amide_hydrogens_to_chain(system, chain_id))
        .sum();
    debug!(added, "Amide hydrogens placed");
    added
}
