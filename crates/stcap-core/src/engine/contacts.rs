use crate::core::models::atom::Atom;
use crate::core::models::ids::ResidueId;
use crate::core::models::system::MolecularSystem;
use crate::core::utils::geometry::{angle_degrees, distance};
use crate::engine::config::ContactCriteria;
use crate::engine::utils::query::ChainIndex;
use nalgebra::Point3;
use thiserror::Error;

/// Why a contact could not be measured. Distinct from a measured contact that
/// simply fails the thresholds.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContactError {
    #[error("Residue {residue_number} is not present in the chain")]
    MissingResidue { residue_number: isize },
    #[error("Residue {0:?} is not part of the system")]
    UnknownResidue(ResidueId),
    #[error("Residue {residue_number} has no atom named '{atom_name}'")]
    MissingAtom {
        residue_number: isize,
        atom_name: String,
    },
    #[error("Residue {residue_number} has no hydrogen bonded to its backbone N")]
    MissingHydrogen { residue_number: isize },
    #[error("Angle at the amide hydrogen of residue {residue_number} is undefined")]
    DegenerateGeometry { residue_number: isize },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactMeasurement {
    /// Donor/acceptor heavy atom to backbone N distance (Å).
    pub distance: f64,
    /// Angle at the amide hydrogen, heavy atom-H-N (degrees).
    pub angle: f64,
}

impl ContactMeasurement {
    pub fn is_present(&self, criteria: &ContactCriteria) -> bool {
        self.distance < criteria.max_distance && self.angle >= criteria.min_angle
    }
}

fn residue_number(system: &MolecularSystem, residue_id: ResidueId) -> Result<isize, ContactError> {
    system
        .residue(residue_id)
        .map(|r| r.residue_number)
        .ok_or(ContactError::UnknownResidue(residue_id))
}

pub(crate) fn require_atom<'a>(
    system: &'a MolecularSystem,
    residue_id: ResidueId,
    atom_name: &str,
) -> Result<&'a Atom, ContactError> {
    let residue_number = residue_number(system, residue_id)?;
    system
        .find_atom_in_residue(residue_id, atom_name)
        .ok_or_else(|| ContactError::MissingAtom {
            residue_number,
            atom_name: atom_name.to_string(),
        })
}

/// The hydrogen of `residue_id` closest to `n_position`, if one lies within `radius`.
pub fn amide_hydrogen<'a>(
    system: &'a MolecularSystem,
    residue_id: ResidueId,
    n_position: &Point3<f64>,
    radius: f64,
) -> Option<&'a Atom> {
    let residue = system.residue(residue_id)?;
    residue
        .atoms()
        .iter()
        .filter_map(|&id| system.atom(id))
        .filter(|atom| atom.is_hydrogen())
        .map(|atom| (distance(&atom.position, n_position), atom))
        .filter(|(d, _)| *d <= radius)
        .min_by(|(a, _), (b, _)| a.total_cmp(b))
        .map(|(_, atom)| atom)
}

/// Measures the contact between a heavy atom and the backbone amide of `target`.
///
/// # Arguments
///
/// * `system` - The structure holding both residues.
/// * `donor` - Position of the side-chain or carbonyl oxygen.
/// * `target` - The residue whose backbone N and amide hydrogen take part.
/// * `criteria` - Supplies the hydrogen search radius.
///
/// # Errors
///
/// Returns [`ContactError`] when the target N or its hydrogen is absent, or when the
/// angle at the hydrogen cannot be formed.
pub fn measure_contact(
    system: &MolecularSystem,
    donor: &Point3<f64>,
    target: ResidueId,
    criteria: &ContactCriteria,
) -> Result<ContactMeasurement, ContactError> {
    let residue_number = residue_number(system, target)?;
    let n = require_atom(system, target, "N")?.position;
    let h = amide_hydrogen(system, target, &n, criteria.hydrogen_search_radius)
        .ok_or(ContactError::MissingHydrogen { residue_number })?;
    let angle = angle_degrees(donor, &h.position, &n)
        .ok_or(ContactError::DegenerateGeometry { residue_number })?;
    Ok(ContactMeasurement {
        distance: distance(donor, &n),
        angle,
    })
}

/// Residues at offsets 0, +2, +3 and +4 of a candidate capping residue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapWindow {
    pub origin: ResidueId,
    pub plus_two: ResidueId,
    pub plus_three: ResidueId,
    pub plus_four: ResidueId,
}

impl CapWindow {
    /// Looks up the window members of the residue numbered `start` in a chain index.
    pub fn resolve(index: &ChainIndex, start: isize) -> Result<Self, ContactError> {
        let at = |offset: isize| {
            index
                .get(start + offset)
                .ok_or(ContactError::MissingResidue {
                    residue_number: start + offset,
                })
        };
        Ok(Self {
            origin: at(0)?,
            plus_two: at(2)?,
            plus_three: at(3)?,
            plus_four: at(4)?,
        })
    }
}

/// The four contacts that define a capping-loop pattern.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapContacts {
    /// Side-chain oxygen to the amide of residue +2.
    pub side_chain_2: ContactMeasurement,
    /// Side-chain oxygen to the amide of residue +3.
    pub side_chain_3: ContactMeasurement,
    /// Backbone O of the cap to the amide of residue +3.
    pub main_chain_3: ContactMeasurement,
    /// Backbone O of the cap to the amide of residue +4.
    pub main_chain_4: ContactMeasurement,
}

/// Measures all four contacts of a window. Any failed measurement fails the whole
/// window.
pub fn measure_cap_contacts(
    system: &MolecularSystem,
    window: &CapWindow,
    cap_atom_name: &str,
    criteria: &ContactCriteria,
) -> Result<CapContacts, ContactError> {
    let cap = require_atom(system, window.origin, cap_atom_name)?.position;
    let carbonyl = require_atom(system, window.origin, "O")?.position;

    Ok(CapContacts {
        side_chain_2: measure_contact(system, &cap, window.plus_two, criteria)?,
        side_chain_3: measure_contact(system, &cap, window.plus_three, criteria)?,
        main_chain_3: measure_contact(system, &carbonyl, window.plus_three, criteria)?,
        main_chain_4: measure_contact(system, &carbonyl, window.plus_four, criteria)?,
    })
}
