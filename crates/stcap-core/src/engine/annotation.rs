use crate::core::models::ids::ResidueId;
use crate::core::models::system::MolecularSystem;
use crate::core::protonation::PEPTIDE_BOND_CUTOFF;
use crate::core::secondary::{DsspState, assign_model};
use crate::core::utils::geometry::{dihedral_degrees, distance};
use crate::engine::config::AnnotationConfig;
use crate::engine::error::EngineError;
use crate::engine::motif::MotifHit;
use crate::engine::utils::query::ChainIndex;
use nalgebra::Point3;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Source of per-residue secondary-structure codes.
pub trait SecondaryStructureProvider {
    /// One-letter code of a residue, or `None` when it cannot be assigned.
    fn code(&self, chain_id: char, residue_number: isize) -> Option<char>;
}

/// Kabsch–Sander assignment of a whole structure, computed once up front and keyed per chain.
#[derive(Debug, Clone, Default)]
pub struct DsspAssigner {
    states: HashMap<(char, isize), DsspState>,
}

impl DsspAssigner {
    pub fn new(system: &MolecularSystem) -> Self {
        let mut states = HashMap::new();
        let assignment = assign_model(system);
        for (&rid, &state) in assignment.residues.iter().zip(&assignment.states) {
            let Some(residue) = system.residue(rid) else {
                continue;
            };
            let Some(chain) = system.chain(residue.chain_id) else {
                continue;
            };
            if residue.has_numeric_index() {
                states
                    .entry((chain.id, residue.residue_number))
                    .or_insert(state);
            }
        }
        Self { states }
    }
}

impl SecondaryStructureProvider for DsspAssigner {
    fn code(&self, chain_id: char, residue_number: isize) -> Option<char> {
        self.states
            .get(&(chain_id, residue_number))
            .map(|state| state.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecondaryStructureEntry {
    Code(char),
    Missing,
}

impl fmt::Display for SecondaryStructureEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecondaryStructureEntry::Code(c) => write!(f, "{}", c),
            SecondaryStructureEntry::Missing => f.write_str("Missing"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackboneDihedral {
    pub residue_number: isize,
    pub phi: f64,
    pub psi: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HitAnnotation {
    pub hit: MotifHit,
    /// Residue names around the hit, in chain order.
    pub sequence: Vec<String>,
    /// Distinct codes in order of first appearance.
    pub secondary_structure: Vec<SecondaryStructureEntry>,
    pub dihedrals: Vec<BackboneDihedral>,
}

fn backbone_position(system: &MolecularSystem, rid: ResidueId, name: &str) -> Option<Point3<f64>> {
    system.find_atom_in_residue(rid, name).map(|a| a.position)
}

fn backbone_dihedral(
    system: &MolecularSystem,
    index: &ChainIndex,
    residue_number: isize,
) -> Option<BackboneDihedral> {
    let prev = index.get(residue_number - 1)?;
    let current = index.get(residue_number)?;
    let next = index.get(residue_number + 1)?;

    let c_prev = backbone_position(system, prev, "C")?;
    let n = backbone_position(system, current, "N")?;
    let ca = backbone_position(system, current, "CA")?;
    let c = backbone_position(system, current, "C")?;
    let n_next = backbone_position(system, next, "N")?;

    if distance(&c_prev, &n) > PEPTIDE_BOND_CUTOFF || distance(&c, &n_next) > PEPTIDE_BOND_CUTOFF {
        return None;
    }

    Some(BackboneDihedral {
        residue_number,
        phi: dihedral_degrees(&c_prev, &n, &ca, &c)?,
        psi: dihedral_degrees(&n, &ca, &c, &n_next)?,
    })
}

fn dedup_in_order(
    entries: impl IntoIterator<Item = SecondaryStructureEntry>,
) -> Vec<SecondaryStructureEntry> {
    let mut seen = HashSet::new();
    entries.into_iter().filter(|e| seen.insert(*e)).collect()
}

/// Collects the sequence, secondary structure and backbone dihedrals around a hit.
///
/// Positions absent from the chain are left out of the sequence and dihedral
/// lists; in the secondary-structure list they become
/// [`SecondaryStructureEntry::Missing`].
///
/// # Errors
///
/// Returns [`EngineError::ChainNotFound`] if the hit's chain is not in `system`.
pub fn annotate_hit(
    system: &MolecularSystem,
    hit: &MotifHit,
    provider: &dyn SecondaryStructureProvider,
    config: &AnnotationConfig,
) -> Result<HitAnnotation, EngineError> {
    let chain_id = system
        .find_chain_by_id(hit.chain_id)
        .ok_or(EngineError::ChainNotFound(hit.chain_id))?;
    let index = ChainIndex::build(system, chain_id);
    let x = hit.start_index;

    let sequence = config
        .sequence_window
        .indices(x)
        .filter_map(|n| index.get(n))
        .filter_map(|rid| system.residue(rid))
        .map(|residue| residue.name.clone())
        .collect();

    let secondary_structure = dedup_in_order(
        config
            .secondary_structure_window
            .indices(x)
            .map(|n| match provider.code(hit.chain_id, n) {
                Some(code) => SecondaryStructureEntry::Code(code),
                None => SecondaryStructureEntry::Missing,
            }),
    );

    let dihedrals = config
        .dihedral_window
        .indices(x)
        .filter_map(|n| backbone_dihedral(system, &index, n))
        .collect();

    Ok(HitAnnotation {
        hit: hit.clone(),
        sequence,
        secondary_structure,
        dihedrals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::chain::ChainType;
    use crate::core::models::residue::ResidueType;
    use crate::engine::motif::MotifSubtype;

    struct FixedCodes(HashMap<isize, char>);

    impl SecondaryStructureProvider for FixedCodes {
        fn code(&self, chain_id: char, residue_number: isize) -> Option<char> {
            (chain_id == 'A')
                .then(|| self.0.get(&residue_number).copied())
                .flatten()
        }
    }

    // Extended strand along x: N, CA, C of residue k at 3.8 Å spacing, with the
    // peptide bond C(k) - N(k+1) of 1.33 Å.
    fn strand(names: &[&str], first: isize) -> MolecularSystem {
        let mut system = MolecularSystem::new();
        let chain = system.add_chain('A', ChainType::Protein);
        for (k, name) in names.iter().enumerate() {
            let base = k as f64 * 3.8;
            let zig = if k % 2 == 0 { 0.5 } else { -0.5 };
            let rid = system
                .add_residue(
                    chain,
                    (first + k as isize, None),
                    name,
                    ResidueType::from_three_letter(name),
                )
                .unwrap();
            for (atom, pos) in [
                ("N", Point3::new(base, 0.0, 0.0)),
                ("CA", Point3::new(base + 1.2, zig, 0.6)),
                ("C", Point3::new(base + 2.47, 0.0, 0.0)),
            ] {
                system.add_atom_to_residue(rid, Atom::new(atom, rid, pos)).unwrap();
            }
        }
        system
    }

    fn hit(start_index: isize) -> MotifHit {
        MotifHit {
            structure_id: "1ABC".to_string(),
            chain_id: 'A',
            start_index,
            subtype: MotifSubtype::C3,
            surface: None,
        }
    }

    const NAMES: [&str; 10] = [
        "GLY", "ALA", "SER", "PRO", "GLU", "LEU", "LYS", "VAL", "ASP", "ILE",
    ];

    #[test]
    fn sequence_window_covers_minus_two_to_plus_five() {
        let system = strand(&NAMES, 1);
        let provider = FixedCodes(HashMap::new());
        let annotation =
            annotate_hit(&system, &hit(3), &provider, &AnnotationConfig::default()).unwrap();
        assert_eq!(
            annotation.sequence,
            vec!["GLY", "ALA", "SER", "PRO", "GLU", "LEU", "LYS", "VAL"]
        );
    }

    #[test]
    fn sequence_window_is_clipped_at_chain_ends() {
        let system = strand(&NAMES, 1);
        let provider = FixedCodes(HashMap::new());
        let annotation =
            annotate_hit(&system, &hit(1), &provider, &AnnotationConfig::default()).unwrap();
        assert_eq!(annotation.sequence.first().map(String::as_str), Some("GLY"));
        assert_eq!(annotation.sequence.len(), 6);
    }

    #[test]
    fn secondary_structure_is_deduplicated_with_missing_sentinel() {
        let system = strand(&NAMES, 1);
        let codes = HashMap::from([(3, 'H'), (4, 'H'), (5, 'T'), (6, 'H'), (8, 'T')]);
        let annotation = annotate_hit(
            &system,
            &hit(4),
            &FixedCodes(codes),
            &AnnotationConfig::default(),
        )
        .unwrap();
        // Positions 3..=8: H H T H Missing T.
        assert_eq!(
            annotation.secondary_structure,
            vec![
                SecondaryStructureEntry::Code('H'),
                SecondaryStructureEntry::Code('T'),
                SecondaryStructureEntry::Missing,
            ]
        );
        assert_eq!(SecondaryStructureEntry::Missing.to_string(), "Missing");
    }

    #[test]
    fn dihedrals_need_both_neighbours() {
        let system = strand(&NAMES, 1);
        let provider = FixedCodes(HashMap::new());
        let annotation =
            annotate_hit(&system, &hit(6), &provider, &AnnotationConfig::default()).unwrap();
        // Window 5..=11; residue 10 has no successor and 11 does not exist.
        let numbers: Vec<isize> = annotation.dihedrals.iter().map(|d| d.residue_number).collect();
        assert_eq!(numbers, vec![5, 6, 7, 8, 9]);
        for d in &annotation.dihedrals {
            assert!(d.phi.is_finite() && d.psi.is_finite());
            assert!((-180.0..=180.0).contains(&d.phi));
        }
    }

    #[test]
    fn broken_peptide_bond_drops_the_dihedral() {
        let mut system = strand(&NAMES, 1);
        let chain = system.find_chain_by_id('A').unwrap();
        let r6 = system.find_residue_by_number(chain, 6).unwrap();
        let n_id = system.residue(r6).unwrap().get_first_atom_id_by_name("N").unwrap();
        system.atom_mut(n_id).unwrap().position.y += 5.0;

        let provider = FixedCodes(HashMap::new());
        let annotation =
            annotate_hit(&system, &hit(4), &provider, &AnnotationConfig::default()).unwrap();
        let numbers: Vec<isize> = annotation.dihedrals.iter().map(|d| d.residue_number).collect();
        assert_eq!(numbers, vec![3, 4, 7, 8, 9]);
    }

    #[test]
    fn unknown_chain_is_an_error() {
        let system = strand(&NAMES, 1);
        let mut h = hit(3);
        h.chain_id = 'Q';
        let provider = FixedCodes(HashMap::new());
        assert!(matches!(
            annotate_hit(&system, &h, &provider, &AnnotationConfig::default()),
            Err(EngineError::ChainNotFound('Q'))
        ));
    }

    #[test]
    fn dssp_assigner_reports_codes_for_numeric_residues() {
        let system = strand(&NAMES, 1);
        let assigner = DsspAssigner::new(&system);
        assert!(assigner.code('A', 1).is_some());
        assert!(assigner.code('A', 42).is_none());
        assert!(assigner.code('B', 1).is_none());
    }
}
