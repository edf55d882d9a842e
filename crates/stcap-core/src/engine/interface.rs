use crate::core::models::ids::{AtomId, ChainId, ResidueId};
use crate::core::models::system::MolecularSystem;
use crate::engine::config::{DeltaGranularity, InterfaceConfig};
use crate::engine::error::EngineError;
use crate::engine::utils::query::polymer_atom_ids;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::Hash;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InterfaceSide {
    A,
    B,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceResidue {
    pub side: InterfaceSide,
    pub chain_id: char,
    pub residue_number: isize,
    pub insertion_code: Option<char>,
    /// SASA isolated minus SASA in the complex (Å²).
    pub delta: f64,
}

/// Interface residues of one chain pair in one structure.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceResidueSet {
    pub chain_a: char,
    pub chain_b: char,
    residues: Vec<InterfaceResidue>,
}

impl InterfaceResidueSet {
    pub fn residues(&self) -> &[InterfaceResidue] {
        &self.residues
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    pub fn side(&self, side: InterfaceSide) -> impl Iterator<Item = &InterfaceResidue> {
        self.residues.iter().filter(move |r| r.side == side)
    }

    /// Residue numbers on one side, leaving out residues with an insertion code or a
    /// negative number.
    pub fn numeric_indices(&self, side: InterfaceSide) -> BTreeSet<isize> {
        self.side(side)
            .filter(|r| r.insertion_code.is_none() && r.residue_number >= 0)
            .map(|r| r.residue_number)
            .collect()
    }
}

struct AtomDelta {
    side: InterfaceSide,
    residue_id: ResidueId,
    delta: f64,
}

fn resolve_chain(system: &MolecularSystem, id: char) -> Result<ChainId, EngineError> {
    system
        .find_chain_by_id(id)
        .ok_or(EngineError::ChainNotFound(id))
}

fn atom_deltas(
    system: &MolecularSystem,
    view_a: &[AtomId],
    view_b: &[AtomId],
    config: &InterfaceConfig,
) -> Result<Vec<AtomDelta>, EngineError> {
    let complex: Vec<AtomId> = view_a.iter().chain(view_b.iter()).copied().collect();
    let in_complex = config.surface.atom_areas(system, &complex)?;
    let isolated_a = config.surface.atom_areas(system, view_a)?;
    let isolated_b = config.surface.atom_areas(system, view_b)?;

    let sides = std::iter::repeat_n(InterfaceSide::A, view_a.len())
        .chain(std::iter::repeat_n(InterfaceSide::B, view_b.len()));

    complex
        .iter()
        .zip(sides)
        .zip(isolated_a.iter().chain(isolated_b.iter()))
        .zip(in_complex.iter())
        .map(|(((&atom_id, side), &isolated), &bound)| {
            let atom = system
                .atom(atom_id)
                .ok_or_else(|| EngineError::Internal(format!("atom {:?} vanished", atom_id)))?;
            Ok(AtomDelta {
                side,
                residue_id: atom.residue_id,
                delta: isolated - bound,
            })
        })
        .collect()
}

fn residue_entry(
    system: &MolecularSystem,
    side: InterfaceSide,
    residue_id: ResidueId,
    chain_ids: (char, char),
    delta: f64,
) -> Option<InterfaceResidue> {
    let residue = system.residue(residue_id)?;
    Some(InterfaceResidue {
        side,
        chain_id: match side {
            InterfaceSide::A => chain_ids.0,
            InterfaceSide::B => chain_ids.1,
        },
        residue_number: residue.residue_number,
        insertion_code: residue.insertion_code,
        delta,
    })
}

/// Keeps one entry per key whose |delta| reaches `cutoff`, in order of the key's
/// first appearance.
///
/// With [`DeltaGranularity::Atom`] the first qualifying entry of a key is kept. With
/// [`DeltaGranularity::Residue`] the deltas of a key are summed before the cutoff.
fn select_interface_entries<K: Copy + Eq + Hash>(
    entries: impl IntoIterator<Item = (K, f64)>,
    cutoff: f64,
    granularity: DeltaGranularity,
) -> Vec<(K, f64)> {
    match granularity {
        DeltaGranularity::Atom => {
            let mut seen: HashSet<K> = HashSet::new();
            entries
                .into_iter()
                .filter(|&(key, delta)| delta.abs() >= cutoff && seen.insert(key))
                .collect()
        }
        DeltaGranularity::Residue => {
            let mut order: Vec<K> = Vec::new();
            let mut sums: HashMap<K, f64> = HashMap::new();
            for (key, delta) in entries {
                let sum = sums.entry(key).or_insert_with(|| {
                    order.push(key);
                    0.0
                });
                *sum += delta;
            }
            order
                .into_iter()
                .filter_map(|key| {
                    let sum = sums.get(&key).copied()?;
                    (sum.abs() >= cutoff).then_some((key, sum))
                })
                .collect()
        }
    }
}

/// Finds the residues of chains `chain_a` and `chain_b` that lose or gain accessible
/// surface when the two chains are brought together.
///
/// Only polymer residues take part, nucleotides included. With
/// [`DeltaGranularity::Atom`], a residue is reported with the delta of its first atom
/// (in chain A then chain B file order) whose |delta| reaches the cutoff. With
/// [`DeltaGranularity::Residue`], atom deltas are summed per residue first.
///
/// # Errors
///
/// Returns [`EngineError::ChainNotFound`] for an unknown chain,
/// [`EngineError::InvalidChainPair`] if both identifiers are equal, or
/// [`EngineError::Sasa`] if the surface calculation fails.
#[instrument(skip_all, name = "interface_detection", fields(chain_a = %chain_a, chain_b = %chain_b))]
pub fn detect_interface(
    system: &MolecularSystem,
    chain_a: char,
    chain_b: char,
    config: &InterfaceConfig,
) -> Result<InterfaceResidueSet, EngineError> {
    if chain_a == chain_b {
        return Err(EngineError::InvalidChainPair(chain_a));
    }
    let view_a = polymer_atom_ids(system, resolve_chain(system, chain_a)?);
    let view_b = polymer_atom_ids(system, resolve_chain(system, chain_b)?);

    let deltas = atom_deltas(system, &view_a, &view_b, config)?;
    let pair = (chain_a, chain_b);

    let keyed = deltas.iter().map(|d| ((d.side, d.residue_id), d.delta));
    let residues: Vec<InterfaceResidue> =
        select_interface_entries(keyed, config.cutoff, config.granularity)
            .into_iter()
            .filter_map(|((side, residue_id), delta)| {
                residue_entry(system, side, residue_id, pair, delta)
            })
            .collect();

    debug!(count = residues.len(), "Interface residues found");
    Ok(InterfaceResidueSet {
        chain_a,
        chain_b,
        residues,
    })
}

/// Merges the chain-side interface residue numbers of `chain` against every other
/// chain with polymer residues.
pub fn chain_interface_indices(
    system: &MolecularSystem,
    chain: char,
    config: &InterfaceConfig,
) -> Result<BTreeSet<isize>, EngineError> {
    resolve_chain(system, chain)?;
    let partners: Vec<char> = system
        .chains_iter()
        .filter(|(id, c)| c.id != chain && !polymer_atom_ids(system, *id).is_empty())
        .map(|(_, c)| c.id)
        .collect();

    let mut indices = BTreeSet::new();
    for partner in partners {
        let set = detect_interface(system, chain, partner, config)?;
        indices.extend(set.numeric_indices(InterfaceSide::A));
    }
    Ok(indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::chain::ChainType;
    use crate::core::models::residue::ResidueType;
    use crate::core::sasa::SurfaceComputer;
    use nalgebra::Point3;

    fn add(
        system: &mut MolecularSystem,
        chain: char,
        number: isize,
        name: &str,
        atoms: &[(&str, [f64; 3])],
    ) {
        let chain_type = if ResidueType::from_three_letter(name).is_some() {
            ChainType::Protein
        } else {
            ChainType::Ligand
        };
        let chain_id = system.add_chain(chain, chain_type);
        let rid = system
            .add_residue(chain_id, (number, None), name, ResidueType::from_three_letter(name))
            .unwrap();
        for (atom_name, [x, y, z]) in atoms {
            let atom = Atom::new(atom_name, rid, Point3::new(*x, *y, *z));
            system.add_atom_to_residue(rid, atom).unwrap();
        }
    }

    fn config(cutoff: f64, granularity: DeltaGranularity) -> InterfaceConfig {
        InterfaceConfig {
            cutoff,
            granularity,
            surface: SurfaceComputer::new(1.4, 200),
        }
    }

    fn two_chain_system() -> MolecularSystem {
        let mut system = MolecularSystem::new();
        add(&mut system, 'A', 1, "ALA", &[("CA", [0.0, 0.0, 0.0])]);
        add(&mut system, 'A', 2, "ALA", &[("CA", [-30.0, 0.0, 0.0])]);
        add(&mut system, 'B', 7, "GLY", &[("CA", [3.5, 0.0, 0.0])]);
        add(&mut system, 'B', 8, "GLY", &[("CA", [40.0, 0.0, 0.0])]);
        system
    }

    #[test]
    fn contacting_residues_on_both_sides_are_reported() {
        let system = two_chain_system();
        let set = detect_interface(&system, 'A', 'B', &config(1.0, DeltaGranularity::Atom)).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.numeric_indices(InterfaceSide::A), BTreeSet::from([1]));
        assert_eq!(set.numeric_indices(InterfaceSide::B), BTreeSet::from([7]));
        assert!(set.residues().iter().all(|r| r.delta > 1.0));
        assert_eq!(set.residues()[0].chain_id, 'A');
        assert_eq!(set.residues()[1].chain_id, 'B');
    }

    #[test]
    fn cutoff_above_any_change_yields_no_interface() {
        let system = two_chain_system();
        let set =
            detect_interface(&system, 'A', 'B', &config(1.0e6, DeltaGranularity::Atom)).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn residue_granularity_sums_atom_deltas() {
        let mut system = MolecularSystem::new();
        add(
            &mut system,
            'A',
            1,
            "ALA",
            &[("CA", [0.0, 0.0, 0.0]), ("CB", [0.0, 0.0, 1.0])],
        );
        add(&mut system, 'B', 1, "GLY", &[("CA", [3.2, 0.0, 0.5])]);

        let surface = SurfaceComputer::new(1.4, 200);
        let a = polymer_atom_ids(&system, system.find_chain_by_id('A').unwrap());
        let b = polymer_atom_ids(&system, system.find_chain_by_id('B').unwrap());
        let complex: Vec<AtomId> = a.iter().chain(b.iter()).copied().collect();
        let bound = surface.atom_areas(&system, &complex).unwrap();
        let isolated = surface.atom_areas(&system, &a).unwrap();
        let d0 = isolated[0] - bound[0];
        let d1 = isolated[1] - bound[1];
        assert!(d0 > 0.0 && d1 > 0.0);

        let cutoff = d0.max(d1) + 0.25 * d0.min(d1);
        let by_atom = detect_interface(&system, 'A', 'B', &config(cutoff, DeltaGranularity::Atom))
            .unwrap();
        assert!(by_atom.numeric_indices(InterfaceSide::A).is_empty());

        let by_residue =
            detect_interface(&system, 'A', 'B', &config(cutoff, DeltaGranularity::Residue))
                .unwrap();
        let side_a: Vec<&InterfaceResidue> = by_residue.side(InterfaceSide::A).collect();
        assert_eq!(side_a.len(), 1);
        assert!((side_a[0].delta - (d0 + d1)).abs() < 1e-9);
    }

    #[test]
    fn chain_pair_must_be_distinct_and_present() {
        let system = two_chain_system();
        let cfg = config(1.0, DeltaGranularity::Atom);
        assert!(matches!(
            detect_interface(&system, 'A', 'A', &cfg),
            Err(EngineError::InvalidChainPair('A'))
        ));
        assert!(matches!(
            detect_interface(&system, 'A', 'Z', &cfg),
            Err(EngineError::ChainNotFound('Z'))
        ));
    }

    #[test]
    fn detection_leaves_the_structure_untouched() {
        let system = two_chain_system();
        let before = system.clone();
        detect_interface(&system, 'A', 'B', &config(1.0, DeltaGranularity::Atom)).unwrap();
        assert_eq!(system.atom_count(), before.atom_count());
        for (id, atom) in before.atoms_iter() {
            assert_eq!(system.atom(id), Some(atom));
        }
    }

    #[test]
    fn cutoff_is_inclusive() {
        let entries = [('a', 1.0), ('b', 0.99), ('c', -1.0), ('d', -0.99)];
        let kept = select_interface_entries(entries, 1.0, DeltaGranularity::Atom);
        assert_eq!(kept, vec![('a', 1.0), ('c', -1.0)]);

        let kept = select_interface_entries(entries, 1.0, DeltaGranularity::Residue);
        assert_eq!(kept, vec![('a', 1.0), ('c', -1.0)]);
    }

    #[test]
    fn first_qualifying_entry_reports_for_its_residue() {
        let entries = [('a', 0.5), ('a', 2.0), ('b', 3.0), ('a', 7.0)];
        let kept = select_interface_entries(entries, 1.0, DeltaGranularity::Atom);
        assert_eq!(kept, vec![('a', 2.0), ('b', 3.0)]);

        let kept = select_interface_entries(entries, 1.0, DeltaGranularity::Residue);
        assert_eq!(kept, vec![('a', 9.5), ('b', 3.0)]);
    }

    fn magnitudes(set: &InterfaceResidueSet) -> HashMap<(char, isize), f64> {
        set.residues()
            .iter()
            .map(|r| ((r.chain_id, r.residue_number), r.delta.abs()))
            .collect()
    }

    #[test]
    fn swapping_the_chains_gives_the_same_residues() {
        let system = two_chain_system();
        let cfg = config(1.0, DeltaGranularity::Atom);
        let forward = magnitudes(&detect_interface(&system, 'A', 'B', &cfg).unwrap());
        let reverse = magnitudes(&detect_interface(&system, 'B', 'A', &cfg).unwrap());
        assert_eq!(forward.len(), 2);
        assert_eq!(forward.len(), reverse.len());
        for (key, delta) in &forward {
            assert!((reverse[key] - delta).abs() < 1e-9, "{:?}", key);
        }
    }

    #[test]
    fn repeated_detection_is_identical() {
        let system = two_chain_system();
        let cfg = config(1.0, DeltaGranularity::Atom);
        let first = detect_interface(&system, 'A', 'B', &cfg).unwrap();
        let second = detect_interface(&system, 'A', 'B', &cfg).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn nucleic_acid_chain_is_an_interface_partner() {
        let mut system = MolecularSystem::new();
        add(&mut system, 'A', 1, "ALA", &[("CA", [0.0, 0.0, 0.0])]);
        add(&mut system, 'B', 1, "DA", &[("P", [3.5, 0.0, 0.0])]);
        let indices =
            chain_interface_indices(&system, 'A', &InterfaceConfig::default()).unwrap();
        assert_eq!(indices, BTreeSet::from([1]));
    }

    #[test]
    fn indices_are_merged_over_every_partner_chain() {
        let mut system = two_chain_system();
        add(&mut system, 'C', 3, "SER", &[("CA", [-26.5, 0.0, 0.0])]);
        add(&mut system, 'D', 1, "NAG", &[("C1", [0.0, 3.5, 0.0])]);
        let indices =
            chain_interface_indices(&system, 'A', &config(1.0, DeltaGranularity::Atom)).unwrap();
        assert_eq!(indices, BTreeSet::from([1, 2]));
    }
}
