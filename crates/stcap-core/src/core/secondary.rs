//! Secondary structure assignment following Kabsch & Sander (DSSP).
//!
//! Backbone hydrogen bonds are scored with the electrostatic model
//! `E = 0.084 * 332 * (1/r_ON + 1/r_CH - 1/r_OH - 1/r_CN)` kcal/mol and accepted
//! below -0.5 kcal/mol. Turns, helices, bridges, strands and bends are then derived
//! from the bond pattern and reported with the usual one-letter codes.

use crate::core::models::ids::{ChainId, ResidueId};
use crate::core::models::system::MolecularSystem;
use crate::core::utils::geometry::{angle_degrees, distance};
use kiddo::SquaredEuclidean;
use kiddo::float::kdtree::KdTree;
use nalgebra::Point3;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

const COUPLING: f64 = 0.084 * 332.0;
const HBOND_THRESHOLD: f64 = -0.5;
const MIN_ATOM_DISTANCE: f64 = 0.5;
const PEPTIDE_BOND_MAX: f64 = 2.5;
const BEND_ANGLE: f64 = 70.0;
/// CA-CA distance beyond which no backbone hydrogen bond is possible.
const CA_CONTACT: f64 = 9.0;

type CaTree = KdTree<f64, u64, 3, 256, u32>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DsspState {
    /// Alpha helix.
    H,
    /// Isolated beta bridge.
    B,
    /// Extended strand in a ladder.
    E,
    /// 3-10 helix.
    G,
    /// Pi helix.
    I,
    /// Hydrogen-bonded turn.
    T,
    /// Bend.
    S,
    /// Loop or irregular.
    Coil,
}

impl DsspState {
    pub fn code(self) -> char {
        match self {
            DsspState::H => 'H',
            DsspState::B => 'B',
            DsspState::E => 'E',
            DsspState::G => 'G',
            DsspState::I => 'I',
            DsspState::T => 'T',
            DsspState::S => 'S',
            DsspState::Coil => '-',
        }
    }
}

impl fmt::Display for DsspState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Per-residue states for a model, chain by chain in chain order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DsspAssignment {
    pub residues: Vec<ResidueId>,
    pub states: Vec<DsspState>,
    index: HashMap<ResidueId, usize>,
}

impl DsspAssignment {
    fn new(residues: Vec<ResidueId>, states: Vec<DsspState>) -> Self {
        let index = residues.iter().enumerate().map(|(i, &r)| (r, i)).collect();
        Self {
            residues,
            states,
            index,
        }
    }

    pub fn state_of(&self, residue_id: ResidueId) -> Option<DsspState> {
        self.index.get(&residue_id).map(|&i| self.states[i])
    }

    pub fn to_code_string(&self) -> String {
        self.states.iter().map(|s| s.code()).collect()
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Backbone {
    n: Option<Point3<f64>>,
    ca: Option<Point3<f64>>,
    c: Option<Point3<f64>>,
    o: Option<Point3<f64>>,
    h: Option<Point3<f64>>,
}

/// Splits the model into unbroken backbone segments: a new segment starts at every
/// chain and wherever C(i-1)-N(i) is missing or longer than a peptide bond.
fn segment_ids(backbone: &[Backbone], chains: &[ChainId]) -> Vec<usize> {
    let mut segments = Vec::with_capacity(backbone.len());
    let mut current = 0;
    for i in 0..backbone.len() {
        if i > 0 {
            let bonded = chains[i] == chains[i - 1]
                && matches!(
                    (backbone[i - 1].c, backbone[i].n),
                    (Some(c), Some(n)) if distance(&c, &n) <= PEPTIDE_BOND_MAX
                );
            if !bonded {
                current += 1;
            }
        }
        segments.push(current);
    }
    segments
}

fn extract_backbone(system: &MolecularSystem, residues: &[ResidueId]) -> Vec<Backbone> {
    let position = |rid: ResidueId, name: &str| {
        system
            .find_atom_in_residue(rid, name)
            .map(|atom| atom.position)
    };

    residues
        .iter()
        .map(|&rid| Backbone {
            n: position(rid, "N"),
            ca: position(rid, "CA"),
            c: position(rid, "C"),
            o: position(rid, "O"),
            h: None,
        })
        .collect()
}

/// H(i) = N(i) + unit(C(i-1) -> O(i-1)) reversed, only inside a segment.
fn place_amide_hydrogens(backbone: &mut [Backbone], segments: &[usize]) {
    for i in 1..backbone.len() {
        if segments[i] != segments[i - 1] {
            continue;
        }
        let (prev, curr) = (backbone[i - 1], backbone[i]);
        if let (Some(n), Some(c_prev), Some(o_prev)) = (curr.n, prev.c, prev.o) {
            let co = o_prev - c_prev;
            if co.norm() > 1e-8 {
                backbone[i].h = Some(n - co.normalize());
            }
        }
    }
}

fn hbond_energy(donor: &Backbone, acceptor: &Backbone) -> f64 {
    let (Some(n), Some(h), Some(c), Some(o)) = (donor.n, donor.h, acceptor.c, acceptor.o) else {
        return 0.0;
    };
    let r_on = distance(&o, &n);
    let r_ch = distance(&c, &h);
    let r_oh = distance(&o, &h);
    let r_cn = distance(&c, &n);
    if [r_on, r_ch, r_oh, r_cn]
        .iter()
        .any(|&r| r < MIN_ATOM_DISTANCE)
    {
        return 0.0;
    }
    COUPLING * (1.0 / r_on + 1.0 / r_ch - 1.0 / r_oh - 1.0 / r_cn)
}

fn coords(p: &Point3<f64>) -> [f64; 3] {
    [p.x, p.y, p.z]
}

/// Hydrogen-bond table over the whole model; `bonded(co, nh)` is true when C=O of
/// `co` accepts from N-H of `nh`. Only pairs with CA atoms within
/// `CA_CONTACT` are scored.
struct HBondTable {
    segments: Vec<usize>,
    bonds: HashSet<(usize, usize)>,
}

impl HBondTable {
    fn new(backbone: &[Backbone], segments: Vec<usize>) -> Self {
        let mut tree = CaTree::new();
        for (i, residue) in backbone.iter().enumerate() {
            if let Some(ca) = residue.ca {
                tree.add(&coords(&ca), i as u64);
            }
        }

        let mut bonds = HashSet::new();
        for (nh, donor) in backbone.iter().enumerate() {
            let (Some(ca), Some(_)) = (donor.ca, donor.h) else {
                continue;
            };
            for found in
                tree.within_unsorted::<SquaredEuclidean>(&coords(&ca), CA_CONTACT * CA_CONTACT)
            {
                let co = found.item as usize;
                if segments[co] == segments[nh] && co.abs_diff(nh) < 2 {
                    continue;
                }
                if hbond_energy(donor, &backbone[co]) < HBOND_THRESHOLD {
                    bonds.insert((co, nh));
                }
            }
        }
        Self { segments, bonds }
    }

    fn len(&self) -> usize {
        self.segments.len()
    }

    fn bonded(&self, co: Option<usize>, nh: Option<usize>) -> bool {
        match (co, nh) {
            (Some(co), Some(nh)) => self.bonds.contains(&(co, nh)),
            _ => false,
        }
    }

    /// Index `offset` residues away from `i`, if it lies in the same segment.
    fn step(&self, i: usize, offset: isize) -> Option<usize> {
        let j = i.checked_add_signed(offset)?;
        (j < self.len() && self.segments[j] == self.segments[i]).then_some(j)
    }

    /// n-turn at i: C=O(i) bonded to N-H(i+n) within one segment.
    fn turn(&self, i: usize, size: usize) -> bool {
        self.bonded(Some(i), self.step(i, size as isize))
    }
}

fn mark_helices(table: &HBondTable, size: usize, state: DsspState, states: &mut [DsspState]) {
    let n = states.len();
    for i in 1..n {
        if table.turn(i - 1, size) && table.turn(i, size) {
            for j in i..(i + size).min(n) {
                if states[j] == DsspState::Coil {
                    states[j] = state;
                }
            }
        }
    }
}

fn is_bridge(table: &HBondTable, a: usize, b: usize) -> bool {
    let (a_prev, a_next) = (table.step(a, -1), table.step(a, 1));
    let (b_prev, b_next) = (table.step(b, -1), table.step(b, 1));
    let (a, b) = (Some(a), Some(b));
    let parallel = (table.bonded(a_prev, b) && table.bonded(b, a_next))
        || (table.bonded(b_prev, a) && table.bonded(a, b_next));
    let antiparallel = (table.bonded(a, b) && table.bonded(b, a))
        || (table.bonded(a_prev, b_next) && table.bonded(b_prev, a_next));
    parallel || antiparallel
}

fn mark_bridges(table: &HBondTable, states: &mut [DsspState]) {
    let n = states.len();

    // Every bridge pattern involves a bond between the partners or their direct neighbours.
    let mut candidates = BTreeSet::new();
    for &(co, nh) in &table.bonds {
        for da in -1..=1 {
            for db in -1..=1 {
                if let (Some(a), Some(b)) = (co.checked_add_signed(da), nh.checked_add_signed(db)) {
                    if a < n && b < n {
                        candidates.insert((a.min(b), a.max(b)));
                    }
                }
            }
        }
    }

    let mut in_bridge = vec![false; n];
    for (i, j) in candidates {
        if table.segments[i] == table.segments[j] && j < i + 3 {
            continue;
        }
        if is_bridge(table, i, j) {
            in_bridge[i] = true;
            in_bridge[j] = true;
        }
    }
    for i in 0..n {
        if !in_bridge[i] || states[i] != DsspState::Coil {
            continue;
        }
        let ladder = [table.step(i, -1), table.step(i, 1)]
            .into_iter()
            .flatten()
            .any(|j| in_bridge[j]);
        states[i] = if ladder { DsspState::E } else { DsspState::B };
    }
}

fn mark_turns(table: &HBondTable, states: &mut [DsspState]) {
    let n = states.len();
    for size in [3usize, 4, 5] {
        for i in 0..n {
            if table.turn(i, size) {
                for j in (i + 1)..(i + size).min(n) {
                    if states[j] == DsspState::Coil {
                        states[j] = DsspState::T;
                    }
                }
            }
        }
    }
}

fn mark_bends(table: &HBondTable, backbone: &[Backbone], states: &mut [DsspState]) {
    for i in 0..backbone.len() {
        if states[i] != DsspState::Coil {
            continue;
        }
        let (Some(before), Some(after)) = (table.step(i, -2), table.step(i, 2)) else {
            continue;
        };
        if let (Some(p1), Some(p2), Some(p3)) = (backbone[before].ca, backbone[i].ca, backbone[after].ca)
        {
            // The vertex angle is 180 minus the angle between the two direction vectors.
            if let Some(vertex) = angle_degrees(&p1, &p2, &p3) {
                if 180.0 - vertex > BEND_ANGLE {
                    states[i] = DsspState::S;
                }
            }
        }
    }
}

/// Assigns DSSP states to the amino-acid residues of the whole model.
///
/// Hydrogen bonds are searched across chains, so sheets formed between chains are
/// seen; helices, turns and bends stay within one unbroken segment. Residues that
/// are not amino acids are left out entirely; residues missing backbone atoms take
/// part but can neither donate nor accept. Residues are listed chain by chain.
pub fn assign_model(system: &MolecularSystem) -> DsspAssignment {
    let mut residues = Vec::new();
    let mut chains = Vec::new();
    for (chain_id, chain) in system.chains_iter() {
        for &rid in chain.residues() {
            if system.residue(rid).is_some_and(|r| r.is_amino_acid()) {
                residues.push(rid);
                chains.push(chain_id);
            }
        }
    }

    let mut backbone = extract_backbone(system, &residues);
    let segments = segment_ids(&backbone, &chains);
    place_amide_hydrogens(&mut backbone, &segments);
    let table = HBondTable::new(&backbone, segments);
    let mut states = vec![DsspState::Coil; residues.len()];

    mark_helices(&table, 4, DsspState::H, &mut states);
    mark_bridges(&table, &mut states);
    mark_helices(&table, 3, DsspState::G, &mut states);
    mark_helices(&table, 5, DsspState::I, &mut states);
    mark_turns(&table, &mut states);
    mark_bends(&table, &backbone, &mut states);

    DsspAssignment::new(residues, states)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::chain::ChainType;
    use crate::core::models::residue::ResidueType;

    // Ideal alpha helix: rise 1.5 Å and 100° per residue, with backbone atoms at
    // fixed cylindrical offsets from the CA trace.
    fn helix_system(length: usize) -> (MolecularSystem, ChainId) {
        let mut system = MolecularSystem::new();
        let chain = system.add_chain('A', ChainType::Protein);
        let place = |i: f64, radius: f64, phase: f64, dz: f64| {
            let theta = (i * 100.0 + phase).to_radians();
            Point3::new(radius * theta.cos(), radius * theta.sin(), i * 1.5 + dz)
        };
        for k in 0..length {
            let i = k as f64;
            let rid = system
                .add_residue(chain, (k as isize + 1, None), "ALA", Some(ResidueType::Alanine))
                .unwrap();
            for (name, pos) in [
                ("N", place(i, 1.55, -28.0, -0.83)),
                ("CA", place(i, 2.3, 0.0, 0.0)),
                ("C", place(i, 1.61, 28.0, 0.85)),
                ("O", place(i, 1.76, 33.0, 2.06)),
            ] {
                system.add_atom_to_residue(rid, Atom::new(name, rid, pos)).unwrap();
            }
        }
        (system, chain)
    }

    fn extended_system(length: usize) -> (MolecularSystem, ChainId) {
        let mut system = MolecularSystem::new();
        let chain = system.add_chain('A', ChainType::Protein);
        for k in 0..length {
            let x = k as f64 * 3.8;
            let flip = if k % 2 == 0 { 1.0 } else { -1.0 };
            let rid = system
                .add_residue(chain, (k as isize + 1, None), "GLY", Some(ResidueType::Glycine))
                .unwrap();
            for (name, pos) in [
                ("N", Point3::new(x - 1.2, 0.3 * flip, 0.0)),
                ("CA", Point3::new(x, 0.0, 0.0)),
                ("C", Point3::new(x + 1.3, 0.3 * flip, 0.0)),
                ("O", Point3::new(x + 1.5, 1.5 * flip, 0.0)),
            ] {
                system.add_atom_to_residue(rid, Atom::new(name, rid, pos)).unwrap();
            }
        }
        (system, chain)
    }

    #[test]
    fn state_codes_use_dash_for_coil() {
        assert_eq!(DsspState::H.code(), 'H');
        assert_eq!(DsspState::Coil.code(), '-');
        assert_eq!(DsspState::S.to_string(), "S");
    }

    #[test]
    fn extended_chain_has_no_helix() {
        let (system, chain) = extended_system(10);
        let assignment = assign_model(&system);
        assert_eq!(assignment.states.len(), 10);
        assert!(assignment
            .states
            .iter()
            .all(|s| !matches!(s, DsspState::H | DsspState::G | DsspState::I)));
    }

    #[test]
    fn helix_is_recognised() {
        let (system, chain) = helix_system(14);
        let assignment = assign_model(&system);
        let helical = assignment
            .states
            .iter()
            .filter(|s| matches!(s, DsspState::H | DsspState::G | DsspState::I | DsspState::T))
            .count();
        assert!(helical >= 6, "assignment: {}", assignment.to_code_string());
    }

    #[test]
    fn state_lookup_by_residue() {
        let (system, chain) = extended_system(6);
        let assignment = assign_model(&system);
        let first = system.chain(chain).unwrap().residues()[0];
        assert!(assignment.state_of(first).is_some());
    }

    #[test]
    fn non_amino_acids_are_excluded() {
        let (mut system, chain) = extended_system(6);
        let water = system.add_residue(chain, (100, None), "HOH", None).unwrap();
        system
            .add_atom_to_residue(water, Atom::new("O", water, Point3::new(0.0, 10.0, 0.0)))
            .unwrap();
        let assignment = assign_model(&system);
        assert_eq!(assignment.states.len(), 6);
        assert!(assignment.state_of(water).is_none());
    }

    #[test]
    fn empty_model_gives_empty_assignment() {
        let (mut system, chain) = extended_system(3);
        system.remove_chain(chain);
        assert!(assign_model(&system).states.is_empty());
    }

    // Copy of `extended_system` rotated 180° about z and shifted so that every even
    // residue faces an even residue of chain A with O..N about 2.9 Å apart.
    fn add_antiparallel_partner(system: &mut MolecularSystem, length: usize) -> ChainId {
        let chain = system.add_chain('B', ChainType::Protein);
        let x0 = (length - 1) as f64 * 3.8;
        let gap = 4.7;
        let rotate = |x: f64, y: f64| Point3::new(x0 - x, gap - y, 0.0);
        for k in 0..length {
            let x = k as f64 * 3.8;
            let flip = if k % 2 == 0 { 1.0 } else { -1.0 };
            let rid = system
                .add_residue(chain, (k as isize + 1, None), "GLY", Some(ResidueType::Glycine))
                .unwrap();
            for (name, pos) in [
                ("N", rotate(x - 1.2, 0.3 * flip)),
                ("CA", rotate(x, 0.0)),
                ("C", rotate(x + 1.3, 0.3 * flip)),
                ("O", rotate(x + 1.5, 1.5 * flip)),
            ] {
                system.add_atom_to_residue(rid, Atom::new(name, rid, pos)).unwrap();
            }
        }
        chain
    }

    #[test]
    fn sheet_between_chains_is_recognised() {
        let (mut system, chain_a) = extended_system(7);
        let middle = system.chain(chain_a).unwrap().residues()[3];
        assert_ne!(assign_model(&system).state_of(middle), Some(DsspState::E));

        let chain_b = add_antiparallel_partner(&mut system, 7);
        let assignment = assign_model(&system);
        assert_eq!(assignment.states.len(), 14);
        assert_eq!(
            assignment.state_of(middle),
            Some(DsspState::E),
            "assignment: {}",
            assignment.to_code_string()
        );
        let partner = system.chain(chain_b).unwrap().residues()[3];
        assert_eq!(assignment.state_of(partner), Some(DsspState::E));
    }

    #[test]
    fn chains_start_new_segments() {
        let (mut system, chain_a) = extended_system(3);
        let chain_b = add_antiparallel_partner(&mut system, 3);
        let mut residues = system.chain(chain_a).unwrap().residues().to_vec();
        residues.extend_from_slice(system.chain(chain_b).unwrap().residues());
        let chains = [chain_a, chain_a, chain_a, chain_b, chain_b, chain_b];
        let backbone = extract_backbone(&system, &residues);
        assert_eq!(segment_ids(&backbone, &chains), vec![0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn hbond_energy_is_zero_without_hydrogen() {
        let donor = Backbone {
            n: Some(Point3::new(0.0, 0.0, 0.0)),
            ..Backbone::default()
        };
        let acceptor = Backbone {
            c: Some(Point3::new(4.0, 0.0, 0.0)),
            o: Some(Point3::new(2.9, 0.0, 0.0)),
            ..Backbone::default()
        };
        assert_eq!(hbond_energy(&donor, &acceptor), 0.0);
    }

    #[test]
    fn linear_hbond_is_attractive() {
        let donor = Backbone {
            n: Some(Point3::new(0.0, 0.0, 0.0)),
            h: Some(Point3::new(1.0, 0.0, 0.0)),
            ..Backbone::default()
        };
        let acceptor = Backbone {
            o: Some(Point3::new(2.9, 0.0, 0.0)),
            c: Some(Point3::new(4.13, 0.0, 0.0)),
            ..Backbone::default()
        };
        assert!(hbond_energy(&donor, &acceptor) < HBOND_THRESHOLD);
    }
}
