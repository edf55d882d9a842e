use super::ids::ResidueId;
use nalgebra::Point3;
use std::str::FromStr;

/// Represents the role or classification of an atom within a molecular structure.
///
/// The role is assigned when a structure is read and lets downstream algorithms
/// (preparation, surface area, motif geometry) select atoms without re-parsing
/// names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum AtomRole {
    /// Backbone atom of an amino acid (N, CA, C, O and the amide hydrogen).
    Backbone,
    /// Side-chain atom of an amino acid.
    Sidechain,
    /// Atom of a non-polymer hetero group.
    Ligand,
    /// Atom of a solvent molecule.
    Water,
    /// Unknown or unclassified atom role.
    #[default]
    Other,
}

impl FromStr for AtomRole {
    type Err = ();

    /// Parses a role name, case-insensitively, accepting the common spellings of
    /// "side chain".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "backbone" => Ok(AtomRole::Backbone),
            "sidechain" | "side-chain" | "side_chain" => Ok(AtomRole::Sidechain),
            "ligand" => Ok(AtomRole::Ligand),
            "water" => Ok(AtomRole::Water),
            "other" | "unknown" => Ok(AtomRole::Other),
            _ => Err(()),
        }
    }
}

/// Chemical element of an atom, restricted to what protein structure files
/// routinely contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Element {
    H,
    C,
    N,
    O,
    S,
    Se,
    P,
    #[default]
    Other,
}

impl Element {
    /// Van der Waals radius in Angstroms (Bondi radii, 1.8 Å for anything else).
    pub fn vdw_radius(self) -> f64 {
        match self {
            Element::H => 1.20,
            Element::C => 1.70,
            Element::N => 1.55,
            Element::O => 1.52,
            Element::S => 1.80,
            Element::Se => 1.90,
            Element::P => 1.80,
            Element::Other => 1.80,
        }
    }

    pub fn is_hydrogen(self) -> bool {
        self == Element::H
    }

    /// Infers the element from a PDB atom name when the element column is blank.
    ///
    /// Names that start with a digit (`1HB`, `2HG1`) or with `H`/`D` are hydrogens;
    /// otherwise the first letter decides, with `SE` recognised for selenomethionine.
    pub fn from_atom_name(name: &str) -> Self {
        let trimmed = name.trim().trim_start_matches(|c: char| c.is_ascii_digit());
        let upper = trimmed.to_ascii_uppercase();
        if upper.starts_with("SE") {
            return Element::Se;
        }
        match upper.chars().next() {
            Some('H') | Some('D') => Element::H,
            Some('C') => Element::C,
            Some('N') => Element::N,
            Some('O') => Element::O,
            Some('S') => Element::S,
            Some('P') => Element::P,
            _ => Element::Other,
        }
    }
}

impl FromStr for Element {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "H" | "D" => Ok(Element::H),
            "C" => Ok(Element::C),
            "N" => Ok(Element::N),
            "O" => Ok(Element::O),
            "S" => Ok(Element::S),
            "SE" => Ok(Element::Se),
            "P" => Ok(Element::P),
            "" => Err(()),
            _ => Ok(Element::Other),
        }
    }
}

/// An atom of a loaded structure.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The name of the atom (e.g., "CA", "OG1").
    pub name: String,
    /// Serial number from the source file; 0 for atoms added in memory.
    pub serial: usize,
    /// The ID of the parent residue this atom belongs to.
    pub residue_id: ResidueId,
    /// The role of the atom in the structure.
    pub role: AtomRole,
    /// Chemical element.
    pub element: Element,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
}

impl Atom {
    /// Creates a new `Atom`, inferring the element from its name.
    ///
    /// The serial is left at 0 and the role at its default; the reader fills both in.
    pub fn new(name: &str, residue_id: ResidueId, position: Point3<f64>) -> Self {
        Self {
            name: name.to_string(),
            serial: 0,
            residue_id,
            role: AtomRole::default(),
            element: Element::from_atom_name(name),
            position,
        }
    }

    pub fn is_hydrogen(&self) -> bool {
        self.element.is_hydrogen()
    }
}
