use super::ids::{AtomId, ChainId};
use phf::{Map, Set, phf_map, phf_set};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResidueType {
    // --- Aliphatic, Nonpolar ---
    Alanine,
    Glycine,
    Isoleucine,
    Leucine,
    Proline,
    Valine,

    // --- Aromatic ---
    Phenylalanine,
    Tryptophan,
    Tyrosine,

    // --- Polar, Uncharged ---
    Asparagine,
    Cysteine,
    Glutamine,
    Serine,
    Threonine,
    Methionine,

    // --- Charged ---
    Arginine,
    Lysine,
    AsparticAcid,
    GlutamicAcid,
    Histidine,

    // --- Modified, treated as polymer ---
    Selenomethionine,
}

static RESIDUE_CODES: Map<&'static str, ResidueType> = phf_map! {
    "ALA" => ResidueType::Alanine,
    "GLY" => ResidueType::Glycine,
    "ILE" => ResidueType::Isoleucine,
    "LEU" => ResidueType::Leucine,
    "PRO" => ResidueType::Proline,
    "VAL" => ResidueType::Valine,
    "PHE" => ResidueType::Phenylalanine,
    "TRP" => ResidueType::Tryptophan,
    "TYR" => ResidueType::Tyrosine,
    "ASN" => ResidueType::Asparagine,
    "CYS" => ResidueType::Cysteine,
    "CYX" => ResidueType::Cysteine,
    "GLN" => ResidueType::Glutamine,
    "SER" => ResidueType::Serine,
    "THR" => ResidueType::Threonine,
    "MET" => ResidueType::Methionine,
    "ARG" => ResidueType::Arginine,
    "LYS" => ResidueType::Lysine,
    "ASP" => ResidueType::AsparticAcid,
    "GLU" => ResidueType::GlutamicAcid,
    "HIS" => ResidueType::Histidine,
    "HID" => ResidueType::Histidine,
    "HIE" => ResidueType::Histidine,
    "HIP" => ResidueType::Histidine,
    "HSD" => ResidueType::Histidine,
    "HSE" => ResidueType::Histidine,
    "HSP" => ResidueType::Histidine,
    "MSE" => ResidueType::Selenomethionine,
};

static WATER_NAMES: Set<&'static str> = phf_set! {
    "HOH", "WAT", "DOD", "H2O", "TIP", "TIP3", "SOL",
};

// DNA and RNA nucleotides, including legacy and force-field spellings.
static NUCLEOTIDE_NAMES: Set<&'static str> = phf_set! {
    "DA", "DC", "DG", "DT", "DU", "DI",
    "A", "C", "G", "U", "I",
    "ADE", "CYT", "GUA", "THY", "URA",
};

pub fn is_water_name(name: &str) -> bool {
    WATER_NAMES.contains(name.trim())
}

pub fn is_nucleotide_name(name: &str) -> bool {
    NUCLEOTIDE_NAMES.contains(name.trim())
}

impl ResidueType {
    pub fn from_three_letter(name: &str) -> Option<Self> {
        RESIDUE_CODES.get(name.trim().to_ascii_uppercase().as_str()).copied()
    }

    pub fn to_three_letter(self) -> &'static str {
        match self {
            ResidueType::Alanine => "ALA",
            ResidueType::Glycine => "GLY",
            ResidueType::Isoleucine => "ILE",
            ResidueType::Leucine => "LEU",
            ResidueType::Proline => "PRO",
            ResidueType::Valine => "VAL",
            ResidueType::Phenylalanine => "PHE",
            ResidueType::Tryptophan => "TRP",
            ResidueType::Tyrosine => "TYR",
            ResidueType::Asparagine => "ASN",
            ResidueType::Cysteine => "CYS",
            ResidueType::Glutamine => "GLN",
            ResidueType::Serine => "SER",
            ResidueType::Threonine => "THR",
            ResidueType::Methionine => "MET",
            ResidueType::Arginine => "ARG",
            ResidueType::Lysine => "LYS",
            ResidueType::AsparticAcid => "ASP",
            ResidueType::GlutamicAcid => "GLU",
            ResidueType::Histidine => "HIS",
            ResidueType::Selenomethionine => "MSE",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown residue name: '{0}'")]
pub struct ParseResidueTypeError(pub String);

impl FromStr for ResidueType {
    type Err = ParseResidueTypeError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_three_letter(s).ok_or_else(|| ParseResidueTypeError(s.to_string()))
    }
}

impl fmt::Display for ResidueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_three_letter())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Residue {
    pub residue_number: isize,          // Residue sequence number from source file
    pub insertion_code: Option<char>,   // PDB insertion code, if any
    pub name: String,                   // Residue name as written (e.g., "SER")
    pub residue_type: Option<ResidueType>,
    pub chain_id: ChainId,              // ID of the parent chain
    pub is_hetero: bool,                // Read from HETATM records
    pub(crate) atoms: Vec<AtomId>,
    atom_name_map: HashMap<String, Vec<AtomId>>,
}

impl Residue {
    pub(crate) fn new(
        residue_number: isize,
        insertion_code: Option<char>,
        name: &str,
        residue_type: Option<ResidueType>,
        chain_id: ChainId,
    ) -> Self {
        Self {
            residue_number,
            insertion_code,
            name: name.to_string(),
            residue_type,
            chain_id,
            is_hetero: false,
            atoms: Vec::new(),
            atom_name_map: HashMap::new(),
        }
    }

    pub(crate) fn add_atom(&mut self, atom_name: &str, atom_id: AtomId) {
        self.atoms.push(atom_id);
        self.atom_name_map
            .entry(atom_name.to_string())
            .or_default()
            .push(atom_id);
    }

    pub(crate) fn remove_atom(&mut self, atom_name: &str, atom_id: AtomId) {
        self.atoms.retain(|&id| id != atom_id);
        if let Some(ids) = self.atom_name_map.get_mut(atom_name) {
            ids.retain(|&id| id != atom_id);
            if ids.is_empty() {
                self.atom_name_map.remove(atom_name);
            }
        }
    }

    pub fn atoms(&self) -> &[AtomId] {
        &self.atoms
    }

    /// First atom with the given name, which is the one kept when a file carries
    /// several alternate locations under one name.
    pub fn get_first_atom_id_by_name(&self, name: &str) -> Option<AtomId> {
        self.atom_name_map.get(name).and_then(|ids| ids.first()).copied()
    }

    pub fn get_atom_ids_by_name(&self, name: &str) -> Option<&[AtomId]> {
        self.atom_name_map.get(name).map(|v| v.as_slice())
    }

    /// Residues with an insertion code or a negative number have no plain integer
    /// index and are left out of contiguity-based searches.
    pub fn has_numeric_index(&self) -> bool {
        self.insertion_code.is_none() && self.residue_number >= 0
    }

    pub fn is_amino_acid(&self) -> bool {
        self.residue_type.is_some()
    }

    pub fn is_nucleotide(&self) -> bool {
        is_nucleotide_name(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    fn dummy_atom_id(n: u64) -> AtomId {
        AtomId::from(KeyData::from_ffi(n))
    }

    fn dummy_chain_id(n: u64) -> ChainId {
        ChainId::from(KeyData::from_ffi(n))
    }

    #[test]
    fn residue_type_parses_standard_and_variant_names() {
        assert_eq!(ResidueType::from_three_letter("SER"), Some(ResidueType::Serine));
        assert_eq!(ResidueType::from_three_letter("thr"), Some(ResidueType::Threonine));
        assert_eq!(ResidueType::from_three_letter("HSE"), Some(ResidueType::Histidine));
        assert_eq!(
            ResidueType::from_three_letter("MSE"),
            Some(ResidueType::Selenomethionine)
        );
        assert_eq!(ResidueType::from_three_letter("HOH"), None);
        assert!(ResidueType::from_str("NAG").is_err());
    }

    #[test]
    fn water_names_are_recognised() {
        assert!(is_water_name("HOH"));
        assert!(is_water_name(" WAT"));
        assert!(!is_water_name("SER"));
    }

    #[test]
    fn nucleotide_names_are_recognised() {
        assert!(is_nucleotide_name("DA"));
        assert!(is_nucleotide_name(" U"));
        assert!(!is_nucleotide_name("ALA"));
        assert!(!is_nucleotide_name("HOH"));
        let residue = Residue::new(3, None, "DG", None, dummy_chain_id(2));
        assert!(residue.is_nucleotide());
        assert!(!residue.is_amino_acid());
    }

    #[test]
    fn new_residue_initializes_fields_correctly() {
        let chain_id = dummy_chain_id(1);
        let residue = Residue::new(10, None, "SER", Some(ResidueType::Serine), chain_id);
        assert_eq!(residue.residue_number, 10);
        assert_eq!(residue.name, "SER");
        assert_eq!(residue.chain_id, chain_id);
        assert!(residue.atoms().is_empty());
        assert!(residue.has_numeric_index());
        assert!(residue.is_amino_acid());
    }

    #[test]
    fn insertion_code_disables_numeric_index() {
        let residue = Residue::new(52, Some('A'), "GLY", None, dummy_chain_id(1));
        assert!(!residue.has_numeric_index());
    }

    #[test]
    fn negative_numbers_are_not_numeric_indices() {
        let residue = Residue::new(-3, None, "MET", None, dummy_chain_id(1));
        assert!(!residue.has_numeric_index());
        let residue = Residue::new(0, None, "MET", None, dummy_chain_id(1));
        assert!(residue.has_numeric_index());
    }

    #[test]
    fn atoms_with_shared_names_are_all_kept() {
        let mut residue = Residue::new(7, None, "THR", None, dummy_chain_id(3));
        residue.add_atom("OG1", dummy_atom_id(1));
        residue.add_atom("OG1", dummy_atom_id(2));
        assert_eq!(residue.get_atom_ids_by_name("OG1").unwrap().len(), 2);
        assert_eq!(residue.get_first_atom_id_by_name("OG1"), Some(dummy_atom_id(1)));

        residue.remove_atom("OG1", dummy_atom_id(1));
        assert_eq!(residue.get_first_atom_id_by_name("OG1"), Some(dummy_atom_id(2)));
        residue.remove_atom("OG1", dummy_atom_id(2));
        assert!(residue.get_first_atom_id_by_name("OG1").is_none());
        assert!(residue.atoms().is_empty());
    }
}
