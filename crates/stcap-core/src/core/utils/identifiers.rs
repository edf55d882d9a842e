use phf::{Set, phf_set};

// Heavy atoms of the peptide backbone, including C-terminal oxygens.
static BACKBONE_HEAVY_NAMES: Set<&'static str> = phf_set! {
    "N", "CA", "C", "O", "OXT", "OT1", "OT2", "NT",
};

// Amide, alpha and N-terminal hydrogens under PDB, CHARMM and legacy naming.
static BACKBONE_HYDROGEN_NAMES: Set<&'static str> = phf_set! {
    "H", "HN", "H1", "H2", "H3", "1H", "2H", "3H", "HT1", "HT2", "HT3",
    "HA", "HA1", "HA2", "HA3", "1HA", "2HA", "HC", "HOXT",
};

/// Whether a PDB atom name belongs to the backbone. Names are matched exactly after
/// trimming the column padding.
pub fn is_backbone_atom(atom_name: &str) -> bool {
    let name = atom_name.trim();
    BACKBONE_HEAVY_NAMES.contains(name) || BACKBONE_HYDROGEN_NAMES.contains(name)
}
