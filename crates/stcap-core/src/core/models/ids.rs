use slotmap::new_key_type;

// Stable handles into the `MolecularSystem` slot maps.
new_key_type! {
    pub struct AtomId;
    pub struct ResidueId;
    pub struct ChainId;
}
