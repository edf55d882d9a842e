//! # Core Models Module
//!
//! Data structures that represent a loaded protein structure.
//!
//! ## Key Components
//!
//! - [`atom`] - Atom with name, element, role and coordinates
//! - [`residue`] - Residue with number, insertion code and named atoms
//! - [`chain`] - Chain with its residues in file order
//! - [`system`] - The complete structure, backed by slot maps
//! - [`ids`] - Key types for atoms, residues and chains
//!
//! ## Usage
//!
//! ```ignore
//! use stcap::core::models::{atom::Atom, chain::ChainType, system::MolecularSystem};
//!
//! let mut system = MolecularSystem::new();
//! let chain_id = system.add_chain('A', ChainType::Protein);
//! let residue_id = system.add_residue(chain_id, (1, None), "SER", None)?;
//!
//! let atom = Atom::new("OG", residue_id, Point3::new(0.0, 0.0, 0.0));
//! system.add_atom_to_residue(residue_id, atom)?;
//! ```

pub mod atom;
pub mod chain;
pub mod ids;
pub mod residue;
pub mod system;
