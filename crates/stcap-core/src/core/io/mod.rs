//! Provides input functionality for molecular file formats.
//!
//! Structures are read through the [`traits::MolecularFile`] trait; [`pdb`] implements
//! it for fixed-column PDB files.

pub mod pdb;
pub mod traits;
