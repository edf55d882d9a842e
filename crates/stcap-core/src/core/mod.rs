//! # Core Module
//!
//! Stateless building blocks: the structure model, the PDB reader, coordinate
//! geometry and the structure-level algorithms the analysis engine is built on.
//!
//! ## Architecture
//!
//! - **Molecular Representation** ([`models`]) - Atoms, residues, chains and systems
//! - **File I/O** ([`io`]) - Reading PDB files into a [`models::system::MolecularSystem`]
//! - **Utilities** ([`utils`]) - Distances, angles, dihedrals and atom-name vocabularies
//! - **Protonation** ([`protonation`]) - Placement of backbone amide hydrogens
//! - **Surface Area** ([`sasa`]) - Shrake–Rupley solvent-accessible surface area
//! - **Secondary Structure** ([`secondary`]) - Kabsch–Sander (DSSP) state assignment

pub mod io;
pub mod models;
pub mod protonation;
pub mod sasa;
pub mod secondary;
pub mod utils;
