//! # Workflows Module
//!
//! Per-structure entry points that tie the engine passes together. Each workflow
//! takes a loaded [`MolecularSystem`](crate::core::models::system::MolecularSystem),
//! reports its phases through a
//! [`ProgressReporter`](crate::engine::progress::ProgressReporter) and leaves the
//! input structure unchanged.
//!
//! - **Preparation** ([`prepare`]) - Solvent and ligand removal, chain filters and
//!   amide hydrogen placement
//! - **Search** ([`search`]) - Capping-loop scan of one chain with surface flags
//! - **Annotation** ([`annotate`]) - Sequence, secondary structure and backbone
//!   dihedrals around each hit

pub mod annotate;
pub mod prepare;
pub mod search;
