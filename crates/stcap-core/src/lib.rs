//! # STCAP Core Library
//!
//! Detection and annotation of Serine/Threonine capping loops in protein structures.
//!
//! A capping loop is a short backbone motif in which the side-chain oxygen of a
//! Serine or Threonine and its own backbone carbonyl accept hydrogen bonds from the
//! amides two to four residues further along the chain. The four possible contacts
//! sort each loop into one of eight subtypes (C1, C2, C2a, C3, C3a, C4, C4a, C5).
//!
//! ## Architecture
//!
//! - **[`core`]: The Foundation.** Stateless data models (`MolecularSystem`), the PDB
//!   reader, coordinate geometry, amide hydrogen placement, solvent-accessible surface
//!   area and DSSP secondary structure.
//!
//! - **[`engine`]: The Analysis.** Contact measurement and the subtype table, the
//!   interface detector, surface flags and hit annotation, with their configuration
//!   and error types.
//!
//! - **[`workflows`]: The Public API.** One call per structure: prepare a working
//!   copy, search a chain, annotate hits.

pub mod core;
pub mod engine;
pub mod workflows;
