//! # Engine Module
//!
//! The analysis logic that runs on a loaded structure: contact measurement, motif
//! classification, interface detection, surface flagging and hit annotation.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Contact thresholds, chain filters, interface and
//!   annotation settings with validated defaults
//! - **Contacts** ([`contacts`]) - Distance and angle measurements at amide hydrogens
//! - **Motif Classification** ([`motif`]) - The contact pattern table and chain scans
//! - **Interface Detection** ([`interface`]) - Buried surface by SASA differencing
//! - **Surface Flagging** ([`surface`]) - Interface overlap of each hit's loop
//! - **Annotation** ([`annotation`]) - Sequence, secondary structure and dihedrals
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events
//! - **Error Handling** ([`error`]) - Engine-level error types
//!
//! Every pass reads the structure without modifying it.

pub mod annotation;
pub mod config;
pub mod contacts;
pub mod error;
pub mod interface;
pub mod motif;
pub mod progress;
pub mod surface;
pub mod utils;
