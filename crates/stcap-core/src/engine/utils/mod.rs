//! Helpers shared by the engine passes: chain residue indexing and atom views.

pub mod query;
