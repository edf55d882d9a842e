//! Classification of Serine/Threonine capping loops.
//!
//! A candidate residue `x` donates from its side-chain oxygen to the amides of
//! `x+2` and `x+3`, and from its backbone carbonyl to the amides of `x+3` and `x+4`.
//! The presence or absence of these four contacts forms a [`ContactPattern`] that is
//! mapped onto one of eight subtypes by a fixed lookup table.

use crate::core::models::ids::ChainId;
use crate::core::models::residue::ResidueType;
use crate::core::models::system::MolecularSystem;
use crate::engine::config::{ContactCriteria, SearchConfig};
use crate::engine::contacts::{CapContacts, CapWindow, ContactError, measure_cap_contacts};
use crate::engine::utils::query::ChainIndex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MotifSubtype {
    C1,
    C2,
    C2a,
    C3,
    C3a,
    C4,
    C4a,
    C5,
}

impl MotifSubtype {
    pub const ALL: [MotifSubtype; 8] = [
        MotifSubtype::C1,
        MotifSubtype::C2,
        MotifSubtype::C2a,
        MotifSubtype::C3,
        MotifSubtype::C3a,
        MotifSubtype::C4,
        MotifSubtype::C4a,
        MotifSubtype::C5,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MotifSubtype::C1 => "C1",
            MotifSubtype::C2 => "C2",
            MotifSubtype::C2a => "C2a",
            MotifSubtype::C3 => "C3",
            MotifSubtype::C3a => "C3a",
            MotifSubtype::C4 => "C4",
            MotifSubtype::C4a => "C4a",
            MotifSubtype::C5 => "C5",
        }
    }

    /// Number of residues after the start that the surface check covers.
    pub fn surface_span(self) -> isize {
        match self {
            MotifSubtype::C1 | MotifSubtype::C2a | MotifSubtype::C3a => 3,
            _ => 4,
        }
    }
}

impl fmt::Display for MotifSubtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown motif subtype '{0}'")]
pub struct ParseMotifSubtypeError(pub String);

impl FromStr for MotifSubtype {
    type Err = ParseMotifSubtypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        MotifSubtype::ALL
            .into_iter()
            .find(|subtype| subtype.label() == trimmed)
            .ok_or_else(|| ParseMotifSubtypeError(s.to_string()))
    }
}

/// Presence of the four defining contacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ContactPattern {
    pub s2: bool,
    pub s3: bool,
    pub m3: bool,
    pub m4: bool,
}

const SUBTYPE_TABLE: [Option<MotifSubtype>; 16] = {
    let mut table = [None; 16];
    table[0b0101] = Some(MotifSubtype::C5);
    table[0b0110] = Some(MotifSubtype::C3a);
    table[0b0111] = Some(MotifSubtype::C4a);
    table[0b1010] = Some(MotifSubtype::C1);
    table[0b1011] = Some(MotifSubtype::C2);
    table[0b1101] = Some(MotifSubtype::C4);
    table[0b1110] = Some(MotifSubtype::C2a);
    table[0b1111] = Some(MotifSubtype::C3);
    table
};

impl ContactPattern {
    pub fn from_contacts(contacts: &CapContacts, criteria: &ContactCriteria) -> Self {
        Self {
            s2: contacts.side_chain_2.is_present(criteria),
            s3: contacts.side_chain_3.is_present(criteria),
            m3: contacts.main_chain_3.is_present(criteria),
            m4: contacts.main_chain_4.is_present(criteria),
        }
    }

    /// Packs the pattern as `S2 S3 M3 M4`, most significant bit first.
    pub fn key(&self) -> usize {
        (usize::from(self.s2) << 3)
            | (usize::from(self.s3) << 2)
            | (usize::from(self.m3) << 1)
            | usize::from(self.m4)
    }

    pub fn from_key(key: usize) -> Self {
        Self {
            s2: key & 0b1000 != 0,
            s3: key & 0b0100 != 0,
            m3: key & 0b0010 != 0,
            m4: key & 0b0001 != 0,
        }
    }

    pub fn classify(&self) -> Option<MotifSubtype> {
        SUBTYPE_TABLE[self.key()]
    }
}

impl fmt::Display for ContactPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |b: bool| if b { 'T' } else { 'F' };
        write!(
            f,
            "S2={} S3={} M3={} M4={}",
            flag(self.s2),
            flag(self.s3),
            flag(self.m3),
            flag(self.m4)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CapResidue {
    Serine,
    Threonine,
}

impl CapResidue {
    pub fn residue_type(self) -> ResidueType {
        match self {
            CapResidue::Serine => ResidueType::Serine,
            CapResidue::Threonine => ResidueType::Threonine,
        }
    }

    pub fn cap_atom_name(self) -> &'static str {
        match self {
            CapResidue::Serine => "OG",
            CapResidue::Threonine => "OG1",
        }
    }

    pub fn from_residue_type(residue_type: ResidueType) -> Option<Self> {
        match residue_type {
            ResidueType::Serine => Some(CapResidue::Serine),
            ResidueType::Threonine => Some(CapResidue::Threonine),
            _ => None,
        }
    }
}

impl FromStr for CapResidue {
    type Err = ParseMotifSubtypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SER" | "SERINE" | "S" => Ok(CapResidue::Serine),
            "THR" | "THREONINE" | "T" => Ok(CapResidue::Threonine),
            _ => Err(ParseMotifSubtypeError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Exposure {
    Surface,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotifHit {
    pub structure_id: String,
    pub chain_id: char,
    pub start_index: isize,
    pub subtype: MotifSubtype,
    pub surface: Option<Exposure>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipCause {
    /// `x+4` is absent, not contiguous, or the residue is too close to the chain end.
    NonContiguousWindow,
    Geometry(ContactError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResidueOutcome {
    Hit(MotifSubtype),
    NoMatchingRule(ContactPattern),
    Skipped(SkipCause),
}

/// Result of scanning one chain: the hits and the outcome of every candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainScan {
    pub hits: Vec<MotifHit>,
    pub outcomes: Vec<(isize, ResidueOutcome)>,
}

impl ChainScan {
    pub fn candidates(&self) -> usize {
        self.outcomes.len()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| matches!(outcome, ResidueOutcome::Skipped(_)))
            .count()
    }
}

fn candidate_cap(
    system: &MolecularSystem,
    index: &ChainIndex,
    number: isize,
    caps: &[CapResidue],
) -> Option<CapResidue> {
    let residue = system.residue(index.get(number)?)?;
    let cap = CapResidue::from_residue_type(residue.residue_type?)?;
    caps.contains(&cap).then_some(cap)
}

/// The residue numbered `start` has a usable window when `start+4` follows it at
/// sorted position `k+4` and at least one residue comes after `start+4`.
fn has_contiguous_window(index: &ChainIndex, position: usize, start: isize) -> bool {
    let Some(last) = index.last_number() else {
        return false;
    };
    start < last - 4 && index.numbers().get(position + 4) == Some(&(start + 4))
}

pub fn classify_window(
    system: &MolecularSystem,
    window: &CapWindow,
    cap: CapResidue,
    criteria: &ContactCriteria,
) -> Result<ContactPattern, ContactError> {
    let contacts = measure_cap_contacts(system, window, cap.cap_atom_name(), criteria)?;
    Ok(ContactPattern::from_contacts(&contacts, criteria))
}

/// Scans every Serine/Threonine of a chain for capping loops.
///
/// Chain length and density filters are the caller's concern; this function only
/// applies the per-residue window rule. The structure is not modified.
pub fn scan_chain(
    system: &MolecularSystem,
    structure_id: &str,
    chain_id: ChainId,
    config: &SearchConfig,
) -> ChainScan {
    let Some(chain) = system.chain(chain_id) else {
        return ChainScan::default();
    };
    let index = ChainIndex::build(system, chain_id);
    let mut scan = ChainScan::default();

    for (position, &start) in index.numbers().iter().enumerate() {
        let Some(cap) = candidate_cap(system, &index, start, &config.cap_residues) else {
            continue;
        };

        let outcome = if !has_contiguous_window(&index, position, start) {
            ResidueOutcome::Skipped(SkipCause::NonContiguousWindow)
        } else {
            match CapWindow::resolve(&index, start)
                .and_then(|window| classify_window(system, &window, cap, &config.contacts))
            {
                Ok(pattern) => match pattern.classify() {
                    Some(subtype) => ResidueOutcome::Hit(subtype),
                    None => ResidueOutcome::NoMatchingRule(pattern),
                },
                Err(e) => ResidueOutcome::Skipped(SkipCause::Geometry(e)),
            }
        };

        match &outcome {
            ResidueOutcome::Hit(subtype) => {
                debug!(chain = %chain.id, residue = start, %subtype, "Capping loop found");
                scan.hits.push(MotifHit {
                    structure_id: structure_id.to_string(),
                    chain_id: chain.id,
                    start_index: start,
                    subtype: *subtype,
                    surface: None,
                });
            }
            ResidueOutcome::NoMatchingRule(pattern) => {
                trace!(chain = %chain.id, residue = start, %pattern, "No subtype for pattern");
            }
            ResidueOutcome::Skipped(cause) => {
                trace!(chain = %chain.id, residue = start, ?cause, "Candidate skipped");
            }
        }
        scan.outcomes.push((start, outcome));
    }
    scan
}
