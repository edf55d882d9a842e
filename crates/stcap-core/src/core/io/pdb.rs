use crate::core::io::traits::MolecularFile;
use crate::core::models::atom::{Atom, AtomRole, Element};
use crate::core::models::chain::ChainType;
use crate::core::models::ids::{ChainId, ResidueId};
use crate::core::models::residue::{ResidueType, is_water_name};
use crate::core::models::system::MolecularSystem;
use crate::core::utils::identifiers::is_backbone_atom;
use nalgebra::Point3;
use std::collections::HashMap;
use std::io::{self, BufRead};
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdbMetadata {
    /// Four-character entry code from the HEADER record, if present.
    pub id_code: Option<String>,
    /// Number of MODEL records seen before reading stopped.
    pub models_seen: usize,
    /// Atoms dropped because an earlier alternate location was already kept.
    pub skipped_alt_locations: usize,
}

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: PdbParseErrorKind },
    #[error("Missing required record: {0}")]
    MissingRecord(String),
}

#[derive(Debug, Error)]
pub enum PdbParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Required field in columns {columns} is empty")]
    MissingRequiredField { columns: String },
    #[error("Line is too short for ATOM/HETATM record (must be at least 54 chars)")]
    LineTooShort,
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end).unwrap_or("").trim()
}

fn column_char(line: &str, index: usize) -> Option<char> {
    line.get(index..index + 1)
        .and_then(|s| s.chars().next())
        .filter(|c| !c.is_whitespace())
}

fn parse_float(line: &str, line_num: usize, start: usize, end: usize) -> Result<f64, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidFloat {
            columns: format!("{}-{}", start + 1, end),
            value: value.into(),
        },
    })
}

fn classify_atom(name: &str, residue_type: Option<ResidueType>, is_water: bool) -> AtomRole {
    if is_water {
        AtomRole::Water
    } else if residue_type.is_none() {
        AtomRole::Ligand
    } else if is_backbone_atom(name) {
        AtomRole::Backbone
    } else {
        AtomRole::Sidechain
    }
}

#[derive(Default)]
struct ChainComposition {
    polymer: bool,
    water: bool,
    other: bool,
}

impl ChainComposition {
    fn chain_type(&self) -> ChainType {
        match (self.polymer, self.water, self.other) {
            (true, _, _) => ChainType::Protein,
            (false, true, false) => ChainType::Water,
            (false, _, true) => ChainType::Ligand,
            _ => ChainType::Other,
        }
    }
}

/// Reader for the fixed-column PDB format.
///
/// Only the first model of multi-model files is read, and for atoms with
/// alternate locations the first location encountered is kept.
pub struct PdbFile;

impl MolecularFile for PdbFile {
    type Metadata = PdbMetadata;
    type Error = PdbError;

    fn read_from(
        reader: &mut impl BufRead,
    ) -> Result<(MolecularSystem, Self::Metadata), Self::Error> {
        let mut system = MolecularSystem::new();
        let mut metadata = PdbMetadata::default();
        let mut compositions: HashMap<ChainId, ChainComposition> = HashMap::new();
        let mut current: Option<(ChainId, isize, Option<char>, ResidueId)> = None;
        let mut atom_count = 0usize;

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;
            let record_type = slice_and_trim(&line, 0, 6);

            match record_type {
                "HEADER" => {
                    let code = slice_and_trim(&line, 62, 66);
                    if !code.is_empty() {
                        metadata.id_code = Some(code.to_string());
                    }
                }
                "MODEL" => {
                    metadata.models_seen += 1;
                    if metadata.models_seen > 1 || atom_count > 0 {
                        break;
                    }
                }
                "ENDMDL" | "END" => break,
                "ATOM" | "HETATM" => {
                    if line.len() < 54 {
                        return Err(PdbError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::LineTooShort,
                        });
                    }

                    let name = slice_and_trim(&line, 12, 16);
                    if name.is_empty() {
                        return Err(PdbError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::MissingRequiredField {
                                columns: "13-16".into(),
                            },
                        });
                    }
                    let serial_str = slice_and_trim(&line, 6, 11);
                    // Hybrid-36 or overflowed serials are tolerated; the serial is informational.
                    let serial: usize = serial_str.parse().unwrap_or(0);
                    let alt_loc = column_char(&line, 16);
                    let res_name = slice_and_trim(&line, 17, 20);
                    let chain_char = line.get(21..22).and_then(|s| s.chars().next()).unwrap_or(' ');
                    let res_seq_str = slice_and_trim(&line, 22, 26);
                    let res_seq: isize = res_seq_str.parse().map_err(|_| PdbError::Parse {
                        line: line_num,
                        kind: PdbParseErrorKind::InvalidInt {
                            columns: "23-26".into(),
                            value: res_seq_str.into(),
                        },
                    })?;
                    let insertion_code = column_char(&line, 26);
                    let x = parse_float(&line, line_num, 30, 38)?;
                    let y = parse_float(&line, line_num, 38, 46)?;
                    let z = parse_float(&line, line_num, 46, 54)?;
                    let element = slice_and_trim(&line, 76, 78)
                        .parse::<Element>()
                        .unwrap_or_else(|_| Element::from_atom_name(name));

                    let chain_id = system.add_chain(chain_char, ChainType::Other);
                    let residue_id = match current {
                        Some((cid, seq, icode, rid))
                            if cid == chain_id && seq == res_seq && icode == insertion_code =>
                        {
                            rid
                        }
                        _ => {
                            let residue_type = ResidueType::from_three_letter(res_name);
                            let rid = system
                                .add_residue(
                                    chain_id,
                                    (res_seq, insertion_code),
                                    res_name,
                                    residue_type,
                                )
                                .ok_or_else(|| {
                                    PdbError::MissingRecord(format!("chain '{}'", chain_char))
                                })?;
                            current = Some((chain_id, res_seq, insertion_code, rid));
                            rid
                        }
                    };

                    let (residue_type, is_water) = match system.residue_mut(residue_id) {
                        Some(residue) => {
                            if record_type == "HETATM" {
                                residue.is_hetero = true;
                            }
                            if alt_loc.is_some()
                                && residue.get_first_atom_id_by_name(name).is_some()
                            {
                                metadata.skipped_alt_locations += 1;
                                continue;
                            }
                            (residue.residue_type, is_water_name(&residue.name))
                        }
                        None => continue,
                    };

                    let composition = compositions.entry(chain_id).or_default();
                    if is_water {
                        composition.water = true;
                    } else if residue_type.is_some() {
                        composition.polymer = true;
                    } else {
                        composition.other = true;
                    }

                    let mut atom = Atom::new(name, residue_id, Point3::new(x, y, z));
                    atom.serial = serial;
                    atom.element = element;
                    atom.role = classify_atom(name, residue_type, is_water);
                    system.add_atom_to_residue(residue_id, atom);
                    atom_count += 1;
                }
                _ => {}
            }
        }

        if atom_count == 0 {
            return Err(PdbError::MissingRecord("ATOM/HETATM records".into()));
        }

        for (chain_id, composition) in compositions {
            if let Some(chain) = system.chain_mut(chain_id) {
                chain.chain_type = composition.chain_type();
            }
        }

        Ok((system, metadata))
    }
}
