//! CSV tables read and written by the batch commands.
//!
//! Column order of the hit tables is part of the output format; downstream scripts
//! address the columns by position.

use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use stcap::engine::annotation::HitAnnotation;
use stcap::engine::motif::{Exposure, MotifHit, MotifSubtype};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const SURFACE_LITERAL: &str = "surface";
const LIST_SEPARATOR: &str = ";";

/// A row type with a fixed header.
pub trait TableRow: Serialize {
    const HEADERS: &'static [&'static str];
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub structure_id: String,
    pub chain_id: char,
}

#[derive(Debug, Deserialize)]
struct ManifestRow {
    structure_id: String,
    chain_id: String,
}

fn parse_chain_id(raw: &str) -> Option<char> {
    let mut chars = raw.chars().filter(|c| !c.is_whitespace());
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

fn parse_error(path: &Path, message: String) -> CliError {
    CliError::FileParsing {
        path: path.to_path_buf(),
        source: anyhow::anyhow!(message),
    }
}

/// Reads the `structure_id,chain_id` manifest. Extra columns are ignored.
pub fn read_manifest(path: &Path) -> Result<Vec<ManifestEntry>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut entries = Vec::new();
    for (row, record) in reader.deserialize::<ManifestRow>().enumerate() {
        let record = record?;
        let chain_id = parse_chain_id(&record.chain_id).ok_or_else(|| {
            parse_error(
                path,
                format!(
                    "row {}: chain id '{}' is not a single character",
                    row + 1,
                    record.chain_id
                ),
            )
        })?;
        entries.push(ManifestEntry {
            structure_id: record.structure_id.trim().to_string(),
            chain_id,
        });
    }
    debug!(rows = entries.len(), "Manifest loaded from {:?}", path);
    Ok(entries)
}

/// Selects manifest rows by 1-based inclusive bounds. A `start` of `0` or `None`
/// begins at the first row; an `end` of `None` runs to the last.
pub fn select_rows<T>(mut rows: Vec<T>, start: Option<usize>, end: Option<usize>) -> Vec<T> {
    let end = end.unwrap_or(rows.len()).min(rows.len());
    let first = start.unwrap_or(0).saturating_sub(1);
    if first >= end {
        return Vec::new();
    }
    rows.truncate(end);
    rows.drain(..first);
    rows
}

/// Reads structure ids to skip, one per line. Blank lines and `#` comments are
/// ignored, and a trailing `.pdb` is dropped so directory listings can be used as-is.
pub fn read_skip_list(path: &Path) -> Result<HashSet<String>> {
    let content = fs::read_to_string(path)?;
    let ids: HashSet<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.strip_suffix(".pdb").unwrap_or(line).to_string())
        .collect();
    info!(entries = ids.len(), "Skip list loaded.");
    Ok(ids)
}

pub fn structure_path(dir: &Path, structure_id: &str) -> PathBuf {
    dir.join(format!("{}.pdb", structure_id))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitRecord {
    pub structure_id: String,
    pub chain_id: String,
    pub start_index: isize,
    pub subtype: String,
    #[serde(default)]
    pub surface: String,
}

impl TableRow for HitRecord {
    const HEADERS: &'static [&'static str] =
        &["structure_id", "chain_id", "start_index", "subtype", "surface"];
}

fn surface_field(surface: Option<Exposure>) -> String {
    match surface {
        Some(Exposure::Surface) => SURFACE_LITERAL.to_string(),
        None => String::new(),
    }
}

impl From<&MotifHit> for HitRecord {
    fn from(hit: &MotifHit) -> Self {
        Self {
            structure_id: hit.structure_id.clone(),
            chain_id: hit.chain_id.to_string(),
            start_index: hit.start_index,
            subtype: hit.subtype.label().to_string(),
            surface: surface_field(hit.surface),
        }
    }
}

impl HitRecord {
    pub fn into_hit(self) -> std::result::Result<MotifHit, String> {
        let chain_id = parse_chain_id(&self.chain_id)
            .ok_or_else(|| format!("chain id '{}' is not a single character", self.chain_id))?;
        let subtype: MotifSubtype = self.subtype.parse().map_err(|e| format!("{}", e))?;
        let surface = match self.surface.trim() {
            "" => None,
            s if s.eq_ignore_ascii_case(SURFACE_LITERAL) => Some(Exposure::Surface),
            other => return Err(format!("unexpected surface value '{}'", other)),
        };
        Ok(MotifHit {
            structure_id: self.structure_id.trim().to_string(),
            chain_id,
            start_index: self.start_index,
            subtype,
            surface,
        })
    }
}

/// Reads a hits table written by the search command.
pub fn read_hits(path: &Path) -> Result<Vec<MotifHit>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut hits = Vec::new();
    for (row, record) in reader.deserialize::<HitRecord>().enumerate() {
        let hit = record?
            .into_hit()
            .map_err(|message| parse_error(path, format!("row {}: {}", row + 1, message)))?;
        hits.push(hit);
    }
    debug!(hits = hits.len(), "Hits loaded from {:?}", path);
    Ok(hits)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedHitRecord {
    pub structure_id: String,
    pub chain_id: String,
    pub start_index: isize,
    pub subtype: String,
    pub surface: String,
    pub sequence: String,
    pub secondary_structure: String,
    pub phi_psi: String,
}

impl TableRow for AnnotatedHitRecord {
    const HEADERS: &'static [&'static str] = &[
        "structure_id",
        "chain_id",
        "start_index",
        "subtype",
        "surface",
        "sequence",
        "secondary_structure",
        "phi_psi",
    ];
}

impl From<&HitAnnotation> for AnnotatedHitRecord {
    fn from(annotation: &HitAnnotation) -> Self {
        let hit = HitRecord::from(&annotation.hit);
        let secondary_structure: Vec<String> = annotation
            .secondary_structure
            .iter()
            .map(ToString::to_string)
            .collect();
        let phi_psi: Vec<String> = annotation
            .dihedrals
            .iter()
            .map(|d| format!("{}:{:.2}/{:.2}", d.residue_number, d.phi, d.psi))
            .collect();
        Self {
            structure_id: hit.structure_id,
            chain_id: hit.chain_id,
            start_index: hit.start_index,
            subtype: hit.subtype,
            surface: hit.surface,
            sequence: annotation.sequence.join(LIST_SEPARATOR),
            secondary_structure: secondary_structure.join(LIST_SEPARATOR),
            phi_psi: phi_psi.join(LIST_SEPARATOR),
        }
    }
}

/// Accumulates output rows and rewrites the whole table every `interval` processed
/// items. Each write goes to a sibling temporary file that is then renamed over the
/// target, so a reader never sees a half-written table.
pub struct CheckpointWriter<R> {
    path: PathBuf,
    rows: Vec<R>,
    interval: usize,
    pending_items: usize,
}

impl<R: TableRow> CheckpointWriter<R> {
    pub fn new(path: impl Into<PathBuf>, interval: usize) -> Self {
        Self {
            path: path.into(),
            rows: Vec::new(),
            interval: interval.max(1),
            pending_items: 0,
        }
    }

    pub fn extend(&mut self, rows: impl IntoIterator<Item = R>) {
        self.rows.extend(rows);
    }

    /// Counts one processed item and writes a checkpoint when the interval is reached.
    ///
    /// # Return
    ///
    /// `true` if a checkpoint was written.
    pub fn item_done(&mut self) -> Result<bool> {
        self.pending_items += 1;
        if self.pending_items < self.interval {
            return Ok(false);
        }
        self.write()?;
        self.pending_items = 0;
        debug!(rows = self.rows.len(), "Checkpoint written to {:?}", self.path);
        Ok(true)
    }

    /// Writes the final table and returns the number of rows.
    pub fn finish(self) -> Result<usize> {
        self.write()?;
        Ok(self.rows.len())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".partial");
        self.path.with_file_name(name)
    }

    fn write(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let temp = self.temp_path();
        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_path(&temp)?;
            writer.write_record(R::HEADERS)?;
            for row in &self.rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }
        fs::rename(&temp, &self.path)?;
        Ok(())
    }
}
