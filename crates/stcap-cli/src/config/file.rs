use crate::error::{CliError, Result};
use serde::Deserialize;
use stcap::engine::config::{DeltaGranularity, OffsetWindow};
use std::path::Path;
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileContactsConfig {
    pub max_distance: Option<f64>,
    pub min_angle: Option<f64>,
    pub hydrogen_search_radius: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileChainFilterConfig {
    pub min_residues: Option<usize>,
    pub min_atoms_per_residue: Option<f64>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FileGranularity {
    Atom,
    Residue,
}

impl From<FileGranularity> for DeltaGranularity {
    fn from(g: FileGranularity) -> Self {
        match g {
            FileGranularity::Atom => DeltaGranularity::Atom,
            FileGranularity::Residue => DeltaGranularity::Residue,
        }
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileInterfaceConfig {
    pub cutoff: Option<f64>,
    pub granularity: Option<FileGranularity>,
    pub probe_radius: Option<f64>,
    pub sphere_points: Option<usize>,
    pub include_hydrogens: Option<bool>,
    pub skip: Option<bool>,
}

/// A `[start, end]` pair of offsets from a hit's start index.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileWindow(pub isize, pub isize);

impl From<FileWindow> for OffsetWindow {
    fn from(w: FileWindow) -> Self {
        OffsetWindow::new(w.0, w.1)
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileAnnotationConfig {
    pub sequence_window: Option<FileWindow>,
    pub secondary_structure_window: Option<FileWindow>,
    pub dihedral_window: Option<FileWindow>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileBatchConfig {
    pub jobs: Option<usize>,
    pub checkpoint_interval: Option<usize>,
    pub item_timeout_secs: Option<u64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    /// Three-letter names of the residues that may start a loop.
    pub cap_residues: Option<Vec<String>>,
    pub contacts: Option<FileContactsConfig>,
    pub chain_filter: Option<FileChainFilterConfig>,
    pub interface: Option<FileInterfaceConfig>,
    pub annotation: Option<FileAnnotationConfig>,
    pub batch: Option<FileBatchConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
