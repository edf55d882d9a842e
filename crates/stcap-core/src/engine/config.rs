use crate::core::sasa::SurfaceComputer;
use crate::engine::motif::CapResidue;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

fn ensure_positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            reason: format!("must be a positive number, got {}", value),
        })
    }
}

/// Thresholds deciding whether a donor/acceptor pair forms a hydrogen-bond-like contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactCriteria {
    /// A contact requires a distance strictly below this value (Å).
    pub max_distance: f64,
    /// A contact requires an angle at the hydrogen of at least this value (degrees).
    pub min_angle: f64,
    /// Hydrogens of the target residue within this distance of its N are amide hydrogens (Å).
    pub hydrogen_search_radius: f64,
}

impl Default for ContactCriteria {
    fn default() -> Self {
        Self {
            max_distance: 3.5,
            min_angle: 140.0,
            hydrogen_search_radius: 2.0,
        }
    }
}

impl ContactCriteria {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("max_distance", self.max_distance)?;
        ensure_positive("hydrogen_search_radius", self.hydrogen_search_radius)?;
        if !(0.0..=180.0).contains(&self.min_angle) {
            return Err(ConfigError::InvalidParameter {
                name: "min_angle",
                reason: format!("must lie within 0-180 degrees, got {}", self.min_angle),
            });
        }
        Ok(())
    }
}

/// Conditions a target chain must meet before it is scanned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainFilter {
    /// Minimum number of distinct numeric residue indices.
    pub min_residues: usize,
    /// Minimum mean number of atoms per residue.
    pub min_atoms_per_residue: f64,
}

impl Default for ChainFilter {
    fn default() -> Self {
        Self {
            min_residues: 8,
            min_atoms_per_residue: 5.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeltaGranularity {
    /// Each atom's area change is tested on its own; the first qualifying atom of a
    /// residue reports for it.
    #[default]
    Atom,
    /// Atom changes are summed per residue before the cutoff is applied.
    Residue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceConfig {
    /// Minimum |ΔSASA| (Å²) for a residue to count as interface.
    pub cutoff: f64,
    pub granularity: DeltaGranularity,
    pub surface: SurfaceComputer,
}

impl Default for InterfaceConfig {
    fn default() -> Self {
        Self {
            cutoff: 1.0,
            granularity: DeltaGranularity::default(),
            surface: SurfaceComputer::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    pub contacts: ContactCriteria,
    pub chain_filter: ChainFilter,
    pub interface: InterfaceConfig,
    pub cap_residues: Vec<CapResidue>,
    /// Skip the interface step; hits then never carry a surface flag.
    pub skip_interface: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            contacts: ContactCriteria::default(),
            chain_filter: ChainFilter::default(),
            interface: InterfaceConfig::default(),
            cap_residues: vec![CapResidue::Serine, CapResidue::Threonine],
            skip_interface: false,
        }
    }
}

#[derive(Default)]
pub struct SearchConfigBuilder {
    max_distance: Option<f64>,
    min_angle: Option<f64>,
    hydrogen_search_radius: Option<f64>,
    min_residues: Option<usize>,
    min_atoms_per_residue: Option<f64>,
    interface_cutoff: Option<f64>,
    granularity: Option<DeltaGranularity>,
    probe_radius: Option<f64>,
    sphere_points: Option<usize>,
    include_hydrogens: Option<bool>,
    cap_residues: Option<Vec<CapResidue>>,
    skip_interface: Option<bool>,
}

impl SearchConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_distance(mut self, value: f64) -> Self {
        self.max_distance = Some(value);
        self
    }
    pub fn min_angle(mut self, value: f64) -> Self {
        self.min_angle = Some(value);
        self
    }
    pub fn hydrogen_search_radius(mut self, value: f64) -> Self {
        self.hydrogen_search_radius = Some(value);
        self
    }
    pub fn min_residues(mut self, value: usize) -> Self {
        self.min_residues = Some(value);
        self
    }
    pub fn min_atoms_per_residue(mut self, value: f64) -> Self {
        self.min_atoms_per_residue = Some(value);
        self
    }
    pub fn interface_cutoff(mut self, value: f64) -> Self {
        self.interface_cutoff = Some(value);
        self
    }
    pub fn granularity(mut self, value: DeltaGranularity) -> Self {
        self.granularity = Some(value);
        self
    }
    pub fn probe_radius(mut self, value: f64) -> Self {
        self.probe_radius = Some(value);
        self
    }
    pub fn sphere_points(mut self, value: usize) -> Self {
        self.sphere_points = Some(value);
        self
    }
    pub fn include_hydrogens(mut self, value: bool) -> Self {
        self.include_hydrogens = Some(value);
        self
    }
    pub fn cap_residues(mut self, residues: Vec<CapResidue>) -> Self {
        self.cap_residues = Some(residues);
        self
    }
    pub fn skip_interface(mut self, value: bool) -> Self {
        self.skip_interface = Some(value);
        self
    }

    /// Fills every unset value from [`SearchConfig::default`] and validates the result.
    pub fn build(self) -> Result<SearchConfig, ConfigError> {
        let defaults = SearchConfig::default();

        let contacts = ContactCriteria {
            max_distance: self.max_distance.unwrap_or(defaults.contacts.max_distance),
            min_angle: self.min_angle.unwrap_or(defaults.contacts.min_angle),
            hydrogen_search_radius: self
                .hydrogen_search_radius
                .unwrap_or(defaults.contacts.hydrogen_search_radius),
        };
        contacts.validate()?;

        let chain_filter = ChainFilter {
            min_residues: self
                .min_residues
                .unwrap_or(defaults.chain_filter.min_residues),
            min_atoms_per_residue: self
                .min_atoms_per_residue
                .unwrap_or(defaults.chain_filter.min_atoms_per_residue),
        };
        if chain_filter.min_atoms_per_residue < 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "min_atoms_per_residue",
                reason: "must not be negative".to_string(),
            });
        }

        let surface = SurfaceComputer {
            probe_radius: self
                .probe_radius
                .unwrap_or(defaults.interface.surface.probe_radius),
            sphere_points: self
                .sphere_points
                .unwrap_or(defaults.interface.surface.sphere_points),
            include_hydrogens: self
                .include_hydrogens
                .unwrap_or(defaults.interface.surface.include_hydrogens),
        };
        surface
            .validate()
            .map_err(|e| ConfigError::InvalidParameter {
                name: "sasa",
                reason: e.to_string(),
            })?;

        let cutoff = self.interface_cutoff.unwrap_or(defaults.interface.cutoff);
        if !(cutoff.is_finite() && cutoff >= 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "interface_cutoff",
                reason: format!("must be non-negative, got {}", cutoff),
            });
        }

        let cap_residues = self.cap_residues.unwrap_or(defaults.cap_residues);
        if cap_residues.is_empty() {
            return Err(ConfigError::MissingParameter("cap_residues"));
        }

        Ok(SearchConfig {
            contacts,
            chain_filter,
            interface: InterfaceConfig {
                cutoff,
                granularity: self.granularity.unwrap_or(defaults.interface.granularity),
                surface,
            },
            cap_residues,
            skip_interface: self.skip_interface.unwrap_or(defaults.skip_interface),
        })
    }
}

/// Inclusive window of residue offsets relative to a hit's start index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetWindow {
    pub start: isize,
    pub end: isize,
}

impl OffsetWindow {
    pub const fn new(start: isize, end: isize) -> Self {
        Self { start, end }
    }

    pub fn indices(&self, origin: isize) -> impl Iterator<Item = isize> {
        (origin + self.start)..=(origin + self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnotationConfig {
    pub sequence_window: OffsetWindow,
    pub secondary_structure_window: OffsetWindow,
    pub dihedral_window: OffsetWindow,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            sequence_window: OffsetWindow::new(-2, 5),
            secondary_structure_window: OffsetWindow::new(-1, 4),
            dihedral_window: OffsetWindow::new(-1, 5),
        }
    }
}
