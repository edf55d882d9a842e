//! Solvent-accessible surface area by the Shrake–Rupley method.
//!
//! Each atom is inflated to its van der Waals radius plus the probe radius and a
//! fixed set of points on that sphere is tested against the inflated spheres of
//! neighbouring atoms. The accessible area is the exposed fraction of the full
//! sphere area.

use crate::core::models::ids::AtomId;
use crate::core::models::system::MolecularSystem;
use kiddo::SquaredEuclidean;
use kiddo::float::kdtree::KdTree;
use nalgebra::Point3;
use std::f64::consts::PI;
use thiserror::Error;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Debug, Error, PartialEq)]
pub enum SasaError {
    #[error("Atom {0:?} is not part of the system")]
    UnknownAtom(AtomId),
    #[error("Invalid surface parameter: {0}")]
    InvalidParameter(String),
}

/// Computes per-atom accessible areas for arbitrary atom views of a system.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceComputer {
    /// Probe radius in Å.
    pub probe_radius: f64,
    /// Number of sample points on each atom sphere.
    pub sphere_points: usize,
    /// Whether hydrogens take part as occluders and receive an area.
    pub include_hydrogens: bool,
}

impl Default for SurfaceComputer {
    fn default() -> Self {
        Self {
            probe_radius: 1.4,
            sphere_points: 480,
            include_hydrogens: false,
        }
    }
}

struct SphereAtom {
    center: Point3<f64>,
    radius: f64,
}

// Wide leaves keep synthetic inputs with many atoms on one plane from forcing
// splits on a constant axis.
type SphereTree = KdTree<f64, u64, 3, 256, u32>;

fn build_tree(spheres: &[SphereAtom]) -> SphereTree {
    let mut tree = SphereTree::new();
    for (idx, sphere) in spheres.iter().enumerate() {
        tree.add(&coords(&sphere.center), idx as u64);
    }
    tree
}

fn coords(p: &Point3<f64>) -> [f64; 3] {
    [p.x, p.y, p.z]
}

fn fibonacci_sphere(samples: usize) -> Vec<[f64; 3]> {
    let golden_angle = PI * (3.0 - 5.0_f64.sqrt());
    let denominator = samples.saturating_sub(1).max(1) as f64;

    (0..samples)
        .map(|i| {
            let y = 1.0 - (2.0 * i as f64) / denominator;
            let radius = (1.0 - y * y).max(0.0).sqrt();
            let theta = golden_angle * i as f64;
            [theta.cos() * radius, y, theta.sin() * radius]
        })
        .collect()
}

impl SurfaceComputer {
    pub fn new(probe_radius: f64, sphere_points: usize) -> Self {
        Self {
            probe_radius,
            sphere_points,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), SasaError> {
        if !(self.probe_radius.is_finite() && self.probe_radius >= 0.0) {
            return Err(SasaError::InvalidParameter(format!(
                "probe radius must be non-negative, got {}",
                self.probe_radius
            )));
        }
        if self.sphere_points == 0 {
            return Err(SasaError::InvalidParameter(
                "sphere points must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Computes the accessible area of every atom in `view`, considering only the
    /// atoms of `view` as the environment.
    ///
    /// # Arguments
    ///
    /// * `system` - The system holding the atoms.
    /// * `view` - The atoms forming the molecule whose surface is measured.
    ///
    /// # Return
    ///
    /// Areas in Å², index-aligned with `view`. Hydrogens get 0.0 unless
    /// `include_hydrogens` is set.
    ///
    /// # Errors
    ///
    /// Returns [`SasaError::UnknownAtom`] if an id is not present in `system`, or
    /// [`SasaError::InvalidParameter`] for an invalid configuration.
    pub fn atom_areas(
        &self,
        system: &MolecularSystem,
        view: &[AtomId],
    ) -> Result<Vec<f64>, SasaError> {
        self.validate()?;

        let mut spheres = Vec::with_capacity(view.len());
        let mut sphere_of_view: Vec<Option<usize>> = Vec::with_capacity(view.len());
        for &atom_id in view {
            let atom = system.atom(atom_id).ok_or(SasaError::UnknownAtom(atom_id))?;
            if atom.is_hydrogen() && !self.include_hydrogens {
                sphere_of_view.push(None);
                continue;
            }
            sphere_of_view.push(Some(spheres.len()));
            spheres.push(SphereAtom {
                center: atom.position,
                radius: atom.element.vdw_radius() + self.probe_radius,
            });
        }

        if spheres.is_empty() {
            return Ok(vec![0.0; view.len()]);
        }

        let max_radius = spheres.iter().map(|s| s.radius).fold(0.0_f64, f64::max);
        let tree = build_tree(&spheres);
        let points = fibonacci_sphere(self.sphere_points);

        let indices: Vec<usize> = (0..spheres.len()).collect();

        let iterator = indices.iter();

        #[cfg(feature = "parallel")]
        let iterator = indices.par_iter();

        let sphere_areas: Vec<f64> = iterator
            .map(|&idx| exposed_area(idx, &spheres, &tree, max_radius, &points))
            .collect();

        Ok(sphere_of_view
            .into_iter()
            .map(|slot| slot.map_or(0.0, |i| sphere_areas[i]))
            .collect())
    }
}

fn exposed_area(
    idx: usize,
    spheres: &[SphereAtom],
    tree: &SphereTree,
    max_radius: f64,
    points: &[[f64; 3]],
) -> f64 {
    let this = &spheres[idx];
    let search = this.radius + max_radius;
    let neighbours: Vec<&SphereAtom> = tree
        .within_unsorted::<SquaredEuclidean>(&coords(&this.center), search * search)
        .into_iter()
        .map(|found| found.item as usize)
        .filter(|&n| n != idx)
        .map(|n| &spheres[n])
        .filter(|other| {
            let reach = this.radius + other.radius;
            (other.center - this.center).norm_squared() < reach * reach
        })
        .collect();

    let exposed = points
        .iter()
        .filter(|p| {
            let sample = Point3::new(
                this.center.x + p[0] * this.radius,
                this.center.y + p[1] * this.radius,
                this.center.z + p[2] * this.radius,
            );
            !neighbours
                .iter()
                .any(|other| (sample - other.center).norm_squared() < other.radius * other.radius)
        })
        .count();

    4.0 * PI * this.radius * this.radius * exposed as f64 / points.len() as f64
}
