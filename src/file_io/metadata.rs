//! Description of a trajectory discovered at extraction time.
//!
//! These types are the **catalog** the rest of the pipeline is configured from: built once
//! by the metadata extractor, then treated as immutable. Species order is explicit (a `Vec`)
//! because it drives array layout and store path enumeration.
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::{constants::BYTES_PER_ELEMENT, database::StorePath};

/// A named physical quantity with a fixed dimensionality, e.g. `Velocities` (3 dims).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyInfo {
    pub name: String,
    pub n_dims: usize,
}

/// A species of particles sharing the file-global property schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesInfo {
    pub name: String,
    pub n_particles: usize,
    pub properties: Vec<PropertyInfo>,
}

impl SpeciesInfo {
    /// Shape of the stored array of `property` once `n_configurations` are written.
    pub fn array_shape(&self, property: &PropertyInfo, n_configurations: usize) -> [usize; 3] {
        [self.n_particles, n_configurations, property.n_dims]
    }
}

/// Metadata of a whole trajectory file.
///
/// Fields
/// -----------------
/// * `n_configurations` – Number of configurations (timesteps) in the file.
/// * `n_particles` – Number of particles per configuration, all species included.
/// * `species_list` – Species in order of first appearance in the (sorted) first configuration.
/// * `box_l` – Box edge lengths taken from the first header.
/// * `sample_step` – Timestep difference between the first two configurations
///   (`0.0` for single-configuration files).
///
/// Invariants
/// -----------------
/// * `species_list.iter().map(|s| s.n_particles).sum() == n_particles`.
/// * Every species carries the same `properties`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryMetadata {
    pub n_configurations: usize,
    pub n_particles: usize,
    pub species_list: Vec<SpeciesInfo>,
    pub box_l: Vector3<f64>,
    pub sample_step: f64,
}

impl TrajectoryMetadata {
    /// Look up a species by name.
    pub fn species(&self, name: &str) -> Option<&SpeciesInfo> {
        self.species_list.iter().find(|s| s.name == name)
    }

    /// Store paths of every `(species, property)` pair, species-major.
    pub fn store_paths(&self) -> impl Iterator<Item = (StorePath, &SpeciesInfo, &PropertyInfo)> {
        self.species_list.iter().flat_map(|species| {
            species.properties.iter().map(move |property| {
                (
                    StorePath::new_unchecked(&species.name, &property.name),
                    species,
                    property,
                )
            })
        })
    }

    /// Number of bytes one configuration occupies once demultiplexed into `f64` arrays.
    ///
    /// Callers use this to size batches against the memory they can spare.
    pub fn bytes_per_configuration(&self) -> u64 {
        self.species_list
            .iter()
            .map(|s| {
                let dims: usize = s.properties.iter().map(|p| p.n_dims).sum();
                (s.n_particles * dims) as u64 * BYTES_PER_ELEMENT
            })
            .sum()
    }
}
