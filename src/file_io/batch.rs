//! In-memory result of a batch read: species → property → `(particles, configurations, dims)`.
use indexmap::IndexMap;
use ndarray::{Array3, Axis};

use crate::{
    database::StorePath, file_io::metadata::TrajectoryMetadata,
    trajstore_errors::TrajStoreError,
};

/// Arrays of one species, keyed by property name.
pub type PropertyArrays = IndexMap<String, Array3<f64>>;

/// A bounded run of consecutive configurations, demultiplexed per species and property.
///
/// Arrays have shape `(n_particles_of_species, n_configurations, n_dims_of_property)`.
/// The batch is ephemeral: it is handed to the caller, written to a store or consumed
/// directly, then dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurationBatch {
    n_configurations: usize,
    data: IndexMap<String, PropertyArrays>,
}

impl ConfigurationBatch {
    /// Zero-filled batch laid out after `metadata`.
    pub fn zeros(metadata: &TrajectoryMetadata, n_configurations: usize) -> Self {
        let data = metadata
            .species_list
            .iter()
            .map(|species| {
                let arrays = species
                    .properties
                    .iter()
                    .map(|p| {
                        (
                            p.name.clone(),
                            Array3::zeros(species.array_shape(p, n_configurations)),
                        )
                    })
                    .collect();
                (species.name.clone(), arrays)
            })
            .collect();

        Self {
            n_configurations,
            data,
        }
    }

    pub fn n_configurations(&self) -> usize {
        self.n_configurations
    }

    pub fn get(&self, species: &str, property: &str) -> Option<&Array3<f64>> {
        self.data.get(species)?.get(property)
    }

    pub fn get_mut(&mut self, species: &str, property: &str) -> Option<&mut Array3<f64>> {
        self.data.get_mut(species)?.get_mut(property)
    }

    pub fn species(&self, species: &str) -> Option<&PropertyArrays> {
        self.data.get(species)
    }

    pub(crate) fn species_mut(&mut self, species: &str) -> Option<&mut PropertyArrays> {
        self.data.get_mut(species)
    }

    /// Every array with its store path, species-major.
    pub fn iter(&self) -> impl Iterator<Item = (StorePath, &Array3<f64>)> {
        self.data.iter().flat_map(|(species, arrays)| {
            arrays
                .iter()
                .map(move |(property, arr)| (StorePath::new_unchecked(species, property), arr))
        })
    }

    /// Size of the batch payload in bytes.
    pub fn nbytes(&self) -> u64 {
        self.iter()
            .map(|(_, a)| (a.len() * std::mem::size_of::<f64>()) as u64)
            .sum()
    }

    /// Append the configurations of `other` after those of `self`.
    ///
    /// Return
    /// ----------
    /// * The joined batch, or:
    ///   - [`TrajStoreError::ArrayNotFound`] if `other` lacks an array of `self`,
    ///   - [`TrajStoreError::ShapeMismatch`] if two arrays differ in particle or dimension count.
    pub fn concatenate(mut self, other: &ConfigurationBatch) -> Result<Self, TrajStoreError> {
        for (species, arrays) in self.data.iter_mut() {
            for (property, arr) in arrays.iter_mut() {
                let path = StorePath::new_unchecked(species, property);
                let tail = other
                    .get(species, property)
                    .ok_or_else(|| TrajStoreError::ArrayNotFound(path.to_string()))?;
                let joined = ndarray::concatenate(Axis(1), &[arr.view(), tail.view()])
                    .map_err(|_| {
                        let (p, n, d) = arr.dim();
                        let (tp, tn, td) = tail.dim();
                        TrajStoreError::ShapeMismatch {
                            path: path.to_string(),
                            stored: [p, n, d],
                            requested: [tp, n + tn, td],
                        }
                    })?;
                *arr = joined;
            }
        }
        self.n_configurations += other.n_configurations;
        Ok(self)
    }
}
