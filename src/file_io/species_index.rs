//! # Species / property index
//!
//! Maps **raw file positions** onto the logical layout of a trajectory:
//!
//! * rows of a configuration block → `(species, particle id)` via [`SpeciesIndex`],
//! * columns of a data line → `(property, dimension)` via [`PropertyColumns`].
//!
//! Both maps are built once, from the header and the first configuration, and are then
//! frozen. The species map is assembled by a local [`SpeciesIndexBuilder`] so that no
//! partially-built index is ever visible to the batch reader.
//!
//! ## Row indices vs particle ids
//! -----------------
//! `line_idxs` are positions **within the (optionally id-sorted) block**, not particle ids.
//! The batch reader applies the same sorting to every block and then slices rows by
//! `line_idxs`, which keeps the layout independent of how ids are numbered.
//!
//! ## Stability contract
//! -----------------
//! Species membership is read from the first configuration only. Files where a particle
//! changes species over time are not supported; their later configurations would be
//! demultiplexed with the first configuration's mapping.
use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::{
    constants::{ParticleId, ID_COLUMN, PROPERTY_TABLE, SPECIES_COLUMNS},
    file_io::metadata::PropertyInfo,
    trajstore_errors::{ParseHeaderError, TrajStoreError},
};

/// Column indices of one property, in declared token order. Stress is the widest (6).
pub type ColumnIdxs = SmallVec<[usize; 6]>;

/// Particle membership of one species.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeciesEntry {
    /// Particle ids in row order.
    pub particle_ids: Vec<ParticleId>,
    /// Row positions within a (sorted) configuration block.
    pub line_idxs: Vec<usize>,
}

impl SpeciesEntry {
    pub fn n_particles(&self) -> usize {
        self.line_idxs.len()
    }
}

/// Frozen mapping species name → [`SpeciesEntry`], in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeciesIndex {
    entries: IndexMap<String, SpeciesEntry>,
}

impl SpeciesIndex {
    pub fn get(&self, species: &str) -> Option<&SpeciesEntry> {
        self.entries.get(species)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SpeciesEntry)> {
        self.entries.iter()
    }

    pub fn species_names(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of rows covered by the index.
    pub fn n_particles(&self) -> usize {
        self.entries.values().map(SpeciesEntry::n_particles).sum()
    }
}

/// Local accumulator for a [`SpeciesIndex`].
///
/// Rows must be pushed in block order (after sorting, if any); [`SpeciesIndexBuilder::build`]
/// freezes the result.
#[derive(Debug, Default)]
pub struct SpeciesIndexBuilder {
    entries: IndexMap<String, SpeciesEntry>,
    next_row: usize,
}

impl SpeciesIndexBuilder {
    pub fn with_capacity(n_species: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(n_species),
            next_row: 0,
        }
    }

    /// Record the next row of the block as belonging to `species`.
    pub fn push_row(&mut self, species: &str, particle_id: ParticleId) {
        let row = self.next_row;
        self.next_row += 1;

        if let Some(entry) = self.entries.get_mut(species) {
            entry.particle_ids.push(particle_id);
            entry.line_idxs.push(row);
        } else {
            self.entries.insert(
                species.to_string(),
                SpeciesEntry {
                    particle_ids: vec![particle_id],
                    line_idxs: vec![row],
                },
            );
        }
    }

    pub fn build(self) -> SpeciesIndex {
        SpeciesIndex {
            entries: self.entries,
        }
    }
}

/// Frozen mapping property name → column indices, in [`PROPERTY_TABLE`] order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyColumns {
    columns: IndexMap<String, ColumnIdxs>,
}

impl PropertyColumns {
    /// Resolve the properties present in a column-label list.
    ///
    /// A property is present only if **all** of its tokens appear among `labels`; labels
    /// that belong to no property (`id`, `type`, custom computes, ...) are ignored.
    ///
    /// Arguments
    /// -----------------
    /// * `labels` – Column labels as returned by
    ///   [`parse_column_labels`](crate::file_io::format_reader::parse_column_labels).
    ///
    /// Return
    /// ----------
    /// * The resolved columns; may be empty if no known property is present.
    pub fn from_labels(labels: &[String]) -> Self {
        let position = |token: &str| labels.iter().position(|l| l == token);

        let columns = PROPERTY_TABLE
            .iter()
            .filter_map(|(name, tokens)| {
                tokens
                    .iter()
                    .map(|t| position(t))
                    .collect::<Option<ColumnIdxs>>()
                    .map(|idxs| (name.to_string(), idxs))
            })
            .collect();

        Self { columns }
    }

    pub fn get(&self, property: &str) -> Option<&ColumnIdxs> {
        self.columns.get(property)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ColumnIdxs)> {
        self.columns.iter()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Largest column index referenced by any property.
    pub fn max_column(&self) -> Option<usize> {
        self.columns.values().flat_map(|c| c.iter().copied()).max()
    }

    /// Property schema shared by every species.
    pub fn property_infos(&self) -> Vec<PropertyInfo> {
        self.columns
            .iter()
            .map(|(name, idxs)| PropertyInfo {
                name: name.clone(),
                n_dims: idxs.len(),
            })
            .collect()
    }
}

/// Index of the `id` column.
pub fn id_column(labels: &[String]) -> Result<usize, TrajStoreError> {
    labels
        .iter()
        .position(|l| l == ID_COLUMN)
        .ok_or_else(|| ParseHeaderError::MissingIdColumn.into())
}

/// Index of the species-identifying column: `element` if present, otherwise `type`.
pub fn species_column(labels: &[String]) -> Result<usize, TrajStoreError> {
    SPECIES_COLUMNS
        .iter()
        .find_map(|candidate| labels.iter().position(|l| l == candidate))
        .ok_or(TrajStoreError::MissingSpeciesColumn)
}
