//! # Trajectory file ingestion
//!
//! Readers that turn a particle trajectory file into a [`TrajectoryMetadata`] catalog and
//! a stream of [`ConfigurationBatch`]es.
//!
//! ## Modules
//! -----------------
//! * [`format_reader`] – Header lexing and raw line I/O.
//! * [`species_index`] – Row → species and column → property maps.
//! * [`cursor`] – Read cursor and byte offsets of configuration starts.
//! * [`metadata`] – Trajectory, species and property descriptions.
//! * [`batch`] – Demultiplexed batch of configurations.
//! * [`params`] – Reader configuration.
//! * [`lammps_reader`] – The LAMMPS dump implementation of [`FileProcessor`].
pub mod batch;
pub mod cursor;
pub mod format_reader;
pub mod lammps_reader;
pub mod metadata;
pub mod params;
pub mod species_index;

use crate::{
    file_io::{batch::ConfigurationBatch, metadata::TrajectoryMetadata},
    trajstore_errors::TrajStoreError,
};

/// A trajectory format that can be ingested into an array store.
///
/// Implementors own their read cursor. A failed call must leave it where it was so the
/// caller can retry the same batch.
pub trait FileProcessor {
    /// Metadata of the whole file.
    fn get_metadata(&mut self) -> Result<TrajectoryMetadata, TrajStoreError>;

    /// Read the next `n_configs` configurations and advance the cursor by `n_configs`.
    ///
    /// Return
    /// ----------
    /// * The batch, or [`TrajStoreError::BatchOutOfRange`] if fewer than `n_configs`
    ///   configurations remain.
    fn get_next_n_configurations(
        &mut self,
        n_configs: usize,
    ) -> Result<ConfigurationBatch, TrajStoreError>;

    /// Configurations not yet consumed by the cursor.
    fn remaining_configurations(&self) -> usize;
}
