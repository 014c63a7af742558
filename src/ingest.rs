//! # Trajectory ingestion
//!
//! Drives a [`FileProcessor`] into an [`ArrayStore`]: metadata once, then fixed-size batches
//! written at consecutive configuration offsets.
//!
//! ## Appending runs
//! -----------------
//! Arrays that already exist are extended, not overwritten: the new configurations are
//! written after the stored ones. Ingesting the dumps of a restarted simulation one after the
//! other therefore yields one continuous time series per `(species, property)`. Every array
//! touched by one ingestion must hold the same number of configurations beforehand.
//!
//! ## Batch sizing
//! -----------------
//! Either a fixed number of configurations per batch, or a memory budget from which the batch
//! size is derived using [`TrajectoryMetadata::bytes_per_configuration`].
//!
//! ## Example
//! -----------------
//! ```rust,no_run
//! use camino::Utf8Path;
//! use trajstore::{
//!     database::chunked_store::ChunkedStore,
//!     file_io::{lammps_reader::LammpsTrajectoryFile, params::LammpsParams},
//!     ingest::{ingest_trajectory, IngestParams},
//! };
//!
//! let store = ChunkedStore::open(Utf8Path::new("nacl_store"))?;
//! let params = IngestParams::builder().memory_budget_bytes(512 << 20).build()?;
//! for dump in ["run_1.lammpstrj", "run_2.lammpstrj"] {
//!     let mut file = LammpsTrajectoryFile::open(Utf8Path::new(dump), LammpsParams::default())?;
//!     let report = ingest_trajectory(&mut file, &store, &params)?;
//!     println!("{report}");
//! }
//! # Ok::<(), trajstore::trajstore_errors::TrajStoreError>(())
//! ```
use std::fmt;

use log::{debug, info};

#[cfg(feature = "progress")]
use crate::progress_bar::{fmt_dur, IterTimer};
#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    constants::DEFAULT_BATCH_SIZE,
    database::{ArrayStore, StorePath},
    file_io::{metadata::TrajectoryMetadata, FileProcessor},
    trajstore_errors::TrajStoreError,
};

/// How many configurations are pulled from the file per batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchSizing {
    /// Exactly this many configurations (the last batch may be shorter).
    Fixed(usize),
    /// As many configurations as fit in this many bytes, at least one.
    MemoryBudget(u64),
}

/// Configuration of [`ingest_trajectory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestParams {
    pub sizing: BatchSizing,
}

impl Default for IngestParams {
    fn default() -> Self {
        Self {
            sizing: BatchSizing::Fixed(DEFAULT_BATCH_SIZE),
        }
    }
}

impl IngestParams {
    pub fn builder() -> IngestParamsBuilder {
        IngestParamsBuilder::new()
    }

    /// Batch size to use for a file described by `metadata`.
    pub fn batch_size(&self, metadata: &TrajectoryMetadata) -> usize {
        match self.sizing {
            BatchSizing::Fixed(n) => n,
            BatchSizing::MemoryBudget(bytes) => {
                let per_configuration = metadata.bytes_per_configuration().max(1);
                ((bytes / per_configuration) as usize).max(1)
            }
        }
    }
}

/// Builder for [`IngestParams`]. The last sizing call wins.
#[derive(Debug, Clone, Default)]
pub struct IngestParamsBuilder {
    params: IngestParams,
}

impl IngestParamsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batch_size(mut self, n_configs: usize) -> Self {
        self.params.sizing = BatchSizing::Fixed(n_configs);
        self
    }

    pub fn memory_budget_bytes(mut self, bytes: u64) -> Self {
        self.params.sizing = BatchSizing::MemoryBudget(bytes);
        self
    }

    pub fn build(self) -> Result<IngestParams, TrajStoreError> {
        match self.params.sizing {
            BatchSizing::Fixed(0) => Err(TrajStoreError::InvalidParameter(
                "batch_size must be > 0".into(),
            )),
            BatchSizing::MemoryBudget(0) => Err(TrajStoreError::InvalidParameter(
                "memory_budget_bytes must be > 0".into(),
            )),
            _ => Ok(self.params),
        }
    }
}

/// Outcome of one [`ingest_trajectory`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    pub metadata: TrajectoryMetadata,
    /// Stored configuration count before this ingestion.
    pub configuration_offset: usize,
    pub configurations_written: usize,
    pub n_batches: usize,
    pub paths: Vec<StorePath>,
    /// Store size after ingestion, all paths included.
    pub stored_bytes: u64,
}

impl fmt::Display for IngestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} configurations in {} batches at offset {} over {} arrays ({} bytes stored)",
            self.configurations_written,
            self.n_batches,
            self.configuration_offset,
            self.paths.len(),
            self.stored_bytes
        )
    }
}

/// Stored configuration count shared by every array of `metadata`.
fn append_offset<S: ArrayStore + ?Sized>(
    store: &S,
    metadata: &TrajectoryMetadata,
) -> Result<usize, TrajStoreError> {
    let mut offset = None;
    for (path, species, property) in metadata.store_paths() {
        let stored = store.shape(&path).unwrap_or([species.n_particles, 0, property.n_dims]);
        match offset {
            None => offset = Some(stored[1]),
            Some(expected) if expected != stored[1] => {
                return Err(TrajStoreError::ShapeMismatch {
                    path: path.to_string(),
                    stored,
                    requested: [species.n_particles, expected, property.n_dims],
                });
            }
            Some(_) => {}
        }
    }
    Ok(offset.unwrap_or(0))
}

/// Read every configuration of `processor` and append it to `store`.
///
/// Arrays grow batch by batch, so after a failure every stored length still matches the
/// configurations actually written and a later ingestion appends right after them.
///
/// Arguments
/// -----------------
/// * `processor` – Source trajectory.
/// * `store` – Destination; arrays are created or extended as needed.
/// * `params` – Batch sizing.
///
/// Return
/// ----------
/// * An [`IngestReport`], or the first error met. Batches written before the error stay in
///   the store.
///
/// Errors
/// ----------
/// * [`TrajStoreError::BatchOutOfRange`] if `processor` was already advanced. Nothing is
///   written in that case.
/// * [`TrajStoreError::ShapeMismatch`] if existing arrays disagree on their configuration count
///   or on particle and dimension counts.
/// * Any error of the processor or the store.
pub fn ingest_trajectory<P, S>(
    processor: &mut P,
    store: &S,
    params: &IngestParams,
) -> Result<IngestReport, TrajStoreError>
where
    P: FileProcessor + ?Sized,
    S: ArrayStore + ?Sized,
{
    let metadata = processor.get_metadata()?;
    let n_total = metadata.n_configurations;
    let remaining = processor.remaining_configurations();
    if remaining != n_total {
        return Err(TrajStoreError::BatchOutOfRange {
            requested: n_total,
            remaining,
        });
    }
    let offset = append_offset(store, &metadata)?;
    let batch_size = params.batch_size(&metadata);

    info!(
        "Ingesting {} configurations at offset {} in batches of {}",
        n_total, offset, batch_size
    );

    let shapes: Vec<_> = metadata
        .store_paths()
        .map(|(path, species, property)| (path, species.array_shape(property, 0)))
        .collect();

    #[cfg(feature = "progress")]
    let (pb, mut it_timer) = {
        let pb = ProgressBar::new(n_total as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "{bar:40.cyan/blue} {pos}/{len} configurations | {per_sec} | ETA {eta_precise} | {msg}",
        ) {
            pb.set_style(style);
        }
        (pb, IterTimer::new(0.2))
    };

    let mut done = 0;
    let mut n_batches = 0;
    while done < n_total {
        let n_configs = batch_size.min(n_total - done);
        let batch = processor.get_next_n_configurations(n_configs)?;
        let end = offset + done + n_configs;
        for (path, [p, _, d]) in &shapes {
            store.allocate(path, [*p, end, *d])?;
        }
        for (path, arr) in batch.iter() {
            store.write(&path, arr.view(), offset + done)?;
        }
        done += n_configs;
        n_batches += 1;
        debug!("Wrote configurations {}..{}", offset + done - n_configs, offset + done);

        #[cfg(feature = "progress")]
        {
            let last = it_timer.tick();
            pb.set_message(format!(
                "last: {}, avg: {}",
                fmt_dur(last),
                fmt_dur(it_timer.avg())
            ));
            pb.inc(n_configs as u64);
        }
    }

    #[cfg(feature = "progress")]
    pb.finish_and_clear();

    let report = IngestReport {
        metadata,
        configuration_offset: offset,
        configurations_written: done,
        n_batches,
        paths: shapes.into_iter().map(|(path, _)| path).collect(),
        stored_bytes: store.total_bytes(),
    };
    info!("Ingestion finished: {report}");
    Ok(report)
}
