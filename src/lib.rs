//! # trajstore
//!
//! Bounded-memory ingestion of particle trajectories (LAMMPS text dumps) into a store of
//! per-species, per-property `f64` time series.
//!
//! * [`file_io`] – metadata extraction and batched, cursor-driven reading of dumps.
//! * [`database`] – the [`ArrayStore`] contract with a chunked filesystem backend and an
//!   in-memory backend.
//! * [`ingest`] – the loop tying both together.
//!
//! ```rust,no_run
//! use camino::Utf8Path;
//! use trajstore::{
//!     ingest_trajectory, ArrayStore, ChunkedStore, IngestParams, LammpsParams,
//!     LammpsTrajectoryFile, SliceSpec, StorePath,
//! };
//!
//! let mut dump = LammpsTrajectoryFile::open(Utf8Path::new("nacl.lammpstrj"), LammpsParams::default())?;
//! let store = ChunkedStore::open(Utf8Path::new("nacl_store"))?;
//! ingest_trajectory(&mut dump, &store, &IngestParams::default())?;
//!
//! let positions = store.read(
//!     &StorePath::new("Na", "Positions")?,
//!     &SliceSpec::full().configurations(0..10),
//! )?;
//! # let _ = positions;
//! # Ok::<(), trajstore::TrajStoreError>(())
//! ```
pub mod constants;
pub mod database;
pub mod file_io;
pub mod ingest;
#[cfg(feature = "progress")]
pub mod progress_bar;
pub mod trajstore_errors;

pub use database::{
    chunked_store::ChunkedStore, memory_store::MemoryStore, ArrayStore, SliceSpec, StorePath,
};
pub use file_io::{
    batch::ConfigurationBatch,
    lammps_reader::{extract_layout, LammpsTrajectoryFile, TrajectoryLayout},
    metadata::{PropertyInfo, SpeciesInfo, TrajectoryMetadata},
    params::LammpsParams,
    FileProcessor,
};
pub use ingest::{ingest_trajectory, IngestParams, IngestReport};
pub use trajstore_errors::TrajStoreError;
