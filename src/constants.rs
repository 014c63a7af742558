//! # Constants and type definitions for trajstore
//!
//! This module centralizes the **format constants** of the LAMMPS dump layout, the
//! **property name table** used to map header tokens onto physical quantities, and the
//! **type aliases** shared by the reader and the store.
//!
//! ## Overview
//!
//! - Header geometry of a LAMMPS dump configuration (9 lines, fixed positions)
//! - Numerical tolerance used when validating the configuration count
//! - Canonical property names and their column tokens
//! - Core type aliases used across the crate
//!
//! The property table is part of the on-disk contract: stored projects are keyed by these
//! names, so entries must not be renamed or reordered.

// -------------------------------------------------------------------------------------------------
// LAMMPS dump header layout
// -------------------------------------------------------------------------------------------------

/// Number of header lines preceding every configuration block in a LAMMPS dump.
pub const LAMMPS_HEADER_LINES: usize = 9;

/// Header line (0-based) holding the timestep value.
pub const TIMESTEP_LINE: usize = 1;

/// Header line (0-based) holding the number of particles.
pub const N_PARTICLES_LINE: usize = 3;

/// Header lines (0-based) holding the `lower upper` box bounds, one per axis.
pub const BOX_BOUNDS_LINES: [usize; 3] = [5, 6, 7];

/// Header line (0-based) listing the column labels.
pub const COLUMNS_LINE: usize = 8;

/// Leading tokens of the column line (`ITEM: ATOMS`) that are not column labels.
pub const N_IGNORED_COLUMN_TOKENS: usize = 2;

/// Marker opening every configuration header.
pub const TIMESTEP_MARKER: &str = "ITEM: TIMESTEP";

/// Column carrying the particle identifier.
pub const ID_COLUMN: &str = "id";

/// Columns that identify the species of a particle, by order of preference.
pub const SPECIES_COLUMNS: [&str; 2] = ["element", "type"];

/// Maximum deviation between the line ratio and its rounded value before a file is
/// declared structurally corrupt.
pub const CONFIGURATION_COUNT_TOLERANCE: f64 = 1e-10;

// -------------------------------------------------------------------------------------------------
// Property name table
// -------------------------------------------------------------------------------------------------

/// Canonical property names and the header tokens that make them up.
///
/// A property is present in a file only when **all** of its tokens appear in the column
/// line. Column indices are resolved in the order of the tokens listed here, not in the
/// order of the header.
pub const PROPERTY_TABLE: &[(&str, &[&str])] = &[
    ("Positions", &["x", "y", "z"]),
    ("Scaled_Positions", &["xs", "ys", "zs"]),
    ("Unwrapped_Positions", &["xu", "yu", "zu"]),
    ("Scaled_Unwrapped_Positions", &["xsu", "ysu", "zsu"]),
    ("Velocities", &["vx", "vy", "vz"]),
    ("Forces", &["fx", "fy", "fz"]),
    ("Box_Images", &["ix", "iy", "iz"]),
    ("Dipole_Orientation_Magnitude", &["mux", "muy", "muz"]),
    ("Angular_Velocity_Spherical", &["omegax", "omegay", "omegaz"]),
    (
        "Angular_Velocity_Non_Spherical",
        &["angmomx", "angmomy", "angmomz"],
    ),
    ("Torque", &["tqx", "tqy", "tqz"]),
    ("Charge", &["q"]),
    ("KE", &["c_KE"]),
    ("PE", &["c_PE"]),
    (
        "Stress",
        &[
            "c_Stress[1]",
            "c_Stress[2]",
            "c_Stress[3]",
            "c_Stress[4]",
            "c_Stress[5]",
            "c_Stress[6]",
        ],
    ),
];

// -------------------------------------------------------------------------------------------------
// Storage
// -------------------------------------------------------------------------------------------------

/// Size in bytes of one stored element (`f64`).
pub const BYTES_PER_ELEMENT: u64 = std::mem::size_of::<f64>() as u64;

/// Default number of configurations held by one chunk file of a [`ChunkedStore`](crate::database::chunked_store::ChunkedStore).
pub const DEFAULT_CHUNK_CONFIGURATIONS: usize = 64;

/// Default number of configurations pulled per batch during ingestion.
pub const DEFAULT_BATCH_SIZE: usize = 100;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Particle identifier as written in the `id` column.
pub type ParticleId = u64;

/// Name of a species (element symbol or LAMMPS type).
pub type SpeciesName = String;

/// Canonical property name (a key of [`PROPERTY_TABLE`]).
pub type PropertyName = String;

/// Shape of a stored array: `(n_particles, n_configurations, n_dims)`.
pub type ArrayShape = [usize; 3];

