use std::ops::Range;

use thiserror::Error;

use crate::constants::ArrayShape;

/// Header-level lexing errors for LAMMPS dump configurations.
///
/// Variants
/// -----------------
/// * `TooFewHeaderLines` – The file ended before a full header block could be read.
/// * `InvalidParticleCount` – The particle-count line is not a positive integer; payload carries the line.
/// * `InvalidBoxBounds` – A box line is not two floats `lower upper`; payload carries the line.
/// * `InvalidTimestep` – The timestep line is not a number; payload carries the line.
/// * `MissingColumnLine` – The column line does not start with `ITEM: ATOMS`.
/// * `MissingIdColumn` – The column line has no `id` label.
#[derive(Error, Debug, PartialEq)]
pub enum ParseHeaderError {
    #[error("Expected {expected} header lines, found {found}")]
    TooFewHeaderLines { expected: usize, found: usize },
    #[error("Invalid particle count: {0}")]
    InvalidParticleCount(String),
    #[error("Invalid box bounds: {0}")]
    InvalidBoxBounds(String),
    #[error("Invalid timestep: {0}")]
    InvalidTimestep(String),
    #[error("Invalid column line: {0}")]
    MissingColumnLine(String),
    #[error("The column line has no 'id' label")]
    MissingIdColumn,
}

#[derive(Error, Debug)]
pub enum TrajStoreError {
    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Trajectory file is empty: {0}")]
    EmptyFile(String),

    #[error("Error during the header parsing: {0}")]
    HeaderParse(#[from] ParseHeaderError),

    #[error("Insufficient species or type identification available (no 'element' or 'type' column)")]
    MissingSpeciesColumn,

    #[error(
        "{n_lines} lines are not a whole number of configurations of {lines_per_configuration} lines"
    )]
    NonIntegralConfigurationCount {
        n_lines: usize,
        lines_per_configuration: usize,
    },

    #[error("Malformed record in configuration {configuration}, row {row}: {reason}")]
    MalformedRecord {
        configuration: usize,
        row: usize,
        reason: String,
    },

    #[error("Configuration {0} does not start with a timestep header")]
    MisalignedConfiguration(usize),

    #[error("Requested {requested} configurations but only {remaining} remain")]
    BatchOutOfRange { requested: usize, remaining: usize },

    #[error("Invalid store path: {0}")]
    InvalidStorePath(String),

    #[error("No array stored at {0}")]
    ArrayNotFound(String),

    #[error("Slice {range:?} on axis {axis} of {path} exceeds length {len}")]
    SliceOutOfBounds {
        path: String,
        axis: usize,
        range: Range<usize>,
        len: usize,
    },

    #[error("Write of configurations up to {end} on {path} exceeds allocated length {allocated}")]
    WriteOutOfBounds {
        path: String,
        end: usize,
        allocated: usize,
    },

    #[error("Shape mismatch on {path}: stored {stored:?}, requested {requested:?}")]
    ShapeMismatch {
        path: String,
        stored: ArrayShape,
        requested: ArrayShape,
    },

    #[error("Corrupt chunk in {path}: {reason}")]
    CorruptChunk { path: String, reason: String },

    #[error("Manifest (de)serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Lock poisoned on {0}")]
    PoisonedLock(String),
}

impl PartialEq for TrajStoreError {
    fn eq(&self, other: &Self) -> bool {
        use TrajStoreError::*;
        match (self, other) {
            // Not comparable: equal when the variant matches
            (IoError(_), IoError(_)) => true,
            (SerdeError(_), SerdeError(_)) => true,

            (EmptyFile(a), EmptyFile(b)) => a == b,
            (HeaderParse(a), HeaderParse(b)) => a == b,
            (MissingSpeciesColumn, MissingSpeciesColumn) => true,
            (
                NonIntegralConfigurationCount {
                    n_lines: a,
                    lines_per_configuration: b,
                },
                NonIntegralConfigurationCount {
                    n_lines: c,
                    lines_per_configuration: d,
                },
            ) => a == c && b == d,
            (
                MalformedRecord {
                    configuration: a,
                    row: b,
                    reason: c,
                },
                MalformedRecord {
                    configuration: d,
                    row: e,
                    reason: f,
                },
            ) => a == d && b == e && c == f,
            (MisalignedConfiguration(a), MisalignedConfiguration(b)) => a == b,
            (
                BatchOutOfRange {
                    requested: a,
                    remaining: b,
                },
                BatchOutOfRange {
                    requested: c,
                    remaining: d,
                },
            ) => a == c && b == d,
            (InvalidStorePath(a), InvalidStorePath(b)) => a == b,
            (ArrayNotFound(a), ArrayNotFound(b)) => a == b,
            (
                SliceOutOfBounds {
                    path: a,
                    axis: b,
                    range: c,
                    len: d,
                },
                SliceOutOfBounds {
                    path: e,
                    axis: f,
                    range: g,
                    len: h,
                },
            ) => a == e && b == f && c == g && d == h,
            (
                WriteOutOfBounds {
                    path: a,
                    end: b,
                    allocated: c,
                },
                WriteOutOfBounds {
                    path: d,
                    end: e,
                    allocated: f,
                },
            ) => a == d && b == e && c == f,
            (
                ShapeMismatch {
                    path: a,
                    stored: b,
                    requested: c,
                },
                ShapeMismatch {
                    path: d,
                    stored: e,
                    requested: f,
                },
            ) => a == d && b == e && c == f,
            (CorruptChunk { path: a, reason: b }, CorruptChunk { path: c, reason: d }) => {
                a == c && b == d
            }
            (InvalidParameter(a), InvalidParameter(b)) => a == b,
            (PoisonedLock(a), PoisonedLock(b)) => a == b,

            _ => false,
        }
    }
}

#[cfg(test)]
mod trajstore_errors_test {
    use super::*;

    #[test]
    fn io_errors_compare_by_variant() {
        let a = TrajStoreError::from(std::io::Error::other("disk"));
        let b = TrajStoreError::from(std::io::Error::other("network"));
        assert_eq!(a, b);
    }

    #[test]
    fn header_errors_convert_and_display() {
        let err: TrajStoreError = ParseHeaderError::InvalidParticleCount("abc".into()).into();
        assert_eq!(
            err,
            TrajStoreError::HeaderParse(ParseHeaderError::InvalidParticleCount("abc".into()))
        );
        assert_eq!(
            err.to_string(),
            "Error during the header parsing: Invalid particle count: abc"
        );
    }

    #[test]
    fn payload_differences_are_not_equal() {
        let a = TrajStoreError::BatchOutOfRange {
            requested: 3,
            remaining: 2,
        };
        let b = TrajStoreError::BatchOutOfRange {
            requested: 4,
            remaining: 2,
        };
        assert_ne!(a, b);
        assert_ne!(a, TrajStoreError::MissingSpeciesColumn);
    }
}
