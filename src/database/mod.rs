//! # Array stores
//!
//! Persistent (or in-memory) storage of per-species, per-property time series, addressed by
//! a [`StorePath`] and shaped `(n_particles, n_configurations, n_dims)`.
//!
//! ## Semantics shared by every backend
//! -----------------
//! * Arrays only grow, and only along the configuration axis (axis 1).
//! * [`ArrayStore::allocate`] is idempotent: re-allocating the same shape is a no-op, a larger
//!   configuration count extends the array and keeps its content, anything else is a
//!   [`TrajStoreError::ShapeMismatch`].
//! * [`ArrayStore::write`] never grows an allocated array. Writing past the allocated length
//!   fails with [`TrajStoreError::WriteOutOfBounds`]. Writing to a path that was never
//!   allocated allocates exactly what the write needs.
//! * [`ArrayStore::read`] returns an owned copy and never clamps out-of-range slices.
//!
//! ## Backends
//! -----------------
//! * [`chunked_store::ChunkedStore`] – one directory per array, fixed-size binary chunks.
//! * [`memory_store::MemoryStore`] – process memory, for direct pipelines and tests.
pub mod chunked_store;
pub mod memory_store;

use std::{fmt, ops::Range, str::FromStr};

use indexmap::IndexMap;
use ndarray::{Array3, ArrayView3};
use serde::{Deserialize, Serialize};

use crate::{
    constants::{ArrayShape, PropertyName, SpeciesName, BYTES_PER_ELEMENT},
    trajstore_errors::TrajStoreError,
};

/// Key of a stored array: `species/property`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StorePath {
    pub species: SpeciesName,
    pub property: PropertyName,
}

impl StorePath {
    /// Build a path, rejecting components that cannot name a directory.
    pub fn new(species: &str, property: &str) -> Result<Self, TrajStoreError> {
        let path = Self::new_unchecked(species, property);
        path.validate()?;
        Ok(path)
    }

    /// Build a path without validation. Used where names come from an already parsed file.
    pub fn new_unchecked(species: &str, property: &str) -> Self {
        Self {
            species: species.to_string(),
            property: property.to_string(),
        }
    }

    /// Both components must be non-empty, must not contain a path separator, and must not
    /// be `.` or `..`.
    pub fn validate(&self) -> Result<(), TrajStoreError> {
        let valid = |c: &str| !c.is_empty() && c != "." && c != ".." && !c.contains(['/', '\\']);
        if valid(&self.species) && valid(&self.property) {
            Ok(())
        } else {
            Err(TrajStoreError::InvalidStorePath(self.to_string()))
        }
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.species, self.property)
    }
}

impl FromStr for StorePath {
    type Err = TrajStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (species, property) = s
            .split_once('/')
            .ok_or_else(|| TrajStoreError::InvalidStorePath(s.to_string()))?;
        Self::new(species, property)
    }
}

/// Sub-range selection on the three axes of a stored array.
///
/// `None` on an axis selects the whole axis.
///
/// # Example
///
/// ```rust
/// use trajstore::database::SliceSpec;
///
/// // Configurations 10..20 of every particle and dimension.
/// let slice = SliceSpec::full().configurations(10..20);
/// assert_eq!(slice.axes()[1], Some(10..20));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SliceSpec {
    axes: [Option<Range<usize>>; 3],
}

impl SliceSpec {
    pub fn full() -> Self {
        Self::default()
    }

    pub fn particles(mut self, range: Range<usize>) -> Self {
        self.axes[0] = Some(range);
        self
    }

    pub fn configurations(mut self, range: Range<usize>) -> Self {
        self.axes[1] = Some(range);
        self
    }

    pub fn dims(mut self, range: Range<usize>) -> Self {
        self.axes[2] = Some(range);
        self
    }

    pub fn axes(&self) -> &[Option<Range<usize>>; 3] {
        &self.axes
    }

    /// Concrete ranges against a stored `shape`.
    ///
    /// Return
    /// ----------
    /// * One range per axis, or [`TrajStoreError::SliceOutOfBounds`] for the first axis whose
    ///   range is reversed or ends past the axis length.
    pub fn resolve(
        &self,
        path: &StorePath,
        shape: ArrayShape,
    ) -> Result<[Range<usize>; 3], TrajStoreError> {
        let mut resolved = [0..shape[0], 0..shape[1], 0..shape[2]];
        for (axis, range) in self.axes.iter().enumerate() {
            let Some(range) = range else {
                continue;
            };
            if range.start > range.end || range.end > shape[axis] {
                return Err(TrajStoreError::SliceOutOfBounds {
                    path: path.to_string(),
                    axis,
                    range: range.clone(),
                    len: shape[axis],
                });
            }
            resolved[axis] = range.clone();
        }
        Ok(resolved)
    }
}

/// Storage of resizable 3-D `f64` arrays keyed by [`StorePath`].
///
/// Every method takes `&self`; implementations serialize access per path so that disjoint
/// paths can be written concurrently.
pub trait ArrayStore: Send + Sync {
    /// Whether an array has been allocated at `path`.
    fn exists(&self, path: &StorePath) -> bool;

    /// Create the array at `path`, or extend its configuration axis to `shape[1]`.
    ///
    /// Errors
    /// ----------
    /// * [`TrajStoreError::ShapeMismatch`] if the particle or dimension count differs from the
    ///   stored one, or if `shape[1]` is smaller than the stored configuration count.
    /// * [`TrajStoreError::InvalidStorePath`] if `path` cannot be stored.
    fn allocate(&self, path: &StorePath, shape: ArrayShape) -> Result<(), TrajStoreError>;

    /// Write `data` (shape `(p, n, d)`) at configurations `offset..offset + n`.
    ///
    /// Errors
    /// ----------
    /// * [`TrajStoreError::WriteOutOfBounds`] if `offset + n` exceeds the allocated length.
    /// * [`TrajStoreError::ShapeMismatch`] if `p` or `d` differ from the stored array.
    fn write(
        &self,
        path: &StorePath,
        data: ArrayView3<'_, f64>,
        configuration_offset: usize,
    ) -> Result<(), TrajStoreError>;

    /// Owned copy of the selected region.
    ///
    /// Errors
    /// ----------
    /// * [`TrajStoreError::ArrayNotFound`] if nothing is stored at `path`.
    /// * [`TrajStoreError::SliceOutOfBounds`] if the slice exceeds the stored shape.
    fn read(&self, path: &StorePath, slice: &SliceSpec) -> Result<Array3<f64>, TrajStoreError>;

    /// Allocated shape of the array at `path`.
    fn shape(&self, path: &StorePath) -> Option<ArrayShape>;

    /// Every stored path.
    fn paths(&self) -> Vec<StorePath>;

    /// Estimated stored bytes per path.
    fn memory_information(&self) -> IndexMap<StorePath, u64> {
        self.paths()
            .into_iter()
            .filter_map(|path| {
                let shape = self.shape(&path)?;
                Some((path, shape_bytes(shape)))
            })
            .collect()
    }

    /// Estimated stored bytes over all paths.
    fn total_bytes(&self) -> u64 {
        self.memory_information().values().sum()
    }
}

/// Bytes held by an array of `shape`.
#[inline]
pub fn shape_bytes(shape: ArrayShape) -> u64 {
    shape.iter().map(|&n| n as u64).product::<u64>() * BYTES_PER_ELEMENT
}

/// What an `allocate` call has to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Allocation {
    Create,
    Extend,
    Unchanged,
}

pub(crate) fn plan_allocation(
    path: &StorePath,
    stored: Option<ArrayShape>,
    requested: ArrayShape,
) -> Result<Allocation, TrajStoreError> {
    let Some(stored) = stored else {
        return Ok(Allocation::Create);
    };
    if stored[0] != requested[0] || stored[2] != requested[2] || requested[1] < stored[1] {
        return Err(TrajStoreError::ShapeMismatch {
            path: path.to_string(),
            stored,
            requested,
        });
    }
    if requested[1] == stored[1] {
        Ok(Allocation::Unchanged)
    } else {
        Ok(Allocation::Extend)
    }
}

/// Check a write of `data_dim` at `offset` against an allocated `stored` shape.
pub(crate) fn check_write(
    path: &StorePath,
    stored: ArrayShape,
    data_dim: (usize, usize, usize),
    offset: usize,
) -> Result<(), TrajStoreError> {
    let (p, n, d) = data_dim;
    let end = offset + n;
    if p != stored[0] || d != stored[2] {
        return Err(TrajStoreError::ShapeMismatch {
            path: path.to_string(),
            stored,
            requested: [p, end, d],
        });
    }
    if end > stored[1] {
        return Err(TrajStoreError::WriteOutOfBounds {
            path: path.to_string(),
            end,
            allocated: stored[1],
        });
    }
    Ok(())
}
