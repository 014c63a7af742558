use std::fmt;

use crate::{constants::LAMMPS_HEADER_LINES, trajstore_errors::TrajStoreError};

/// Configuration of the LAMMPS dump reader.
///
/// Fields
/// -----------------
/// * `n_header_lines` – Lines preceding each configuration block. LAMMPS writes 9; the
///   value is configurable for dumps carrying extra `ITEM:` lines after the column line.
/// * `trajectory_is_sorted_by_ids` – When `false`, every configuration block is stable-sorted
///   by particle id before rows are assigned to species. Sorting costs `O(n log n)` per block.
///
/// Defaults
/// -----------------
/// * `n_header_lines`: 9
/// * `trajectory_is_sorted_by_ids`: `true`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LammpsParams {
    pub n_header_lines: usize,
    pub trajectory_is_sorted_by_ids: bool,
}

impl LammpsParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a [`LammpsParamsBuilder`] initialized with the defaults.
    ///
    /// # Example
    ///
    /// ```rust
    /// use trajstore::file_io::params::LammpsParams;
    ///
    /// let params = LammpsParams::builder()
    ///     .trajectory_is_sorted_by_ids(false)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(params.n_header_lines, 9);
    /// ```
    pub fn builder() -> LammpsParamsBuilder {
        LammpsParamsBuilder::new()
    }

    /// Lines occupied by one configuration of `n_particles` particles.
    #[inline]
    pub fn lines_per_configuration(&self, n_particles: usize) -> usize {
        self.n_header_lines + n_particles
    }
}

impl Default for LammpsParams {
    fn default() -> Self {
        Self {
            n_header_lines: LAMMPS_HEADER_LINES,
            trajectory_is_sorted_by_ids: true,
        }
    }
}

impl fmt::Display for LammpsParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LammpsParams(header_lines={}, sorted_by_ids={})",
            self.n_header_lines, self.trajectory_is_sorted_by_ids
        )
    }
}

/// Builder for [`LammpsParams`], with validation.
#[derive(Debug, Clone, Default)]
pub struct LammpsParamsBuilder {
    params: LammpsParams,
}

impl LammpsParamsBuilder {
    pub fn new() -> Self {
        Self {
            params: LammpsParams::default(),
        }
    }

    pub fn n_header_lines(mut self, v: usize) -> Self {
        self.params.n_header_lines = v;
        self
    }

    pub fn trajectory_is_sorted_by_ids(mut self, v: bool) -> Self {
        self.params.trajectory_is_sorted_by_ids = v;
        self
    }

    /// Validate and return the parameters.
    ///
    /// Returns
    /// -----------------
    /// * `Err(TrajStoreError::InvalidParameter)` if `n_header_lines < 9`: the particle
    ///   count, box and column lines sit at fixed positions within the first 9 lines.
    pub fn build(self) -> Result<LammpsParams, TrajStoreError> {
        if self.params.n_header_lines < LAMMPS_HEADER_LINES {
            return Err(TrajStoreError::InvalidParameter(format!(
                "n_header_lines must be >= {LAMMPS_HEADER_LINES}"
            )));
        }
        Ok(self.params)
    }
}
