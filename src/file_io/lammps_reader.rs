//! # LAMMPS dump reader
//!
//! Metadata extraction and batched, cursor-driven reading of LAMMPS text dumps.
//!
//! ## Overview
//! -----------------
//! Opening a dump runs [`extract_layout`] once. It reads the first header, scans the file a
//! single time to count lines and record where every configuration starts, then reads the
//! first configuration block to learn species membership. The result is a frozen
//! [`TrajectoryLayout`] which every later batch read is driven by.
//!
//! Batches are read with [`LammpsTrajectoryFile::get_next_n_configurations`]
//! (cursor-driven) or [`LammpsTrajectoryFile::read_configurations`] (explicit position).
//! Each block is checked to start on a `ITEM: TIMESTEP` line, its rows are re-sorted by id
//! when the file is not declared sorted, then scattered into per-species arrays.
//!
//! ## Example
//! -----------------
//! ```rust,no_run
//! use camino::Utf8Path;
//! use trajstore::file_io::{lammps_reader::LammpsTrajectoryFile, params::LammpsParams, FileProcessor};
//!
//! let mut dump = LammpsTrajectoryFile::open(Utf8Path::new("nacl.lammpstrj"), LammpsParams::default())?;
//! let metadata = dump.get_metadata()?;
//! while dump.remaining_configurations() > 0 {
//!     let n = dump.remaining_configurations().min(100);
//!     let batch = dump.get_next_n_configurations(n)?;
//!     println!("{} configurations, {} bytes", batch.n_configurations(), batch.nbytes());
//! }
//! # let _ = metadata;
//! # Ok::<(), trajstore::trajstore_errors::TrajStoreError>(())
//! ```
use std::{
    fs::File,
    io::{BufRead, BufReader, Seek, SeekFrom},
};

use camino::Utf8Path;
use itertools::Itertools;
use log::{debug, info, warn};
use ndarray::Array2;

use crate::{
    constants::{ParticleId, CONFIGURATION_COUNT_TOLERANCE, TIMESTEP_MARKER},
    file_io::{
        batch::ConfigurationBatch,
        cursor::{check_range, ConfigurationOffsets, ReadCursor},
        format_reader::{read_n_lines_at, read_trimmed_line, skip_lines, split_record, HeaderBlock},
        metadata::{SpeciesInfo, TrajectoryMetadata},
        params::LammpsParams,
        species_index::{id_column, species_column, PropertyColumns, SpeciesIndex, SpeciesIndexBuilder},
        FileProcessor,
    },
    trajstore_errors::{ParseHeaderError, TrajStoreError},
};

/// Everything discovered about a dump before any batch is read.
///
/// Built once by [`extract_layout`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryLayout {
    pub metadata: TrajectoryMetadata,
    pub species_index: SpeciesIndex,
    pub property_columns: PropertyColumns,
    /// Column holding the particle id.
    pub id_column: usize,
    /// Byte offset of every configuration start.
    pub offsets: ConfigurationOffsets,
}

impl TrajectoryLayout {
    /// Columns that must be decoded for every row, sorted and deduplicated.
    fn decoded_columns(&self) -> Vec<usize> {
        let mut columns: Vec<usize> = self
            .property_columns
            .iter()
            .flat_map(|(_, idxs)| idxs.iter().copied())
            .collect();
        columns.sort_unstable();
        columns.dedup();
        columns
    }
}

/// Scan a LAMMPS dump and build its [`TrajectoryLayout`].
///
/// The reader is read from the start regardless of its current position. Memory use is
/// bounded by one configuration block plus one offset per configuration.
///
/// Arguments
/// -----------------
/// * `reader` – Seekable handle on the dump.
/// * `params` – Header size and sorting declaration.
///
/// Return
/// ----------
/// * The layout, or:
///   - [`TrajStoreError::EmptyFile`] if the reader holds no line at all,
///   - [`TrajStoreError::HeaderParse`] if the first header is malformed or lacks an `id` column,
///   - [`TrajStoreError::NonIntegralConfigurationCount`] if the line count is not a whole
///     number of configurations,
///   - [`TrajStoreError::MissingSpeciesColumn`] if neither `element` nor `type` is present,
///   - [`TrajStoreError::MalformedRecord`] if a row of the first block cannot be decoded.
pub fn extract_layout<R: BufRead + Seek>(
    reader: &mut R,
    params: &LammpsParams,
) -> Result<TrajectoryLayout, TrajStoreError> {
    let header_lines = read_n_lines_at(reader, params.n_header_lines, 0).map_err(|e| match e {
        TrajStoreError::HeaderParse(ParseHeaderError::TooFewHeaderLines { found: 0, .. }) => {
            TrajStoreError::EmptyFile("<reader>".into())
        }
        other => other,
    })?;
    let header = HeaderBlock::parse(&header_lines)?;
    let lines_per_configuration = params.lines_per_configuration(header.n_particles);

    let (n_lines, offsets) = scan_offsets(reader, lines_per_configuration)?;
    let n_configurations = whole_configuration_count(n_lines, lines_per_configuration)?;

    let id_col = id_column(&header.columns)?;
    let species_col = species_column(&header.columns)?;
    let property_columns = PropertyColumns::from_labels(&header.columns);

    let species_index = index_first_block(
        reader,
        params,
        header.n_particles,
        id_col,
        species_col,
    )?;

    let sample_step = if n_configurations > 1 {
        let second = offsets.byte_offset(1).unwrap_or_default();
        let next = HeaderBlock::parse(&read_n_lines_at(reader, params.n_header_lines, second)?)?;
        next.timestep - header.timestep
    } else {
        warn!("Trajectory holds a single configuration, sample step set to 0");
        0.0
    };

    let properties = property_columns.property_infos();
    if properties.is_empty() {
        warn!(
            "No known property among columns {:?}, only membership will be indexed",
            header.columns
        );
    }

    let species_list = species_index
        .iter()
        .map(|(name, entry)| SpeciesInfo {
            name: name.clone(),
            n_particles: entry.n_particles(),
            properties: properties.clone(),
        })
        .collect();

    let metadata = TrajectoryMetadata {
        n_configurations,
        n_particles: header.n_particles,
        species_list,
        box_l: header.box_lengths(),
        sample_step,
    };

    info!(
        "Extracted {} configurations of {} particles (species {}; {} properties)",
        metadata.n_configurations,
        metadata.n_particles,
        species_index.species_names().join(", "),
        property_columns.len()
    );

    Ok(TrajectoryLayout {
        metadata,
        species_index,
        property_columns,
        id_column: id_col,
        offsets,
    })
}

/// Count every line of the reader and record configuration start offsets.
fn scan_offsets<R: BufRead + Seek>(
    reader: &mut R,
    lines_per_configuration: usize,
) -> Result<(usize, ConfigurationOffsets), TrajStoreError> {
    reader.seek(SeekFrom::Start(0))?;

    let mut scan_error = None;
    let mut n_lines = 0usize;
    let mut scratch = Vec::with_capacity(256);
    let line_lengths = std::iter::from_fn(|| {
        scratch.clear();
        match reader.read_until(b'\n', &mut scratch) {
            Ok(0) => None,
            Ok(n) => Some(n as u64),
            Err(e) => {
                scan_error = Some(e);
                None
            }
        }
    })
    .inspect(|_| n_lines += 1);

    let offsets = ConfigurationOffsets::from_line_lengths(line_lengths, lines_per_configuration);
    if let Some(e) = scan_error {
        return Err(e.into());
    }
    Ok((n_lines, offsets))
}

/// Number of configurations in `n_lines`, or an error when the ratio is not integral.
pub fn whole_configuration_count(
    n_lines: usize,
    lines_per_configuration: usize,
) -> Result<usize, TrajStoreError> {
    let ratio = n_lines as f64 / lines_per_configuration as f64;
    if (ratio - ratio.round()).abs() > CONFIGURATION_COUNT_TOLERANCE {
        return Err(TrajStoreError::NonIntegralConfigurationCount {
            n_lines,
            lines_per_configuration,
        });
    }
    Ok(ratio.round() as usize)
}

/// Read the first configuration block and assign its rows to species.
fn index_first_block<R: BufRead + Seek>(
    reader: &mut R,
    params: &LammpsParams,
    n_particles: usize,
    id_col: usize,
    species_col: usize,
) -> Result<SpeciesIndex, TrajStoreError> {
    reader.seek(SeekFrom::Start(0))?;
    skip_lines(reader, params.n_header_lines)?;

    let mut rows: Vec<(ParticleId, String)> = Vec::with_capacity(n_particles);
    let mut line = String::new();
    for row in 0..n_particles {
        if read_trimmed_line(reader, &mut line)? == 0 {
            return Err(truncated_block(0, row));
        }
        let tokens = split_record(&line);
        let id = parse_id(&tokens, id_col, 0, row)?;
        let species = tokens
            .get(species_col)
            .ok_or_else(|| missing_column(0, row, species_col))?;
        rows.push((id, species.to_string()));
    }

    if !params.trajectory_is_sorted_by_ids {
        rows.sort_by_key(|(id, _)| *id);
    }

    let mut builder = SpeciesIndexBuilder::with_capacity(4);
    for (id, species) in &rows {
        builder.push_row(species, *id);
    }
    Ok(builder.build())
}

fn parse_id(
    tokens: &[&str],
    id_col: usize,
    configuration: usize,
    row: usize,
) -> Result<ParticleId, TrajStoreError> {
    let token = tokens
        .get(id_col)
        .ok_or_else(|| missing_column(configuration, row, id_col))?;
    token.parse().map_err(|_| TrajStoreError::MalformedRecord {
        configuration,
        row,
        reason: format!("particle id '{token}' is not an unsigned integer"),
    })
}

fn missing_column(configuration: usize, row: usize, column: usize) -> TrajStoreError {
    TrajStoreError::MalformedRecord {
        configuration,
        row,
        reason: format!("missing column {column}"),
    }
}

fn truncated_block(configuration: usize, row: usize) -> TrajStoreError {
    TrajStoreError::MalformedRecord {
        configuration,
        row,
        reason: "unexpected end of file".into(),
    }
}

/// Decoded numeric content of one configuration block, before species demultiplexing.
///
/// `values` is indexed `[raw_row, column]`; only decoded columns hold data. `order[r]` is the
/// raw row found at position `r` of the (optionally) id-sorted block.
struct DecodedBlock {
    values: Array2<f64>,
    ids: Vec<ParticleId>,
    order: Vec<usize>,
}

impl DecodedBlock {
    fn new(n_particles: usize, n_columns: usize) -> Self {
        Self {
            values: Array2::zeros((n_particles, n_columns)),
            ids: Vec::with_capacity(n_particles),
            order: (0..n_particles).collect(),
        }
    }
}

/// A LAMMPS dump opened for batched reading.
///
/// The layout is extracted when the file is opened; the read cursor starts at
/// configuration 0 and is owned by this value alone.
#[derive(Debug)]
pub struct LammpsTrajectoryFile<R = BufReader<File>> {
    reader: R,
    params: LammpsParams,
    layout: TrajectoryLayout,
    cursor: ReadCursor,
    source: String,
}

impl LammpsTrajectoryFile<BufReader<File>> {
    /// Open a dump from disk and extract its layout.
    pub fn open(path: &Utf8Path, params: LammpsParams) -> Result<Self, TrajStoreError> {
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Err(TrajStoreError::EmptyFile(path.to_string()));
        }
        Self::from_reader(BufReader::new(file), params)
            .map(|dump| dump.with_source(path.as_str()))
            .map_err(|e| match e {
                TrajStoreError::EmptyFile(_) => TrajStoreError::EmptyFile(path.to_string()),
                other => other,
            })
    }
}

impl<R: BufRead + Seek> LammpsTrajectoryFile<R> {
    /// Wrap any seekable reader, e.g. an in-memory `Cursor`.
    pub fn from_reader(mut reader: R, params: LammpsParams) -> Result<Self, TrajStoreError> {
        let layout = extract_layout(&mut reader, &params)?;
        let cursor = ReadCursor::new(layout.metadata.n_configurations);
        Ok(Self {
            reader,
            params,
            layout,
            cursor,
            source: "<reader>".into(),
        })
    }

    fn with_source(mut self, source: &str) -> Self {
        self.source = source.to_string();
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn params(&self) -> &LammpsParams {
        &self.params
    }

    pub fn layout(&self) -> &TrajectoryLayout {
        &self.layout
    }

    pub fn metadata(&self) -> &TrajectoryMetadata {
        &self.layout.metadata
    }

    pub fn cursor(&self) -> ReadCursor {
        self.cursor
    }

    /// Move the cursor to configuration `position`, e.g. to replay a failed batch.
    pub fn seek_configuration(&mut self, position: usize) -> Result<(), TrajStoreError> {
        self.cursor.seek(position)
    }

    /// Read `n_configs` configurations starting at `start` without touching the cursor.
    ///
    /// Arguments
    /// -----------------
    /// * `start` – Index of the first configuration to read.
    /// * `n_configs` – Number of consecutive configurations. `0` yields an empty batch.
    ///
    /// Return
    /// ----------
    /// * A [`ConfigurationBatch`] with arrays of shape `(particles, n_configs, dims)`, or:
    ///   - [`TrajStoreError::BatchOutOfRange`] if the range runs past the end of the file,
    ///   - [`TrajStoreError::MisalignedConfiguration`] if a block does not start with a
    ///     timestep header,
    ///   - [`TrajStoreError::MalformedRecord`] if a data line cannot be decoded.
    pub fn read_configurations(
        &mut self,
        start: usize,
        n_configs: usize,
    ) -> Result<ConfigurationBatch, TrajStoreError> {
        let n_configurations = self.layout.metadata.n_configurations;
        check_range(start, n_configs, n_configurations)?;

        let mut batch = ConfigurationBatch::zeros(&self.layout.metadata, n_configs);
        if n_configs == 0 {
            return Ok(batch);
        }

        let offset = self
            .layout
            .offsets
            .byte_offset(start)
            .ok_or(TrajStoreError::BatchOutOfRange {
                requested: n_configs,
                remaining: n_configurations.saturating_sub(start),
            })?;
        self.reader.seek(SeekFrom::Start(offset))?;

        let n_particles = self.layout.metadata.n_particles;
        let decoded_columns = self.layout.decoded_columns();
        let n_columns = self
            .layout
            .property_columns
            .max_column()
            .map_or(0, |c| c + 1);
        let mut block = DecodedBlock::new(n_particles, n_columns);
        let mut line = String::new();

        for i in 0..n_configs {
            let configuration = start + i;
            self.read_block(configuration, &decoded_columns, &mut block, &mut line)?;
            scatter_block(&self.layout, &block, i, &mut batch);
        }

        debug!(
            "Read configurations {}..{} from {}",
            start,
            start + n_configs,
            self.source
        );
        Ok(batch)
    }

    /// Decode the block the reader is positioned on.
    fn read_block(
        &mut self,
        configuration: usize,
        decoded_columns: &[usize],
        block: &mut DecodedBlock,
        line: &mut String,
    ) -> Result<(), TrajStoreError> {
        if read_trimmed_line(&mut self.reader, line)? == 0
            || !line.trim_start().starts_with(TIMESTEP_MARKER)
        {
            return Err(TrajStoreError::MisalignedConfiguration(configuration));
        }
        let rest = self.params.n_header_lines - 1;
        if skip_lines(&mut self.reader, rest)? != rest {
            return Err(truncated_block(configuration, 0));
        }

        let id_col = self.layout.id_column;
        block.ids.clear();
        for row in 0..self.layout.metadata.n_particles {
            if read_trimmed_line(&mut self.reader, line)? == 0 {
                return Err(truncated_block(configuration, row));
            }
            let tokens = split_record(line);
            for &col in decoded_columns {
                let token = tokens
                    .get(col)
                    .ok_or_else(|| missing_column(configuration, row, col))?;
                block.values[[row, col]] =
                    token
                        .parse::<f64>()
                        .map_err(|_| TrajStoreError::MalformedRecord {
                            configuration,
                            row,
                            reason: format!("'{token}' in column {col} is not a number"),
                        })?;
            }
            if !self.params.trajectory_is_sorted_by_ids {
                block.ids.push(parse_id(&tokens, id_col, configuration, row)?);
            }
        }

        if !self.params.trajectory_is_sorted_by_ids {
            let ids = &block.ids;
            block.order.clear();
            block.order.extend(0..ids.len());
            block.order.sort_by_key(|&raw| ids[raw]);
        }
        Ok(())
    }
}

/// Copy one decoded block into configuration slot `slot` of `batch`.
fn scatter_block(
    layout: &TrajectoryLayout,
    block: &DecodedBlock,
    slot: usize,
    batch: &mut ConfigurationBatch,
) {
    for (species, entry) in layout.species_index.iter() {
        let Some(arrays) = batch.species_mut(species) else {
            continue;
        };
        for (property, columns) in layout.property_columns.iter() {
            let Some(arr) = arrays.get_mut(property) else {
                continue;
            };
            for (p, &line_idx) in entry.line_idxs.iter().enumerate() {
                let raw = block.order[line_idx];
                for (d, &col) in columns.iter().enumerate() {
                    arr[[p, slot, d]] = block.values[[raw, col]];
                }
            }
        }
    }
}

impl<R: BufRead + Seek> FileProcessor for LammpsTrajectoryFile<R> {
    fn get_metadata(&mut self) -> Result<TrajectoryMetadata, TrajStoreError> {
        Ok(self.layout.metadata.clone())
    }

    fn get_next_n_configurations(
        &mut self,
        n_configs: usize,
    ) -> Result<ConfigurationBatch, TrajStoreError> {
        self.cursor.check_request(n_configs)?;
        let batch = self.read_configurations(self.cursor.position(), n_configs)?;
        self.cursor.advance(n_configs);
        Ok(batch)
    }

    fn remaining_configurations(&self) -> usize {
        self.cursor.remaining()
    }
}

#[cfg(test)]
mod lammps_reader_test {
    use std::io::Cursor;

    use approx::assert_relative_eq;
    use ndarray::s;

    use super::*;

    /// Rows are `(id, species, x, vx)`; every configuration shifts x by its index.
    fn dump(timesteps: &[u64], rows: &[(u64, &str, f64, f64)]) -> String {
        let mut out = String::new();
        for (k, t) in timesteps.iter().enumerate() {
            out.push_str(&format!(
                "ITEM: TIMESTEP\n{t}\nITEM: NUMBER OF ATOMS\n{}\nITEM: BOX BOUNDS pp pp pp\n\
                 0.0 10.0\n0.0 20.0\n-1.0 1.0\nITEM: ATOMS id type x y z vx vy vz\n",
                rows.len()
            ));
            for (id, species, x, vx) in rows {
                let x = x + k as f64;
                out.push_str(&format!("{id} {species} {x} 0.0 0.0 {vx} 0.0 0.0\n"));
            }
        }
        out
    }

    fn open(text: String, sorted: bool) -> LammpsTrajectoryFile<Cursor<Vec<u8>>> {
        let params = LammpsParams::builder()
            .trajectory_is_sorted_by_ids(sorted)
            .build()
            .unwrap();
        LammpsTrajectoryFile::from_reader(Cursor::new(text.into_bytes()), params).unwrap()
    }

    #[test]
    fn layout_of_a_two_species_dump() {
        let text = dump(
            &[0, 10, 20],
            &[(1, "1", 0.1, 1.0), (2, "2", 0.2, 2.0), (3, "1", 0.3, 3.0)],
        );
        let mut file = open(text, true);
        let meta = file.get_metadata().unwrap();

        assert_eq!(meta.n_configurations, 3);
        assert_eq!(meta.n_particles, 3);
        assert_relative_eq!(meta.sample_step, 10.0);
        assert_relative_eq!(meta.box_l.y, 20.0);
        assert_relative_eq!(meta.box_l.z, 2.0);

        let names: Vec<&str> = meta.species_list.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["1", "2"]);
        assert_eq!(meta.species("1").unwrap().n_particles, 2);

        let index = &file.layout().species_index;
        assert_eq!(index.get("1").unwrap().line_idxs, vec![0, 2]);
        assert_eq!(file.layout().id_column, 0);
        assert_eq!(file.layout().offsets.len(), 3);
    }

    #[test]
    fn batches_demultiplex_and_advance() {
        let text = dump(
            &[0, 1, 2],
            &[(1, "Na", 0.5, -1.0), (2, "Cl", 1.5, -2.0)],
        );
        let mut file = open(text, true);

        let first = file.get_next_n_configurations(2).unwrap();
        assert_eq!(file.remaining_configurations(), 1);

        let na = first.get("Na", "Positions").unwrap();
        assert_eq!(na.dim(), (1, 2, 3));
        assert_relative_eq!(na[[0, 0, 0]], 0.5);
        assert_relative_eq!(na[[0, 1, 0]], 1.5);
        let cl_v = first.get("Cl", "Velocities").unwrap();
        assert_relative_eq!(cl_v[[0, 1, 0]], -2.0);

        let last = file.get_next_n_configurations(1).unwrap();
        assert_relative_eq!(last.get("Cl", "Positions").unwrap()[[0, 0, 0]], 3.5);
        assert!(file.cursor().is_exhausted());
    }

    #[test]
    fn overread_leaves_cursor_in_place() {
        let text = dump(&[0, 1], &[(1, "A", 0.0, 0.0)]);
        let mut file = open(text, true);
        file.get_next_n_configurations(1).unwrap();

        let err = file.get_next_n_configurations(2).unwrap_err();
        assert_eq!(
            err,
            TrajStoreError::BatchOutOfRange {
                requested: 2,
                remaining: 1
            }
        );
        assert_eq!(file.cursor().position(), 1);
    }

    #[test]
    fn replay_after_seek_is_identical() {
        let text = dump(&[0, 5, 10, 15], &[(2, "B", 4.0, 1.0), (1, "A", 3.0, 2.0)]);
        let mut file = open(text, false);

        let a = file.get_next_n_configurations(2).unwrap();
        file.seek_configuration(0).unwrap();
        let b = file.get_next_n_configurations(2).unwrap();
        assert_eq!(a, b);
        assert_eq!(file.read_configurations(0, 2).unwrap(), a);
        assert_eq!(file.cursor().position(), 2);
    }

    #[test]
    fn unsorted_rows_follow_particle_ids() {
        // Rows are written in id order 3, 1, 2; species come from the sorted block.
        let text = dump(
            &[0, 1],
            &[(3, "Cl", 3.0, 0.0), (1, "Na", 1.0, 0.0), (2, "Cl", 2.0, 0.0)],
        );
        let mut file = open(text, false);
        let meta = file.get_metadata().unwrap();
        let names: Vec<&str> = meta.species_list.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Na", "Cl"]);
        assert_eq!(file.layout().species_index.get("Cl").unwrap().particle_ids, vec![2, 3]);

        let batch = file.read_configurations(1, 1).unwrap();
        let cl = batch.get("Cl", "Positions").unwrap();
        assert_relative_eq!(cl[[0, 0, 0]], 3.0);
        assert_relative_eq!(cl[[1, 0, 0]], 4.0);
        assert_relative_eq!(batch.get("Na", "Positions").unwrap()[[0, 0, 0]], 2.0);
    }

    #[test]
    fn single_configuration_has_zero_sample_step() {
        let mut file = open(dump(&[42], &[(1, "A", 0.0, 0.0)]), true);
        assert_relative_eq!(file.get_metadata().unwrap().sample_step, 0.0);
    }

    #[test]
    fn trailing_partial_block_is_rejected() {
        let mut text = dump(&[0, 1], &[(1, "A", 0.0, 0.0), (2, "A", 0.0, 0.0)]);
        text.push_str("ITEM: TIMESTEP\n2\n");
        let err = LammpsTrajectoryFile::from_reader(
            Cursor::new(text.into_bytes()),
            LammpsParams::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            TrajStoreError::NonIntegralConfigurationCount {
                n_lines: 24,
                lines_per_configuration: 11
            }
        );
    }

    #[test]
    fn empty_and_speciesless_inputs_fail() {
        let err = LammpsTrajectoryFile::from_reader(Cursor::new(Vec::new()), LammpsParams::default())
            .unwrap_err();
        assert!(matches!(err, TrajStoreError::EmptyFile(_)));

        let text = dump(&[0], &[(1, "A", 0.0, 0.0)]).replace("id type", "id mol");
        let err = LammpsTrajectoryFile::from_reader(
            Cursor::new(text.into_bytes()),
            LammpsParams::default(),
        )
        .unwrap_err();
        assert_eq!(err, TrajStoreError::MissingSpeciesColumn);
    }

    #[test]
    fn bad_values_are_malformed_records() {
        let text = dump(&[0, 1], &[(1, "A", 0.0, 0.0)]).replacen("1 A 1 0.0", "1 A abc 0.0", 1);
        let mut file = open(text, true);
        let err = file.read_configurations(0, 2).unwrap_err();
        assert!(matches!(
            err,
            TrajStoreError::MalformedRecord {
                configuration: 1,
                row: 0,
                ..
            }
        ));
        let ok = file.read_configurations(0, 1).unwrap();
        assert_eq!(ok.get("A", "Velocities").unwrap().slice(s![0, 0, ..]).len(), 3);

        assert!(file.get_next_n_configurations(2).is_err());
        assert_eq!(file.cursor().position(), 0);
        file.get_next_n_configurations(1).unwrap();
        assert_eq!(file.cursor().position(), 1);
    }

    #[test]
    fn configuration_count_tolerance() {
        assert_eq!(whole_configuration_count(39, 13).unwrap(), 3);
        assert!(whole_configuration_count(40, 13).is_err());
        assert_eq!(whole_configuration_count(0, 13).unwrap(), 0);
    }
}
