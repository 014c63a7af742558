//! # LAMMPS dump lexing helpers
//!
//! Stateless helpers that pull **header blocks** and **raw record lines** out of a
//! `BufRead` handle. Nothing here knows about species or properties: this is the leaf of the
//! ingestion pipeline, shared by the metadata extractor and the batch reader.
//!
//! ## Header layout
//! -----------------
//! Every configuration of a LAMMPS dump starts with a fixed 9-line header:
//!
//! ```text
//! ITEM: TIMESTEP
//! 1000                     <- timestep (line 2)
//! ITEM: NUMBER OF ATOMS
//! 4                        <- particle count (line 4)
//! ITEM: BOX BOUNDS pp pp pp
//! 0.0 10.0                 <- lower upper, x
//! 0.0 10.0                 <- lower upper, y
//! 0.0 10.0                 <- lower upper, z
//! ITEM: ATOMS id element x y z
//! ```
//!
//! The numeric fields are lexed with small `nom` parsers; failures are reported as
//! [`ParseHeaderError`] carrying the offending line.
//!
//! ## See also
//! ------------
//! * [`HeaderBlock::parse`] – Parse a full header from its lines.
//! * [`read_n_lines`] – Read an exact number of lines.
//! * [`split_record`] – Whitespace tokenizer for data lines.
use std::io::{BufRead, Seek, SeekFrom};

use nalgebra::Vector3;
use nom::{
    character::complete::{digit1, space0, space1},
    combinator::{all_consuming, map_res},
    number::complete::double,
    sequence::{delimited, preceded, terminated},
    IResult, Parser,
};
use smallvec::SmallVec;

use crate::{
    constants::{
        BOX_BOUNDS_LINES, COLUMNS_LINE, N_IGNORED_COLUMN_TOKENS, N_PARTICLES_LINE, TIMESTEP_LINE,
    },
    trajstore_errors::{ParseHeaderError, TrajStoreError},
};

/// Tokens of a single data line. Most dumps carry fewer than 16 columns.
pub type RecordTokens<'a> = SmallVec<[&'a str; 16]>;

/// Parsed content of one configuration header.
///
/// Fields
/// -----------------
/// * `timestep` – Value of the timestep line (used to derive the sample step).
/// * `n_particles` – Number of data lines following the header.
/// * `box_bounds` – `(lower, upper)` per axis.
/// * `columns` – Column labels of the data lines (without the leading `ITEM: ATOMS`).
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderBlock {
    pub timestep: f64,
    pub n_particles: usize,
    pub box_bounds: [(f64, f64); 3],
    pub columns: Vec<String>,
}

impl HeaderBlock {
    /// Parse a header block from its raw lines.
    ///
    /// Arguments
    /// -----------------
    /// * `lines` – At least 9 header lines, as returned by [`read_n_lines`].
    ///
    /// Return
    /// ----------
    /// * The parsed [`HeaderBlock`], or a [`ParseHeaderError`] naming the faulty field.
    pub fn parse(lines: &[String]) -> Result<Self, ParseHeaderError> {
        let needed = COLUMNS_LINE + 1;
        if lines.len() < needed {
            return Err(ParseHeaderError::TooFewHeaderLines {
                expected: needed,
                found: lines.len(),
            });
        }

        let timestep = parse_timestep(&lines[TIMESTEP_LINE])?;
        let n_particles = parse_particle_count(&lines[N_PARTICLES_LINE])?;

        let mut box_bounds = [(0.0, 0.0); 3];
        for (axis, &line_idx) in BOX_BOUNDS_LINES.iter().enumerate() {
            box_bounds[axis] = parse_box_bounds(&lines[line_idx])?;
        }

        let columns = parse_column_labels(&lines[COLUMNS_LINE])?;

        Ok(Self {
            timestep,
            n_particles,
            box_bounds,
            columns,
        })
    }

    /// Box edge length per axis, `upper - lower`.
    pub fn box_lengths(&self) -> Vector3<f64> {
        Vector3::from_fn(|axis, _| self.box_bounds[axis].1 - self.box_bounds[axis].0)
    }
}

fn unsigned(input: &str) -> IResult<&str, usize> {
    map_res(delimited(space0, digit1, space0), |s: &str| s.parse::<usize>()).parse(input)
}

fn float_field(input: &str) -> IResult<&str, f64> {
    delimited(space0, double, space0).parse(input)
}

fn bounds_pair(input: &str) -> IResult<&str, (f64, f64)> {
    // Triclinic boxes append a tilt factor after the bounds; it is ignored.
    (preceded(space0, double), preceded(space1, double)).parse(input)
}

/// Parse the particle-count header line. Zero particles is rejected.
pub fn parse_particle_count(line: &str) -> Result<usize, ParseHeaderError> {
    match all_consuming(unsigned).parse(line) {
        Ok((_, n)) if n > 0 => Ok(n),
        _ => Err(ParseHeaderError::InvalidParticleCount(line.to_string())),
    }
}

/// Parse a `lower upper` box line.
pub fn parse_box_bounds(line: &str) -> Result<(f64, f64), ParseHeaderError> {
    bounds_pair(line)
        .map(|(_, bounds)| bounds)
        .map_err(|_| ParseHeaderError::InvalidBoxBounds(line.to_string()))
}

/// Parse the timestep header line.
pub fn parse_timestep(line: &str) -> Result<f64, ParseHeaderError> {
    all_consuming(terminated(float_field, space0))
        .parse(line)
        .map(|(_, t)| t)
        .map_err(|_| ParseHeaderError::InvalidTimestep(line.to_string()))
}

/// Column labels of an `ITEM: ATOMS ...` line, the two leading tokens removed.
pub fn parse_column_labels(line: &str) -> Result<Vec<String>, ParseHeaderError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() <= N_IGNORED_COLUMN_TOKENS || tokens[0] != "ITEM:" {
        return Err(ParseHeaderError::MissingColumnLine(line.to_string()));
    }
    Ok(tokens[N_IGNORED_COLUMN_TOKENS..]
        .iter()
        .map(|t| t.to_string())
        .collect())
}

/// Read one line into `buf` (cleared first), stripping the line terminator.
///
/// Returns the number of **bytes consumed** from the reader, terminator included, so that
/// callers can track byte offsets. `0` means end of file.
pub fn read_trimmed_line<R: BufRead>(reader: &mut R, buf: &mut String) -> std::io::Result<usize> {
    buf.clear();
    let n = reader.read_line(buf)?;
    while buf.ends_with('\n') || buf.ends_with('\r') {
        buf.pop();
    }
    Ok(n)
}

/// Read exactly `n` lines from the current position.
///
/// Return
/// ----------
/// * The `n` lines without terminators, or
///   [`ParseHeaderError::TooFewHeaderLines`] if the reader hits end of file first.
pub fn read_n_lines<R: BufRead>(reader: &mut R, n: usize) -> Result<Vec<String>, TrajStoreError> {
    let mut lines = Vec::with_capacity(n);
    let mut buf = String::new();
    for _ in 0..n {
        if read_trimmed_line(reader, &mut buf)? == 0 {
            return Err(ParseHeaderError::TooFewHeaderLines {
                expected: n,
                found: lines.len(),
            }
            .into());
        }
        lines.push(buf.clone());
    }
    Ok(lines)
}

/// Seek to `byte_offset` and read exactly `n` lines.
pub fn read_n_lines_at<R: BufRead + Seek>(
    reader: &mut R,
    n: usize,
    byte_offset: u64,
) -> Result<Vec<String>, TrajStoreError> {
    reader.seek(SeekFrom::Start(byte_offset))?;
    read_n_lines(reader, n)
}

/// Skip `n` lines without decoding them. Returns the number of lines actually skipped.
pub fn skip_lines<R: BufRead>(reader: &mut R, n: usize) -> std::io::Result<usize> {
    let mut scratch = Vec::with_capacity(128);
    for skipped in 0..n {
        scratch.clear();
        if reader.read_until(b'\n', &mut scratch)? == 0 {
            return Ok(skipped);
        }
    }
    Ok(n)
}

/// Split a data line on whitespace.
#[inline]
pub fn split_record(line: &str) -> RecordTokens<'_> {
    line.split_whitespace().collect()
}

#[cfg(test)]
mod format_reader_test {
    use std::io::Cursor;

    use approx::assert_relative_eq;

    use super::*;

    fn header_lines() -> Vec<String> {
        [
            "ITEM: TIMESTEP",
            "250",
            "ITEM: NUMBER OF ATOMS",
            "4",
            "ITEM: BOX BOUNDS pp pp pp",
            "-5.0 5.0",
            "0.0 12.5",
            "1.0e0 3.5e0 0.1",
            "ITEM: ATOMS id element x y z",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    #[test]
    fn parse_full_header() {
        let header = HeaderBlock::parse(&header_lines()).unwrap();
        assert_eq!(header.n_particles, 4);
        assert_relative_eq!(header.timestep, 250.0);
        assert_eq!(header.columns, vec!["id", "element", "x", "y", "z"]);

        let box_l = header.box_lengths();
        assert_relative_eq!(box_l.x, 10.0);
        assert_relative_eq!(box_l.y, 12.5);
        assert_relative_eq!(box_l.z, 2.5);
    }

    #[test]
    fn particle_count_rejects_garbage_and_zero() {
        assert_eq!(parse_particle_count(" 12 "), Ok(12));
        assert!(matches!(
            parse_particle_count("12 atoms"),
            Err(ParseHeaderError::InvalidParticleCount(_))
        ));
        assert!(matches!(
            parse_particle_count("0"),
            Err(ParseHeaderError::InvalidParticleCount(_))
        ));
    }

    #[test]
    fn box_bounds_need_two_floats() {
        assert_eq!(parse_box_bounds("0.5 2.5"), Ok((0.5, 2.5)));
        assert!(matches!(
            parse_box_bounds("0.5"),
            Err(ParseHeaderError::InvalidBoxBounds(_))
        ));
    }

    #[test]
    fn column_line_must_be_an_item_line() {
        assert!(matches!(
            parse_column_labels("id type x y z"),
            Err(ParseHeaderError::MissingColumnLine(_))
        ));
        assert!(matches!(
            parse_column_labels("ITEM: ATOMS"),
            Err(ParseHeaderError::MissingColumnLine(_))
        ));
    }

    #[test]
    fn truncated_header_is_reported() {
        let lines = header_lines();
        let err = HeaderBlock::parse(&lines[..5]).unwrap_err();
        assert_eq!(
            err,
            ParseHeaderError::TooFewHeaderLines {
                expected: 9,
                found: 5
            }
        );
    }

    #[test]
    fn read_lines_and_skip() {
        let mut cursor = Cursor::new(b"a\r\nb\nc\nd".to_vec());
        assert_eq!(skip_lines(&mut cursor, 1).unwrap(), 1);
        let lines = read_n_lines(&mut cursor, 3).unwrap();
        assert_eq!(lines, vec!["b", "c", "d"]);
        assert_eq!(skip_lines(&mut cursor, 5).unwrap(), 0);

        let lines = read_n_lines_at(&mut cursor, 1, 3).unwrap();
        assert_eq!(lines, vec!["b"]);

        let err = read_n_lines_at(&mut cursor, 10, 0).unwrap_err();
        assert_eq!(
            err,
            TrajStoreError::HeaderParse(ParseHeaderError::TooFewHeaderLines {
                expected: 10,
                found: 4
            })
        );
    }

    #[test]
    fn split_record_on_any_whitespace() {
        let tokens = split_record("  1\tNa  0.5 1.5   2.5 ");
        assert_eq!(tokens.as_slice(), &["1", "Na", "0.5", "1.5", "2.5"]);
    }
}
