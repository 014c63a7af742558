//! Read cursor and seek arithmetic for configuration-structured files.
//!
//! All offset computations of the batch reader live here so they can be checked against
//! synthetic layouts without touching a file.
//!
//! A configuration occupies `header_lines + n_particles` lines, so configuration `k` starts
//! at line `k * (header_lines + n_particles)`. Text lines have variable width, therefore the
//! metadata scan also records the **byte** offset of every configuration start
//! ([`ConfigurationOffsets`]); seeking to a configuration is then a single lookup.
use crate::trajstore_errors::TrajStoreError;

/// Line at which configuration `cursor` starts.
#[inline]
pub fn configuration_line_offset(cursor: usize, lines_per_configuration: usize) -> usize {
    cursor * lines_per_configuration
}

/// Byte offsets of every configuration start, recorded during the line-count scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurationOffsets {
    starts: Vec<u64>,
}

impl ConfigurationOffsets {
    pub fn new(starts: Vec<u64>) -> Self {
        Self { starts }
    }

    /// Build offsets from the byte length of every line of a file.
    ///
    /// Only lines that open a configuration are retained.
    pub fn from_line_lengths<I>(line_lengths: I, lines_per_configuration: usize) -> Self
    where
        I: IntoIterator<Item = u64>,
    {
        let mut starts = Vec::new();
        let mut offset = 0u64;
        for (line, len) in line_lengths.into_iter().enumerate() {
            if line == configuration_line_offset(starts.len(), lines_per_configuration) {
                starts.push(offset);
            }
            offset += len;
        }
        Self { starts }
    }

    pub fn len(&self) -> usize {
        self.starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    /// Byte offset at which configuration `cursor` starts, if it exists.
    #[inline]
    pub fn byte_offset(&self, cursor: usize) -> Option<u64> {
        self.starts.get(cursor).copied()
    }
}

/// Number of configurations already consumed from a trajectory.
///
/// Owned by exactly one reader. It only moves through [`ReadCursor::check_request`] +
/// [`ReadCursor::advance`], so a failed batch never moves it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadCursor {
    position: usize,
    n_configurations: usize,
}

impl ReadCursor {
    pub fn new(n_configurations: usize) -> Self {
        Self {
            position: 0,
            n_configurations,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.n_configurations - self.position
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Validate that `n_configs` configurations can be read from the current position.
    pub fn check_request(&self, n_configs: usize) -> Result<(), TrajStoreError> {
        check_range(self.position, n_configs, self.n_configurations)
    }

    /// Move forward after a successful batch. Callers must have checked the request first.
    pub(crate) fn advance(&mut self, n_configs: usize) {
        debug_assert!(n_configs <= self.remaining(), "cursor advanced past the end");
        self.position += n_configs;
    }

    /// Reposition the cursor, e.g. to replay a batch.
    pub fn seek(&mut self, position: usize) -> Result<(), TrajStoreError> {
        if position > self.n_configurations {
            return Err(TrajStoreError::BatchOutOfRange {
                requested: position,
                remaining: self.n_configurations,
            });
        }
        self.position = position;
        Ok(())
    }
}

/// Validate a `[start, start + n)` configuration range against the file length.
pub fn check_range(start: usize, n_configs: usize, n_configurations: usize) -> Result<(), TrajStoreError> {
    let remaining = n_configurations.saturating_sub(start);
    if n_configs > remaining {
        return Err(TrajStoreError::BatchOutOfRange {
            requested: n_configs,
            remaining,
        });
    }
    Ok(())
}

#[cfg(test)]
mod cursor_test {
    use super::*;

    #[test]
    fn line_offsets_are_multiples_of_block_size() {
        assert_eq!(configuration_line_offset(0, 13), 0);
        assert_eq!(configuration_line_offset(3, 13), 39);
    }

    #[test]
    fn byte_offsets_from_variable_width_lines() {
        // Two configurations of 3 lines each, lines of different widths.
        let lengths = [5u64, 7, 2, 4, 4, 9];
        let offsets = ConfigurationOffsets::from_line_lengths(lengths, 3);
        assert_eq!(offsets.len(), 2);
        assert_eq!(offsets.byte_offset(0), Some(0));
        assert_eq!(offsets.byte_offset(1), Some(14));
        assert_eq!(offsets.byte_offset(2), None);
    }

    #[test]
    fn cursor_rejects_overreads_without_moving() {
        let mut cursor = ReadCursor::new(5);
        cursor.check_request(3).unwrap();
        cursor.advance(3);
        assert_eq!(cursor.remaining(), 2);

        let err = cursor.check_request(3).unwrap_err();
        assert_eq!(
            err,
            TrajStoreError::BatchOutOfRange {
                requested: 3,
                remaining: 2
            }
        );
        assert_eq!(cursor.position(), 3);

        cursor.check_request(2).unwrap();
        cursor.advance(2);
        assert!(cursor.is_exhausted());
        assert!(cursor.check_request(0).is_ok());
    }

    #[test]
    fn seek_is_bounded() {
        let mut cursor = ReadCursor::new(4);
        cursor.seek(4).unwrap();
        assert!(cursor.is_exhausted());
        assert!(cursor.seek(5).is_err());
        cursor.seek(1).unwrap();
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn range_check_past_end() {
        assert!(check_range(0, 4, 4).is_ok());
        assert!(check_range(6, 0, 4).is_ok());
        assert!(check_range(6, 1, 4).is_err());
    }
}
