//! Sparse null tracking over a logical sequence.
//!
//! A [`NullTrack`] records how many rows a tree position has seen and which of them were null.
//! Values stored alongside it (primitive values, list lengths, child rows) are dense: they only
//! exist for the not-null rows. [`NullTrack::align`] re-inserts fill values at the null positions
//! to recover a sequence with one entry per logical row.
use crate::{
    buffer::Buffer,
    utils::{Error, Result},
};

/// Null positions of a logical sequence of `size` rows.
///
/// Invariant: the recorded positions are strictly increasing and all lie in `[0, size)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NullTrack {
    size: usize,
    nulls: Buffer<usize>,
}

impl NullTrack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a null track from decoded parts, validating the ordering invariant.
    pub fn from_parts(null_positions: Vec<usize>, size: usize) -> Result<Self> {
        let mut previous: Option<usize> = None;
        for &position in &null_positions {
            if position >= size || previous.is_some_and(|p| p >= position) {
                return Err(Error::InvalidNullPosition { position, size });
            }
            previous = Some(position);
        }
        Ok(Self {
            size,
            nulls: Buffer::from_vec(null_positions),
        })
    }

    /// Append a null row.
    pub fn add_null(&mut self) {
        self.nulls.push(self.size);
        self.size += 1;
    }

    /// Append a not-null row.
    pub fn add_not_null(&mut self) {
        self.size += 1;
    }

    /// Number of logical rows.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of null rows.
    #[inline]
    pub fn null_size(&self) -> usize {
        self.nulls.len()
    }

    /// Number of not-null rows; the length of any dense sequence aligned with this track.
    #[inline]
    pub fn not_null_size(&self) -> usize {
        self.size - self.nulls.len()
    }

    /// Null positions, strictly increasing.
    #[inline]
    pub fn null_indices(&self) -> &[usize] {
        self.nulls.as_slice()
    }

    pub fn is_null(&self, position: usize) -> bool {
        self.nulls.as_slice().binary_search(&position).is_ok()
    }

    /// Positions in `[0, size)` that are not null, strictly increasing.
    pub fn not_null_positions(&self) -> impl Iterator<Item = usize> + '_ {
        let mut nulls = self.nulls.iter().copied().peekable();
        (0..self.size).filter(move |&position| {
            if nulls.peek() == Some(&position) {
                nulls.next();
                false
            } else {
                true
            }
        })
    }

    /// Expand `dense` (one entry per not-null row) into one entry per logical row, writing `fill`
    /// at every null position.
    pub fn align<T: Clone>(&self, dense: &[T], fill: T) -> Result<Vec<T>> {
        if dense.len() != self.not_null_size() {
            return Err(Error::MisalignedValues {
                expected: self.not_null_size(),
                found: dense.len(),
            });
        }
        if self.nulls.is_empty() {
            return Ok(dense.to_vec());
        }

        let mut aligned = Vec::with_capacity(self.size);
        let mut values = dense.iter();
        let mut nulls = self.nulls.iter().copied().peekable();
        for position in 0..self.size {
            if nulls.peek() == Some(&position) {
                nulls.next();
                aligned.push(fill.clone());
            } else if let Some(value) = values.next() {
                aligned.push(value.clone());
            }
        }
        Ok(aligned)
    }
}
