//! Range index: per-parent element counts of a list position.
//!
//! For a parent sequence of `P` rows, an [`Index`] stores `P` lengths whose sum `C` is the number
//! of child rows. Children are laid out contiguously in parent order, so the lengths alone encode
//! the offsets. The index supports three operations used by flattening:
//!
//! - [`Index::expand`] repeats each parent value `lengths[i]` times, broadcasting a parent column
//!   to child granularity;
//! - [`Index::compose`] collapses two nested list levels into one index over the outer parent;
//! - [`Index::null_align`] inserts a zero length for each null parent row.
//!
//! ```
//! use colnest::index::Index;
//!
//! let outer = Index::from_lengths(vec![2]);
//! let inner = Index::from_lengths(vec![2, 1]);
//! let composed = outer.compose(&inner).unwrap();
//! assert_eq!(composed.lengths(), &[3]);
//! assert_eq!(composed.expand(&["x"]).unwrap(), vec!["x", "x", "x"]);
//! ```
use crate::{
    buffer::Buffer,
    nulls::NullTrack,
    utils::{Error, Result},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Index {
    lengths: Buffer<usize>,
}

impl Index {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_lengths(lengths: Vec<usize>) -> Self {
        Self {
            lengths: Buffer::from_vec(lengths),
        }
    }

    /// Per-parent element counts.
    #[inline]
    pub fn lengths(&self) -> &[usize] {
        self.lengths.as_slice()
    }

    /// Number of parent rows covered by this index.
    #[inline]
    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    /// Number of child rows, i.e. the sum of all lengths.
    pub fn child_len(&self) -> usize {
        self.lengths.iter().sum()
    }

    /// Record one more parent row holding `length` elements.
    pub fn add_list(&mut self, length: usize) {
        self.lengths.push(length);
    }

    /// Add one element to the most recently recorded parent row.
    pub fn add_to_last_list(&mut self) -> Result<()> {
        let last = self
            .lengths
            .len()
            .checked_sub(1)
            .ok_or(Error::IndexOutOfRange { index: 0, size: 0 })?;
        self.lengths.increment_at(last, 1)
    }

    /// Repeat each parent value `lengths[i]` times, in parent order.
    pub fn expand<T: Clone>(&self, parent: &[T]) -> Result<Vec<T>> {
        if parent.len() != self.len() {
            return Err(Error::MalformedIndex {
                expected: self.len(),
                found: parent.len(),
            });
        }
        let mut expanded = Vec::with_capacity(self.child_len());
        for (value, &length) in parent.iter().zip(self.lengths.iter()) {
            expanded.extend(std::iter::repeat_n(value, length).cloned());
        }
        Ok(expanded)
    }

    /// Compose with the index of a nested list level.
    ///
    /// `sub` indexes the child rows of `self`, so it must cover exactly `child_len()` rows. The
    /// result covers the parent rows of `self`, each owning the sum of `sub` lengths over its
    /// contiguous range of children.
    pub fn compose(&self, sub: &Index) -> Result<Index> {
        let expected = self.child_len();
        if expected != sub.len() {
            return Err(Error::MalformedIndex {
                expected,
                found: sub.len(),
            });
        }

        let mut sub_lengths = sub.lengths.iter();
        let composed = self
            .lengths
            .iter()
            .map(|&length| sub_lengths.by_ref().take(length).sum())
            .collect();
        Ok(Index { lengths: composed })
    }

    /// Re-insert the null parent rows recorded by `nulls`, each owning zero elements.
    pub fn null_align(&self, nulls: &NullTrack) -> Result<Index> {
        let lengths = nulls.align(self.lengths.as_slice(), 0)?;
        Ok(Index::from_lengths(lengths))
    }
}
