//! Growable dense storage used by every node of the tree.
//!
//! A [`Buffer`] distinguishes its logical size (the number of values appended so far) from its
//! capacity. When an append would overflow the capacity, the storage grows geometrically by
//! [`GROWTH_NUMERATOR`]`/`[`GROWTH_DENOMINATOR`] (1.5x), so appends are amortized O(1).
//! Buffers never shrink and values are never removed.
use std::ops::AddAssign;

use crate::utils::{Error, Result};

/// Growth ratio applied to the capacity on overflow, expressed as a fraction.
pub const GROWTH_NUMERATOR: usize = 3;
pub const GROWTH_DENOMINATOR: usize = 2;

/// Capacity reserved on the first append.
const MIN_CAPACITY: usize = 4;

/// An ordered, append-only sequence of `T` owned by a single node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffer<T> {
    values: Vec<T>,
}

impl<T> Default for Buffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Buffer<T> {
    /// Create an empty buffer without allocating.
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Create an empty buffer able to hold `capacity` values before growing.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
        }
    }

    /// Wrap already-decoded values. The logical size is the length of `values`.
    pub fn from_vec(values: Vec<T>) -> Self {
        Self { values }
    }

    /// Logical size: the number of values appended so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of values the buffer can hold before it has to grow.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.values.capacity()
    }

    /// Append a value, growing the storage by 1.5x when it is full.
    pub fn push(&mut self, value: T) {
        if self.values.len() == self.values.capacity() {
            self.grow();
        }
        self.values.push(value);
    }

    fn grow(&mut self) {
        let capacity = self.values.capacity();
        let target = (capacity * GROWTH_NUMERATOR / GROWTH_DENOMINATOR)
            .max(capacity + 1)
            .max(MIN_CAPACITY);
        self.values.reserve_exact(target - self.values.len());
    }

    /// Value at logical position `index`.
    pub fn get(&self, index: usize) -> Result<&T> {
        self.values.get(index).ok_or(Error::IndexOutOfRange {
            index,
            size: self.values.len(),
        })
    }

    /// The first `len()` values, i.e. everything appended so far.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.values
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.values.iter()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.values
    }
}

impl<T: Copy + AddAssign> Buffer<T> {
    /// Add `delta` in place to the value at `index`.
    pub fn increment_at(&mut self, index: usize, delta: T) -> Result<()> {
        let size = self.values.len();
        let slot = self
            .values
            .get_mut(index)
            .ok_or(Error::IndexOutOfRange { index, size })?;
        *slot += delta;
        Ok(())
    }
}

impl<T> FromIterator<T> for Buffer<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<T> From<Vec<T>> for Buffer<T> {
    fn from(value: Vec<T>) -> Self {
        Self::from_vec(value)
    }
}

impl<'a, T> IntoIterator for &'a Buffer<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
