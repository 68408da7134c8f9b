//! Typed output arrays produced by flattening.
//!
//! A [`Column`] holds one entry per logical row. Null rows are filled per kind: `0` for integers,
//! `NaN` for floats, `false` for booleans and `None` for strings and byte arrays.
use strum::{EnumIs, EnumTryAs};

use crate::{
    index::Index,
    nulls::NullTrack,
    primitive::{PrimitiveKind, PrimitiveValues},
    utils::Result,
};

#[derive(Debug, Clone, PartialEq, EnumIs, EnumTryAs)]
pub enum Column {
    Bool(Vec<bool>),
    Int(Vec<i64>),
    UInt(Vec<u64>),
    Float(Vec<f64>),
    Str(Vec<Option<String>>),
    Bytes(Vec<Option<Vec<u8>>>),
}

impl Column {
    /// Materialize primitive storage into a column with one entry per row of `nulls`.
    pub fn from_values(values: &PrimitiveValues, nulls: &NullTrack) -> Result<Column> {
        Ok(match values {
            PrimitiveValues::Bool(b) => Column::Bool(nulls.align(b.as_slice(), false)?),
            PrimitiveValues::Int(b) => Column::Int(nulls.align(b.as_slice(), 0)?),
            PrimitiveValues::UInt(b) => Column::UInt(nulls.align(b.as_slice(), 0)?),
            PrimitiveValues::Float(b) => Column::Float(nulls.align(b.as_slice(), f64::NAN)?),
            PrimitiveValues::Str(b) => {
                let dense: Vec<Option<String>> = b.iter().cloned().map(Some).collect();
                Column::Str(nulls.align(&dense, None)?)
            }
            PrimitiveValues::Bytes(b) => {
                let dense: Vec<Option<Vec<u8>>> = b.iter().cloned().map(Some).collect();
                Column::Bytes(nulls.align(&dense, None)?)
            }
        })
    }

    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Column::Bool(_) => PrimitiveKind::Bool,
            Column::Int(_) => PrimitiveKind::Int,
            Column::UInt(_) => PrimitiveKind::UInt,
            Column::Float(_) => PrimitiveKind::Float,
            Column::Str(_) => PrimitiveKind::Str,
            Column::Bytes(_) => PrimitiveKind::Bytes,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Bool(v) => v.len(),
            Column::Int(v) => v.len(),
            Column::UInt(v) => v.len(),
            Column::Float(v) => v.len(),
            Column::Str(v) => v.len(),
            Column::Bytes(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert the kind's fill value at every null row of `nulls`.
    pub fn null_align(&self, nulls: &NullTrack) -> Result<Column> {
        Ok(match self {
            Column::Bool(v) => Column::Bool(nulls.align(v, false)?),
            Column::Int(v) => Column::Int(nulls.align(v, 0)?),
            Column::UInt(v) => Column::UInt(nulls.align(v, 0)?),
            Column::Float(v) => Column::Float(nulls.align(v, f64::NAN)?),
            Column::Str(v) => Column::Str(nulls.align(v, None)?),
            Column::Bytes(v) => Column::Bytes(nulls.align(v, None)?),
        })
    }

    /// Broadcast each row to `index.lengths()[row]` rows.
    pub fn expand(&self, index: &Index) -> Result<Column> {
        Ok(match self {
            Column::Bool(v) => Column::Bool(index.expand(v)?),
            Column::Int(v) => Column::Int(index.expand(v)?),
            Column::UInt(v) => Column::UInt(index.expand(v)?),
            Column::Float(v) => Column::Float(index.expand(v)?),
            Column::Str(v) => Column::Str(index.expand(v)?),
            Column::Bytes(v) => Column::Bytes(index.expand(v)?),
        })
    }
}
