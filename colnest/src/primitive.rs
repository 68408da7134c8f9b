//! Scalar values and their typed storage.
//!
//! A primitive tree position is typed by the first value it receives; every later value must have
//! the same [`PrimitiveKind`]. Values are kept in a [`PrimitiveValues`] buffer specialised per kind
//! so that the stored representation stays dense.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use strum::{EnumDiscriminants, EnumIs, EnumTryAs};

use crate::{
    buffer::Buffer,
    utils::{Error, Result},
};

/// A single scalar value handed to the builder.
#[derive(Debug, Clone, PartialEq, EnumIs, EnumTryAs, EnumDiscriminants)]
#[strum_discriminants(derive(Hash, PartialOrd, Ord))]
#[strum_discriminants(name(PrimitiveKind))]
#[strum_discriminants(vis(pub))]
#[cfg_attr(feature = "serde", strum_discriminants(derive(Serialize, Deserialize)))]
pub enum Primitive {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
}

impl Primitive {
    #[inline]
    pub fn kind(&self) -> PrimitiveKind {
        PrimitiveKind::from(self)
    }
}

impl std::fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Int => "i64",
            PrimitiveKind::UInt => "u64",
            PrimitiveKind::Float => "f64",
            PrimitiveKind::Str => "str",
            PrimitiveKind::Bytes => "bytes",
        };
        f.write_str(name)
    }
}

macro_rules! primitive_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Primitive {
                fn from(value: $ty) -> Self {
                    Primitive::$variant(value.into())
                }
            }
        )*
    };
}

primitive_from! {
    bool => Bool,
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => UInt,
    u16 => UInt,
    u32 => UInt,
    u64 => UInt,
    f32 => Float,
    f64 => Float,
    String => Str,
    &str => Str,
    Vec<u8> => Bytes,
}

/// Dense values of one primitive position, one buffer variant per kind.
#[derive(Debug, Clone, PartialEq, EnumIs, EnumTryAs)]
pub enum PrimitiveValues {
    Bool(Buffer<bool>),
    Int(Buffer<i64>),
    UInt(Buffer<u64>),
    Float(Buffer<f64>),
    Str(Buffer<String>),
    Bytes(Buffer<Vec<u8>>),
}

impl PrimitiveValues {
    /// Empty storage for values of `kind`.
    pub fn new(kind: PrimitiveKind) -> Self {
        match kind {
            PrimitiveKind::Bool => PrimitiveValues::Bool(Buffer::new()),
            PrimitiveKind::Int => PrimitiveValues::Int(Buffer::new()),
            PrimitiveKind::UInt => PrimitiveValues::UInt(Buffer::new()),
            PrimitiveKind::Float => PrimitiveValues::Float(Buffer::new()),
            PrimitiveKind::Str => PrimitiveValues::Str(Buffer::new()),
            PrimitiveKind::Bytes => PrimitiveValues::Bytes(Buffer::new()),
        }
    }

    pub fn kind(&self) -> PrimitiveKind {
        match self {
            PrimitiveValues::Bool(_) => PrimitiveKind::Bool,
            PrimitiveValues::Int(_) => PrimitiveKind::Int,
            PrimitiveValues::UInt(_) => PrimitiveKind::UInt,
            PrimitiveValues::Float(_) => PrimitiveKind::Float,
            PrimitiveValues::Str(_) => PrimitiveKind::Str,
            PrimitiveValues::Bytes(_) => PrimitiveKind::Bytes,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            PrimitiveValues::Bool(b) => b.len(),
            PrimitiveValues::Int(b) => b.len(),
            PrimitiveValues::UInt(b) => b.len(),
            PrimitiveValues::Float(b) => b.len(),
            PrimitiveValues::Str(b) => b.len(),
            PrimitiveValues::Bytes(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append `value`, failing if its kind differs from the storage kind.
    pub fn push(&mut self, value: Primitive) -> Result<()> {
        match (self, value) {
            (PrimitiveValues::Bool(b), Primitive::Bool(v)) => b.push(v),
            (PrimitiveValues::Int(b), Primitive::Int(v)) => b.push(v),
            (PrimitiveValues::UInt(b), Primitive::UInt(v)) => b.push(v),
            (PrimitiveValues::Float(b), Primitive::Float(v)) => b.push(v),
            (PrimitiveValues::Str(b), Primitive::Str(v)) => b.push(v),
            (PrimitiveValues::Bytes(b), Primitive::Bytes(v)) => b.push(v),
            (values, value) => {
                return Err(Error::MismatchedPrimitiveType {
                    expected: values.kind(),
                    found: value.kind(),
                });
            }
        }
        Ok(())
    }

    /// Value at dense position `index`.
    pub fn get(&self, index: usize) -> Result<Primitive> {
        Ok(match self {
            PrimitiveValues::Bool(b) => Primitive::Bool(*b.get(index)?),
            PrimitiveValues::Int(b) => Primitive::Int(*b.get(index)?),
            PrimitiveValues::UInt(b) => Primitive::UInt(*b.get(index)?),
            PrimitiveValues::Float(b) => Primitive::Float(*b.get(index)?),
            PrimitiveValues::Str(b) => Primitive::Str(b.get(index)?.clone()),
            PrimitiveValues::Bytes(b) => Primitive::Bytes(b.get(index)?.clone()),
        })
    }
}

macro_rules! primitive_values_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<Vec<$ty>> for PrimitiveValues {
                fn from(values: Vec<$ty>) -> Self {
                    PrimitiveValues::$variant(Buffer::from_vec(values))
                }
            }
        )*
    };
}

primitive_values_from! {
    bool => Bool,
    i64 => Int,
    u64 => UInt,
    f64 => Float,
    String => Str,
    Vec<u8> => Bytes,
}
