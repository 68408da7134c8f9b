use strum::EnumIs;
use thiserror::Error;

use crate::{node::NodeKind, primitive::PrimitiveKind};

#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumIs, Error)]
pub enum Error {
    /// A selection path contains a zero-length segment.
    #[error("Empty field names are not allowed. The selection path `{path}` contains an empty segment.")]
    EmptyFieldName { path: String },

    /// The same position is both explicitly included and explicitly excluded.
    #[error("Cannot both include and exclude a field. The position `{path}` is explicitly included and explicitly excluded.")]
    ConflictingClusion { path: String },

    /// A primitive node received a value of a different scalar kind than the one it was typed with.
    #[error("Mismatched primitive types: the node stores `{expected}` values but received a `{found}` value.")]
    MismatchedPrimitiveType {
        expected: PrimitiveKind,
        found: PrimitiveKind,
    },

    /// A concrete node received a value of a different structural class.
    #[error("Inconsistent schema: a {expected} node received a {found} value.")]
    InconsistentSchema { expected: NodeKind, found: NodeKind },

    /// An index does not cover the sequence it is applied to.
    #[error("Malformed index: expected {expected} entries but found {found}.")]
    MalformedIndex { expected: usize, found: usize },

    /// Several list-backed fields would each dictate the row count of the same record.
    #[error(
        "Attempted to flatten conflicting lists: the fields {fields:?} are all list-backed at the same record level. Exclude all but one, or flatten with the `Available` list strategy."
    )]
    AmbiguousListJoin { fields: Vec<String> },

    /// Outer joins across lists are not implemented.
    #[error("Outer join is not yet implemented; only inner joins can be flattened.")]
    UnsupportedJoin,

    /// Column name resolution could not produce unique keys.
    #[error("Resolved column names were not unique: `{name}` was produced more than once.")]
    DuplicateColumnName { name: String },

    /// A buffer was accessed past its logical size.
    #[error("Index {index} is out of bounds for a buffer of logical size {size}.")]
    IndexOutOfRange { index: usize, size: usize },

    /// A dense sequence does not match the not-null count of the null track it is aligned with.
    #[error("Misaligned values: expected {expected} dense entries but found {found}.")]
    MisalignedValues { expected: usize, found: usize },

    /// Null positions are not strictly increasing or lie outside the logical sequence.
    #[error("Invalid null position {position} for a sequence of logical size {size}.")]
    InvalidNullPosition { position: usize, size: usize },

    /// A record was assembled with the same field name twice.
    #[error("The field `{name}` appears more than once in the same record.")]
    DuplicateFieldName { name: String },

    /// A selection path names a field that does not exist in the tree.
    #[error("The selection path `{path}` cannot be resolved: there is no field `{field}` at that position.")]
    UnknownField { path: String, field: String },

    /// A value was classified as primitive but no primitive could be extracted from it.
    #[error("A value was classified as primitive but could not be extracted as one.")]
    UnsupportedPrimitive,

    /// JSON input could not be parsed.
    #[error("Invalid JSON input: {0}")]
    Json(String),
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::Json(value.to_string())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
