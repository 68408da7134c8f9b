//! Columnar storage and flattening of schema-varying nested data.
//!
//! Values are ingested row by row into a tree of [`node::Node`]s whose shape is inferred as data
//! arrives: records, lists and typed primitive positions, each tracking its own null rows. The tree
//! can then be flattened into a table of named, equal-length [`column::Column`]s, choosing one list
//! dimension as the row granularity. Most consumers start from [`json::from_json_str`] or a
//! [`builder::TreeBuilder`] and finish with [`node::Node::flatten`].

pub mod buffer;
pub mod builder;
pub mod clusion;
pub mod column;
pub mod flatten;
pub mod handoff;
pub mod index;
pub mod json;
pub mod node;
pub mod nulls;
pub mod primitive;
pub mod utils;

pub use utils::{Error, Result};
