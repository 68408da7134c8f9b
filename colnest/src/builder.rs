//! Incremental, schema-inferring construction of a node tree.
//!
//! The builder is independent of any particular host representation: it only talks to values
//! through a [`Converter`], which classifies a value and extracts its fields, elements or scalar.
//! Every call to [`build`] appends exactly one row to the node it is given, promoting incomplete
//! nodes as values are observed and keeping all positions of the tree aligned:
//!
//! - a field seen for the first time is back-filled with one null per record row accepted before it;
//! - a known field missing from a record value receives a null for that row;
//! - a null value records a null on the node itself only, since descendants store rows for
//!   not-null parent rows exclusively.
use std::{borrow::Cow, collections::BTreeSet};

use log::{debug, trace};
use strum::EnumIs;

use crate::{
    clusion::ColumnFilter,
    node::{ListNode, Node, NodeKind, PrimitiveNode, RecordNode},
    primitive::{Primitive, PrimitiveKind},
    utils::{Error, Result},
};

/// Structural class of a host value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIs)]
pub enum ValueClass {
    Null,
    Record,
    List,
    Primitive,
}

/// Capabilities the builder needs from a host value representation.
///
/// `Value<'v>` is a view of a host value borrowing from data that lives for `'v`; adapters may
/// also synthesize views (for instance key/value entries of a map). Extraction methods are only
/// called on values of the matching class: `field_names` and `extract_field` on records,
/// `extract_list` on lists and `extract_primitive` on primitives.
pub trait Converter {
    type Value<'v>;

    fn classify(&self, value: &Self::Value<'_>) -> ValueClass;

    /// Field names of a record value, in the order they should be registered.
    fn field_names<'v>(&self, value: &Self::Value<'v>) -> Vec<Cow<'v, str>>;

    /// Field `name` of a record value. `None` is treated as a null field.
    fn extract_field<'v>(&self, value: &Self::Value<'v>, name: &str) -> Option<Self::Value<'v>>;

    /// Elements of a list value, in order.
    fn extract_list<'v>(&self, value: &Self::Value<'v>) -> Vec<Self::Value<'v>>;

    fn extract_primitive(&self, value: &Self::Value<'_>) -> Option<Primitive>;
}

/// Push-down selection state carried while descending the tree.
#[derive(Debug, Clone, Copy)]
struct Scope<'f> {
    filter: Option<&'f ColumnFilter>,
    implicit_include: bool,
}

impl<'f> Scope<'f> {
    fn root(filter: Option<&'f ColumnFilter>) -> Self {
        Scope {
            filter,
            implicit_include: filter.is_none_or(|f| !f.has_includes()),
        }
    }

    /// Scope of field `name`, or `None` when nothing below the field can be included.
    fn field(&self, name: &str) -> Option<Scope<'f>> {
        let included = self
            .filter
            .map_or(self.implicit_include, |f| f.included(self.implicit_include));
        let filter = self.filter.and_then(|f| f.field(name));
        let reachable = match filter {
            Some(f) => f.included(included) || f.has_includes(),
            None => included,
        };
        reachable.then_some(Scope {
            filter,
            implicit_include: included,
        })
    }
}

/// Append one row holding `value` to `node`.
///
/// On error the rows committed before the failing value are left intact, but the failing row may be
/// partially written.
pub fn build<C: Converter>(converter: &C, value: &C::Value<'_>, node: &mut Node) -> Result<()> {
    build_scoped(converter, value, node, Scope::root(None))
}

fn build_scoped<C: Converter>(
    converter: &C,
    value: &C::Value<'_>,
    node: &mut Node,
    scope: Scope<'_>,
) -> Result<()> {
    match converter.classify(value) {
        ValueClass::Null => {
            node.nulls_mut().add_null();
            Ok(())
        }
        ValueClass::Record => build_record(converter, value, promote_record(node)?, scope),
        ValueClass::List => build_list(converter, value, promote_list(node)?, scope),
        ValueClass::Primitive => {
            let primitive = converter
                .extract_primitive(value)
                .ok_or(Error::UnsupportedPrimitive)?;
            let target = promote_primitive(node, primitive.kind())?;
            target.values_mut().push(primitive)?;
            target.nulls_mut().add_not_null();
            Ok(())
        }
    }
}

fn promote_record(node: &mut Node) -> Result<&mut RecordNode> {
    if let Node::Incomplete(nulls) = node {
        trace!("Promoting incomplete node with {} null rows to a record.", nulls.size());
        let nulls = std::mem::take(nulls);
        *node = Node::Record(RecordNode::with_nulls(nulls));
    }
    match node {
        Node::Record(record) => Ok(record),
        other => Err(Error::InconsistentSchema {
            expected: other.kind(),
            found: NodeKind::Record,
        }),
    }
}

fn promote_list(node: &mut Node) -> Result<&mut ListNode> {
    if let Node::Incomplete(nulls) = node {
        trace!("Promoting incomplete node with {} null rows to a list.", nulls.size());
        let nulls = std::mem::take(nulls);
        *node = Node::List(ListNode::with_nulls(nulls));
    }
    match node {
        Node::List(list) => Ok(list),
        other => Err(Error::InconsistentSchema {
            expected: other.kind(),
            found: NodeKind::List,
        }),
    }
}

/// The primitive kind of a position is fixed by the first value it receives.
fn promote_primitive(node: &mut Node, kind: PrimitiveKind) -> Result<&mut PrimitiveNode> {
    if let Node::Incomplete(nulls) = node {
        trace!("Promoting incomplete node with {} null rows to {kind}.", nulls.size());
        let nulls = std::mem::take(nulls);
        *node = Node::Primitive(PrimitiveNode::with_nulls(kind, nulls));
    }
    match node {
        Node::Primitive(primitive) => Ok(primitive),
        other => Err(Error::InconsistentSchema {
            expected: other.kind(),
            found: NodeKind::Primitive,
        }),
    }
}

fn build_record<C: Converter>(
    converter: &C,
    value: &C::Value<'_>,
    record: &mut RecordNode,
    scope: Scope<'_>,
) -> Result<()> {
    let names = converter.field_names(value);
    let mut seen = BTreeSet::new();
    for name in &names {
        let name: &str = name;
        let Some(field_scope) = scope.field(name) else {
            debug!("Skipping field `{name}` excluded by the column filter.");
            continue;
        };
        if !seen.insert(name) {
            continue;
        }
        if !record.contains(name) {
            debug!(
                "Discovered field `{name}` after {} rows; back-filling nulls.",
                record.nulls().not_null_size()
            );
        }
        let child = record.field_or_insert(name);
        match converter.extract_field(value, name) {
            Some(field) => build_scoped(converter, &field, child, field_scope)?,
            None => child.nulls_mut().add_null(),
        }
    }

    for (name, child) in record.fields_mut() {
        if !seen.contains(name) {
            child.nulls_mut().add_null();
        }
    }
    record.nulls_mut().add_not_null();
    Ok(())
}

fn build_list<C: Converter>(
    converter: &C,
    value: &C::Value<'_>,
    list: &mut ListNode,
    scope: Scope<'_>,
) -> Result<()> {
    let elements = converter.extract_list(value);
    list.index_mut().add_list(elements.len());
    for element in &elements {
        build_scoped(converter, element, list.element_mut(), scope)?;
    }
    list.nulls_mut().add_not_null();
    Ok(())
}

/// Accumulates rows into a single tree, one root row per pushed value.
///
/// ```
/// use colnest::{builder::TreeBuilder, json::JsonConverter};
/// use serde_json::json;
///
/// let mut builder = TreeBuilder::new(JsonConverter::default());
/// builder.push(&json!({"a": 1})).unwrap();
/// builder.push(&json!({"a": 2, "b": "x"})).unwrap();
/// let root = builder.finish();
/// assert_eq!(root.size(), 2);
/// assert_eq!(root.get("b").unwrap().null_indices(), &[0]);
/// ```
pub struct TreeBuilder<C: Converter> {
    converter: C,
    filter: Option<ColumnFilter>,
    root: Node,
}

impl<C: Converter> TreeBuilder<C> {
    pub fn new(converter: C) -> Self {
        Self {
            converter,
            filter: None,
            root: Node::default(),
        }
    }

    /// Skip record fields that the filter can never include.
    pub fn with_filter(mut self, filter: ColumnFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn converter(&self) -> &C {
        &self.converter
    }

    /// The tree built so far.
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Append one root row.
    pub fn push<'v>(&mut self, value: impl Into<C::Value<'v>>) -> Result<()> {
        let value: C::Value<'v> = value.into();
        let scope = Scope::root(self.filter.as_ref());
        build_scoped(&self.converter, &value, &mut self.root, scope)
    }

    /// Append one root row per value.
    pub fn extend<'v, I>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<C::Value<'v>>,
    {
        for value in values {
            self.push(value)?;
        }
        Ok(())
    }

    pub fn finish(self) -> Node {
        self.root
    }
}
