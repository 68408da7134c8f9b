//! The columnar node tree.
//!
//! Each position of a nested schema is one [`Node`]. A node starts as [`Node::Incomplete`] and is
//! promoted in place to a record, list or primitive node the first time a non-null value reaches
//! it; its [`NullTrack`] is carried over so earlier null rows are preserved.
//!
//! Row layout
//! - A node's null track has one entry per row of its parent's *not-null* rows (the root has one
//!   entry per ingested value).
//! - Record fields therefore have `size == record.not_null_size()`.
//! - A list index has one length per not-null list row; the element node has one row per element,
//!   i.e. `element.size() == index.child_len()`.
//! - Primitive values are dense: `values.len() == not_null_size()`.
//!
//! Decoders that produce already-decoded columns can assemble a tree with [`Node::record`],
//! [`Node::list_of`] and [`Node::primitive`]; these validate the layout above.
use std::collections::BTreeMap;

use strum::{EnumDiscriminants, EnumIs, EnumTryAs};

use crate::{
    index::Index,
    nulls::NullTrack,
    primitive::{PrimitiveKind, PrimitiveValues},
    utils::{Error, Result},
};

/// One position of the tree.
#[derive(Debug, Clone, PartialEq, EnumIs, EnumTryAs, EnumDiscriminants)]
#[strum_discriminants(derive(Hash, PartialOrd, Ord))]
#[strum_discriminants(name(NodeKind))]
#[strum_discriminants(vis(pub))]
pub enum Node {
    /// No value has been observed at this position yet, only nulls (if anything).
    Incomplete(NullTrack),
    Record(RecordNode),
    List(ListNode),
    Primitive(PrimitiveNode),
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            NodeKind::Incomplete => "incomplete",
            NodeKind::Record => "record",
            NodeKind::List => "list",
            NodeKind::Primitive => "primitive",
        };
        f.write_str(name)
    }
}

impl Default for Node {
    fn default() -> Self {
        Node::Incomplete(NullTrack::new())
    }
}

/// Named fields sharing the rows of their record. Field order is insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordNode {
    fields: Vec<(String, Node)>,
    positions: BTreeMap<String, usize>,
    nulls: NullTrack,
}

impl RecordNode {
    pub(crate) fn with_nulls(nulls: NullTrack) -> Self {
        Self {
            fields: Vec::new(),
            positions: BTreeMap::new(),
            nulls,
        }
    }

    #[inline]
    pub fn nulls(&self) -> &NullTrack {
        &self.nulls
    }

    /// Number of fields.
    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.fields.iter().map(|(name, node)| (name.as_str(), node))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn field(&self, name: &str) -> Option<&Node> {
        self.positions.get(name).map(|&i| &self.fields[i].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    pub(crate) fn fields_mut(&mut self) -> impl Iterator<Item = (&str, &mut Node)> {
        self.fields
            .iter_mut()
            .map(|(name, node)| (name.as_str(), node))
    }

    pub(crate) fn nulls_mut(&mut self) -> &mut NullTrack {
        &mut self.nulls
    }

    /// Field `name`, registering it first if it is new. A new field starts with one null per
    /// record row accepted before it, so it stays aligned with its siblings.
    pub(crate) fn field_or_insert(&mut self, name: &str) -> &mut Node {
        let position = match self.positions.get(name) {
            Some(&position) => position,
            None => {
                let mut nulls = NullTrack::new();
                for _ in 0..self.nulls.not_null_size() {
                    nulls.add_null();
                }
                let position = self.fields.len();
                self.positions.insert(name.to_string(), position);
                self.fields.push((name.to_string(), Node::Incomplete(nulls)));
                position
            }
        };
        &mut self.fields[position].1
    }
}

/// All elements of all lists at one position, sharing a single element subtree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListNode {
    element: Box<Node>,
    index: Index,
    nulls: NullTrack,
}

impl ListNode {
    pub(crate) fn with_nulls(nulls: NullTrack) -> Self {
        Self {
            element: Box::default(),
            index: Index::new(),
            nulls,
        }
    }

    #[inline]
    pub fn nulls(&self) -> &NullTrack {
        &self.nulls
    }

    /// The shared element subtree.
    #[inline]
    pub fn element(&self) -> &Node {
        &self.element
    }

    /// Per-row list lengths, one per not-null row.
    #[inline]
    pub fn index(&self) -> &Index {
        &self.index
    }

    pub(crate) fn element_mut(&mut self) -> &mut Node {
        &mut self.element
    }

    pub(crate) fn index_mut(&mut self) -> &mut Index {
        &mut self.index
    }

    pub(crate) fn nulls_mut(&mut self) -> &mut NullTrack {
        &mut self.nulls
    }
}

/// Dense scalar values of one position.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveNode {
    values: PrimitiveValues,
    nulls: NullTrack,
}

impl PrimitiveNode {
    pub(crate) fn with_nulls(kind: PrimitiveKind, nulls: NullTrack) -> Self {
        Self {
            values: PrimitiveValues::new(kind),
            nulls,
        }
    }

    #[inline]
    pub fn nulls(&self) -> &NullTrack {
        &self.nulls
    }

    #[inline]
    pub fn values(&self) -> &PrimitiveValues {
        &self.values
    }

    #[inline]
    pub fn kind(&self) -> PrimitiveKind {
        self.values.kind()
    }

    pub(crate) fn values_mut(&mut self) -> &mut PrimitiveValues {
        &mut self.values
    }

    pub(crate) fn nulls_mut(&mut self) -> &mut NullTrack {
        &mut self.nulls
    }
}

impl Node {
    /// A node that has only seen the rows recorded in `nulls`, all of which must be null.
    pub fn incomplete(nulls: NullTrack) -> Result<Node> {
        if nulls.not_null_size() != 0 {
            return Err(Error::MisalignedValues {
                expected: 0,
                found: nulls.not_null_size(),
            });
        }
        Ok(Node::Incomplete(nulls))
    }

    /// Assemble a record from decoded fields. Every field must have one row per not-null record row.
    pub fn record(
        fields: impl IntoIterator<Item = (String, Node)>,
        nulls: NullTrack,
    ) -> Result<Node> {
        let mut record = RecordNode::with_nulls(nulls);
        for (name, node) in fields {
            if record.contains(&name) {
                return Err(Error::DuplicateFieldName { name });
            }
            if node.size() != record.nulls.not_null_size() {
                return Err(Error::MisalignedValues {
                    expected: record.nulls.not_null_size(),
                    found: node.size(),
                });
            }
            record.positions.insert(name.clone(), record.fields.len());
            record.fields.push((name, node));
        }
        Ok(Node::Record(record))
    }

    /// Assemble a list from a decoded element subtree and per-row lengths.
    pub fn list_of(element: Node, index: Index, nulls: NullTrack) -> Result<Node> {
        if index.len() != nulls.not_null_size() {
            return Err(Error::MalformedIndex {
                expected: nulls.not_null_size(),
                found: index.len(),
            });
        }
        if index.child_len() != element.size() {
            return Err(Error::MalformedIndex {
                expected: element.size(),
                found: index.child_len(),
            });
        }
        Ok(Node::List(ListNode {
            element: Box::new(element),
            index,
            nulls,
        }))
    }

    /// Assemble a primitive position from dense decoded values.
    pub fn primitive(values: PrimitiveValues, nulls: NullTrack) -> Result<Node> {
        if values.len() != nulls.not_null_size() {
            return Err(Error::MisalignedValues {
                expected: nulls.not_null_size(),
                found: values.len(),
            });
        }
        Ok(Node::Primitive(PrimitiveNode { values, nulls }))
    }

    #[inline]
    pub fn kind(&self) -> NodeKind {
        NodeKind::from(self)
    }

    pub fn nulls(&self) -> &NullTrack {
        match self {
            Node::Incomplete(nulls) => nulls,
            Node::Record(record) => record.nulls(),
            Node::List(list) => list.nulls(),
            Node::Primitive(primitive) => primitive.nulls(),
        }
    }

    pub(crate) fn nulls_mut(&mut self) -> &mut NullTrack {
        match self {
            Node::Incomplete(nulls) => nulls,
            Node::Record(record) => record.nulls_mut(),
            Node::List(list) => list.nulls_mut(),
            Node::Primitive(primitive) => primitive.nulls_mut(),
        }
    }

    /// Number of logical rows at this position.
    #[inline]
    pub fn size(&self) -> usize {
        self.nulls().size()
    }

    #[inline]
    pub fn null_indices(&self) -> &[usize] {
        self.nulls().null_indices()
    }

    /// Field names of a record node; empty for every other kind.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.try_as_record_ref()
            .into_iter()
            .flat_map(|record| record.field_names())
    }

    /// Field `name` of a record node.
    pub fn field(&self, name: &str) -> Option<&Node> {
        self.try_as_record_ref()?.field(name)
    }

    /// Values of a primitive node.
    pub fn values(&self) -> Option<&PrimitiveValues> {
        self.try_as_primitive_ref().map(PrimitiveNode::values)
    }

    /// Element subtree of a list node.
    pub fn list(&self) -> Option<&Node> {
        self.try_as_list_ref().map(ListNode::element)
    }

    /// Lengths of a list node.
    pub fn index(&self) -> Option<&Index> {
        self.try_as_list_ref().map(ListNode::index)
    }

    /// Follow a dotted field path, passing through list elements transparently.
    ///
    /// ```
    /// use colnest::json::from_json_str;
    ///
    /// let node = from_json_str(r#"{"d": [{"b": 1.0}, {"b": 2.0}]}"#).unwrap();
    /// assert_eq!(node.get("d.b").unwrap().size(), 2);
    /// assert!(node.get("d.c").is_none());
    /// ```
    pub fn get(&self, path: &str) -> Option<&Node> {
        let mut node = self;
        for segment in path.split('.') {
            while let Node::List(list) = node {
                node = list.element();
            }
            node = node.field(segment)?;
        }
        Some(node)
    }

    /// Verify the row layout of the whole subtree.
    pub fn check(&self) -> Result<()> {
        match self {
            Node::Incomplete(nulls) => {
                if nulls.not_null_size() != 0 {
                    return Err(Error::MisalignedValues {
                        expected: 0,
                        found: nulls.not_null_size(),
                    });
                }
            }
            Node::Record(record) => {
                for (_, field) in record.fields() {
                    if field.size() != record.nulls.not_null_size() {
                        return Err(Error::MisalignedValues {
                            expected: record.nulls.not_null_size(),
                            found: field.size(),
                        });
                    }
                    field.check()?;
                }
            }
            Node::List(list) => {
                if list.index.len() != list.nulls.not_null_size() {
                    return Err(Error::MalformedIndex {
                        expected: list.nulls.not_null_size(),
                        found: list.index.len(),
                    });
                }
                if list.index.child_len() != list.element.size() {
                    return Err(Error::MalformedIndex {
                        expected: list.element.size(),
                        found: list.index.child_len(),
                    });
                }
                list.element.check()?;
            }
            Node::Primitive(primitive) => {
                if primitive.values.len() != primitive.nulls.not_null_size() {
                    return Err(Error::MisalignedValues {
                        expected: primitive.nulls.not_null_size(),
                        found: primitive.values.len(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Render the schema as an indented field tree.
    ///
    /// Each record field is one `- name suffix` line, where the suffix shows `[]` per list level
    /// followed by the primitive kind. Fields of nested records are indented by four spaces.
    ///
    /// ```
    /// use colnest::json::from_json_str;
    ///
    /// let node = from_json_str(r#"{"d": [{"b": [1.0]}], "e": 2.0}"#).unwrap();
    /// assert_eq!(node.info(), "- d []\n    - b []f64\n- e f64");
    /// ```
    pub fn info(&self) -> String {
        let mut lines = Vec::new();
        match self.suffix() {
            (_, Some(record)) => render_fields(record, 0, &mut lines),
            (suffix, None) => lines.push(suffix),
        }
        lines.join("\n")
    }

    /// List markers and primitive kind of this position, and the record it ends in, if any.
    fn suffix(&self) -> (String, Option<&RecordNode>) {
        match self {
            Node::Incomplete(_) => (String::new(), None),
            Node::Record(record) => (String::new(), Some(record)),
            Node::Primitive(primitive) => (primitive.kind().to_string(), None),
            Node::List(list) => {
                let (inner, record) = list.element.suffix();
                (format!("[]{inner}"), record)
            }
        }
    }
}

fn render_fields(record: &RecordNode, indent: usize, lines: &mut Vec<String>) {
    for (name, node) in record.fields() {
        let (suffix, nested) = node.suffix();
        let line = format!("{:indent$}- {name} {suffix}", "");
        lines.push(line.trim_end().to_string());
        if let Some(nested) = nested {
            render_fields(nested, indent + 4, lines);
        }
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.info())
    }
}
