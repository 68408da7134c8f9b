//! Reshaping a node tree into named, equal-length columns.
//!
//! Flattening walks the tree once, bottom-up. Every included primitive position contributes one
//! column; records label their children's columns with the field name and align them to their own
//! rows; lists contribute a range index that decides the row granularity of everything above them.
//! At most one list dimension may survive at each record level: the [`ListStrategy`] decides whether
//! competing lists are an error or are dropped.
//!
//! Positions are selected with [`Selector`]s. A dotted path is resolved against the tree once,
//! before the walk, into a [`NodePath`]; the walk then compares the path of each visited node
//! against the resolved include and exclude sets.
//!
//! ```
//! use colnest::{flatten::FlattenOptions, json::from_json_str};
//!
//! let node = from_json_str(r#"{"a": 1.0, "b": [{"c": 1}, {"c": 2}]}"#).unwrap();
//! let table = node.flatten(&FlattenOptions::default()).unwrap();
//! assert_eq!(table.num_rows(), 2);
//! assert_eq!(table.get("a").unwrap().try_as_float_ref().unwrap(), &vec![1.0, 1.0]);
//! assert_eq!(table.get("c").unwrap().try_as_int_ref().unwrap(), &vec![1, 2]);
//! ```
pub mod names;
pub mod table;

use std::collections::HashSet;

use log::{debug, trace};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{
    column::Column,
    index::Index,
    node::{ListNode, Node, RecordNode},
    nulls::NullTrack,
    utils::{Error, Result},
};

pub use names::{ColumnKey, NAME_SEPARATOR};
pub use table::FlatTable;

/// Which list dimensions are flattened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ListStrategy {
    /// Only descend into lists that are explicitly included.
    ///
    /// A dotted path selects the outermost list of a field. Inner levels of a list of lists can
    /// only be included with a [`Selector::Node`] path ending in [`PathStep::Element`].
    Explicit,
    /// Descend into every list, dropping list-backed fields that compete at the same record level.
    Available,
    /// Descend into every list; competing list-backed fields are an error.
    #[default]
    All,
}

/// How leaf-first column paths are turned into column keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NameStrategy {
    /// Use the leaf name, prefixing ancestors only where needed to tell columns apart.
    #[default]
    ConcatenateConflicts,
    /// Like [`NameStrategy::ConcatenateConflicts`], but also prefix ancestors shared by the
    /// conflicting columns.
    ConcatenateConflictsVerbose,
    /// Join the full path from the root.
    ConcatenateAlways,
    /// One tuple per column holding the path from the root, padded with empty strings.
    MultiIndex,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum JoinKind {
    /// Rows are produced only for existing elements of the deepest flattened list.
    #[default]
    Inner,
    /// Not supported.
    Outer,
}

/// One step from a node to one of its children.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PathStep {
    /// The value of a record field.
    Field(String),
    /// The shared element subtree of a list.
    Element,
}

/// Structural address of a node, relative to the root of its tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodePath {
    steps: SmallVec<[PathStep; 4]>,
}

impl NodePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn push(&mut self, step: PathStep) {
        self.steps.push(step);
    }

    pub fn pop(&mut self) -> Option<PathStep> {
        self.steps.pop()
    }

    /// Resolve a dotted field path against `root`, passing through list elements transparently.
    ///
    /// The resulting path addresses the node holding the value of the last field.
    pub fn parse(root: &Node, path: &str) -> Result<NodePath> {
        let mut resolved = NodePath::root();
        let mut node = root;
        for segment in path.split('.') {
            if segment.is_empty() {
                return Err(Error::EmptyFieldName {
                    path: path.to_string(),
                });
            }
            while let Node::List(list) = node {
                resolved.push(PathStep::Element);
                node = list.element();
            }
            node = node.field(segment).ok_or_else(|| Error::UnknownField {
                path: path.to_string(),
                field: segment.to_string(),
            })?;
            resolved.push(PathStep::Field(segment.to_string()));
        }
        Ok(resolved)
    }

    /// The node this path addresses in `root`, if any.
    pub fn resolve<'n>(&self, root: &'n Node) -> Option<&'n Node> {
        self.steps.iter().try_fold(root, |node, step| match step {
            PathStep::Field(name) => node.field(name),
            PathStep::Element => node.list(),
        })
    }
}

impl FromIterator<PathStep> for NodePath {
    fn from_iter<I: IntoIterator<Item = PathStep>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().collect(),
        }
    }
}

impl std::fmt::Display for NodePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for step in &self.steps {
            match step {
                PathStep::Field(name) if first => write!(f, "{name}")?,
                PathStep::Field(name) => write!(f, ".{name}")?,
                PathStep::Element => f.write_str("[]")?,
            }
            first = false;
        }
        Ok(())
    }
}

/// Selects one position of the tree for inclusion or exclusion.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(untagged))]
pub enum Selector {
    /// A dotted field path, resolved with [`NodePath::parse`].
    Path(String),
    /// An already resolved position.
    Node(NodePath),
}

impl Selector {
    pub fn resolve(&self, root: &Node) -> Result<NodePath> {
        match self {
            Selector::Path(path) => NodePath::parse(root, path),
            Selector::Node(path) => Ok(path.clone()),
        }
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Selector::Path(path) => f.write_str(path),
            Selector::Node(path) => write!(f, "{path}"),
        }
    }
}

impl From<&str> for Selector {
    fn from(value: &str) -> Self {
        Selector::Path(value.to_string())
    }
}

impl From<String> for Selector {
    fn from(value: String) -> Self {
        Selector::Path(value)
    }
}

impl From<NodePath> for Selector {
    fn from(value: NodePath) -> Self {
        Selector::Node(value)
    }
}

/// Options of a single [`flatten`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct FlattenOptions {
    pub list_strategy: ListStrategy,
    pub name_strategy: NameStrategy,
    pub join: JoinKind,
    /// When empty, every position is included unless excluded.
    pub include: Vec<Selector>,
    pub exclude: Vec<Selector>,
}

impl FlattenOptions {
    pub fn with_list_strategy(mut self, list_strategy: ListStrategy) -> Self {
        self.list_strategy = list_strategy;
        self
    }

    pub fn with_name_strategy(mut self, name_strategy: NameStrategy) -> Self {
        self.name_strategy = name_strategy;
        self
    }

    pub fn with_join(mut self, join: JoinKind) -> Self {
        self.join = join;
        self
    }

    pub fn with_include<I, S>(mut self, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Selector>,
    {
        self.include.extend(selectors.into_iter().map(Into::into));
        self
    }

    pub fn with_exclude<I, S>(mut self, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Selector>,
    {
        self.exclude.extend(selectors.into_iter().map(Into::into));
        self
    }
}

/// Columns produced below one node, labelled leaf-first, and the index of the list dimension they
/// are expanded to, if any.
#[derive(Debug, Default)]
struct Partial {
    columns: Vec<(Vec<String>, Column)>,
    index: Option<Index>,
}

impl Partial {
    fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    fn label(&mut self, name: &str) {
        for (path, _) in &mut self.columns {
            path.push(name.to_string());
        }
    }
}

struct Flattener {
    strategy: ListStrategy,
    include: HashSet<NodePath>,
    exclude: HashSet<NodePath>,
}

impl Flattener {
    fn flatten(&self, node: &Node, path: &mut NodePath, implicit_include: bool) -> Result<Partial> {
        let explicit_include = self.include.contains(path);
        let explicit_exclude = self.exclude.contains(path);
        if explicit_include && explicit_exclude {
            return Err(Error::ConflictingClusion {
                path: path.to_string(),
            });
        }
        let included = explicit_include || (implicit_include && !explicit_exclude);

        match node {
            Node::Incomplete(_) => Ok(Partial::default()),
            Node::Primitive(primitive) if included => Ok(Partial {
                columns: vec![(
                    Vec::new(),
                    Column::from_values(primitive.values(), primitive.nulls())?,
                )],
                index: None,
            }),
            Node::Primitive(_) => Ok(Partial::default()),
            Node::Record(record) => self.flatten_record(record, path, included),
            Node::List(list) => {
                let descend = match self.strategy {
                    ListStrategy::All | ListStrategy::Available => true,
                    ListStrategy::Explicit => explicit_include,
                };
                if descend {
                    self.flatten_list(list, path, included)
                } else {
                    Ok(Partial::default())
                }
            }
        }
    }

    fn flatten_record(
        &self,
        record: &RecordNode,
        path: &mut NodePath,
        included: bool,
    ) -> Result<Partial> {
        let mut fields: Vec<(&str, Partial)> = Vec::new();
        for (name, child) in record.fields() {
            path.push(PathStep::Field(name.to_string()));
            let partial = self.flatten(child, path, included);
            path.pop();

            let mut partial = partial?;
            if !partial.is_empty() {
                partial.label(name);
                fields.push((name, partial));
            }
        }

        let lists: Vec<&str> = fields
            .iter()
            .filter(|(_, partial)| partial.index.is_some())
            .map(|(name, _)| *name)
            .collect();
        match lists.len() {
            0 => align_fields(fields, record.nulls()),
            1 => expand_fields(fields, record.nulls()),
            _ if self.strategy == ListStrategy::Available => {
                debug!("Dropping competing list-backed fields {lists:?} at `{path}`.");
                fields.retain(|(_, partial)| partial.index.is_none());
                align_fields(fields, record.nulls())
            }
            _ => Err(Error::AmbiguousListJoin {
                fields: lists.into_iter().map(str::to_string).collect(),
            }),
        }
    }

    fn flatten_list(&self, list: &ListNode, path: &mut NodePath, included: bool) -> Result<Partial> {
        path.push(PathStep::Element);
        let element = self.flatten(list.element(), path, included);
        path.pop();

        let element = element?;
        if element.is_empty() {
            return Ok(Partial::default());
        }
        let own = list.index().null_align(list.nulls())?;
        let index = match &element.index {
            Some(inner) => own.compose(inner)?,
            None => own,
        };
        Ok(Partial {
            columns: element.columns,
            index: Some(index),
        })
    }
}

/// Merge list-free fields, aligning every column to the record's own rows.
fn align_fields(fields: Vec<(&str, Partial)>, nulls: &NullTrack) -> Result<Partial> {
    let mut columns = Vec::new();
    for (_, partial) in fields {
        for (path, column) in partial.columns {
            columns.push((path, column.null_align(nulls)?));
        }
    }
    Ok(Partial {
        columns,
        index: None,
    })
}

/// Broadcast list-free fields to the granularity of the single list-backed field.
fn expand_fields(mut fields: Vec<(&str, Partial)>, nulls: &NullTrack) -> Result<Partial> {
    let Some((position, index)) = fields
        .iter_mut()
        .enumerate()
        .find_map(|(position, (_, partial))| partial.index.take().map(|index| (position, index)))
    else {
        return align_fields(fields, nulls);
    };

    let mut columns = Vec::new();
    for (i, (_, partial)) in fields.into_iter().enumerate() {
        if i == position {
            columns.extend(partial.columns);
            continue;
        }
        for (path, column) in partial.columns {
            columns.push((path, column.expand(&index)?));
        }
    }
    Ok(Partial {
        columns,
        index: Some(index.null_align(nulls)?),
    })
}

fn resolve_selectors(root: &Node, selectors: &[Selector]) -> Result<HashSet<NodePath>> {
    selectors.iter().map(|selector| selector.resolve(root)).collect()
}

/// Flatten `root` into a table.
pub fn flatten(root: &Node, options: &FlattenOptions) -> Result<FlatTable> {
    if options.join == JoinKind::Outer {
        return Err(Error::UnsupportedJoin);
    }

    // Identical selectors conflict whether or not they exist in this tree.
    if let Some(selector) = options
        .include
        .iter()
        .find(|selector| options.exclude.contains(selector))
    {
        return Err(Error::ConflictingClusion {
            path: selector.to_string(),
        });
    }

    let include = resolve_selectors(root, &options.include)?;
    let exclude = resolve_selectors(root, &options.exclude)?;
    if let Some(path) = include.intersection(&exclude).next() {
        return Err(Error::ConflictingClusion {
            path: path.to_string(),
        });
    }

    trace!(
        "Flattening with {:?}, {} included and {} excluded positions.",
        options.list_strategy,
        include.len(),
        exclude.len()
    );
    let flattener = Flattener {
        strategy: options.list_strategy,
        include,
        exclude,
    };
    let mut path = NodePath::root();
    let partial = flattener.flatten(root, &mut path, options.include.is_empty())?;

    let (paths, columns): (Vec<_>, Vec<_>) = partial.columns.into_iter().unzip();
    let keys = names::resolve_names(options.name_strategy, &paths)?;
    FlatTable::new(keys.into_iter().zip(columns).collect())
}

impl Node {
    /// Flatten this tree into a table. See [`flatten`].
    pub fn flatten(&self, options: &FlattenOptions) -> Result<FlatTable> {
        flatten(self, options)
    }
}
