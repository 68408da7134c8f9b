//! Include/exclude selection trees over dotted field paths.
//!
//! A selection is written as a [`ClusionSpec`]: a dotted path (`"a.b.c"`), a sequence of specs, a
//! mapping from path to sub-spec, or nothing at all. [`Clusion::parse`] turns it into a
//! [`Clusion`] tree whose `explicit` flags mark the selected positions. An include tree and an
//! exclude tree are then combined into a [`ColumnFilter`], the artifact handed to decoders and to
//! the tree builder so that unselected subtrees are never materialized.
//!
//! ```
//! use colnest::clusion::{Clusion, ClusionSpec, ColumnFilter};
//!
//! let include = Clusion::parse(&ClusionSpec::from("a.b")).unwrap();
//! let exclude = Clusion::parse(&ClusionSpec::from("a.b.c")).unwrap();
//! let filter = ColumnFilter::combine(&include, &exclude).unwrap();
//!
//! let b = filter.field("a").and_then(|a| a.field("b")).unwrap();
//! assert!(b.explicitly_include());
//! assert!(b.field("c").unwrap().explicitly_exclude());
//! ```
use std::collections::{BTreeMap, BTreeSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::utils::{Error, Result};

/// Separator between the segments of a selection path.
pub const PATH_SEPARATOR: char = '.';

static NEUTRAL: Clusion = Clusion {
    explicit: false,
    leaves: BTreeMap::new(),
};

/// A selection tree. `explicit` selects this position and everything below it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Clusion {
    pub explicit: bool,
    pub leaves: BTreeMap<String, Clusion>,
}

/// User-facing description of a selection.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(untagged))]
pub enum ClusionSpec {
    /// Nothing selected.
    None,
    /// A dotted path selecting its deepest segment.
    Path(String),
    /// The union of several specs.
    Seq(Vec<ClusionSpec>),
    /// For each dotted path, the sub-selection below its deepest segment.
    Map(BTreeMap<String, ClusionSpec>),
}

impl From<&str> for ClusionSpec {
    fn from(value: &str) -> Self {
        ClusionSpec::Path(value.to_string())
    }
}

impl From<String> for ClusionSpec {
    fn from(value: String) -> Self {
        ClusionSpec::Path(value)
    }
}

impl<T: Into<ClusionSpec>> From<Vec<T>> for ClusionSpec {
    fn from(value: Vec<T>) -> Self {
        ClusionSpec::Seq(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<ClusionSpec>> From<Option<T>> for ClusionSpec {
    fn from(value: Option<T>) -> Self {
        value.map_or(ClusionSpec::None, Into::into)
    }
}

impl<K: Into<String>, T: Into<ClusionSpec>> FromIterator<(K, T)> for ClusionSpec {
    fn from_iter<I: IntoIterator<Item = (K, T)>>(iter: I) -> Self {
        ClusionSpec::Map(
            iter.into_iter()
                .map(|(path, spec)| (path.into(), spec.into()))
                .collect(),
        )
    }
}

impl Clusion {
    /// Selects nothing.
    pub fn neutral() -> Self {
        Self::default()
    }

    /// Selects this position and everything below it.
    pub fn universal() -> Self {
        Self {
            explicit: true,
            leaves: BTreeMap::new(),
        }
    }

    pub fn parse(spec: &ClusionSpec) -> Result<Self> {
        match spec {
            ClusionSpec::None => Ok(Self::neutral()),
            ClusionSpec::Path(path) => Self::chain(path, Self::universal()),
            ClusionSpec::Seq(specs) => {
                let parsed = specs.iter().map(Self::parse).collect::<Result<Vec<_>>>()?;
                Ok(Self::merge(parsed))
            }
            ClusionSpec::Map(entries) if entries.is_empty() => Ok(Self::universal()),
            ClusionSpec::Map(entries) => {
                let roots = entries
                    .iter()
                    .map(|(path, sub)| Self::chain(path, Self::parse(sub)?))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Self::merge(roots))
            }
        }
    }

    /// A chain of single-child trees following `path`, with `leaf` attached at its deepest segment.
    fn chain(path: &str, leaf: Clusion) -> Result<Self> {
        let segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(Error::EmptyFieldName {
                path: path.to_string(),
            });
        }
        Ok(segments.into_iter().rev().fold(leaf, |child, segment| Clusion {
            explicit: false,
            leaves: BTreeMap::from([(segment.to_string(), child)]),
        }))
    }

    /// Union of selections. Merging no trees at all yields the universal selection.
    pub fn merge(trees: impl IntoIterator<Item = Clusion>) -> Self {
        let mut any = false;
        let mut explicit = false;
        let mut grouped: BTreeMap<String, Vec<Clusion>> = BTreeMap::new();
        for tree in trees {
            any = true;
            explicit |= tree.explicit;
            for (name, leaf) in tree.leaves {
                grouped.entry(name).or_default().push(leaf);
            }
        }
        if !any {
            return Self::universal();
        }

        Clusion {
            explicit,
            leaves: grouped
                .into_iter()
                .map(|(name, group)| (name, Self::merge(group)))
                .collect(),
        }
    }
}

/// Per-position include/exclude flags, derived from an include and an exclude [`Clusion`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ColumnFilter {
    include: bool,
    exclude: bool,
    fields: BTreeMap<String, ColumnFilter>,
}

impl ColumnFilter {
    pub fn new(
        include: bool,
        exclude: bool,
        fields: BTreeMap<String, ColumnFilter>,
    ) -> Result<Self> {
        if include && exclude {
            return Err(Error::ConflictingClusion {
                path: String::new(),
            });
        }
        Ok(Self {
            include,
            exclude,
            fields,
        })
    }

    /// Combine an include tree and an exclude tree. Fails if any position is explicitly both.
    pub fn combine(include: &Clusion, exclude: &Clusion) -> Result<Self> {
        let mut path = Vec::new();
        Self::combine_at(include, exclude, &mut path)
    }

    /// Parse and combine two selection specs.
    pub fn from_specs(include: &ClusionSpec, exclude: &ClusionSpec) -> Result<Self> {
        Self::combine(&Clusion::parse(include)?, &Clusion::parse(exclude)?)
    }

    fn combine_at<'a>(
        include: &'a Clusion,
        exclude: &'a Clusion,
        path: &mut Vec<&'a str>,
    ) -> Result<Self> {
        if include.explicit && exclude.explicit {
            return Err(Error::ConflictingClusion {
                path: path.join("."),
            });
        }

        let names: BTreeSet<&'a String> = include.leaves.keys().chain(exclude.leaves.keys()).collect();
        let mut fields = BTreeMap::new();
        for name in names {
            path.push(name);
            let combined = Self::combine_at(
                include.leaves.get(name).unwrap_or(&NEUTRAL),
                exclude.leaves.get(name).unwrap_or(&NEUTRAL),
                path,
            );
            path.pop();
            fields.insert(name.clone(), combined?);
        }

        Ok(Self {
            include: include.explicit,
            exclude: exclude.explicit,
            fields,
        })
    }

    #[inline]
    pub fn explicitly_include(&self) -> bool {
        self.include
    }

    #[inline]
    pub fn explicitly_exclude(&self) -> bool {
        self.exclude
    }

    pub fn field(&self, name: &str) -> Option<&ColumnFilter> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &ColumnFilter)> {
        self.fields.iter().map(|(name, filter)| (name.as_str(), filter))
    }

    /// Whether this position or any position below it is explicitly included.
    pub fn has_includes(&self) -> bool {
        self.include || self.fields.values().any(ColumnFilter::has_includes)
    }

    /// Inclusion of this position given the inclusion inherited from its parent.
    #[inline]
    pub fn included(&self, implicit_include: bool) -> bool {
        self.include || (implicit_include && !self.exclude)
    }
}
