//! Column key resolution.
//!
//! Flattening labels every column with its field path, leaf first. A [`NameStrategy`] turns these
//! paths into unique [`ColumnKey`]s.
use std::collections::{BTreeMap, HashSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::NameStrategy;
use crate::utils::{Error, Result};

/// Separator placed between path segments of a concatenated name.
pub const NAME_SEPARATOR: &str = "_";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(untagged))]
pub enum ColumnKey {
    Name(String),
    /// Root-first path segments, padded with empty strings.
    Tuple(Vec<String>),
}

impl std::fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnKey::Name(name) => f.write_str(name),
            ColumnKey::Tuple(segments) => write!(f, "({})", segments.join(", ")),
        }
    }
}

impl From<&str> for ColumnKey {
    fn from(value: &str) -> Self {
        ColumnKey::Name(value.to_string())
    }
}

/// Resolve leaf-first `paths` into unique keys, in the same order.
pub fn resolve_names(strategy: NameStrategy, paths: &[Vec<String>]) -> Result<Vec<ColumnKey>> {
    let keys: Vec<ColumnKey> = match strategy {
        NameStrategy::MultiIndex => {
            let width = paths.iter().map(Vec::len).max().unwrap_or(0);
            paths
                .iter()
                .map(|path| {
                    let mut segments: Vec<String> = path.iter().rev().cloned().collect();
                    segments.resize(width, String::new());
                    ColumnKey::Tuple(segments)
                })
                .collect()
        }
        NameStrategy::ConcatenateAlways => paths
            .iter()
            .map(|path| {
                let segments: Vec<&str> = path.iter().rev().map(String::as_str).collect();
                ColumnKey::Name(segments.join(NAME_SEPARATOR))
            })
            .collect(),
        NameStrategy::ConcatenateConflicts => concatenate_conflicts(paths, false),
        NameStrategy::ConcatenateConflictsVerbose => concatenate_conflicts(paths, true),
    };

    let mut seen = HashSet::new();
    for key in &keys {
        if !seen.insert(key) {
            return Err(Error::DuplicateColumnName {
                name: key.to_string(),
            });
        }
    }
    Ok(keys)
}

struct Resolving<'p> {
    resolved: String,
    pending: std::slice::Iter<'p, String>,
}

/// Start from the leaf names and, while names collide, pull in one more ancestor per colliding
/// column. In non-verbose mode an ancestor is only spliced in when it differs within the group.
fn concatenate_conflicts(paths: &[Vec<String>], verbose: bool) -> Vec<ColumnKey> {
    let mut columns: Vec<Resolving<'_>> = paths
        .iter()
        .map(|path| {
            let mut pending = path.iter();
            let resolved = pending.next().cloned().unwrap_or_default();
            Resolving { resolved, pending }
        })
        .collect();

    loop {
        let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (i, column) in columns.iter().enumerate() {
            groups.entry(column.resolved.clone()).or_default().push(i);
        }

        let mut settled = true;
        for members in groups.values().filter(|members| members.len() > 1) {
            let prefixes: Vec<&str> = members
                .iter()
                .map(|&i| columns[i].pending.next().map_or("", String::as_str))
                .collect();
            if members.iter().any(|&i| columns[i].pending.len() > 0) {
                settled = false;
            }

            let distinct = prefixes.iter().any(|prefix| *prefix != prefixes[0]);
            if !(distinct || verbose) {
                continue;
            }
            for (&i, prefix) in members.iter().zip(&prefixes) {
                let column = &mut columns[i];
                if column.resolved.is_empty() {
                    column.resolved = prefix.to_string();
                } else if !prefix.is_empty() {
                    column.resolved = format!("{prefix}{NAME_SEPARATOR}{}", column.resolved);
                }
            }
        }

        if settled {
            break;
        }
    }

    columns
        .into_iter()
        .map(|column| ColumnKey::Name(column.resolved))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(raw: &[&[&str]]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|path| path.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    fn names(keys: Vec<ColumnKey>) -> Vec<String> {
        keys.into_iter().map(|key| key.to_string()).collect()
    }

    #[test]
    fn test_conflicts_prefix_only_where_needed() {
        let paths = paths(&[&["a", "a"], &["a", "b"], &["c", "d"]]);
        let keys = resolve_names(NameStrategy::ConcatenateConflicts, &paths).unwrap();
        assert_eq!(names(keys), vec!["a_a", "b_a", "c"]);
    }

    #[test]
    fn test_always_concatenates_full_path() {
        let paths = paths(&[&["a", "a"], &["a", "b"], &["c", "d"]]);
        let keys = resolve_names(NameStrategy::ConcatenateAlways, &paths).unwrap();
        assert_eq!(names(keys), vec!["a_a", "b_a", "d_c"]);
    }

    #[test]
    fn test_uneven_depths_agree_across_strategies() {
        let paths = paths(&[&["b"], &["b", "a"], &["b", "a", "z"]]);
        for strategy in [
            NameStrategy::ConcatenateConflicts,
            NameStrategy::ConcatenateConflictsVerbose,
            NameStrategy::ConcatenateAlways,
        ] {
            let keys = resolve_names(strategy, &paths).unwrap();
            assert_eq!(names(keys), vec!["b", "a_b", "z_a_b"], "{strategy:?}");
        }
    }

    #[test]
    fn test_shared_ancestor_skipped_unless_verbose() {
        let paths = paths(&[&["d", "c", "a"], &["d", "c", "b"]]);
        let keys = resolve_names(NameStrategy::ConcatenateConflicts, &paths).unwrap();
        assert_eq!(names(keys), vec!["a_d", "b_d"]);

        let keys = resolve_names(NameStrategy::ConcatenateConflictsVerbose, &paths).unwrap();
        assert_eq!(names(keys), vec!["a_c_d", "b_c_d"]);
    }

    #[test]
    fn test_indistinguishable_paths_fail() {
        let paths = paths(&[&["b"], &["b"]]);
        let err = resolve_names(NameStrategy::ConcatenateConflicts, &paths).unwrap_err();
        assert!(err.is_duplicate_column_name());
    }

    #[test]
    fn test_multi_index_pads_short_paths() {
        let paths = paths(&[&["c", "a"], &["b"]]);
        let keys = resolve_names(NameStrategy::MultiIndex, &paths).unwrap();
        assert_eq!(
            keys,
            vec![
                ColumnKey::Tuple(vec!["a".into(), "c".into()]),
                ColumnKey::Tuple(vec!["b".into(), String::new()]),
            ]
        );
    }

    #[test]
    fn test_root_column_is_unnamed() {
        let keys = resolve_names(NameStrategy::ConcatenateConflicts, &[Vec::new()]).unwrap();
        assert_eq!(keys, vec![ColumnKey::Name(String::new())]);
    }
}
