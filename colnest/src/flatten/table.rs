use super::ColumnKey;
use crate::{
    column::Column,
    utils::{Error, Result},
};

/// Named, equal-length columns in output order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatTable {
    columns: Vec<(ColumnKey, Column)>,
}

impl FlatTable {
    /// Fails if column lengths differ or a key appears twice.
    pub fn new(columns: Vec<(ColumnKey, Column)>) -> Result<Self> {
        if let Some((_, first)) = columns.first() {
            if let Some((_, column)) = columns.iter().find(|(_, c)| c.len() != first.len()) {
                return Err(Error::MisalignedValues {
                    expected: first.len(),
                    found: column.len(),
                });
            }
        }
        for (i, (key, _)) in columns.iter().enumerate() {
            if columns[..i].iter().any(|(other, _)| other == key) {
                return Err(Error::DuplicateColumnName {
                    name: key.to_string(),
                });
            }
        }
        Ok(Self { columns })
    }

    /// Shared length of all columns; zero for a table without columns.
    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, |(_, column)| column.len())
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column keyed by the plain name `name`.
    pub fn get(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find_map(|(key, column)| match key {
            ColumnKey::Name(n) if n == name => Some(column),
            _ => None,
        })
    }

    pub fn get_key(&self, key: &ColumnKey) -> Option<&Column> {
        self.columns
            .iter()
            .find_map(|(k, column)| (k == key).then_some(column))
    }

    pub fn keys(&self) -> impl Iterator<Item = &ColumnKey> {
        self.columns.iter().map(|(key, _)| key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ColumnKey, &Column)> {
        self.columns.iter().map(|(key, column)| (key, column))
    }

    pub fn into_columns(self) -> Vec<(ColumnKey, Column)> {
        self.columns
    }
}
