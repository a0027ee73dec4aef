//! Row schema.
//!
//! A [`RowMetadata`] is owned by one pipeline run and handed to every node by
//! mutable reference, so actions that add, remove or rename columns change it
//! in place for all downstream nodes.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::ids::{format_column_id, parse_column_id};

/// Placeholder for column statistics computed by the analyzers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub empty: u64,
    #[serde(default)]
    pub invalid: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub statistics: Statistics,
}

impl ColumnMetadata {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            column_type: "string".to_string(),
            domain: String::new(),
            statistics: Statistics::default(),
        }
    }

    pub fn with_type(mut self, column_type: impl Into<String>) -> Self {
        self.column_type = column_type.into();
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowMetadata {
    columns: Vec<ColumnMetadata>,
}

impl RowMetadata {
    pub fn new(columns: Vec<ColumnMetadata>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[ColumnMetadata] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, id: &str) -> Option<&ColumnMetadata> {
        self.columns.iter().find(|c| c.id == id)
    }

    pub fn column_mut(&mut self, id: &str) -> Option<&mut ColumnMetadata> {
        self.columns.iter_mut().find(|c| c.id == id)
    }

    /// Next free column id: highest numeric id + 1, "0000" for an empty schema.
    ///
    /// Columns whose id is not numeric are ignored.
    pub fn next_column_id(&self) -> String {
        let next = self
            .columns
            .iter()
            .filter_map(|c| parse_column_id(&c.id).ok())
            .max()
            .map_or(0, |max| max + 1);
        format_column_id(next)
    }

    /// Append a column with a freshly allocated id and return that id.
    pub fn add_column(&mut self, name: impl Into<String>, column_type: impl Into<String>) -> String {
        let id = self.next_column_id();
        self.columns
            .push(ColumnMetadata::new(id.clone(), name).with_type(column_type));
        id
    }

    /// Insert a column right after `after_id` (or at the end when it is unknown).
    pub fn insert_after(&mut self, after_id: &str, column: ColumnMetadata) {
        match self.columns.iter().position(|c| c.id == after_id) {
            Some(index) => self.columns.insert(index + 1, column),
            None => self.columns.push(column),
        }
    }

    pub fn remove_column(&mut self, id: &str) -> Result<ColumnMetadata> {
        let index = self
            .columns
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| ModelError::UnknownColumn(id.to_string()))?;
        Ok(self.columns.remove(index))
    }

    pub fn rename_column(&mut self, id: &str, name: impl Into<String>) -> Result<()> {
        let column = self
            .column_mut(id)
            .ok_or_else(|| ModelError::UnknownColumn(id.to_string()))?;
        column.name = name.into();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RowMetadata {
        RowMetadata::new(vec![
            ColumnMetadata::new("0000", "id").with_type("integer"),
            ColumnMetadata::new("0001", "name"),
            ColumnMetadata::new("0002", "angle").with_type("double"),
        ])
    }

    #[test]
    fn allocates_next_column_id() {
        let mut metadata = sample();
        assert_eq!(metadata.next_column_id(), "0003");
        let id = metadata.add_column("angle_cos", "double");
        assert_eq!(id, "0003");
        assert_eq!(metadata.len(), 4);
        assert_eq!(RowMetadata::default().next_column_id(), "0000");
    }

    #[test]
    fn removes_and_renames_columns() {
        let mut metadata = sample();
        metadata.rename_column("0001", "label").unwrap();
        assert_eq!(metadata.column("0001").unwrap().name, "label");

        let removed = metadata.remove_column("0000").unwrap();
        assert_eq!(removed.name, "id");
        assert!(metadata.column("0000").is_none());
        assert_eq!(
            metadata.remove_column("0042"),
            Err(ModelError::UnknownColumn("0042".to_string()))
        );
    }

    #[test]
    fn inserts_after_existing_column() {
        let mut metadata = sample();
        metadata.insert_after("0000", ColumnMetadata::new("0003", "copy"));
        let ids: Vec<&str> = metadata.columns().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["0000", "0003", "0001", "0002"]);
    }
}
