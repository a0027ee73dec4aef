//! Dataset rows.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::compare_column_ids;

/// One row of a dataset: column id -> value.
///
/// [`values`](Self::values) walks columns in column order, numeric ids by
/// value. `Clone` deep-copies the value map: two clones never observe each
/// other's mutations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSetRow {
    values: BTreeMap<String, String>,
    #[serde(default)]
    deleted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tdp_id: Option<u64>,
}

impl DataSetRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            deleted: false,
            tdp_id: None,
        }
    }

    pub fn with_tdp_id(mut self, id: u64) -> Self {
        self.tdp_id = Some(id);
        self
    }

    pub fn get(&self, column_id: &str) -> Option<&str> {
        self.values.get(column_id).map(String::as_str)
    }

    /// Set a value, returning the previous one.
    pub fn set(&mut self, column_id: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(column_id.into(), value.into())
    }

    pub fn remove(&mut self, column_id: &str) -> Option<String> {
        self.values.remove(column_id)
    }

    pub fn values(&self) -> impl Iterator<Item = (&str, &str)> {
        let mut values: Vec<(&str, &str)> = self
            .values
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        values.sort_by(|(a, _), (b, _)| compare_column_ids(a, b));
        values.into_iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn set_deleted(&mut self, deleted: bool) {
        self.deleted = deleted;
    }

    /// Opaque row identifier assigned by the dataset reader.
    pub fn tdp_id(&self) -> Option<u64> {
        self.tdp_id
    }

    pub fn set_tdp_id(&mut self, id: u64) {
        self.tdp_id = Some(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clone_is_independent() {
        let mut r1 = DataSetRow::from_values([("0001", "a"), ("0002", "b")]);
        let mut r2 = r1.clone();
        r2.set("0001", "x");
        r2.set_deleted(true);
        r1.set("0002", "y");

        assert_eq!(r1.get("0001"), Some("a"));
        assert_eq!(r2.get("0001"), Some("x"));
        assert_eq!(r2.get("0002"), Some("b"));
        assert!(!r1.is_deleted());
    }

    #[test]
    fn values_follow_column_order() {
        let row = DataSetRow::from_values([("0002", "b"), ("0000", "z"), ("0001", "a")]);
        let ids: Vec<&str> = row.values().map(|(k, _)| k).collect();
        assert_eq!(ids, vec!["0000", "0001", "0002"]);
    }

    #[test]
    fn values_order_wide_ids_numerically() {
        let row = DataSetRow::from_values([("10000", "b"), ("9999", "a")]);
        let ids: Vec<&str> = row.values().map(|(k, _)| k).collect();
        assert_eq!(ids, vec!["9999", "10000"]);
    }
}
