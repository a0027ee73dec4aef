use std::collections::BTreeSet;

use crate::config::DataSetsConfig;

/// Answers whether a data set still exists.
pub trait DataSetCatalog: Send + Sync {
    fn exists(&self, data_set_id: &str) -> bool;
}

/// Catalogue over a fixed set of ids.
#[derive(Debug, Clone, Default)]
pub struct StaticDataSetCatalog {
    known: BTreeSet<String>,
}

impl StaticDataSetCatalog {
    pub fn new<I, S>(known: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            known: known.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(config: &DataSetsConfig) -> Self {
        Self::new(config.known.iter().cloned())
    }

    pub fn insert(&mut self, data_set_id: impl Into<String>) {
        self.known.insert(data_set_id.into());
    }

    pub fn remove(&mut self, data_set_id: &str) -> bool {
        self.known.remove(data_set_id)
    }
}

impl DataSetCatalog for StaticDataSetCatalog {
    fn exists(&self, data_set_id: &str) -> bool {
        self.known.contains(data_set_id)
    }
}
