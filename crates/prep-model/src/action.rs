use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Implicit parameter naming the column an action operates on.
pub const COLUMN_ID: &str = "column_id";
/// Implicit parameter naming the action scope (column, line, dataset...).
pub const SCOPE: &str = "scope";

/// Descriptor of one action: a name resolved by the action registry plus an
/// opaque parameter map passed through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl Action {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }

    /// Column the action operates on, if any.
    pub fn column_id(&self) -> Option<&str> {
        self.parameter(COLUMN_ID)
    }
}
