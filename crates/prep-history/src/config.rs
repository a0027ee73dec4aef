use serde::{Deserialize, Serialize};

/// Data sets known to exist, used when no live catalogue is wired in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSetsConfig {
    pub known: Vec<String>,
}
