use serde::{Deserialize, Serialize};

/// Default lock lifetime, in seconds.
pub const DEFAULT_LOCK_DELAY: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// How long a lock stays valid after it was taken or refreshed.
    pub ttl_seconds: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: DEFAULT_LOCK_DELAY,
        }
    }
}

impl LockConfig {
    pub fn with_ttl(ttl_seconds: u64) -> Self {
        Self { ttl_seconds }
    }

    pub(crate) fn ttl(&self) -> i64 {
        i64::try_from(self.ttl_seconds).unwrap_or(i64::MAX)
    }
}
