use prep_model::Identifiable;
use serde::{Deserialize, Serialize};

/// A lock held by `owner_id` on `resource_id` until `expiration_time`
/// (epoch seconds).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockedResource {
    pub resource_id: String,
    pub owner_id: String,
    pub expiration_time: i64,
}

impl LockedResource {
    pub fn new(
        resource_id: impl Into<String>,
        owner_id: impl Into<String>,
        expiration_time: i64,
    ) -> Self {
        Self {
            resource_id: resource_id.into(),
            owner_id: owner_id.into(),
            expiration_time,
        }
    }

    /// Expired once `now` is strictly past the expiration time.
    pub fn is_expired(&self, now: i64) -> bool {
        self.expiration_time < now
    }

    pub fn is_owned_by(&self, owner_id: &str) -> bool {
        self.owner_id == owner_id
    }

    /// Whether `owner_id` may take this lock at `now`.
    pub fn can_be_taken_by(&self, owner_id: &str, now: i64) -> bool {
        self.is_owned_by(owner_id) || self.is_expired(now)
    }
}

impl Identifiable for LockedResource {
    const KIND: &'static str = "LockedResource";

    fn id(&self) -> &str {
        &self.resource_id
    }
}
