//! Lock acquisition and release.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use prep_store::{InMemoryStore, ObjectStore, Repository};
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::LockConfig;
use crate::error::{LockError, Result};
use crate::resource::LockedResource;

/// Whether `lock` (as returned by [`LockManager::try_lock`]) belongs to `owner_id`.
pub fn lock_owned(lock: &LockedResource, owner_id: &str) -> bool {
    lock.is_owned_by(owner_id)
}

/// Whether the outcome of [`LockManager::try_unlock`] means the resource is free.
pub fn lock_released(outcome: Option<&LockedResource>) -> bool {
    outcome.is_none()
}

/// Lock table backed by a store.
///
/// Read-modify-write sequences on one resource are serialized through an
/// in-process mutex per resource id; different resources never wait on each
/// other.
pub struct LockManager {
    locks: Repository,
    clock: Arc<dyn Clock>,
    config: LockConfig,
    resources: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl LockManager {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            locks: Repository::new(store),
            clock: Arc::new(SystemClock),
            config: LockConfig::default(),
            resources: Mutex::new(HashMap::new()),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryStore::new()))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_config(mut self, config: LockConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    /// Take or refresh the lock on `resource_id` for `owner_id`.
    ///
    /// Succeeds when the resource is free, already held by `owner_id`, or
    /// held by someone else but expired; the fresh lock is returned. Otherwise
    /// the current lock is returned unchanged.
    pub fn try_lock(&self, resource_id: &str, owner_id: &str) -> Result<LockedResource> {
        validate(resource_id, owner_id)?;
        self.serialized(resource_id, || {
            let now = self.clock.now();
            if let Some(existing) = self.locks.get::<LockedResource>(resource_id)?
                && !existing.can_be_taken_by(owner_id, now)
            {
                debug!(resource_id, owner_id, holder = %existing.owner_id, "lock refused");
                return Ok(existing);
            }
            let lock = LockedResource::new(
                resource_id,
                owner_id,
                now.saturating_add(self.config.ttl()),
            );
            self.locks.add(&lock)?;
            debug!(resource_id, owner_id, expires = lock.expiration_time, "lock taken");
            Ok(lock)
        })
    }

    /// Release the lock on `resource_id` held by `owner_id`.
    ///
    /// Returns `None` when the resource is free afterwards (it was not
    /// locked, was held by `owner_id`, or had expired), or the lock of the
    /// other owner that prevented the release.
    pub fn try_unlock(&self, resource_id: &str, owner_id: &str) -> Result<Option<LockedResource>> {
        validate(resource_id, owner_id)?;
        self.serialized(resource_id, || {
            let now = self.clock.now();
            let Some(existing) = self.locks.get::<LockedResource>(resource_id)? else {
                return Ok(None);
            };
            if existing.can_be_taken_by(owner_id, now) {
                self.locks.remove::<LockedResource>(resource_id)?;
                debug!(resource_id, owner_id, "lock released");
                Ok(None)
            } else {
                debug!(resource_id, owner_id, holder = %existing.owner_id, "unlock refused");
                Ok(Some(existing))
            }
        })
    }

    /// [`try_lock`](Self::try_lock) that fails with [`LockError::Contention`]
    /// when someone else holds the lock.
    pub fn retrieve_lock(&self, resource_id: &str, owner_id: &str) -> Result<LockedResource> {
        let lock = self.try_lock(resource_id, owner_id)?;
        if lock_owned(&lock, owner_id) {
            Ok(lock)
        } else {
            warn!(resource_id, owner_id, holder = %lock.owner_id, "resource is locked by another user");
            Err(LockError::Contention {
                resource_id: resource_id.to_string(),
                owner: lock.owner_id,
            })
        }
    }

    /// [`try_unlock`](Self::try_unlock) that fails with
    /// [`LockError::Contention`] when someone else holds the lock.
    pub fn retrieve_unlock(&self, resource_id: &str, owner_id: &str) -> Result<()> {
        match self.try_unlock(resource_id, owner_id)? {
            None => Ok(()),
            Some(lock) => Err(LockError::Contention {
                resource_id: resource_id.to_string(),
                owner: lock.owner_id,
            }),
        }
    }

    /// The stored lock on `resource_id`, expired or not.
    pub fn get(&self, resource_id: &str) -> Result<Option<LockedResource>> {
        Ok(self.locks.get(resource_id)?)
    }

    pub fn list_all(&self) -> Result<Vec<LockedResource>> {
        Ok(self.locks.list_all()?)
    }

    pub fn list_by_user(&self, owner_id: &str) -> Result<Vec<LockedResource>> {
        Ok(self
            .list_all()?
            .into_iter()
            .filter(|lock| lock.is_owned_by(owner_id))
            .collect())
    }

    /// Drop the lock on `resource_id` whoever holds it.
    pub fn remove(&self, resource_id: &str) -> Result<bool> {
        if resource_id.is_empty() {
            return Err(LockError::InvalidArgument("resource id"));
        }
        self.serialized(resource_id, || {
            Ok(self.locks.remove::<LockedResource>(resource_id)?)
        })
    }

    /// Drop every lock.
    pub fn clear(&self) -> Result<()> {
        for lock in self.list_all()? {
            self.remove(&lock.resource_id)?;
        }
        Ok(())
    }

    fn serialized<T>(&self, resource_id: &str, operation: impl FnOnce() -> Result<T>) -> Result<T> {
        let resource = {
            let mut resources = self
                .resources
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            Arc::clone(resources.entry(resource_id.to_string()).or_default())
        };

        let outcome = {
            let _held = resource.lock().unwrap_or_else(PoisonError::into_inner);
            operation()
        };

        let mut resources = self
            .resources
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // The map and this call hold the only references: nobody is waiting.
        if Arc::strong_count(&resource) == 2 {
            resources.remove(resource_id);
        }
        outcome
    }
}

fn validate(resource_id: &str, owner_id: &str) -> Result<()> {
    if resource_id.is_empty() {
        return Err(LockError::InvalidArgument("resource id"));
    }
    if owner_id.is_empty() {
        return Err(LockError::InvalidArgument("owner id"));
    }
    Ok(())
}

impl std::fmt::Debug for LockManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockManager")
            .field("locks", &self.locks)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn manager(clock: &Arc<ManualClock>) -> LockManager {
        LockManager::in_memory().with_clock(clock.clone())
    }

    #[test]
    fn free_resource_is_locked_with_ttl() {
        let clock = Arc::new(ManualClock::new(1_000));
        let locks = manager(&clock);
        let lock = locks.try_lock("prep-1", "alice").unwrap();
        assert_eq!(lock, LockedResource::new("prep-1", "alice", 1_060));
        assert_eq!(locks.get("prep-1").unwrap(), Some(lock));
    }

    #[test]
    fn reentrant_lock_refreshes_expiration() {
        let clock = Arc::new(ManualClock::new(1_000));
        let locks = manager(&clock);
        locks.try_lock("prep-1", "alice").unwrap();
        clock.advance(30);
        let again = locks.try_lock("prep-1", "alice").unwrap();
        assert_eq!(again.expiration_time, 1_090);
    }

    #[test]
    fn lock_expires_only_strictly_after_its_time() {
        let clock = Arc::new(ManualClock::new(0));
        let locks = manager(&clock).with_config(LockConfig::with_ttl(10));
        locks.try_lock("r", "a").unwrap();

        clock.set(10);
        assert!(lock_owned(&locks.try_lock("r", "b").unwrap(), "a"));
        clock.set(11);
        assert!(lock_owned(&locks.try_lock("r", "b").unwrap(), "b"));
    }

    #[test]
    fn unlock_outcomes() {
        let clock = Arc::new(ManualClock::new(0));
        let locks = manager(&clock);
        assert!(lock_released(locks.try_unlock("r", "a").unwrap().as_ref()));

        locks.try_lock("r", "a").unwrap();
        let refused = locks.try_unlock("r", "b").unwrap();
        assert_eq!(refused.map(|l| l.owner_id), Some("a".to_string()));

        assert_eq!(locks.try_unlock("r", "a").unwrap(), None);
        assert_eq!(locks.get("r").unwrap(), None);
    }

    #[test]
    fn expired_lock_can_be_released_by_anyone() {
        let clock = Arc::new(ManualClock::new(0));
        let locks = manager(&clock);
        locks.try_lock("r", "a").unwrap();
        clock.advance(61);
        assert_eq!(locks.try_unlock("r", "b").unwrap(), None);
    }

    #[test]
    fn empty_arguments_are_rejected() {
        let locks = LockManager::in_memory();
        assert!(matches!(
            locks.try_lock("", "a"),
            Err(LockError::InvalidArgument("resource id"))
        ));
        assert!(matches!(
            locks.try_unlock("r", ""),
            Err(LockError::InvalidArgument("owner id"))
        ));
    }

    #[test]
    fn resource_mutexes_are_dropped_when_idle() {
        let locks = LockManager::in_memory();
        locks.try_lock("r", "a").unwrap();
        locks.try_unlock("r", "a").unwrap();
        assert!(locks.resources.lock().unwrap().is_empty());
    }
}
