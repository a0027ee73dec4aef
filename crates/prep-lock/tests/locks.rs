//! Integration tests for the lock manager.

use std::sync::{Arc, Barrier};
use std::thread;

use proptest::prelude::*;
use tempfile::tempdir;

use prep_lock::{LockConfig, LockError, LockManager, ManualClock, lock_owned};
use prep_store::{FileSystemStore, ObjectStore};

fn manager_at(now: i64) -> (LockManager, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(now));
    let manager = LockManager::in_memory().with_clock(clock.clone());
    (manager, clock)
}

// ============================================================================
// Ownership
// ============================================================================

#[test]
fn second_owner_gets_the_first_lock_back_until_it_expires() {
    let (locks, clock) = manager_at(100);
    let first = locks.try_lock("R", "a").unwrap();

    let refused = locks.try_lock("R", "b").unwrap();
    assert_eq!(refused, first);

    clock.set(first.expiration_time + 1);
    let taken = locks.try_lock("R", "b").unwrap();
    assert!(lock_owned(&taken, "b"));
    assert_eq!(taken.expiration_time, first.expiration_time + 1 + 60);
}

#[test]
fn retrieve_lock_reports_the_holder() {
    let (locks, _clock) = manager_at(0);
    locks.retrieve_lock("R", "a").unwrap();

    match locks.retrieve_lock("R", "b") {
        Err(LockError::Contention { resource_id, owner }) => {
            assert_eq!(resource_id, "R");
            assert_eq!(owner, "a");
        }
        other => panic!("expected contention, got {other:?}"),
    }
    assert!(matches!(
        locks.retrieve_unlock("R", "b"),
        Err(LockError::Contention { .. })
    ));
    locks.retrieve_unlock("R", "a").unwrap();
}

#[test]
fn listing_and_clearing() {
    let (locks, _clock) = manager_at(0);
    locks.try_lock("p1", "alice").unwrap();
    locks.try_lock("p2", "bob").unwrap();
    locks.try_lock("p3", "alice").unwrap();

    assert_eq!(locks.list_all().unwrap().len(), 3);
    let mine: Vec<_> = locks
        .list_by_user("alice")
        .unwrap()
        .into_iter()
        .map(|lock| lock.resource_id)
        .collect();
    assert_eq!(mine, vec!["p1", "p3"]);

    assert!(locks.remove("p2").unwrap());
    assert!(!locks.remove("p2").unwrap());
    locks.clear().unwrap();
    assert!(locks.list_all().unwrap().is_empty());
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn concurrent_attempts_elect_a_single_owner() {
    let locks = Arc::new(LockManager::in_memory());
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let locks = Arc::clone(&locks);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                locks.try_lock("shared", &format!("owner-{i}")).unwrap()
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let holder = &results[0].owner_id;
    assert!(results.iter().all(|lock| &lock.owner_id == holder));
    assert_eq!(
        results.iter().filter(|lock| lock_owned(lock, holder)).count(),
        8
    );
}

// ============================================================================
// File-backed locks
// ============================================================================

#[test]
fn file_backed_locks_are_visible_to_a_second_manager() {
    let dir = tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(0));
    let store: Arc<dyn ObjectStore> = Arc::new(FileSystemStore::new(dir.path()).unwrap());

    let first = LockManager::new(Arc::clone(&store))
        .with_clock(clock.clone())
        .with_config(LockConfig::with_ttl(5));
    first.try_lock("prep/1", "alice").unwrap();

    let second = LockManager::new(Arc::new(FileSystemStore::new(dir.path()).unwrap()))
        .with_clock(clock.clone());
    assert!(lock_owned(&second.try_lock("prep/1", "bob").unwrap(), "alice"));

    clock.advance(6);
    assert!(lock_owned(&second.try_lock("prep/1", "bob").unwrap(), "bob"));
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn foreign_lock_is_returned_unchanged_before_expiry(
        start in 0i64..1_000_000,
        ttl in 1u64..3_600,
        elapsed in 0i64..3_600,
    ) {
        let clock = Arc::new(ManualClock::new(start));
        let locks = LockManager::in_memory()
            .with_clock(clock.clone())
            .with_config(LockConfig::with_ttl(ttl));

        let first = locks.try_lock("R", "a").unwrap();
        clock.advance(elapsed);
        let second = locks.try_lock("R", "b").unwrap();

        if elapsed <= ttl as i64 {
            prop_assert_eq!(second, first);
        } else {
            prop_assert!(lock_owned(&second, "b"));
        }
    }
}
