//! Preparation management and lock-guarded edit sessions.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use tempfile::tempdir;

use prep_history::{
    HistoryError, ListQuery, NameMatch, PreparationService, SortKey, SortOrder,
    StaticDataSetCatalog,
};
use prep_lock::LockManager;
use prep_model::{Action, AppendStep, Identifiable, Preparation};
use prep_store::{FileSystemStore, ObjectStore, Repository};

fn step(name: &str) -> AppendStep {
    AppendStep::single(Action::new(name).with_parameter("column_id", "0001"))
}

// ============================================================================
// Preparations
// ============================================================================

#[test]
fn create_starts_at_the_root() {
    let service = PreparationService::in_memory().unwrap();
    let preparation = service.create("ds-1", "customers", "alice").unwrap();

    assert_eq!(preparation.data_set_id, "ds-1");
    assert_eq!(preparation.author, "alice");
    assert_eq!(
        preparation.head_id,
        service.repository().root_step().unwrap().id()
    );
    assert_eq!(service.list_steps(preparation.id()).unwrap().len(), 1);
}

#[test]
fn list_rename_and_delete() {
    let service = PreparationService::in_memory().unwrap();
    let first = service.create("ds-1", "first", "alice").unwrap();
    let second = service.create("ds-2", "second", "bob").unwrap();

    let names: Vec<String> = service.list().unwrap().into_iter().map(|p| p.name).collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"first".to_string()));

    let renamed = service.rename(second.id(), "renamed").unwrap();
    assert_eq!(renamed.name, "renamed");
    assert_eq!(service.get(second.id()).unwrap().name, "renamed");

    service.delete_preparation(first.id()).unwrap();
    assert!(matches!(
        service.get(first.id()),
        Err(HistoryError::PreparationNotFound(_))
    ));
    assert!(matches!(
        service.delete_preparation(first.id()),
        Err(HistoryError::PreparationNotFound(_))
    ));
}

fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, 9, 0, 0).unwrap()
}

/// Stores a preparation created on `created` and last touched on `modified`.
fn stored(
    service: &PreparationService,
    data_set: &str,
    name: &str,
    created: u32,
    modified: u32,
) -> Preparation {
    let root = service.repository().root_step().unwrap();
    let mut preparation = Preparation::new(data_set, name, "alice", root.id(), at(created));
    preparation.touch(at(modified));
    service.repository().add(&preparation).unwrap();
    preparation
}

fn names(preparations: Vec<Preparation>) -> Vec<String> {
    preparations.into_iter().map(|p| p.name).collect()
}

#[test]
fn listings_filter_and_sort() {
    let service = PreparationService::in_memory().unwrap();
    stored(&service, "customers", "Cleanup", 1, 9);
    stored(&service, "customers", "Enrich customers", 2, 3);
    stored(&service, "orders", "cleanup orders", 3, 5);

    assert_eq!(
        names(service.list().unwrap()),
        vec!["Cleanup", "cleanup orders", "Enrich customers"]
    );
    assert_eq!(
        names(service.list_sorted(SortKey::Date, SortOrder::Asc).unwrap()),
        vec!["Cleanup", "Enrich customers", "cleanup orders"]
    );
    assert_eq!(
        names(service.list_sorted(SortKey::Name, SortOrder::Desc).unwrap()),
        vec!["cleanup orders", "Enrich customers", "Cleanup"]
    );

    assert_eq!(
        names(service.list_by_data_set("customers").unwrap()),
        vec!["Cleanup", "Enrich customers"]
    );
    assert!(service.list_by_data_set("unknown").unwrap().is_empty());

    assert_eq!(names(service.list_by_name("cleanup", true).unwrap()), vec!["Cleanup"]);
    assert_eq!(
        names(service.list_by_name("CLEANUP", false).unwrap()),
        vec!["Cleanup", "cleanup orders"]
    );

    let query = ListQuery::default()
        .data_set("orders")
        .named(NameMatch::new("clean", false))
        .sorted(SortKey::Name, SortOrder::Asc);
    assert_eq!(names(service.query(&query).unwrap()), vec!["cleanup orders"]);
}

#[test]
fn clone_shares_the_history() {
    let service = PreparationService::in_memory().unwrap();
    let original = service.create("ds-1", "orders", "alice").unwrap();
    let original = service.append(original.id(), vec![step("trim")]).unwrap();

    let copy = service.clone_preparation(original.id()).unwrap();
    assert_ne!(copy.id(), original.id());
    assert_eq!(copy.name, "orders Copy");
    assert_eq!(copy.head_id, original.head_id);

    service.append(copy.id(), vec![step("uppercase")]).unwrap();
    assert_eq!(service.list_steps(original.id()).unwrap().len(), 2);
    assert_eq!(service.list_steps(copy.id()).unwrap().len(), 3);
}

// ============================================================================
// Sessions
// ============================================================================

#[test]
fn second_editor_is_refused_while_the_lock_is_held() {
    let service = PreparationService::in_memory().unwrap();
    let id = service.create("ds-1", "p", "alice").unwrap().id().to_string();

    let session = service.edit(&id, "alice").unwrap();
    session.append(vec![step("trim")]).unwrap();

    let error = service.edit(&id, "bob").unwrap_err();
    match &error {
        HistoryError::Locked {
            preparation_id,
            owner,
        } => {
            assert_eq!(preparation_id, &id);
            assert_eq!(owner, "alice");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(error.is_retryable());

    session.release().unwrap();
    let session = service.edit(&id, "bob").unwrap();
    assert_eq!(session.owner(), "bob");
}

#[test]
fn session_debug_shows_preparation_and_owner() {
    let service = PreparationService::in_memory().unwrap();
    let id = service.create("ds-1", "p", "alice").unwrap().id().to_string();

    let session = service.edit(&id, "alice").unwrap();
    let rendered = format!("{session:?}");
    assert!(rendered.starts_with("EditSession"));
    assert!(rendered.contains(&id));
    assert!(rendered.contains("alice"));

    let refused = service.edit(&id, "bob");
    assert!(matches!(refused, Err(HistoryError::Locked { .. })), "{refused:?}");
}

#[test]
fn dropping_a_session_releases_the_lock() {
    let service = PreparationService::in_memory().unwrap();
    let id = service.create("ds-1", "p", "alice").unwrap().id().to_string();

    {
        let _session = service.edit(&id, "alice").unwrap();
        assert_eq!(service.locks().list_by_user("alice").unwrap().len(), 1);
    }
    assert!(service.locks().list_all().unwrap().is_empty());
    service.edit(&id, "bob").unwrap();
}

#[test]
fn same_owner_can_reenter() {
    let service = PreparationService::in_memory().unwrap();
    let id = service.create("ds-1", "p", "alice").unwrap().id().to_string();

    let first = service.edit(&id, "alice").unwrap();
    let second = service.edit(&id, "alice").unwrap();
    second.rename("still alice").unwrap();
    second.release().unwrap();
    // The lock is gone; the first session can take it again.
    first.append(vec![step("trim")]).unwrap();
    first.release().unwrap();
}

#[test]
fn with_lock_releases_even_on_failure() {
    let service = PreparationService::in_memory().unwrap();
    let preparation = service.create("ds-1", "p", "alice").unwrap();
    let root = preparation.head_id.clone();
    let id = preparation.id().to_string();

    let error = service
        .with_lock(&id, "alice", |session| session.delete_at(&root))
        .unwrap_err();
    assert!(matches!(error, HistoryError::RootStepCannotBeDeleted));
    assert!(service.locks().list_all().unwrap().is_empty());

    let head = service
        .with_lock(&id, "bob", |session| {
            Ok(session.append(vec![step("trim")])?.head_id)
        })
        .unwrap();
    assert_eq!(service.get(&id).unwrap().head_id, head);
}

#[test]
fn editing_a_missing_preparation_fails_without_locking() {
    let service = PreparationService::in_memory().unwrap();
    assert!(matches!(
        service.edit("nope", "alice"),
        Err(HistoryError::PreparationNotFound(_))
    ));
    assert!(service.locks().list_all().unwrap().is_empty());
}

#[test]
fn session_can_delete_its_preparation() {
    let service = PreparationService::in_memory().unwrap();
    let id = service.create("ds-1", "p", "alice").unwrap().id().to_string();

    let session = service.edit(&id, "alice").unwrap();
    session.delete_preparation().unwrap();

    assert!(service.get(&id).is_err());
    assert!(service.locks().list_all().unwrap().is_empty());
}

// ============================================================================
// File-backed service
// ============================================================================

fn file_service(dir: &std::path::Path) -> PreparationService {
    let store: Arc<dyn ObjectStore> = Arc::new(FileSystemStore::new(dir).unwrap());
    PreparationService::new(
        Repository::open(Arc::clone(&store)).unwrap(),
        Arc::new(LockManager::new(store)),
        Arc::new(StaticDataSetCatalog::default()),
    )
}

#[test]
fn history_survives_reopening_the_store() {
    let dir = tempdir().unwrap();
    let id = {
        let service = file_service(dir.path());
        let id = service.create("ds-1", "p", "alice").unwrap().id().to_string();
        service
            .with_lock(&id, "alice", |session| {
                session.append(vec![step("trim"), step("uppercase")])
            })
            .unwrap();
        id
    };

    let service = file_service(dir.path());
    let names: Vec<String> = service
        .versioned_actions(&id, &"head".parse().unwrap())
        .unwrap()
        .into_iter()
        .map(|action| action.name)
        .collect();
    assert_eq!(names, vec!["trim", "uppercase"]);
    assert!(service.locks().list_all().unwrap().is_empty());
}
