//! Configuration, input parsing and id lookup as the binary chains them.

use std::fs;

use tempfile::tempdir;

use prep_cli::config::AppConfig;
use prep_cli::input::{build_step, parse_steps, read_steps};
use prep_cli::lookup::{resolve_preparation, resolve_step};
use prep_model::Identifiable;

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn configured_file_store_keeps_history_between_runs() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("prep.toml");
    fs::write(
        &config_path,
        format!(
            "[store]\nlocation = {:?}\n\n[lock]\nttl_seconds = 30\n",
            dir.path().join("store").display().to_string()
        ),
    )
    .unwrap();

    let config = AppConfig::discover(Some(config_path.as_path())).unwrap();
    assert_eq!(config.lock.ttl_seconds, 30);

    let id = {
        let service = config.open_service().unwrap();
        let preparation = service.create("customers", "cleanup", "alice").unwrap();
        let step = build_step("uppercase", &["column_id=0001".to_string()], &[]).unwrap();
        service
            .with_lock(preparation.id(), "alice", |session| session.append(vec![step]))
            .unwrap();
        preparation.id().to_string()
    };

    let service = config.open_service().unwrap();
    assert_eq!(service.list_steps(&id).unwrap().len(), 2);
    assert!(service.locks().list_all().unwrap().is_empty());
}

#[test]
fn missing_config_file_is_an_error() {
    let dir = tempdir().unwrap();
    let error = AppConfig::discover(Some(dir.path().join("absent.toml").as_path())).unwrap_err();
    assert!(format!("{error:#}").contains("absent.toml"));
}

#[test]
fn configured_data_sets_feed_lookup_validation() {
    let config = AppConfig::from_toml(
        "[store]\nkind = \"memory\"\n\n[data_sets]\nknown = [\"countries\"]\n",
    )
    .unwrap();
    let service = config.open_service().unwrap();
    let preparation = service.create("customers", "p", "alice").unwrap();

    let lookup = |data_set: &str| {
        build_step(
            "lookup",
            &["column_id=0001".to_string(), format!("lookup_ds_id={data_set}")],
            &[],
        )
        .unwrap()
    };
    service
        .append(preparation.id(), vec![lookup("countries"), lookup("cities")])
        .unwrap();
    let steps = service.list_steps(preparation.id()).unwrap();

    assert!(service.move_head(preparation.id(), steps[1].id()).is_ok());
    assert!(service.move_head(preparation.id(), steps[2].id()).is_err());
}

// ============================================================================
// Step files
// ============================================================================

#[test]
fn step_files_hold_one_step_or_many() {
    let one = parse_steps(
        r#"{"actions":[{"name":"split","parameters":{"column_id":"0002"}}],"diff":{"createdColumns":["0003","0004"]}}"#,
    )
    .unwrap();
    assert_eq!(one.len(), 1);
    assert_eq!(one[0].diff.created_columns, vec!["0003", "0004"]);

    let many = parse_steps(
        r#"[{"actions":[{"name":"trim"}]},{"actions":[{"name":"uppercase","parameters":{"column_id":"0001"}}]}]"#,
    )
    .unwrap();
    assert_eq!(many.len(), 2);
    assert!(many[0].diff.created_columns.is_empty());
    assert_eq!(many[1].actions[0].column_id(), Some("0001"));

    assert!(parse_steps("{\"steps\": 1}").is_err());
}

#[test]
fn read_steps_reports_the_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("steps.json");
    fs::write(&path, "not json").unwrap();
    let error = read_steps(&path).unwrap_err();
    assert!(format!("{error:#}").contains("steps.json"));
}

// ============================================================================
// Id lookup
// ============================================================================

#[test]
fn ids_resolve_from_unambiguous_prefixes() {
    let config = AppConfig::from_toml("[store]\nkind = \"memory\"").unwrap();
    let service = config.open_service().unwrap();
    let preparation = service.create("customers", "p", "alice").unwrap();
    let id = preparation.id().to_string();

    assert_eq!(resolve_preparation(&service, &id).unwrap().id(), id);
    assert_eq!(resolve_preparation(&service, &id[..12]).unwrap().id(), id);
    assert!(resolve_preparation(&service, "zz-not-hex").is_err());
    assert!(resolve_preparation(&service, "").is_err());

    let root = preparation.head_id.clone();
    assert_eq!(resolve_step(&service, &id, &root[..10]).unwrap(), root);
    assert!(resolve_step(&service, &id, "zz").is_err());
}
