//! Tests for building pipelines out of persisted actions.

use std::sync::Arc;

use prep_model::{Action, DataSetRow, RowMetadata};
use prep_pipeline::{
    ActionChain, ActionContext, ActionError, ActionRegistry, Behavior, PipelineError, RowAction,
    RowCollector,
};

// ============================================================================
// Test actions
// ============================================================================

/// Fills empty cells of `column_id` with `value`; checks the column at compile.
struct FillEmpty;

impl RowAction for FillEmpty {
    fn name(&self) -> &str {
        "fillempty"
    }

    fn behaviors(&self) -> &[Behavior] {
        &[Behavior::ValuesColumn]
    }

    fn compile(
        &self,
        context: &mut ActionContext,
        metadata: &mut RowMetadata,
    ) -> Result<(), ActionError> {
        let column = context.required_parameter("column_id")?;
        if metadata.column(column).is_none() {
            return Err(ActionError::UnknownColumn(column.to_string()));
        }
        context.required_parameter("value")?;
        Ok(())
    }

    fn apply(
        &self,
        mut row: DataSetRow,
        context: &mut ActionContext,
        _metadata: &mut RowMetadata,
    ) -> Result<DataSetRow, ActionError> {
        let column = context.required_parameter("column_id")?.to_string();
        let value = context.required_parameter("value")?.to_string();
        if row.get(&column).is_none_or(str::is_empty) {
            row.set(column, value);
        }
        Ok(row)
    }
}

/// Copies `column_id` into a new column created at compile time.
struct Duplicate;

const CREATED: &str = "created_column";

impl RowAction for Duplicate {
    fn name(&self) -> &str {
        "duplicate"
    }

    fn behaviors(&self) -> &[Behavior] {
        &[Behavior::MetadataCopyColumns, Behavior::ValuesColumn]
    }

    fn compile(
        &self,
        context: &mut ActionContext,
        metadata: &mut RowMetadata,
    ) -> Result<(), ActionError> {
        let column = context.required_parameter("column_id")?.to_string();
        let name = metadata
            .column(&column)
            .map(|c| format!("{}_copy", c.name))
            .ok_or_else(|| ActionError::UnknownColumn(column.clone()))?;
        let created = metadata.add_column(name, "string");
        context.insert(CREATED, created);
        Ok(())
    }

    fn apply(
        &self,
        mut row: DataSetRow,
        context: &mut ActionContext,
        _metadata: &mut RowMetadata,
    ) -> Result<DataSetRow, ActionError> {
        let column = context.required_parameter("column_id")?;
        let created = context
            .get::<String>(CREATED)
            .ok_or_else(|| ActionError::Failed("column not created".into()))?;
        if let Some(value) = row.get(column).map(str::to_string) {
            row.set(created.clone(), value);
        }
        Ok(row)
    }
}

fn registry() -> ActionRegistry {
    let mut registry = ActionRegistry::new();
    registry.register_shared(Arc::new(FillEmpty));
    registry.register("duplicate", |_action: &Action| {
        Ok(Arc::new(Duplicate) as Arc<dyn RowAction>)
    });
    registry
}

fn metadata() -> RowMetadata {
    let mut metadata = RowMetadata::default();
    metadata.add_column("name", "string");
    metadata.add_column("city", "string");
    metadata
}

fn fill(column: &str, value: &str) -> Action {
    Action::new("fillempty")
        .with_parameter("column_id", column)
        .with_parameter("value", value)
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn chain_applies_actions_in_order() {
    let registry = registry();
    let output = RowCollector::new();
    let mut metadata = metadata();
    let mut pipeline = ActionChain::new(&registry)
        .with_actions([
            fill("0001", "Paris"),
            Action::new("duplicate").with_parameter("column_id", "0001"),
        ])
        .build(&mut metadata, Box::new(output.node()))
        .unwrap();

    assert!(pipeline.report().is_clean());
    assert_eq!(pipeline.report().compiled_eagerly, 1);
    assert_eq!(pipeline.report().deferred, 1);
    insta::assert_snapshot!(
        pipeline.to_string(),
        @"Source -> Action(fillempty) -> Compile(duplicate) -> Action(duplicate) -> Terminal"
    );

    let rows = [
        DataSetRow::from_values([("0000", "ada"), ("0001", "")]),
        DataSetRow::from_values([("0000", "alan"), ("0001", "London")]),
    ];
    pipeline.execute(rows, &mut metadata).unwrap();

    let out = output.rows();
    assert_eq!(out[0].get("0002"), Some("Paris"));
    assert_eq!(out[1].get("0002"), Some("London"));
    assert_eq!(metadata.column("0002").map(|c| c.name.as_str()), Some("city_copy"));
    assert_eq!(output.metadata().map(|m| m.len()), Some(3));
}

#[test]
fn eager_compile_failure_is_reported_once_and_skipped() {
    let registry = registry();
    let output = RowCollector::new();
    let mut metadata = metadata();
    let mut pipeline = ActionChain::new(&registry)
        .with_actions([fill("0042", "x"), fill("0000", "anonymous")])
        .build(&mut metadata, Box::new(output.node()))
        .unwrap();

    let report = pipeline.report().clone();
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].position, 0);
    assert_eq!(report.failures[0].reason, "unknown column '0042'");

    pipeline
        .execute([DataSetRow::from_values([("0000", "")])], &mut metadata)
        .unwrap();
    assert_eq!(output.last_row().unwrap().get("0000"), Some("anonymous"));
    assert_eq!(output.last_row().unwrap().get("0042"), None);
    assert_eq!(pipeline.compile_failures(), report.failures);
}

#[test]
fn deferred_compile_failure_shows_up_after_the_first_row() {
    let registry = registry();
    let output = RowCollector::new();
    let mut metadata = metadata();
    let mut pipeline = ActionChain::new(&registry)
        .with_actions([Action::new("duplicate").with_parameter("column_id", "0099")])
        .build(&mut metadata, Box::new(output.node()))
        .unwrap();

    assert!(pipeline.compile_failures().is_empty());
    pipeline
        .execute([DataSetRow::from_values([("0000", "a")])], &mut metadata)
        .unwrap();

    let failures = pipeline.compile_failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].action, "duplicate");
    assert_eq!(output.count(), 1);
    assert_eq!(metadata.len(), 2);
}

#[test]
fn filter_limits_the_rows_entering_the_chain() {
    let registry = registry();
    let output = RowCollector::new();
    let mut metadata = metadata();
    let mut pipeline = ActionChain::new(&registry)
        .with_filter(|row| !row.is_deleted())
        .with_actions([fill("0001", "?")])
        .build(&mut metadata, Box::new(output.node()))
        .unwrap();

    let mut deleted = DataSetRow::from_values([("0000", "gone")]);
    deleted.set_deleted(true);
    pipeline
        .execute([deleted, DataSetRow::from_values([("0000", "kept")])], &mut metadata)
        .unwrap();

    assert_eq!(output.count(), 1);
    assert_eq!(output.last_row().unwrap().get("0001"), Some("?"));
}

#[test]
fn unknown_action_fails_the_build() {
    let registry = registry();
    let result = ActionChain::new(&registry)
        .with_actions([Action::new("translate")])
        .build(&mut metadata(), Box::new(RowCollector::new().node()));

    match result {
        Err(error @ PipelineError::UnknownAction(_)) => assert!(error.is_configuration()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("build should fail"),
    }
}

#[test]
fn registry_lists_names_in_order() {
    let registry = registry();
    assert!(registry.contains("duplicate"));
    assert_eq!(registry.names().collect::<Vec<_>>(), vec!["duplicate", "fillempty"]);
}
