//! Column id renumbering for history rewrites.
//!
//! When a step in the middle of a history changes the set of columns it
//! creates, the steps after it may refer to columns that no longer exist or
//! whose ids moved. [`ColumnShift`] captures that change and rewrites the
//! later steps:
//!
//! 1. a step with an action on a removed column is dropped;
//! 2. a `column_id` parameter above the old step's highest created id is
//!    shifted by the difference in created column counts;
//! 3. the same shift applies to each step's own created columns.
//!
//! Ids that are not decimal numbers are never shifted and do not count
//! towards the old step's highest id.

use std::collections::BTreeSet;

use prep_model::{AppendStep, ColumnIds, ModelError, StepDiff, format_column_id, parse_column_id};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnShift {
    deleted: BTreeSet<String>,
    /// Highest id created by the old step; `None` means unbounded.
    max_created: Option<i64>,
    shift: i64,
}

impl ColumnShift {
    /// Change caused by replacing a step creating `old` with one creating `new`.
    pub fn for_update(old: &StepDiff, new: &StepDiff) -> Self {
        let deleted = old
            .created_columns
            .iter()
            .filter(|column| !new.created_columns.contains(column))
            .cloned()
            .collect();
        let shift = count(new) - count(old);
        Self {
            deleted,
            max_created: ColumnIds::numeric(&old.created_columns).max(),
            shift,
        }
    }

    /// Change caused by removing a step creating `old`.
    pub fn for_delete(old: &StepDiff) -> Self {
        Self {
            deleted: old.created_columns.iter().cloned().collect(),
            max_created: ColumnIds::numeric(&old.created_columns).max(),
            shift: -count(old),
        }
    }

    pub fn shift(&self) -> i64 {
        self.shift
    }

    pub fn deleted_columns(&self) -> impl Iterator<Item = &str> {
        self.deleted.iter().map(String::as_str)
    }

    /// Whether any action of `step` works on a removed column.
    pub fn references_deleted(&self, step: &AppendStep) -> bool {
        step.actions
            .iter()
            .filter_map(|action| action.column_id())
            .any(|column| self.deleted.contains(column))
    }

    /// Drop the steps that lost their column and renumber the others.
    pub fn apply(&self, steps: Vec<AppendStep>) -> Result<Vec<AppendStep>> {
        steps
            .into_iter()
            .filter(|step| !self.references_deleted(step))
            .map(|step| self.renumber(step))
            .collect()
    }

    fn renumber(&self, mut step: AppendStep) -> Result<AppendStep> {
        if self.shift == 0 {
            return Ok(step);
        }
        for action in &mut step.actions {
            if let Some(column) = action.column_id()
                && let Some(shifted) = self.shifted(column)?
            {
                action
                    .parameters
                    .insert(prep_model::COLUMN_ID.to_string(), shifted);
            }
        }
        for column in &mut step.diff.created_columns {
            if let Some(shifted) = self.shifted(column)? {
                *column = shifted;
            }
        }
        Ok(step)
    }

    /// New rendering of `column` if it sits above the old maximum.
    fn shifted(&self, column: &str) -> Result<Option<String>> {
        let Some(max) = self.max_created else {
            return Ok(None);
        };
        let Ok(id) = parse_column_id(column) else {
            return Ok(None);
        };
        if id <= max {
            return Ok(None);
        }
        let shifted = id + self.shift;
        if shifted < 0 {
            return Err(ModelError::ColumnIdOutOfRange(shifted).into());
        }
        Ok(Some(format_column_id(shifted)))
    }
}

fn count(diff: &StepDiff) -> i64 {
    i64::try_from(diff.created_columns.len()).unwrap_or(i64::MAX)
}
