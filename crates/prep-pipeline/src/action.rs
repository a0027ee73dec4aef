//! The action contract plugged into pipeline nodes.

use std::any::Any;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use prep_model::{DataSetRow, RowMetadata};

use crate::error::{ActionError, PipelineError};

/// What an action touches. Used to decide whether compilation has to wait
/// for the schema as it reaches the action at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Behavior {
    ValuesColumn,
    ValuesMultipleColumns,
    ValuesAll,
    MetadataCreateColumns,
    MetadataCopyColumns,
    MetadataDeleteColumns,
    MetadataChangeName,
    MetadataChangeType,
    NeedStatistics,
    ForceStatistics,
}

impl Behavior {
    /// Behaviors whose compile step must see the live schema.
    pub fn requires_metadata(self) -> bool {
        matches!(
            self,
            Self::MetadataCreateColumns
                | Self::MetadataCopyColumns
                | Self::MetadataDeleteColumns
                | Self::MetadataChangeName
                | Self::MetadataChangeType
                | Self::NeedStatistics
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActionStatus {
    #[default]
    Ok,
    Canceled,
}

/// Per-action state shared by the compile and apply phases of one run.
///
/// Besides the action parameters it holds a typed scratch area that compile
/// fills (lookup tables, created column ids) and apply reads.
pub struct ActionContext {
    parameters: BTreeMap<String, String>,
    status: ActionStatus,
    failure: Option<String>,
    values: HashMap<String, Box<dyn Any + Send>>,
}

impl ActionContext {
    pub fn new(parameters: BTreeMap<String, String>) -> Self {
        Self {
            parameters,
            status: ActionStatus::Ok,
            failure: None,
            values: HashMap::new(),
        }
    }

    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }

    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }

    /// Parameter lookup that fails with [`ActionError::MissingParameter`].
    pub fn required_parameter(&self, key: &str) -> Result<&str, ActionError> {
        self.parameter(key)
            .ok_or_else(|| ActionError::MissingParameter(key.to_string()))
    }

    pub fn status(&self) -> ActionStatus {
        self.status
    }

    pub fn is_canceled(&self) -> bool {
        self.status == ActionStatus::Canceled
    }

    pub fn cancel(&mut self) {
        self.status = ActionStatus::Canceled;
    }

    /// Cancel and remember why. The first recorded reason wins.
    pub fn fail(&mut self, reason: impl Into<String>) {
        self.status = ActionStatus::Canceled;
        if self.failure.is_none() {
            self.failure = Some(reason.into());
        }
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Value stored under `key`, created by `init` if absent or of another type.
    pub fn get_or_insert_with<T, F>(&mut self, key: &str, init: F) -> &mut T
    where
        T: Any + Send,
        F: FnOnce() -> T,
    {
        let slot = match self.values.entry(key.to_string()) {
            Entry::Occupied(entry) => {
                let slot = entry.into_mut();
                if !slot.is::<T>() {
                    *slot = Box::new(init());
                }
                slot
            }
            Entry::Vacant(entry) => entry.insert(Box::new(init())),
        };
        match slot.downcast_mut::<T>() {
            Some(value) => value,
            None => unreachable!("context slot '{key}' holds the requested type"),
        }
    }

    pub fn insert<T: Any + Send>(&mut self, key: impl Into<String>, value: T) {
        self.values.insert(key.into(), Box::new(value));
    }

    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.values.get(key).and_then(|value| value.downcast_ref())
    }

    pub fn get_mut<T: Any>(&mut self, key: &str) -> Option<&mut T> {
        self.values.get_mut(key).and_then(|value| value.downcast_mut())
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}

impl fmt::Debug for ActionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.values.keys().collect();
        keys.sort();
        f.debug_struct("ActionContext")
            .field("parameters", &self.parameters)
            .field("status", &self.status)
            .field("failure", &self.failure)
            .field("values", &keys)
            .finish()
    }
}

/// Context shared between the compile node and the action node of one action.
pub type SharedContext = Arc<Mutex<ActionContext>>;

pub fn shared_context(parameters: BTreeMap<String, String>) -> SharedContext {
    Arc::new(Mutex::new(ActionContext::new(parameters)))
}

pub(crate) fn lock_context<'a>(
    context: &'a SharedContext,
    action: &str,
) -> Result<MutexGuard<'a, ActionContext>, PipelineError> {
    context
        .lock()
        .map_err(|_| PipelineError::ContextPoisoned(action.to_string()))
}

/// A row transformation run by the pipeline.
///
/// `compile` runs at most once per pipeline build, before the first row
/// reaches `apply`. Returning an error from `compile` cancels the action for
/// the rest of the run; returning an error from `apply` aborts the stream.
pub trait RowAction: Send + Sync {
    fn name(&self) -> &str;

    fn behaviors(&self) -> &[Behavior] {
        &[]
    }

    fn requires_metadata(&self) -> bool {
        self.behaviors().iter().any(|b| b.requires_metadata())
    }

    fn compile(
        &self,
        _context: &mut ActionContext,
        _metadata: &mut RowMetadata,
    ) -> Result<(), ActionError> {
        Ok(())
    }

    fn apply(
        &self,
        row: DataSetRow,
        context: &mut ActionContext,
        metadata: &mut RowMetadata,
    ) -> Result<DataSetRow, ActionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_keeps_typed_values() {
        let mut context = ActionContext::new(BTreeMap::new());
        *context.get_or_insert_with("hits", || 0usize) += 2;
        *context.get_or_insert_with("hits", || 100usize) += 1;
        assert_eq!(context.get::<usize>("hits"), Some(&3));
        assert_eq!(context.get::<String>("hits"), None);

        let replaced: &mut String = context.get_or_insert_with("hits", String::new);
        replaced.push('x');
        assert_eq!(context.get::<String>("hits").map(String::as_str), Some("x"));
    }

    #[test]
    fn first_failure_reason_is_kept() {
        let mut context = ActionContext::new(BTreeMap::new());
        assert_eq!(context.status(), ActionStatus::Ok);
        context.fail("bad column");
        context.fail("other");
        assert!(context.is_canceled());
        assert_eq!(context.failure(), Some("bad column"));
    }

    #[test]
    fn missing_parameter_is_reported() {
        let context = ActionContext::new(BTreeMap::from([("a".to_string(), "1".to_string())]));
        assert_eq!(context.required_parameter("a").unwrap(), "1");
        assert!(matches!(
            context.required_parameter("b"),
            Err(ActionError::MissingParameter(key)) if key == "b"
        ));
    }

    #[test]
    fn metadata_behaviors() {
        assert!(Behavior::MetadataCreateColumns.requires_metadata());
        assert!(Behavior::NeedStatistics.requires_metadata());
        assert!(!Behavior::ValuesColumn.requires_metadata());
        assert!(!Behavior::ForceStatistics.requires_metadata());
    }
}
