//! Preparation management and history rewrites.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use prep_lock::LockManager;
use prep_model::{Action, AppendStep, Identifiable, Preparation, PreparationActions, Step};
use prep_store::Repository;
use tracing::{debug, info, info_span};

use crate::catalog::{DataSetCatalog, StaticDataSetCatalog};
use crate::error::{HistoryError, Result};
use crate::listing::{ListQuery, NameMatch, SortKey, SortOrder};
use crate::renumber::ColumnShift;
use crate::session::EditSession;

/// Name of the action that joins another data set.
pub const LOOKUP_ACTION: &str = "lookup";
/// Parameter of [`LOOKUP_ACTION`] naming the joined data set.
pub const LOOKUP_DATA_SET_PARAMETER: &str = "lookup_ds_id";

/// A point of a preparation's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Version {
    Head,
    /// The root step, before any action.
    Origin,
    Step(String),
}

impl FromStr for Version {
    type Err = std::convert::Infallible;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match value {
            "head" => Self::Head,
            "origin" => Self::Origin,
            step => Self::Step(step.to_string()),
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Head => f.write_str("head"),
            Self::Origin => f.write_str("origin"),
            Self::Step(id) => f.write_str(id),
        }
    }
}

pub struct PreparationService {
    repository: Repository,
    locks: Arc<LockManager>,
    catalog: Arc<dyn DataSetCatalog>,
}

impl PreparationService {
    pub fn new(
        repository: Repository,
        locks: Arc<LockManager>,
        catalog: Arc<dyn DataSetCatalog>,
    ) -> Self {
        Self {
            repository,
            locks,
            catalog,
        }
    }

    /// Service over fresh in-memory stores, knowing no data set.
    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(
            Repository::in_memory()?,
            Arc::new(LockManager::in_memory()),
            Arc::new(StaticDataSetCatalog::default()),
        ))
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn DataSetCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    pub fn locks(&self) -> &LockManager {
        &self.locks
    }

    /// Lock `preparation_id` for `owner` until the session ends.
    pub fn edit(&self, preparation_id: &str, owner: &str) -> Result<EditSession<'_>> {
        EditSession::open(self, preparation_id, owner)
    }

    /// Run `operation` inside an edit session and release the lock after.
    pub fn with_lock<T>(
        &self,
        preparation_id: &str,
        owner: &str,
        operation: impl FnOnce(&EditSession<'_>) -> Result<T>,
    ) -> Result<T> {
        let session = self.edit(preparation_id, owner)?;
        let outcome = operation(&session);
        let released = session.release();
        let value = outcome?;
        released?;
        Ok(value)
    }

    // ------------------------------------------------------------------
    // Preparations
    // ------------------------------------------------------------------

    /// New preparation on `data_set_id` whose head is the root step.
    pub fn create(&self, data_set_id: &str, name: &str, author: &str) -> Result<Preparation> {
        let root = self.repository.root_step()?;
        let preparation = Preparation::new(data_set_id, name, author, root.id(), Utc::now());
        self.repository.add(&preparation)?;
        info!(id = preparation.id(), data_set_id, name, "preparation created");
        Ok(preparation)
    }

    pub fn get(&self, preparation_id: &str) -> Result<Preparation> {
        self.repository
            .get(preparation_id)?
            .ok_or_else(|| HistoryError::PreparationNotFound(preparation_id.to_string()))
    }

    /// Every preparation, most recently modified first.
    pub fn list(&self) -> Result<Vec<Preparation>> {
        self.query(&ListQuery::default())
    }

    pub fn list_sorted(&self, sort: SortKey, order: SortOrder) -> Result<Vec<Preparation>> {
        self.query(&ListQuery::default().sorted(sort, order))
    }

    /// Preparations built on `data_set_id`.
    pub fn list_by_data_set(&self, data_set_id: &str) -> Result<Vec<Preparation>> {
        self.query(&ListQuery::default().data_set(data_set_id))
    }

    /// Preparations named `name`, or whose name contains it when not `exact`.
    pub fn list_by_name(&self, name: &str, exact: bool) -> Result<Vec<Preparation>> {
        self.query(&ListQuery::default().named(NameMatch::new(name, exact)))
    }

    pub fn query(&self, query: &ListQuery) -> Result<Vec<Preparation>> {
        let preparations = query.apply(self.repository.list_all::<Preparation>()?);
        debug!(count = preparations.len(), ?query, "preparations listed");
        Ok(preparations)
    }

    pub fn rename(&self, preparation_id: &str, name: &str) -> Result<Preparation> {
        let mut preparation = self.get(preparation_id)?;
        preparation.name = name.to_string();
        preparation.touch(Utc::now());
        self.repository.add(&preparation)?;
        debug!(id = preparation_id, name, "preparation renamed");
        Ok(preparation)
    }

    /// Remove the preparation. Its steps stay; they may be shared.
    pub fn delete_preparation(&self, preparation_id: &str) -> Result<()> {
        if !self.repository.remove::<Preparation>(preparation_id)? {
            return Err(HistoryError::PreparationNotFound(preparation_id.to_string()));
        }
        info!(id = preparation_id, "preparation deleted");
        Ok(())
    }

    /// Copy of the preparation sharing its history, named "<name> Copy".
    pub fn clone_preparation(&self, preparation_id: &str) -> Result<Preparation> {
        let original = self.get(preparation_id)?;
        let copy = original.copy_as(format!("{} Copy", original.name), Utc::now());
        self.repository.add(&copy)?;
        info!(id = copy.id(), from = preparation_id, "preparation cloned");
        Ok(copy)
    }

    // ------------------------------------------------------------------
    // Reading history
    // ------------------------------------------------------------------

    pub fn step(&self, step_id: &str) -> Result<Step> {
        self.repository
            .get(step_id)?
            .ok_or_else(|| HistoryError::StepNotFound(step_id.to_string()))
    }

    fn content_of(&self, step: &Step) -> Result<PreparationActions> {
        Ok(self.repository.require(step.content())?)
    }

    /// Steps from the root to the head.
    pub fn list_steps(&self, preparation_id: &str) -> Result<Vec<Step>> {
        let preparation = self.get(preparation_id)?;
        self.history(&preparation)
    }

    fn history(&self, preparation: &Preparation) -> Result<Vec<Step>> {
        let mut steps = Vec::new();
        let mut next = Some(preparation.head_id.clone());
        while let Some(id) = next {
            let step = self.step(&id)?;
            next = step.parent().map(str::to_string);
            steps.push(step);
        }
        steps.reverse();
        Ok(steps)
    }

    /// Steps from `step_id` (included) to the head.
    pub fn extract_steps_from(&self, preparation: &Preparation, step_id: &str) -> Result<Vec<Step>> {
        let mut steps = self.history(preparation)?;
        let position = steps
            .iter()
            .position(|step| step.id() == step_id)
            .ok_or_else(|| HistoryError::StepNotFound(step_id.to_string()))?;
        Ok(steps.split_off(position))
    }

    /// The actions each step after the first one added, with its diff.
    fn actions_after(&self, steps: &[Step]) -> Result<Vec<AppendStep>> {
        let mut deltas = Vec::with_capacity(steps.len().saturating_sub(1));
        let mut previous: Option<PreparationActions> = None;
        for step in steps {
            let content = self.content_of(step)?;
            if let Some(parent) = previous.as_ref() {
                let added = content
                    .actions()
                    .get(parent.actions().len()..)
                    .unwrap_or_default()
                    .to_vec();
                deltas.push(AppendStep::new(added, step.diff().clone()));
            }
            previous = Some(content);
        }
        Ok(deltas)
    }

    /// Cumulative actions at `version` of the preparation.
    pub fn versioned_actions(&self, preparation_id: &str, version: &Version) -> Result<Vec<Action>> {
        let preparation = self.get(preparation_id)?;
        let step = match version {
            Version::Head => self.step(&preparation.head_id)?,
            Version::Origin => self.repository.root_step()?,
            Version::Step(id) => self.step(id)?,
        };
        Ok(self.content_of(&step)?.actions().to_vec())
    }

    // ------------------------------------------------------------------
    // Rewriting history (caller holds the preparation lock)
    // ------------------------------------------------------------------

    /// Add `steps` after the head, in order.
    pub fn append(&self, preparation_id: &str, steps: Vec<AppendStep>) -> Result<Preparation> {
        let span = info_span!("preparation", id = preparation_id);
        let _guard = span.enter();

        validate(&steps)?;
        let preparation = self.get(preparation_id)?;
        if steps.is_empty() {
            return Ok(preparation);
        }
        let head = self.step(&preparation.head_id)?;
        let new_head = self.write_chain(head, &steps)?;
        self.commit(preparation, &new_head, "append")
    }

    /// Replace the actions of `step_id`, keeping and renumbering what follows.
    pub fn update_at(
        &self,
        preparation_id: &str,
        step_id: &str,
        new_step: AppendStep,
    ) -> Result<Preparation> {
        let span = info_span!("preparation", id = preparation_id);
        let _guard = span.enter();

        validate(std::slice::from_ref(&new_step))?;
        let preparation = self.get(preparation_id)?;
        let (target, later) = self.split_history(&preparation, step_id)?;
        let Some(parent_id) = target.parent() else {
            return Err(HistoryError::RootStepCannotBeUpdated);
        };

        let shift = ColumnShift::for_update(target.diff(), &new_step.diff);
        let mut replay = vec![new_step];
        replay.extend(shift.apply(later)?);
        debug!(step = step_id, shift = shift.shift(), replayed = replay.len(), "updating step");

        let parent = self.step(parent_id)?;
        let new_head = self.write_chain(parent, &replay)?;
        self.commit(preparation, &new_head, "update")
    }

    /// Remove `step_id`, dropping or renumbering what follows.
    pub fn delete_at(&self, preparation_id: &str, step_id: &str) -> Result<Preparation> {
        let span = info_span!("preparation", id = preparation_id);
        let _guard = span.enter();

        let preparation = self.get(preparation_id)?;
        let (target, later) = self.split_history(&preparation, step_id)?;
        let Some(parent_id) = target.parent() else {
            return Err(HistoryError::RootStepCannotBeDeleted);
        };

        let shift = ColumnShift::for_delete(target.diff());
        let before = later.len();
        let replay = shift.apply(later)?;
        debug!(
            step = step_id,
            shift = shift.shift(),
            dropped = before - replay.len(),
            "deleting step"
        );

        let parent = self.step(parent_id)?;
        let new_head = self.write_chain(parent, &replay)?;
        self.commit(preparation, &new_head, "delete")
    }

    /// Point the head at `step_id`.
    ///
    /// Refused when the step's actions look up a data set that no longer
    /// exists.
    pub fn move_head(&self, preparation_id: &str, step_id: &str) -> Result<Preparation> {
        let span = info_span!("preparation", id = preparation_id);
        let _guard = span.enter();

        let preparation = self.get(preparation_id)?;
        let target = self.step(step_id)?;
        let content = self.content_of(&target)?;
        if let Some(data_set_id) = content
            .actions()
            .iter()
            .filter(|action| action.name == LOOKUP_ACTION)
            .filter_map(|action| action.parameter(LOOKUP_DATA_SET_PARAMETER))
            .find(|data_set_id| !self.catalog.exists(data_set_id))
        {
            return Err(HistoryError::DeletedLookupDataSet {
                step_id: step_id.to_string(),
                data_set_id: data_set_id.to_string(),
            });
        }
        self.commit(preparation, &target, "move head")
    }

    /// The step `step_id` and the actions added after it, as append steps.
    fn split_history(
        &self,
        preparation: &Preparation,
        step_id: &str,
    ) -> Result<(Step, Vec<AppendStep>)> {
        let steps = self.extract_steps_from(preparation, step_id)?;
        let later = self.actions_after(&steps)?;
        let target = steps
            .into_iter()
            .next()
            .ok_or_else(|| HistoryError::StepNotFound(step_id.to_string()))?;
        Ok((target, later))
    }

    /// Store one step per entry of `steps` on top of `from`; returns the last.
    ///
    /// Objects are content addressed, so writing one that already exists is
    /// harmless.
    fn write_chain(&self, from: Step, steps: &[AppendStep]) -> Result<Step> {
        let mut head = from;
        let mut content = self.content_of(&head)?;
        for append in steps {
            content = content.append(&append.actions)?;
            self.repository.add(&content)?;
            let step = Step::new(Some(head.id().to_string()), content.id(), append.diff.clone())?;
            self.repository.add(&step)?;
            head = step;
        }
        Ok(head)
    }

    fn commit(&self, mut preparation: Preparation, head: &Step, operation: &str) -> Result<Preparation> {
        preparation.set_head(head.id(), Utc::now());
        self.repository.add(&preparation)?;
        info!(operation, head = head.id(), "preparation head moved");
        Ok(preparation)
    }
}

fn validate(steps: &[AppendStep]) -> Result<()> {
    for (index, step) in steps.iter().enumerate() {
        if step.actions.is_empty() {
            return Err(HistoryError::InvalidAppendStep(format!(
                "step {index} has no action"
            )));
        }
        if step.actions.iter().any(|action| action.name.trim().is_empty()) {
            return Err(HistoryError::InvalidAppendStep(format!(
                "step {index} has an action without a name"
            )));
        }
    }
    Ok(())
}

impl fmt::Debug for PreparationService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreparationService")
            .field("repository", &self.repository)
            .field("locks", &self.locks)
            .finish_non_exhaustive()
    }
}
