//! Preparation history objects.
//!
//! A preparation's history is a singly linked chain of immutable [`Step`]s.
//! Each step points at its parent and at a [`PreparationActions`] content that
//! holds the *cumulative* action list from the root up to that step. Both are
//! content-addressed: their ids are hashes of what they hold, so identical
//! action lists share one content object and an id is never reused for
//! different data.
//!
//! The only mutable pointer into the chain is [`Preparation::head_id`].

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::error::Result;
use crate::hash::{content_id, sha256_hex};

/// An object stored by id in the preparation repository.
pub trait Identifiable: Serialize + DeserializeOwned {
    /// Storage kind, used to namespace ids in the repository.
    const KIND: &'static str;

    fn id(&self) -> &str;
}

/// Ordered, immutable list of actions identified by the hash of its content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparationActions {
    id: String,
    actions: Vec<Action>,
}

impl PreparationActions {
    pub fn new(actions: Vec<Action>) -> Result<Self> {
        let id = content_id(Self::KIND, &actions)?;
        Ok(Self { id, actions })
    }

    /// The empty content referenced by the root step.
    pub fn root() -> Result<Self> {
        Self::new(Vec::new())
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// New content made of these actions followed by `more`.
    ///
    /// `self` is left untouched.
    pub fn append(&self, more: &[Action]) -> Result<Self> {
        let mut actions = Vec::with_capacity(self.actions.len() + more.len());
        actions.extend_from_slice(&self.actions);
        actions.extend_from_slice(more);
        Self::new(actions)
    }
}

impl Identifiable for PreparationActions {
    const KIND: &'static str = "PreparationActions";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Column ids introduced by a step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDiff {
    #[serde(default)]
    pub created_columns: Vec<String>,
}

impl StepDiff {
    pub fn new<I, S>(created_columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            created_columns: created_columns.into_iter().map(Into::into).collect(),
        }
    }
}

/// One immutable node of a preparation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    id: String,
    parent: Option<String>,
    content: String,
    #[serde(default)]
    diff: StepDiff,
}

#[derive(Serialize)]
struct StepKey<'a> {
    parent: Option<&'a str>,
    content: &'a str,
    diff: &'a StepDiff,
}

impl Step {
    pub fn new(parent: Option<String>, content: impl Into<String>, diff: StepDiff) -> Result<Self> {
        let content = content.into();
        let id = content_id(
            Self::KIND,
            &StepKey {
                parent: parent.as_deref(),
                content: &content,
                diff: &diff,
            },
        )?;
        Ok(Self {
            id,
            parent,
            content,
            diff,
        })
    }

    /// The root step: no parent, empty content, no created columns.
    pub fn root(root_content: &PreparationActions) -> Result<Self> {
        Self::new(None, root_content.id(), StepDiff::default())
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn diff(&self) -> &StepDiff {
        &self.diff
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

impl Identifiable for Step {
    const KIND: &'static str = "Step";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Caller-supplied actions plus the columns they create, used to extend or
/// rewrite a history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendStep {
    pub actions: Vec<Action>,
    #[serde(default)]
    pub diff: StepDiff,
}

impl AppendStep {
    pub fn new(actions: Vec<Action>, diff: StepDiff) -> Self {
        Self { actions, diff }
    }

    pub fn single(action: Action) -> Self {
        Self::new(vec![action], StepDiff::default())
    }

    pub fn with_created_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.diff = StepDiff::new(columns);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preparation {
    id: String,
    pub data_set_id: String,
    pub head_id: String,
    pub author: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
}

impl Preparation {
    pub fn new(
        data_set_id: impl Into<String>,
        name: impl Into<String>,
        author: impl Into<String>,
        head_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let data_set_id = data_set_id.into();
        let name = name.into();
        let author = author.into();
        let id = sha256_hex(
            format!(
                "{data_set_id}\u{1f}{author}\u{1f}{name}\u{1f}{}",
                now.timestamp_nanos_opt().unwrap_or_else(|| now.timestamp())
            )
            .as_bytes(),
        );
        Self {
            id,
            data_set_id,
            head_id: head_id.into(),
            author,
            name,
            created_at: now,
            last_modified_at: now,
        }
    }

    /// Move the head pointer and bump the modification time.
    pub fn set_head(&mut self, head_id: impl Into<String>, now: DateTime<Utc>) {
        self.head_id = head_id.into();
        self.last_modified_at = now;
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_modified_at = now;
    }

    /// Copy of this preparation under a new id, name and timestamps.
    ///
    /// The copy shares the same head step.
    pub fn copy_as(&self, name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self::new(
            self.data_set_id.clone(),
            name,
            self.author.clone(),
            self.head_id.clone(),
            now,
        )
    }
}

impl Identifiable for Preparation {
    const KIND: &'static str = "Preparation";

    fn id(&self) -> &str {
        &self.id
    }
}
