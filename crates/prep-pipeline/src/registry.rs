//! Name-based lookup of action implementations.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use prep_model::Action;

use crate::action::RowAction;
use crate::error::{ActionError, PipelineError, Result};

/// Builds an action implementation from its persisted description.
pub type ActionFactory =
    Box<dyn Fn(&Action) -> std::result::Result<Arc<dyn RowAction>, ActionError> + Send + Sync>;

#[derive(Default)]
pub struct ActionRegistry {
    factories: BTreeMap<String, ActionFactory>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&Action) -> std::result::Result<Arc<dyn RowAction>, ActionError>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    /// Register a stateless implementation shared by every use of its name.
    pub fn register_shared(&mut self, action: Arc<dyn RowAction>) {
        let name = action.name().to_string();
        self.register(name, move |_| Ok(Arc::clone(&action)));
    }

    pub fn with<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&Action) -> std::result::Result<Arc<dyn RowAction>, ActionError>
            + Send
            + Sync
            + 'static,
    {
        self.register(name, factory);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn resolve(&self, action: &Action) -> Result<Arc<dyn RowAction>> {
        let factory = self
            .factories
            .get(&action.name)
            .ok_or_else(|| PipelineError::UnknownAction(action.name.clone()))?;
        factory(action).map_err(|source| PipelineError::action(&action.name, source))
    }
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.factories.keys()).finish()
    }
}
