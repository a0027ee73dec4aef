//! Turns a list of persisted actions into a runnable pipeline.
//!
//! Each action becomes an [`ActionNode`]. Actions that depend on the live
//! schema get a [`CompileNode`] in front of them so they compile on the first
//! row; the others compile right away against the initial schema. Either way
//! a compile failure only disables that one action.

use std::sync::Arc;

use prep_model::{Action, DataSetRow, RowMetadata};
use tracing::{debug, warn};

use crate::action::{RowAction, SharedContext, lock_context, shared_context};
use crate::builder::NodeBuilder;
use crate::error::Result;
use crate::node::{ActionNode, CompileNode, Node, RowFilter};
use crate::pipeline::Pipeline;
use crate::registry::ActionRegistry;

/// An action disabled because its compile phase failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileFailure {
    /// Index of the action in the chain.
    pub position: usize,
    pub action: String,
    pub reason: String,
}

/// Outcome of compiling actions at build time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub compiled_eagerly: usize,
    pub deferred: usize,
    pub failures: Vec<CompileFailure>,
}

impl BuildReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct ActionChain<'r> {
    registry: &'r ActionRegistry,
    actions: Vec<Action>,
    filter: Option<RowFilter>,
}

impl<'r> ActionChain<'r> {
    pub fn new(registry: &'r ActionRegistry) -> Self {
        Self {
            registry,
            actions: Vec::new(),
            filter: None,
        }
    }

    pub fn with_actions(mut self, actions: impl IntoIterator<Item = Action>) -> Self {
        self.actions.extend(actions);
        self
    }

    /// Only rows matching `filter` enter the chain.
    pub fn with_filter(mut self, filter: impl Fn(&DataSetRow) -> bool + Send + 'static) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    /// Build the pipeline, ending in `output`.
    ///
    /// `metadata` is the schema rows will be pushed with; eager compiles may
    /// change it, so the same value must be used to run the pipeline.
    pub fn build(self, metadata: &mut RowMetadata, output: Box<dyn Node>) -> Result<Pipeline> {
        let mut builder = match self.filter {
            Some(filter) => NodeBuilder::filtered_source(filter),
            None => NodeBuilder::source(),
        };
        let mut report = BuildReport::default();

        for (position, action) in self.actions.iter().enumerate() {
            let implementation = self.registry.resolve(action)?;
            let context = shared_context(action.parameters.clone());

            if implementation.requires_metadata() {
                report.deferred += 1;
                builder = builder.to().node(Box::new(CompileNode::new(
                    Arc::clone(&implementation),
                    Arc::clone(&context),
                )));
            } else {
                report.compiled_eagerly += 1;
                if let Some(reason) = compile_now(implementation.as_ref(), &context, metadata)? {
                    report.failures.push(CompileFailure {
                        position,
                        action: action.name.clone(),
                        reason,
                    });
                }
            }
            builder = builder
                .to()
                .node(Box::new(ActionNode::new(implementation, context)));
        }

        let pipeline = builder.to().node(output).build_pipeline()?;
        debug!(
            actions = self.actions.len(),
            deferred = report.deferred,
            failures = report.failures.len(),
            "pipeline built"
        );
        Ok(pipeline.with_report(report))
    }
}

fn compile_now(
    action: &dyn RowAction,
    context: &SharedContext,
    metadata: &mut RowMetadata,
) -> Result<Option<String>> {
    let mut context = lock_context(context, action.name())?;
    match action.compile(&mut context, metadata) {
        Ok(()) => Ok(None),
        Err(error) => {
            warn!(action = action.name(), %error, "action compile failed, action disabled");
            let reason = error.to_string();
            context.fail(reason.clone());
            Ok(Some(reason))
        }
    }
}
