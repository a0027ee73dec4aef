//! Pipeline nodes.
//!
//! A node receives one row at a time together with the current schema, does
//! its work and pushes the result to its outgoing [`Link`]. Signals are always
//! forwarded to the link, whatever the node did with rows.

use std::sync::Arc;

use prep_model::{DataSetRow, RowMetadata};
use tracing::{debug, warn};

use crate::action::{RowAction, SharedContext, lock_context};
use crate::error::{BuildError, PipelineError, Result};
use crate::link::Link;
use crate::signal::Signal;
use crate::sink::RowSink;
use crate::visitor::Visitor;

pub trait Node: Send {
    /// Label used in execution plans and error messages.
    fn name(&self) -> &str;

    fn receive(&mut self, row: DataSetRow, metadata: &mut RowMetadata) -> Result<()>;

    fn signal(&mut self, signal: Signal) -> Result<()>;

    fn link(&self) -> &Link;

    /// Replace the outgoing link.
    fn set_link(&mut self, link: Link) -> Result<()>;

    fn accept(&self, visitor: &mut dyn Visitor) {
        visitor.visit_node(self.name());
        self.link().accept(visitor);
    }

    fn is_terminal(&self) -> bool {
        false
    }
}

/// Entry point of a pipeline; forwards every row.
#[derive(Default)]
pub struct SourceNode {
    link: Link,
}

impl SourceNode {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Node for SourceNode {
    fn name(&self) -> &str {
        "Source"
    }

    fn receive(&mut self, row: DataSetRow, metadata: &mut RowMetadata) -> Result<()> {
        self.link.emit(row, metadata)
    }

    fn signal(&mut self, signal: Signal) -> Result<()> {
        self.link.signal(signal)
    }

    fn link(&self) -> &Link {
        &self.link
    }

    fn set_link(&mut self, link: Link) -> Result<()> {
        self.link = link;
        Ok(())
    }

    fn accept(&self, visitor: &mut dyn Visitor) {
        visitor.visit_source(self);
        self.link.accept(visitor);
    }
}

pub type RowFilter = Box<dyn Fn(&DataSetRow) -> bool + Send>;

/// Source that only forwards rows matching its predicate.
pub struct FilteredSourceNode {
    filter: RowFilter,
    link: Link,
}

impl FilteredSourceNode {
    pub fn new(filter: impl Fn(&DataSetRow) -> bool + Send + 'static) -> Self {
        Self {
            filter: Box::new(filter),
            link: Link::Null,
        }
    }
}

impl Node for FilteredSourceNode {
    fn name(&self) -> &str {
        "FilteredSource"
    }

    fn receive(&mut self, row: DataSetRow, metadata: &mut RowMetadata) -> Result<()> {
        if (self.filter)(&row) {
            self.link.emit(row, metadata)
        } else {
            Ok(())
        }
    }

    fn signal(&mut self, signal: Signal) -> Result<()> {
        self.link.signal(signal)
    }

    fn link(&self) -> &Link {
        &self.link
    }

    fn set_link(&mut self, link: Link) -> Result<()> {
        self.link = link;
        Ok(())
    }

    fn accept(&self, visitor: &mut dyn Visitor) {
        visitor.visit_filtered_source(self);
        self.link.accept(visitor);
    }
}

/// Runs an action's compile phase once, on the first row, against the schema
/// as it is at this point of the pipeline.
///
/// A compile failure cancels the shared context; rows keep flowing.
pub struct CompileNode {
    action: Arc<dyn RowAction>,
    context: SharedContext,
    compiled: bool,
    link: Link,
}

impl CompileNode {
    pub fn new(action: Arc<dyn RowAction>, context: SharedContext) -> Self {
        Self {
            action,
            context,
            compiled: false,
            link: Link::Null,
        }
    }

    pub fn action(&self) -> &dyn RowAction {
        self.action.as_ref()
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled
    }

    fn compile(&mut self, metadata: &mut RowMetadata) -> Result<()> {
        self.compiled = true;
        let mut context = lock_context(&self.context, self.action.name())?;
        if context.is_canceled() {
            return Ok(());
        }
        match self.action.compile(&mut context, metadata) {
            Ok(()) => debug!(action = self.action.name(), "action compiled"),
            Err(error) => {
                warn!(action = self.action.name(), %error, "action compile failed, action disabled");
                context.fail(error.to_string());
            }
        }
        Ok(())
    }
}

impl Node for CompileNode {
    fn name(&self) -> &str {
        self.action.name()
    }

    fn receive(&mut self, row: DataSetRow, metadata: &mut RowMetadata) -> Result<()> {
        if !self.compiled {
            self.compile(metadata)?;
        }
        self.link.emit(row, metadata)
    }

    fn signal(&mut self, signal: Signal) -> Result<()> {
        self.link.signal(signal)
    }

    fn link(&self) -> &Link {
        &self.link
    }

    fn set_link(&mut self, link: Link) -> Result<()> {
        self.link = link;
        Ok(())
    }

    fn accept(&self, visitor: &mut dyn Visitor) {
        visitor.visit_compile(self);
        self.link.accept(visitor);
    }
}

/// Applies an action to every row unless its context is canceled.
pub struct ActionNode {
    action: Arc<dyn RowAction>,
    context: SharedContext,
    link: Link,
}

impl ActionNode {
    pub fn new(action: Arc<dyn RowAction>, context: SharedContext) -> Self {
        Self {
            action,
            context,
            link: Link::Null,
        }
    }

    pub fn action(&self) -> &dyn RowAction {
        self.action.as_ref()
    }

    pub fn context(&self) -> &SharedContext {
        &self.context
    }
}

impl Node for ActionNode {
    fn name(&self) -> &str {
        self.action.name()
    }

    fn receive(&mut self, row: DataSetRow, metadata: &mut RowMetadata) -> Result<()> {
        let row = {
            let mut context = lock_context(&self.context, self.action.name())?;
            if context.is_canceled() {
                row
            } else {
                self.action
                    .apply(row, &mut context, metadata)
                    .map_err(|source| PipelineError::action(self.action.name(), source))?
            }
        };
        self.link.emit(row, metadata)
    }

    fn signal(&mut self, signal: Signal) -> Result<()> {
        if signal == Signal::Cancel {
            lock_context(&self.context, self.action.name())?.cancel();
        }
        self.link.signal(signal)
    }

    fn link(&self) -> &Link {
        &self.link
    }

    fn set_link(&mut self, link: Link) -> Result<()> {
        self.link = link;
        Ok(())
    }

    fn accept(&self, visitor: &mut dyn Visitor) {
        visitor.visit_action(self);
        self.link.accept(visitor);
    }
}

/// End of a branch; hands rows and signals to a [`RowSink`].
pub struct TerminalNode {
    name: String,
    sink: Box<dyn RowSink>,
    link: Link,
}

impl TerminalNode {
    pub fn new(sink: impl RowSink + 'static) -> Self {
        Self {
            name: "Terminal".to_string(),
            sink: Box::new(sink),
            link: Link::Null,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Node for TerminalNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn receive(&mut self, row: DataSetRow, metadata: &mut RowMetadata) -> Result<()> {
        self.sink.accept_row(row, metadata)
    }

    fn signal(&mut self, signal: Signal) -> Result<()> {
        self.sink.on_signal(signal)
    }

    fn link(&self) -> &Link {
        &self.link
    }

    fn set_link(&mut self, _link: Link) -> Result<()> {
        Err(BuildError::TerminalNodeLinked(self.name.clone()).into())
    }

    fn accept(&self, visitor: &mut dyn Visitor) {
        visitor.visit_terminal(self);
    }

    fn is_terminal(&self) -> bool {
        true
    }
}

/// Swallows rows and signals.
#[derive(Default)]
pub struct NullNode {
    link: Link,
}

impl NullNode {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Node for NullNode {
    fn name(&self) -> &str {
        "Null"
    }

    fn receive(&mut self, _row: DataSetRow, _metadata: &mut RowMetadata) -> Result<()> {
        Ok(())
    }

    fn signal(&mut self, _signal: Signal) -> Result<()> {
        Ok(())
    }

    fn link(&self) -> &Link {
        &self.link
    }

    fn set_link(&mut self, _link: Link) -> Result<()> {
        Ok(())
    }

    fn accept(&self, visitor: &mut dyn Visitor) {
        visitor.visit_null(self);
    }
}
