use std::fmt;

use prep_model::{DataSetRow, RowMetadata};
use tracing::{debug, info_span};

use crate::action::lock_context;
use crate::compiler::{BuildReport, CompileFailure};
use crate::error::Result;
use crate::node::{ActionNode, Node};
use crate::signal::Signal;
use crate::visitor::{ExecutionPlan, Visitor};

/// A built node graph, entered through its source node.
pub struct Pipeline {
    root: Box<dyn Node>,
    report: BuildReport,
}

impl Pipeline {
    pub fn new(root: Box<dyn Node>) -> Self {
        Self {
            root,
            report: BuildReport::default(),
        }
    }

    pub fn with_report(mut self, report: BuildReport) -> Self {
        self.report = report;
        self
    }

    pub fn root(&self) -> &dyn Node {
        self.root.as_ref()
    }

    /// What happened while the pipeline was built.
    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    pub fn receive(&mut self, row: DataSetRow, metadata: &mut RowMetadata) -> Result<()> {
        self.root.receive(row, metadata)
    }

    pub fn signal(&mut self, signal: Signal) -> Result<()> {
        self.root.signal(signal)
    }

    pub fn accept(&self, visitor: &mut dyn Visitor) {
        visitor.visit_pipeline(self);
        self.root.accept(visitor);
    }

    /// Push every row, then signal end of stream. Returns the number of rows
    /// pushed.
    ///
    /// A row failure stops the run; the end-of-stream signal is not sent.
    pub fn execute<I>(&mut self, rows: I, metadata: &mut RowMetadata) -> Result<usize>
    where
        I: IntoIterator<Item = DataSetRow>,
    {
        let span = info_span!("pipeline", plan = %self);
        let _guard = span.enter();

        let mut pushed = 0usize;
        for row in rows {
            self.receive(row, metadata)?;
            pushed += 1;
        }
        self.signal(Signal::EndOfStream)?;
        debug!(rows = pushed, "pipeline drained");
        Ok(pushed)
    }

    /// Actions whose compile phase failed, whether at build time or on the
    /// first row.
    pub fn compile_failures(&self) -> Vec<CompileFailure> {
        let mut collector = FailureCollector::default();
        self.accept(&mut collector);
        collector.failures
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&ExecutionPlan::render(self))
    }
}

#[derive(Default)]
struct FailureCollector {
    position: usize,
    failures: Vec<CompileFailure>,
}

impl Visitor for FailureCollector {
    fn visit_action(&mut self, node: &ActionNode) {
        let name = node.action().name();
        if let Ok(context) = lock_context(node.context(), name)
            && let Some(reason) = context.failure()
        {
            self.failures.push(CompileFailure {
                position: self.position,
                action: name.to_string(),
                reason: reason.to_string(),
            });
        }
        self.position += 1;
    }
}
