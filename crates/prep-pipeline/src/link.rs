//! Connections between nodes.

use std::time::{Duration, Instant};

use prep_model::{DataSetRow, RowMetadata};
use tracing::debug;

use crate::error::Result;
use crate::node::Node;
use crate::signal::Signal;
use crate::visitor::Visitor;

/// Outgoing connection of a node.
#[derive(Default)]
pub enum Link {
    /// Drops rows and signals.
    #[default]
    Null,
    Basic(BasicLink),
    Clone(CloneLink),
    Monitor(MonitorLink),
}

impl Link {
    pub fn basic(target: Box<dyn Node>) -> Self {
        Self::Basic(BasicLink::new(target))
    }

    pub fn clone_to(targets: Vec<Box<dyn Node>>) -> Self {
        Self::Clone(CloneLink::new(targets))
    }

    /// Wrap this link so the time spent downstream of it is measured.
    pub fn monitored(self, label: impl Into<String>) -> Self {
        Self::Monitor(MonitorLink::new(label, self))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn emit(&mut self, row: DataSetRow, metadata: &mut RowMetadata) -> Result<()> {
        match self {
            Self::Null => Ok(()),
            Self::Basic(link) => link.emit(row, metadata),
            Self::Clone(link) => link.emit(row, metadata),
            Self::Monitor(link) => link.emit(row, metadata),
        }
    }

    pub fn signal(&mut self, signal: Signal) -> Result<()> {
        match self {
            Self::Null => Ok(()),
            Self::Basic(link) => link.signal(signal),
            Self::Clone(link) => link.signal(signal),
            Self::Monitor(link) => link.signal(signal),
        }
    }

    pub fn accept(&self, visitor: &mut dyn Visitor) {
        match self {
            Self::Null => {}
            Self::Basic(link) => {
                visitor.visit_basic_link(link);
                link.target.accept(visitor);
            }
            Self::Clone(link) => {
                visitor.visit_clone_link(link);
                for (index, target) in link.targets.iter().enumerate() {
                    visitor.visit_branch(index);
                    target.accept(visitor);
                }
                visitor.leave_clone_link(link);
            }
            Self::Monitor(link) => {
                visitor.visit_monitor_link(link);
                link.inner.accept(visitor);
            }
        }
    }
}

/// Forwards rows and signals to exactly one target.
pub struct BasicLink {
    target: Box<dyn Node>,
}

impl BasicLink {
    pub fn new(target: Box<dyn Node>) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &dyn Node {
        self.target.as_ref()
    }

    fn emit(&mut self, row: DataSetRow, metadata: &mut RowMetadata) -> Result<()> {
        self.target.receive(row, metadata)
    }

    fn signal(&mut self, signal: Signal) -> Result<()> {
        self.target.signal(signal)
    }
}

/// Fans every row out to several targets, in order.
///
/// Each target but the last receives its own copy; the last one gets the
/// original. Branches run one after the other and share the metadata.
pub struct CloneLink {
    targets: Vec<Box<dyn Node>>,
}

impl CloneLink {
    pub fn new(targets: Vec<Box<dyn Node>>) -> Self {
        Self { targets }
    }

    pub fn targets(&self) -> impl Iterator<Item = &dyn Node> {
        self.targets.iter().map(|target| target.as_ref())
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    fn emit(&mut self, row: DataSetRow, metadata: &mut RowMetadata) -> Result<()> {
        let Some((last, rest)) = self.targets.split_last_mut() else {
            return Ok(());
        };
        for target in rest {
            target.receive(row.clone(), metadata)?;
        }
        last.receive(row, metadata)
    }

    /// Every target sees the signal even if an earlier one fails; the first
    /// error is returned.
    fn signal(&mut self, signal: Signal) -> Result<()> {
        let mut first_error = None;
        for target in &mut self.targets {
            if let Err(error) = target.signal(signal) {
                first_error.get_or_insert(error);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// Times everything downstream of the wrapped link.
///
/// Row count and elapsed time accumulate over the run and are logged when
/// `EndOfStream` passes through.
pub struct MonitorLink {
    label: String,
    inner: Box<Link>,
    rows: u64,
    elapsed: Duration,
}

impl MonitorLink {
    pub fn new(label: impl Into<String>, inner: Link) -> Self {
        Self {
            label: label.into(),
            inner: Box::new(inner),
            rows: 0,
            elapsed: Duration::ZERO,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn inner(&self) -> &Link {
        &self.inner
    }

    /// Rows emitted so far.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Time spent in downstream nodes so far.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    fn emit(&mut self, row: DataSetRow, metadata: &mut RowMetadata) -> Result<()> {
        let started = Instant::now();
        let outcome = self.inner.emit(row, metadata);
        self.elapsed += started.elapsed();
        self.rows += 1;
        outcome
    }

    fn signal(&mut self, signal: Signal) -> Result<()> {
        let outcome = self.inner.signal(signal);
        if signal == Signal::EndOfStream {
            debug!(link = %self.label, rows = self.rows, elapsed = ?self.elapsed, "monitored link finished");
        }
        outcome
    }
}
