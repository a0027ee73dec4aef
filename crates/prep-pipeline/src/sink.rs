//! Outputs behind terminal nodes.

use std::sync::{Arc, Mutex, MutexGuard};

use prep_model::{DataSetRow, RowMetadata};

use crate::error::Result;
use crate::node::TerminalNode;
use crate::signal::Signal;

/// Receives what reaches a [`TerminalNode`].
pub trait RowSink: Send {
    fn accept_row(&mut self, row: DataSetRow, metadata: &RowMetadata) -> Result<()>;

    fn on_signal(&mut self, _signal: Signal) -> Result<()> {
        Ok(())
    }
}

/// Sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSink;

impl RowSink for DiscardSink {
    fn accept_row(&mut self, _row: DataSetRow, _metadata: &RowMetadata) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Collected {
    rows: Vec<DataSetRow>,
    metadata: Option<RowMetadata>,
    signals: Vec<Signal>,
}

/// Cloneable handle that records rows, the last schema seen and signals.
///
/// Clones share the same buffer, so a handle can be kept to inspect what a
/// terminal node received after the pipeline ran.
#[derive(Debug, Clone, Default)]
pub struct RowCollector {
    inner: Arc<Mutex<Collected>>,
}

impl RowCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// A terminal node writing into this collector.
    pub fn node(&self) -> TerminalNode {
        TerminalNode::new(self.clone())
    }

    fn collected(&self) -> MutexGuard<'_, Collected> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn count(&self) -> usize {
        self.collected().rows.len()
    }

    pub fn rows(&self) -> Vec<DataSetRow> {
        self.collected().rows.clone()
    }

    pub fn last_row(&self) -> Option<DataSetRow> {
        self.collected().rows.last().cloned()
    }

    pub fn metadata(&self) -> Option<RowMetadata> {
        self.collected().metadata.clone()
    }

    pub fn signals(&self) -> Vec<Signal> {
        self.collected().signals.clone()
    }

    pub fn last_signal(&self) -> Option<Signal> {
        self.collected().signals.last().copied()
    }
}

impl RowSink for RowCollector {
    fn accept_row(&mut self, row: DataSetRow, metadata: &RowMetadata) -> Result<()> {
        let mut collected = self.collected();
        collected.rows.push(row);
        collected.metadata = Some(metadata.clone());
        Ok(())
    }

    fn on_signal(&mut self, signal: Signal) -> Result<()> {
        self.collected().signals.push(signal);
        Ok(())
    }
}
