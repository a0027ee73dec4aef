//! Transformation pipeline runtime.
//!
//! Rows are pushed synchronously through a graph of [`Node`]s connected by
//! [`Link`]s. Each node processes a row and forwards it (or drops it) to its
//! single outgoing link; a [`CloneLink`] fans a row out to several branches,
//! each receiving an independent copy. Out-of-band [`Signal`]s travel the same
//! graph and are always propagated, even by nodes that drop rows.
//!
//! Actions are plugged in through the two-phase [`RowAction`] contract:
//! `compile` runs once per pipeline build, `apply` once per row. A failed
//! compile cancels the action's [`ActionContext`] and its node then forwards
//! rows untouched for the rest of the run.
//!
//! # Example
//!
//! ```ignore
//! use prep_pipeline::{NodeBuilder, RowCollector, Signal};
//!
//! let output = RowCollector::new();
//! let mut pipeline = NodeBuilder::source()
//!     .to()
//!     .node(Box::new(output.node()))
//!     .build_pipeline()?;
//!
//! pipeline.execute(rows, &mut metadata)?;
//! assert_eq!(output.last_signal(), Some(Signal::EndOfStream));
//! ```

pub mod action;
pub mod builder;
pub mod compiler;
pub mod error;
pub mod link;
pub mod node;
pub mod pipeline;
pub mod registry;
pub mod signal;
pub mod sink;
pub mod visitor;

pub use action::{ActionContext, ActionStatus, Behavior, RowAction, SharedContext, shared_context};
pub use builder::NodeBuilder;
pub use compiler::{ActionChain, BuildReport, CompileFailure};
pub use error::{ActionError, BuildError, PipelineError, Result};
pub use link::{BasicLink, CloneLink, Link, MonitorLink};
pub use node::{
    ActionNode, CompileNode, FilteredSourceNode, Node, NullNode, RowFilter, SourceNode,
    TerminalNode,
};
pub use pipeline::Pipeline;
pub use registry::{ActionFactory, ActionRegistry};
pub use signal::Signal;
pub use sink::{DiscardSink, RowCollector, RowSink};
pub use visitor::{ExecutionPlan, NodeCounter, Visitor};
