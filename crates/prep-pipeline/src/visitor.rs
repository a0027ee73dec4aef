//! Read-only traversal of a built pipeline.
//!
//! Nodes and links drive the walk through their `accept` methods; a
//! [`Visitor`] only overrides the hooks it cares about.

use std::fmt::Write as _;

use crate::link::{BasicLink, CloneLink, MonitorLink};
use crate::node::{
    ActionNode, CompileNode, FilteredSourceNode, Node, NullNode, SourceNode, TerminalNode,
};
use crate::pipeline::Pipeline;

pub trait Visitor {
    fn visit_pipeline(&mut self, _pipeline: &Pipeline) {}

    fn visit_source(&mut self, _node: &SourceNode) {}

    fn visit_filtered_source(&mut self, _node: &FilteredSourceNode) {}

    fn visit_compile(&mut self, _node: &CompileNode) {}

    fn visit_action(&mut self, _node: &ActionNode) {}

    fn visit_terminal(&mut self, _node: &TerminalNode) {}

    fn visit_null(&mut self, _node: &NullNode) {}

    /// Nodes defined outside this crate.
    fn visit_node(&mut self, _name: &str) {}

    fn visit_basic_link(&mut self, _link: &BasicLink) {}

    fn visit_clone_link(&mut self, _link: &CloneLink) {}

    /// Called before each branch of a clone link is walked.
    fn visit_branch(&mut self, _index: usize) {}

    fn leave_clone_link(&mut self, _link: &CloneLink) {}

    /// Called before the link the monitor wraps is visited.
    fn visit_monitor_link(&mut self, _link: &MonitorLink) {}
}

/// Renders a pipeline as a one-line plan, e.g.
/// `Source -> Compile(fillempty) -> Action(fillempty) => {Terminal | Terminal}`.
#[derive(Debug, Default)]
pub struct ExecutionPlan {
    plan: String,
}

impl ExecutionPlan {
    pub fn render(pipeline: &Pipeline) -> String {
        let mut visitor = Self::default();
        pipeline.accept(&mut visitor);
        visitor.plan
    }

    fn push(&mut self, label: &str) {
        self.plan.push_str(label);
    }
}

impl Visitor for ExecutionPlan {
    fn visit_source(&mut self, _node: &SourceNode) {
        self.push("Source");
    }

    fn visit_filtered_source(&mut self, _node: &FilteredSourceNode) {
        self.push("FilteredSource");
    }

    fn visit_compile(&mut self, node: &CompileNode) {
        let _ = write!(self.plan, "Compile({})", node.action().name());
    }

    fn visit_action(&mut self, node: &ActionNode) {
        let _ = write!(self.plan, "Action({})", node.action().name());
    }

    fn visit_terminal(&mut self, node: &TerminalNode) {
        self.push(node.name());
    }

    fn visit_null(&mut self, _node: &NullNode) {
        self.push("Null");
    }

    fn visit_node(&mut self, name: &str) {
        self.push(name);
    }

    fn visit_basic_link(&mut self, _link: &BasicLink) {
        self.push(" -> ");
    }

    fn visit_clone_link(&mut self, _link: &CloneLink) {
        self.push(" => {");
    }

    fn visit_branch(&mut self, index: usize) {
        if index > 0 {
            self.push(" | ");
        }
    }

    fn leave_clone_link(&mut self, _link: &CloneLink) {
        self.push("}");
    }
}

/// Counts nodes and links.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NodeCounter {
    pub nodes: usize,
    pub links: usize,
    pub actions: usize,
    pub terminals: usize,
}

impl NodeCounter {
    pub fn count(pipeline: &Pipeline) -> Self {
        let mut counter = Self::default();
        pipeline.accept(&mut counter);
        counter
    }
}

impl Visitor for NodeCounter {
    fn visit_source(&mut self, _node: &SourceNode) {
        self.nodes += 1;
    }

    fn visit_filtered_source(&mut self, _node: &FilteredSourceNode) {
        self.nodes += 1;
    }

    fn visit_compile(&mut self, _node: &CompileNode) {
        self.nodes += 1;
    }

    fn visit_action(&mut self, _node: &ActionNode) {
        self.nodes += 1;
        self.actions += 1;
    }

    fn visit_terminal(&mut self, _node: &TerminalNode) {
        self.nodes += 1;
        self.terminals += 1;
    }

    fn visit_null(&mut self, _node: &NullNode) {
        self.nodes += 1;
    }

    fn visit_node(&mut self, _name: &str) {
        self.nodes += 1;
    }

    fn visit_basic_link(&mut self, _link: &BasicLink) {
        self.links += 1;
    }

    fn visit_clone_link(&mut self, _link: &CloneLink) {
        self.links += 1;
    }
}
