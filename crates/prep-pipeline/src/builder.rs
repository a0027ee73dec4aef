//! Fluent pipeline builder.
//!
//! A pipeline is declared as a source followed by alternating link
//! combinators and node groups:
//!
//! ```ignore
//! NodeBuilder::source()
//!     .to().node(Box::new(compile))
//!     .to().node(Box::new(action))
//!     .to_many().nodes(vec![Box::new(left), Box::new(right)])
//!     .build()?;
//! ```
//!
//! The next link always hangs off the first node of the previous group.
//! Misuse is latched and reported by [`NodeBuilder::build`].

use crate::error::{BuildError, PipelineError, Result};
use crate::link::Link;
use crate::node::{FilteredSourceNode, Node, SourceNode};
use crate::pipeline::Pipeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkKind {
    Basic,
    Clone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuilderState {
    /// Last thing added was a node (or the source).
    ExpectingLink,
    /// Last thing added was a link combinator.
    ExpectingNodes(LinkKind),
}

struct Stage {
    kind: LinkKind,
    nodes: Vec<Box<dyn Node>>,
    monitor: Option<String>,
}

pub struct NodeBuilder {
    source: Box<dyn Node>,
    stages: Vec<Stage>,
    state: BuilderState,
    /// Name of the first node of the last group, when it is terminal.
    terminal: Option<String>,
    /// Label of a monitor requested for the pending link.
    monitor: Option<String>,
    error: Option<BuildError>,
}

impl NodeBuilder {
    /// Start from a plain [`SourceNode`].
    pub fn source() -> Self {
        Self::from_node(Box::new(SourceNode::new()))
    }

    /// Start from a [`FilteredSourceNode`].
    pub fn filtered_source(filter: impl Fn(&prep_model::DataSetRow) -> bool + Send + 'static) -> Self {
        Self::from_node(Box::new(FilteredSourceNode::new(filter)))
    }

    /// Start from any node.
    pub fn from_node(source: Box<dyn Node>) -> Self {
        let terminal = source.is_terminal().then(|| source.name().to_string());
        Self {
            source,
            stages: Vec::new(),
            state: BuilderState::ExpectingLink,
            terminal,
            monitor: None,
            error: None,
        }
    }

    /// Single-target link to the next node.
    pub fn to(self) -> Self {
        self.link(LinkKind::Basic)
    }

    /// Clone link to every node of the next group.
    pub fn to_many(self) -> Self {
        self.link(LinkKind::Clone)
    }

    /// Time the link just declared; see [`MonitorLink`](crate::MonitorLink).
    pub fn monitored(mut self, label: impl Into<String>) -> Self {
        if self.error.is_some() {
            return self;
        }
        match self.state {
            BuilderState::ExpectingNodes(_) => self.monitor = Some(label.into()),
            BuilderState::ExpectingLink => self.error = Some(BuildError::LinkExpected),
        }
        self
    }

    pub fn node(self, node: Box<dyn Node>) -> Self {
        self.nodes(vec![node])
    }

    pub fn nodes(mut self, nodes: Vec<Box<dyn Node>>) -> Self {
        if self.error.is_some() {
            return self;
        }
        match self.state {
            BuilderState::ExpectingLink => self.error = Some(BuildError::LinkExpected),
            BuilderState::ExpectingNodes(_) if nodes.is_empty() => {
                self.error = Some(BuildError::EmptyNodes);
            }
            BuilderState::ExpectingNodes(LinkKind::Basic) if nodes.len() > 1 => {
                self.error = Some(BuildError::TooManyTargets(nodes.len()));
            }
            BuilderState::ExpectingNodes(kind) => {
                self.terminal = nodes
                    .first()
                    .filter(|node| node.is_terminal())
                    .map(|node| node.name().to_string());
                let monitor = self.monitor.take();
                self.stages.push(Stage {
                    kind,
                    nodes,
                    monitor,
                });
                self.state = BuilderState::ExpectingLink;
            }
        }
        self
    }

    fn link(mut self, kind: LinkKind) -> Self {
        if self.error.is_some() {
            return self;
        }
        self.error = match (self.state, &self.terminal) {
            (BuilderState::ExpectingNodes(_), _) => Some(BuildError::NodeExpected),
            (BuilderState::ExpectingLink, Some(name)) => {
                Some(BuildError::TerminalNodeLinked(name.clone()))
            }
            (BuilderState::ExpectingLink, None) => {
                self.state = BuilderState::ExpectingNodes(kind);
                None
            }
        };
        self
    }

    /// Assemble the declared chain and return its source node.
    pub fn build(self) -> Result<Box<dyn Node>> {
        if let Some(error) = self.error {
            return Err(error.into());
        }
        if matches!(self.state, BuilderState::ExpectingNodes(_)) {
            return Err(BuildError::DanglingLink.into());
        }

        let mut source = self.source;
        let mut stages = self.stages;
        let mut downstream: Option<Link> = None;
        while let Some(Stage {
            kind,
            mut nodes,
            monitor,
        }) = stages.pop()
        {
            if let Some(link) = downstream.take()
                && let Some(first) = nodes.first_mut()
            {
                first.set_link(link)?;
            }
            let link = match kind {
                LinkKind::Basic => {
                    let target = nodes
                        .into_iter()
                        .next()
                        .ok_or(PipelineError::Configuration(BuildError::EmptyNodes))?;
                    Link::basic(target)
                }
                LinkKind::Clone => Link::clone_to(nodes),
            };
            downstream = Some(match monitor {
                Some(label) => link.monitored(label),
                None => link,
            });
        }
        if let Some(link) = downstream {
            source.set_link(link)?;
        }
        Ok(source)
    }

    pub fn build_pipeline(self) -> Result<Pipeline> {
        self.build().map(Pipeline::new)
    }
}
