//! Pipeline error types.
//!
//! Configuration errors are raised while a pipeline is built and never while
//! rows flow. Row-level failures come from actions and abort the stream.

use prep_model::ModelError;
use thiserror::Error;

/// Illegal pipeline construction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// A node was attached where a link combinator (`to`/`to_many`) was expected.
    #[error("expected a link combinator before attaching more nodes")]
    LinkExpected,

    /// A link combinator followed another link combinator.
    #[error("expected node(s) after a link combinator")]
    NodeExpected,

    /// The builder ended on a link combinator with no target.
    #[error("pipeline ends with a link that has no target node")]
    DanglingLink,

    /// Something was linked after a terminal node.
    #[error("cannot link past terminal node '{0}'")]
    TerminalNodeLinked(String),

    /// A link combinator received no target node.
    #[error("a link needs at least one target node")]
    EmptyNodes,

    /// `to()` followed by more than one node.
    #[error("a basic link takes exactly one target node, got {0}")]
    TooManyTargets(usize),
}

/// Failure reported by an action while compiling or applying.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("missing parameter '{0}'")]
    MissingParameter(String),

    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("{0}")]
    Failed(String),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid pipeline configuration: {0}")]
    Configuration(#[from] BuildError),

    #[error("unknown action '{0}'")]
    UnknownAction(String),

    #[error("action '{action}' failed: {source}")]
    Action {
        action: String,
        #[source]
        source: ActionError,
    },

    #[error("context of action '{0}' is poisoned")]
    ContextPoisoned(String),

    #[error("output sink failed: {0}")]
    Sink(String),
}

impl PipelineError {
    pub fn action(action: impl Into<String>, source: ActionError) -> Self {
        Self::Action {
            action: action.into(),
            source,
        }
    }

    /// True for errors raised while building, as opposed to while streaming.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::UnknownAction(_))
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
