use std::fmt;

/// Out-of-band event travelling through the pipeline graph.
///
/// Signals carry no payload. Every node propagates them, including nodes that
/// would drop a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// No more rows will be pushed.
    EndOfStream,
    /// The run is abandoned; action nodes stop applying their action.
    Cancel,
}

impl Signal {
    pub const ALL: [Signal; 2] = [Signal::EndOfStream, Signal::Cancel];
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EndOfStream => f.write_str("END_OF_STREAM"),
            Self::Cancel => f.write_str("CANCEL"),
        }
    }
}
