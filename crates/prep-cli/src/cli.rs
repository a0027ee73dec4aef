//! Command-line arguments of `prep`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use prep_cli::logging::LogFormat;
use prep_history::{SortKey, SortOrder};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(
    name = "prep",
    version,
    about = "Manage data preparation histories",
    long_about = "Create preparations on data sets and edit their history of actions.\n\n\
                  Steps can be appended, rewritten or deleted anywhere in the history; \
                  later steps are renumbered to follow column changes. Mutating commands \
                  hold the preparation lock for the duration of the edit."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (default: ./prep.toml when present).
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Store directory, overriding the configuration file.
    #[arg(long, value_name = "DIR", global = true)]
    pub store: Option<PathBuf>,

    /// Lock owner for mutating commands (default: $USER).
    #[arg(long, value_name = "NAME", global = true)]
    pub owner: Option<String>,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format.
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a preparation on a data set.
    Create {
        #[arg(value_name = "DATA_SET")]
        data_set: String,
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// List preparations, most recently modified first.
    List(ListArgs),

    /// Show one preparation.
    Show {
        #[arg(value_name = "PREPARATION")]
        preparation: String,
    },

    /// List the steps of a preparation, root first.
    Steps {
        #[arg(value_name = "PREPARATION")]
        preparation: String,
    },

    /// Print the actions of a preparation at a version.
    Actions {
        #[arg(value_name = "PREPARATION")]
        preparation: String,

        /// `head`, `origin` or a step id.
        #[arg(long, default_value = "head")]
        version: String,
    },

    /// Append steps after the head.
    Append {
        #[arg(value_name = "PREPARATION")]
        preparation: String,

        #[command(flatten)]
        step: StepArgs,
    },

    /// Replace the actions of a step.
    Update {
        #[arg(value_name = "PREPARATION")]
        preparation: String,

        #[arg(value_name = "STEP")]
        step_id: String,

        #[command(flatten)]
        step: StepArgs,
    },

    /// Delete a step and the steps that depend on its columns.
    DeleteStep {
        #[arg(value_name = "PREPARATION")]
        preparation: String,

        #[arg(value_name = "STEP")]
        step_id: String,
    },

    /// Move the head to a step.
    Head {
        #[arg(value_name = "PREPARATION")]
        preparation: String,

        #[arg(value_name = "STEP")]
        step_id: String,
    },

    /// Rename a preparation.
    Rename {
        #[arg(value_name = "PREPARATION")]
        preparation: String,

        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Copy a preparation; the copy shares the history.
    Clone {
        #[arg(value_name = "PREPARATION")]
        preparation: String,
    },

    /// Delete a preparation.
    Remove {
        #[arg(value_name = "PREPARATION")]
        preparation: String,
    },

    /// List held locks.
    Locks {
        /// Only locks held by this owner.
        #[arg(long, value_name = "NAME")]
        user: Option<String>,
    },

    /// Release a lock.
    Unlock {
        #[arg(value_name = "PREPARATION")]
        preparation: String,

        /// Release it whoever holds it.
        #[arg(long)]
        force: bool,
    },
}

/// One step given on the command line, or steps read from a JSON file.
#[derive(Args)]
pub struct StepArgs {
    /// Action name.
    #[arg(
        value_name = "ACTION",
        required_unless_present = "from_file",
        conflicts_with = "from_file"
    )]
    pub action: Option<String>,

    /// Action parameter, repeatable.
    #[arg(short = 'p', long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// Column created by the step, repeatable.
    #[arg(long = "creates", value_name = "COLUMN")]
    pub creates: Vec<String>,

    /// JSON file holding one step or an array of steps.
    #[arg(long = "from-file", value_name = "PATH")]
    pub from_file: Option<PathBuf>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Only preparations on this data set.
    #[arg(long = "data-set", value_name = "DATA_SET")]
    pub data_set: Option<String>,

    /// Only preparations with this name, ignoring case.
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,

    /// Match names containing `--name` instead of equal to it.
    #[arg(long, requires = "name")]
    pub contains: bool,

    #[arg(long, value_enum, default_value_t = SortArg::Modified)]
    pub sort: SortArg,

    #[arg(long, value_enum, default_value_t = OrderArg::Desc)]
    pub order: OrderArg,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum SortArg {
    Name,
    /// Creation date.
    Date,
    /// Last modification date.
    Modified,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Name => Self::Name,
            SortArg::Date => Self::Date,
            SortArg::Modified => Self::Modified,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OrderArg {
    Asc,
    Desc,
}

impl From<OrderArg> for SortOrder {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::Asc => Self::Asc,
            OrderArg::Desc => Self::Desc,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LevelFilter {
    fn from(arg: LogLevelArg) -> Self {
        match arg {
            LogLevelArg::Error => Self::ERROR,
            LogLevelArg::Warn => Self::WARN,
            LogLevelArg::Info => Self::INFO,
            LogLevelArg::Debug => Self::DEBUG,
            LogLevelArg::Trace => Self::TRACE,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => Self::Pretty,
            LogFormatArg::Compact => Self::Compact,
            LogFormatArg::Json => Self::Json,
        }
    }
}
